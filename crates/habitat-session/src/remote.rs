//! Wire contract for scoring through a remote evaluation service.
//!
//! Request: one matrix per floor, rows indexed by `y`, each cell either
//! `{"module_type": ...}` or `null`. Response: `score`, `worse_points` and
//! `improvements_points` in the same factor shape the local scorer produces.
//! Report payloads (`images`, `pdf`) may ride along or be absent; they never
//! affect the score.
//!
//! The HTTP client itself lives outside this crate behind [`Transport`].

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use habitat_logic::constants::FACTOR_LIMIT;
use habitat_logic::grid::{CellCoord, FloorGrid};
use habitat_logic::module_type::ModuleType;
use habitat_logic::scorer::{EvaluationResult, RelationshipFactor};

use crate::evaluator::{EvaluationError, Evaluator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCell {
    pub module_type: ModuleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub floors: Vec<Vec<Vec<Option<RemoteCell>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
}

impl RemoteRequest {
    pub fn from_floors(floors: &[FloorGrid]) -> Self {
        let floors = floors
            .iter()
            .map(|floor| {
                (0..floor.height())
                    .map(|y| {
                        (0..floor.width())
                            .map(|x| {
                                floor.get(CellCoord::new(x, y)).map(|d| RemoteCell {
                                    module_type: d.module_type.clone(),
                                })
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self {
            floors,
            images: None,
            pdf: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub score: i32,
    #[serde(default)]
    pub worse_points: Vec<RelationshipFactor>,
    #[serde(default)]
    pub improvements_points: Vec<RelationshipFactor>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub pdf: Option<String>,
}

impl From<RemoteResponse> for EvaluationResult {
    fn from(mut response: RemoteResponse) -> Self {
        response.worse_points.truncate(FACTOR_LIMIT);
        response.improvements_points.truncate(FACTOR_LIMIT);
        EvaluationResult {
            score: response.score,
            worse_points: response.worse_points,
            improvements_points: response.improvements_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("evaluation service unreachable: {0}")]
    Unavailable(String),
    #[error("evaluation service returned status {0}")]
    Status(u16),
}

/// Sends a serialized request body and returns the raw response body.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, body: String) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Scores by posting the floors to a remote service.
#[derive(Debug, Clone)]
pub struct RemoteEvaluator<T> {
    transport: T,
}

impl<T: Transport> RemoteEvaluator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> Evaluator for RemoteEvaluator<T> {
    fn evaluate(
        &self,
        floors: Vec<FloorGrid>,
    ) -> impl Future<Output = Result<EvaluationResult, EvaluationError>> + Send {
        async move {
            let body = serde_json::to_string(&RemoteRequest::from_floors(&floors))
                .map_err(EvaluationError::Encode)?;
            let raw = self.transport.send(body).await?;
            let response: RemoteResponse =
                serde_json::from_str(&raw).map_err(EvaluationError::Decode)?;
            Ok(response.into())
        }
    }
}

//! The seam between the session and whatever computes a score.
//!
//! [`LocalEvaluator`] runs the pure scorer in-process. A deployment that
//! scores remotely plugs in [`crate::remote::RemoteEvaluator`] instead; the
//! controller treats both the same.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use habitat_logic::catalog::RelationshipCatalog;
use habitat_logic::grid::FloorGrid;
use habitat_logic::scorer::{self, EvaluationResult};

use crate::remote::TransportError;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("evaluation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("evaluation task ended without a result")]
    Interrupted,
    #[error("could not encode evaluation request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not decode evaluation response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Something that turns a snapshot of the floors into a score.
///
/// Implementations receive an owned copy of the floors, so the editor can
/// keep mutating its own state while an evaluation is in flight.
pub trait Evaluator: Send + Sync + 'static {
    fn evaluate(
        &self,
        floors: Vec<FloorGrid>,
    ) -> impl Future<Output = Result<EvaluationResult, EvaluationError>> + Send;
}

/// In-process scoring against a relationship catalog.
#[derive(Debug, Clone)]
pub struct LocalEvaluator {
    catalog: Arc<RelationshipCatalog>,
}

impl LocalEvaluator {
    pub fn new(catalog: RelationshipCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Score against the catalog shipped with `habitat-logic`.
    pub fn builtin() -> Self {
        Self::new(RelationshipCatalog::builtin().clone())
    }

    pub fn catalog(&self) -> &RelationshipCatalog {
        &self.catalog
    }
}

impl Evaluator for LocalEvaluator {
    fn evaluate(
        &self,
        floors: Vec<FloorGrid>,
    ) -> impl Future<Output = Result<EvaluationResult, EvaluationError>> + Send {
        let catalog = Arc::clone(&self.catalog);
        async move { Ok(scorer::evaluate(&floors, &catalog)) }
    }
}

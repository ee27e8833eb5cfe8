//! Relationship catalog: how desirable it is for two module types to sit
//! close to each other.
//!
//! Edges are directional: `(A, B)` and `(B, A)` are separate entries and may
//! carry different weights. Lookups never fail; a missing pair simply has no
//! edge and contributes nothing to a score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::MAX_EDGE_POINTS;
use crate::module_type::ModuleType;

const BUILTIN_JSON: &str = include_str!("../../../data/relationships.json");

/// One directional catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub with: ModuleType,
    /// Weight in `[-100, 100]`, realized in full at minimum separation.
    pub points: i32,
    pub brief_reason: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("edge {from} -> {to} has {points} points, outside [-100, 100]")]
    PointsOutOfRange {
        from: ModuleType,
        to: ModuleType,
        points: i32,
    },
    #[error("edge {from} -> {to} is defined more than once")]
    DuplicateEdge { from: ModuleType, to: ModuleType },
}

/// A pair whose two directions disagree, or whose reverse is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asymmetry {
    pub module_type: ModuleType,
    pub with: ModuleType,
    pub points: i32,
    pub reverse_points: Option<i32>,
}

/// Read-only lookup table of relationship edges.
#[derive(Debug, Clone, Default)]
pub struct RelationshipCatalog {
    edges: BTreeMap<ModuleType, BTreeMap<ModuleType, RelationshipEdge>>,
    len: usize,
}

impl RelationshipCatalog {
    /// The catalog shipped with the crate, parsed once on first use.
    ///
    /// A malformed built-in file is logged and yields an empty catalog, so
    /// scoring degrades to zero rather than taking the process down.
    pub fn builtin() -> &'static RelationshipCatalog {
        static BUILTIN: OnceLock<RelationshipCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| match RelationshipCatalog::from_json(BUILTIN_JSON) {
            Ok(catalog) => {
                log::debug!("Loaded relationship catalog with {} edges", catalog.len());
                catalog
            }
            Err(e) => {
                log::warn!("Built-in relationship catalog rejected: {}", e);
                RelationshipCatalog::default()
            }
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let edges: Vec<RelationshipEdge> = serde_json::from_str(json)?;
        Self::from_edges(edges)
    }

    pub fn from_edges(edges: Vec<RelationshipEdge>) -> Result<Self, CatalogError> {
        let mut catalog = RelationshipCatalog::default();
        for edge in edges {
            if !(-MAX_EDGE_POINTS..=MAX_EDGE_POINTS).contains(&edge.points) {
                return Err(CatalogError::PointsOutOfRange {
                    from: edge.module_type,
                    to: edge.with,
                    points: edge.points,
                });
            }
            let row = catalog.edges.entry(edge.module_type.clone()).or_default();
            if row.contains_key(&edge.with) {
                return Err(CatalogError::DuplicateEdge {
                    from: edge.module_type,
                    to: edge.with,
                });
            }
            row.insert(edge.with.clone(), edge);
            catalog.len += 1;
        }
        Ok(catalog)
    }

    /// Exact ordered-pair lookup. No symmetry is assumed.
    pub fn lookup(&self, a: &ModuleType, b: &ModuleType) -> Option<&RelationshipEdge> {
        self.edges.get(a)?.get(b)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> + '_ {
        self.edges.values().flat_map(|row| row.values())
    }

    /// Pairs where `(A, B)` and `(B, A)` differ. Each mismatched pair is
    /// reported once; a one-sided edge is reported from the side that exists.
    pub fn asymmetries(&self) -> Vec<Asymmetry> {
        let mut found = Vec::new();
        for edge in self.edges() {
            let reverse = self.lookup(&edge.with, &edge.module_type).map(|r| r.points);
            let report = match reverse {
                None => true,
                Some(p) => p != edge.points && edge.module_type < edge.with,
            };
            if report {
                found.push(Asymmetry {
                    module_type: edge.module_type.clone(),
                    with: edge.with.clone(),
                    points: edge.points,
                    reverse_points: reverse,
                });
            }
        }
        found
    }
}

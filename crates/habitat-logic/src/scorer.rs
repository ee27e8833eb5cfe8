//! Habitat layout scoring.
//!
//! Every ordered pair of placed cells with different module types is looked
//! up in the [`RelationshipCatalog`]. The catalog weight is scaled linearly by
//! separation: full weight at [`MIN_DISTANCE`], nothing at the habitat's
//! maximum reachable distance. The habitat score is the mean of all pairwise
//! points; per-type-pair means are ranked into the worst and best factors.
//!
//! The placed-module list is re-derived from the grids on every call. Nothing
//! is cached between evaluations, so a score can never drift from the layout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{RelationshipCatalog, RelationshipEdge};
use crate::constants::{FACTOR_LIMIT, MIN_DISTANCE};
use crate::distance::{distance_3d, max_reachable_distance, GridPoint};
use crate::grid::FloorGrid;
use crate::module_type::ModuleType;

/// One scored cell, identified by position only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedModule {
    pub floor_index: u32,
    pub module_type: ModuleType,
    pub x: u32,
    pub y: u32,
}

impl PlacedModule {
    pub fn point(&self) -> GridPoint {
        GridPoint::new(self.floor_index, self.x, self.y)
    }
}

/// An aggregated explanation for one ordered type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipFactor {
    pub module_type: ModuleType,
    pub with_module_type: ModuleType,
    pub points: i32,
    pub reason: String,
}

/// Score plus the three worst and three best relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: i32,
    pub worse_points: Vec<RelationshipFactor>,
    pub improvements_points: Vec<RelationshipFactor>,
}

impl EvaluationResult {
    pub fn is_empty(&self) -> bool {
        self.score == 0 && self.worse_points.is_empty() && self.improvements_points.is_empty()
    }
}

/// Flatten all scored cells, floor by floor in row-major order.
/// Corridor cells are left out.
pub fn placed_modules(floors: &[FloorGrid]) -> Vec<PlacedModule> {
    floors
        .iter()
        .enumerate()
        .flat_map(|(floor_index, floor)| {
            floor
                .occupied()
                .filter(|(_, data)| data.module_type.is_scored())
                .map(move |(cell, data)| PlacedModule {
                    floor_index: floor_index as u32,
                    module_type: data.module_type.clone(),
                    x: cell.x,
                    y: cell.y,
                })
        })
        .collect()
}

/// Points contributed by the ordered pair `(a, b)`.
///
/// `None` when the types match, the catalog has no edge, or the habitat is
/// too small to normalize against.
pub fn pairwise_points(
    a: &PlacedModule,
    b: &PlacedModule,
    max_distance: f64,
    catalog: &RelationshipCatalog,
) -> Option<i32> {
    scored_pair(a, b, max_distance, catalog).map(|(points, _)| points)
}

/// Scaled points for `(a, b)` together with the edge that produced them.
fn scored_pair<'c>(
    a: &PlacedModule,
    b: &PlacedModule,
    max_distance: f64,
    catalog: &'c RelationshipCatalog,
) -> Option<(i32, &'c RelationshipEdge)> {
    if a.module_type == b.module_type || max_distance <= MIN_DISTANCE {
        return None;
    }
    let edge = catalog.lookup(&a.module_type, &b.module_type)?;
    let points = scaled_points(distance_3d(a.point(), b.point()), max_distance, edge.points);
    Some((points, edge))
}

fn scaled_points(distance: f64, max_distance: f64, edge_points: i32) -> i32 {
    // The ceiling comes from the first floor, so pairs on a wider or taller
    // floor can sit past it. Such pairs get zero, never a flipped sign.
    let closeness = ((max_distance - distance) / (max_distance - MIN_DISTANCE)).clamp(0.0, 1.0);
    (closeness * edge_points as f64).round() as i32
}

fn mean_rounded(sum: i64, count: usize) -> i32 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as i32
}

struct FactorGroup<'a> {
    module_type: &'a ModuleType,
    with_module_type: &'a ModuleType,
    reason: &'a str,
    sum: i64,
    count: usize,
}

/// Score a layout against a catalog.
pub fn evaluate(floors: &[FloorGrid], catalog: &RelationshipCatalog) -> EvaluationResult {
    let modules = placed_modules(floors);
    if modules.len() < 2 {
        return EvaluationResult::default();
    }

    let first = &floors[0];
    let max_distance = max_reachable_distance(floors.len() as u32, first.width(), first.height());
    if max_distance <= MIN_DISTANCE {
        log::debug!(
            "Skipping evaluation: max distance {:.2} is not above the minimum",
            max_distance
        );
        return EvaluationResult::default();
    }

    let mut raw_sum: i64 = 0;
    let mut raw_count: usize = 0;
    let mut groups: Vec<FactorGroup> = Vec::new();
    let mut group_index: HashMap<(&ModuleType, &ModuleType), usize> = HashMap::new();

    for a in &modules {
        for b in &modules {
            let Some((points, edge)) = scored_pair(a, b, max_distance, catalog) else {
                continue;
            };
            raw_sum += points as i64;
            raw_count += 1;

            let idx = *group_index
                .entry((&a.module_type, &b.module_type))
                .or_insert_with(|| {
                    groups.push(FactorGroup {
                        module_type: &a.module_type,
                        with_module_type: &b.module_type,
                        reason: &edge.reason,
                        sum: 0,
                        count: 0,
                    });
                    groups.len() - 1
                });
            groups[idx].sum += points as i64;
            groups[idx].count += 1;
        }
    }

    let mut factors: Vec<RelationshipFactor> = groups
        .iter()
        .map(|g| RelationshipFactor {
            module_type: g.module_type.clone(),
            with_module_type: g.with_module_type.clone(),
            points: mean_rounded(g.sum, g.count),
            reason: g.reason.to_string(),
        })
        .collect();
    // Stable: ties keep first-seen order.
    factors.sort_by_key(|f| f.points);

    EvaluationResult {
        score: mean_rounded(raw_sum, raw_count),
        worse_points: factors.iter().take(FACTOR_LIMIT).cloned().collect(),
        improvements_points: factors.iter().rev().take(FACTOR_LIMIT).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RelationshipEdge;
    use crate::grid::{CellCoord, CellData, InstanceId};

    fn edge(a: ModuleType, b: ModuleType, points: i32) -> RelationshipEdge {
        RelationshipEdge {
            module_type: a.clone(),
            with: b.clone(),
            points,
            brief_reason: format!("{a}/{b}"),
            reason: format!("{a} with {b}"),
        }
    }

    fn put(floor: &mut FloorGrid, id: u32, t: ModuleType, x: u32, y: u32) {
        floor
            .insert(CellCoord::new(x, y), CellData::new(InstanceId(id), t))
            .unwrap();
    }

    fn module(floor: u32, t: ModuleType, x: u32, y: u32) -> PlacedModule {
        PlacedModule {
            floor_index: floor,
            module_type: t,
            x,
            y,
        }
    }

    #[test]
    fn test_empty_habitat() {
        let catalog = RelationshipCatalog::builtin();
        assert_eq!(evaluate(&[], catalog), EvaluationResult::default());
        let floors = vec![FloorGrid::new(1, 5, 5).unwrap(), FloorGrid::new(2, 5, 5).unwrap()];
        assert!(evaluate(&floors, catalog).is_empty());
    }

    #[test]
    fn test_single_module() {
        let mut floor = FloorGrid::new(1, 5, 5).unwrap();
        put(&mut floor, 1, ModuleType::Laboratory, 0, 0);
        put(&mut floor, 1, ModuleType::Laboratory, 1, 0);
        let result = evaluate(&[floor], RelationshipCatalog::builtin());
        assert!(result.is_empty());
    }

    #[test]
    fn test_numeric_example_full_weight_when_adjacent() {
        let catalog = RelationshipCatalog::from_edges(vec![edge(
            ModuleType::Laboratory,
            ModuleType::MedicalCare,
            100,
        )])
        .unwrap();
        let a = module(0, ModuleType::Laboratory, 0, 0);
        let b = module(0, ModuleType::MedicalCare, 1, 0);
        assert_eq!(pairwise_points(&a, &b, 10.0, &catalog), Some(100));
    }

    #[test]
    fn test_linear_scaling() {
        // distance 5.5 on a ceiling of 10: (10-5.5)/9 = 0.5
        assert_eq!(scaled_points(5.5, 10.0, 80), 40);
        assert_eq!(scaled_points(10.0, 10.0, 80), 0);
        assert_eq!(scaled_points(1.0, 10.0, -60), -60);
    }

    #[test]
    fn test_scaling_clamped_beyond_ceiling() {
        assert_eq!(scaled_points(14.0, 10.0, 50), 0);
    }

    #[test]
    fn test_halves_round_away_from_zero() {
        // closeness 0.5 on -3 points is -1.5
        assert_eq!(scaled_points(5.5, 10.0, -3), -2);
        assert_eq!(scaled_points(5.5, 10.0, 3), 2);
        assert_eq!(mean_rounded(-3, 2), -2);
        assert_eq!(mean_rounded(3, 2), 2);
    }

    #[test]
    fn test_same_type_never_scores() {
        let catalog = RelationshipCatalog::from_edges(vec![edge(
            ModuleType::Laboratory,
            ModuleType::Laboratory,
            90,
        )])
        .unwrap();
        let a = module(0, ModuleType::Laboratory, 0, 0);
        let b = module(0, ModuleType::Laboratory, 1, 0);
        assert_eq!(pairwise_points(&a, &b, 10.0, &catalog), None);
    }

    #[test]
    fn test_degenerate_geometry_skips() {
        let catalog = RelationshipCatalog::builtin();
        let a = module(0, ModuleType::PrivateCrewQuarters, 0, 0);
        let b = module(0, ModuleType::RadiationShelter, 1, 0);
        assert_eq!(pairwise_points(&a, &b, MIN_DISTANCE, catalog), None);
    }

    #[test]
    fn test_corridor_excluded() {
        let mut floor = FloorGrid::new(1, 4, 4).unwrap();
        put(&mut floor, 1, ModuleType::Corridor, 0, 0);
        put(&mut floor, 2, ModuleType::Laboratory, 1, 0);
        assert_eq!(placed_modules(&[floor.clone()]).len(), 1);
        assert!(evaluate(&[floor], RelationshipCatalog::builtin()).is_empty());
    }

    #[test]
    fn test_missing_edges_contribute_nothing() {
        let mut floor = FloorGrid::new(1, 4, 4).unwrap();
        put(&mut floor, 1, ModuleType::parse("hangar"), 0, 0);
        put(&mut floor, 2, ModuleType::Laboratory, 1, 0);
        assert!(evaluate(&[floor], RelationshipCatalog::builtin()).is_empty());
    }

    #[test]
    fn test_directional_factors_and_mixed_score() {
        let catalog = RelationshipCatalog::from_edges(vec![
            edge(ModuleType::Laboratory, ModuleType::Airlock, 90),
            edge(ModuleType::Airlock, ModuleType::Laboratory, -90),
        ])
        .unwrap();
        let mut floor = FloorGrid::new(1, 10, 10).unwrap();
        put(&mut floor, 1, ModuleType::Laboratory, 0, 0);
        put(&mut floor, 2, ModuleType::Airlock, 1, 0);
        let result = evaluate(&[floor], &catalog);

        // The two directions cancel in the score but stay separate factors.
        assert_eq!(result.score, 0);
        assert_eq!(result.worse_points[0].module_type, ModuleType::Airlock);
        assert_eq!(result.worse_points[0].points, -90);
        assert_eq!(result.improvements_points[0].module_type, ModuleType::Laboratory);
        assert_eq!(result.improvements_points[0].points, 90);
        assert_eq!(result.improvements_points[0].reason, "laboratory with airlock");
    }

    #[test]
    fn test_score_is_mean_of_raw_pairs() {
        let catalog = RelationshipCatalog::from_edges(vec![
            edge(ModuleType::Laboratory, ModuleType::MedicalCare, 100),
            edge(ModuleType::MedicalCare, ModuleType::Laboratory, 100),
        ])
        .unwrap();
        // 10×1 floor: ceiling is 9. Two lab cells at 2 and 1 units from the
        // med cell give 88 and 100 in each direction.
        let mut floor = FloorGrid::new(1, 10, 1).unwrap();
        put(&mut floor, 1, ModuleType::Laboratory, 0, 0);
        put(&mut floor, 1, ModuleType::Laboratory, 1, 0);
        put(&mut floor, 2, ModuleType::MedicalCare, 2, 0);
        let result = evaluate(&[floor], &catalog);

        assert_eq!(result.score, 94);
        assert_eq!(result.improvements_points.len(), 2);
        assert_eq!(result.worse_points.len(), 2);
        assert!(result.improvements_points.iter().all(|f| f.points == 94));
    }

    #[test]
    fn test_score_agrees_with_pairwise_points() {
        let catalog = RelationshipCatalog::builtin();
        let mut ground = FloorGrid::new(1, 7, 5).unwrap();
        put(&mut ground, 1, ModuleType::PrivateCrewQuarters, 0, 0);
        put(&mut ground, 2, ModuleType::ExerciseArea, 3, 1);
        put(&mut ground, 3, ModuleType::RadiationShelter, 6, 4);
        let mut upper = FloorGrid::new(2, 7, 5).unwrap();
        put(&mut upper, 4, ModuleType::Airlock, 2, 2);
        let floors = [ground, upper];

        let max = max_reachable_distance(2, 7, 5);
        let modules = placed_modules(&floors);
        let points: Vec<i32> = modules
            .iter()
            .flat_map(|a| modules.iter().map(move |b| (a, b)))
            .filter_map(|(a, b)| pairwise_points(a, b, max, catalog))
            .collect();
        assert!(!points.is_empty());
        let sum: i64 = points.iter().map(|&p| p as i64).sum();
        assert_eq!(evaluate(&floors, catalog).score, mean_rounded(sum, points.len()));
    }

    #[test]
    fn test_wider_upper_floor_clamps_to_zero() {
        let catalog = RelationshipCatalog::from_edges(vec![edge(
            ModuleType::Laboratory,
            ModuleType::MedicalCare,
            80,
        )])
        .unwrap();
        // Ceiling from a 2×2 first floor is about 3.3; these cells are 19 apart.
        let ground = FloorGrid::new(1, 2, 2).unwrap();
        let mut upper = FloorGrid::new(2, 20, 1).unwrap();
        put(&mut upper, 1, ModuleType::Laboratory, 0, 0);
        put(&mut upper, 2, ModuleType::MedicalCare, 19, 0);
        let result = evaluate(&[ground, upper], &catalog);

        assert_eq!(result.score, 0);
        assert_eq!(result.improvements_points.len(), 1);
        assert_eq!(result.improvements_points[0].points, 0);
    }

    #[test]
    fn test_factor_lists_limited_and_ordered() {
        let catalog = RelationshipCatalog::builtin();
        let mut floor = FloorGrid::new(1, 8, 8).unwrap();
        let types = [
            ModuleType::PrivateCrewQuarters,
            ModuleType::CommonKitchenAndMess,
            ModuleType::ExerciseArea,
            ModuleType::HygieneAndWaste,
            ModuleType::RadiationShelter,
            ModuleType::MaintenanceWorkshop,
            ModuleType::StorageAndLogistics,
        ];
        for (i, t) in types.iter().enumerate() {
            put(&mut floor, i as u32 + 1, t.clone(), (i as u32 * 3) % 8, i as u32);
        }
        let result = evaluate(&[floor], catalog);
        assert_eq!(result.worse_points.len(), FACTOR_LIMIT);
        assert_eq!(result.improvements_points.len(), FACTOR_LIMIT);
        assert!(result.worse_points.windows(2).all(|w| w[0].points <= w[1].points));
        assert!(result
            .improvements_points
            .windows(2)
            .all(|w| w[0].points >= w[1].points));
        assert!(result.worse_points[0].points < 0);
        assert!(result.improvements_points[0].points > 0);
    }

    #[test]
    fn test_multi_floor_uses_vertical_distance() {
        let catalog = RelationshipCatalog::from_edges(vec![
            edge(ModuleType::Laboratory, ModuleType::MedicalCare, 60),
            edge(ModuleType::MedicalCare, ModuleType::Laboratory, 60),
        ])
        .unwrap();
        let mut ground = FloorGrid::new(1, 6, 6).unwrap();
        let mut upper = FloorGrid::new(2, 6, 6).unwrap();
        put(&mut ground, 1, ModuleType::Laboratory, 2, 2);
        put(&mut upper, 2, ModuleType::MedicalCare, 2, 2);
        let stacked = evaluate(&[ground.clone(), upper], &catalog);

        let mut side_by_side = ground;
        put(&mut side_by_side, 2, ModuleType::MedicalCare, 3, 2);
        let adjacent = evaluate(&[side_by_side, FloorGrid::new(2, 6, 6).unwrap()], &catalog);

        assert!(stacked.score > 0);
        assert!(adjacent.score > stacked.score);
    }
}

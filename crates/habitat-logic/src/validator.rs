//! Placement validation for the habitat editor.
//!
//! Pure decision functions: they read the floors and return an outcome, and
//! never mutate anything. Writing the cell and drawing inventory is the
//! caller's job once a placement is accepted.
//!
//! Rules run in a fixed order and the first failing rule wins. The order is
//! part of the contract: an occupied cell reports `Occupied` even when it also
//! lacks support from the floor below.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::grid::{CellCoord, FloorGrid, InstanceId};
use crate::module_type::ModuleType;

/// How the editor should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    Success,
}

/// Which rule rejected the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    NoSelection,
    NoneRemaining,
    OutOfBounds,
    Occupied,
    MissingSupport,
    SurroundLock,
    EmptyCell,
    SupportsUpperFloor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: ViolationRule,
    pub message: String,
    pub kind: MessageKind,
    /// Whether the editor should flash the offending cell.
    pub should_flash: bool,
}

impl Violation {
    pub fn new(rule: ViolationRule, kind: MessageKind, should_flash: bool, message: String) -> Self {
        Self {
            rule,
            message,
            kind,
            should_flash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Accepted,
    Rejected(Violation),
}

impl PlacementOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PlacementOutcome::Accepted)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            PlacementOutcome::Accepted => None,
            PlacementOutcome::Rejected(v) => Some(v),
        }
    }
}

/// Boundary shape handed to the editor layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl From<PlacementOutcome> for PlacementDecision {
    fn from(outcome: PlacementOutcome) -> Self {
        match outcome {
            PlacementOutcome::Accepted => PlacementDecision {
                allowed: true,
                violation: None,
            },
            PlacementOutcome::Rejected(v) => PlacementDecision {
                allowed: false,
                violation: Some(v),
            },
        }
    }
}

/// The module or tool currently picked in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAsset {
    pub instance: InstanceId,
    pub module_type: ModuleType,
}

/// Everything a placement decision looks at.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    pub cell: CellCoord,
    pub selected: Option<&'a SelectedAsset>,
    /// Cells of the selected asset still available to place.
    pub remaining: u32,
    pub floor_index: usize,
    pub floors: &'a [FloorGrid],
}

type PlacementRule = fn(&PlacementContext) -> Option<Violation>;

/// Rule chain, in evaluation order.
const PLACEMENT_RULES: [PlacementRule; 6] = [
    check_selection,
    check_remaining,
    check_in_bounds,
    check_unoccupied,
    check_floor_support,
    check_surround_lock,
];

/// Decide whether the selected asset may be placed at `ctx.cell`.
pub fn validate_placement(ctx: &PlacementContext) -> PlacementOutcome {
    for rule in PLACEMENT_RULES {
        if let Some(violation) = rule(ctx) {
            return PlacementOutcome::Rejected(violation);
        }
    }
    PlacementOutcome::Accepted
}

// ── Placement rules ─────────────────────────────────────────────────────

fn check_selection(ctx: &PlacementContext) -> Option<Violation> {
    ctx.selected.is_none().then(|| {
        Violation::new(
            ViolationRule::NoSelection,
            MessageKind::Info,
            false,
            "Select a module or tool before placing".to_string(),
        )
    })
}

fn check_remaining(ctx: &PlacementContext) -> Option<Violation> {
    let selected = ctx.selected?;
    (ctx.remaining == 0).then(|| {
        Violation::new(
            ViolationRule::NoneRemaining,
            MessageKind::Warning,
            false,
            format!("No {} cells left to place", selected.module_type),
        )
    })
}

fn check_in_bounds(ctx: &PlacementContext) -> Option<Violation> {
    let inside = ctx
        .floors
        .get(ctx.floor_index)
        .is_some_and(|floor| floor.contains(ctx.cell));
    (!inside).then(|| out_of_bounds(ctx.cell, ctx.floor_index))
}

fn check_unoccupied(ctx: &PlacementContext) -> Option<Violation> {
    let floor = ctx.floors.get(ctx.floor_index)?;
    floor
        .is_occupied(ctx.cell)
        .then(|| occupied(ctx.cell))
}

fn check_floor_support(ctx: &PlacementContext) -> Option<Violation> {
    (!is_supported(ctx.floors, ctx.floor_index, ctx.cell))
        .then(|| missing_support(ctx.cell, ctx.floor_index))
}

/// Refuse to fill the last gap inside a single other module: a cell whose four
/// neighbours all belong to one instance different from the one being placed.
/// Cells on the floor edge never trigger this rule.
fn check_surround_lock(ctx: &PlacementContext) -> Option<Violation> {
    let selected = ctx.selected?;
    let floor = ctx.floors.get(ctx.floor_index)?;

    let neighbors: Vec<CellCoord> = floor.neighbors(ctx.cell).collect();
    if neighbors.len() < 4 {
        return None;
    }
    let mut instances = neighbors.iter().map(|&n| floor.get(n).map(|d| d.instance));
    let first = instances.next()??;
    if !instances.all(|i| i == Some(first)) || first == selected.instance {
        return None;
    }
    Some(Violation::new(
        ViolationRule::SurroundLock,
        MessageKind::Warning,
        true,
        format!(
            "Placing at ({},{}) would seal off module {}",
            ctx.cell.x, ctx.cell.y, first
        ),
    ))
}

// ── Shared checks and messages ──────────────────────────────────────────

/// Ground-floor cells are always supported; higher cells need the same cell
/// occupied on the floor directly below.
fn is_supported(floors: &[FloorGrid], floor_index: usize, cell: CellCoord) -> bool {
    floor_index == 0
        || floors
            .get(floor_index - 1)
            .is_some_and(|below| below.is_occupied(cell))
}

fn out_of_bounds(cell: CellCoord, floor_index: usize) -> Violation {
    Violation::new(
        ViolationRule::OutOfBounds,
        MessageKind::Error,
        true,
        format!("Cell ({},{}) is outside floor {}", cell.x, cell.y, floor_index),
    )
}

fn occupied(cell: CellCoord) -> Violation {
    Violation::new(
        ViolationRule::Occupied,
        MessageKind::Error,
        true,
        format!("Cell ({},{}) is already occupied", cell.x, cell.y),
    )
}

fn missing_support(cell: CellCoord, floor_index: usize) -> Violation {
    Violation::new(
        ViolationRule::MissingSupport,
        MessageKind::Warning,
        true,
        format!(
            "Cell ({},{}) on floor {} needs a module below it on floor {}",
            cell.x,
            cell.y,
            floor_index,
            floor_index.saturating_sub(1)
        ),
    )
}

fn supports_upper(cell: CellCoord, floor_index: usize) -> Violation {
    Violation::new(
        ViolationRule::SupportsUpperFloor,
        MessageKind::Warning,
        true,
        format!(
            "Cell ({},{}) holds up a module on floor {}",
            cell.x,
            cell.y,
            floor_index + 1
        ),
    )
}

fn holds_up_upper_floor(floors: &[FloorGrid], floor_index: usize, cell: CellCoord) -> bool {
    floors
        .get(floor_index + 1)
        .is_some_and(|above| above.is_occupied(cell))
}

// ── Erase & move ────────────────────────────────────────────────────────

/// Decide whether the cell at `cell` may be cleared.
///
/// Clearing an empty cell is informational. Clearing a cell that supports an
/// occupied cell on the floor above would leave it floating, so it is refused.
pub fn validate_erase(floor_index: usize, cell: CellCoord, floors: &[FloorGrid]) -> PlacementOutcome {
    let Some(floor) = floors.get(floor_index).filter(|f| f.contains(cell)) else {
        return PlacementOutcome::Rejected(out_of_bounds(cell, floor_index));
    };
    if !floor.is_occupied(cell) {
        return PlacementOutcome::Rejected(Violation::new(
            ViolationRule::EmptyCell,
            MessageKind::Info,
            false,
            format!("Cell ({},{}) is already empty", cell.x, cell.y),
        ));
    }
    if holds_up_upper_floor(floors, floor_index, cell) {
        return PlacementOutcome::Rejected(supports_upper(cell, floor_index));
    }
    PlacementOutcome::Accepted
}

/// Decide whether `cluster` (all cells of `instance`) may be translated by
/// `(dx, dy)` on its floor.
///
/// Destination cells must be in bounds, free of other instances, and
/// supported from below. Cells the cluster vacates must not be holding up
/// anything on the floor above.
pub fn validate_move(
    cluster: &[CellCoord],
    instance: InstanceId,
    (dx, dy): (i32, i32),
    floor_index: usize,
    floors: &[FloorGrid],
) -> PlacementOutcome {
    let Some(floor) = floors.get(floor_index) else {
        let origin = cluster.first().copied().unwrap_or(CellCoord::new(0, 0));
        return PlacementOutcome::Rejected(out_of_bounds(origin, floor_index));
    };

    let mut destinations = HashSet::with_capacity(cluster.len());
    for &cell in cluster {
        let Some(target) = cell.offset(dx, dy).filter(|&t| floor.contains(t)) else {
            return PlacementOutcome::Rejected(out_of_bounds(cell, floor_index));
        };
        if floor.get(target).is_some_and(|d| d.instance != instance) {
            return PlacementOutcome::Rejected(occupied(target));
        }
        if !is_supported(floors, floor_index, target) {
            return PlacementOutcome::Rejected(missing_support(target, floor_index));
        }
        destinations.insert(target);
    }

    for &cell in cluster {
        if !destinations.contains(&cell) && holds_up_upper_floor(floors, floor_index, cell) {
            return PlacementOutcome::Rejected(supports_upper(cell, floor_index));
        }
    }
    PlacementOutcome::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellData;

    fn floors(count: usize, w: u32, h: u32) -> Vec<FloorGrid> {
        (0..count)
            .map(|i| FloorGrid::new(i as i32 + 1, w, h).unwrap())
            .collect()
    }

    fn fill(floor: &mut FloorGrid, id: u32, t: ModuleType, cells: &[(u32, u32)]) {
        for &(x, y) in cells {
            floor
                .insert(CellCoord::new(x, y), CellData::new(InstanceId(id), t.clone()))
                .unwrap();
        }
    }

    fn asset(id: u32, t: ModuleType) -> SelectedAsset {
        SelectedAsset {
            instance: InstanceId(id),
            module_type: t,
        }
    }

    fn ctx<'a>(
        floors: &'a [FloorGrid],
        selected: Option<&'a SelectedAsset>,
        floor_index: usize,
        x: u32,
        y: u32,
    ) -> PlacementContext<'a> {
        PlacementContext {
            cell: CellCoord::new(x, y),
            selected,
            remaining: 5,
            floor_index,
            floors,
        }
    }

    fn rule_of(outcome: PlacementOutcome) -> Option<ViolationRule> {
        outcome.violation().map(|v| v.rule)
    }

    #[test]
    fn test_no_selection_is_info_regardless_of_occupancy() {
        let mut fs = floors(2, 4, 4);
        fill(&mut fs[1], 1, ModuleType::Laboratory, &[(1, 1)]);
        for (fi, x, y) in [(0, 0, 0), (1, 1, 1), (1, 3, 3), (0, 9, 9)] {
            let outcome = validate_placement(&ctx(&fs, None, fi, x, y));
            let v = outcome.violation().unwrap();
            assert_eq!(v.rule, ViolationRule::NoSelection);
            assert_eq!(v.kind, MessageKind::Info);
            assert!(!v.should_flash);
        }
    }

    #[test]
    fn test_none_remaining_is_warning_without_flash() {
        let fs = floors(1, 4, 4);
        let a = asset(1, ModuleType::Laboratory);
        let mut c = ctx(&fs, Some(&a), 0, 0, 0);
        c.remaining = 0;
        let outcome = validate_placement(&c);
        let v = outcome.violation().unwrap();
        assert_eq!(v.rule, ViolationRule::NoneRemaining);
        assert_eq!(v.kind, MessageKind::Warning);
        assert!(!v.should_flash);
    }

    #[test]
    fn test_out_of_bounds() {
        let fs = floors(1, 4, 4);
        let a = asset(1, ModuleType::Laboratory);
        assert_eq!(
            rule_of(validate_placement(&ctx(&fs, Some(&a), 0, 4, 0))),
            Some(ViolationRule::OutOfBounds)
        );
        assert_eq!(
            rule_of(validate_placement(&ctx(&fs, Some(&a), 3, 0, 0))),
            Some(ViolationRule::OutOfBounds)
        );
    }

    #[test]
    fn test_occupied_wins_over_missing_support() {
        let mut fs = floors(2, 4, 4);
        fill(&mut fs[1], 9, ModuleType::Airlock, &[(2, 2)]);
        let a = asset(1, ModuleType::Laboratory);
        let outcome = validate_placement(&ctx(&fs, Some(&a), 1, 2, 2));
        let v = outcome.violation().unwrap();
        assert_eq!(v.rule, ViolationRule::Occupied);
        assert_eq!(v.kind, MessageKind::Error);
        assert!(v.should_flash);
    }

    #[test]
    fn test_floor_support_scenario() {
        let mut fs = floors(2, 5, 5);
        let a = asset(1, ModuleType::Laboratory);
        let outcome = validate_placement(&ctx(&fs, Some(&a), 1, 2, 2));
        let v = outcome.violation().unwrap();
        assert_eq!(v.rule, ViolationRule::MissingSupport);
        assert_eq!(v.kind, MessageKind::Warning);
        assert!(v.should_flash);

        fill(&mut fs[0], 2, ModuleType::StorageAndLogistics, &[(2, 2)]);
        assert!(validate_placement(&ctx(&fs, Some(&a), 1, 2, 2)).is_accepted());
    }

    #[test]
    fn test_ground_floor_needs_no_support() {
        let fs = floors(2, 5, 5);
        let a = asset(1, ModuleType::Laboratory);
        assert!(validate_placement(&ctx(&fs, Some(&a), 0, 2, 2)).is_accepted());
    }

    fn ring_3x3(id: u32) -> Vec<FloorGrid> {
        let mut fs = floors(1, 3, 3);
        let ring: Vec<(u32, u32)> = (0..3)
            .flat_map(|y| (0..3).map(move |x| (x, y)))
            .filter(|&c| c != (1, 1))
            .collect();
        fill(&mut fs[0], id, ModuleType::CommonKitchenAndMess, &ring);
        fs
    }

    #[test]
    fn test_surround_lock_rejects_other_instance() {
        let fs = ring_3x3(7);
        let other = asset(8, ModuleType::Laboratory);
        let outcome = validate_placement(&ctx(&fs, Some(&other), 0, 1, 1));
        let v = outcome.violation().unwrap();
        assert_eq!(v.rule, ViolationRule::SurroundLock);
        assert_eq!(v.kind, MessageKind::Warning);
        assert!(v.should_flash);
    }

    #[test]
    fn test_surround_lock_allows_same_instance() {
        let fs = ring_3x3(7);
        let same = asset(7, ModuleType::CommonKitchenAndMess);
        assert!(validate_placement(&ctx(&fs, Some(&same), 0, 1, 1)).is_accepted());
    }

    #[test]
    fn test_surround_lock_skipped_at_edge() {
        let mut fs = floors(1, 3, 3);
        fill(&mut fs[0], 7, ModuleType::Laboratory, &[(0, 0), (2, 0), (1, 1)]);
        let other = asset(8, ModuleType::Airlock);
        assert!(validate_placement(&ctx(&fs, Some(&other), 0, 1, 0)).is_accepted());
    }

    #[test]
    fn test_surround_lock_skipped_for_mixed_neighbours() {
        let mut fs = floors(1, 3, 3);
        fill(&mut fs[0], 7, ModuleType::Laboratory, &[(1, 0), (0, 1), (2, 1)]);
        fill(&mut fs[0], 9, ModuleType::Airlock, &[(1, 2)]);
        let other = asset(8, ModuleType::MedicalCare);
        assert!(validate_placement(&ctx(&fs, Some(&other), 0, 1, 1)).is_accepted());
    }

    #[test]
    fn test_surround_lock_skipped_when_neighbour_empty() {
        let mut fs = floors(1, 3, 3);
        fill(&mut fs[0], 7, ModuleType::Laboratory, &[(1, 0), (0, 1), (2, 1)]);
        let other = asset(8, ModuleType::MedicalCare);
        assert!(validate_placement(&ctx(&fs, Some(&other), 0, 1, 1)).is_accepted());
    }

    #[test]
    fn test_decision_shape() {
        let fs = floors(1, 3, 3);
        let decision: PlacementDecision = validate_placement(&ctx(&fs, None, 0, 0, 0)).into();
        assert!(!decision.allowed);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["violation"]["kind"], "info");
        assert_eq!(json["violation"]["should_flash"], false);

        let a = asset(1, ModuleType::Laboratory);
        let ok: PlacementDecision = validate_placement(&ctx(&fs, Some(&a), 0, 0, 0)).into();
        assert!(ok.allowed);
        assert!(serde_json::to_value(&ok).unwrap().get("violation").is_none());
    }

    #[test]
    fn test_erase_rules() {
        let mut fs = floors(2, 4, 4);
        fill(&mut fs[0], 1, ModuleType::StorageAndLogistics, &[(0, 0), (1, 0)]);
        fill(&mut fs[1], 2, ModuleType::Laboratory, &[(1, 0)]);

        assert_eq!(
            rule_of(validate_erase(0, CellCoord::new(3, 3), &fs)),
            Some(ViolationRule::EmptyCell)
        );
        assert_eq!(
            rule_of(validate_erase(0, CellCoord::new(1, 0), &fs)),
            Some(ViolationRule::SupportsUpperFloor)
        );
        assert_eq!(
            rule_of(validate_erase(0, CellCoord::new(8, 0), &fs)),
            Some(ViolationRule::OutOfBounds)
        );
        assert!(validate_erase(0, CellCoord::new(0, 0), &fs).is_accepted());
        assert!(validate_erase(1, CellCoord::new(1, 0), &fs).is_accepted());
    }

    #[test]
    fn test_move_into_free_space() {
        let mut fs = floors(1, 5, 5);
        let cluster = [CellCoord::new(0, 0), CellCoord::new(1, 0)];
        fill(&mut fs[0], 1, ModuleType::Laboratory, &[(0, 0), (1, 0)]);
        // Overlapping its own footprint is fine.
        assert!(validate_move(&cluster, InstanceId(1), (1, 0), 0, &fs).is_accepted());
        assert!(validate_move(&cluster, InstanceId(1), (2, 3), 0, &fs).is_accepted());
    }

    #[test]
    fn test_move_blocked() {
        let mut fs = floors(2, 5, 5);
        fill(&mut fs[0], 1, ModuleType::Laboratory, &[(0, 0), (1, 0)]);
        fill(&mut fs[0], 2, ModuleType::Airlock, &[(3, 0)]);
        let cluster = [CellCoord::new(0, 0), CellCoord::new(1, 0)];

        assert_eq!(
            rule_of(validate_move(&cluster, InstanceId(1), (2, 0), 0, &fs)),
            Some(ViolationRule::Occupied)
        );
        assert_eq!(
            rule_of(validate_move(&cluster, InstanceId(1), (-1, 0), 0, &fs)),
            Some(ViolationRule::OutOfBounds)
        );

        fill(&mut fs[1], 3, ModuleType::MedicalCare, &[(0, 0)]);
        assert_eq!(
            rule_of(validate_move(&cluster, InstanceId(1), (0, 2), 0, &fs)),
            Some(ViolationRule::SupportsUpperFloor)
        );
    }

    #[test]
    fn test_move_on_upper_floor_needs_support() {
        let mut fs = floors(2, 5, 5);
        fill(&mut fs[0], 1, ModuleType::StorageAndLogistics, &[(0, 0), (1, 0), (2, 0)]);
        fill(&mut fs[1], 2, ModuleType::Laboratory, &[(0, 0)]);
        let cluster = [CellCoord::new(0, 0)];
        assert!(validate_move(&cluster, InstanceId(2), (2, 0), 1, &fs).is_accepted());
        assert_eq!(
            rule_of(validate_move(&cluster, InstanceId(2), (3, 0), 1, &fs)),
            Some(ViolationRule::MissingSupport)
        );
    }
}

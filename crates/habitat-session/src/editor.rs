//! Editing session: owns the floors and inventory, applies validated edits,
//! and keeps the score controller informed.
//!
//! Every edit runs the matching validator first and mutates nothing on
//! rejection. Accepted edits bump the controller generation exactly once.

use std::collections::HashMap;
use thiserror::Error;

use habitat_logic::connectivity::{clamp_offset, connected_cells};
use habitat_logic::grid::{CellCoord, CellData, FloorGrid, GridError, InstanceId};
use habitat_logic::inventory::{Inventory, InventoryError};
use habitat_logic::module_type::ModuleType;
use habitat_logic::validator::{
    validate_erase, validate_move, validate_placement, MessageKind, PlacementContext,
    PlacementOutcome, SelectedAsset, Violation, ViolationRule,
};

use crate::config::SessionConfig;
use crate::controller::{ScoreSessionController, ScoreSnapshot};
use crate::evaluator::Evaluator;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("module {0} was never added to this session")]
    UnknownInstance(InstanceId),
    #[error("floor {0} does not exist")]
    UnknownFloor(usize),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

pub struct EditorSession<E: Evaluator> {
    floors: Vec<FloorGrid>,
    inventory: Inventory,
    instance_types: HashMap<InstanceId, ModuleType>,
    selected: Option<SelectedAsset>,
    controller: ScoreSessionController<E>,
    next_instance: u32,
}

impl<E: Evaluator> EditorSession<E> {
    pub fn new(floors: Vec<FloorGrid>, evaluator: E, config: SessionConfig) -> Self {
        Self {
            floors,
            inventory: Inventory::new(),
            instance_types: HashMap::new(),
            selected: None,
            controller: ScoreSessionController::new(evaluator, config),
            next_instance: 1,
        }
    }

    /// `count` empty floors of identical size, levels numbered from 1.
    pub fn with_empty_floors(
        count: usize,
        width: u32,
        height: u32,
        evaluator: E,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let floors = (0..count)
            .map(|i| FloorGrid::new(i as i32 + 1, width, height))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(floors, evaluator, config))
    }

    pub fn floors(&self) -> &[FloorGrid] {
        &self.floors
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn controller(&self) -> &ScoreSessionController<E> {
        &self.controller
    }

    pub fn module_type(&self, instance: InstanceId) -> Option<&ModuleType> {
        self.instance_types.get(&instance)
    }

    /// Register a new module instance with `cells` placeable cells.
    pub fn add_module(&mut self, module_type: ModuleType, cells: u32) -> InstanceId {
        let instance = InstanceId(self.next_instance);
        self.next_instance += 1;
        log::info!("Added {} ({}) with {} cells", instance, module_type, cells);
        self.instance_types.insert(instance, module_type);
        self.inventory.stock(instance, cells);
        instance
    }

    pub fn select(&mut self, instance: InstanceId) -> Result<(), SessionError> {
        let module_type = self
            .instance_types
            .get(&instance)
            .ok_or(SessionError::UnknownInstance(instance))?
            .clone();
        self.selected = Some(SelectedAsset {
            instance,
            module_type,
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&SelectedAsset> {
        self.selected.as_ref()
    }

    /// Dry-run of [`Self::place`] for hover feedback.
    pub fn check_placement(&self, floor_index: usize, cell: CellCoord) -> PlacementOutcome {
        let remaining = self
            .selected
            .as_ref()
            .map_or(0, |s| self.inventory.remaining(s.instance));
        validate_placement(&PlacementContext {
            cell,
            selected: self.selected.as_ref(),
            remaining,
            floor_index,
            floors: &self.floors,
        })
    }

    /// Place one cell of the selected module.
    pub fn place(
        &mut self,
        floor_index: usize,
        cell: CellCoord,
    ) -> Result<PlacementOutcome, SessionError> {
        let outcome = self.check_placement(floor_index, cell);
        let Some(selected) = self.selected.clone().filter(|_| outcome.is_accepted()) else {
            return Ok(rejected(outcome));
        };

        self.inventory.draw(selected.instance)?;
        self.floor_mut(floor_index)?
            .insert(cell, CellData::new(selected.instance, selected.module_type))?;
        self.controller.occupancy_changed(&self.floors);
        Ok(outcome)
    }

    /// Clear one cell and return it to its module's inventory.
    pub fn erase(
        &mut self,
        floor_index: usize,
        cell: CellCoord,
    ) -> Result<PlacementOutcome, SessionError> {
        let outcome = validate_erase(floor_index, cell, &self.floors);
        if !outcome.is_accepted() {
            return Ok(rejected(outcome));
        }

        if let Some(data) = self.floor_mut(floor_index)?.remove(cell) {
            self.inventory.restore(data.instance)?;
        }
        self.controller.occupancy_changed(&self.floors);
        Ok(outcome)
    }

    /// Translate the whole module under `grab` by `(dx, dy)`.
    ///
    /// The offset is first clamped so the footprint stays on the floor; a
    /// move that clamps to nothing is accepted without touching the layout.
    pub fn move_cluster(
        &mut self,
        floor_index: usize,
        grab: CellCoord,
        dx: i32,
        dy: i32,
    ) -> Result<PlacementOutcome, SessionError> {
        let floor = self
            .floors
            .get(floor_index)
            .ok_or(SessionError::UnknownFloor(floor_index))?;
        let Some(instance) = floor.get(grab).map(|d| d.instance) else {
            return Ok(rejected(PlacementOutcome::Rejected(Violation::new(
                ViolationRule::EmptyCell,
                MessageKind::Info,
                false,
                format!("Nothing to move at ({},{})", grab.x, grab.y),
            ))));
        };

        let cluster = connected_cells(grab, instance, floor);
        let (dx, dy) = clamp_offset(&cluster, dx, dy, floor.width(), floor.height());
        if (dx, dy) == (0, 0) {
            return Ok(PlacementOutcome::Accepted);
        }

        let outcome = validate_move(&cluster, instance, (dx, dy), floor_index, &self.floors);
        if !outcome.is_accepted() {
            return Ok(rejected(outcome));
        }

        let floor = self.floor_mut(floor_index)?;
        let (width, height) = (floor.width(), floor.height());
        let lifted: Vec<(CellCoord, CellData)> = cluster
            .iter()
            .filter_map(|&c| floor.remove(c).map(|d| (c, d)))
            .collect();
        for (cell, data) in lifted {
            let target = cell.offset(dx, dy).ok_or(GridError::OutOfBounds {
                x: cell.x,
                y: cell.y,
                width,
                height,
            })?;
            floor.insert(target, data)?;
        }
        log::debug!(
            "Moved {} ({} cells) by ({}, {}) on floor {}",
            instance,
            cluster.len(),
            dx,
            dy,
            floor_index
        );
        self.controller.occupancy_changed(&self.floors);
        Ok(outcome)
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.controller.snapshot()
    }

    /// Wait for the score of the current layout.
    pub async fn settle(&mut self) -> ScoreSnapshot {
        self.controller.settle().await
    }

    fn floor_mut(&mut self, floor_index: usize) -> Result<&mut FloorGrid, SessionError> {
        self.floors
            .get_mut(floor_index)
            .ok_or(SessionError::UnknownFloor(floor_index))
    }
}

fn rejected(outcome: PlacementOutcome) -> PlacementOutcome {
    if let Some(v) = outcome.violation() {
        log::debug!("Rejected ({:?}): {}", v.rule, v.message);
    }
    outcome
}

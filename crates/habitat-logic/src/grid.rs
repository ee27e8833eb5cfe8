//! Floor occupancy grids.
//!
//! Each floor is a fixed-size arena of optional cells indexed by
//! `y * width + x`. Cells sharing an [`InstanceId`] form one physical module.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::appearance;
use crate::module_type::ModuleType;

/// Identifies one placed module instance (possibly spanning many cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst-{}", self.0)
    }
}

/// A cell position on a single floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The `"x,y"` key used by editor layers that address cells by string.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<CellCoord> {
        let (x, y) = key.split_once(',')?;
        Some(CellCoord {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }

    /// Translate by a signed offset. `None` if either axis would go negative.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<CellCoord> {
        Some(CellCoord {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

/// Contents of an occupied cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub instance: InstanceId,
    pub module_type: ModuleType,
    pub color: String,
    pub texture_ref: String,
    pub texture_variant: u8,
}

impl CellData {
    pub fn new(instance: InstanceId, module_type: ModuleType) -> Self {
        let (color, texture) = if module_type.is_corridor() {
            (appearance::CORRIDOR_COLOR, appearance::CORRIDOR_TEXTURE)
        } else {
            (appearance::DEFAULT_COLOR, appearance::DEFAULT_TEXTURE)
        };
        Self {
            instance,
            module_type,
            color: color.to_string(),
            texture_ref: texture.to_string(),
            texture_variant: 0,
        }
    }

    pub fn with_appearance(mut self, color: &str, texture_ref: &str, texture_variant: u8) -> Self {
        self.color = color.to_string();
        self.texture_ref = texture_ref.to_string();
        self.texture_variant = texture_variant;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("floor dimensions must be positive, got {width}×{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("cell ({x},{y}) is outside a {width}×{height} floor")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// One floor of the habitat.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorGrid {
    level: i32,
    width: u32,
    height: u32,
    cells: Vec<Option<CellData>>,
}

impl FloorGrid {
    pub fn new(level: i32, width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions { width, height });
        }
        Ok(Self {
            level,
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        })
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    pub fn get(&self, cell: CellCoord) -> Option<&CellData> {
        self.index(cell).and_then(|i| self.cells[i].as_ref())
    }

    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.get(cell).is_some()
    }

    /// Write a cell, returning whatever was there before.
    pub fn insert(&mut self, cell: CellCoord, data: CellData) -> Result<Option<CellData>, GridError> {
        let i = self.index(cell).ok_or(GridError::OutOfBounds {
            x: cell.x,
            y: cell.y,
            width: self.width,
            height: self.height,
        })?;
        Ok(self.cells[i].replace(data))
    }

    pub fn remove(&mut self, cell: CellCoord) -> Option<CellData> {
        let i = self.index(cell)?;
        self.cells[i].take()
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (CellCoord, &CellData)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.as_ref().map(|data| {
                (
                    CellCoord::new((i % width) as u32, (i / width) as u32),
                    data,
                )
            })
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// In-bounds orthogonal neighbours (up to four).
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        static DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        DIRS.iter()
            .filter_map(move |&(dx, dy)| cell.offset(dx, dy))
            .filter(move |&n| self.contains(n))
    }
}

/// Total occupied cells across all floors.
pub fn occupied_cell_count(floors: &[FloorGrid]) -> usize {
    floors.iter().map(FloorGrid::occupied_count).sum()
}

//! Distances between placed cells across floors.
//!
//! Floors are stacked [`FLOOR_HEIGHT`] units apart; the vertical gap is
//! combined with the planar distance as a second Euclidean leg.

use serde::{Deserialize, Serialize};

use crate::constants::FLOOR_HEIGHT;

/// A cell position including its floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub floor: u32,
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub const fn new(floor: u32, x: u32, y: u32) -> Self {
        Self { floor, x, y }
    }
}

/// Distance between two points, floors converted to height first.
pub fn distance_3d(a: GridPoint, b: GridPoint) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    let planar = (dx * dx + dy * dy).sqrt();
    let vertical = a.floor.abs_diff(b.floor) as f64 * FLOOR_HEIGHT;
    (planar * planar + vertical * vertical).sqrt()
}

/// Distance between opposite extreme corners of a habitat, used as the
/// normalization ceiling when scoring.
pub fn max_reachable_distance(floor_count: u32, width: u32, height: u32) -> f64 {
    distance_3d(
        GridPoint::new(1, 1, 1),
        GridPoint::new(floor_count, width, height),
    )
}

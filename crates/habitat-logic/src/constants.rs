//! Layout and scoring constants.
//!
//! Plain values with no runtime dependency. The session crate and the
//! headless simtest both read these.

/// Vertical distance between two adjacent floors, in grid units.
pub const FLOOR_HEIGHT: f64 = 3.0;

/// Closest possible separation of two distinct cells.
pub const MIN_DISTANCE: f64 = 1.0;

/// Number of factors reported in each of the worst/best lists.
pub const FACTOR_LIMIT: usize = 3;

/// Catalog weights are clamped to this magnitude.
pub const MAX_EDGE_POINTS: i32 = 100;

/// Default appearance for cells written without explicit styling.
pub mod appearance {
    pub const DEFAULT_COLOR: &str = "#9aa4b1";
    pub const CORRIDOR_COLOR: &str = "#5c6470";
    pub const DEFAULT_TEXTURE: &str = "module_default";
    pub const CORRIDOR_TEXTURE: &str = "corridor_plate";
}

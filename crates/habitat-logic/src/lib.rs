//! Pure layout logic for the habitat planner.
//!
//! This crate contains everything that decides whether a layout is legal and
//! how good it is, independent of any renderer, UI framework or async
//! runtime. Functions take plain data and return results, making them
//! unit-testable and callable straight from an input handler.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Directional relationship weights between module types |
//! | [`connectivity`] | Flood fill of a module's footprint, move clamping |
//! | [`constants`] | Floor height, scoring limits, default appearance |
//! | [`distance`] | Cross-floor distance and normalization ceiling |
//! | [`grid`] | Floor occupancy arena, cells, instance ids |
//! | [`inventory`] | Remaining placeable cells per module instance |
//! | [`module_type`] | Open set of room categories |
//! | [`scorer`] | Pairwise distance-weighted habitat score |
//! | [`validator`] | Ordered placement, erase and move rules |

pub mod catalog;
pub mod connectivity;
pub mod constants;
pub mod distance;
pub mod grid;
pub mod inventory;
pub mod module_type;
pub mod scorer;
pub mod validator;

//! Habitat Session - editing and asynchronous scoring
//!
//! Glue between the pure rules in `habitat-logic` and an interactive editor.
//! The editor session applies validated edits; the score controller re-scores
//! the layout on a tokio runtime and publishes only the newest result.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Debounce and timeout settings |
//! | [`controller`] | Generation-tagged, last-write-wins score publishing |
//! | [`editor`] | Floors, inventory and selection; place, erase, move |
//! | [`evaluator`] | Local scoring behind the `Evaluator` trait |
//! | [`remote`] | Request/response contract for a remote scoring service |

pub mod config;
pub mod controller;
pub mod editor;
pub mod evaluator;
pub mod remote;

pub use controller::{ScoreSessionController, ScoreSnapshot, ScoreStatus};
pub use editor::{EditorSession, SessionError};
pub use evaluator::{EvaluationError, Evaluator, LocalEvaluator};

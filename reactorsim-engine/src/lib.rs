//! # reactorsim-engine
//!
//! Async front end to the reactor simulator. Layouts are validated on the
//! calling task and evaluated on tokio's blocking pool; results come back
//! through the returned future.

pub mod engine;

pub use engine::{ResultCache, RuntimeError, SimulationRuntime};

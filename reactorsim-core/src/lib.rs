//! # reactorsim-core
//!
//! Discrete-tick simulation of an IndustrialCraft 2 style nuclear reactor.
//! A grid of components trades heat, neutron pulses and EU every tick; the
//! evaluation classifies a layout into marks I to V.
//!
//! ### Key Submodules:
//! - `catalog`: the 22 component kinds and their two-letter codes
//! - `layout`: validated grids, the text grid format and fingerprints
//! - `reactor`: two-phase tick engine with commit/rollback and `run_until`
//! - `evaluation`: cycle, cooldown and rerun experiments producing results
//!
//! ### Not modelled:
//! - MOX fuel and environmental heat emission
//! - EU output to cables

pub mod catalog;
pub mod component;
pub mod error;
pub mod evaluation;
pub mod layout;
pub mod reactor;

pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::error::*;
    pub use crate::evaluation::*;
    pub use crate::layout::*;
    pub use crate::reactor::{Reactor, SimulationLimits, StopConditions, StopReason};
}

pub use error::{LayoutError, ReactorError};
pub use evaluation::{run_simulation, SimulationResults};
pub use layout::{dimensions, Dimensions, Layout};
pub use reactor::{Reactor, SimulationLimits};

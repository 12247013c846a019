mod cache;
mod error;
mod runtime;

pub use self::{cache::ResultCache, error::RuntimeError, runtime::SimulationRuntime};

pub mod prelude {
    pub use super::{ResultCache, RuntimeError, SimulationRuntime};
}

//! Simulation limits.

use reactorsim_core::SimulationLimits;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = "crate::validation::validate_tick_limits"))]
pub struct SimulationConfig {
    /// Lifetime of a uranium cell in ticks.
    #[serde(default = "default_fuel_ticks")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub fuel_ticks: u32,

    /// Hard cap on simulated ticks.
    #[serde(default = "default_timeout_ticks")]
    #[validate(range(min = 1, max = 10_000_000))]
    pub timeout_ticks: u32,

    /// Ticks between cooldown progress checks.
    #[serde(default = "default_stall_check_interval")]
    #[validate(range(min = 1, max = 10_000))]
    pub stall_check_interval: u32,

    /// Heat below which a reactor that stopped changing counts as cooled.
    #[serde(default = "default_residual_heat")]
    #[validate(range(min = 0, max = 100_000))]
    pub residual_heat: i32,
}

fn default_fuel_ticks() -> u32 {
    SimulationLimits::default().fuel_ticks
}

fn default_timeout_ticks() -> u32 {
    SimulationLimits::default().timeout_ticks
}

fn default_stall_check_interval() -> u32 {
    SimulationLimits::default().stall_check_interval
}

fn default_residual_heat() -> i32 {
    SimulationLimits::default().residual_heat
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fuel_ticks: default_fuel_ticks(),
            timeout_ticks: default_timeout_ticks(),
            stall_check_interval: default_stall_check_interval(),
            residual_heat: default_residual_heat(),
        }
    }
}

impl SimulationConfig {
    pub fn limits(&self) -> SimulationLimits {
        SimulationLimits {
            fuel_ticks: self.fuel_ticks,
            timeout_ticks: self.timeout_ticks,
            stall_check_interval: self.stall_check_interval,
            residual_heat: self.residual_heat,
        }
    }
}

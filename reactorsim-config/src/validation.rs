//! Custom validation functions shared by the configuration sections.

use validator::ValidationError;

use crate::simulation::SimulationConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// The tick limit has to leave room for a full fuel cycle.
pub fn validate_tick_limits(config: &SimulationConfig) -> Result<(), ValidationError> {
    if config.timeout_ticks < config.fuel_ticks {
        let mut error = ValidationError::new("timeout_shorter_than_fuel");
        error.message = Some("timeout_ticks must be at least fuel_ticks".into());
        return Err(error);
    }
    Ok(())
}

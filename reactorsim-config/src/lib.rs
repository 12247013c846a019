//! # reactorsim configuration
//!
//! Layered configuration for the simulator runtime and CLI.
//!
//! ## Sections
//! - **simulation**: tick limits used by every evaluation
//! - **runtime**: worker count and result caching
//! - **telemetry**: log level and output format

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod runtime;
mod simulation;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use runtime::RuntimeConfig;
pub use simulation::SimulationConfig;
pub use telemetry::TelemetryConfig;

/// Prefix of environment overrides, e.g. `REACTORSIM_RUNTIME__WORKERS=4`.
pub const ENV_PREFIX: &str = "REACTORSIM_";

const BASE_FILE: &str = "config/reactorsim.yaml";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct ReactorsimConfig {
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[validate(nested)]
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ReactorsimConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/reactorsim.yaml`, if present
    /// 3. `config/<REACTORSIM_ENV>.yaml`, if present (`REACTORSIM_ENV` defaults to `production`)
    /// 4. `REACTORSIM_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ReactorsimConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("REACTORSIM_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file on top of the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let figment = Figment::from(Serialized::defaults(ReactorsimConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

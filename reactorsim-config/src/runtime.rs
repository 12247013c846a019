//! Worker pool and result cache settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Simulations allowed to run at the same time.
    #[serde(default = "default_workers")]
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    /// Reuse results for layouts that were already evaluated.
    #[serde(default = "default_true")]
    pub cache_results: bool,

    /// Cached results kept before the cache is cleared.
    #[serde(default = "default_cache_capacity")]
    #[validate(range(min = 1, max = 1_048_576))]
    pub cache_capacity: usize,
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    4096
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            cache_results: default_true(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

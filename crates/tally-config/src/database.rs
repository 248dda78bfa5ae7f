//! Database configuration.

use serde::{Deserialize, Serialize};

/// Default database file location, relative to the working directory.
fn default_path() -> String {
    ".tally/tally.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file, or `":memory:"`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

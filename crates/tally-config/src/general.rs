//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default page size for log listings.
const fn default_per_page() -> u32 {
    25
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default page size for change-log queries.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

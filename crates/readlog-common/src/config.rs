use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// User whose shelf and progress the tools operate on by default
    pub user_id: String,
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { user_id: "local".to_string(), log_level: "warn".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Upper bound for every single call into the reading store
    pub fetch_timeout_secs: u64,
}

impl AnalyticsConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { fetch_timeout_secs: 10 }
    }
}

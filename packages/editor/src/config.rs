//! Editor tuning knobs

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::overflow::{DEFAULT_PAGE_CAPACITY, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Undo entries kept per page
    pub history_limit: usize,

    /// Quiet period before a typing snapshot, in milliseconds
    pub debounce_ms: u64,

    /// Page height in px
    pub page_capacity: f64,

    pub overflow_tolerance: f64,

    /// Category given to templates saved without one
    pub default_category: String,
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            debounce_ms: 1000,
            page_capacity: DEFAULT_PAGE_CAPACITY,
            overflow_tolerance: DEFAULT_TOLERANCE,
            default_category: "기타".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"historyLimit": 10}"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.debounce(), Duration::from_secs(1));
        assert_eq!(config.default_category, "기타");
    }
}

//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! debounce_ms = 300   # Quiet period before a rerun
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Longest accepted quiet period.
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Milliseconds without file events before rerunning.
    pub debounce_ms: u64,
}

impl WatchConfig {
    const DEBOUNCE_MS: FieldPath = FieldPath::new("watch.debounce_ms");

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms == 0 || self.debounce_ms > MAX_DEBOUNCE_MS {
            diag.error_with_hint(
                Self::DEBOUNCE_MS,
                format!("must be between 1 and {MAX_DEBOUNCE_MS}"),
                "the default is 300",
            );
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_watch_config() {
        let config = test_parse_config("[watch]\ndebounce_ms = 50");
        assert_eq!(config.watch.debounce(), Duration::from_millis(50));
        assert_eq!(test_parse_config("").watch.debounce_ms, 300);
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let config = test_parse_config("[watch]\ndebounce_ms = 0");
        let mut diag = ConfigDiagnostics::new();
        config.watch.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}

//! `[rewrite]` section configuration.
//!
//! Files listed here have references to versioned sources rewritten in
//! place after each run (`/build/app.js` → `/build/app-<hash>.js`).
//!
//! # Example
//!
//! ```toml
//! [rewrite]
//! targets = ["views/**/*.html"]   # Relative to the project root
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Files, directories or globs to rewrite. None by default.
    pub targets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_rewrite_config() {
        let config = test_parse_config("[rewrite]\ntargets = [\"views/**/*.html\"]");
        assert_eq!(config.rewrite.targets, vec!["views/**/*.html"]);
        assert!(test_parse_config("").rewrite.targets.is_empty());
    }
}

//! `[version]` section configuration.
//!
//! Defaults for the `version` and `watch` commands. Command-line values
//! replace these when given.
//!
//! # Example
//!
//! ```toml
//! [version]
//! sources = ["css/*.css", "js/**/*.js"]   # Relative to paths.public
//! output = "public/assets"                # Default: <public>/<build_folder>
//! assets = ["fonts", "img/*.png"]         # Copied without versioning
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Files, directories or globs to fingerprint.
    pub sources: Vec<String>,

    /// Output directory, relative to the project root.
    pub output: Option<String>,

    /// Extra files copied into the output tree as-is.
    pub assets: Vec<String>,
}

impl VersionConfig {
    const SOURCES: FieldPath = FieldPath::new("version.sources");
    const ASSETS: FieldPath = FieldPath::new("version.assets");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.sources.iter().any(|s| s.trim().is_empty()) {
            diag.error(Self::SOURCES, "empty entry");
        }
        if self.assets.iter().any(|s| s.trim().is_empty()) {
            diag.error(Self::ASSETS, "empty entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_version_config() {
        let config = test_parse_config(
            "[version]\nsources = [\"css/*.css\"]\noutput = \"dist\"\nassets = [\"fonts\"]",
        );
        assert_eq!(config.version.sources, vec!["css/*.css"]);
        assert_eq!(config.version.output.as_deref(), Some("dist"));
        assert_eq!(config.version.assets, vec!["fonts"]);
    }

    #[test]
    fn test_version_config_defaults() {
        let config = test_parse_config("");
        assert!(config.version.sources.is_empty());
        assert!(config.version.output.is_none());
        assert!(config.version.assets.is_empty());
    }

    #[test]
    fn test_empty_entries_rejected() {
        let config = test_parse_config("[version]\nsources = [\"app.js\", \" \"]");
        let mut diag = ConfigDiagnostics::new();
        config.version.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}

//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! public = "public"        # Web root; URLs are relative to this directory
//! build_folder = "build"   # Default output, placed under `public`
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Public root, relative to the project root.
    pub public: String,

    /// Default output folder name, relative to `public`.
    pub build_folder: String,
}

impl PathsConfig {
    const PUBLIC: FieldPath = FieldPath::new("paths.public");
    const BUILD_FOLDER: FieldPath = FieldPath::new("paths.build_folder");

    /// Both paths must stay inside the project.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_path_safety(&self.public, Self::PUBLIC, diag);
        validate_path_safety(&self.build_folder, Self::BUILD_FOLDER, diag);
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public: "public".into(),
            build_folder: "build".into(),
        }
    }
}

/// Report `..` and absolute components.
pub(crate) fn validate_path_safety(path: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    for comp in Path::new(path).components() {
        let reason = match comp {
            Component::ParentDir => "parent directory '..' not allowed",
            Component::Prefix(_) | Component::RootDir => "absolute paths not allowed",
            _ => continue,
        };
        diag.error(field, format!("path '{path}': {reason}"));
        return;
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_paths_config() {
        let config = test_parse_config("[paths]\npublic = \"web\"\nbuild_folder = \"assets\"");
        assert_eq!(config.paths.public, "web");
        assert_eq!(config.paths.build_folder, "assets");
    }

    #[test]
    fn test_paths_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.public, "public");
        assert_eq!(config.paths.build_folder, "build");
    }

    #[test]
    fn test_unsafe_paths_rejected() {
        let config = test_parse_config("[paths]\npublic = \"/srv/www\"\nbuild_folder = \"../out\"");
        let mut diag = ConfigDiagnostics::new();
        config.paths.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}

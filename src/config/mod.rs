//! Configuration management for `rev.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── version    # [version]
//! │   ├── rewrite    # [rewrite]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # RevConfig (this file)
//! ```
//!
//! The file is optional: without one, every section takes its defaults and
//! the current directory is the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{PathsConfig, RewriteConfig, VersionConfig, WatchConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, RunArgs},
    log,
    rev::{RunRequest, SourceSpec},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name searched for when `-C` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "rev.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing rev.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevConfig {
    /// Absolute path to the config file, empty when running without one
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Public root and default build folder
    #[serde(default)]
    pub paths: PathsConfig,

    /// Default sources, output and extra assets
    #[serde(default)]
    pub version: VersionConfig,

    /// Reference rewriting targets
    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl RevConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = crate::utils::path::normalize_path(&path);
                config.set_root(&root);
                config
            }
            None if cli.config == Path::new(DEFAULT_CONFIG_NAME) => {
                let mut config = Self::default();
                config.set_root(&cwd);
                config
            }
            None => {
                return Err(ConfigError::Io(
                    cli.config.clone(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                )
                .into());
            }
        };

        config.validate()?;
        config.finalize(cli);
        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = crate::utils::path::normalize_path(&self.root);
        self.set_root(&root);
        self.apply_command_options(cli.run_args());
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Build a run request: command-line values win over `[version]`.
    pub fn request(&self, args: &RunArgs) -> RunRequest {
        let sources = if args.sources.is_empty() {
            self.version.sources.clone()
        } else {
            args.sources.clone()
        };
        let assets = if args.assets.is_empty() {
            self.version.assets.clone()
        } else {
            args.assets.clone()
        };

        RunRequest {
            sources: SourceSpec::from(sources),
            output: args.output.clone().or_else(|| self.version.output.clone()),
            assets,
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command options that live outside the run request.
    fn apply_command_options(&mut self, args: &RunArgs) {
        crate::logger::set_verbose(args.verbose);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.paths.validate(&mut diag);
        self.version.validate(&mut diag);
        self.watch.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> RevConfig {
    let (parsed, ignored) = RevConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

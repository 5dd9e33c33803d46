//! Errors raised while loading and checking `rev.toml`.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot parse config")]
    Toml(#[from] toml::de::Error),

    /// Paths that cannot be resolved into a run (no sources, no output).
    #[error("{0}")]
    Validation(String),

    // no #[from]: a source() would print every problem twice
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One bad field, e.g. `watch.debounce_ms`.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}: {}", "✗".red(), self.field.as_str().cyan(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

/// Every problem found by one `validate()` pass.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(field, message.into(), Some(hint.into()));
    }

    fn push(&mut self, field: FieldPath, message: String, hint: Option<String>) {
        self.errors.push(ConfigDiagnostic {
            field,
            message,
            hint,
        });
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        write!(
            f,
            "{} ({} problem{})",
            "invalid rev.toml".red().bold(),
            count,
            if count == 1 { "" } else { "s" }
        )?;
        for err in &self.errors {
            write!(f, "\n{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_names_config_file() {
        let err = ConfigError::Io(
            PathBuf::from("site/rev.toml"),
            Error::new(ErrorKind::NotFound, "config file not found"),
        );
        assert_eq!(err.to_string(), "cannot read config `site/rev.toml`");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_toml_error_keeps_parser_detail() {
        let parse = toml::from_str::<toml::Value>("[paths\npublic = 1").unwrap_err();
        let err = ConfigError::from(parse);
        assert_eq!(err.to_string(), "cannot parse config");

        let chained = format!("{:#}", anyhow::Error::from(err));
        assert!(chained.starts_with("cannot parse config: "));
        assert!(chained.len() > "cannot parse config: ".len());
    }

    #[test]
    fn test_diagnostics_list_every_field() {
        let mut diag = ConfigDiagnostics::new();
        diag.error(FieldPath::new("paths.public"), "path '/www': absolute paths not allowed");
        diag.error_with_hint(
            FieldPath::new("watch.debounce_ms"),
            "must be between 1 and 10000",
            "the default is 300",
        );

        let err = diag.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.errors()[1].hint.as_deref(), Some("the default is 300"));

        let display = err.to_string();
        assert!(display.contains("2 problems"));
        assert!(display.contains("absolute paths not allowed"));
        assert!(display.contains("watch.debounce_ms"));
        assert!(display.contains("the default is 300"));
    }

    #[test]
    fn test_empty_diagnostics_is_ok() {
        assert!(ConfigDiagnostics::new().into_result().is_ok());
    }
}

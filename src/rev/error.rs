//! Versioning error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

pub type RevResult<T> = Result<T, RevError>;

/// Errors that abort a versioning run.
#[derive(Debug, Error)]
pub enum RevError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read source `{}`", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Manifest read/parse failures are recovered by the manifest store and
    // never returned from `run`.
    #[error("cannot read manifest `{}`", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest `{}`", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write manifest `{}`", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single failed copy in the best-effort sidecar/asset phase.
#[derive(Debug, Error)]
#[error("cannot copy `{}`", path.display())]
pub struct CopyError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

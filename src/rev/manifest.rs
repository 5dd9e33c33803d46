//! The `rev-manifest.json` mapping and its persistence.
//!
//! ```json
//! {
//!   "css/app.css": "css/app-5d41402abc.css",
//!   "js/app.js": "js/app-0b8f1a9c2e.js"
//! }
//! ```
//!
//! Keys are relative to the public root; values are relative to the output
//! directory the manifest lives in. Keys are kept sorted so the file is
//! stable across runs.
//!
//! Neither side carries a leading slash (`"app.js"`, not `"/app.js"`), the
//! gulp-rev layout. Consumers building URLs join them onto the rewrite
//! prefix themselves, e.g. `/build/` + `app-0b8f1a9c2e.js`.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{RevError, RevResult};
use super::fs::FileSystem;
use crate::{debug, log};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "rev-manifest.json";

/// Original relative path → versioned relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, versioned: impl Into<String>) {
        self.0.insert(original.into(), versioned.into());
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.0.get(original).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> String {
        // A string map always serializes
        let mut json = serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".into());
        json.push('\n');
        json
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Path of the manifest for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILE)
}

/// Reads, writes and applies manifests in an output directory.
pub struct ManifestStore<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> ManifestStore<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Previous manifest, if one can be used.
    ///
    /// A missing file is the normal first-run state. An unreadable or
    /// malformed one is reported and treated as missing, which skips cleanup.
    pub fn load_previous(&self, output_dir: &Path) -> Option<Manifest> {
        match self.try_load(output_dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                log!("warning"; "{}, skipping cleanup of previous build", error_chain(&e));
                None
            }
        }
    }

    /// Like [`Self::load_previous`], but surfaces parse errors.
    pub fn try_load(&self, output_dir: &Path) -> RevResult<Option<Manifest>> {
        let path = manifest_path(output_dir);
        let bytes = match self.fs.read_bytes(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RevError::ManifestRead { path, source }),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| RevError::ManifestParse { path, source })
    }

    /// Delete every file the manifest names. Returns how many were removed.
    ///
    /// Missing files are fine. Values pointing outside `output_dir` are
    /// never touched.
    pub fn clean_previous(&self, output_dir: &Path, manifest: &Manifest) -> usize {
        let mut removed = 0;

        for value in manifest.values() {
            if !is_contained(value) {
                log!("warning"; "manifest entry `{}` leaves the output directory, not removing", value);
                continue;
            }

            let path = output_dir.join(value);
            if !self.fs.exists(&path) {
                continue;
            }

            match self.fs.remove_force(&path) {
                Ok(()) => {
                    debug!("clean"; "{}", value);
                    removed += 1;
                }
                Err(e) => log!("warning"; "cannot remove `{}`: {}", path.display(), e),
            }
        }

        removed
    }

    /// Write (or overwrite) the manifest. Returns its path.
    pub fn write(&self, output_dir: &Path, manifest: &Manifest) -> RevResult<PathBuf> {
        let path = manifest_path(output_dir);
        self.fs
            .write_bytes(&path, manifest.to_json().as_bytes())
            .map_err(|source| RevError::ManifestWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Relative path with no `..`, root or prefix components.
fn is_contained(value: &str) -> bool {
    !value.is_empty()
        && Path::new(value)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// `error: cause: cause` on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

//! Best-effort copying of sidecar files and extra assets.
//!
//! Nothing here is fatal: a file that cannot be copied is recorded in the
//! [`CopyReport`] and the remaining files are still copied.

use std::path::{Path, PathBuf};

use super::error::CopyError;
use super::fs::FileSystem;
use super::glob::GlobExpander;
use super::paths::strip_public_root;
use crate::{debug, log};

/// Suffix of debug-map sidecars (`app.js` → `app.js.map`).
pub const SIDECAR_SUFFIX: &str = ".map";

/// Outcome of a copy phase.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<CopyError>,
}

impl CopyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct AssetCopier<'a> {
    fs: &'a dyn FileSystem,
    glob: &'a dyn GlobExpander,
}

impl<'a> AssetCopier<'a> {
    pub fn new(fs: &'a dyn FileSystem, glob: &'a dyn GlobExpander) -> Self {
        Self { fs, glob }
    }

    /// Expand literal paths, directories and globs into existing files.
    pub fn expand(&self, specs: &[String]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = specs.iter().flat_map(|s| self.glob.expand(s)).collect();
        files.sort();
        files.dedup();
        files
    }

    /// Existing `<file>.map` sidecars of `files`.
    pub fn sidecars(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|file| {
                let mut name = file.clone().into_os_string();
                name.push(SIDECAR_SUFFIX);
                PathBuf::from(name)
            })
            .filter(|map| self.fs.exists(map))
            .collect()
    }

    /// Copy each file to `output_dir`, keeping its path below the public root.
    ///
    /// Files outside the public root land at the top of `output_dir`.
    pub fn copy(&self, files: &[PathBuf], public_dir: &Path, output_dir: &Path) -> CopyReport {
        let mut report = CopyReport::default();

        for file in files {
            let dest = destination(file, public_dir, output_dir);
            if dest == *file {
                continue;
            }

            match self.fs.copy(file, &dest) {
                Ok(()) => {
                    debug!("copy"; "{} -> {}", file.display(), dest.display());
                    report.copied.push(dest);
                }
                Err(source) => {
                    let err = CopyError {
                        path: file.clone(),
                        source,
                    };
                    log!("warning"; "{}: {}", err, err.source);
                    report.failed.push(err);
                }
            }
        }

        report
    }
}

fn destination(file: &Path, public_dir: &Path, output_dir: &Path) -> PathBuf {
    let rel = strip_public_root(file, public_dir);
    if rel.is_absolute() || rel.starts_with("..") {
        return output_dir.join(file.file_name().unwrap_or(file.as_os_str()));
    }
    output_dir.join(rel)
}

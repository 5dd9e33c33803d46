//! Content fingerprints and fingerprinted copies.
//!
//! A fingerprint is the first [`FINGERPRINT_LEN`] hex chars of the blake3
//! hash of a file's bytes. It is embedded in the output name before the
//! last extension: `css/app.css` → `css/app-5d41402abc.css`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::error::{RevError, RevResult};
use super::fs::FileSystem;
use super::manifest::Manifest;
use crate::{debug, log};

/// Hex chars kept from the content hash.
pub const FINGERPRINT_LEN: usize = 10;

/// Short content hash token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Pure function of `bytes`: no timestamps, no paths.
    pub fn of(bytes: &[u8]) -> Self {
        let hash = blake3::hash(bytes);
        Self(hex::encode(&hash.as_bytes()[..FINGERPRINT_LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert the fingerprint before the last extension of `key`'s file name.
///
/// ```ignore
/// versioned_name("js/app.min.js", &fp) // "js/app.min-<fp>.js"
/// versioned_name("LICENSE", &fp)       // "LICENSE-<fp>"
/// ```
pub fn versioned_name(key: &str, fingerprint: &Fingerprint) -> String {
    let (dir, file) = match key.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, key),
    };

    // A leading dot is part of the name, not an extension (`.htaccess`)
    let (stem, ext) = match file.rfind('.') {
        Some(i) if i > 0 => file.split_at(i),
        _ => (file, ""),
    };

    match dir {
        Some(dir) => format!("{dir}/{stem}-{fingerprint}{ext}"),
        None => format!("{stem}-{fingerprint}{ext}"),
    }
}

/// Extract the fingerprint token embedded in a versioned name.
pub fn embedded_fingerprint(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let stem = match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    };
    let (_, token) = stem.rsplit_once('-')?;
    let valid = token.len() == FINGERPRINT_LEN && token.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then_some(token)
}

/// A resolved source file and its manifest key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the public root.
    pub key: String,
}

/// A source file after fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedFile {
    pub source: PathBuf,
    pub key: String,
    pub fingerprint: Fingerprint,
    /// `key` with the fingerprint embedded.
    pub versioned: String,
    /// Plain copy written next to the versioned one and removed at the end,
    /// `None` when the source already sits at that path.
    pub plain_copy: Option<PathBuf>,
}

/// Deduplicate by manifest key, first occurrence wins.
pub fn dedup_sources(files: Vec<SourceFile>) -> Vec<SourceFile> {
    let mut by_key: BTreeMap<String, SourceFile> = BTreeMap::new();
    for file in files {
        if let Some(existing) = by_key.get(&file.key) {
            if existing.path != file.path {
                log!(
                    "version";
                    "`{}` and `{}` both map to `{}`, keeping the first",
                    existing.path.display(),
                    file.path.display(),
                    file.key
                );
            }
            continue;
        }
        by_key.insert(file.key.clone(), file);
    }
    by_key.into_values().collect()
}

/// Copies sources into the output directory under fingerprinted names.
pub struct Fingerprinter<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> Fingerprinter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Fingerprint every file into `output_dir` and build the new manifest.
    ///
    /// `files` must be unique by key (see [`dedup_sources`]). The plain
    /// copies written along the way are removed once every file succeeded.
    /// On failure, fingerprinted copies already written stay on disk.
    pub fn version(
        &self,
        files: &[SourceFile],
        output_dir: &Path,
    ) -> RevResult<(Manifest, Vec<VersionedFile>)> {
        let results: Vec<_> = files
            .par_iter()
            .map(|file| self.version_one(file, output_dir))
            .collect();

        let mut versioned = Vec::with_capacity(results.len());
        let mut plain_copies = Vec::new();
        let mut first_error = None;

        for result in results {
            match result {
                Ok(file) => {
                    plain_copies.extend(file.plain_copy.clone());
                    versioned.push(file);
                }
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => debug!("version"; "{}", e),
            }
        }

        if let Some(err) = first_error {
            for plain in &plain_copies {
                if let Err(e) = self.fs.remove_force(plain) {
                    debug!("version"; "cannot remove `{}`: {}", plain.display(), e);
                }
            }
            return Err(err);
        }

        for plain in &plain_copies {
            self.fs.remove_force(plain).map_err(|source| RevError::Write {
                path: plain.clone(),
                source,
            })?;
        }

        let manifest = versioned
            .iter()
            .map(|v| (v.key.clone(), v.versioned.clone()))
            .collect();
        Ok((manifest, versioned))
    }

    fn version_one(&self, file: &SourceFile, output_dir: &Path) -> RevResult<VersionedFile> {
        let bytes = self
            .fs
            .read_bytes(&file.path)
            .map_err(|source| RevError::SourceRead {
                path: file.path.clone(),
                source,
            })?;

        let plain = output_dir.join(&file.key);
        let plain_copy = if is_same_file(&plain, &file.path) {
            None
        } else {
            self.write(&plain, &bytes)?;
            Some(plain)
        };

        let fingerprint = Fingerprint::of(&bytes);
        let versioned = versioned_name(&file.key, &fingerprint);
        self.write(&output_dir.join(&versioned), &bytes)?;

        debug!("version"; "{} -> {}", file.key, versioned);

        Ok(VersionedFile {
            source: file.path.clone(),
            key: file.key.clone(),
            fingerprint,
            versioned,
            plain_copy,
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> RevResult<()> {
        self.fs
            .write_bytes(path, bytes)
            .map_err(|source| RevError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Whether two paths name the same file on disk.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

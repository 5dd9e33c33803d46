//! Rewriting references to versioned files.
//!
//! Pages and templates reference assets by URL, e.g. `/build/js/app.js`.
//! After a run those references must point at `/build/js/app-<hash>.js`.
//! This module derives the URL prefix of the output directory and hands the
//! `(old, new)` pairs to a [`ReferenceRewriter`].

use std::path::{Path, PathBuf};

use regex::{Captures, Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use super::fs::FileSystem;
use super::manifest::Manifest;
use super::paths::strip_public_root;
use crate::utils::path::to_slash;
use crate::{debug, log};

/// URL prefix under which versioned files are served, `/build/` style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    prefix: String,
}

impl RewriteRule {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Output directory with the public root stripped, wrapped in slashes.
///
/// ```ignore
/// compute_prefix("public/build", "public") // "/build/"
/// compute_prefix("public", "public")       // "/"
/// ```
pub fn compute_prefix(output_dir: &Path, public_root: &Path) -> RewriteRule {
    let rel = to_slash(strip_public_root(output_dir, public_root));
    let rel = rel.trim_matches('/');
    let prefix = if rel.is_empty() {
        "/".to_string()
    } else {
        format!("/{rel}/")
    };
    RewriteRule { prefix }
}

/// Rewrites occurrences of `old` with `new` across target files.
pub trait ReferenceRewriter {
    /// Returns the files that were changed.
    fn rewrite(&self, replacements: &[(String, String)], targets: &[PathBuf]) -> Vec<PathBuf>;
}

/// Replacement pairs for a run.
///
/// Each key maps `prefix + original` to `prefix + versioned`. When the
/// previous manifest had a different versioned name for the key, that name
/// is mapped too, so targets rewritten by an earlier run stay current.
pub fn replacements(
    manifest: &Manifest,
    previous: Option<&Manifest>,
    rule: &RewriteRule,
) -> Vec<(String, String)> {
    let prefix = rule.prefix();
    let mut pairs = Vec::with_capacity(manifest.len());

    for (original, versioned) in manifest.iter() {
        let new = format!("{prefix}{versioned}");
        pairs.push((format!("{prefix}{original}"), new.clone()));

        if let Some(old) = previous.and_then(|p| p.get(original))
            && old != versioned
        {
            pairs.push((format!("{prefix}{old}"), new));
        }
    }

    pairs
}

/// Rewrite references in `targets` according to `manifest`.
pub fn rewrite_references(
    manifest: &Manifest,
    previous: Option<&Manifest>,
    rule: &RewriteRule,
    rewriter: &dyn ReferenceRewriter,
    targets: &[PathBuf],
) -> Vec<PathBuf> {
    if targets.is_empty() || manifest.is_empty() {
        return Vec::new();
    }
    rewriter.rewrite(&replacements(manifest, previous, rule), targets)
}

/// In-place text rewriter driven by a single alternation regex.
pub struct RegexRewriter<'a> {
    fs: &'a dyn FileSystem,
    size_limit: usize,
}

/// Compiled size cap for the combined reference regex (regex's default).
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

impl<'a> RegexRewriter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            size_limit: REGEX_SIZE_LIMIT,
        }
    }

    pub fn with_size_limit(mut self, bytes: usize) -> Self {
        self.size_limit = bytes;
        self
    }

    fn rewrite_one(&self, path: &Path, regex: &Regex, map: &FxHashMap<&str, &str>) -> bool {
        let bytes = match self.fs.read_bytes(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log!("warning"; "cannot read `{}`: {}", path.display(), e);
                return false;
            }
        };

        let Ok(text) = String::from_utf8(bytes) else {
            debug!("rewrite"; "skipping non-text `{}`", path.display());
            return false;
        };

        if !regex.is_match(&text) {
            return false;
        }

        let rewritten = regex.replace_all(&text, |caps: &Captures| {
            let needle = &caps["ref"];
            let tail = caps.name("tail").map_or("", |m| m.as_str());
            format!("{}{}", map.get(needle).copied().unwrap_or(needle), tail)
        });

        match self.fs.write_bytes(path, rewritten.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                log!("warning"; "cannot rewrite `{}`: {}", path.display(), e);
                false
            }
        }
    }
}

impl ReferenceRewriter for RegexRewriter<'_> {
    fn rewrite(&self, replacements: &[(String, String)], targets: &[PathBuf]) -> Vec<PathBuf> {
        let regex = match build_regex(replacements, self.size_limit) {
            Ok(Some(regex)) => regex,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log!("warning"; "cannot build reference matcher, nothing rewritten: {}", e);
                return Vec::new();
            }
        };
        let map: FxHashMap<&str, &str> = replacements
            .iter()
            .map(|(old, new)| (old.as_str(), new.as_str()))
            .collect();

        targets
            .iter()
            .filter(|path| self.rewrite_one(path, &regex, &map))
            .cloned()
            .collect()
    }
}

/// Longest needle first so `/build/app.js.map` wins over `/build/app.js`.
/// A reference must not continue with a path char, so `/build/app.js`
/// never matches inside `/build/app.json`.
fn build_regex(
    replacements: &[(String, String)],
    size_limit: usize,
) -> Result<Option<Regex>, regex::Error> {
    let mut needles: Vec<&str> = replacements.iter().map(|(old, _)| old.as_str()).collect();
    if needles.is_empty() {
        return Ok(None);
    }
    needles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    needles.dedup();

    let alternation = needles
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"(?P<ref>{alternation})(?P<tail>[^A-Za-z0-9_.\-/]|$)"))
        .size_limit(size_limit)
        .build()
        .map(Some)
}

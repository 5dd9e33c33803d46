//! Glob expansion over the filesystem.
//!
//! Supported syntax:
//!
//! | Pattern  | Matches                                   |
//! |----------|-------------------------------------------|
//! | `*`      | any run of chars except `/`               |
//! | `**`     | any number of directories (incl. none)    |
//! | `?`      | one char except `/`                       |
//! | `[a-z]`  | char class, `[!x]` / `[^x]` negates       |
//! | `{a,b}`  | alternation within one path segment       |
//!
//! A pattern without meta chars names a file (itself) or a directory
//! (every file beneath it). Expansion never fails: invalid patterns and
//! missing directories yield nothing.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use jwalk::WalkDir;

use crate::debug;
use crate::utils::path::to_slash;

pub trait GlobExpander: Sync {
    /// Existing files matching `pattern`, sorted.
    fn expand(&self, pattern: &str) -> Vec<PathBuf>;
}

/// Walks the directory tree below a pattern's literal prefix.
#[derive(Debug, Clone)]
pub struct WalkGlob {
    /// Relative patterns are resolved against this directory.
    root: PathBuf,
}

impl WalkGlob {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl GlobExpander for WalkGlob {
    fn expand(&self, pattern: &str) -> Vec<PathBuf> {
        let (base, rest) = split_pattern(pattern);
        let base = self.root.join(base);

        let Some(rest) = rest else {
            return if base.is_file() {
                vec![base]
            } else {
                walk_files(&base, None, |_| true)
            };
        };

        let matcher = match SegmentGlob::new(&rest) {
            Ok(matcher) => matcher,
            Err(err) => {
                debug!("glob"; "invalid pattern `{}`: {}", pattern, err);
                return Vec::new();
            }
        };

        let depth = (!rest.contains("**")).then(|| rest.split('/').count());
        walk_files(&base, depth, |rel| matcher.is_match(rel))
    }
}

/// Sorted files under `base` whose slash-separated relative path passes `accept`.
fn walk_files(base: &Path, max_depth: Option<usize>, accept: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    if !base.is_dir() {
        return Vec::new();
    }

    let mut walker = WalkDir::new(base).skip_hidden(false).sort(true);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<_> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| {
            path.strip_prefix(base)
                .map(|rel| accept(&to_slash(rel)))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Split a pattern into its literal directory prefix and the glob remainder.
///
/// `public/css/**/*.css` → (`public/css`, `Some("**/*.css")`)
/// `public/app.js`       → (`public/app.js`, `None`)
pub fn split_pattern(pattern: &str) -> (PathBuf, Option<String>) {
    let pattern = pattern.replace('\\', "/");
    let segments: Vec<&str> = pattern.split('/').collect();

    let Some(first_glob) = segments.iter().position(|s| has_meta(s)) else {
        return (PathBuf::from(&pattern), None);
    };

    let base = segments[..first_glob].join("/");
    let base = if base.is_empty() && pattern.starts_with('/') {
        "/".to_string()
    } else {
        base
    };

    let rest = segments[first_glob..]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    (PathBuf::from(base), Some(rest))
}

/// Tests paths against one pattern without walking the disk.
///
/// Agrees with [`WalkGlob::expand`]: a literal pattern covers the file
/// itself or everything below the directory.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    base: PathBuf,
    glob: Option<SegmentGlob>,
}

impl PatternMatcher {
    /// `None` for a pattern that would expand to nothing.
    pub fn new(root: &Path, pattern: &str) -> Option<Self> {
        let (base, rest) = split_pattern(pattern);
        let glob = match rest {
            Some(rest) => Some(SegmentGlob::new(&rest).ok()?),
            None => None,
        };
        Some(Self {
            base: root.join(base),
            glob,
        })
    }

    pub fn is_match(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.base) else {
            return false;
        };
        match &self.glob {
            Some(glob) => glob.is_match(&to_slash(rel)),
            None => true,
        }
    }
}

/// Literal directory a pattern starts from (what a watcher should watch).
pub fn base_dir(pattern: &str) -> PathBuf {
    match split_pattern(pattern) {
        (base, Some(_)) => base,
        (path, None) => path,
    }
}

fn has_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// A glob matched one path segment at a time.
///
/// Each segment is compiled with `globset`; a `**` segment spans any number
/// of directories. Segment patterns never see a `/`, so no wildcard or
/// character class can match across a separator.
#[derive(Debug, Clone)]
pub struct SegmentGlob {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    AnyDepth,
    Name(GlobMatcher),
}

impl SegmentGlob {
    /// Compile a slash-separated glob.
    pub fn new(glob: &str) -> Result<Self, globset::Error> {
        let segments = glob
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                if segment == "**" {
                    return Ok(Segment::AnyDepth);
                }
                GlobBuilder::new(segment)
                    .literal_separator(true)
                    .build()
                    .map(|g| Segment::Name(g.compile_matcher()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Whether a slash-separated relative path matches.
    pub fn is_match(&self, rel: &str) -> bool {
        let parts: Vec<&str> = rel.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Name(matcher), rest)) => match parts.split_first() {
            Some((part, tail)) => matcher.is_match(*part) && match_segments(rest, tail),
            None => false,
        },
    }
}

//! Source and output path resolution.
//!
//! Pure string/path computation: nothing here touches the filesystem.
//!
//! Source entries are written relative to the public root, the way they
//! are referenced from pages (`css/app.css`). Two escapes exist:
//!
//! | Entry               | Resolves to             |
//! |---------------------|-------------------------|
//! | `css/app.css`       | `public/css/app.css`    |
//! | `public/css/*.css`  | `public/css/*.css`      |
//! | `./resources/a.js`  | `resources/a.js`        |
//! | `/abs/a.js`         | `/abs/a.js`             |

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::utils::path::to_slash;

/// One or more path/glob strings naming the files to version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    entries: Vec<String>,
}

impl SourceSpec {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.trim().is_empty())
    }
}

impl From<&str> for SourceSpec {
    fn from(entry: &str) -> Self {
        Self::new([entry])
    }
}

impl From<String> for SourceSpec {
    fn from(entry: String) -> Self {
        Self::new([entry])
    }
}

impl From<Vec<String>> for SourceSpec {
    fn from(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

impl From<&[&str]> for SourceSpec {
    fn from(entries: &[&str]) -> Self {
        Self::new(entries.iter().copied())
    }
}

/// Canonical `{sources, output_dir}` pair (both relative to the project root
/// unless given absolute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub sources: Vec<String>,
    pub output_dir: PathBuf,
    /// Public root in the same cleaned form the other two were built from.
    pub public_root: PathBuf,
}

/// Normalize a source spec and pick its output directory.
///
/// Without an explicit output, falls back to `<public_root>/<default_build_folder>`.
pub fn resolve(
    spec: &SourceSpec,
    explicit_output: Option<&str>,
    public_root: &str,
    default_build_folder: &str,
) -> Result<ResolvedPaths, ConfigError> {
    let public_root = clean(public_root);

    let sources: Vec<String> = spec
        .entries()
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| prefix_source(e, public_root))
        .collect();

    if sources.is_empty() {
        return Err(ConfigError::Validation("no source files to version".into()));
    }

    let output_dir = output_dir(explicit_output, public_root, default_build_folder)?;
    Ok(ResolvedPaths {
        sources,
        output_dir,
        public_root: PathBuf::from(public_root),
    })
}

/// Same prefixing rules as sources, for `[version] assets` entries.
pub fn resolve_patterns(entries: &[String], public_root: &str) -> Vec<String> {
    let public_root = clean(public_root);
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| prefix_source(e, public_root))
        .collect()
}

fn output_dir(
    explicit: Option<&str>,
    public_root: &str,
    default_build_folder: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit.map(clean).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let fallback = clean(default_build_folder);
    if fallback.is_empty() {
        return Err(ConfigError::Validation(
            "cannot determine output directory: pass one explicitly or set `paths.build_folder`"
                .into(),
        ));
    }

    Ok(PathBuf::from(prefix_source(fallback, public_root)))
}

fn prefix_source(entry: &str, public_root: &str) -> String {
    if let Some(rest) = entry.strip_prefix("./") {
        return rest.to_string();
    }
    if Path::new(entry).is_absolute() || public_root.is_empty() {
        return entry.to_string();
    }
    if Path::new(entry).starts_with(public_root) {
        return entry.to_string();
    }
    format!("{public_root}/{entry}")
}

/// Strip `./` and trailing separators.
fn clean(path: &str) -> &str {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    if path == "/" {
        return path;
    }
    path.trim_end_matches('/')
}

/// `path` with the public root removed, or `path` itself when outside it.
pub fn strip_public_root<'a>(path: &'a Path, public_dir: &Path) -> &'a Path {
    path.strip_prefix(public_dir).unwrap_or(path)
}

/// Manifest key for a source file: forward-slash path relative to the
/// public root, or to the project root for files outside it.
///
/// Keys never start with `/`: `public/app.js` maps to `app.js`.
pub fn manifest_key(path: &Path, public_dir: &Path, project_root: &Path) -> String {
    let rel = path
        .strip_prefix(public_dir)
        .or_else(|_| path.strip_prefix(project_root))
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(path.file_name().unwrap_or(path.as_os_str())));
    to_slash(rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_path_becomes_list() {
        let paths = resolve(&"css/app.css".into(), None, "public", "build").unwrap();
        assert_eq!(paths.sources, vec!["public/css/app.css"]);
        assert_eq!(paths.output_dir, PathBuf::from("public/build"));
        assert_eq!(paths.public_root, PathBuf::from("public"));
    }

    #[test]
    fn test_dotted_public_root_is_cleaned() {
        let paths = resolve(&"app.js".into(), None, "./public/", "build").unwrap();
        assert_eq!(paths.sources, vec!["public/app.js"]);
        assert_eq!(paths.output_dir, PathBuf::from("public/build"));
        assert_eq!(paths.public_root, PathBuf::from("public"));
    }

    #[test]
    fn test_list_and_prefix_rules() {
        let spec = SourceSpec::new(["js/*.js", "public/css/app.css", "./resources/x.js", "/abs/y.js"]);
        let paths = resolve(&spec, None, "public/", "build").unwrap();
        assert_eq!(
            paths.sources,
            vec![
                "public/js/*.js",
                "public/css/app.css",
                "resources/x.js",
                "/abs/y.js"
            ]
        );
    }

    #[test]
    fn test_prefix_is_component_wise() {
        // `publicity/` shares a string prefix with `public` but not a component
        let paths = resolve(&"publicity/a.js".into(), None, "public", "build").unwrap();
        assert_eq!(paths.sources, vec!["public/publicity/a.js"]);
    }

    #[test]
    fn test_explicit_output_wins() {
        let paths = resolve(&"app.js".into(), Some("./public/assets/"), "public", "build").unwrap();
        assert_eq!(paths.output_dir, PathBuf::from("public/assets"));
    }

    #[test]
    fn test_empty_explicit_output_falls_back() {
        let paths = resolve(&"app.js".into(), Some("  "), "public", "build").unwrap();
        assert_eq!(paths.output_dir, PathBuf::from("public/build"));
    }

    #[test]
    fn test_no_output_is_config_error() {
        let err = resolve(&"app.js".into(), None, "public", "").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_no_sources_is_config_error() {
        let err = resolve(&SourceSpec::new(["", " "]), None, "public", "build").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_empty_public_root() {
        let paths = resolve(&"app.js".into(), None, "", "build").unwrap();
        assert_eq!(paths.sources, vec!["app.js"]);
        assert_eq!(paths.output_dir, PathBuf::from("build"));
    }

    #[test]
    fn test_manifest_key() {
        let root = Path::new("/site");
        let public = Path::new("/site/public");
        assert_eq!(
            manifest_key(Path::new("/site/public/css/app.css"), public, root),
            "css/app.css"
        );
        assert_eq!(
            manifest_key(Path::new("/site/resources/a.js"), public, root),
            "resources/a.js"
        );
        assert_eq!(manifest_key(Path::new("/elsewhere/b.js"), public, root), "b.js");
        assert_eq!(manifest_key(Path::new("/site/public/app.js"), public, root), "app.js");
    }

    #[test]
    fn test_strip_public_root() {
        let public = Path::new("/site/public");
        assert_eq!(
            strip_public_root(Path::new("/site/public/img/a.png"), public),
            Path::new("img/a.png")
        );
        assert_eq!(
            strip_public_root(Path::new("/other/a.png"), public),
            Path::new("/other/a.png")
        );
    }
}

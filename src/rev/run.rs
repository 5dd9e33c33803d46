//! The versioning run.
//!
//! ```text
//! resolve paths ─▶ load + clean previous manifest ─▶ expand sources
//!      ─▶ fingerprint (parallel, barrier) ─▶ rewrite references
//!      ─▶ write manifest ─▶ copy sidecars + assets (best effort)
//! ```
//!
//! Everything up to the manifest write is fatal on error, so the manifest
//! on disk always names files that exist. The copy phase never fails the run.

use std::path::PathBuf;

use super::copier::{AssetCopier, CopyReport};
use super::error::{RevError, RevResult};
use super::fingerprint::{Fingerprinter, SourceFile, dedup_sources};
use super::fs::{FileSystem, LocalFs};
use super::glob::{GlobExpander, WalkGlob};
use super::manifest::{Manifest, ManifestStore};
use super::paths::{self, SourceSpec, manifest_key};
use super::rewrite::{self, RegexRewriter};
use crate::config::RevConfig;
use crate::utils::path::relative_display;
use crate::{debug, log};

/// What to version in one run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub sources: SourceSpec,
    /// Overrides the default `<public>/<build_folder>` output directory.
    pub output: Option<String>,
    /// Extra files copied into the output tree without versioning.
    pub assets: Vec<String>,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    /// Stale files removed using the previous manifest.
    pub removed: usize,
    pub rewritten: Vec<PathBuf>,
    pub sidecars: CopyReport,
    pub assets: CopyReport,
    /// Every path this run created, replaced or deleted.
    pub written: Vec<PathBuf>,
}

impl RunReport {
    /// Copy failures across both best-effort phases.
    pub fn copy_failures(&self) -> usize {
        self.sidecars.failed.len() + self.assets.failed.len()
    }
}

/// Version `request` on the real filesystem.
pub fn run(config: &RevConfig, request: &RunRequest) -> RevResult<RunReport> {
    let glob = WalkGlob::new(config.get_root());
    run_with(config, request, &LocalFs, &glob)
}

/// Version `request` against explicit filesystem and glob collaborators.
pub fn run_with(
    config: &RevConfig,
    request: &RunRequest,
    fs: &dyn FileSystem,
    glob: &dyn GlobExpander,
) -> RevResult<RunReport> {
    let resolved = paths::resolve(
        &request.sources,
        request.output.as_deref(),
        &config.paths.public,
        &config.paths.build_folder,
    )?;

    let root = config.get_root();
    let public_dir = root.join(&resolved.public_root);
    let output_dir = root.join(&resolved.output_dir);
    debug!("version"; "sources {:?} -> {}", resolved.sources, output_dir.display());

    // Stale output goes first, before anything new lands in output_dir
    let store = ManifestStore::new(fs);
    let previous = store.load_previous(&output_dir);
    let removed = previous
        .as_ref()
        .map_or(0, |manifest| store.clean_previous(&output_dir, manifest));

    fs.make_dirs(&output_dir).map_err(|source| RevError::Write {
        path: output_dir.clone(),
        source,
    })?;

    let source_paths = expand_all(glob, &resolved.sources);
    if source_paths.is_empty() {
        log!("warning"; "no files matched {}", resolved.sources.join(", "));
    }

    let files = dedup_sources(
        source_paths
            .iter()
            .map(|path| SourceFile {
                path: path.clone(),
                key: manifest_key(path, &public_dir, root),
            })
            .collect(),
    );

    let (manifest, versioned) = Fingerprinter::new(fs).version(&files, &output_dir)?;

    let rule = rewrite::compute_prefix(&resolved.output_dir, &resolved.public_root);
    let targets = expand_all(glob, &config.rewrite.targets);
    let rewritten = rewrite::rewrite_references(
        &manifest,
        previous.as_ref(),
        &rule,
        &RegexRewriter::new(fs),
        &targets,
    );

    let manifest_path = store.write(&output_dir, &manifest)?;

    let copier = AssetCopier::new(fs, glob);
    let sidecars = copier.copy(&copier.sidecars(&source_paths), &public_dir, &output_dir);
    let asset_files = copier.expand(&paths::resolve_patterns(&request.assets, &config.paths.public));
    let assets = copier.copy(&asset_files, &public_dir, &output_dir);

    let mut written = vec![output_dir.clone(), manifest_path.clone()];
    if let Some(previous) = &previous {
        written.extend(previous.values().map(|v| output_dir.join(v)));
    }
    for file in &versioned {
        written.push(output_dir.join(&file.versioned));
        written.extend(file.plain_copy.iter().cloned());
    }
    written.extend(rewritten.iter().cloned());
    written.extend(sidecars.copied.iter().cloned());
    written.extend(assets.copied.iter().cloned());
    written.sort();
    written.dedup();

    let report = RunReport {
        output_dir,
        manifest_path,
        manifest,
        removed,
        rewritten,
        sidecars,
        assets,
        written,
    };
    log_report(&report, config);
    Ok(report)
}

fn expand_all(glob: &dyn GlobExpander, patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = patterns.iter().flat_map(|p| glob.expand(p)).collect();
    files.sort();
    files.dedup();
    files
}

fn log_report(report: &RunReport, config: &RevConfig) {
    let output = relative_display(&report.output_dir, config.get_root());
    log!(
        "version";
        "{} file{} -> {}",
        report.manifest.len(),
        if report.manifest.len() == 1 { "" } else { "s" },
        output.display()
    );

    if report.removed > 0 {
        debug!("clean"; "removed {} stale file(s)", report.removed);
    }
    if !report.rewritten.is_empty() {
        log!("rewrite"; "updated {} file(s)", report.rewritten.len());
    }

    let copied = report.sidecars.copied.len() + report.assets.copied.len();
    if copied > 0 {
        log!("copy"; "{} sidecar/asset file(s)", copied);
    }
    if report.copy_failures() > 0 {
        log!("warning"; "{} file(s) could not be copied", report.copy_failures());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rev::fingerprint::{Fingerprint, embedded_fingerprint, versioned_name};
    use crate::rev::manifest::MANIFEST_FILE;
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, RevConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = RevConfig::default();
        config.set_root(dir.path());
        (dir, config)
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn request(sources: &[&str]) -> RunRequest {
        RunRequest {
            sources: SourceSpec::new(sources.iter().copied()),
            ..Default::default()
        }
    }

    /// Relative file set of a directory.
    fn listing(dir: &Path) -> BTreeSet<String> {
        jwalk::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| crate::utils::path::to_slash(e.path().strip_prefix(dir).unwrap()))
            .collect()
    }

    #[test]
    fn test_single_file_scenario() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");

        let report = run(&config, &request(&["app.js"])).unwrap();

        let out = dir.path().join("public/build");
        let hash = Fingerprint::of(b"console.log(1)");
        let expected = format!("app-{hash}.js");

        assert_eq!(report.output_dir, out);
        assert_eq!(report.manifest.get("app.js"), Some(expected.as_str()));
        assert!(out.join(&expected).exists());
        assert!(!out.join("app.js").exists());

        let on_disk: Manifest =
            Manifest::from_json(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(on_disk, report.manifest);
    }

    #[test]
    fn test_round_trip_every_value_exists_and_matches() {
        let (dir, config) = site();
        write(&dir, "public/css/app.css", "body { color: red }");
        write(&dir, "public/js/app.js", "console.log(1)");
        write(&dir, "public/js/vendor/lib.js", "lib()");

        let report = run(&config, &request(&["css/*.css", "js/**/*.js"])).unwrap();

        assert_eq!(report.manifest.len(), 3);
        for (_, versioned) in report.manifest.iter() {
            let bytes = fs::read(report.output_dir.join(versioned)).unwrap();
            assert_eq!(
                embedded_fingerprint(versioned),
                Some(Fingerprint::of(&bytes).as_str())
            );
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (dir, config) = site();
        write(&dir, "public/js/app.js", "console.log(1)");
        write(&dir, "public/js/app.js.map", "{}");
        let req = request(&["js/*.js"]);

        let first = run(&config, &req).unwrap();
        let files_after_first = listing(&first.output_dir);
        let second = run(&config, &req).unwrap();

        assert_eq!(first.manifest, second.manifest);
        assert_eq!(second.removed, 1);
        assert_eq!(listing(&second.output_dir), files_after_first);
    }

    #[test]
    fn test_changed_content_replaces_old_version() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");
        let req = request(&["app.js"]);

        let first = run(&config, &req).unwrap();
        let old = first.manifest.get("app.js").unwrap().to_string();

        write(&dir, "public/app.js", "console.log(2)");
        let second = run(&config, &req).unwrap();
        let new = second.manifest.get("app.js").unwrap().to_string();

        assert_ne!(old, new);
        assert!(!second.output_dir.join(&old).exists());
        assert!(second.output_dir.join(&new).exists());
        assert_eq!(second.manifest.len(), 1);
    }

    #[test]
    fn test_dropped_source_is_cleaned() {
        let (dir, config) = site();
        write(&dir, "public/a.js", "a");
        write(&dir, "public/b.js", "b");

        let first = run(&config, &request(&["a.js", "b.js"])).unwrap();
        let b_versioned = first.manifest.get("b.js").unwrap().to_string();

        let second = run(&config, &request(&["a.js"])).unwrap();
        assert!(!second.output_dir.join(&b_versioned).exists());
        assert!(second.manifest.get("b.js").is_none());
        assert_eq!(
            listing(&second.output_dir),
            BTreeSet::from([
                MANIFEST_FILE.to_string(),
                second.manifest.get("a.js").unwrap().to_string()
            ])
        );
    }

    #[test]
    fn test_prior_manifest_entry_is_deleted() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "new content");
        write(&dir, "public/build/app-0123456789.js", "old content");
        write(
            &dir,
            "public/build/rev-manifest.json",
            r#"{ "app.js": "app-0123456789.js" }"#,
        );

        let report = run(&config, &request(&["app.js"])).unwrap();

        assert_eq!(report.removed, 1);
        assert!(!report.output_dir.join("app-0123456789.js").exists());
        let fp = Fingerprint::of(b"new content");
        assert_eq!(
            report.manifest.get("app.js"),
            Some(versioned_name("app.js", &fp).as_str())
        );
    }

    #[test]
    fn test_malformed_previous_manifest_is_ignored() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");
        write(&dir, "public/build/rev-manifest.json", "{ broken");

        let report = run(&config, &request(&["app.js"])).unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(report.manifest.len(), 1);
    }

    #[test]
    fn test_missing_asset_glob_still_succeeds() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");

        let req = RunRequest {
            assets: vec!["images/*.png".into()],
            ..request(&["app.js"])
        };
        let report = run(&config, &req).unwrap();

        assert!(report.assets.copied.is_empty());
        assert!(report.assets.is_success());
        assert!(!report.output_dir.join("images").exists());
    }

    #[test]
    fn test_sidecars_and_assets_are_copied() {
        let (dir, config) = site();
        write(&dir, "public/js/app.js", "console.log(1)");
        write(&dir, "public/js/app.js.map", "{}");
        write(&dir, "public/fonts/a.woff", "font");

        let req = RunRequest {
            assets: vec!["fonts".into()],
            ..request(&["js/app.js"])
        };
        let report = run(&config, &req).unwrap();

        assert!(report.output_dir.join("js/app.js.map").exists());
        assert!(report.output_dir.join("fonts/a.woff").exists());
        assert_eq!(report.sidecars.copied.len(), 1);
        assert_eq!(report.assets.copied.len(), 1);
    }

    #[test]
    fn test_unreadable_source_keeps_previous_manifest() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");
        let first = run(&config, &request(&["app.js"])).unwrap();
        let manifest_before = fs::read_to_string(&first.manifest_path).unwrap();

        struct GhostGlob;
        impl GlobExpander for GhostGlob {
            fn expand(&self, _pattern: &str) -> Vec<PathBuf> {
                vec![PathBuf::from("/nonexistent/public/ghost.js")]
            }
        }

        let err = run_with(&config, &request(&["ghost.js"]), &LocalFs, &GhostGlob).unwrap_err();
        assert!(matches!(err, crate::rev::RevError::SourceRead { .. }));
        assert_eq!(
            fs::read_to_string(&first.manifest_path).unwrap(),
            manifest_before
        );
    }

    #[test]
    fn test_unresolvable_output_is_config_error() {
        let (_dir, mut config) = site();
        config.paths.build_folder = String::new();

        let err = run(&config, &request(&["app.js"])).unwrap_err();
        assert!(matches!(err, crate::rev::RevError::Config(_)));
    }

    #[test]
    fn test_explicit_output_and_rewrite_targets() {
        let (dir, mut config) = site();
        write(&dir, "public/app.js", "console.log(1)");
        write(&dir, "views/index.html", r#"<script src="/assets/app.js"></script>"#);
        config.rewrite.targets = vec!["views/*.html".into()];

        let req = RunRequest {
            output: Some("public/assets".into()),
            ..request(&["app.js"])
        };
        let report = run(&config, &req).unwrap();

        let versioned = report.manifest.get("app.js").unwrap();
        assert_eq!(report.rewritten, vec![dir.path().join("views/index.html")]);
        let html = fs::read_to_string(dir.path().join("views/index.html")).unwrap();
        assert_eq!(html, format!(r#"<script src="/assets/{versioned}"></script>"#));
    }

    #[test]
    fn test_dotted_public_root_rewrites_like_plain() {
        let (dir, mut config) = site();
        config.paths.public = "./public".into();
        config.rewrite.targets = vec!["views/*.html".into()];
        write(&dir, "public/app.js", "console.log(1)");
        write(&dir, "views/index.html", r#"<script src="/build/app.js"></script>"#);

        let report = run(&config, &request(&["app.js"])).unwrap();

        let versioned = report.manifest.get("app.js").unwrap();
        assert_eq!(report.rewritten, vec![dir.path().join("views/index.html")]);
        let html = fs::read_to_string(dir.path().join("views/index.html")).unwrap();
        assert_eq!(html, format!(r#"<script src="/build/{versioned}"></script>"#));
    }

    #[test]
    fn test_written_lists_outputs_but_not_sources() {
        let (dir, config) = site();
        write(&dir, "public/app.js", "console.log(1)");
        write(&dir, "public/app.js.map", "{}");
        let req = RunRequest {
            output: Some("public".into()),
            ..request(&["app.js"])
        };

        let first = run(&config, &req).unwrap();
        let versioned = first.manifest.get("app.js").unwrap().to_string();
        let out = dir.path().join("public");

        assert!(first.written.contains(&out.join(&versioned)));
        assert!(first.written.contains(&first.manifest_path));
        assert!(!first.written.contains(&out.join("app.js")));
        assert!(!first.written.contains(&out.join("app.js.map")));

        write(&dir, "public/app.js", "console.log(2)");
        let second = run(&config, &req).unwrap();
        assert!(second.written.contains(&out.join(&versioned)));
    }
}

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::rev::base_dir;

/// Watch-root consistency manager.
///
/// Attaches the directories sources live in, and re-attaches a directory
/// that was removed and recreated (e.g. by a bundler cleaning its output).
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    /// Roots for resolved source patterns, relative ones joined to `root`.
    ///
    /// A literal file is watched through its parent directory. Nested roots
    /// collapse into their ancestor.
    pub(super) fn for_patterns(patterns: &[String], root: &Path) -> Self {
        let mut dirs: Vec<PathBuf> = patterns
            .iter()
            .map(|pattern| {
                let base = root.join(base_dir(pattern));
                if base.is_file() {
                    base.parent().map_or(base.clone(), Path::to_path_buf)
                } else {
                    base
                }
            })
            .collect();
        dirs.sort();
        dirs.dedup();

        let mut desired: Vec<PathBuf> = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !desired.iter().any(|kept| dir.starts_with(kept)) {
                desired.push(dir);
            }
        }

        Self {
            desired,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn desired(&self) -> &[PathBuf] {
        &self.desired
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }

        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }

            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "re-attached watch: {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_roots_for_patterns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/js")).unwrap();
        fs::write(dir.path().join("public/app.js"), "").unwrap();

        let patterns = vec![
            "public/js/**/*.js".to_string(),
            "public/app.js".to_string(),
            "public/css/*.css".to_string(),
            "resources/*.js".to_string(),
        ];
        let roots = WatchRoots::for_patterns(&patterns, dir.path());

        // public/app.js watches public/, which already covers public/js and public/css
        assert_eq!(
            roots.desired(),
            [dir.path().join("public"), dir.path().join("resources")]
        );
    }
}

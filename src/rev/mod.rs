//! Asset revisioning.
//!
//! Copies source files into an output directory under content-fingerprinted
//! names and records the mapping in `rev-manifest.json`, so that pages can
//! reference long-cacheable URLs.
//!
//! # Module Structure
//!
//! ```text
//! rev/
//! ├── paths        # source/output resolution (pure)
//! ├── glob         # pattern expansion
//! ├── fingerprint  # hashing + fingerprinted copies
//! ├── manifest     # rev-manifest.json load/clean/write
//! ├── rewrite      # reference rewriting in target files
//! ├── copier       # sidecars + extra assets (best effort)
//! ├── fs           # filesystem seam
//! ├── error
//! └── run          # the whole pipeline
//! ```

mod copier;
mod error;
mod fingerprint;
mod fs;
mod glob;
mod manifest;
mod paths;
mod rewrite;
mod run;

pub use copier::CopyReport;
pub use error::{CopyError, RevError, RevResult};
pub use fingerprint::{Fingerprint, embedded_fingerprint, versioned_name};
pub use fs::{FileSystem, LocalFs};
pub use glob::{GlobExpander, PatternMatcher, WalkGlob, base_dir};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestStore};
pub use paths::{ResolvedPaths, SourceSpec, resolve};
pub use rewrite::{ReferenceRewriter, RegexRewriter, RewriteRule, compute_prefix};
pub use run::{RunReport, RunRequest, run, run_with};

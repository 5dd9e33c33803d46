//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: absolute normalization (`normalize_path`), display forms
//!   (`to_slash`, `relative_display`)

pub mod fs;

pub use fs::{normalize_path, relative_display, to_slash};

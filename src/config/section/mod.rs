//! Configuration section definitions.
//!
//! Each module corresponds to a section in `rev.toml`:
//!
//! | Module    | TOML Section  | Purpose                                |
//! |-----------|---------------|----------------------------------------|
//! | `paths`   | `[paths]`     | Public root and default build folder   |
//! | `version` | `[version]`   | Default sources, output, extra assets  |
//! | `rewrite` | `[rewrite]`   | Files whose references get rewritten   |
//! | `watch`   | `[watch]`     | Watch mode timing                      |

mod paths;
mod rewrite;
mod version;
mod watch;

pub use paths::PathsConfig;
pub use rewrite::RewriteConfig;
pub use version::VersionConfig;
pub use watch::WatchConfig;

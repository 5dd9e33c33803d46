//! Watch mode: rerun the versioning pipeline when sources change.
//!
//! ```text
//! notify ─▶ Debouncer (timing, dedup, own writes dropped) ─▶ rev::run
//! ```
//!
//! Events under the output directory only count when they hit a source
//! pattern, and never when the previous run wrote that path itself.
//!
//! The watcher is created before the initial run, so edits made while
//! that run is in progress are buffered rather than lost.

mod debouncer;
mod roots;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::RevConfig;
use crate::core::{is_shutdown, set_watching};
use crate::logger::{status_error, status_success, status_warning};
use crate::rev::{self, PatternMatcher, RunReport, RunRequest};
use crate::{debug, log};
use debouncer::Debouncer;
use roots::WatchRoots;

/// Upper bound on one wait, so Ctrl+C is noticed promptly.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Run once, then again after every debounced change, until Ctrl+C.
pub fn watch(config: &RevConfig, request: &RunRequest) -> Result<()> {
    // Bad paths fail here, before a watcher is set up
    let resolved = rev::resolve(
        &request.sources,
        request.output.as_deref(),
        &config.paths.public,
        &config.paths.build_folder,
    )?;
    let output_dir = config.root_join(&resolved.output_dir);

    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })
    .context("failed to create file watcher")?;

    let mut roots = WatchRoots::for_patterns(&resolved.sources, config.get_root());
    roots
        .attach_existing(&mut watcher)
        .context("failed to watch source directories")?;
    for root in roots.desired() {
        debug!("watch"; "watching {}", root.display());
    }

    let sources = resolved
        .sources
        .iter()
        .filter_map(|pattern| PatternMatcher::new(config.get_root(), pattern))
        .collect();
    let mut debouncer = Debouncer::new(config.watch.debounce()).guard_output(&output_dir, sources);

    set_watching(true);
    if let Some(report) = rerun(config, request) {
        debouncer.set_own_writes(&report.written);
    }
    log!("watch"; "waiting for changes, Ctrl+C to stop");

    while !is_shutdown() {
        match rx.recv_timeout(debouncer.sleep_duration().min(SHUTDOWN_POLL)) {
            Ok(Ok(event)) => debouncer.add_event(&event),
            Ok(Err(e)) => log!("watch"; "notify error: {}", e),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(changes) = debouncer.take_if_ready() {
                    debug!("watch"; "{} change(s)", changes.len());
                    roots.maintain(&mut watcher);
                    if let Some(report) = rerun(config, request) {
                        debouncer.set_own_writes(&report.written);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    set_watching(false);
    Ok(())
}

/// One pipeline run, reported on the status line. Failures never stop
/// the watch loop.
fn rerun(config: &RevConfig, request: &RunRequest) -> Option<RunReport> {
    match rev::run(config, request) {
        Ok(report) => {
            if report.copy_failures() > 0 {
                status_warning(&format!(
                    "{} versioned, {} file(s) not copied",
                    report.manifest.len(),
                    report.copy_failures()
                ));
            } else {
                status_success(&format!("{} versioned", report.manifest.len()));
            }
            Some(report)
        }
        Err(e) => {
            status_error("run failed", &format!("{:#}", anyhow::Error::from(e)));
            None
        }
    }
}

//! Terminal output.
//!
//! ```ignore
//! log!("version"; "{} files -> {}", count, output.display());
//! debug!("clean"; "{}", removed);   // only with --verbose
//! status_success("3 versioned");    // watch mode status line
//! ```
//!
//! Watch mode ends every run with one timestamped status block. Two status
//! blocks in a row replace each other; any `log!` line in between keeps the
//! earlier block on screen.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::SystemTime,
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Macros
// ============================================================================

/// `log!("module"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    STATUS.lock().detach();

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{} {message}", prefix(module)).ok();
    stdout.flush().ok();
}

/// `[module]`, colored by what the module touches.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "version" => tag.bright_blue().bold().to_string(),
        "watch" => tag.bright_green().bold().to_string(),
        "rewrite" | "copy" | "clean" => tag.bright_cyan().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch status
// ============================================================================

static STATUS: Mutex<WatchStatus> = parking_lot::const_mutex(WatchStatus { last_lines: 0 });

/// Last status block still on screen.
struct WatchStatus {
    /// Lines to erase before the next block, 0 when nothing may be erased
    last_lines: usize,
}

impl WatchStatus {
    fn show(&mut self, symbol: &str, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock(unix_secs())).dimmed().to_string();
        writeln!(stdout, "{stamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = message.lines().count().max(1);
    }

    fn detach(&mut self) {
        self.last_lines = 0;
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// UTC `HH:MM:SS`.
fn clock(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

pub fn status_success(message: &str) {
    STATUS.lock().show(&"✓".green().to_string(), message);
}

/// `summary` on the status line, `detail` (if any) below it.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    STATUS.lock().show(&"✗".red().to_string(), &message);
}

pub fn status_warning(message: &str) {
    STATUS.lock().show(&"⚠".yellow().to_string(), message);
}

//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output shown only with `--verbose`
//! - `ChunkProgress` for single-line chunk upload counters
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("rewrite"; "updated {}", path.display());
//!
//! // Progress line for one resource
//! let progress = ChunkProgress::new("/index.html", 3);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Whether a progress line currently occupies the bottom terminal line
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();

    // A live progress line sits on the current row; wipe it so the log line
    // lands cleanly, the next progress refresh redraws it.
    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "upload" | "publish" => prefix.bright_blue().bold().to_string(),
        "pin" => prefix.bright_magenta().bold().to_string(),
        "rewrite" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Chunk Progress (single-line counter)
// ============================================================================

/// Single-line progress display for one resource's chunk loop
///
/// Displays: `[upload] /index.html(2/3)`
///
/// Only drawn when stdout is a terminal; otherwise every update is a no-op
/// and `finish` prints the final count as a regular log line.
pub struct ChunkProgress {
    resource: String,
    total: usize,
    current: AtomicUsize,
    interactive: bool,
    lock: Mutex<()>,
}

impl ChunkProgress {
    /// Create a new progress line for `resource` with `total` chunks.
    pub fn new(resource: &str, total: usize) -> Self {
        let interactive = stdout().is_terminal();
        if interactive {
            PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        }

        let progress = Self {
            resource: resource.to_string(),
            total,
            current: AtomicUsize::new(0),
            interactive,
            lock: Mutex::new(()),
        };
        progress.display();
        progress
    }

    /// Record one confirmed chunk.
    #[inline]
    pub fn inc(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        if self.lock.try_lock().is_some() {
            self.display();
        }
    }

    /// Number of chunks recorded so far.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    fn line(&self) -> String {
        format!("{}({}/{})", self.resource, self.current(), self.total)
    }

    /// Redraw the current progress line (no newline).
    fn display(&self) {
        if !self.interactive {
            return;
        }
        let prefix = colorize_prefix("upload", "upload");
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        write!(stdout, "{} {}", prefix, self.line()).ok();
        stdout.flush().ok();
    }

    /// Finish progress display, preserve line and move to next line.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        {
            let _guard = self.lock.lock();
            let prefix = colorize_prefix("upload", "upload");
            let mut stdout = stdout().lock();
            if self.interactive {
                execute!(
                    stdout,
                    cursor::MoveToColumn(0),
                    Clear(ClearType::CurrentLine)
                )
                .ok();
            }
            writeln!(stdout, "{} {}", prefix, self.line()).ok();
            stdout.flush().ok();
        }

        std::mem::forget(self); // Prevent Drop from clearing
    }
}

impl Drop for ChunkProgress {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        if !self.interactive {
            return;
        }

        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Terminal logging with colored module prefixes and progress bars.
//!
//! ```ignore
//! log!("build"; "rendering {} pages", count);
//!
//! let progress = ProgressBars::new_filtered(&[("render", pages.len())]);
//! progress.as_ref().map(|p| p.inc("render"));
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Number of progress bars currently on screen, so `log` can print above them.
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// Progress bar format: "[module] [████░░░░] 42/100"

/// "[" + "]" + trailing space around a module name.
const PREFIX_OVERHEAD: usize = 3;
/// " []" around the bar plus the space before the count.
const BAR_OVERHEAD: usize = 4;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

/// Log a message with a colored module prefix.
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

// ============================================================================
// Progress Bars
// ============================================================================

/// Progress bars drawn on consecutive terminal lines, updated in place.
///
/// Safe to increment from rayon workers; terminal writes are serialized.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
    row: usize,
}

impl ProgressBars {
    /// Reserve one terminal line per `(name, total)` entry.
    pub fn new(modules: &[(&'static str, usize)]) -> Self {
        let mut stdout = stdout().lock();
        for _ in modules {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();

        BAR_COUNT.store(modules.len(), Ordering::SeqCst);

        let bars = modules
            .iter()
            .enumerate()
            .map(|(row, &(name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name),
                total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
        }
    }

    /// Like [`ProgressBars::new`], skipping empty entries.
    ///
    /// Returns `None` when there is at most one item in total.
    pub fn new_filtered(modules: &[(&'static str, usize)]) -> Option<Self> {
        let filtered: Vec<_> = modules.iter().filter(|(_, n)| *n > 0).copied().collect();
        let total: usize = filtered.iter().map(|(_, n)| n).sum();
        (total > 1).then(|| Self::new(&filtered))
    }

    /// Advance the bar registered under `name`.
    pub fn inc(&self, name: &str) {
        if let Some(bar) = self.bars.iter().find(|bar| bar.name == name) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.display(bar, current);
        }
    }

    fn display(&self, bar: &ProgressBar, current: usize) {
        let _guard = self.lock.lock().ok();

        let count = format!("{current}/{}", bar.total);
        let overhead = bar.name.len() + PREFIX_OVERHEAD + BAR_OVERHEAD + count.len();
        let width = terminal_width()
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        let filled = (current * width).checked_div(bar.total).unwrap_or(0).min(width);
        let drawn = "█".repeat(filled) + &"░".repeat(width - filled);

        let mut stdout = stdout().lock();
        #[allow(clippy::cast_possible_truncation)] // bar count is always small
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{drawn}] {count}", bar.prefix).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Clear all bars from the terminal.
    pub fn finish(&self) {
        if BAR_COUNT.swap(0, Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        #[allow(clippy::cast_possible_truncation)]
        let rows = self.bars.len() as u16;
        execute!(stdout, cursor::MoveUp(rows), Clear(ClearType::FromCursorDown)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

// ============================================================================
// Plain Logging
// ============================================================================

/// Print `[module] message`, truncated to the terminal width.
///
/// Multi-line messages (e.g. error chains) are printed untruncated.
#[allow(clippy::cast_possible_truncation)]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16), Clear(ClearType::FromCursorDown)).ok();
    }

    let message = if message.contains('\n') {
        message
    } else {
        let max_len = terminal_width().saturating_sub(module.len() + PREFIX_OVERHEAD);
        truncate_str(message, max_len)
    };
    writeln!(stdout, "{prefix} {message}").ok();

    for _ in 0..bar_count {
        writeln!(stdout).ok();
    }
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "build" | "init" => prefix.bright_green().bold(),
        "render" | "write" => prefix.bright_blue().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

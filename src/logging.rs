//! Logging with timestamps, source locations, and ANSI colour support.
//!
//! Provides the [`tiplog!`] macro for consistent log output in the format:
//!
//! ```text
//! 20260830T14:02:51.000 - src/main.rs:88 - tip: 2.500000 STX -> @alice
//! ```
//!
//! When writing to a terminal, timestamps and source locations are dimmed
//! and usernames get a consistent colour derived from their content. Log
//! lines go to stderr by default; [`set_writer`] redirects output to any
//! [`std::io::Write`] implementor and disables colour codes.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

static COLOUR_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_WRITER: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

/// Initialize the logging system. Call once at startup before any logging.
/// Detects whether stderr supports ANSI colours.
pub fn init() {
    let is_terminal = io::stderr().is_terminal();
    COLOUR_ENABLED.store(is_terminal, Ordering::Relaxed);
}

/// Replace the log writer. All subsequent [`tiplog!`] output goes to `w`,
/// without colour codes.
pub fn set_writer(w: Box<dyn Write + Send>) {
    COLOUR_ENABLED.store(false, Ordering::Relaxed);
    *LOG_WRITER.lock().unwrap() = w;
}

/// Returns whether ANSI colour output is enabled.
pub fn colour_enabled() -> bool {
    COLOUR_ENABLED.load(Ordering::Relaxed)
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const TXID_COLOUR: &str = "\x1b[93m"; // bright yellow

/// Bright, visually distinct colours for username hashing.
const NAME_COLOURS: &[&str] = &[
    "\x1b[91m", // bright red
    "\x1b[92m", // bright green
    "\x1b[94m", // bright blue
    "\x1b[95m", // bright magenta
    "\x1b[96m", // bright cyan
];

fn hash_colour(name: &str) -> &'static str {
    let hash: u32 = name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    NAME_COLOURS[(hash as usize) % NAME_COLOURS.len()]
}

/// Format a username for log output: `@alice`, coloured consistently for
/// the same name.
pub fn username(name: &str) -> String {
    if colour_enabled() {
        let colour = hash_colour(name);
        format!("{colour}@{name}{RESET}")
    } else {
        format!("@{name}")
    }
}

const TXID_TRUNCATE_LEN: usize = 10;

/// Format a transaction id truncated to a recognizable prefix.
pub fn tx_id(id: &str) -> String {
    let end = id
        .char_indices()
        .nth(TXID_TRUNCATE_LEN)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    let short = &id[..end];
    if colour_enabled() {
        format!("{TXID_COLOUR}{short}{RESET}")
    } else {
        short.to_string()
    }
}

/// Format an epoch-milliseconds timestamp as `YYYYMMDDTHH:MM:SS.mmm`.
pub fn format_timestamp_millis(millis: u64) -> String {
    let secs = millis / 1000;
    let subsec = millis % 1000;

    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let minutes = (time_secs % 3600) / 60;
    let seconds = time_secs % 60;

    // Civil date from days since epoch (Howard Hinnant's algorithm).
    let days = (secs / 86400) as i64;
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };

    format!(
        "{:04}{:02}{:02}T{:02}:{:02}:{:02}.{:03}",
        y, m, d, hours, minutes, seconds, subsec
    )
}

/// The current wall-clock time in the log line format.
pub fn format_timestamp() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    format_timestamp_millis(millis)
}

/// Write a single log line to the current writer.
///
/// Called by the [`tiplog!`] macro; not intended for direct use.
pub fn emit(file: &str, line: u32, msg: &str) {
    let ts = format_timestamp();
    let formatted = if colour_enabled() {
        format!("{DIM}{ts}{RESET} {DIM}{file}:{line}{RESET} {msg}")
    } else {
        format!("{ts} - {file}:{line} - {msg}")
    };
    let mut writer = LOG_WRITER.lock().unwrap();
    let _ = writeln!(*writer, "{formatted}");
}

/// Emit a log line to the current writer with timestamp and source
/// location.
///
/// ```ignore
/// tiplog!("claim: {} -> {}", address, logging::username(&name));
/// ```
#[macro_export]
macro_rules! tiplog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}

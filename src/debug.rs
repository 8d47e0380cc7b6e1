//! Diagnostic log for sidepane.
//!
//! `init_log_bridge` installs a `log::Log` implementation that routes every
//! `log::info!()` etc. to:
//! - `/tmp/sidepane_debug.log` on Unix/macOS (`%TEMP%\sidepane_debug.log` on Windows),
//! - a bounded in-memory ring of recent lines that backs the "show log" command,
//! - stderr as well, when `RUST_LOG` is set.
//!
//! Level precedence: CLI `--log-level`, then `RUST_LOG`, then the config's
//! `log_level` (applied later via [`set_level`]).

use parking_lot::Mutex;
use sidepane_config::LogLevel;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lines kept in memory for [`recent_lines`].
pub const RING_CAPACITY: usize = 500;

/// Bounded buffer of formatted log lines, oldest first.
#[derive(Debug)]
pub struct LogRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(RING_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

struct Bridge {
    file: Mutex<Option<File>>,
    ring: Mutex<LogRing>,
    mirror_stderr: bool,
}

static BRIDGE: OnceLock<Bridge> = OnceLock::new();
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

/// Location of the diagnostic log file.
pub fn log_file_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/sidepane_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("sidepane_debug.log")
    }
}

fn format_line(record: &log::Record<'_>) -> String {
    format!(
        "[{}] [{:<5}] [{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.args()
    )
}

impl log::Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        if let Some(file) = self.file.lock().as_mut() {
            // A failed write must never disturb the host.
            let _ = writeln!(file, "{line}");
        }
        if self.mirror_stderr {
            eprintln!("{line}");
        }
        self.ring.lock().push(line);
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Install the log bridge. Safe to call more than once; later calls only
/// adjust the level.
///
/// `cli_level` wins over `RUST_LOG`; when neither is given the level stays
/// at `Info` until [`set_level`] applies the config value.
pub fn init_log_bridge(cli_level: Option<LogLevel>) {
    let env_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LogLevel>().ok());
    let level = cli_level.or(env_level);

    let bridge = BRIDGE.get_or_init(|| {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_file_path())
            .ok();
        Bridge {
            file: Mutex::new(file),
            ring: Mutex::new(LogRing::new(RING_CAPACITY)),
            mirror_stderr: std::env::var_os("RUST_LOG").is_some(),
        }
    });
    // Only the first installation succeeds; the bridge is static either way.
    let _ = log::set_logger(bridge);

    match level {
        Some(level) => {
            LEVEL_PINNED.store(true, Ordering::Relaxed);
            log::set_max_level(level.to_level_filter());
        }
        None => log::set_max_level(log::LevelFilter::Info),
    }
}

/// Apply the config's log level unless the CLI or `RUST_LOG` pinned one.
pub fn set_level(level: LogLevel) {
    if !LEVEL_PINNED.load(Ordering::Relaxed) {
        log::set_max_level(level.to_level_filter());
    }
}

/// Recent log lines, oldest first. Empty if the bridge is not installed.
pub fn recent_lines() -> Vec<String> {
    BRIDGE
        .get()
        .map(|b| b.ring.lock().lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// The diagnostic log as text: the in-memory lines if there are any,
/// otherwise whatever the log file holds.
pub fn diagnostic_log() -> String {
    let lines = recent_lines();
    if !lines.is_empty() {
        return lines.join("\n");
    }
    std::fs::read_to_string(log_file_path()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_drops_oldest_when_full() {
        let mut ring = LogRing::new(2);
        ring.push("one".into());
        ring.push("two".into());
        ring.push("three".into());
        assert_eq!(ring.lines().collect::<Vec<_>>(), vec!["two", "three"]);
    }

    #[test]
    fn test_zero_capacity_ring_keeps_nothing() {
        let mut ring = LogRing::new(0);
        ring.push("ignored".into());
        assert!(ring.is_empty());
    }

    #[test]
    fn test_bridge_records_lines() {
        init_log_bridge(Some(LogLevel::Debug));
        log::debug!(target: "sidepane::test", "bridge smoke line");
        assert!(
            recent_lines()
                .iter()
                .any(|l| l.contains("bridge smoke line") && l.contains("sidepane::test"))
        );
    }
}

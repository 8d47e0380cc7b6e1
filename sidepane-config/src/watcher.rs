//! Hot reload for the rules file.
//!
//! Rules are read fresh on every editor event, so picking up an edited
//! `config.yaml` only requires swapping the snapshot the companion reads.
//! This watcher reports when that should happen; editors that save several
//! times in quick succession are collapsed into one event by a debounce window.

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// The watched config file changed on disk.
#[derive(Debug, Clone)]
pub struct ConfigReloadEvent {
    pub path: PathBuf,
}

/// Watches one config file and queues [`ConfigReloadEvent`]s.
pub struct ConfigWatcher {
    /// Kept alive so the OS watch stays registered.
    _watcher: Box<dyn Watcher + Send>,
    events: Receiver<ConfigReloadEvent>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher").finish_non_exhaustive()
    }
}

/// Shared state for the notify callback.
#[derive(Clone)]
struct ReloadFilter {
    file_name: OsString,
    path: PathBuf,
    debounce: Duration,
    last_sent: Arc<Mutex<Option<Instant>>>,
    tx: Sender<ConfigReloadEvent>,
}

impl ReloadFilter {
    fn handle(&self, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Config watcher error: {}", e);
                return;
            }
        };

        // Create covers editors that save by writing a temp file and renaming it.
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        if !event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
        {
            return;
        }

        {
            let now = Instant::now();
            let mut last = self.last_sent.lock();
            if let Some(prev) = *last
                && now.duration_since(prev) < self.debounce
            {
                log::trace!("Debouncing config reload event");
                return;
            }
            *last = Some(now);
        }

        log::info!("Config file changed: {}", self.path.display());
        if let Err(e) = self.tx.send(ConfigReloadEvent {
            path: self.path.clone(),
        }) {
            log::error!("Failed to queue config reload event: {}", e);
        }
    }
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// The parent directory is watched non-recursively so atomic saves are
    /// seen. The native backend is tried first; if it cannot start, a
    /// `PollWatcher` polling every 500 ms is used instead.
    ///
    /// # Errors
    /// Fails if the file does not exist or neither backend can watch it.
    pub fn new(config_path: &Path, debounce_delay_ms: u64) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        let canonical = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let file_name = canonical
            .file_name()
            .context("Config path has no filename")?
            .to_os_string();
        let parent_dir = canonical
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        let (tx, rx) = channel();
        let filter = ReloadFilter {
            file_name,
            path: canonical.clone(),
            debounce: Duration::from_millis(debounce_delay_ms),
            last_sent: Arc::new(Mutex::new(None)),
            tx,
        };

        let mut watcher = Self::create_watcher(filter)?;
        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!("Failed to watch config directory: {}", parent_dir.display())
            })?;

        log::info!("Config hot reload: watching {}", canonical.display());

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    fn create_watcher(filter: ReloadFilter) -> Result<Box<dyn Watcher + Send>> {
        let native = filter.clone();
        match notify::recommended_watcher(move |res: notify::Result<Event>| native.handle(res)) {
            Ok(w) => {
                log::debug!("Config watcher: using native backend");
                Ok(Box::new(w))
            }
            Err(e) => {
                log::warn!(
                    "Config watcher: native backend unavailable ({}); falling back to PollWatcher",
                    e
                );
                let poll = PollWatcher::new(
                    move |res: notify::Result<Event>| filter.handle(res),
                    NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
                )
                .context("Failed to create fallback PollWatcher")?;
                Ok(Box::new(poll))
            }
        }
    }

    /// Next pending reload, if any (non-blocking).
    ///
    /// Several queued events collapse into one: only the fact that a reload
    /// is due matters.
    pub fn try_recv(&self) -> Option<ConfigReloadEvent> {
        let mut latest = None;
        while let Ok(event) = self.events.try_recv() {
            latest = Some(event);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_creation_with_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "enabled: true\n").expect("Failed to write config");

        assert!(ConfigWatcher::new(&config_path, 100).is_ok());
    }

    #[test]
    fn test_watcher_creation_with_nonexistent_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("missing").join("config.yaml");

        assert!(ConfigWatcher::new(&config_path, 100).is_err());
    }

    #[test]
    fn test_no_event_without_changes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "enabled: true\n").expect("Failed to write config");

        let watcher = ConfigWatcher::new(&config_path, 100).expect("watcher");
        assert!(watcher.try_recv().is_none());
    }

    #[test]
    fn test_filter_ignores_other_files_and_debounces() {
        let (tx, rx) = channel();
        let filter = ReloadFilter {
            file_name: OsString::from("config.yaml"),
            path: PathBuf::from("/cfg/config.yaml"),
            debounce: Duration::from_secs(60),
            last_sent: Arc::new(Mutex::new(None)),
            tx,
        };
        let modify = |p: &str| {
            Ok(Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
                .add_path(PathBuf::from(p)))
        };

        filter.handle(modify("/cfg/other.yaml"));
        assert!(rx.try_recv().is_err());

        filter.handle(modify("/cfg/config.yaml"));
        filter.handle(modify("/cfg/config.yaml"));
        assert_eq!(rx.try_iter().count(), 1);
    }
}

//! The capability interface the rule engine drives.
//!
//! All editor state (open editors, panes, what is visible) belongs to the
//! host and is read fresh on every event. The engine only ever talks to an
//! [`EditorHost`]: an adapter around a real editor, or the in-memory
//! [`Workspace`](crate::workspace::Workspace) used by the CLI and the tests.

use crate::pane::{OpenOptions, PaneIndex, PaneTarget};
use std::path::{Path, PathBuf};

/// The editor that currently has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEditor {
    pub path: PathBuf,
    pub pane: PaneIndex,
}

/// A file shown in some pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleFile {
    pub path: PathBuf,
    pub pane: PaneIndex,
}

/// Notifications a host delivers, one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A different file became the active editor.
    ActiveFileChanged(PathBuf),
    /// A file's last editor was closed.
    FileClosed(PathBuf),
}

/// Failures reported by a host. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to open {}: {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },

    #[error("failed to close the active editor: {reason}")]
    CloseFailed { reason: String },

    #[error("no active editor")]
    NoActiveEditor,
}

/// What the engine needs from an editor.
///
/// Calls are made sequentially from a single event handler; implementations
/// do not need to be `Send` or `Sync`.
#[allow(async_fn_in_trait)]
pub trait EditorHost {
    /// The focused editor and the pane hosting it.
    async fn active_editor(&self) -> Option<ActiveEditor>;

    /// Files currently shown in any pane.
    async fn visible_files(&self) -> Vec<VisibleFile>;

    /// Every loaded document, visible or in a background tab.
    async fn loaded_files(&self) -> Vec<PathBuf>;

    /// Open `path` at `target`.
    async fn open_file(
        &mut self,
        path: &Path,
        target: PaneTarget,
        options: OpenOptions,
    ) -> Result<(), HostError>;

    /// Close the editor shown in the active pane.
    async fn close_active_editor(&mut self) -> Result<(), HostError>;

    /// Probe whether `path` exists. Inaccessible paths count as missing.
    async fn file_exists(&self, path: &Path) -> bool {
        probe_path(path).await
    }
}

/// Filesystem existence probe. Never fails: errors read as "missing".
pub async fn probe_path(path: &Path) -> bool {
    match tokio::fs::try_exists(path).await {
        Ok(exists) => exists,
        Err(e) => {
            log::debug!("Existence probe for {} failed: {}", path.display(), e);
            false
        }
    }
}

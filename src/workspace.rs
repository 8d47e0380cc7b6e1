//! An in-memory editor: panes of tabs, with the focus rules of a typical
//! multi-column editor.
//!
//! `Workspace` implements [`EditorHost`] so the engine can run without a real
//! editor: the CLI replays user actions against it, and the integration tests
//! use it as their host. It queues the same notifications a real editor would
//! send (`ActiveFileChanged`, `FileClosed`); the driver drains and dispatches
//! them.
//!
//! Columns are contiguous: opening past the last pane appends one new pane,
//! and a pane whose last tab is closed disappears unless it is the only one.

use crate::companion::{Companion, Report};
use crate::host::{ActiveEditor, EditorHost, HostError, HostEvent, VisibleFile, probe_path};
use crate::pane::{OpenOptions, PaneIndex, PaneTarget};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

/// Notifications dispatched per user action before the queue is dropped.
pub const EVENT_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tab {
    path: PathBuf,
    preview: bool,
}

#[derive(Debug, Clone, Default)]
struct Pane {
    tabs: Vec<Tab>,
    active: usize,
}

impl Pane {
    fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.tabs.iter().position(|t| t.path == path)
    }
}

/// Serializable view of one pane, for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneSnapshot {
    pub index: PaneIndex,
    pub tabs: Vec<PathBuf>,
    pub visible: Option<PathBuf>,
    pub focused: bool,
}

/// In-memory editor host.
#[derive(Debug, Default)]
pub struct Workspace {
    panes: Vec<Pane>,
    active_pane: usize,
    events: VecDeque<HostEvent>,
    /// When set, existence probes consult this set instead of the disk.
    virtual_files: Option<HashSet<PathBuf>>,
    rejected_opens: HashSet<PathBuf>,
    reject_close: bool,
}

impl Workspace {
    /// An empty workspace whose existence probes hit the real filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty workspace that only "has" the given files on disk.
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            virtual_files: Some(files.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Add a file to the virtual disk (no-op for a disk-backed workspace).
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        if let Some(files) = self.virtual_files.as_mut() {
            files.insert(path.into());
        }
    }

    /// Make every future open of `path` fail.
    pub fn reject_open(&mut self, path: impl Into<PathBuf>) {
        self.rejected_opens.insert(path.into());
    }

    /// Make every future close of the active editor fail.
    pub fn reject_close(&mut self, reject: bool) {
        self.reject_close = reject;
    }

    /// Dispatch queued notifications to `companion`, including the ones its
    /// own actions cause, until the queue is empty or `limit` were handled.
    pub async fn pump(&mut self, companion: &mut Companion, limit: usize) -> Vec<Report> {
        let mut reports = Vec::new();
        while let Some(event) = self.events.pop_front() {
            if reports.len() == limit {
                log::warn!(
                    "Dropping {} pending event(s) after {} were handled",
                    self.events.len() + 1,
                    limit
                );
                self.events.clear();
                break;
            }
            reports.push(companion.handle_event(event, self).await);
        }
        reports
    }

    /// Take all queued notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.panes
            .get(self.active_pane)
            .and_then(Pane::active_tab)
            .map(|t| t.path.as_path())
    }

    /// Files visible in each pane, left to right.
    pub fn visible_paths(&self) -> Vec<Option<&Path>> {
        self.panes
            .iter()
            .map(|p| p.active_tab().map(|t| t.path.as_path()))
            .collect()
    }

    /// Whether `path` is open as a preview tab anywhere.
    pub fn is_preview(&self, path: &Path) -> bool {
        self.panes
            .iter()
            .flat_map(|p| p.tabs.iter())
            .any(|t| t.path == path && t.preview)
    }

    pub fn snapshot(&self) -> Vec<PaneSnapshot> {
        self.panes
            .iter()
            .enumerate()
            .map(|(i, pane)| PaneSnapshot {
                index: pane_index(i),
                tabs: pane.tabs.iter().map(|t| t.path.clone()).collect(),
                visible: pane.active_tab().map(|t| t.path.clone()),
                focused: i == self.active_pane,
            })
            .collect()
    }

    /// User action: focus `path`, opening it in the active pane if needed.
    pub fn focus(&mut self, path: &Path) {
        let found = self
            .panes
            .get(self.active_pane)
            .and_then(|p| p.position(path))
            .map(|tab| (self.active_pane, tab))
            .or_else(|| {
                self.panes
                    .iter()
                    .enumerate()
                    .find_map(|(i, p)| p.position(path).map(|tab| (i, tab)))
            });

        match found {
            Some((pane, tab)) => self.with_active_tracking(|ws| {
                ws.panes[pane].active = tab;
                ws.active_pane = pane;
            }),
            None => self.place(path, self.active_pane, OpenOptions::FOCUSED),
        }
    }

    /// User action: open `path` focused in `pane` (appending a pane if needed).
    pub fn open_in_pane(&mut self, path: &Path, pane: PaneIndex) {
        let column = pane.as_offset().min(self.panes.len());
        self.place(path, column, OpenOptions::FOCUSED);
    }

    /// User action: close every tab showing `path`.
    pub fn close(&mut self, path: &Path) {
        self.with_active_tracking(|ws| {
            let mut removed = false;
            for pane in &mut ws.panes {
                while let Some(pos) = pane.position(path) {
                    pane.tabs.remove(pos);
                    if pane.active > pos || pane.active >= pane.tabs.len() {
                        pane.active = pane.active.saturating_sub(1);
                    }
                    removed = true;
                }
            }
            ws.collapse_empty_panes();
            if removed {
                ws.events.push_back(HostEvent::FileClosed(path.to_path_buf()));
            }
        });
    }

    fn column_for(&self, target: PaneTarget) -> usize {
        let column = match target {
            PaneTarget::Active => self.active_pane,
            PaneTarget::Beside => self.active_pane + 1,
            PaneTarget::Index(index) => index.as_offset(),
        };
        column.min(self.panes.len())
    }

    fn place(&mut self, path: &Path, column: usize, options: OpenOptions) {
        self.with_active_tracking(|ws| {
            if column == ws.panes.len() {
                ws.panes.push(Pane::default());
            }
            let pane = &mut ws.panes[column];
            let tab = match pane.position(path) {
                Some(pos) => {
                    if !options.preview {
                        pane.tabs[pos].preview = false;
                    }
                    pos
                }
                None => {
                    let tab = Tab {
                        path: path.to_path_buf(),
                        preview: options.preview,
                    };
                    match pane.tabs.iter().position(|t| t.preview) {
                        Some(pos) if options.preview => {
                            pane.tabs[pos] = tab;
                            pos
                        }
                        _ => {
                            pane.tabs.push(tab);
                            pane.tabs.len() - 1
                        }
                    }
                }
            };
            pane.active = tab;
            if !options.preserve_focus || ws.panes.len() == 1 {
                ws.active_pane = column;
            }
        });
    }

    /// Drop empty panes, except that the last pane always survives.
    fn collapse_empty_panes(&mut self) {
        let mut i = 0;
        while i < self.panes.len() {
            if self.panes[i].tabs.is_empty() && self.panes.len() > 1 {
                self.panes.remove(i);
                if self.active_pane > i {
                    self.active_pane -= 1;
                }
            } else {
                i += 1;
            }
        }
        if self.active_pane >= self.panes.len() {
            self.active_pane = self.panes.len().saturating_sub(1);
        }
    }

    /// Run `f` and queue `ActiveFileChanged` if the active file changed.
    fn with_active_tracking(&mut self, f: impl FnOnce(&mut Self)) {
        let before = self.active_path().map(Path::to_path_buf);
        f(self);
        let after = self.active_path().map(Path::to_path_buf);
        if after != before
            && let Some(path) = after
        {
            self.events.push_back(HostEvent::ActiveFileChanged(path));
        }
    }
}

fn pane_index(offset: usize) -> PaneIndex {
    PaneIndex::new(offset as u32 + 1).unwrap_or(PaneIndex::FIRST)
}

impl EditorHost for Workspace {
    async fn active_editor(&self) -> Option<ActiveEditor> {
        self.active_path().map(|path| ActiveEditor {
            path: path.to_path_buf(),
            pane: pane_index(self.active_pane),
        })
    }

    async fn visible_files(&self) -> Vec<VisibleFile> {
        self.panes
            .iter()
            .enumerate()
            .filter_map(|(i, pane)| {
                pane.active_tab().map(|t| VisibleFile {
                    path: t.path.clone(),
                    pane: pane_index(i),
                })
            })
            .collect()
    }

    async fn loaded_files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.panes
            .iter()
            .flat_map(|p| p.tabs.iter())
            .filter(|t| seen.insert(t.path.clone()))
            .map(|t| t.path.clone())
            .collect()
    }

    async fn open_file(
        &mut self,
        path: &Path,
        target: PaneTarget,
        options: OpenOptions,
    ) -> Result<(), HostError> {
        if self.rejected_opens.contains(path) {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: "rejected by workspace".to_string(),
            });
        }
        let column = self.column_for(target);
        self.place(path, column, options);
        Ok(())
    }

    async fn close_active_editor(&mut self) -> Result<(), HostError> {
        if self.reject_close {
            return Err(HostError::CloseFailed {
                reason: "rejected by workspace".to_string(),
            });
        }
        let Some(pane) = self.panes.get(self.active_pane) else {
            return Err(HostError::NoActiveEditor);
        };
        let Some(tab) = pane.active_tab().cloned() else {
            return Err(HostError::NoActiveEditor);
        };

        let active_pane = self.active_pane;
        self.with_active_tracking(|ws| {
            let pane = &mut ws.panes[active_pane];
            pane.tabs.remove(pane.active);
            pane.active = pane.active.min(pane.tabs.len().saturating_sub(1));
            ws.collapse_empty_panes();
            let still_open = ws
                .panes
                .iter()
                .any(|p| p.position(&tab.path).is_some());
            if !still_open {
                ws.events.push_back(HostEvent::FileClosed(tab.path.clone()));
            }
        });
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> bool {
        match &self.virtual_files {
            Some(files) => files.contains(path),
            None => probe_path(path).await,
        }
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panes.is_empty() {
            return writeln!(f, "(no panes)");
        }
        for pane in self.snapshot() {
            let marker = if pane.focused { "*" } else { " " };
            write!(f, "{marker}[{}]", pane.index)?;
            for tab in &pane.tabs {
                let name = tab.display();
                if pane.visible.as_ref() == Some(tab) {
                    write!(f, " <{name}>")?;
                } else {
                    write!(f, " {name}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[tokio::test]
    async fn test_focus_opens_in_first_pane_and_emits_event() {
        let mut ws = Workspace::new();
        ws.focus(&p("/a/Foo.html"));

        let active = ws.active_editor().await.unwrap();
        assert_eq!(active.path, p("/a/Foo.html"));
        assert_eq!(active.pane, PaneIndex::FIRST);
        assert_eq!(
            ws.drain_events(),
            vec![HostEvent::ActiveFileChanged(p("/a/Foo.html"))]
        );
    }

    #[tokio::test]
    async fn test_background_open_beside_keeps_focus() {
        let mut ws = Workspace::new();
        ws.focus(&p("/a/Foo.html"));
        ws.drain_events();

        ws.open_file(&p("/a/Foo.js"), PaneTarget::Beside, OpenOptions::BACKGROUND)
            .await
            .unwrap();

        assert_eq!(ws.pane_count(), 2);
        assert_eq!(ws.active_path(), Some(Path::new("/a/Foo.html")));
        assert!(ws.drain_events().is_empty());
        assert!(!ws.is_preview(Path::new("/a/Foo.js")));
    }

    #[tokio::test]
    async fn test_index_past_end_appends_single_pane() {
        let mut ws = Workspace::new();
        ws.focus(&p("/a.rs"));
        let far = PaneTarget::Index(PaneIndex::new(7).unwrap());
        ws.open_file(&p("/b.rs"), far, OpenOptions::BACKGROUND)
            .await
            .unwrap();
        assert_eq!(ws.pane_count(), 2);
    }

    #[tokio::test]
    async fn test_loaded_includes_background_tabs_but_visible_does_not() {
        let mut ws = Workspace::new();
        ws.focus(&p("/a.rs"));
        ws.focus(&p("/b.rs"));

        let loaded = ws.loaded_files().await;
        assert_eq!(loaded, vec![p("/a.rs"), p("/b.rs")]);
        let visible: Vec<_> = ws.visible_files().await.into_iter().map(|v| v.path).collect();
        assert_eq!(visible, vec![p("/b.rs")]);
    }

    #[tokio::test]
    async fn test_close_active_collapses_pane_and_reports_close() {
        let mut ws = Workspace::new();
        ws.focus(&p("/left.rs"));
        ws.open_in_pane(&p("/right.rs"), PaneIndex::new(2).unwrap());
        ws.drain_events();

        ws.close_active_editor().await.unwrap();

        assert_eq!(ws.pane_count(), 1);
        assert_eq!(
            ws.drain_events(),
            vec![
                HostEvent::FileClosed(p("/right.rs")),
                HostEvent::ActiveFileChanged(p("/left.rs")),
            ]
        );
    }

    #[tokio::test]
    async fn test_virtual_files_and_rejections() {
        let mut ws = Workspace::with_files(["/x/a.css"]);
        assert!(ws.file_exists(Path::new("/x/a.css")).await);
        assert!(!ws.file_exists(Path::new("/x/a.html")).await);

        ws.reject_open("/x/a.css");
        let err = ws
            .open_file(&p("/x/a.css"), PaneTarget::Active, OpenOptions::FOCUSED)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::OpenFailed { .. }));

        assert!(matches!(
            ws.close_active_editor().await,
            Err(HostError::NoActiveEditor)
        ));
    }

    #[test]
    fn test_display_marks_focus_and_visible_tab() {
        let mut ws = Workspace::new();
        ws.focus(&p("a.rs"));
        ws.focus(&p("b.rs"));
        assert_eq!(ws.to_string(), "*[1] a.rs <b.rs>\n");
    }
}

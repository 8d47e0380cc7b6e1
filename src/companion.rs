//! The event handler that ties rules, guards and placement to a host.
//!
//! One `Companion` is held by whatever subscribes to the host's events. It
//! reads the shared config snapshot fresh on every event and owns the only
//! mutable state of the engine: the memo of files whose rules already fired,
//! which forgets a file when the host reports it closed.
//!
//! Nothing here is fatal. A missing related file, a refused open or a refused
//! close is logged and recorded in the returned [`Report`]; the remaining
//! rules still run.

use crate::commands::{Command, CommandOutput};
use crate::host::{EditorHost, HostEvent};
use crate::pane::{OpenOptions, PaneIndex, PaneTarget};
use crate::placement::{self, Resolution};
use crate::rules::{Candidate, RuleSet};
use arc_swap::ArcSwap;
use serde::Serialize;
use sidepane_config::{Config, Placement};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a matching rule did not open anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The related file is not on disk (or could not be probed).
    MissingTarget,
    /// The rule resolved to the trigger file itself.
    SameAsSource,
    /// Same-pane rule, and the file is already loaded somewhere.
    AlreadyLoaded,
    /// Side-pane rule, and the file is already visible.
    AlreadyVisible,
    /// The rule wants more than one visible pane.
    SinglePane,
}

/// What happened to the trigger file while making room on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAction {
    Untouched,
    /// Closed and reopened in the given pane.
    Reopened(PaneIndex),
    /// Closed; the mirror rule reopens it when the related file is focused.
    LeftToMirror,
    /// The source was no longer the active editor, so it was left open.
    NotActive,
    /// The host refused to close it; placement continued anyway.
    CloseFailed,
    /// Closed, but the host refused to reopen it.
    ReopenFailed,
}

/// Result of one matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Opened {
        rule_index: usize,
        target: PathBuf,
        pane: PaneTarget,
        source: SourceAction,
    },
    Skipped {
        rule_index: usize,
        target: PathBuf,
        reason: SkipReason,
    },
    OpenFailed {
        rule_index: usize,
        target: PathBuf,
        error: String,
    },
}

impl RuleOutcome {
    pub fn target(&self) -> &Path {
        match self {
            RuleOutcome::Opened { target, .. }
            | RuleOutcome::Skipped { target, .. }
            | RuleOutcome::OpenFailed { target, .. } => target,
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self, RuleOutcome::Opened { .. })
    }
}

/// What handling one host event amounted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    /// `enabled: false` in the config.
    Disabled,
    /// No active editor to act on.
    Idle,
    /// Rules already fired for this file since it was last closed.
    AlreadyProcessed { source: PathBuf },
    /// Rules were evaluated for `source`.
    Handled {
        source: PathBuf,
        outcomes: Vec<RuleOutcome>,
    },
    /// A close notification; `forgotten` tells whether the memo held it.
    Closed { path: PathBuf, forgotten: bool },
}

impl Report {
    pub fn outcomes(&self) -> &[RuleOutcome] {
        match self {
            Report::Handled { outcomes, .. } => outcomes,
            _ => &[],
        }
    }
}

/// Rules compiled for one config snapshot.
struct CompiledSnapshot {
    config: Arc<Config>,
    rules: RuleSet,
}

/// Subscriber for host events.
pub struct Companion {
    config: Arc<ArcSwap<Config>>,
    processed: HashSet<PathBuf>,
    compiled: Option<CompiledSnapshot>,
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("processed", &self.processed.len())
            .finish_non_exhaustive()
    }
}

impl Companion {
    /// Read config from a shared handle another component may swap.
    pub fn new(config: Arc<ArcSwap<Config>>) -> Self {
        Self {
            config,
            processed: HashSet::new(),
            compiled: None,
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::new(Arc::new(ArcSwap::from_pointee(config)))
    }

    /// The shared handle, for hot reload.
    pub fn config_handle(&self) -> Arc<ArcSwap<Config>> {
        Arc::clone(&self.config)
    }

    /// Replace the config; takes effect on the next event.
    pub fn replace_config(&self, config: Config) {
        log::info!("Config replaced ({} rules)", config.rules.len());
        self.config.store(Arc::new(config));
    }

    pub fn is_processed(&self, path: &Path) -> bool {
        self.processed.contains(path)
    }

    /// Forget every processed file. Returns how many were dropped.
    pub fn clear_processed(&mut self) -> usize {
        let dropped = self.processed.len();
        self.processed.clear();
        log::info!("Cleared processed-file memo ({} entries)", dropped);
        dropped
    }

    pub fn run_command(&mut self, command: Command) -> CommandOutput {
        match command {
            Command::ShowLog => CommandOutput::Log(crate::debug::diagnostic_log()),
            Command::ClearProcessed => CommandOutput::Cleared(self.clear_processed()),
        }
    }

    pub async fn handle_event<H: EditorHost>(&mut self, event: HostEvent, host: &mut H) -> Report {
        match event {
            HostEvent::ActiveFileChanged(path) => {
                log::debug!("Active file changed: {}", path.display());
                self.on_active_file_changed(host).await
            }
            HostEvent::FileClosed(path) => self.on_file_closed(&path),
        }
    }

    /// A file was closed: its rules may fire again next time it is focused.
    pub fn on_file_closed(&mut self, path: &Path) -> Report {
        let forgotten = self.processed.remove(path);
        if forgotten {
            log::debug!("Forgot processed file {}", path.display());
        }
        Report::Closed {
            path: path.to_path_buf(),
            forgotten,
        }
    }

    /// Evaluate every rule against the host's active editor.
    pub async fn on_active_file_changed<H: EditorHost>(&mut self, host: &mut H) -> Report {
        let config = self.config.load_full();
        if !config.enabled {
            log::trace!("Disabled; ignoring active file change");
            return Report::Disabled;
        }
        let Some(active) = host.active_editor().await else {
            return Report::Idle;
        };
        if config.remember_processed && !self.processed.insert(active.path.clone()) {
            log::trace!("Already processed {}", active.path.display());
            return Report::AlreadyProcessed {
                source: active.path,
            };
        }

        let rules = self.rules_for(&config);
        let candidates = rules.evaluate_path(&active.path);
        if candidates.is_empty() {
            log::trace!("No rule matches {}", active.path.display());
        }

        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let current = match host.active_editor().await {
                Some(now) if now.path == active.path => now.pane,
                _ => active.pane,
            };
            let outcome = apply(host, &active.path, current, candidate, config.max_panes).await;
            outcomes.push(outcome);
        }

        Report::Handled {
            source: active.path,
            outcomes,
        }
    }

    fn rules_for(&mut self, config: &Arc<Config>) -> &RuleSet {
        if self
            .compiled
            .as_ref()
            .is_some_and(|c| !Arc::ptr_eq(&c.config, config))
        {
            self.compiled = None;
        }
        let snapshot = self.compiled.get_or_insert_with(|| {
            let rules = RuleSet::compile(&config.rules);
            log::debug!("Compiled {} of {} rules", rules.len(), config.rules.len());
            CompiledSnapshot {
                config: Arc::clone(config),
                rules,
            }
        });
        &snapshot.rules
    }
}

/// Guard, resolve and execute one matching rule.
async fn apply<H: EditorHost>(
    host: &mut H,
    source: &Path,
    current: PaneIndex,
    candidate: &Candidate<'_>,
    max_panes: u32,
) -> RuleOutcome {
    let rule_index = candidate.rule_index;
    let target = candidate.target.clone();
    let label = candidate.rule.label();

    if let Some(reason) = guard(host, source, candidate).await {
        log::info!(
            "Rule #{} ({}): not opening {} ({:?})",
            rule_index + 1,
            label,
            target.display(),
            reason
        );
        return RuleOutcome::Skipped {
            rule_index,
            target,
            reason,
        };
    }

    let resolution = placement::resolve(
        candidate.placement(),
        current,
        max_panes,
        candidate.rule.has_mirror_rule,
    );
    let source_action = make_room(host, source, &resolution).await;

    // With the source gone there is no focus to preserve; the related file
    // takes focus so its mirror rule can fire.
    let options = if source_action == SourceAction::LeftToMirror {
        OpenOptions::FOCUSED
    } else {
        OpenOptions::BACKGROUND
    };

    match host.open_file(&target, resolution.target, options).await {
        Ok(()) => {
            log::info!(
                "Rule #{} ({}): opened {} in {}",
                rule_index + 1,
                label,
                target.display(),
                resolution.target
            );
            RuleOutcome::Opened {
                rule_index,
                target,
                pane: resolution.target,
                source: source_action,
            }
        }
        Err(e) => {
            log::error!("Rule #{} ({}): {}", rule_index + 1, label, e);
            RuleOutcome::OpenFailed {
                rule_index,
                target,
                error: e.to_string(),
            }
        }
    }
}

/// The per-candidate guards, in order. `None` means go ahead.
async fn guard<H: EditorHost>(
    host: &H,
    source: &Path,
    candidate: &Candidate<'_>,
) -> Option<SkipReason> {
    let target = candidate.target.as_path();

    if !host.file_exists(target).await {
        return Some(SkipReason::MissingTarget);
    }
    if target == source {
        return Some(SkipReason::SameAsSource);
    }

    let visible = host.visible_files().await;
    match candidate.placement() {
        Placement::SamePane => {
            if host.loaded_files().await.iter().any(|p| p == target) {
                return Some(SkipReason::AlreadyLoaded);
            }
        }
        _ => {
            if visible.iter().any(|v| v.path == target) {
                return Some(SkipReason::AlreadyVisible);
            }
        }
    }

    if candidate.rule.only_if_multiple_panes {
        let panes: BTreeSet<PaneIndex> = visible.iter().map(|v| v.pane).collect();
        if panes.len() <= 1 {
            return Some(SkipReason::SinglePane);
        }
    }
    None
}

/// Close (and maybe reopen) the source when the placement has no room.
async fn make_room<H: EditorHost>(
    host: &mut H,
    source: &Path,
    resolution: &Resolution,
) -> SourceAction {
    if !resolution.close_source() {
        return SourceAction::Untouched;
    }
    // An earlier rule may have made another file active; closing the active
    // editor would then close that file instead of the source.
    match host.active_editor().await {
        Some(active) if active.path == source => {}
        other => {
            log::warn!(
                "Not closing {} to make room: the active editor is {}",
                source.display(),
                other.map_or_else(|| "none".to_string(), |a| a.path.display().to_string())
            );
            return SourceAction::NotActive;
        }
    }
    if let Err(e) = host.close_active_editor().await {
        log::warn!(
            "Could not close {} to make room: {}; continuing",
            source.display(),
            e
        );
        return SourceAction::CloseFailed;
    }
    let Some(pane) = resolution.reopen_source() else {
        log::debug!(
            "Closed {}; leaving the reopen to its mirror rule",
            source.display()
        );
        return SourceAction::LeftToMirror;
    };
    match host
        .open_file(source, PaneTarget::Index(pane), OpenOptions::FOCUSED)
        .await
    {
        Ok(()) => SourceAction::Reopened(pane),
        Err(e) => {
            log::error!("Could not reopen {}: {}", source.display(), e);
            SourceAction::ReopenFailed
        }
    }
}

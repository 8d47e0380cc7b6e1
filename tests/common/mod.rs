//! Shared integration test helpers for sidepane.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{rule, companion_with, TestContext};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use sidepane::config::{Config, OpenRule, Placement};
use sidepane::{Companion, Report, Workspace};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An enabled rule with default flags.
pub fn rule(trigger: &str, open: &str, placement: Placement) -> OpenRule {
    OpenRule::new(trigger, open, placement)
}

/// A rule declaring a mirror rule with the opposite placement.
pub fn mirrored(trigger: &str, open: &str, placement: Placement) -> OpenRule {
    OpenRule {
        has_mirror_rule: true,
        ..OpenRule::new(trigger, open, placement)
    }
}

/// A companion over a default config holding `rules`.
pub fn companion_with(rules: Vec<OpenRule>) -> Companion {
    Companion::from_config(Config {
        rules,
        ..Config::default()
    })
}

/// Focus `path` as the user would and let the companion settle.
pub async fn focus(ws: &mut Workspace, companion: &mut Companion, path: &str) -> Vec<Report> {
    ws.focus(Path::new(path));
    ws.pump(companion, sidepane::workspace::EVENT_LIMIT).await
}

/// Visible file per pane, as strings, for compact assertions.
pub fn layout(ws: &Workspace) -> Vec<String> {
    ws.visible_paths()
        .into_iter()
        .map(|p| p.map(|p| p.display().to_string()).unwrap_or_default())
        .collect()
}

/// Provides a real directory of files for disk-backed workspaces.
///
/// The directory is removed when the context is dropped.
pub struct TestContext {
    /// Temporary directory, kept alive for the lifetime of the context.
    pub dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Create an empty file named `name` and return its path.
    pub fn touch(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, "").expect("Failed to write fixture file");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

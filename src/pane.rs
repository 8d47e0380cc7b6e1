//! Pane addressing shared by the rule engine and hosts.
//!
//! - `PaneIndex`: 1-based column index, the only pane identity the engine knows
//! - `PaneTarget`: where a file should be opened
//! - `OpenOptions`: focus/preview semantics requested from the host

use serde::Serialize;
use std::fmt;

/// 1-based index of an editor pane (view column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PaneIndex(u32);

impl PaneIndex {
    /// The leftmost pane.
    pub const FIRST: PaneIndex = PaneIndex(1);

    /// Returns `None` for `0`; pane indices are positive.
    pub fn new(index: u32) -> Option<Self> {
        (index > 0).then_some(Self(index))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The pane to the right.
    pub fn right(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The pane to the left, or `None` when already leftmost.
    pub fn left(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }

    /// Clamp to `max_panes`; `0` means no ceiling.
    pub fn clamp_to(self, max_panes: u32) -> Self {
        if max_panes > 0 && self.0 > max_panes {
            Self(max_panes)
        } else {
            self
        }
    }

    /// Zero-based position, for indexing into a pane list.
    pub fn as_offset(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for PaneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Destination for an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaneTarget {
    /// Whichever pane shows the active editor.
    Active,
    /// The pane beside the active one; the host creates or reuses it.
    Beside,
    /// An explicit column.
    Index(PaneIndex),
}

impl fmt::Display for PaneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneTarget::Active => f.write_str("active pane"),
            PaneTarget::Beside => f.write_str("beside"),
            PaneTarget::Index(i) => write!(f, "pane {i}"),
        }
    }
}

/// How a file should be shown once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Keep input focus on the editor that had it.
    pub preserve_focus: bool,
    /// Open as a transient preview tab.
    pub preview: bool,
}

impl OpenOptions {
    /// A permanent tab that does not steal focus; used for related files.
    pub const BACKGROUND: OpenOptions = OpenOptions {
        preserve_focus: true,
        preview: false,
    };

    /// A permanent tab that takes focus.
    pub const FOCUSED: OpenOptions = OpenOptions {
        preserve_focus: false,
        preview: false,
    };
}

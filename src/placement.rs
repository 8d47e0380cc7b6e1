//! Placement resolution: which pane does a related file go to?
//!
//! Pure arithmetic over the rule's [`Placement`], the pane hosting the
//! trigger file and the configured pane ceiling. Opening to the left of the
//! leftmost pane has no room, so the resolution then asks for the source
//! editor to be closed and (unless a mirror rule will handle it) reopened
//! one pane to the right.

use crate::pane::{PaneIndex, PaneTarget};
use sidepane_config::Placement;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Where the related file opens.
    pub target: PaneTarget,
    /// Close the source editor before opening anything.
    pub close_and_reopen_source: bool,
    /// Where the source is reopened after closing; `None` when a mirror rule
    /// is expected to bring it back.
    pub source_reopen_pane: Option<PaneIndex>,
}

impl Resolution {
    fn at(target: PaneTarget) -> Self {
        Self {
            target,
            close_and_reopen_source: false,
            source_reopen_pane: None,
        }
    }

    pub fn close_source(&self) -> bool {
        self.close_and_reopen_source
    }

    pub fn reopen_source(&self) -> Option<PaneIndex> {
        self.source_reopen_pane
    }
}

/// Map a placement preference onto a pane target.
///
/// `max_panes` caps explicit indices (`0` = unlimited). `has_mirror_rule`
/// suppresses reopening the source when it had to be closed.
pub fn resolve(
    placement: Placement,
    current: PaneIndex,
    max_panes: u32,
    has_mirror_rule: bool,
) -> Resolution {
    let resolution = match placement {
        Placement::SamePane => Resolution::at(PaneTarget::Active),
        Placement::SidePane => Resolution::at(PaneTarget::Beside),
        Placement::SidePaneRight => Resolution::at(PaneTarget::Index(current.right())),
        Placement::SidePaneLeft => match current.left() {
            Some(left) => Resolution::at(PaneTarget::Index(left)),
            None => Resolution {
                target: PaneTarget::Index(PaneIndex::FIRST),
                close_and_reopen_source: true,
                source_reopen_pane: (!has_mirror_rule).then(|| PaneIndex::FIRST.right()),
            },
        },
    };
    clamp(resolution, max_panes)
}

fn clamp(mut resolution: Resolution, max_panes: u32) -> Resolution {
    if let PaneTarget::Index(index) = resolution.target {
        resolution.target = PaneTarget::Index(index.clamp_to(max_panes));
    }
    resolution.source_reopen_pane = resolution
        .source_reopen_pane
        .map(|pane| pane.clamp_to(max_panes));
    resolution
}

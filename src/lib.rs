// Library exports for hosts, the CLI and integration tests.
//
// Layering: `rules` and `placement` are pure; `companion` applies them to an
// `EditorHost`; `workspace` is the in-memory host the CLI and tests drive.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod commands;
pub mod companion;
pub mod debug;
pub mod host;
pub mod pane;
pub mod placement;
pub mod replay;
pub mod rules;
pub mod workspace;

pub use sidepane_config as config;

pub use commands::{Command, CommandOutput};
pub use companion::{Companion, Report, RuleOutcome, SkipReason, SourceAction};
pub use host::{ActiveEditor, EditorHost, HostError, HostEvent, VisibleFile};
pub use pane::{OpenOptions, PaneIndex, PaneTarget};
pub use placement::{Resolution, resolve};
pub use rules::{Candidate, RuleSet, substitute_captures};
pub use workspace::Workspace;

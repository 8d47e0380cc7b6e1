//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` and `OpenRule` fields.

pub fn bool_false() -> bool {
    false
}

pub fn bool_true() -> bool {
    true
}

/// `0` means the automation may spawn as many panes as it likes.
pub fn max_panes() -> u32 {
    0
}

pub fn log_level() -> crate::types::LogLevel {
    crate::types::LogLevel::Info
}

pub fn placement() -> crate::rule::Placement {
    crate::rule::Placement::SidePane
}

pub fn rules() -> Vec<crate::rule::OpenRule> {
    Vec::new()
}

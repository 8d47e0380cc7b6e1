//! Configuration types for related-file rules.

use serde::{Deserialize, Serialize};

/// Where a rule wants the related file to appear, relative to the pane
/// hosting the file that triggered it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// The pane currently showing the active editor.
    SamePane,
    /// The pane beside the current one, created on demand by the host.
    #[default]
    SidePane,
    /// The pane immediately to the left of the current one.
    SidePaneLeft,
    /// The pane immediately to the right of the current one.
    SidePaneRight,
}

impl Placement {
    /// All available placements for UI dropdowns
    pub fn all() -> &'static [Placement] {
        &[
            Self::SamePane,
            Self::SidePane,
            Self::SidePaneLeft,
            Self::SidePaneRight,
        ]
    }

    /// Human-readable display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::SamePane => "Same Pane",
            Self::SidePane => "Side Pane",
            Self::SidePaneLeft => "Side Pane (Left)",
            Self::SidePaneRight => "Side Pane (Right)",
        }
    }

    /// Whether the related file goes into a pane other than the current one.
    pub fn is_side(self) -> bool {
        !matches!(self, Self::SamePane)
    }
}

/// A rule that opens a related file when the active file's base name matches.
///
/// Rules are evaluated in list order and every matching rule fires, so two
/// rules may open two related files for the same trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenRule {
    /// Optional label, only used in log output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,
    /// Regular expression tested against the file's base name.
    pub trigger_pattern: String,
    /// Template for the related file name; `$1..$N` are replaced by the
    /// trigger pattern's capture groups.
    pub open_pattern: String,
    #[serde(default = "crate::defaults::placement")]
    pub placement: Placement,
    /// Skip the rule unless more than one pane is visible.
    #[serde(
        default = "crate::defaults::bool_false",
        alias = "requires_multiple_panes"
    )]
    pub only_if_multiple_panes: bool,
    /// A paired rule with the opposite placement exists, so this rule must not
    /// reopen the source after closing it to make room.
    #[serde(default = "crate::defaults::bool_false", alias = "has_opposite_rule")]
    pub has_mirror_rule: bool,
}

impl OpenRule {
    /// Create an enabled rule with default flags.
    pub fn new(trigger_pattern: &str, open_pattern: &str, placement: Placement) -> Self {
        Self {
            name: None,
            enabled: true,
            trigger_pattern: trigger_pattern.to_string(),
            open_pattern: open_pattern.to_string(),
            placement,
            only_if_multiple_panes: false,
            has_mirror_rule: false,
        }
    }

    /// Label used in log lines: the configured name, or the trigger pattern.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.trigger_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_minimal_yaml() {
        let yaml = r#"
trigger_pattern: "(.+)\\.js$"
open_pattern: "$1.css"
"#;
        let rule: OpenRule = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.placement, Placement::SidePane);
        assert!(!rule.only_if_multiple_panes);
        assert!(!rule.has_mirror_rule);
        assert_eq!(rule.label(), "(.+)\\.js$");
    }

    #[test]
    fn test_rule_accepts_legacy_flag_names() {
        let yaml = r#"
trigger_pattern: "(.+)\\.html$"
open_pattern: "$1.js"
placement: side_pane_right
requires_multiple_panes: true
has_opposite_rule: true
"#;
        let rule: OpenRule = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(rule.placement, Placement::SidePaneRight);
        assert!(rule.only_if_multiple_panes);
        assert!(rule.has_mirror_rule);
    }

    #[test]
    fn test_placement_is_side() {
        assert!(!Placement::SamePane.is_side());
        for p in &Placement::all()[1..] {
            assert!(p.is_side(), "{} should be a side placement", p.display_name());
        }
    }
}

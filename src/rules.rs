//! Rule evaluation: which related files does a base name ask for?
//!
//! A [`RuleSet`] is compiled once per config snapshot. Evaluating it against
//! a file name walks the rules in order and yields one [`Candidate`] per
//! matching rule; every matching rule fires, so a `.js` file may ask for
//! both its `.css` and its `.html`.
//!
//! Evaluation is pure. Existence, de-duplication and pane-count guards need
//! the host and are applied by the [`Companion`](crate::companion::Companion).

use regex::{Captures, Regex};
use sidepane_config::{OpenRule, Placement};
use std::path::{Path, PathBuf};

/// A rule with its trigger pattern compiled.
#[derive(Debug)]
struct CompiledRule {
    /// Position in the configured list, for log messages.
    index: usize,
    rule: OpenRule,
    regex: Regex,
}

/// Compiled, ordered rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

/// A related file requested by one matching rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    /// `directory` joined with the substituted open pattern.
    pub target: PathBuf,
    pub rule: &'a OpenRule,
    /// Zero-based position of the rule in the configured list.
    pub rule_index: usize,
}

impl Candidate<'_> {
    pub fn placement(&self) -> Placement {
        self.rule.placement
    }
}

impl RuleSet {
    /// Compile `rules`, dropping disabled ones and ones whose trigger
    /// pattern is not a valid regex (with a warning).
    pub fn compile(rules: &[OpenRule]) -> Self {
        let rules = rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.enabled)
            .filter_map(|(index, r)| match Regex::new(&r.trigger_pattern) {
                Ok(regex) => Some(CompiledRule {
                    index,
                    rule: r.clone(),
                    regex,
                }),
                Err(e) => {
                    log::warn!(
                        "Skipping rule #{} ({}): invalid trigger pattern: {}",
                        index + 1,
                        r.label(),
                        e
                    );
                    None
                }
            })
            .collect();

        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule whose trigger matches `file_name`, in list order, with the
    /// related file resolved against `directory`.
    pub fn evaluate(&self, file_name: &str, directory: &Path) -> Vec<Candidate<'_>> {
        self.rules
            .iter()
            .filter_map(|compiled| {
                let caps = compiled.regex.captures(file_name)?;
                let target_name = substitute_captures(&compiled.rule.open_pattern, &caps);
                log::trace!(
                    "Rule #{} ({}) matched {:?} -> {:?}",
                    compiled.index + 1,
                    compiled.rule.label(),
                    file_name,
                    target_name
                );
                Some(Candidate {
                    target: directory.join(target_name),
                    rule: &compiled.rule,
                    rule_index: compiled.index,
                })
            })
            .collect()
    }

    /// Evaluate against a full path: the base name is matched, and the
    /// related file lives in the same directory.
    pub fn evaluate_path(&self, path: &Path) -> Vec<Candidate<'_>> {
        let Some(file_name) = path.file_name() else {
            return Vec::new();
        };
        let Some(file_name) = file_name.to_str() else {
            log::trace!("Skipping non-UTF-8 file name {}", path.display());
            return Vec::new();
        };
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        self.evaluate(file_name, directory)
    }
}

/// Replace each literal `$i` in `template` with capture group `i`.
///
/// Groups that did not participate in the match become the empty string.
/// Higher group numbers are replaced first so `$1` never eats the front of
/// `$12`. Only existing groups are substituted: with a single group, `$3`
/// stays as written and `$12` reads as `$1` followed by a literal `2`.
pub fn substitute_captures(template: &str, caps: &Captures<'_>) -> String {
    let mut out = template.to_string();
    for i in (1..caps.len()).rev() {
        let placeholder = format!("${i}");
        if out.contains(&placeholder) {
            let value = caps.get(i).map_or("", |m| m.as_str());
            out = out.replace(&placeholder, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(trigger: &str, open: &str) -> OpenRule {
        OpenRule::new(trigger, open, Placement::SidePane)
    }

    #[test]
    fn test_non_matching_rule_produces_nothing() {
        let set = RuleSet::compile(&[rule(r"(.+)\.html$", "$1.js")]);
        assert!(set.evaluate("Foo.css", Path::new("/a")).is_empty());
    }

    #[test]
    fn test_target_is_directory_plus_substitution() {
        let set = RuleSet::compile(&[rule(r"(.+)\.html$", "$1.js")]);
        let found = set.evaluate("Foo.html", Path::new("/a"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, PathBuf::from("/a/Foo.js"));
        assert_eq!(found[0].rule_index, 0);
    }

    #[test]
    fn test_unmatched_optional_group_becomes_empty() {
        let set = RuleSet::compile(&[rule(r"^(\w+?)(\.spec)?\.ts$", "$1$2.html")]);
        let found = set.evaluate("widget.ts", Path::new("/src"));
        assert_eq!(found[0].target, PathBuf::from("/src/widget.html"));

        let found = set.evaluate("widget.spec.ts", Path::new("/src"));
        assert_eq!(found[0].target, PathBuf::from("/src/widget.spec.html"));
    }

    #[test]
    fn test_all_matching_rules_fire_in_order() {
        let set = RuleSet::compile(&[
            rule(r"(.+)\.js$", "$1.css"),
            rule(r"\.rs$", "lib.rs"),
            rule(r"(.+)\.js$", "$1.html"),
        ]);
        let targets: Vec<_> = set
            .evaluate("App.js", Path::new("/w"))
            .into_iter()
            .map(|c| (c.rule_index, c.target))
            .collect();
        assert_eq!(
            targets,
            vec![
                (0, PathBuf::from("/w/App.css")),
                (2, PathBuf::from("/w/App.html")),
            ]
        );
    }

    #[test]
    fn test_invalid_and_disabled_rules_are_skipped() {
        let mut disabled = rule(r"(.+)\.js$", "$1.less");
        disabled.enabled = false;
        let set = RuleSet::compile(&[
            rule(r"(.+\.js$", "$1.css"),
            disabled,
            rule(r"(.+)\.js$", "$1.html"),
        ]);
        assert_eq!(set.len(), 1);
        let found = set.evaluate("a.js", Path::new("/"));
        assert_eq!(found[0].rule_index, 2);
    }

    #[test]
    fn test_double_digit_groups_are_not_clobbered() {
        let pattern = r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)";
        let caps_regex = Regex::new(pattern).unwrap();
        let caps = caps_regex.captures("abcdefghijkl").unwrap();
        assert_eq!(substitute_captures("$12-$1", &caps), "l-a");
    }

    #[test]
    fn test_placeholders_past_group_count() {
        let caps_regex = Regex::new(r"(.+)\.html$").unwrap();
        let caps = caps_regex.captures("Foo.html").unwrap();
        assert_eq!(substitute_captures("$1.$3", &caps), "Foo.$3");
        assert_eq!(substitute_captures("$12.js", &caps), "Foo2.js");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_base_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let set = RuleSet::compile(&[rule(r"(.+)\.html$", "$1.js")]);
        let name = OsStr::from_bytes(b"F\xffo.html");
        let path = Path::new("/a").join(name);
        assert!(set.evaluate_path(&path).is_empty());
    }

    #[test]
    fn test_trigger_sees_base_name_only() {
        let set = RuleSet::compile(&[rule(r"^src$", "x")]);
        assert!(set.evaluate_path(Path::new("/src/main.rs")).is_empty());

        let set = RuleSet::compile(&[rule(r"^main\.rs$", "lib.rs")]);
        let found = set.evaluate_path(Path::new("/src/main.rs"));
        assert_eq!(found[0].target, PathBuf::from("/src/lib.rs"));
    }
}

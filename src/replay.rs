//! Scripted user actions for driving a [`Workspace`].
//!
//! One action per line, shell-quoted:
//!
//! ```text
//! # comments and blank lines are ignored
//! focus src/App.js
//! open "docs/read me.md" 2
//! close src/App.js
//! clear
//! ```

use crate::commands::{Command, CommandOutput};
use crate::companion::{Companion, Report};
use crate::pane::PaneIndex;
use crate::workspace::{EVENT_LIMIT, Workspace};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// A single user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Focus a file, opening it in the active pane if needed.
    Focus(PathBuf),
    /// Open a file focused in a given pane.
    Open(PathBuf, PaneIndex),
    /// Close every tab showing a file.
    Close(PathBuf),
    /// Run a user command.
    Run(Command),
}

impl Action {
    /// Parse one script line. Returns `Ok(None)` for blanks and comments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let words = shell_words::split(line).with_context(|| format!("Bad quoting: {line}"))?;
        let action = match words.as_slice() {
            [verb, path] if verb == "focus" => Action::Focus(PathBuf::from(path)),
            [verb, path] if verb == "close" => Action::Close(PathBuf::from(path)),
            [verb, path, pane] if verb == "open" => {
                let index: u32 = pane
                    .parse()
                    .with_context(|| format!("Bad pane number '{pane}'"))?;
                let pane =
                    PaneIndex::new(index).with_context(|| "Pane numbers start at 1".to_string())?;
                Action::Open(PathBuf::from(path), pane)
            }
            [verb] if verb == "clear" => Action::Run(Command::ClearProcessed),
            [verb] if verb == "log" => Action::Run(Command::ShowLog),
            [verb, command] if verb == "run" => {
                Action::Run(command.parse().map_err(anyhow::Error::msg)?)
            }
            _ => bail!("Unrecognised action: {line}"),
        };
        Ok(Some(action))
    }
}

/// Parse a whole script, reporting the first bad line by number.
pub fn parse_script(script: &str) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    for (n, line) in script.lines().enumerate() {
        if let Some(action) = Action::parse(line).with_context(|| format!("line {}", n + 1))? {
            actions.push(action);
        }
    }
    Ok(actions)
}

/// What one replayed action produced.
#[derive(Debug, Default)]
pub struct Performed {
    /// Output of a `Run` action.
    pub output: Option<CommandOutput>,
    /// One report per notification the companion handled.
    pub reports: Vec<Report>,
}

/// Perform `action` and let the companion react until things settle.
pub async fn perform(
    action: &Action,
    workspace: &mut Workspace,
    companion: &mut Companion,
) -> Performed {
    log::debug!("Replaying {:?}", action);
    let output = match action {
        Action::Focus(path) => {
            workspace.focus(path);
            None
        }
        Action::Open(path, pane) => {
            workspace.open_in_pane(path, *pane);
            None
        }
        Action::Close(path) => {
            workspace.close(path);
            None
        }
        Action::Run(command) => Some(companion.run_command(*command)),
    };
    Performed {
        output,
        reports: workspace.pump(companion, EVENT_LIMIT).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        let script = r#"
# setup
focus /a/Foo.html
open "/a/my file.js" 2
close /a/Foo.html
clear
run show_log
"#;
        let actions = parse_script(script).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Focus(PathBuf::from("/a/Foo.html")),
                Action::Open(PathBuf::from("/a/my file.js"), PaneIndex::new(2).unwrap()),
                Action::Close(PathBuf::from("/a/Foo.html")),
                Action::Run(Command::ClearProcessed),
                Action::Run(Command::ShowLog),
            ]
        );
    }

    #[test]
    fn test_bad_lines_report_line_number() {
        let err = parse_script("focus a\nopen b 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        assert!(Action::parse("jump a").is_err());
        assert!(Action::parse("focus \"unterminated").is_err());
    }
}

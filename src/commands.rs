//! User-invocable commands.

use std::fmt;
use std::str::FromStr;

/// Commands a host exposes to the user (command palette, key bindings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show the diagnostic log.
    ShowLog,
    /// Forget which files already fired their rules.
    ClearProcessed,
}

impl Command {
    pub fn all() -> &'static [Command] {
        &[Command::ShowLog, Command::ClearProcessed]
    }

    /// Stable identifier used in bindings and scripts.
    pub fn id(self) -> &'static str {
        match self {
            Command::ShowLog => "sidepane.show_log",
            Command::ClearProcessed => "sidepane.clear_processed",
        }
    }

    /// Human-readable title
    pub fn title(self) -> &'static str {
        match self {
            Command::ShowLog => "Sidepane: Show Log",
            Command::ClearProcessed => "Sidepane: Clear Processed Files",
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Command::all()
            .iter()
            .copied()
            .find(|c| c.id() == s || c.id().trim_start_matches("sidepane.") == s)
            .ok_or_else(|| format!("unknown command '{s}'"))
    }
}

/// Result of [`Companion::run_command`](crate::companion::Companion::run_command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Diagnostic log text.
    Log(String),
    /// Number of memo entries dropped.
    Cleared(usize),
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Log(text) if text.is_empty() => f.write_str("(log is empty)"),
            CommandOutput::Log(text) => f.write_str(text),
            CommandOutput::Cleared(n) => write!(f, "Cleared {n} processed file(s)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_id_or_short_name() {
        assert_eq!("sidepane.show_log".parse(), Ok(Command::ShowLog));
        assert_eq!("clear_processed".parse(), Ok(Command::ClearProcessed));
        assert!("reload".parse::<Command>().is_err());
    }

    #[test]
    fn test_output_display() {
        assert_eq!(
            CommandOutput::Cleared(3).to_string(),
            "Cleared 3 processed file(s)"
        );
        assert_eq!(CommandOutput::Log(String::new()).to_string(), "(log is empty)");
    }
}

//! Command-line interface for sidepane.
//!
//! The binary has no editor of its own: `check` and `replay` run the rules
//! against the in-memory [`Workspace`], which is how rule sets are tried out
//! before a host adapter uses them.

use crate::companion::{Companion, Report, RuleOutcome, SourceAction};
use crate::debug;
use crate::pane::PaneIndex;
use crate::replay::{self, Action};
use crate::workspace::{EVENT_LIMIT, Workspace};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sidepane_config::{Config, ConfigWatcher, LogLevel};
use std::io::Read;
use std::path::{Path, PathBuf};

/// sidepane - open a file's related files in a neighbouring pane
#[derive(Parser, Debug)]
#[command(name = "sidepane")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.config/sidepane/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level override (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Focus FILE in a scratch workspace and show what the rules open
    Check {
        /// The file that becomes active
        file: PathBuf,

        /// Pane the file is focused in
        #[arg(long, default_value_t = 1, value_name = "N")]
        pane: u32,

        /// A file already visible before FILE is focused (repeatable)
        #[arg(long = "visible", value_name = "PATH[@PANE]")]
        visible: Vec<String>,

        /// Print the reports and final layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a script of user actions (from a file, or stdin)
    Replay {
        /// Script file; reads stdin when omitted
        script: Option<PathBuf>,

        /// Do not reload the config when it changes on disk
        #[arg(long)]
        no_watch: bool,
    },
    /// Check the rules in the config file
    Validate,
    /// Print the diagnostic log of the previous run
    Log,
    /// Print the config file path
    ConfigPath,
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::config_path)
    }

    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        debug::set_level(config.log_level);
        Ok(config)
    }
}

/// Print the log file left by the previous run.
///
/// Must run before [`debug::init_log_bridge`], which truncates the file.
pub fn print_log_file() -> Result<()> {
    let path = debug::log_file_path();
    match std::fs::read_to_string(&path) {
        Ok(text) if !text.is_empty() => print!("{text}"),
        Ok(_) => println!("(log is empty)"),
        Err(e) => println!("No diagnostic log at {} ({e})", path.display()),
    }
    Ok(())
}

/// Run a parsed command line. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Check {
            file,
            pane,
            visible,
            json,
        } => {
            let config = cli.load_config()?;
            check(config, file, *pane, visible, *json).await
        }
        Commands::Replay { script, no_watch } => {
            let config = cli.load_config()?;
            let watch = (!*no_watch).then(|| cli.config_path());
            replay_script(config, script.as_deref(), watch.as_deref()).await
        }
        Commands::Validate => {
            let config = cli.load_config()?;
            let findings = config.validate();
            if findings.is_empty() {
                println!("{} rule(s), no problems found", config.rules.len());
                return Ok(0);
            }
            for finding in &findings {
                println!("{finding}");
            }
            Ok(1)
        }
        Commands::Log => {
            print_log_file()?;
            Ok(0)
        }
        Commands::ConfigPath => {
            println!("{}", cli.config_path().display());
            Ok(0)
        }
    }
}

/// Parse `PATH[@PANE]`.
fn parse_visible(arg: &str) -> Result<(PathBuf, PaneIndex)> {
    if let Some((path, pane)) = arg.rsplit_once('@')
        && let Ok(n) = pane.parse::<u32>()
    {
        let pane = PaneIndex::new(n).context("Pane numbers start at 1")?;
        return Ok((absolute(Path::new(path))?, pane));
    }
    Ok((absolute(Path::new(arg))?, PaneIndex::FIRST))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Cannot resolve {}", path.display()))
}

async fn check(
    config: Config,
    file: &Path,
    pane: u32,
    visible: &[String],
    json: bool,
) -> Result<i32> {
    let pane = PaneIndex::new(pane).context("Pane numbers start at 1")?;
    let file = absolute(file)?;

    let mut workspace = Workspace::new();
    for arg in visible {
        let (path, pane) = parse_visible(arg)?;
        workspace.open_in_pane(&path, pane);
    }
    // Only the checked file's activation should reach the rules.
    workspace.drain_events();

    let mut companion = Companion::from_config(config);
    workspace.open_in_pane(&file, pane);
    let reports = workspace.pump(&mut companion, EVENT_LIMIT).await;

    if json {
        let out = serde_json::json!({
            "reports": reports,
            "layout": workspace.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for report in &reports {
            print_report(report);
        }
        print!("{workspace}");
    }
    Ok(0)
}

async fn replay_script(config: Config, script: Option<&Path>, watch: Option<&Path>) -> Result<i32> {
    let text = match script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read script from stdin")?;
            buf
        }
    };
    let actions = replay::parse_script(&text)?;

    let watcher = watch.filter(|p| p.exists()).and_then(|path| {
        ConfigWatcher::new(path, 100)
            .map_err(|e| log::warn!("Config hot reload unavailable: {e:#}"))
            .ok()
    });

    let mut companion = Companion::from_config(config);
    let mut workspace = Workspace::new();
    for action in &actions {
        if let Some(event) = watcher.as_ref().and_then(ConfigWatcher::try_recv) {
            match Config::load_from(&event.path) {
                Ok(config) => {
                    debug::set_level(config.log_level);
                    companion.replace_config(config);
                }
                Err(e) => log::warn!("Keeping previous config: {e:#}"),
            }
        }

        println!("> {}", describe_action(action));
        let performed = replay::perform(action, &mut workspace, &mut companion).await;
        if let Some(output) = performed.output {
            println!("{output}");
        }
        for report in &performed.reports {
            print_report(report);
        }
    }
    print!("{workspace}");
    Ok(0)
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::Focus(path) => format!("focus {}", path.display()),
        Action::Open(path, pane) => format!("open {} in pane {pane}", path.display()),
        Action::Close(path) => format!("close {}", path.display()),
        Action::Run(command) => command.title().to_string(),
    }
}

fn print_report(report: &Report) {
    match report {
        Report::Disabled => println!("  (disabled)"),
        Report::Idle => {}
        Report::AlreadyProcessed { source } => {
            println!("  {}: already processed", source.display())
        }
        Report::Closed { .. } => {}
        Report::Handled { source, outcomes } => {
            if outcomes.is_empty() {
                println!("  {}: no matching rules", source.display());
            }
            for outcome in outcomes {
                println!("  {}: {}", source.display(), describe_outcome(outcome));
            }
        }
    }
}

fn describe_outcome(outcome: &RuleOutcome) -> String {
    match outcome {
        RuleOutcome::Opened {
            rule_index,
            target,
            pane,
            source,
        } => {
            let mut line = format!("rule #{} opened {} ({pane})", rule_index + 1, target.display());
            match source {
                SourceAction::Untouched => {}
                SourceAction::Reopened(p) => line.push_str(&format!(", source moved to pane {p}")),
                SourceAction::LeftToMirror => line.push_str(", source left to mirror rule"),
                SourceAction::NotActive => line.push_str(", source no longer active, left open"),
                SourceAction::CloseFailed => line.push_str(", source could not be closed"),
                SourceAction::ReopenFailed => line.push_str(", source could not be reopened"),
            }
            line
        }
        RuleOutcome::Skipped {
            rule_index,
            target,
            reason,
        } => format!(
            "rule #{} skipped {} ({reason:?})",
            rule_index + 1,
            target.display()
        ),
        RuleOutcome::OpenFailed {
            rule_index,
            target,
            error,
        } => format!(
            "rule #{} failed to open {}: {error}",
            rule_index + 1,
            target.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_arguments() {
        let cli = Cli::try_parse_from([
            "sidepane",
            "--log-level",
            "debug",
            "check",
            "/a/Foo.html",
            "--pane",
            "2",
            "--visible",
            "/a/Bar.js@1",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Commands::Check { pane, visible, .. } => {
                assert_eq!(pane, 2);
                assert_eq!(visible, vec!["/a/Bar.js@1".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_visible_argument() {
        let (path, pane) = parse_visible("/a/b@c.js@3").unwrap();
        assert_eq!(path, PathBuf::from("/a/b@c.js"));
        assert_eq!(pane.get(), 3);

        let (path, pane) = parse_visible("/a/user@host.txt").unwrap();
        assert_eq!(path, PathBuf::from("/a/user@host.txt"));
        assert_eq!(pane, PaneIndex::FIRST);

        assert!(parse_visible("/a/x.js@0").is_err());
    }
}

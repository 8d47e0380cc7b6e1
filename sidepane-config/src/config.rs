//! The top-level `Config` struct, its persistence and validation.
//!
//! Covers:
//! - `load` / `load_from` / `save` / `save_to` (YAML file I/O with atomic write)
//! - XDG-compliant path helpers (`config_path`, `config_dir`)
//! - Advisory rule validation (`validate`)

use crate::error::ConfigError;
use crate::rule::OpenRule;
use crate::types::LogLevel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read fresh on every active-file event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Master switch for the automation.
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,

    /// Soft ceiling on explicit pane indices; `0` means unlimited.
    #[serde(default = "crate::defaults::max_panes", alias = "max_tab")]
    pub max_panes: u32,

    /// Remember which files already fired their rules until they are closed,
    /// so repeated focus events on the same file do nothing.
    #[serde(default = "crate::defaults::bool_true")]
    pub remember_processed: bool,

    /// Verbosity of the diagnostic log.
    #[serde(default = "crate::defaults::log_level")]
    pub log_level: LogLevel,

    /// Ordered rule list; every matching rule fires.
    #[serde(default = "crate::defaults::rules")]
    pub rules: Vec<OpenRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: crate::defaults::bool_true(),
            max_panes: crate::defaults::max_panes(),
            remember_processed: crate::defaults::bool_true(),
            log_level: crate::defaults::log_level(),
            rules: crate::defaults::rules(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save() {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            log::info!("Default config created successfully");
            Ok(config)
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from a YAML document.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml_ng::from_str(contents)?;
        for finding in config.validate() {
            log::warn!("{finding}");
        }
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("sidepane")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("sidepane")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Check every rule and return one finding per problem.
    ///
    /// Findings are advisory: a broken rule is skipped when rules are
    /// evaluated and never aborts processing of the others.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut findings = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let label = format!("rule #{} ({})", index + 1, rule.label());
            if rule.trigger_pattern.is_empty() {
                findings.push(ConfigError::Validation(format!(
                    "{label}: trigger_pattern is empty"
                )));
            } else if let Err(e) = regex::Regex::new(&rule.trigger_pattern) {
                findings.push(ConfigError::Validation(format!(
                    "{label}: trigger_pattern does not compile: {e}"
                )));
            }
            if rule.open_pattern.trim().is_empty() {
                findings.push(ConfigError::Validation(format!(
                    "{label}: open_pattern is empty"
                )));
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Placement;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml("   \n").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.enabled);
        assert_eq!(config.max_panes, 0);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_max_tab_alias() {
        let config = Config::from_yaml("max_tab: 2\n").unwrap();
        assert_eq!(config.max_panes, 2);
    }

    #[test]
    fn test_save_then_load_preserves_rules() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.max_panes = 3;
        config
            .rules
            .push(OpenRule::new(r"(.+)\.js$", "$1.css", Placement::SidePaneRight));
        config.save_to(&path).unwrap();

        assert!(!path.with_extension("yaml.tmp").exists());
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_reports_parse_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "rules: [ {trigger_pattern: 1").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_flags_bad_rules() {
        let mut config = Config::default();
        config
            .rules
            .push(OpenRule::new(r"(.+\.js$", "$1.css", Placement::SidePane));
        config
            .rules
            .push(OpenRule::new(r"(.+)\.ts$", " ", Placement::SidePane));
        config
            .rules
            .push(OpenRule::new(r"(.+)\.rs$", "$1.md", Placement::SamePane));

        let findings = config.validate();
        assert_eq!(findings.len(), 2);
        assert!(findings[0].to_string().contains("rule #1"));
        assert!(findings[1].to_string().contains("open_pattern is empty"));
    }
}

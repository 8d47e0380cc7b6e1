//! Configuration system for sidepane.
//!
//! This crate provides configuration loading, saving, and default values
//! for the related-file opener. It includes:
//!
//! - Rule definitions (`OpenRule`, `Placement`)
//! - The top-level `Config` with persistence and validation
//! - Configuration file watching

pub mod config;
pub mod defaults;
pub mod error;
pub mod rule;
mod types;
#[cfg(feature = "watcher")]
pub mod watcher;

pub use config::Config;
pub use error::ConfigError;
pub use rule::{OpenRule, Placement};
pub use types::LogLevel;
#[cfg(feature = "watcher")]
pub use watcher::{ConfigReloadEvent, ConfigWatcher};

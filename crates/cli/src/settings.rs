//! Tool settings (`schemata.toml`)
//!
//! ```toml
//! app = "blog"
//!
//! [database]
//! url = "mysql://root@localhost/site"
//!
//! [logging]
//! level = "info"
//!
//! [planner]
//! order_by_foreign_keys = true
//! ```
//!
//! Every value can be overridden by a command-line flag or an environment
//! variable; the file only supplies fallbacks.

use schemata_core::{EngineError, EngineResult};
use schemata_planner::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File read when `--settings` is not given
pub const DEFAULT_SETTINGS_FILE: &str = "schemata.toml";

/// Log filter used when nothing else sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application name, used as table prefix
    pub app: Option<String>,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// A tracing filter directive such as `info` or `schemata_planner=debug`
    pub level: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| EngineError::invalid_config(path, e.to_string()))
    }

    /// Load settings, treating a missing default file as empty
    ///
    /// An explicitly requested file must exist.
    pub fn load_or_default(explicit: Option<&Path>) -> EngineResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    debug!("No settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Application name: flag (or `SCHEMATA_APP`), then file, then empty
    pub fn resolve_app(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.app.clone())
            .unwrap_or_default()
    }

    /// Database URL: flag (or `DATABASE_URL`), then file
    pub fn resolve_database_url(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.database.url.clone())
    }

    /// Log filter: `RUST_LOG`, then `-v` / `-q`, then file, then `info`
    pub fn resolve_log_filter(&self, env: Option<&str>, verbose: bool, quiet: bool) -> String {
        if let Some(env) = env.filter(|e| !e.trim().is_empty()) {
            return env.to_string();
        }
        if verbose {
            return "debug".to_string();
        }
        if quiet {
            return "error".to_string();
        }
        self.logging
            .level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

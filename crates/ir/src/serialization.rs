//! Loading application configurations from disk
//!
//! Configurations are JSON or TOML documents with an `orm` array. The
//! format is chosen by file extension; anything that is not `.toml` is
//! read as JSON.

use crate::config::AppConfig;
use crate::snapshot::Snapshot;
use schemata_core::{EngineError, EngineResult};
use std::path::Path;
use tracing::debug;

// ============================================================================
// Formats
// ============================================================================

/// Document format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Parse a configuration document
pub fn load_app_config_from_str(text: &str, format: ConfigFormat) -> EngineResult<AppConfig> {
    let config = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Toml => toml::from_str(text)?,
    };
    Ok(config)
}

/// Load a configuration from a file
///
/// # Example
///
/// ```rust,ignore
/// use schemata_ir::load_app_config;
///
/// let config = load_app_config("blog.json")?;
/// println!("{} entities", config.orm.len());
/// ```
pub fn load_app_config(path: impl AsRef<Path>) -> EngineResult<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EngineError::ConfigNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let format = ConfigFormat::from_path(path);
    debug!(path = %path.display(), ?format, "Loading configuration");

    load_app_config_from_str(&text, format).map_err(|e| match e {
        EngineError::Json(_) | EngineError::Toml(_) => {
            EngineError::invalid_config(path, e.to_string())
        }
        other => other,
    })
}

/// Load a configuration file and build its snapshot
pub fn load_snapshot(path: impl AsRef<Path>, app: &str) -> EngineResult<Snapshot> {
    let config = load_app_config(path)?;
    Snapshot::from_config(&config, app)
}

// ============================================================================
// Tests
// ============================================================================

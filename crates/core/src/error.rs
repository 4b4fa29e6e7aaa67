//! Error types for Schemata
//!
//! This module provides unified error handling across the migration engine:
//! configuration errors raised while building snapshots, execution errors
//! raised while applying a plan, and the IO/serialization errors that
//! surround them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Schemata
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// An entity specification is missing its name or options
    #[error("Invalid entity '{entity}': {message}")]
    InvalidEntity { entity: String, message: String },

    /// A relation references a field absent from the joined row set
    #[error("Undefined field '{field}' in relation '{relation}'")]
    UndefinedRelationField { relation: String, field: String },

    /// The configuration document could not be parsed
    #[error("Invalid configuration in '{path}': {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// The configuration file does not exist
    #[error("Configuration not found at path: {0}")]
    ConfigNotFound(PathBuf),

    /// Validation of a snapshot failed
    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// A single SQL statement failed
    #[error("Statement failed: {message}\n  {statement}")]
    Execution { statement: String, message: String },

    /// A plan stopped at a failing operation
    #[error("Migration aborted at '{label}' after {applied} of {total} operations: {source}")]
    PlanAborted {
        applied: usize,
        total: usize,
        label: String,
        #[source]
        source: Box<EngineError>,
    },

    /// No database backend is compiled into this build
    #[error("Database backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    /// Connecting to the database failed
    #[error("Connection failed: {0}")]
    Connection(String),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an invalid entity error
    pub fn invalid_entity(entity: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::InvalidEntity {
            entity: entity.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an execution error for a statement
    pub fn execution(statement: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::Execution {
            statement: statement.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    /// Check if this error comes from configuration (raised before planning)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidEntity { .. }
                | EngineError::UndefinedRelationField { .. }
                | EngineError::InvalidConfig { .. }
                | EngineError::ConfigNotFound(_)
                | EngineError::Validation(_)
        )
    }

    /// Check if this error was raised while applying SQL
    pub fn is_execution(&self) -> bool {
        matches!(
            self,
            EngineError::Execution { .. } | EngineError::PlanAborted { .. }
        )
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Tests
// ============================================================================

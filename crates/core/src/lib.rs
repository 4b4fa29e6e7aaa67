//! # Schemata Core
//!
//! Core types, traits, and error handling for Schemata.
//!
//! This crate provides the foundational building blocks used by the
//! snapshot model and the migration planner:
//!
//! - **Types**: column nullability, default values, key kinds, execution results
//! - **Traits**: the `Quoter` and `Connection` capabilities, `Validatable`
//! - **Dialect**: MySQL identifier and value quoting
//! - **Errors**: unified error handling with `EngineError` and `EngineResult`
//!

pub mod dialect;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use dialect::MySqlDialect;
pub use error::{EngineError, EngineResult};
pub use traits::{Connection, Quoter, Validatable};
pub use types::{DefaultValue, ExecResult, KeyKind, Nullability};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

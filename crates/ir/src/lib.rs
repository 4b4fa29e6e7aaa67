//! # Schemata IR (Intermediate Representation)
//!
//! This crate turns an application's entity configuration into physical
//! table definitions.
//!
//! ## Core Concepts
//!
//! - **Field / Key**: one column or one index, rendered as a DDL fragment
//! - **Table**: a physical table with its `CREATE` / `DROP` / `ALTER` statements
//! - **Entity**: a configured resource producing its own table and junction tables
//! - **Snapshot**: every table of one configuration version, indexed by physical name
//!

// Module declarations
pub mod config;
pub mod entity;
pub mod field;
pub mod key;
pub mod serialization;
pub mod snapshot;
pub mod table;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, EntityConfig, FieldConfig, JunctionConfig, KeyConfig, ReferenceConfig,
    RelationConfig,
};
pub use entity::{Entity, EntityScope};
pub use field::Field;
pub use key::{Key, Reference};
pub use serialization::{ConfigFormat, load_app_config, load_app_config_from_str, load_snapshot};
pub use snapshot::{Snapshot, TableId};
pub use table::{AlterAction, Table};
pub use validation::{
    ValidationError, ValidationErrorCode, ValidationResult, ValidationRule, ValidationWarning,
    ValidationWarningCode, Validator, validate_snapshot,
};

// Re-export core types that are commonly used with IR
pub use schemata_core::{
    DefaultValue, EngineError, EngineResult, KeyKind, MySqlDialect, Nullability, Quoter,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Column definitions
//!
//! A [`Field`] is one column of a table in dialect-independent terms. It
//! renders itself as the fragment used inside `CREATE TABLE` and in
//! `ADD COLUMN` / `CHANGE COLUMN` clauses.

use crate::config::FieldConfig;
use schemata_core::{DefaultValue, Nullability, Quoter};
use serde::{Deserialize, Serialize};

// ============================================================================
// Field
// ============================================================================

/// Represents a column within a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Column name
    pub name: String,

    /// Raw SQL type, e.g. `INT(11)`
    pub sql_type: String,

    /// Nullability clause
    pub nullable: Nullability,

    /// Default value
    pub default: Option<DefaultValue>,

    /// Whether the column auto-increments
    pub auto_increment: bool,
}

impl Field {
    /// Create a new field with the given name and SQL type
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: Nullability::Unset,
            default: None,
            auto_increment: false,
        }
    }

    /// Build a field from its configuration
    ///
    /// Returns `None` when the type is empty: such a column is disabled and
    /// does not appear in the table at all. Any other type, blank or not, is
    /// passed through untouched.
    pub fn from_config(name: &str, config: &FieldConfig) -> Option<Self> {
        if config.sql_type.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            sql_type: config.sql_type.clone(),
            nullable: config.null.clone(),
            default: config.default.clone(),
            auto_increment: config.auto_increment,
        })
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Mark the column `NOT NULL`
    pub fn not_null(mut self) -> Self {
        self.nullable = Nullability::NotNull;
        self
    }

    /// Mark the column `NULL`
    pub fn null(mut self) -> Self {
        self.nullable = Nullability::Null;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Enable auto increment
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render the column definition
    ///
    /// `<name> <TYPE> [NULL|NOT NULL] [DEFAULT <value>] [AUTO_INCREMENT]`.
    /// The default is never rendered on an auto-increment column.
    pub fn render(&self, quoter: &dyn Quoter) -> String {
        let mut parts = vec![
            quoter.quote_identifier(&self.name),
            self.sql_type.to_uppercase(),
        ];

        if let Some(null) = self.nullable.to_sql() {
            parts.push(null);
        }

        if let Some(default) = &self.default {
            if !self.auto_increment {
                parts.push(format!("DEFAULT {}", default.to_sql(quoter)));
            }
        }

        if self.auto_increment {
            parts.push("AUTO_INCREMENT".to_string());
        }

        parts.join(" ")
    }
}

// ============================================================================
// Tests
// ============================================================================

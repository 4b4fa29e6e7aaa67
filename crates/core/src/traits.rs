//! Core traits for Schemata
//!
//! This module defines the capabilities the engine needs from the outside
//! world. Rendering DDL only needs a [`Quoter`]; applying a plan needs a
//! [`Connection`]. Both are passed in explicitly by the caller.

use crate::error::EngineResult;
use crate::types::ExecResult;

// ============================================================================
// Quoter Trait
// ============================================================================

/// Identifier and value quoting for one SQL dialect
///
/// # Example
///
/// ```rust
/// use schemata_core::{MySqlDialect, Quoter};
///
/// let q = MySqlDialect;
/// assert_eq!(q.quote_identifier("posts"), "`posts`");
/// assert_eq!(q.quote("it's"), "'it\\'s'");
/// ```
pub trait Quoter {
    /// Quote a table, column or key name
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a literal value
    fn quote(&self, value: &str) -> String;

    /// Quote every identifier and join them with `,`
    fn quote_identifier_list(&self, idents: &[String]) -> String {
        idents
            .iter()
            .map(|i| self.quote_identifier(i))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<Q: Quoter + ?Sized> Quoter for &Q {
    fn quote_identifier(&self, ident: &str) -> String {
        (**self).quote_identifier(ident)
    }

    fn quote(&self, value: &str) -> String {
        (**self).quote(value)
    }
}

// ============================================================================
// Connection Trait
// ============================================================================

/// A live (or simulated) database connection
///
/// Statements run one at a time, in the order they are issued. The engine
/// never retries or wraps statements in a transaction.
pub trait Connection: Quoter {
    /// Execute a statement that returns no rows
    fn execute(&mut self, sql: &str) -> EngineResult<ExecResult>;

    /// Run a query and return the first column of every row as text
    fn query_column(&mut self, sql: &str) -> EngineResult<Vec<String>>;

    /// Probe the catalog for a table with exactly this name
    fn table_exists(&mut self, name: &str) -> EngineResult<bool> {
        let sql = format!("SHOW TABLES LIKE {}", self.quote(name));
        let tables = self.query_column(&sql)?;
        Ok(tables.iter().any(|t| t == name))
    }
}

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return validation errors if the state is invalid.
pub trait Validatable {
    /// Validate the current state of the object
    fn validate(&self) -> EngineResult<()>;
}

// ============================================================================
// Tests
// ============================================================================

//! Core types used throughout Schemata
//!
//! These are the dialect-independent building blocks of a column or key
//! definition, plus the result type returned by a [`Connection`](crate::Connection).

use crate::traits::Quoter;
use serde::{Deserialize, Serialize};

// ============================================================================
// Nullability
// ============================================================================

/// Tri-state column nullability
///
/// Anything other than `NULL` / `NOT NULL` is carried through verbatim
/// (upper-cased), so a malformed configuration still renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Nullability {
    /// No nullability clause is rendered
    #[default]
    Unset,
    /// `NULL`
    Null,
    /// `NOT NULL`
    NotNull,
    /// Any other clause
    Other(String),
}

impl Nullability {
    /// Get the SQL clause, if any
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Nullability::Unset => None,
            Nullability::Null => Some("NULL".to_string()),
            Nullability::NotNull => Some("NOT NULL".to_string()),
            Nullability::Other(s) => Some(s.to_uppercase()),
        }
    }

    /// Check if a clause is set
    pub fn is_set(&self) -> bool {
        !matches!(self, Nullability::Unset)
    }
}

impl From<Option<String>> for Nullability {
    fn from(value: Option<String>) -> Self {
        let Some(raw) = value else {
            return Nullability::Unset;
        };
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "" => Nullability::Unset,
            "NULL" => Nullability::Null,
            "NOT NULL" => Nullability::NotNull,
            _ => Nullability::Other(raw),
        }
    }
}

impl From<&str> for Nullability {
    fn from(value: &str) -> Self {
        Nullability::from(Some(value.to_string()))
    }
}

impl From<Nullability> for Option<String> {
    fn from(value: Nullability) -> Self {
        value.to_sql()
    }
}

// ============================================================================
// Default Values
// ============================================================================

/// Default value of a column
///
/// The SQL literals are emitted unquoted; everything else goes through
/// [`Quoter::quote`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ScalarValue", into = "String")]
pub enum DefaultValue {
    /// `NULL`
    Null,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
    /// `CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP`
    CurrentTimestampOnUpdate,
    /// `''`
    EmptyString,
    /// Any other value, quoted on output
    Value(String),
}

impl DefaultValue {
    /// Render the value as it appears after `DEFAULT`
    pub fn to_sql(&self, quoter: &dyn Quoter) -> String {
        match self {
            DefaultValue::Value(v) => quoter.quote(v),
            literal => literal.as_raw().to_string(),
        }
    }

    /// Get the raw configuration text
    pub fn as_raw(&self) -> &str {
        match self {
            DefaultValue::Null => "NULL",
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP",
            DefaultValue::CurrentTimestampOnUpdate => {
                "CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
            }
            DefaultValue::EmptyString => "''",
            DefaultValue::Value(v) => v,
        }
    }

    /// Check if the value is one of the unquoted SQL literals
    pub fn is_literal(&self) -> bool {
        !matches!(self, DefaultValue::Value(_))
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        match value {
            "NULL" => DefaultValue::Null,
            "CURRENT_TIMESTAMP" => DefaultValue::CurrentTimestamp,
            "CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP" => {
                DefaultValue::CurrentTimestampOnUpdate
            }
            "''" => DefaultValue::EmptyString,
            other => DefaultValue::Value(other.to_string()),
        }
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::from(value.as_str())
    }
}

impl From<DefaultValue> for String {
    fn from(value: DefaultValue) -> Self {
        value.as_raw().to_string()
    }
}

/// Scalar accepted for a `default` in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<ScalarValue> for DefaultValue {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(b) => DefaultValue::Value(if b { "1" } else { "0" }.to_string()),
            ScalarValue::Int(i) => DefaultValue::Value(i.to_string()),
            ScalarValue::Float(f) => DefaultValue::Value(f.to_string()),
            ScalarValue::Str(s) => DefaultValue::from(s),
        }
    }
}

// ============================================================================
// Key Kinds
// ============================================================================

/// Kind of index or constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyKind {
    /// `PRIMARY KEY`
    Primary,
    /// `CONSTRAINT .. FOREIGN KEY .. REFERENCES`
    Foreign,
    /// `UNIQUE KEY`
    Unique,
    /// Plain `KEY`
    #[default]
    Static,
}

impl KeyKind {
    /// Get the configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Primary => "PRIMARY",
            KeyKind::Foreign => "FOREIGN",
            KeyKind::Unique => "UNIQUE",
            KeyKind::Static => "STATIC",
        }
    }
}

impl From<&str> for KeyKind {
    fn from(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "PRIMARY" => KeyKind::Primary,
            "FOREIGN" => KeyKind::Foreign,
            "UNIQUE" => KeyKind::Unique,
            _ => KeyKind::Static,
        }
    }
}

impl From<String> for KeyKind {
    fn from(value: String) -> Self {
        KeyKind::from(value.as_str())
    }
}

impl From<KeyKind> for String {
    fn from(value: KeyKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Execution Results
// ============================================================================

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Number of rows affected
    pub rows_affected: u64,
    /// Last generated auto-increment id, if any
    pub last_insert_id: Option<u64>,
}

impl ExecResult {
    /// Create a result with the given row count
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Set the last insert id
    pub fn with_insert_id(mut self, id: u64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MySqlDialect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nullability_parsing() {
        assert_eq!(Nullability::from("not null"), Nullability::NotNull);
        assert_eq!(Nullability::from("NOT   NULL"), Nullability::NotNull);
        assert_eq!(Nullability::from("null"), Nullability::Null);
        assert_eq!(Nullability::from(""), Nullability::Unset);
        assert_eq!(Nullability::from(None::<String>), Nullability::Unset);
        assert_eq!(
            Nullability::from("nullable"),
            Nullability::Other("nullable".to_string())
        );
    }

    #[test]
    fn test_nullability_sql() {
        assert_eq!(Nullability::Unset.to_sql(), None);
        assert_eq!(Nullability::NotNull.to_sql().as_deref(), Some("NOT NULL"));
        assert_eq!(
            Nullability::Other("nullable".to_string()).to_sql().as_deref(),
            Some("NULLABLE")
        );
    }

    #[test]
    fn test_default_value_literals() {
        let q = MySqlDialect;
        assert_eq!(DefaultValue::from("NULL").to_sql(&q), "NULL");
        assert_eq!(
            DefaultValue::from("CURRENT_TIMESTAMP").to_sql(&q),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(
            DefaultValue::from("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP").to_sql(&q),
            "CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
        );
        assert_eq!(DefaultValue::from("''").to_sql(&q), "''");
        assert!(DefaultValue::EmptyString.is_literal());
    }

    #[test]
    fn test_default_value_quoted() {
        let q = MySqlDialect;
        assert_eq!(DefaultValue::from("draft").to_sql(&q), "'draft'");
        // literal matching is exact
        assert_eq!(DefaultValue::from("null").to_sql(&q), "'null'");
        assert_eq!(DefaultValue::from("0").to_sql(&q), "'0'");
    }

    #[test]
    fn test_default_value_from_json_scalars() {
        let v: DefaultValue = serde_json::from_str("0").unwrap();
        assert_eq!(v, DefaultValue::Value("0".to_string()));
        let v: DefaultValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, DefaultValue::Value("1".to_string()));
        let v: DefaultValue = serde_json::from_str("\"CURRENT_TIMESTAMP\"").unwrap();
        assert_eq!(v, DefaultValue::CurrentTimestamp);
    }

    #[test]
    fn test_key_kind_parsing() {
        assert_eq!(KeyKind::from("primary"), KeyKind::Primary);
        assert_eq!(KeyKind::from("FOREIGN"), KeyKind::Foreign);
        assert_eq!(KeyKind::from("Unique"), KeyKind::Unique);
        assert_eq!(KeyKind::from("static"), KeyKind::Static);
        assert_eq!(KeyKind::from("fulltext"), KeyKind::Static);
        assert_eq!(KeyKind::from(""), KeyKind::Static);
    }

    #[test]
    fn test_exec_result() {
        let r = ExecResult::new(3).with_insert_id(42);
        assert_eq!(r.rows_affected, 3);
        assert_eq!(r.last_insert_id, Some(42));
    }
}

//! Index and constraint definitions

use crate::config::KeyConfig;
use schemata_core::{KeyKind, Quoter};
use serde::{Deserialize, Serialize};

// ============================================================================
// Key
// ============================================================================

/// An index or constraint on a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Key name
    pub name: String,

    /// Kind of key
    pub kind: KeyKind,

    /// Indexed columns, in order
    pub columns: Vec<String>,

    /// Target of a foreign key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
}

/// Target entity and columns of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Unprefixed name of the referenced entity
    pub entity: String,

    /// Referenced columns
    pub columns: Vec<String>,
}

impl Key {
    /// Create a key
    ///
    /// A primary key declared without columns indexes the column named
    /// after the key itself.
    pub fn new(name: impl Into<String>, kind: KeyKind, columns: Vec<String>) -> Self {
        let name = name.into();
        let columns = if columns.is_empty() && kind == KeyKind::Primary {
            vec![name.clone()]
        } else {
            columns
        };
        Self {
            name,
            kind,
            columns,
            reference: None,
        }
    }

    /// Shorthand for a primary key
    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            "PRIMARY",
            KeyKind::Primary,
            columns.into_iter().map(Into::into).collect(),
        )
    }

    /// Set the foreign key target
    pub fn references<I, S>(mut self, entity: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference = Some(Reference {
            entity: entity.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build a key from its configuration
    pub fn from_config(name: &str, config: &KeyConfig) -> Self {
        let key = Self::new(name, config.kind, config.fields.clone());
        match &config.references {
            Some(r) => key.references(r.entity.clone(), r.fields.clone()),
            None => key,
        }
    }

    /// Unprefixed entity this key points at, for foreign keys only
    pub fn target_entity(&self) -> Option<&str> {
        match (self.kind, &self.reference) {
            (KeyKind::Foreign, Some(r)) if !r.entity.is_empty() => Some(&r.entity),
            _ => None,
        }
    }

    /// Render the key definition
    ///
    /// `prefix` is prepended to the referenced entity of a foreign key so
    /// the constraint points at the table of the same application.
    pub fn render(&self, quoter: &dyn Quoter, prefix: &str) -> String {
        let columns = quoter.quote_identifier_list(&self.columns);
        let name = quoter.quote_identifier(&self.name);

        match self.kind {
            KeyKind::Primary => format!("PRIMARY KEY ({columns})"),
            KeyKind::Foreign => {
                let (target, target_columns) = match &self.reference {
                    Some(r) => (
                        quoter.quote_identifier(&format!("{prefix}{}", r.entity)),
                        quoter.quote_identifier_list(&r.columns),
                    ),
                    None => (quoter.quote_identifier(prefix), String::new()),
                };
                format!(
                    "CONSTRAINT {name} FOREIGN KEY ({columns}) REFERENCES {target} ({target_columns}) ON DELETE CASCADE"
                )
            }
            KeyKind::Unique => format!("UNIQUE KEY {name} ({columns})"),
            KeyKind::Static => format!("KEY {name} ({columns})"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

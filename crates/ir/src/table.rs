//! Table descriptors
//!
//! A [`Table`] owns the full DDL surface of one physical table. It never
//! talks to a database: every renderer takes the [`Quoter`] to use.

use crate::config::{FieldConfig, KeyConfig};
use crate::field::Field;
use crate::key::Key;
use indexmap::IndexMap;
use schemata_core::Quoter;
use serde::{Deserialize, Serialize};

// ============================================================================
// Table
// ============================================================================

/// One physical table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Unprefixed table name
    pub name: String,

    /// Application prefix, empty for shared tables
    #[serde(default)]
    pub prefix: String,

    /// Columns in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, Field>,

    /// Keys in declaration order
    #[serde(default)]
    pub keys: IndexMap<String, Key>,

    /// Declared columns left out because their type is empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Build a table from column and key specifications
    pub fn from_config(
        name: impl Into<String>,
        prefix: impl Into<String>,
        options: &IndexMap<String, FieldConfig>,
        keys: &IndexMap<String, KeyConfig>,
    ) -> Self {
        let mut table = Self::new(name, prefix);

        for (column, spec) in options {
            match Field::from_config(column, spec) {
                Some(field) => {
                    table.fields.insert(column.clone(), field);
                }
                None => table.disabled.push(column.clone()),
            }
        }

        for (key_name, spec) in keys {
            table
                .keys
                .insert(key_name.clone(), Key::from_config(key_name, spec));
        }

        table
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Add a column using builder pattern
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Add a key using builder pattern
    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.insert(key.name.clone(), key);
        self
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Physical name: prefix followed by name
    ///
    /// This is the identity of the table when two snapshots are compared.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    /// Physical names of the tables this table's foreign keys point at
    pub fn foreign_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        for key in self.keys.values() {
            if let Some(entity) = key.target_entity() {
                let target = format!("{}{}", self.prefix, entity);
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }

    // ========================================================================
    // DDL
    // ========================================================================

    /// `CREATE TABLE` with every column followed by every key
    pub fn create(&self, quoter: &dyn Quoter, if_not_exists: bool) -> String {
        let mut lines: Vec<String> = self.fields.values().map(|f| f.render(quoter)).collect();
        lines.extend(self.keys.values().map(|k| k.render(quoter, &self.prefix)));

        format!(
            "CREATE TABLE {}{} (\n    {}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            quoter.quote_identifier(&self.qualified_name()),
            lines.join(",\n    ")
        )
    }

    /// `DROP TABLE`
    pub fn drop(&self, quoter: &dyn Quoter) -> String {
        format!(
            "DROP TABLE {}",
            quoter.quote_identifier(&self.qualified_name())
        )
    }

    /// `ALTER TABLE` with one pre-rendered clause
    pub fn alter(&self, quoter: &dyn Quoter, clause: &str) -> String {
        format!(
            "ALTER TABLE {} {}",
            quoter.quote_identifier(&self.qualified_name()),
            clause
        )
    }

    /// `ALTER TABLE` for a structured action
    pub fn alter_with(&self, quoter: &dyn Quoter, action: &AlterAction) -> String {
        self.alter(quoter, &action.render(quoter, &self.prefix))
    }
}

// ============================================================================
// Alter actions
// ============================================================================

/// A single `ALTER TABLE` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    AddColumn(Field),
    DropColumn(String),
    /// Redefine a column in place, keeping its name
    ChangeColumn(Field),
    AddKey(Key),
    DropKey(String),
}

impl AlterAction {
    /// Render the clause that follows `ALTER TABLE <name>`
    pub fn render(&self, quoter: &dyn Quoter, prefix: &str) -> String {
        match self {
            AlterAction::AddColumn(field) => format!("ADD COLUMN {}", field.render(quoter)),
            AlterAction::DropColumn(name) => {
                format!("DROP COLUMN {}", quoter.quote_identifier(name))
            }
            AlterAction::ChangeColumn(field) => format!(
                "CHANGE COLUMN {} {}",
                quoter.quote_identifier(&field.name),
                field.render(quoter)
            ),
            AlterAction::AddKey(key) => format!("ADD {}", key.render(quoter, prefix)),
            AlterAction::DropKey(name) => format!("DROP KEY {}", quoter.quote_identifier(name)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

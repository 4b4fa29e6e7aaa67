//! Migration operations
//!
//! An [`Operation`] is one atomic schema change with its SQL already
//! rendered. Operations are built by the planner, shown to the operator,
//! and applied one at a time.

use schemata_core::{Connection, EngineResult, Quoter};
use schemata_ir::{AlterAction, Field, Key, Table};
use serde::Serialize;
use tracing::debug;

/// Label of a table creation
pub const LABEL_CREATE: &str = "Create table";
/// Label of a table drop
pub const LABEL_DROP: &str = "Drop table";
/// Label of every column and key change
pub const LABEL_ALTER: &str = "Alter table";

// ============================================================================
// Operation Kind
// ============================================================================

/// What an operation does to its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateTable,
    DropTable,
    AddColumn,
    DropColumn,
    ChangeColumn,
    AddKey,
    DropKey,
    /// Arbitrary SQL
    Execute,
}

// ============================================================================
// SQL payload
// ============================================================================

/// One statement or an ordered batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Sql {
    Single(String),
    Batch(Vec<String>),
}

impl Sql {
    /// All statements in order
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Sql::Single(s) => vec![s.as_str()],
            Sql::Batch(list) => list.iter().map(String::as_str).collect(),
        }
    }

    /// Statements that will actually be sent to the database
    ///
    /// Empty statements and statements starting with `--` are skipped.
    pub fn executable(&self) -> Vec<&str> {
        self.statements()
            .into_iter()
            .filter(|s| is_executable(s))
            .collect()
    }
}

impl From<String> for Sql {
    fn from(value: String) -> Self {
        Sql::Single(value)
    }
}

impl From<&str> for Sql {
    fn from(value: &str) -> Self {
        Sql::Single(value.to_string())
    }
}

impl From<Vec<String>> for Sql {
    fn from(value: Vec<String>) -> Self {
        Sql::Batch(value)
    }
}

impl std::fmt::Display for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.statements().join(";\n"))
    }
}

fn is_executable(statement: &str) -> bool {
    let trimmed = statement.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with("--")
}

// ============================================================================
// Operation
// ============================================================================

/// One schema change bound to a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Physical name of the target table
    pub table: String,

    pub kind: OperationKind,

    /// Short label, e.g. "Alter table"
    pub label: String,

    /// Human-readable description
    pub description: String,

    pub sql: Sql,
}

impl Operation {
    /// `CREATE TABLE`
    pub fn create(quoter: &dyn Quoter, table: &Table, app: &str, if_not_exists: bool) -> Self {
        Self {
            table: table.qualified_name(),
            kind: OperationKind::CreateTable,
            label: LABEL_CREATE.to_string(),
            description: format!(
                "Create table '{}' for application '{}'",
                table.name, app
            ),
            sql: table.create(quoter, if_not_exists).into(),
        }
    }

    /// `DROP TABLE`
    pub fn drop(quoter: &dyn Quoter, table: &Table, app: &str) -> Self {
        Self {
            table: table.qualified_name(),
            kind: OperationKind::DropTable,
            label: LABEL_DROP.to_string(),
            description: format!("Drop table '{}' for application '{}'", table.name, app),
            sql: table.drop(quoter).into(),
        }
    }

    /// `ALTER TABLE .. ADD COLUMN`
    pub fn add_column(quoter: &dyn Quoter, table: &Table, app: &str, field: &Field) -> Self {
        Self::alter(
            quoter,
            table,
            app,
            OperationKind::AddColumn,
            "add column",
            AlterAction::AddColumn(field.clone()),
        )
    }

    /// `ALTER TABLE .. DROP COLUMN`
    pub fn drop_column(quoter: &dyn Quoter, table: &Table, app: &str, column: &str) -> Self {
        Self::alter(
            quoter,
            table,
            app,
            OperationKind::DropColumn,
            "drop column",
            AlterAction::DropColumn(column.to_string()),
        )
    }

    /// `ALTER TABLE .. CHANGE COLUMN`
    pub fn change_column(quoter: &dyn Quoter, table: &Table, app: &str, field: &Field) -> Self {
        Self::alter(
            quoter,
            table,
            app,
            OperationKind::ChangeColumn,
            "change column",
            AlterAction::ChangeColumn(field.clone()),
        )
    }

    /// `ALTER TABLE .. ADD <key>`
    pub fn add_key(quoter: &dyn Quoter, table: &Table, app: &str, key: &Key) -> Self {
        Self::alter(
            quoter,
            table,
            app,
            OperationKind::AddKey,
            "add key",
            AlterAction::AddKey(key.clone()),
        )
    }

    /// `ALTER TABLE .. DROP KEY`
    pub fn drop_key(quoter: &dyn Quoter, table: &Table, app: &str, key: &str) -> Self {
        Self::alter(
            quoter,
            table,
            app,
            OperationKind::DropKey,
            "drop key",
            AlterAction::DropKey(key.to_string()),
        )
    }

    /// Arbitrary SQL, one statement or a batch
    pub fn execute(
        table: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        sql: impl Into<Sql>,
    ) -> Self {
        Self {
            table: table.into(),
            kind: OperationKind::Execute,
            label: label.into(),
            description: description.into(),
            sql: sql.into(),
        }
    }

    fn alter(
        quoter: &dyn Quoter,
        table: &Table,
        app: &str,
        kind: OperationKind,
        what: &str,
        action: AlterAction,
    ) -> Self {
        Self {
            table: table.qualified_name(),
            kind,
            label: LABEL_ALTER.to_string(),
            description: format!(
                "Alter '{}' {} for application '{}'",
                table.name, what, app
            ),
            sql: table.alter_with(quoter, &action).into(),
        }
    }

    /// Execute the operation's statements in order
    ///
    /// Returns the number of statements sent. The first failing statement
    /// stops the operation and its error is returned unchanged.
    pub fn apply(&self, conn: &mut dyn Connection) -> EngineResult<usize> {
        let mut sent = 0;
        for statement in self.sql.statements() {
            if !is_executable(statement) {
                debug!(table = %self.table, "Skipping empty or commented statement");
                continue;
            }
            conn.execute(statement)?;
            sent += 1;
        }
        Ok(sent)
    }
}

// ============================================================================
// Tests
// ============================================================================

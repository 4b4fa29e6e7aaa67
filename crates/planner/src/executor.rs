//! Plan execution
//!
//! Operations run one at a time in plan order. The first failure stops
//! the plan; whatever ran before it stays applied.

use crate::operation::Operation;
use chrono::{DateTime, Utc};
use schemata_core::{Connection, EngineError, EngineResult};
use serde::Serialize;
use tracing::{error, info};

/// Summary of a successfully applied plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Operations applied
    pub operations: usize,

    /// Statements sent to the database
    pub statements: usize,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl ApplyReport {
    /// Wall-clock time the plan took
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Apply every operation of a plan in order
///
/// # Errors
///
/// Returns [`EngineError::PlanAborted`] wrapping the failing statement's
/// error. No rollback is attempted.
pub fn apply_plan(ops: &[Operation], conn: &mut dyn Connection) -> EngineResult<ApplyReport> {
    let started_at = Utc::now();
    let total = ops.len();
    let mut statements = 0;

    for (applied, op) in ops.iter().enumerate() {
        match op.apply(conn) {
            Ok(sent) => {
                statements += sent;
                info!(table = %op.table, "{}", op.description);
            }
            Err(e) => {
                error!(table = %op.table, error = %e, "Migration failed after {applied} of {total} operations");
                return Err(EngineError::PlanAborted {
                    applied,
                    total,
                    label: op.label.clone(),
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(ApplyReport {
        operations: total,
        statements,
        started_at,
        finished_at: Utc::now(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnection;

    fn plan() -> Vec<Operation> {
        vec![
            Operation::execute("a", "Create table", "Create a", "CREATE TABLE `a` (`id` INT)"),
            Operation::execute(
                "b",
                "Create table",
                "Create b",
                vec!["-- b".to_string(), "CREATE TABLE `b` (`id` INT)".to_string()],
            ),
            Operation::execute("a", "Alter table", "Alter a", "ALTER TABLE `a` ADD COLUMN `x` INT"),
        ]
    }

    #[test]
    fn test_apply_plan() {
        let mut conn = MemoryConnection::new();
        let report = apply_plan(&plan(), &mut conn).unwrap();
        assert_eq!(report.operations, 3);
        assert_eq!(report.statements, 3);
        assert!(report.finished_at >= report.started_at);
        assert!(conn.has_table("a"));
        assert!(conn.has_table("b"));
    }

    #[test]
    fn test_apply_plan_is_fail_fast() {
        let mut conn = MemoryConnection::new().fail_on("CREATE TABLE `b`");
        let err = apply_plan(&plan(), &mut conn).unwrap_err();

        match err {
            EngineError::PlanAborted {
                applied,
                total,
                label,
                source,
            } => {
                assert_eq!(applied, 1);
                assert_eq!(total, 3);
                assert_eq!(label, "Create table");
                assert!(source.is_execution());
            }
            other => panic!("Expected PlanAborted, got {other:?}"),
        }
        // the first operation stays applied, the third never ran
        assert_eq!(conn.statements().len(), 1);
        assert!(conn.has_table("a"));
    }

    #[test]
    fn test_apply_empty_plan() {
        let mut conn = MemoryConnection::new();
        let report = apply_plan(&[], &mut conn).unwrap();
        assert_eq!(report.operations, 0);
        assert_eq!(report.statements, 0);
    }
}

//! # Schemata Planner
//!
//! Turns two schema snapshots into an ordered list of DDL operations and
//! applies them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemata_ir::load_snapshot;
//! use schemata_planner::{Planner, apply_plan};
//!
//! let old = load_snapshot("blog.v1.json", "blog")?;
//! let new = load_snapshot("blog.v2.json", "blog")?;
//!
//! let planner = Planner::mysql("blog");
//! for op in planner.plan_diff(Some(&old), &new) {
//!     println!("{}: {}", op.label, op.sql);
//! }
//! ```
//!
//! ## Ordering
//!
//! Creations come first, then drops, then the alterations of every table
//! present in both snapshots. Within a table: key drops, column drops,
//! column adds, column changes, key adds, key replacements.

pub mod executor;
pub mod memory;
pub mod operation;
pub mod ordering;
pub mod planner;

use serde::{Deserialize, Serialize};

pub use executor::{ApplyReport, apply_plan};
pub use memory::{CatalogTable, MemoryConnection};
pub use operation::{Operation, OperationKind, Sql};
pub use planner::Planner;

// ============================================================================
// Planner Configuration
// ============================================================================

/// Options that change how plans are ordered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Create referenced tables before the tables pointing at them, and
    /// drop in the opposite order
    pub order_by_foreign_keys: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            order_by_foreign_keys: true,
        }
    }
}

impl PlannerConfig {
    /// Enable or disable foreign key ordering
    pub fn with_foreign_key_ordering(mut self, enabled: bool) -> Self {
        self.order_by_foreign_keys = enabled;
        self
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

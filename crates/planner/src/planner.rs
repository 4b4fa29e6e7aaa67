//! The migration planner
//!
//! [`Planner`] compares two snapshots of one application and produces the
//! ordered operations that turn the old schema into the new one. Planning
//! is pure: only [`Planner::plan_root_install`] and
//! [`Planner::install_root_tables`] touch a connection.

use crate::PlannerConfig;
use crate::operation::Operation;
use crate::ordering::{creation_order, drop_order};
use schemata_core::{Connection, EngineResult, MySqlDialect, Quoter};
use schemata_ir::{Snapshot, Table};
use tracing::{debug, info};

// ============================================================================
// Planner
// ============================================================================

/// Computes migration plans for one application
#[derive(Debug, Clone)]
pub struct Planner<Q = MySqlDialect> {
    quoter: Q,
    app: String,
    config: PlannerConfig,
}

impl Planner<MySqlDialect> {
    /// Create a planner for the MySQL dialect with the default configuration
    pub fn mysql(app: impl Into<String>) -> Self {
        Self::new(MySqlDialect, app, PlannerConfig::default())
    }
}

impl<Q: Quoter> Planner<Q> {
    /// Create a planner
    pub fn new(quoter: Q, app: impl Into<String>, config: PlannerConfig) -> Self {
        Self {
            quoter,
            app: app.into(),
            config,
        }
    }

    /// Application name used in descriptions
    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    // ========================================================================
    // Install
    // ========================================================================

    /// Plan a fresh installation: one `CREATE TABLE` per application table
    pub fn plan_install(&self, new: &Snapshot) -> Vec<Operation> {
        let ops = self.create_all(new, false);
        info!(app = %self.app, operations = ops.len(), "Planned installation");
        ops
    }

    /// Plan the creation of missing shared tables
    ///
    /// Every table of every root entity is probed on its own, so a junction
    /// table added to an installed root entity is picked up, and a table
    /// that already exists is never created twice.
    pub fn plan_root_install(
        &self,
        conn: &mut dyn Connection,
        snapshot: &Snapshot,
    ) -> EngineResult<Vec<Operation>> {
        let mut missing = Vec::new();
        for entity in snapshot.root_entities() {
            for table in &entity.tables {
                let name = table.qualified_name();
                if conn.table_exists(&name)? {
                    debug!(entity = %entity.name, table = %name, "Root table already present");
                } else {
                    missing.push(table);
                }
            }
        }

        Ok(self
            .order_creates(missing)
            .into_iter()
            .map(|table| Operation::create(&self.quoter, table, &self.app, false))
            .collect())
    }

    /// Create missing shared tables on a live connection
    ///
    /// Returns `true` when at least one table was created. Running it again
    /// against the same database is a no-op.
    pub fn install_root_tables(
        &self,
        conn: &mut dyn Connection,
        snapshot: &Snapshot,
    ) -> EngineResult<bool> {
        let ops = self.plan_root_install(conn, snapshot)?;
        for op in &ops {
            op.apply(conn)?;
            info!(table = %op.table, "Created root table");
        }
        Ok(!ops.is_empty())
    }

    // ========================================================================
    // Diff
    // ========================================================================

    /// Plan the migration from `old` to `new`
    ///
    /// Without an old snapshot every application table is created with
    /// `IF NOT EXISTS`. Shared tables never take part in the diff.
    pub fn plan_diff(&self, old: Option<&Snapshot>, new: &Snapshot) -> Vec<Operation> {
        let Some(old) = old else {
            let ops = self.create_all(new, true);
            info!(app = %self.app, operations = ops.len(), "Planned bootstrap");
            return ops;
        };

        let mut ops = Vec::new();

        // tables only in the new snapshot
        let created: Vec<&Table> = new
            .app_tables()
            .filter(|(name, _)| old.app_table(name).is_none())
            .map(|(_, table)| table)
            .collect();
        for table in self.order_creates(created) {
            debug!(table = %table.qualified_name(), "Table added");
            ops.push(Operation::create(&self.quoter, table, &self.app, false));
        }

        // tables only in the old snapshot
        let dropped: Vec<&Table> = old
            .app_tables()
            .filter(|(name, _)| new.app_table(name).is_none())
            .map(|(_, table)| table)
            .collect();
        for table in self.order_drops(dropped) {
            debug!(table = %table.qualified_name(), "Table removed");
            ops.push(Operation::drop(&self.quoter, table, &self.app));
        }

        // tables in both
        for (name, table) in new.app_tables() {
            if let Some(previous) = old.app_table(name) {
                self.diff_table(previous, table, &mut ops);
            }
        }

        info!(app = %self.app, operations = ops.len(), "Planned migration");
        ops
    }

    /// Alter operations for one table present in both snapshots
    ///
    /// Key drops, column drops, column adds, column changes, key adds,
    /// then key replacements.
    fn diff_table(&self, old: &Table, new: &Table, ops: &mut Vec<Operation>) {
        let q = &self.quoter;
        let app = self.app.as_str();
        let before = ops.len();

        for name in old.keys.keys().filter(|k| !new.keys.contains_key(*k)) {
            ops.push(Operation::drop_key(q, new, app, name));
        }

        for name in old.fields.keys().filter(|f| !new.fields.contains_key(*f)) {
            ops.push(Operation::drop_column(q, new, app, name));
        }

        for (name, field) in &new.fields {
            if !old.fields.contains_key(name) {
                ops.push(Operation::add_column(q, new, app, field));
            }
        }

        for (name, field) in &new.fields {
            if let Some(previous) = old.fields.get(name) {
                if previous.render(q) != field.render(q) {
                    ops.push(Operation::change_column(q, new, app, field));
                }
            }
        }

        for (name, key) in &new.keys {
            if !old.keys.contains_key(name) {
                ops.push(Operation::add_key(q, new, app, key));
            }
        }

        for (name, key) in &new.keys {
            if let Some(previous) = old.keys.get(name) {
                if previous.render(q, &old.prefix) != key.render(q, &new.prefix) {
                    ops.push(Operation::drop_key(q, new, app, name));
                    ops.push(Operation::add_key(q, new, app, key));
                }
            }
        }

        if ops.len() > before {
            debug!(
                table = %new.qualified_name(),
                operations = ops.len() - before,
                "Table altered"
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn create_all(&self, snapshot: &Snapshot, if_not_exists: bool) -> Vec<Operation> {
        let tables: Vec<&Table> = snapshot.app_tables().map(|(_, t)| t).collect();
        self.order_creates(tables)
            .into_iter()
            .map(|table| Operation::create(&self.quoter, table, &self.app, if_not_exists))
            .collect()
    }

    fn order_creates<'a>(&self, tables: Vec<&'a Table>) -> Vec<&'a Table> {
        if self.config.order_by_foreign_keys {
            creation_order(tables)
        } else {
            tables
        }
    }

    fn order_drops<'a>(&self, tables: Vec<&'a Table>) -> Vec<&'a Table> {
        if self.config.order_by_foreign_keys {
            drop_order(tables)
        } else {
            tables
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnection;
    use crate::operation::{OperationKind, Sql};
    use pretty_assertions::assert_eq;
    use schemata_core::KeyKind;
    use schemata_ir::{AppConfig, EntityConfig, FieldConfig, JunctionConfig, KeyConfig, RelationConfig};

    fn posts() -> EntityConfig {
        EntityConfig::new("posts")
            .with_field("id", FieldConfig::new("INT").auto_increment())
            .with_field("title", FieldConfig::new("VARCHAR(255)").null("NOT NULL"))
            .with_key("PRIMARY", KeyConfig::new(KeyKind::Primary).fields(["id"]))
    }

    fn snapshot(app: &str, entities: Vec<EntityConfig>) -> Snapshot {
        Snapshot::from_config(&AppConfig::new(entities), app).unwrap()
    }

    fn sql(ops: &[Operation]) -> Vec<String> {
        ops.iter().map(|op| op.sql.to_string()).collect()
    }

    fn kinds(ops: &[Operation]) -> Vec<OperationKind> {
        ops.iter().map(|op| op.kind).collect()
    }

    #[test]
    fn test_install_scenario() {
        let planner = Planner::mysql("");
        let ops = planner.plan_install(&snapshot("", vec![posts()]));
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0].sql,
            Sql::Single(
                "CREATE TABLE `posts` (\n    `id` INT AUTO_INCREMENT,\n    `title` VARCHAR(255) NOT NULL,\n    PRIMARY KEY (`id`)\n)"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_add_column_scenario() {
        let planner = Planner::mysql("");
        let old = snapshot("", vec![posts()]);
        let new = snapshot("", vec![posts().with_field("body", FieldConfig::new("TEXT"))]);
        let ops = planner.plan_diff(Some(&old), &new);
        assert_eq!(sql(&ops), vec!["ALTER TABLE `posts` ADD COLUMN `body` TEXT"]);
        assert_eq!(ops[0].description, "Alter 'posts' add column for application ''");
    }

    #[test]
    fn test_identical_snapshots_give_empty_plan() {
        let planner = Planner::mysql("blog");
        let a = snapshot("blog", vec![posts()]);
        let b = snapshot("blog", vec![posts()]);
        assert!(planner.plan_diff(Some(&a), &b).is_empty());
    }

    #[test]
    fn test_bootstrap_uses_if_not_exists_and_skips_root() {
        let planner = Planner::mysql("blog");
        let users = EntityConfig::new("users")
            .root()
            .with_field("id", FieldConfig::new("INT"));
        let tagged = posts().with_relation(RelationConfig::multiple(
            JunctionConfig::new("posts_tags").with_field("post_id", FieldConfig::new("INT")),
        ));
        let ops = planner.plan_diff(None, &snapshot("blog", vec![users, tagged]));

        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.kind == OperationKind::CreateTable));
        assert!(ops[0].sql.to_string().starts_with("CREATE TABLE IF NOT EXISTS `blog_posts`"));
        assert!(ops[1].sql.to_string().starts_with("CREATE TABLE IF NOT EXISTS `blog_posts_tags`"));
        assert!(ops[0].sql.to_string().contains("PRIMARY KEY (`id`)"));
    }

    #[test]
    fn test_create_and_drop_tables() {
        let planner = Planner::mysql("blog");
        let tags = EntityConfig::new("tags").with_field("id", FieldConfig::new("INT"));
        let drafts = EntityConfig::new("drafts").with_field("id", FieldConfig::new("INT"));
        let old = snapshot("blog", vec![posts(), drafts]);
        let new = snapshot("blog", vec![posts(), tags]);

        let ops = planner.plan_diff(Some(&old), &new);
        assert_eq!(kinds(&ops), vec![OperationKind::CreateTable, OperationKind::DropTable]);
        assert!(ops[0].sql.to_string().starts_with("CREATE TABLE `blog_tags`"));
        assert_eq!(ops[1].sql.to_string(), "DROP TABLE `blog_drafts`");
        assert_eq!(ops[1].description, "Drop table 'drafts' for application 'blog'");
    }

    #[test]
    fn test_alter_order_within_table() {
        let planner = Planner::mysql("blog");
        let old = snapshot(
            "blog",
            vec![
                posts()
                    .with_field("legacy", FieldConfig::new("INT"))
                    .with_field("state", FieldConfig::new("VARCHAR(8)"))
                    .with_key("idx_legacy", KeyConfig::new(KeyKind::Static).fields(["legacy"]))
                    .with_key("idx_state", KeyConfig::new(KeyKind::Static).fields(["state"])),
            ],
        );
        let new = snapshot(
            "blog",
            vec![
                posts()
                    .with_field("state", FieldConfig::new("VARCHAR(16)"))
                    .with_field("body", FieldConfig::new("TEXT"))
                    .with_key("idx_state", KeyConfig::new(KeyKind::Static).fields(["state", "id"]))
                    .with_key("idx_body", KeyConfig::new(KeyKind::Static).fields(["body"])),
            ],
        );

        let ops = planner.plan_diff(Some(&old), &new);
        assert_eq!(
            sql(&ops),
            vec![
                "ALTER TABLE `blog_posts` DROP KEY `idx_legacy`",
                "ALTER TABLE `blog_posts` DROP COLUMN `legacy`",
                "ALTER TABLE `blog_posts` ADD COLUMN `body` TEXT",
                "ALTER TABLE `blog_posts` CHANGE COLUMN `state` `state` VARCHAR(16)",
                "ALTER TABLE `blog_posts` ADD KEY `idx_body` (`body`)",
                "ALTER TABLE `blog_posts` DROP KEY `idx_state`",
                "ALTER TABLE `blog_posts` ADD KEY `idx_state` (`state`,`id`)",
            ]
        );
        assert!(ops.iter().all(|op| op.label == "Alter table"));
    }

    #[test]
    fn test_changed_foreign_key_is_replaced() {
        let planner = Planner::mysql("blog");
        let comments = |target: &str| {
            EntityConfig::new("comments")
                .with_field("id", FieldConfig::new("INT"))
                .with_field("parent_id", FieldConfig::new("INT"))
                .with_key(
                    "fk_parent",
                    KeyConfig::new(KeyKind::Foreign)
                        .fields(["parent_id"])
                        .references(target, ["id"]),
                )
        };
        let old = snapshot("blog", vec![posts(), comments("posts")]);
        let new = snapshot("blog", vec![posts(), comments("comments")]);

        let ops = planner.plan_diff(Some(&old), &new);
        assert_eq!(kinds(&ops), vec![OperationKind::DropKey, OperationKind::AddKey]);
        assert_eq!(
            ops[1].sql.to_string(),
            "ALTER TABLE `blog_comments` ADD CONSTRAINT `fk_parent` FOREIGN KEY (`parent_id`) REFERENCES `blog_comments` (`id`) ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_root_tables_are_not_diffed() {
        let planner = Planner::mysql("blog");
        let users = |ty: &str| {
            EntityConfig::new("users")
                .root()
                .with_field("id", FieldConfig::new(ty))
        };
        let old = snapshot("blog", vec![users("INT")]);
        let new = snapshot("blog", vec![users("BIGINT")]);
        assert!(planner.plan_diff(Some(&old), &new).is_empty());
    }

    #[test]
    fn test_foreign_key_ordering_of_creates() {
        let comments = EntityConfig::new("comments")
            .with_field("post_id", FieldConfig::new("INT"))
            .with_key(
                "fk_post",
                KeyConfig::new(KeyKind::Foreign)
                    .fields(["post_id"])
                    .references("posts", ["id"]),
            );
        let new = snapshot("blog", vec![comments, posts()]);

        let ordered = Planner::mysql("blog").plan_install(&new);
        let tables: Vec<&str> = ordered.iter().map(|op| op.table.as_str()).collect();
        assert_eq!(tables, vec!["blog_posts", "blog_comments"]);

        let config = PlannerConfig::default().with_foreign_key_ordering(false);
        let unordered = Planner::new(MySqlDialect, "blog", config).plan_install(&new);
        let tables: Vec<&str> = unordered.iter().map(|op| op.table.as_str()).collect();
        assert_eq!(tables, vec!["blog_comments", "blog_posts"]);
    }

    /// Assert that the catalog holds exactly the application tables of `snapshot`
    fn assert_catalog_matches(conn: &MemoryConnection, snapshot: &Snapshot) {
        let mut expected: Vec<&str> = snapshot.app_tables().map(|(name, _)| name).collect();
        let mut actual: Vec<&str> = conn.tables().collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);

        for (name, table) in snapshot.app_tables() {
            let catalog = conn.table(name).unwrap();

            let mut columns: Vec<&str> = catalog.columns().collect();
            let mut fields: Vec<&str> = table.fields.keys().map(String::as_str).collect();
            columns.sort();
            fields.sort();
            assert_eq!(columns, fields, "columns of {name}");
            for field in table.fields.values() {
                assert_eq!(
                    catalog.column(&field.name),
                    Some(field.render(&MySqlDialect).as_str()),
                    "definition of {name}.{}",
                    field.name
                );
            }

            let mut keys: Vec<&str> = catalog.keys().collect();
            let mut declared: Vec<&str> = table.keys.keys().map(String::as_str).collect();
            keys.sort();
            declared.sort();
            assert_eq!(keys, declared, "keys of {name}");
            for (key_name, key) in &table.keys {
                assert_eq!(
                    catalog.key_columns(key_name),
                    Some(key.columns.as_slice()),
                    "columns of key {name}.{key_name}"
                );
            }
        }
    }

    #[test]
    fn test_plan_replays_to_new_schema() {
        let planner = Planner::mysql("blog");
        let tags = EntityConfig::new("tags").with_field("id", FieldConfig::new("INT"));
        let comments = EntityConfig::new("comments")
            .with_field("id", FieldConfig::new("INT"))
            .with_field("post_id", FieldConfig::new("INT"))
            .with_key("PRIMARY", KeyConfig::new(KeyKind::Primary).fields(["id"]))
            .with_key(
                "fk_post",
                KeyConfig::new(KeyKind::Foreign)
                    .fields(["post_id"])
                    .references("posts", ["id"]),
            );
        let old = snapshot(
            "blog",
            vec![
                posts()
                    .with_field("legacy", FieldConfig::new("INT"))
                    .with_field("state", FieldConfig::new("VARCHAR(8)"))
                    .with_key("idx_legacy", KeyConfig::new(KeyKind::Static).fields(["legacy"]))
                    .with_key("idx_state", KeyConfig::new(KeyKind::Static).fields(["state"])),
                tags,
            ],
        );
        let new = snapshot(
            "blog",
            vec![
                comments,
                posts()
                    .with_field("state", FieldConfig::new("VARCHAR(16)").null("NOT NULL"))
                    .with_field("body", FieldConfig::new("TEXT"))
                    .with_key("idx_state", KeyConfig::new(KeyKind::Static).fields(["state", "id"]))
                    .with_key("uniq_body", KeyConfig::new(KeyKind::Unique).fields(["body"])),
            ],
        );

        let mut conn = MemoryConnection::new();
        for op in planner.plan_install(&old) {
            op.apply(&mut conn).unwrap();
        }
        assert_catalog_matches(&conn, &old);

        let plan = planner.plan_diff(Some(&old), &new);
        assert_eq!(
            kinds(&plan),
            vec![
                OperationKind::CreateTable,
                OperationKind::DropTable,
                OperationKind::DropKey,
                OperationKind::DropColumn,
                OperationKind::AddColumn,
                OperationKind::ChangeColumn,
                OperationKind::AddKey,
                OperationKind::DropKey,
                OperationKind::AddKey,
            ]
        );
        for op in &plan {
            op.apply(&mut conn).unwrap();
        }
        assert_catalog_matches(&conn, &new);
    }

    #[test]
    fn test_misordered_plan_fails_on_replay() {
        let planner = Planner::mysql("blog");
        let old = snapshot("blog", vec![posts()]);
        let new = snapshot(
            "blog",
            vec![
                posts()
                    .with_field("body", FieldConfig::new("TEXT"))
                    .with_key("idx_body", KeyConfig::new(KeyKind::Static).fields(["body"])),
            ],
        );

        let mut conn = MemoryConnection::new();
        for op in planner.plan_install(&old) {
            op.apply(&mut conn).unwrap();
        }

        // indexing the column before adding it is rejected by the catalog
        let mut plan = planner.plan_diff(Some(&old), &new);
        assert_eq!(kinds(&plan), vec![OperationKind::AddColumn, OperationKind::AddKey]);
        plan.reverse();
        assert!(plan[0].apply(&mut conn).unwrap_err().is_execution());
    }

    #[test]
    fn test_install_root_tables_is_idempotent() {
        let planner = Planner::mysql("blog");
        let users = EntityConfig::new("users")
            .root()
            .with_field("id", FieldConfig::new("INT"));
        let snapshot = snapshot("blog", vec![users, posts()]);

        let mut conn = MemoryConnection::new();
        assert!(planner.install_root_tables(&mut conn, &snapshot).unwrap());
        assert!(conn.has_table("users"));
        assert!(!conn.has_table("blog_posts"));
        assert_eq!(conn.statements().len(), 1);
        assert!(conn.statements()[0].starts_with("CREATE TABLE `users`"));

        assert!(!planner.install_root_tables(&mut conn, &snapshot).unwrap());
        assert_eq!(conn.statements().len(), 1);
    }

    fn users_with_roles() -> EntityConfig {
        EntityConfig::new("users")
            .root()
            .with_field("id", FieldConfig::new("INT"))
            .with_relation(RelationConfig::multiple(
                JunctionConfig::new("users_roles").with_field("user_id", FieldConfig::new("INT")),
            ))
    }

    #[test]
    fn test_install_root_creates_missing_junction_table() {
        let planner = Planner::mysql("blog");
        let snapshot = snapshot("blog", vec![users_with_roles()]);

        let mut conn = MemoryConnection::new().with_table("users");
        assert!(planner.install_root_tables(&mut conn, &snapshot).unwrap());
        assert!(conn.has_table("users_roles"));
        assert_eq!(conn.statements().len(), 1);
        assert!(conn.statements()[0].starts_with("CREATE TABLE `users_roles`"));
    }

    #[test]
    fn test_install_root_skips_existing_junction_table() {
        let planner = Planner::mysql("blog");
        let snapshot = snapshot("blog", vec![users_with_roles()]);

        let mut conn = MemoryConnection::new().with_table("users_roles");
        let ops = planner.plan_root_install(&mut conn, &snapshot).unwrap();
        let tables: Vec<&str> = ops.iter().map(|op| op.table.as_str()).collect();
        assert_eq!(tables, vec!["users"]);

        assert!(planner.install_root_tables(&mut conn, &snapshot).unwrap());
        assert!(conn.has_table("users"));
        assert!(!planner.install_root_tables(&mut conn, &snapshot).unwrap());
    }
}

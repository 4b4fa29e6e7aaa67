//! Schema snapshots
//!
//! A [`Snapshot`] is every entity of one configuration version together
//! with a flat index from physical table name to table. Entities live in
//! an arena; the index stores positions into it, so building the index
//! never clones or mutates a table.

use crate::config::AppConfig;
use crate::entity::Entity;
use crate::table::Table;
use indexmap::IndexMap;
use schemata_core::EngineResult;
use tracing::{debug, warn};

/// Position of a table inside the entity arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId {
    pub entity: usize,
    pub table: usize,
}

/// Immutable view of one configuration version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    app: String,
    entities: Vec<Entity>,
    index: IndexMap<String, TableId>,
    duplicates: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from an application configuration
    ///
    /// Entities are constructed in declaration order; the first invalid
    /// entity aborts the build.
    pub fn from_config(config: &AppConfig, app: &str) -> EngineResult<Self> {
        let entities = config
            .orm
            .iter()
            .map(|spec| Entity::from_config(spec, app))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self::from_entities(app, entities))
    }

    /// Build a snapshot from already constructed entities
    pub fn from_entities(app: impl Into<String>, entities: Vec<Entity>) -> Self {
        let mut index = IndexMap::new();
        let mut duplicates = Vec::new();

        for (e, entity) in entities.iter().enumerate() {
            for (t, table) in entity.tables.iter().enumerate() {
                let name = table.qualified_name();
                let id = TableId {
                    entity: e,
                    table: t,
                };
                if index.insert(name.clone(), id).is_some() {
                    warn!(table = %name, entity = %entity.name, "Duplicate table name, later definition wins");
                    duplicates.push(name);
                }
            }
        }

        debug!(entities = entities.len(), tables = index.len(), "Built snapshot");

        Self {
            app: app.into(),
            entities,
            index,
            duplicates,
        }
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Application name the snapshot was built for
    pub fn app(&self) -> &str {
        &self.app
    }

    /// All entities in declaration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Shared entities
    pub fn root_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_root())
    }

    /// Look up a table by physical name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.index.get(name).map(|id| self.resolve(*id))
    }

    /// Check if a table with this physical name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every table, keyed by physical name, in declaration order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.index
            .iter()
            .map(|(name, id)| (name.as_str(), self.resolve(*id)))
    }

    /// Tables of application-scoped entities
    ///
    /// This is the index the planner diffs; shared tables are left to
    /// root installation.
    pub fn app_tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.index
            .iter()
            .filter(|(_, id)| !self.entities[id.entity].is_root())
            .map(|(name, id)| (name.as_str(), self.resolve(*id)))
    }

    /// Look up an application-scoped table by physical name
    pub fn app_table(&self, name: &str) -> Option<&Table> {
        let id = self.index.get(name)?;
        if self.entities[id.entity].is_root() {
            None
        } else {
            Some(self.resolve(*id))
        }
    }

    /// Entity owning the table with this physical name
    pub fn owner(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|id| &self.entities[id.entity])
    }

    /// Physical names declared more than once
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Number of distinct tables
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the snapshot has no tables
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn resolve(&self, id: TableId) -> &Table {
        &self.entities[id.entity].tables[id.table]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, FieldConfig, JunctionConfig, RelationConfig};

    fn config() -> AppConfig {
        AppConfig::default()
            .with_entity(
                EntityConfig::new("users")
                    .root()
                    .with_field("id", FieldConfig::new("INT")),
            )
            .with_entity(
                EntityConfig::new("posts")
                    .with_field("id", FieldConfig::new("INT"))
                    .with_relation(RelationConfig::multiple(
                        JunctionConfig::new("posts_tags")
                            .with_field("post_id", FieldConfig::new("INT")),
                    )),
            )
            .with_entity(EntityConfig::new("tags").with_field("id", FieldConfig::new("INT")))
    }

    #[test]
    fn test_index_in_declaration_order() {
        let snapshot = Snapshot::from_config(&config(), "blog").unwrap();
        let names: Vec<&str> = snapshot.tables().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["users", "blog_posts", "blog_posts_tags", "blog_tags"]);
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.app(), "blog");
    }

    #[test]
    fn test_app_tables_exclude_root() {
        let snapshot = Snapshot::from_config(&config(), "blog").unwrap();
        let names: Vec<&str> = snapshot.app_tables().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["blog_posts", "blog_posts_tags", "blog_tags"]);
        assert!(snapshot.app_table("users").is_none());
        assert!(snapshot.table("users").is_some());
        assert_eq!(snapshot.root_entities().count(), 1);
        assert_eq!(snapshot.owner("blog_posts_tags").unwrap().name, "posts");
    }

    #[test]
    fn test_invalid_entity_aborts_build() {
        let config = config().with_entity(EntityConfig::default());
        assert!(Snapshot::from_config(&config, "blog").is_err());
    }

    #[test]
    fn test_duplicate_table_later_wins() {
        let config = AppConfig::default()
            .with_entity(EntityConfig::new("posts").with_field("id", FieldConfig::new("INT")))
            .with_entity(EntityConfig::new("posts").with_field("id", FieldConfig::new("BIGINT")));
        let snapshot = Snapshot::from_config(&config, "").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.duplicates(), &["posts".to_string()]);
        assert_eq!(snapshot.table("posts").unwrap().fields["id"].sql_type, "BIGINT");
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::from_config(&AppConfig::default(), "blog").unwrap();
        assert!(snapshot.is_empty());
    }
}

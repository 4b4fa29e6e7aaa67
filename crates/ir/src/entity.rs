//! Entity descriptors
//!
//! An [`Entity`] is one logical resource from the application
//! configuration. It owns its primary table and one junction table per
//! multi-valued relation.

use crate::config::{EntityConfig, RelationConfig};
use crate::table::Table;
use schemata_core::{EngineError, EngineResult, Validatable};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Entity Scope
// ============================================================================

/// Whether an entity's tables are shared or belong to one application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityScope {
    /// Shared, unprefixed, created once by root installation
    Root,
    /// Prefixed with the application name
    #[default]
    App,
}

impl EntityScope {
    /// Table prefix for this scope
    pub fn prefix(&self, app: &str) -> String {
        match self {
            EntityScope::Root => String::new(),
            EntityScope::App if app.is_empty() => String::new(),
            EntityScope::App => format!("{app}_"),
        }
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A logical resource and the tables derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name, also the name of its primary table
    pub name: String,

    pub scope: EntityScope,

    pub description: Option<String>,

    /// Relation specifications, kept for descriptive output
    pub relations: Vec<RelationConfig>,

    /// Primary table first, then junction tables in relation order
    pub tables: Vec<Table>,
}

impl Entity {
    /// Build an entity and its tables from configuration
    ///
    /// Fails with an invalid-entity error when the name or the options are
    /// missing, or when a junction table has no name.
    pub fn from_config(config: &EntityConfig, app: &str) -> EngineResult<Self> {
        config.validate()?;

        let (Some(name), Some(options)) = (config.name.as_deref(), config.options.as_ref()) else {
            return Err(EngineError::internal("validated entity lost its name or options"));
        };
        let name = name.trim().to_string();

        let scope = if config.root {
            EntityScope::Root
        } else {
            EntityScope::App
        };
        let prefix = scope.prefix(app);

        let mut tables = vec![Table::from_config(&name, &prefix, options, &config.keys)];

        for relation in &config.relations {
            let Some(junction) = &relation.multiple else {
                continue;
            };
            let junction_name = junction.name.as_deref().map(str::trim).unwrap_or_default();
            debug!(entity = %name, junction = %junction_name, "Adding junction table");
            tables.push(Table::from_config(
                junction_name,
                &prefix,
                &junction.options,
                &junction.keys,
            ));
        }

        Ok(Self {
            name,
            scope,
            description: config.description.clone(),
            relations: config.relations.clone(),
            tables,
        })
    }

    /// Check if this is a shared entity
    pub fn is_root(&self) -> bool {
        self.scope == EntityScope::Root
    }

    /// The entity's own table
    pub fn primary_table(&self) -> Option<&Table> {
        self.tables.first()
    }

    /// Tables generated from multi-valued relations
    pub fn junction_tables(&self) -> &[Table] {
        self.tables.get(1..).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, JunctionConfig, KeyConfig};
    use schemata_core::KeyKind;

    fn posts() -> EntityConfig {
        EntityConfig::new("posts")
            .with_field("id", FieldConfig::new("INT").auto_increment())
            .with_field("title", FieldConfig::new("VARCHAR(255)").null("NOT NULL"))
            .with_key("PRIMARY", KeyConfig::new(KeyKind::Primary).fields(["id"]))
    }

    #[test]
    fn test_app_entity_is_prefixed() {
        let entity = Entity::from_config(&posts(), "blog").unwrap();
        assert_eq!(entity.scope, EntityScope::App);
        assert_eq!(entity.tables.len(), 1);
        assert_eq!(entity.tables[0].qualified_name(), "blog_posts");
    }

    #[test]
    fn test_app_entity_without_app_name() {
        let entity = Entity::from_config(&posts(), "").unwrap();
        assert_eq!(entity.tables[0].qualified_name(), "posts");
    }

    #[test]
    fn test_root_entity_ignores_app_prefix() {
        let entity = Entity::from_config(&posts().root(), "blog").unwrap();
        assert!(entity.is_root());
        assert_eq!(entity.tables[0].prefix, "");
        assert_eq!(entity.tables[0].qualified_name(), "posts");
    }

    #[test]
    fn test_junction_tables_share_prefix() {
        let config = posts()
            .with_relation(RelationConfig::default().with_extra("entity", "authors".into()))
            .with_relation(RelationConfig::multiple(
                JunctionConfig::new("posts_tags")
                    .with_field("post_id", FieldConfig::new("INT"))
                    .with_field("tag_id", FieldConfig::new("INT"))
                    .with_key(
                        "PRIMARY",
                        KeyConfig::new(KeyKind::Primary).fields(["post_id", "tag_id"]),
                    ),
            ));
        let entity = Entity::from_config(&config, "blog").unwrap();

        assert_eq!(entity.tables.len(), 2);
        assert_eq!(entity.relations.len(), 2);
        let junction = &entity.junction_tables()[0];
        assert_eq!(junction.qualified_name(), "blog_posts_tags");
        assert_eq!(junction.fields.len(), 2);
        assert_eq!(entity.primary_table().unwrap().name, "posts");
    }

    #[test]
    fn test_missing_name_or_options_fails() {
        let no_options = EntityConfig {
            name: Some("posts".into()),
            ..Default::default()
        };
        let err = Entity::from_config(&no_options, "blog").unwrap_err();
        assert!(matches!(err, EngineError::InvalidEntity { .. }));

        let no_name = EntityConfig {
            name: None,
            ..posts()
        };
        assert!(Entity::from_config(&no_name, "blog").is_err());
    }
}

//! Application configuration as read from disk
//!
//! These structs mirror the `orm` section of an application configuration
//! one-to-one. They are plain serde data; turning them into tables is the
//! job of [`Entity::from_config`](crate::Entity::from_config).
//!
//! ```json
//! {
//!   "orm": [
//!     {
//!       "name": "posts",
//!       "options": {
//!         "id": { "type": "INT", "auto_increment": true },
//!         "title": { "type": "VARCHAR(255)", "null": "NOT NULL" }
//!       },
//!       "keys": { "PRIMARY": { "type": "PRIMARY", "fields": ["id"] } }
//!     }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use schemata_core::{
    DefaultValue, EngineError, EngineResult, KeyKind, Nullability, Validatable,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// AppConfig
// ============================================================================

/// One version of an application's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity specifications, in declaration order
    #[serde(default)]
    pub orm: Vec<EntityConfig>,
}

impl AppConfig {
    /// Create a configuration from a list of entities
    pub fn new(orm: Vec<EntityConfig>) -> Self {
        Self { orm }
    }

    /// Add an entity using builder pattern
    pub fn with_entity(mut self, entity: EntityConfig) -> Self {
        self.orm.push(entity);
        self
    }
}

// ============================================================================
// EntityConfig
// ============================================================================

/// Specification of one entity
///
/// `name` and `options` are optional here so that a missing value can be
/// reported as an invalid entity instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Shared table without application prefix
    #[serde(default)]
    pub root: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Column name to column specification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, FieldConfig>>,

    /// Key name to key specification
    #[serde(default)]
    pub keys: IndexMap<String, KeyConfig>,

    #[serde(default)]
    pub relations: Vec<RelationConfig>,
}

impl EntityConfig {
    /// Create a new entity specification with an empty column set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            options: Some(IndexMap::new()),
            ..Default::default()
        }
    }

    /// Mark the entity as root (shared, unprefixed)
    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a column
    pub fn with_field(mut self, name: impl Into<String>, field: FieldConfig) -> Self {
        self.options
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), field);
        self
    }

    /// Add a key
    pub fn with_key(mut self, name: impl Into<String>, key: KeyConfig) -> Self {
        self.keys.insert(name.into(), key);
        self
    }

    /// Add a relation
    pub fn with_relation(mut self, relation: RelationConfig) -> Self {
        self.relations.push(relation);
        self
    }

    /// Name used in error messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

impl Validatable for EntityConfig {
    fn validate(&self) -> EngineResult<()> {
        match self.name.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(EngineError::invalid_entity(
                    self.display_name(),
                    "Name of entity is missing",
                ));
            }
            Some(_) => {}
        }

        if self.options.is_none() {
            return Err(EngineError::invalid_entity(
                self.display_name(),
                "Entity has no \"options\"",
            ));
        }

        for relation in &self.relations {
            relation.validate().map_err(|e| {
                EngineError::invalid_entity(self.display_name(), e.to_string())
            })?;
        }

        Ok(())
    }
}

// ============================================================================
// FieldConfig
// ============================================================================

/// Specification of one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Raw SQL type; empty disables the column
    #[serde(rename = "type", default)]
    pub sql_type: String,

    #[serde(default, skip_serializing_if = "is_unset")]
    pub null: Nullability,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_increment: bool,
}

fn is_unset(null: &Nullability) -> bool {
    !null.is_set()
}

impl FieldConfig {
    /// Create a column specification with the given SQL type
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            ..Default::default()
        }
    }

    /// Set the nullability clause
    pub fn null(mut self, null: impl Into<Nullability>) -> Self {
        self.null = null.into();
        self
    }

    /// Set the default value
    pub fn default_value(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Enable auto increment
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

// ============================================================================
// KeyConfig
// ============================================================================

/// Specification of one index or constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(rename = "type", default)]
    pub kind: KeyKind,

    /// Indexed columns
    #[serde(default)]
    pub fields: Vec<String>,

    /// Target of a foreign key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceConfig>,
}

impl KeyConfig {
    /// Create a key specification
    pub fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Set the indexed columns
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the foreign key target
    pub fn references<I, S>(mut self, entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = Some(ReferenceConfig {
            entity: entity.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Target entity and columns of a foreign key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

// ============================================================================
// RelationConfig
// ============================================================================

/// A relation declared on an entity
///
/// Only `multiple` has meaning to the engine; every other member is kept
/// as-is for descriptive output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Junction table for a multi-valued relation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<JunctionConfig>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RelationConfig {
    /// Create a relation with a junction table
    pub fn multiple(junction: JunctionConfig) -> Self {
        Self {
            multiple: Some(junction),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach a descriptive member
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl Validatable for RelationConfig {
    fn validate(&self) -> EngineResult<()> {
        if let Some(junction) = &self.multiple {
            if junction.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(EngineError::validation(
                    "Junction table of relation has no name",
                ));
            }
        }
        Ok(())
    }
}

/// Specification of a junction table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JunctionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub options: IndexMap<String, FieldConfig>,

    #[serde(default)]
    pub keys: IndexMap<String, KeyConfig>,
}

impl JunctionConfig {
    /// Create a junction table specification
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Add a column
    pub fn with_field(mut self, name: impl Into<String>, field: FieldConfig) -> Self {
        self.options.insert(name.into(), field);
        self
    }

    /// Add a key
    pub fn with_key(mut self, name: impl Into<String>, key: KeyConfig) -> Self {
        self.keys.insert(name.into(), key);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Validation rules for schema snapshots
//!
//! Snapshot construction only rejects entities that cannot be built at
//! all. The rules here catch configurations that build fine but would
//! render DDL the database is likely to reject.

use crate::snapshot::Snapshot;
use schemata_core::{EngineError, EngineResult, KeyKind};
use tracing::{debug, warn};

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a failed validation result with an error
    pub fn error(error: ValidationError) -> Self {
        let mut result = Self::ok();
        result.add_error(error);
        result
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to EngineResult (fails if any errors)
    pub fn to_result(self) -> EngineResult<()> {
        if self.valid {
            Ok(())
        } else {
            let msg = self
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Err(EngineError::validation(msg))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: ValidationErrorCode,

    pub message: String,

    /// Path to the problematic element (e.g., "blog_posts.keys.fk_author")
    pub path: Option<String>,

    /// Name of the rule that reported it
    pub rule: Option<&'static str>,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            rule: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    DuplicateTableName,
    NoFields,
    ForeignKeyMissingReference,
}

// ============================================================================
// ValidationWarning
// ============================================================================

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub code: ValidationWarningCode,

    pub message: String,

    pub path: Option<String>,

    pub rule: Option<&'static str>,
}

impl ValidationWarning {
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            rule: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    UndeclaredKeyColumn,
    MissingForeignTarget,
    DisabledColumn,
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait for validation rules
pub trait ValidationRule {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Validate a snapshot and return the result
    fn validate(&self, snapshot: &Snapshot) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Snapshot validator that runs multiple validation rules
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with default rules
    pub fn with_default_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(DuplicateTablesRule));
        validator.add_rule(Box::new(TableFieldsRule));
        validator.add_rule(Box::new(KeyColumnsRule));
        validator.add_rule(Box::new(ForeignKeysRule));
        validator
    }

    /// Add a validation rule
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Validate a snapshot with all rules
    ///
    /// Every error and warning is tagged with the name of its rule.
    pub fn validate(&self, snapshot: &Snapshot) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            debug!(rule = rule.name(), "{}", rule.description());
            let mut found = rule.validate(snapshot);
            for error in &mut found.errors {
                error.rule = Some(rule.name());
            }
            for warning in &mut found.warnings {
                warning.rule = Some(rule.name());
            }
            result.merge(found);
        }
        result
    }
}

/// Run the default rules and log every warning
pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationResult {
    let result = Validator::with_default_rules().validate(snapshot);
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    result
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: one definition per physical table name
pub struct DuplicateTablesRule;

impl ValidationRule for DuplicateTablesRule {
    fn name(&self) -> &'static str {
        "duplicate_tables"
    }

    fn description(&self) -> &'static str {
        "Validates that no two tables share a physical name"
    }

    fn validate(&self, snapshot: &Snapshot) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for name in snapshot.duplicates() {
            result.add_error(
                ValidationError::new(
                    ValidationErrorCode::DuplicateTableName,
                    format!("Table '{}' is declared more than once", name),
                )
                .with_path(name.clone()),
            );
        }
        result
    }
}

/// Rule: tables have columns; disabled columns are reported
pub struct TableFieldsRule;

impl ValidationRule for TableFieldsRule {
    fn name(&self) -> &'static str {
        "table_fields"
    }

    fn description(&self) -> &'static str {
        "Validates that every table has at least one column"
    }

    fn validate(&self, snapshot: &Snapshot) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for (name, table) in snapshot.tables() {
            if table.fields.is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::NoFields,
                        format!("Table '{}' has no columns", name),
                    )
                    .with_path(name.to_string()),
                );
            }

            for column in &table.disabled {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::DisabledColumn,
                        format!("Column '{}' has an empty type and is skipped", column),
                    )
                    .with_path(format!("{}.options.{}", name, column)),
                );
            }
        }

        result
    }
}

/// Rule: key columns are declared columns of the same table
pub struct KeyColumnsRule;

impl ValidationRule for KeyColumnsRule {
    fn name(&self) -> &'static str {
        "key_columns"
    }

    fn description(&self) -> &'static str {
        "Validates that every key indexes declared columns"
    }

    fn validate(&self, snapshot: &Snapshot) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for (name, table) in snapshot.tables() {
            for key in table.keys.values() {
                for column in &key.columns {
                    if !table.fields.contains_key(column) {
                        result.add_warning(
                            ValidationWarning::new(
                                ValidationWarningCode::UndeclaredKeyColumn,
                                format!(
                                    "Key '{}' uses column '{}' which is not declared",
                                    key.name, column
                                ),
                            )
                            .with_path(format!("{}.keys.{}", name, key.name)),
                        );
                    }
                }
            }
        }

        result
    }
}

/// Rule: foreign keys have a reference that resolves within the snapshot
pub struct ForeignKeysRule;

impl ValidationRule for ForeignKeysRule {
    fn name(&self) -> &'static str {
        "foreign_keys"
    }

    fn description(&self) -> &'static str {
        "Validates foreign key references"
    }

    fn validate(&self, snapshot: &Snapshot) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for (name, table) in snapshot.tables() {
            for key in table.keys.values().filter(|k| k.kind == KeyKind::Foreign) {
                let path = format!("{}.keys.{}", name, key.name);

                if key.target_entity().is_none() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::ForeignKeyMissingReference,
                            format!("Foreign key '{}' has no referenced entity", key.name),
                        )
                        .with_path(path),
                    );
                }
            }

            for target in table.foreign_targets() {
                if !snapshot.contains(&target) {
                    result.add_warning(
                        ValidationWarning::new(
                            ValidationWarningCode::MissingForeignTarget,
                            format!("Referenced table '{}' is not part of this configuration", target),
                        )
                        .with_path(name.to_string()),
                    );
                }
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, EntityConfig, FieldConfig, KeyConfig};

    fn snapshot(config: AppConfig) -> Snapshot {
        Snapshot::from_config(&config, "blog").unwrap()
    }

    fn posts() -> EntityConfig {
        EntityConfig::new("posts")
            .with_field("id", FieldConfig::new("INT").auto_increment())
            .with_key("PRIMARY", KeyConfig::new(KeyKind::Primary).fields(["id"]))
    }

    #[test]
    fn test_validation_result_merge() {
        let mut result1 = ValidationResult::ok();
        let result2 = ValidationResult::error(ValidationError::new(
            ValidationErrorCode::NoFields,
            "Error",
        ));

        result1.merge(result2);
        assert!(!result1.valid);
        assert!(result1.has_errors());
        assert!(result1.to_result().is_err());
    }

    #[test]
    fn test_valid_snapshot() {
        let result = validate_snapshot(&snapshot(AppConfig::default().with_entity(posts())));
        assert!(result.valid);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_duplicate_tables() {
        let result = validate_snapshot(&snapshot(
            AppConfig::default().with_entity(posts()).with_entity(posts()),
        ));
        assert!(!result.valid);
        assert_eq!(result.errors[0].code, ValidationErrorCode::DuplicateTableName);
        assert_eq!(result.errors[0].path.as_deref(), Some("blog_posts"));
        assert_eq!(result.errors[0].rule, Some("duplicate_tables"));
    }

    #[test]
    fn test_empty_table_and_disabled_column() {
        let config = AppConfig::default()
            .with_entity(EntityConfig::new("empty").with_field("gone", FieldConfig::new("")));
        let result = validate_snapshot(&snapshot(config));

        assert!(result.errors.iter().any(|e| e.code == ValidationErrorCode::NoFields));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == ValidationWarningCode::DisabledColumn)
        );
    }

    #[test]
    fn test_undeclared_key_column() {
        let config = AppConfig::default().with_entity(
            posts().with_key("idx_slug", KeyConfig::new(KeyKind::Static).fields(["slug"])),
        );
        let result = validate_snapshot(&snapshot(config));
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.warnings[0].code,
            ValidationWarningCode::UndeclaredKeyColumn
        );
        assert_eq!(result.warnings[0].rule, Some("key_columns"));
    }

    #[test]
    fn test_foreign_keys() {
        let comments = EntityConfig::new("comments")
            .with_field("id", FieldConfig::new("INT"))
            .with_field("post_id", FieldConfig::new("INT"))
            .with_key(
                "fk_post",
                KeyConfig::new(KeyKind::Foreign)
                    .fields(["post_id"])
                    .references("posts", ["id"]),
            )
            .with_key(
                "fk_user",
                KeyConfig::new(KeyKind::Foreign)
                    .fields(["post_id"])
                    .references("users", ["id"]),
            )
            .with_key("fk_broken", KeyConfig::new(KeyKind::Foreign).fields(["id"]));
        let result = validate_snapshot(&snapshot(
            AppConfig::default().with_entity(posts()).with_entity(comments),
        ));

        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].code,
            ValidationErrorCode::ForeignKeyMissingReference
        );
        let missing: Vec<&str> = result
            .warnings
            .iter()
            .filter(|w| w.code == ValidationWarningCode::MissingForeignTarget)
            .map(|w| w.message.as_str())
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].contains("blog_users"));
    }
}

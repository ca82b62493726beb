//! Entity definitions: base fields merged with entity-specific fields.

use crate::compile::{StorageIndexSpec, compile_storage_schema, compile_validation_schema};
use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldDefinition, FieldSet};
use crate::rules;
use crate::validate::ValidationSchema;
use regex::Regex;
use stash_types::{CREATED_AT, ID, UPDATED_AT, is_base_field};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("invalid identifier regex"));

/// The three fields every entity inherits.
#[must_use]
pub fn base_fields() -> FieldSet {
    let mut fields = FieldSet::new();
    let base = [
        (ID, FieldDefinition::surrogate_key()),
        (
            CREATED_AT,
            FieldDefinition::date_time()
                .indexed()
                .required()
                .validate(rules::date("Created at")),
        ),
        (
            UPDATED_AT,
            FieldDefinition::date_time()
                .indexed()
                .required()
                .validate(rules::date("Updated at")),
        ),
    ];
    for (name, def) in base {
        // Names are distinct constants.
        let _ = fields.insert(name, def);
    }
    fields
}

/// The full description of one entity type.
#[derive(Debug, Clone)]
pub struct EntityDefinition {
    name: String,
    label: String,
    fields: FieldSet,
}

impl EntityDefinition {
    /// Starts a definition for the table `name`, shown to users as `label`.
    pub fn builder(name: impl Into<String>, label: impl Into<String>) -> EntityDefinitionBuilder {
        EntityDefinitionBuilder {
            name: name.into(),
            label: label.into(),
            fields: Vec::new(),
        }
    }

    /// Storage name of the entity type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name used in validation messages.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Base fields followed by entity-specific fields.
    #[must_use]
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    #[must_use]
    pub fn storage_schema(&self) -> StorageIndexSpec {
        compile_storage_schema(&self.fields)
    }

    #[must_use]
    pub fn validation_schema(&self) -> ValidationSchema {
        compile_validation_schema(&self.fields)
    }
}

/// Collects entity-specific fields in declaration order.
#[derive(Debug)]
pub struct EntityDefinitionBuilder {
    name: String,
    label: String,
    fields: Vec<(String, FieldDefinition)>,
}

impl EntityDefinitionBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.push((name.into(), definition));
        self
    }

    /// Merges the declared fields over [`base_fields`].
    pub fn build(self) -> SchemaResult<EntityDefinition> {
        check_identifier(&self.name)?;
        let mut fields = base_fields();
        for (name, definition) in self.fields {
            check_identifier(&name)?;
            if is_base_field(&name) {
                return Err(SchemaError::ReservedField(name));
            }
            fields.insert(name, definition)?;
        }
        let keys = fields.surrogate_keys();
        if keys.len() > 1 {
            return Err(SchemaError::MultiplePrimaryKeys(keys));
        }
        Ok(EntityDefinition {
            name: self.name,
            label: self.label,
            fields,
        })
    }
}

fn check_identifier(name: &str) -> SchemaResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}

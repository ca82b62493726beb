//! Schema compiler: derives the storage index spec and the validation schema
//! from a [`FieldSet`]. Pure and deterministic.

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldSet;
use crate::validate::ValidationSchema;
use std::fmt;

/// One directive for the storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexDirective {
    /// The surrogate key, assigned by the store from a counter.
    AutoIncrementPrimaryKey(String),
    /// A secondary lookup index.
    Index(String),
}

impl IndexDirective {
    /// The field this directive applies to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::AutoIncrementPrimaryKey(name) | Self::Index(name) => name,
        }
    }
}

/// Index directives in field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageIndexSpec {
    directives: Vec<IndexDirective>,
}

impl StorageIndexSpec {
    #[must_use]
    pub fn directives(&self) -> &[IndexDirective] {
        &self.directives
    }

    /// The auto-increment primary key, if one was declared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.directives.iter().find_map(|d| match d {
            IndexDirective::AutoIncrementPrimaryKey(name) => Some(name.as_str()),
            IndexDirective::Index(_) => None,
        })
    }

    /// Secondary index fields, in declaration order.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().filter_map(|d| match d {
            IndexDirective::Index(name) => Some(name.as_str()),
            IndexDirective::AutoIncrementPrimaryKey(_) => None,
        })
    }

    #[must_use]
    pub fn is_indexed(&self, field: &str) -> bool {
        self.directives.iter().any(|d| d.field() == field)
    }
}

/// Compact form: `++id,created_at,updated_at,name`.
impl fmt::Display for StorageIndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.directives.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match directive {
                IndexDirective::AutoIncrementPrimaryKey(name) => write!(f, "++{name}")?,
                IndexDirective::Index(name) => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

/// Emits the primary-key directive for the field carrying both
/// auto-increment and primary-key, and an index directive for every other
/// indexed field.
#[must_use]
pub fn compile_storage_schema(fields: &FieldSet) -> StorageIndexSpec {
    let directives = fields
        .iter()
        .filter_map(|(name, def)| {
            if def.is_surrogate_key() {
                Some(IndexDirective::AutoIncrementPrimaryKey(name.to_string()))
            } else if def.indexed {
                Some(IndexDirective::Index(name.to_string()))
            } else {
                None
            }
        })
        .collect();
    StorageIndexSpec { directives }
}

/// Every field that declares a rule, keyed by field name.
#[must_use]
pub fn compile_validation_schema(fields: &FieldSet) -> ValidationSchema {
    fields
        .iter()
        .filter_map(|(name, def)| def.validate.clone().map(|rule| (name, rule)))
        .fold(ValidationSchema::new(), |schema, (name, rule)| {
            schema.with_rule(name, rule)
        })
}

/// Schema over an explicit list of fields.
///
/// Naming a field that is undeclared or has no rule attached is a
/// definition defect and fails immediately.
pub fn compile_validation_schema_for(
    fields: &FieldSet,
    names: &[&str],
) -> SchemaResult<ValidationSchema> {
    names.iter().try_fold(ValidationSchema::new(), |schema, name| {
        let def = fields
            .get(name)
            .ok_or_else(|| SchemaError::UnknownField((*name).to_string()))?;
        let rule = def
            .validate
            .clone()
            .ok_or_else(|| SchemaError::MissingRule((*name).to_string()))?;
        Ok(schema.with_rule(*name, rule))
    })
}

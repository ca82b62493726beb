//! Field definitions: the declarative metadata for one entity attribute.

use crate::error::{SchemaError, SchemaResult};
use crate::validate::Rule;
use serde::{Deserialize, Serialize};
use stash_types::{Value, ValueKind};

/// The primitive type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    DateTime,
    Boolean,
}

impl FieldType {
    /// The value kind a field of this type holds.
    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::String => ValueKind::String,
            Self::Number => ValueKind::Number,
            Self::DateTime => ValueKind::DateTime,
            Self::Boolean => ValueKind::Bool,
        }
    }

    /// Returns true if `value` has this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        value.kind() == self.value_kind()
    }
}

/// Metadata for one entity attribute.
///
/// Built with the type constructors and chained flag setters:
///
/// ```
/// use stash_model::{FieldDefinition, FieldType, rules};
///
/// let name = FieldDefinition::string()
///     .indexed()
///     .required()
///     .validate(rules::non_empty_string("Name"));
/// assert_eq!(name.field_type, FieldType::String);
/// assert!(name.indexed && name.required);
/// ```
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub field_type: FieldType,
    /// Whether the store maintains a lookup index on this field.
    pub indexed: bool,
    /// Whether a value must be present. Absent means optional.
    pub required: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    /// Rule applied on every write, if any.
    pub validate: Option<Rule>,
}

impl FieldDefinition {
    const fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            indexed: false,
            required: false,
            auto_increment: false,
            primary_key: false,
            validate: None,
        }
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldType::String)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::of(FieldType::Number)
    }

    #[must_use]
    pub const fn date_time() -> Self {
        Self::of(FieldType::DateTime)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    /// Numeric auto-increment primary key. Optional until persisted.
    #[must_use]
    pub const fn surrogate_key() -> Self {
        let mut def = Self::of(FieldType::Number);
        def.auto_increment = true;
        def.primary_key = true;
        def
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attaches a validation rule, replacing any previous one.
    #[must_use]
    pub fn validate(mut self, rule: Rule) -> Self {
        self.validate = Some(rule);
        self
    }

    /// True for the auto-increment primary key.
    #[must_use]
    pub const fn is_surrogate_key(&self) -> bool {
        self.auto_increment && self.primary_key
    }
}

/// Field definitions in declaration order, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<(String, FieldDefinition)>,
}

impl FieldSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, rejecting duplicate names.
    pub fn insert(&mut self, name: impl Into<String>, definition: FieldDefinition) -> SchemaResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(SchemaError::DuplicateField(name));
        }
        self.fields.push((name, definition));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, def)| def)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, definition)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(name, _)| name)
    }

    /// Names of every `string`-typed field, in declaration order.
    #[must_use]
    pub fn string_fields(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, def)| def.field_type == FieldType::String)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Names of every field carrying both auto-increment and primary-key.
    #[must_use]
    pub fn surrogate_keys(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, def)| def.is_surrogate_key())
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

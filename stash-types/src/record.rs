//! Field maps and persisted records.

use crate::{RecordId, Result, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Name of the surrogate key every entity inherits.
pub const ID: &str = "id";
/// Name of the creation timestamp every entity inherits.
pub const CREATED_AT: &str = "created_at";
/// Name of the last-mutation timestamp every entity inherits.
pub const UPDATED_AT: &str = "updated_at";

/// Returns true if `name` is one of the engine-managed base fields.
#[must_use]
pub fn is_base_field(name: &str) -> bool {
    matches!(name, ID | CREATED_AT | UPDATED_AT)
}

/// A name → value map.
///
/// Used for creation payloads, partial update payloads and the stored body of
/// a [`Record`]. A missing key means the field is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterates field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Extracts a string value.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Extracts a numeric value.
    #[must_use]
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Extracts a boolean value.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Extracts a timestamp value.
    #[must_use]
    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(Value::as_datetime)
    }

    /// Overlays `changes` onto this map; keys in `changes` win.
    pub fn merge(&mut self, changes: Fields) {
        self.0.extend(changes.0);
    }

    /// Keeps only the fields for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut Value) -> bool) {
        self.0.retain(|name, value| keep(name, value));
    }

    /// Serializes to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON document produced by [`Fields::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A persisted row: the store-assigned id plus every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    #[must_use]
    pub const fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Looks up a non-id field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get_str(name)
    }

    #[must_use]
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.fields.get_number(name)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.fields.get_bool(name)
    }

    /// When the record was created.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get_datetime(CREATED_AT)
    }

    /// When the record was last mutated.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get_datetime(UPDATED_AT)
    }

    /// Returns a copy with `changes` overlaid. The id is never changed.
    #[must_use]
    pub fn merged(&self, changes: &Fields) -> Self {
        let mut fields = self.fields.clone();
        fields.merge(changes.clone());
        fields.remove(ID);
        Self {
            id: self.id,
            fields,
        }
    }
}

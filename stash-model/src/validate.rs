//! Validation engine.
//!
//! A [`ValidationSchema`] maps field names to [`Rule`]s. Validation walks the
//! schema (not the record), hands each rule the value it finds or `None`,
//! and collects every violation before reporting.

use crate::error::ValidationError;
use stash_types::{Fields, Value};
use std::fmt;
use std::sync::Arc;

type RuleFn = dyn Fn(Option<&Value>) -> Option<String> + Send + Sync;

/// A pure check over one field value.
///
/// Returns `Some(message)` on violation. Rules receive `None` when the field
/// is absent and decide for themselves whether absence is a violation.
#[derive(Clone)]
pub struct Rule(Arc<RuleFn>);

impl Rule {
    pub fn new(check: impl Fn(Option<&Value>) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    /// Runs the rule.
    #[must_use]
    pub fn check(&self, value: Option<&Value>) -> Option<String> {
        (self.0)(value)
    }

    /// Chains two rules on the same field; the first violation wins.
    #[must_use]
    pub fn and(self, next: Self) -> Self {
        Self::new(move |value| self.check(value).or_else(|| next.check(value)))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule(..)")
    }
}

/// Field name → rule, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    rules: Vec<(String, Rule)>,
}

impl ValidationSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `field`.
    #[must_use]
    pub fn with_rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        let field = field.into();
        match self.rules.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = rule,
            None => self.rules.push((field, rule)),
        }
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rule)| rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    /// Sub-schema holding only the fields for which `keep` returns true.
    #[must_use]
    pub fn restricted_to(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|(name, _)| keep(name))
                .cloned()
                .collect(),
        }
    }

    /// See [`validate`].
    #[must_use]
    pub fn validate(&self, record: &Fields) -> Vec<String> {
        validate(record, self)
    }
}

/// Applies every rule in `schema` to `record` and returns all violations.
///
/// Never short-circuits; the result is empty when the record is valid.
#[must_use]
pub fn validate(record: &Fields, schema: &ValidationSchema) -> Vec<String> {
    schema
        .rules
        .iter()
        .filter_map(|(name, rule)| rule.check(record.get(name)))
        .collect()
}

/// Runs [`validate`] and folds any violations into one [`ValidationError`]
/// labelled with `label`.
pub fn validate_or_reject(
    record: &Fields,
    schema: &ValidationSchema,
    label: &str,
) -> Result<(), ValidationError> {
    let violations = validate(record, schema);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            label: label.to_string(),
            violations,
        })
    }
}

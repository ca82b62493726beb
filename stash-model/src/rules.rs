//! Reusable rule constructors.
//!
//! Each constructor takes the display name used in violation messages.
//! Only [`required`] and [`non_empty_string`] reject absence; the others
//! accept a missing value and leave presence to a separate rule.

use crate::validate::Rule;
use regex::Regex;
use stash_types::Value;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Rejects absence.
pub fn required(name: &str) -> Rule {
    let message = format!("{name} is required");
    Rule::new(move |value| value.is_none().then(|| message.clone()))
}

/// Type check only; absence passes.
pub fn string(name: &str) -> Rule {
    let message = format!("{name} must be a string");
    Rule::new(move |value| match value {
        None | Some(Value::String(_)) => None,
        Some(_) => Some(message.clone()),
    })
}

/// Must be a string that is not blank after trimming.
pub fn non_empty_string(name: &str) -> Rule {
    let message = format!("{name} must be a non-empty string");
    Rule::new(move |value| match value {
        Some(Value::String(s)) if !s.trim().is_empty() => None,
        _ => Some(message.clone()),
    })
}

/// Finite number or absent.
pub fn number(name: &str) -> Rule {
    let message = format!("{name} must be a number");
    Rule::new(move |value| match value {
        None => None,
        Some(Value::Number(n)) if !n.is_nan() => None,
        Some(_) => Some(message.clone()),
    })
}

/// Date-time value or absent.
pub fn date(name: &str) -> Rule {
    let message = format!("{name} must be a valid date");
    Rule::new(move |value| match value {
        None | Some(Value::DateTime(_)) => None,
        Some(_) => Some(message.clone()),
    })
}

/// Boolean or absent.
pub fn boolean(name: &str) -> Rule {
    let message = format!("{name} must be a boolean");
    Rule::new(move |value| match value {
        None | Some(Value::Bool(_)) => None,
        Some(_) => Some(message.clone()),
    })
}

/// Plausible email address, checked only when present.
pub fn email(name: &str) -> Rule {
    let message = format!("{name} must be a valid email address");
    Rule::new(move |value| match value {
        None => None,
        Some(Value::String(s)) if EMAIL_PATTERN.is_match(s) => None,
        Some(_) => Some(message.clone()),
    })
}

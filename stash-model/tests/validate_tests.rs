use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stash_model::{Rule, ValidationSchema, rules, validate, validate_or_reject};
use stash_types::{Fields, Value};

fn profile_schema() -> ValidationSchema {
    ValidationSchema::new()
        .with_rule("name", rules::non_empty_string("Name"))
        .with_rule("email", rules::email("Email"))
        .with_rule("age", rules::number("Age"))
        .with_rule("birthday", rules::date("Birthday"))
        .with_rule("nickname", rules::string("Nickname"))
        .with_rule("active", rules::boolean("Active"))
}

// ── Built-in rules ───────────────────────────────────────────────

#[test]
fn required_rejects_absence_only() {
    let rule = rules::required("Name");
    assert_eq!(rule.check(None), Some("Name is required".to_string()));
    assert_eq!(rule.check(Some(&Value::from(""))), None);
    assert_eq!(rule.check(Some(&Value::from(3))), None);
}

#[test]
fn string_is_type_check_only() {
    let rule = rules::string("Description");
    assert_eq!(rule.check(None), None);
    assert_eq!(rule.check(Some(&Value::from(""))), None);
    assert_eq!(
        rule.check(Some(&Value::from(1.5))),
        Some("Description must be a string".to_string())
    );
}

#[test]
fn non_empty_string_rejects_blank_and_absent() {
    let rule = rules::non_empty_string("Name");
    let expected = Some("Name must be a non-empty string".to_string());
    assert_eq!(rule.check(None), expected);
    assert_eq!(rule.check(Some(&Value::from("   "))), expected);
    assert_eq!(rule.check(Some(&Value::from(true))), expected);
    assert_eq!(rule.check(Some(&Value::from(" x "))), None);
}

#[test]
fn number_rejects_nan_and_other_kinds() {
    let rule = rules::number("Price");
    assert_eq!(rule.check(None), None);
    assert_eq!(rule.check(Some(&Value::from(12.5))), None);
    assert_eq!(
        rule.check(Some(&Value::Number(f64::NAN))),
        Some("Price must be a number".to_string())
    );
    assert_eq!(
        rule.check(Some(&Value::from("12"))),
        Some("Price must be a number".to_string())
    );
}

#[test]
fn date_accepts_datetime_or_absence() {
    let rule = rules::date("Due");
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    assert_eq!(rule.check(None), None);
    assert_eq!(rule.check(Some(&Value::from(ts))), None);
    assert_eq!(
        rule.check(Some(&Value::from("2024-06-01"))),
        Some("Due must be a valid date".to_string())
    );
}

#[test]
fn email_checked_only_when_present() {
    let rule = rules::email("Email");
    let bad = Some("Email must be a valid email address".to_string());
    assert_eq!(rule.check(None), None);
    assert_eq!(rule.check(Some(&Value::from("player@example.com"))), None);
    assert_eq!(rule.check(Some(&Value::from("player@example"))), bad);
    assert_eq!(rule.check(Some(&Value::from("play er@example.com"))), bad);
    assert_eq!(rule.check(Some(&Value::from("@example.com"))), bad);
    assert_eq!(rule.check(Some(&Value::from(5))), bad);
}

#[test]
fn boolean_type_check() {
    let rule = rules::boolean("Active");
    assert_eq!(rule.check(None), None);
    assert_eq!(rule.check(Some(&Value::from(false))), None);
    assert_eq!(
        rule.check(Some(&Value::from("yes"))),
        Some("Active must be a boolean".to_string())
    );
}

#[test]
fn composed_rule_reports_first_violation() {
    let rule = rules::required("Email").and(rules::email("Email"));
    assert_eq!(rule.check(None), Some("Email is required".to_string()));
    assert_eq!(
        rule.check(Some(&Value::from("nope"))),
        Some("Email must be a valid email address".to_string())
    );
    assert_eq!(rule.check(Some(&Value::from("a@b.co"))), None);
}

#[test]
fn custom_rule() {
    let rule = Rule::new(|value| match value.and_then(Value::as_f64) {
        Some(n) if n < 0.0 => Some("Amount must not be negative".to_string()),
        _ => None,
    });
    assert!(rule.check(Some(&Value::from(-1))).is_some());
    assert!(rule.check(Some(&Value::from(1))).is_none());
}

// ── Engine ───────────────────────────────────────────────────────

#[test]
fn valid_record_has_no_errors() {
    let record = Fields::new()
        .with("name", "Jo")
        .with("email", "jo@example.com")
        .with("age", 30);
    assert!(validate(&record, &profile_schema()).is_empty());
}

#[test]
fn collects_every_violation_in_schema_order() {
    let record = Fields::new()
        .with("name", " ")
        .with("email", "jo")
        .with("age", "thirty")
        .with("birthday", 1)
        .with("nickname", 2)
        .with("active", "yes");
    let errors = validate(&record, &profile_schema());
    assert_eq!(
        errors,
        vec![
            "Name must be a non-empty string",
            "Email must be a valid email address",
            "Age must be a number",
            "Birthday must be a valid date",
            "Nickname must be a string",
            "Active must be a boolean",
        ]
    );
}

#[test]
fn fields_outside_schema_are_ignored() {
    let record = Fields::new().with("name", "Jo").with("unexpected", 1);
    assert!(validate(&record, &profile_schema()).is_empty());
}

#[test]
fn rules_run_for_absent_fields() {
    let errors = validate(&Fields::new(), &profile_schema());
    assert_eq!(errors, vec!["Name must be a non-empty string"]);
}

#[test]
fn reject_aggregates_with_label() {
    let record = Fields::new().with("name", "").with("email", "x");
    let err = validate_or_reject(&record, &profile_schema(), "Profile").unwrap_err();
    assert_eq!(err.label, "Profile");
    assert_eq!(err.violations.len(), 2);
    assert_eq!(
        err.to_string(),
        "Profile validation failed: Name must be a non-empty string, Email must be a valid email address"
    );
}

#[test]
fn reject_passes_valid_record() {
    let record = Fields::new().with("name", "Jo");
    assert!(validate_or_reject(&record, &profile_schema(), "Profile").is_ok());
}

#[test]
fn with_rule_replaces_existing() {
    let schema = ValidationSchema::new()
        .with_rule("name", rules::required("Name"))
        .with_rule("name", rules::string("Name"));
    assert_eq!(schema.len(), 1);
    assert!(schema.validate(&Fields::new()).is_empty());
}

#[test]
fn restricted_schema_only_checks_kept_fields() {
    let schema = profile_schema().restricted_to(|name| name == "email");
    assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["email"]);
    assert!(schema.validate(&Fields::new()).is_empty());
}

// ── Properties ───────────────────────────────────────────────────

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        ".{0,12}".prop_map(Value::from),
        any::<f64>().prop_map(Value::Number),
        any::<bool>().prop_map(Value::Bool),
        (0i64..4_000_000_000).prop_map(|secs| Value::from(Utc.timestamp_opt(secs, 0).unwrap())),
    ]
}

fn arb_record() -> impl Strategy<Value = Fields> {
    let names = prop::sample::select(vec!["name", "email", "age", "birthday", "nickname", "active"]);
    prop::collection::vec((names, arb_value()), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    })
}

proptest! {
    #[test]
    fn validation_is_idempotent(record in arb_record()) {
        let schema = profile_schema();
        prop_assert_eq!(validate(&record, &schema), validate(&record, &schema));
    }

    #[test]
    fn one_message_per_violated_rule(record in arb_record()) {
        let schema = profile_schema();
        let expected = schema
            .field_names()
            .filter(|name| schema.get(name).unwrap().check(record.get(name)).is_some())
            .count();
        prop_assert_eq!(validate(&record, &schema).len(), expected);
    }
}

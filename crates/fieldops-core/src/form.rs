// ── Client-side form validation ──
//
// Field rules are declared per page in the catalog and checked before any
// create/update call leaves the process. All failures are collected so a
// form can mark every bad field at once.

use serde_json::Value;

use crate::error::ValidationErrors;

/// A single constraint on a form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    Required,
    Email,
    MinLength(usize),
    NumberRange { min: f64, max: f64 },
    OneOf(&'static [&'static str]),
}

/// A form field and its rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub rules: &'static [FieldRule],
}

/// Validate `body` against `fields`.
///
/// With `partial` set (updates), only fields present in the body are
/// checked, so a PATCH touching one field is not rejected for the others.
pub fn validate(body: &Value, fields: &[FieldSpec], partial: bool) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(map) = body.as_object() else {
        errors.push("body", "must be a JSON object");
        return Err(errors);
    };

    for field in fields {
        let value = map.get(field.key);
        if partial && value.is_none() {
            continue;
        }
        let present = value.is_some_and(|v| !is_blank(v));

        for rule in field.rules {
            match rule {
                FieldRule::Required => {
                    if !present {
                        errors.push(field.key, format!("{} is required", field.label));
                    }
                }
                // Remaining rules only apply to filled-in values.
                _ if !present => {}
                FieldRule::Email => {
                    if !value.and_then(Value::as_str).is_some_and(looks_like_email) {
                        errors.push(field.key, format!("{} is not a valid email address", field.label));
                    }
                }
                FieldRule::MinLength(min) => {
                    let len = value
                        .and_then(Value::as_str)
                        .map_or(0, |s| s.trim().chars().count());
                    if len < *min {
                        errors.push(
                            field.key,
                            format!("{} must be at least {min} characters", field.label),
                        );
                    }
                }
                FieldRule::NumberRange { min, max } => match value.and_then(as_number) {
                    Some(n) if n >= *min && n <= *max => {}
                    Some(_) => errors.push(
                        field.key,
                        format!("{} must be between {min} and {max}", field.label),
                    ),
                    None => errors.push(field.key, format!("{} must be a number", field.label)),
                },
                FieldRule::OneOf(options) => {
                    let ok = value
                        .and_then(Value::as_str)
                        .is_some_and(|s| options.iter().any(|o| o.eq_ignore_ascii_case(s)));
                    if !ok {
                        errors.push(
                            field.key,
                            format!("{} must be one of: {}", field.label, options.join(", ")),
                        );
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            key: "name",
            label: "Name",
            rules: &[FieldRule::Required, FieldRule::MinLength(2)],
        },
        FieldSpec {
            key: "email",
            label: "Email",
            rules: &[FieldRule::Email],
        },
        FieldSpec {
            key: "daily_rate",
            label: "Daily rate",
            rules: &[FieldRule::NumberRange { min: 0.0, max: 10_000.0 }],
        },
        FieldSpec {
            key: "priority",
            label: "Priority",
            rules: &[FieldRule::OneOf(&["low", "normal", "high"])],
        },
    ];

    #[test]
    fn valid_body_passes() {
        let body = json!({
            "name": "Acme",
            "email": "service@acme.example",
            "daily_rate": "120.5",
            "priority": "High"
        });
        assert!(validate(&body, FIELDS, false).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let body = json!({
            "name": " ",
            "email": "not-an-email",
            "daily_rate": -4,
            "priority": "asap"
        });
        let errors = validate(&body, FIELDS, false).unwrap_err();
        let fields: Vec<_> = errors.fields.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "daily_rate", "priority"]);
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let body = json!({ "name": "Bo" });
        assert!(validate(&body, FIELDS, false).is_ok());
    }

    #[test]
    fn partial_skips_missing_required_fields() {
        let body = json!({ "priority": "low" });
        assert!(validate(&body, FIELDS, true).is_ok());
        assert!(validate(&body, FIELDS, false).is_err());
    }

    #[test]
    fn partial_still_checks_present_fields() {
        let body = json!({ "name": "" });
        let errors = validate(&body, FIELDS, true).unwrap_err();
        assert_eq!(errors.for_field("name").count(), 1);
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(validate(&json!([1]), FIELDS, false).is_err());
    }
}

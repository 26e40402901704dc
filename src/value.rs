//! Submitted-value inspection and coercion.
//!
//! Submission payloads are dynamically shaped (`serde_json::Value`), so every
//! comparison the engine performs funnels through the helpers in this module.
//! The coercions follow the loose conventions form data arrives with: numbers
//! may be strings, checkboxes may be booleans or arrays, and `null` and the
//! empty string both mean "not filled in".

use serde_json::Value;

/// True when a submitted value counts as "not filled in": `null` or the empty
/// string. Arrays, objects, `false`, and `0` all count as filled; a missing
/// key is handled by callers before this check.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Render a value the way form text expects it: strings verbatim, numbers and
/// booleans via their display form, arrays comma-joined element-wise.
///
/// `null` and objects have no text form and yield `None`; callers treat that
/// as unresolved rather than substituting an empty string.
pub(crate) fn display_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> =
                items.iter().map(|item| display_string(item).unwrap_or_default()).collect();
            Some(parts.join(","))
        }
    }
}

/// Coerce a value to a number for ordering comparisons: numbers as-is,
/// booleans as 1/0, `null` and blank strings as 0, other strings parsed as
/// `f64`. Returns `None` where no numeric reading exists (arrays and objects
/// included; single-element arrays are not unwrapped).
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() { Some(0.0) } else { trimmed.parse::<f64>().ok() }
        }
        _ => None,
    }
}

/// Count ASCII digits in `s`.
pub(crate) fn digit_count(s: &str) -> usize {
    s.bytes().filter(|b| b.is_ascii_digit()).count()
}

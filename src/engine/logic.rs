//! Conditional visibility evaluation.
//!
//! Pure and total: evaluation never errors and never panics, whatever shape
//! the stored condition or the submitted value has. Anything ambiguous (an
//! unknown operator, a `contains` on a non-string, a comparison that does
//! not coerce to numbers) evaluates to "condition not met".

use crate::schema::{Condition, ConditionalLogic, FormSchema, LogicAction, Operator, SubmissionData};
use crate::value::{coerce_number, is_empty_value};
use serde_json::Value;
use std::collections::HashSet;

/// Whether the owner of `logic` is visible given the current values.
///
/// No logic means always visible. The referenced field is looked up directly
/// in `values`; a missing key evaluates with absent-value semantics (absent
/// is empty, absent equals nothing).
pub fn is_visible(logic: Option<&ConditionalLogic>, values: &SubmissionData) -> bool {
    let Some(logic) = logic else {
        return true;
    };
    let met = condition_met(&logic.when, values.get(logic.when.field.as_str()));
    match logic.action {
        LogicAction::Show => met,
        LogicAction::Hide => !met,
    }
}

/// Evaluate one condition against a value (`None` = field absent).
pub(crate) fn condition_met(condition: &Condition, value: Option<&Value>) -> bool {
    match condition.operator {
        Operator::Equals => value == Some(&condition.value),
        Operator::NotEquals => value != Some(&condition.value),
        Operator::Contains => haystack_contains(value, &condition.value).unwrap_or(false),
        Operator::NotContains => {
            haystack_contains(value, &condition.value).map(|c| !c).unwrap_or(false)
        }
        Operator::GreaterThan => compare(value, &condition.value, |a, b| a > b),
        Operator::LessThan => compare(value, &condition.value, |a, b| a < b),
        Operator::IsEmpty => value.is_none_or(is_empty_value),
        Operator::IsNotEmpty => value.is_some_and(|v| !is_empty_value(v)),
        Operator::Unknown => false,
    }
}

/// Substring containment. `None` when the check does not apply: a
/// non-string haystack or a non-scalar needle never matches (and never
/// "not-matches" either).
fn haystack_contains(value: Option<&Value>, needle: &Value) -> Option<bool> {
    let haystack = value?.as_str()?;
    let needle = match needle {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(haystack.contains(&needle))
}

fn compare(value: Option<&Value>, against: &Value, ordered: fn(f64, f64) -> bool) -> bool {
    match (value.and_then(coerce_number), coerce_number(against)) {
        (Some(a), Some(b)) => ordered(a, b),
        _ => false,
    }
}

/// Ids of fields currently hidden by conditional logic, section-level logic
/// included. Each owner is evaluated against the raw values independently;
/// hiding does not cascade through references.
pub(crate) fn hidden_field_ids(schema: &FormSchema, values: &SubmissionData) -> HashSet<String> {
    let mut hidden = HashSet::new();
    for section in &schema.sections {
        let section_visible = is_visible(section.conditional_logic.as_ref(), values);
        for field in &section.fields {
            if !section_visible || !is_visible(field.conditional_logic.as_ref(), values) {
                hidden.insert(field.id.clone());
            }
        }
    }
    hidden
}

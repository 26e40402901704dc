//! Field-to-role mapping.
//!
//! Turns a raw submission into the normalized `{role: value}` map everything
//! downstream consumes. Strategies are tried per field in a fixed priority
//! order, first producer wins:
//!
//! 1. the field's explicit `mapping`
//! 2. the field's input type
//! 3. the field's label, via the registry pattern table
//! 4. the field's `name` (or id) verbatim as a custom role
//! 5. the contact extractor over the whole payload, for the contact roles
//!    that are still open
//!
//! Each role is filled at most once, by the earliest field in schema order.
//! Phone is the exception: the scored search of the contact extractor has
//! the last word, replacing whatever a positional strategy picked.

use crate::engine::contact;
use crate::engine::registry::RoleRegistry;
use crate::engine::trace::{MappingTrace, Strategy};
use crate::role;
use crate::schema::{FieldDescriptor, FieldMapping, FormSchema, MappedRoles, SubmissionData};
use crate::value::{display_string, is_empty_value};
use serde_json::Value;
use tracing::debug;

/// Map a submission onto canonical roles.
pub fn map_fields(
    registry: &RoleRegistry,
    schema: &FormSchema,
    submission: &SubmissionData,
) -> MappedRoles {
    map_fields_traced(registry, schema, submission).0
}

pub(crate) fn map_fields_traced(
    registry: &RoleRegistry,
    schema: &FormSchema,
    submission: &SubmissionData,
) -> (MappedRoles, Vec<MappingTrace>) {
    let mut mapped = MappedRoles::new();
    let mut traces = Vec::new();

    for field in schema.fields() {
        let Some(value) = field_value(field, submission) else {
            continue;
        };
        if is_empty_value(value) {
            continue;
        }
        let Some((role, strategy)) = assign_role(registry, field) else {
            continue;
        };
        if mapped.contains_key(&role) {
            continue;
        }

        debug!(role = %role, field = %field.id, strategy = ?strategy, "mapped field to role");
        mapped.insert(role.clone(), value.clone());
        traces.push(MappingTrace { role, field_id: Some(field.id.clone()), strategy });
    }

    // Last resort for the contact roles nothing filled positionally.
    let contact = contact::extract_contact_fields(submission);
    let mut fill = |role: &str, value: Option<String>| {
        let Some(value) = value else { return };
        if mapped.contains_key(role) {
            return;
        }
        debug!(role = %role, value = %value, "filled role from contact scan");
        mapped.insert(role.to_string(), Value::String(value));
        traces.push(MappingTrace { role: role.to_string(), field_id: None, strategy: Strategy::ContactScan });
    };
    fill(role::NAME, contact.name);
    fill(role::EMAIL, contact.email);

    // The scored phone search overrides positional mapping outright.
    let explicit = mapped.get(role::PHONE).and_then(display_string);
    match contact::reconcile_phone(explicit.as_deref(), submission) {
        Some(phone) => {
            if explicit.as_deref() != Some(phone.as_str()) {
                debug!(value = %phone, "scored phone search overrode mapped phone");
                traces.retain(|t| t.role != role::PHONE);
                traces.push(MappingTrace {
                    role: role::PHONE.to_string(),
                    field_id: None,
                    strategy: Strategy::ContactScan,
                });
            }
            mapped.insert(role::PHONE.to_string(), Value::String(phone));
        }
        None => {
            if explicit.is_some() {
                debug!("mapped phone dropped as implausible");
                mapped.shift_remove(role::PHONE);
                traces.retain(|t| t.role != role::PHONE);
            }
        }
    }

    (mapped, traces)
}

/// The submitted value for a field: looked up by id, then by `name`.
fn field_value<'a>(field: &FieldDescriptor, submission: &'a SubmissionData) -> Option<&'a Value> {
    submission
        .get(field.id.as_str())
        .or_else(|| field.name.as_deref().and_then(|name| submission.get(name)))
}

fn assign_role(registry: &RoleRegistry, field: &FieldDescriptor) -> Option<(String, Strategy)> {
    if let Some(role) = field.mapping.as_ref().and_then(mapping_role) {
        return Some((role, Strategy::ExplicitMapping));
    }
    if let Some(role) = registry.type_role(field.field_type) {
        return Some((role.to_string(), Strategy::FieldType));
    }
    if let Some(role) = registry.label_role(&field.label) {
        return Some((role.to_string(), Strategy::LabelPattern));
    }

    let key = field
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(field.id.as_str());
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), Strategy::FieldKey))
}

/// The role a mapping declares: its kind's canonical role, or for custom
/// mappings the custom key (falling back to the mapping value).
fn mapping_role(mapping: &FieldMapping) -> Option<String> {
    if let Some(role) = mapping.kind.role() {
        return Some(role.to_string());
    }
    if mapping.kind == crate::schema::MappingKind::Custom {
        return mapping
            .custom_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .or(mapping.value.as_deref().filter(|value| !value.is_empty()))
            .map(str::to_string);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> RoleRegistry {
        RoleRegistry::new()
    }

    fn schema(fields: Value) -> FormSchema {
        serde_json::from_value(json!({"sections": [{"id": "s1", "fields": fields}]})).unwrap()
    }

    fn submission(entries: Vec<(&str, Value)>) -> SubmissionData {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn explicit_mapping_beats_type_and_label() {
        let schema = schema(json!([
            {
                "id": "f1",
                "type": "text",
                "label": "E-mail Address",
                "mapping": {"type": "location"}
            }
        ]));
        let data = submission(vec![("f1", json!("Cape Town"))]);

        let (mapped, traces) = map_fields_traced(&registry(), &schema, &data);
        assert_eq!(mapped.get("location"), Some(&json!("Cape Town")));
        assert!(!mapped.contains_key("email"));
        assert_eq!(traces[0].strategy, Strategy::ExplicitMapping);
    }

    #[test]
    fn custom_mapping_uses_custom_key_then_value() {
        let schema = schema(json!([
            {
                "id": "f1",
                "type": "text",
                "label": "How did you hear about us?",
                "mapping": {"type": "custom", "customKey": "leadSource"}
            },
            {
                "id": "f2",
                "type": "text",
                "label": "Budget",
                "mapping": {"type": "custom", "value": "budget"}
            }
        ]));
        let data = submission(vec![("f1", json!("Referral")), ("f2", json!("R10k"))]);

        let mapped = map_fields(&registry(), &schema, &data);
        assert_eq!(mapped.get("leadSource"), Some(&json!("Referral")));
        assert_eq!(mapped.get("budget"), Some(&json!("R10k")));
    }

    #[test]
    fn type_then_label_then_key() {
        let schema = schema(json!([
            {"id": "f1", "type": "date", "label": "Big Day"},
            {"id": "f2", "type": "text", "label": "Province"},
            {"id": "f3", "type": "select", "label": "Service Type", "name": "service"},
            {"id": "f4", "type": "text", "label": "???"}
        ]));
        let data = submission(vec![
            ("f1", json!("2025-06-01")),
            ("f2", json!("Gauteng")),
            ("service", json!("Wedding")),
            ("f4", json!("noise")),
        ]);

        let (mapped, traces) = map_fields_traced(&registry(), &schema, &data);
        assert_eq!(mapped.get("date"), Some(&json!("2025-06-01")));
        assert_eq!(mapped.get("state"), Some(&json!("Gauteng")));
        assert_eq!(mapped.get("service"), Some(&json!("Wedding")));
        assert_eq!(mapped.get("f4"), Some(&json!("noise")));

        let strat = |role: &str| {
            traces.iter().find(|t| t.role == role).map(|t| t.strategy)
        };
        assert_eq!(strat("date"), Some(Strategy::FieldType));
        assert_eq!(strat("state"), Some(Strategy::LabelPattern));
        assert_eq!(strat("service"), Some(Strategy::FieldKey));
    }

    #[test]
    fn first_field_in_schema_order_wins_role() {
        let schema = schema(json!([
            {"id": "f1", "type": "email", "label": "Email"},
            {"id": "f2", "type": "email", "label": "Backup Email"}
        ]));
        let data = submission(vec![
            ("f1", json!("first@example.com")),
            ("f2", json!("second@example.com")),
        ]);

        let mapped = map_fields(&registry(), &schema, &data);
        assert_eq!(mapped.get("email"), Some(&json!("first@example.com")));
    }

    #[test]
    fn empty_values_contribute_nothing() {
        let schema = schema(json!([
            {"id": "f1", "type": "email", "label": "Email"},
            {"id": "f2", "type": "text", "label": "Notes"}
        ]));
        let data = submission(vec![("f1", json!("")), ("f2", json!(null))]);

        let mapped = map_fields(&registry(), &schema, &data);
        assert!(mapped.is_empty());
    }

    #[test]
    fn contact_scan_fills_remaining_gaps() {
        // No schema field maps to name or email; the payload still carries
        // both under conventional keys.
        let schema = schema(json!([
            {"id": "first_name", "type": "text", "label": "???"},
            {"id": "last_name", "type": "text", "label": "????"}
        ]));
        let data = submission(vec![
            ("first_name", json!("Jane")),
            ("last_name", json!("Doe")),
            ("reach_me", json!("jane@example.com")),
        ]);

        let (mapped, traces) = map_fields_traced(&registry(), &schema, &data);
        assert_eq!(mapped.get("name"), Some(&json!("Jane Doe")));
        assert_eq!(mapped.get("email"), Some(&json!("jane@example.com")));

        let name_trace = traces.iter().find(|t| t.role == "name").unwrap();
        assert_eq!(name_trace.strategy, Strategy::ContactScan);
        assert_eq!(name_trace.field_id, None);
    }

    #[test]
    fn scored_phone_overrides_typed_field() {
        let schema = schema(json!([
            {"id": "f1", "type": "tel", "label": "Phone"},
            {"id": "f2", "type": "text", "label": "Emergency Contact"}
        ]));
        let data = submission(vec![
            ("f1", json!("n/a")),
            ("f2", json!("+27 82 555 1234")),
        ]);

        let (mapped, traces) = map_fields_traced(&registry(), &schema, &data);
        assert_eq!(mapped.get("phone"), Some(&json!("+27 82 555 1234")));
        let phone_trace = traces.iter().find(|t| t.role == "phone").unwrap();
        assert_eq!(phone_trace.strategy, Strategy::ContactScan);
    }

    #[test]
    fn implausible_phone_is_dropped() {
        let schema = schema(json!([
            {"id": "f1", "type": "tel", "label": "Phone"}
        ]));
        let data = submission(vec![("f1", json!("n/a"))]);

        let mapped = map_fields(&registry(), &schema, &data);
        assert!(!mapped.contains_key("phone"));
    }

    #[test]
    fn mapping_is_stable_across_runs() {
        let schema = schema(json!([
            {"id": "f1", "type": "email", "label": "Email"},
            {"id": "f2", "type": "tel", "label": "Phone"},
            {"id": "f3", "type": "text", "label": "Notes"}
        ]));
        let data = submission(vec![
            ("f1", json!("jane@example.com")),
            ("f2", json!("0821234567")),
            ("f3", json!("hello")),
        ]);

        let registry = registry();
        let first = map_fields(&registry, &schema, &data);
        let second = map_fields(&registry, &schema, &data);
        assert_eq!(first, second);
    }
}

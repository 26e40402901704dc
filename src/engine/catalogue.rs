//! Field reference catalogue.
//!
//! Rule conditions reference fields loosely: by raw id, by stable id, or by
//! label. The catalogue is the per-run index that settles those references
//! to submitted keys, built from the schema with currently hidden fields
//! left out so rules cannot match on values the submitter never saw.

use crate::schema::{FieldDescriptor, FormSchema, SubmissionData};
use std::collections::{HashMap, HashSet};

/// The payload keys one field may have been submitted under.
///
/// Payloads are normally keyed by field id, but older clients key by the
/// field's `name`; value lookup tries both, matching the mapper.
#[derive(Clone, Copy)]
struct FieldKeys<'a> {
    id: &'a str,
    name: Option<&'a str>,
}

impl<'a> FieldKeys<'a> {
    fn submitted_key(&self, submission: &SubmissionData) -> Option<&'a str> {
        if submission.contains_key(self.id) {
            return Some(self.id);
        }
        self.name.filter(|name| submission.contains_key(*name))
    }
}

pub(crate) struct FieldCatalogue<'a> {
    by_id: HashMap<&'a str, FieldKeys<'a>>,
    by_stable_id: HashMap<&'a str, FieldKeys<'a>>,
    by_label: HashMap<String, FieldKeys<'a>>,
}

impl<'a> FieldCatalogue<'a> {
    /// Index `schema`, skipping fields whose id is in `hidden`. Duplicate
    /// stable ids or labels keep the first field in schema order.
    pub fn new(schema: &'a FormSchema, hidden: &HashSet<String>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_stable_id = HashMap::new();
        let mut by_label = HashMap::new();

        for field in schema.fields() {
            if hidden.contains(field.id.as_str()) {
                continue;
            }
            let keys = FieldKeys {
                id: field.id.as_str(),
                name: field.name.as_deref().filter(|name| !name.is_empty()),
            };
            by_id.entry(field.id.as_str()).or_insert(keys);
            if let Some(stable_id) = stable_id_of(field) {
                by_stable_id.entry(stable_id).or_insert(keys);
            }
            let label = field.label.trim();
            if !label.is_empty() {
                by_label.entry(label.to_lowercase()).or_insert(keys);
            }
        }

        Self { by_id, by_stable_id, by_label }
    }

    /// Settle a reference to a submitted key: raw id first, then stable id,
    /// then case-insensitive label. A step only counts when the field it
    /// names actually reached the payload, so a reference that is both an
    /// unsubmitted id and another field's stable id still resolves.
    pub fn resolve(&self, reference: &str, submission: &SubmissionData) -> Option<&'a str> {
        let reference = reference.trim();
        [
            self.by_id.get(reference),
            self.by_stable_id.get(reference),
            self.by_label.get(&reference.to_lowercase()),
        ]
        .into_iter()
        .flatten()
        .find_map(|keys| keys.submitted_key(submission))
    }
}

fn stable_id_of(field: &FieldDescriptor) -> Option<&str> {
    field.stable_id.as_deref().filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn schema() -> FormSchema {
        serde_json::from_value(json!({
            "sections": [{
                "id": "s1",
                "fields": [
                    {"id": "f1", "type": "select", "label": "Province", "stableId": "province"},
                    {"id": "f2", "type": "text", "label": "Notes"},
                    {"id": "f3", "type": "text", "label": "Notes"},
                    {"id": "f4", "type": "select", "label": "Service Type", "name": "service"}
                ]
            }]
        }))
        .unwrap()
    }

    fn submission(entries: Vec<(&str, Value)>) -> SubmissionData {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn resolves_id_then_stable_id_then_label() {
        let schema = schema();
        let data = submission(vec![
            ("f1", json!("Gauteng")),
            ("f2", json!("hi")),
            ("f3", json!("lo")),
        ]);
        let catalogue = FieldCatalogue::new(&schema, &HashSet::new());

        assert_eq!(catalogue.resolve("f1", &data), Some("f1"));
        assert_eq!(catalogue.resolve("province", &data), Some("f1"));
        assert_eq!(catalogue.resolve("Province", &data), Some("f1"));
        assert_eq!(catalogue.resolve("  pRoViNcE  ", &data), Some("f1"));
        assert_eq!(catalogue.resolve("nope", &data), None);

        // Duplicate labels keep the first field in schema order.
        assert_eq!(catalogue.resolve("notes", &data), Some("f2"));
    }

    #[test]
    fn name_keyed_payloads_still_resolve() {
        let schema = schema();
        // The client submitted under the field's `name`, not its id.
        let data = submission(vec![("service", json!("Wedding"))]);
        let catalogue = FieldCatalogue::new(&schema, &HashSet::new());

        assert_eq!(catalogue.resolve("f4", &data), Some("service"));
        assert_eq!(catalogue.resolve("Service Type", &data), Some("service"));
        // The name itself is not part of the reference chain.
        assert_eq!(catalogue.resolve("service", &data), None);
    }

    #[test]
    fn resolution_requires_a_submitted_key() {
        let schema = schema();
        let data = submission(vec![("f2", json!("hi"))]);
        let catalogue = FieldCatalogue::new(&schema, &HashSet::new());

        // f1 is in the schema but never reached the payload.
        assert_eq!(catalogue.resolve("f1", &data), None);
        assert_eq!(catalogue.resolve("province", &data), None);
        assert_eq!(catalogue.resolve("notes", &data), Some("f2"));
    }

    #[test]
    fn presence_gates_each_step_of_the_chain() {
        // "email" is f1's id and f2's stable id; only f2 was submitted.
        let schema: FormSchema = serde_json::from_value(json!({
            "sections": [{
                "id": "s1",
                "fields": [
                    {"id": "email", "type": "text", "label": "Old Email"},
                    {"id": "f2", "type": "text", "label": "Reach Me", "stableId": "email"}
                ]
            }]
        }))
        .unwrap();
        let data = submission(vec![("f2", json!("jane@example.com"))]);
        let catalogue = FieldCatalogue::new(&schema, &HashSet::new());

        assert_eq!(catalogue.resolve("email", &data), Some("f2"));
    }

    #[test]
    fn hidden_fields_are_not_indexed() {
        let schema = schema();
        let data = submission(vec![
            ("f1", json!("Gauteng")),
            ("f2", json!("hi")),
            ("f3", json!("lo")),
        ]);
        let hidden: HashSet<String> = ["f1".to_string()].into_iter().collect();
        let catalogue = FieldCatalogue::new(&schema, &hidden);

        assert_eq!(catalogue.resolve("f1", &data), None);
        assert_eq!(catalogue.resolve("province", &data), None);
        assert_eq!(catalogue.resolve("notes", &data), Some("f2"));
    }
}

//! Storage records: form schemas, email rules, and email templates.
//!
//! These types mirror the JSON documents the surrounding system persists.
//! Deserialization is total over untrusted rows: enums that arrive from
//! storage carry an `Unknown` catch-all so an unrecognized operator or field
//! type loads cleanly and later evaluates fail-closed instead of erroring.
//!
//! [`FormSchema::validate`] is the builder-side lint run before a schema is
//! saved. It is advisory only; the runtime engine stays total even over
//! schemas that would not validate.

use crate::role;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Raw submission payload: field id (or external key) to submitted value.
///
/// Iteration order is document order; tie-breaking in the mapper and the
/// contact extractor depends on it.
pub type SubmissionData = serde_json::Map<String, Value>;

/// Normalized output of the field mapper: canonical role to value.
pub type MappedRoles = serde_json::Map<String, Value>;

/// Input type a field was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    #[serde(alias = "phone")]
    Tel,
    Name,
    Number,
    Date,
    Time,
    DateTime,
    Select,
    Checkbox,
    Radio,
    File,
    Hidden,
    /// Catch-all for input types this version does not know about.
    #[serde(other)]
    Unknown,
}

/// Canonical role a field mapping can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    Name,
    Email,
    Phone,
    Date,
    Time,
    Location,
    DateTime,
    Custom,
    #[serde(other)]
    Unknown,
}

impl MappingKind {
    /// The canonical role this kind maps to. `Custom` carries its role in
    /// [`FieldMapping::custom_key`]; `Unknown` maps to nothing.
    pub(crate) fn role(self) -> Option<&'static str> {
        match self {
            MappingKind::Name => Some(role::NAME),
            MappingKind::Email => Some(role::EMAIL),
            MappingKind::Phone => Some(role::PHONE),
            MappingKind::Date => Some(role::DATE),
            MappingKind::Time => Some(role::TIME),
            MappingKind::Location => Some(role::LOCATION),
            MappingKind::DateTime => Some(role::DATETIME),
            MappingKind::Custom | MappingKind::Unknown => None,
        }
    }
}

/// Declared mapping from a field to the canonical role it plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub kind: MappingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Role key used when `kind` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_key: Option<String>,
}

/// Comparison operator in a condition. Unrecognized operator strings
/// deserialize to `Unknown` and always evaluate to "not met".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
    #[serde(other)]
    Unknown,
}

/// A single predicate over one field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field reference: a field id, a stable id, or a label.
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

/// What to do with the owner when the condition is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicAction {
    Show,
    Hide,
}

/// Conditional visibility attached to a section or a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalLogic {
    pub action: LogicAction,
    pub when: Condition,
}

/// A single field in a form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<FieldMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
    /// Durable semantic key. Assigned once, then never changed: stored rules
    /// reference fields through it across form edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<String>,
}

/// An ordered group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// A user-authored form: ordered sections of ordered fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl FormSchema {
    /// All fields in schema order (section order, then field order).
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    /// Builder-side integrity lint. First violation wins.
    ///
    /// The runtime engine does not consult this: it stays fail-closed even
    /// over schemas that would not validate.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut ids = HashSet::new();
        for field in self.fields() {
            if !ids.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateFieldId(field.id.clone()));
            }
        }

        let mut stable_ids = HashSet::new();
        let mut known: HashSet<&str> = ids;
        for field in self.fields() {
            let Some(stable_id) = field.stable_id.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            if !stable_ids.insert(stable_id) {
                return Err(SchemaError::DuplicateStableId(stable_id.to_string()));
            }
            known.insert(stable_id);
        }

        for section in &self.sections {
            if let Some(logic) = &section.conditional_logic {
                let reference = logic.when.field.as_str();
                if !known.contains(reference) {
                    return Err(SchemaError::DanglingLogicReference {
                        owner: section.id.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
            for field in &section.fields {
                if let Some(logic) = &field.conditional_logic {
                    let reference = logic.when.field.as_str();
                    if !known.contains(reference) {
                        return Err(SchemaError::DanglingLogicReference {
                            owner: field.id.clone(),
                            reference: reference.to_string(),
                        });
                    }
                }
                if let Some(mapping) = &field.mapping {
                    let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
                    if mapping.kind == MappingKind::Custom
                        && blank(&mapping.custom_key)
                        && blank(&mapping.value)
                    {
                        return Err(SchemaError::EmptyCustomMapping(field.id.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Schema integrity violations reported by [`FormSchema::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field id `{0}`")]
    DuplicateFieldId(String),
    #[error("duplicate stable id `{0}`")]
    DuplicateStableId(String),
    #[error("conditional logic on `{owner}` references unknown field `{reference}`")]
    DanglingLogicReference { owner: String, reference: String },
    #[error("custom mapping on field `{0}` carries neither a custom key nor a value")]
    EmptyCustomMapping(String),
}

/// Who a firing rule's email goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    /// The submitter, through the normalized `email` role.
    #[default]
    Submitter,
    /// The configured site notification address.
    Team,
    /// The address stored on the rule itself.
    Custom,
    #[serde(other)]
    Unknown,
}

/// A stored email trigger rule. Fires when the rule is active and all of its
/// conditions hold (a rule with no conditions fires on every submission).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub template_id: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub recipient: RecipientKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_recipient: Option<String>,
    #[serde(default)]
    pub cc_emails: Vec<String>,
    #[serde(default)]
    pub bcc_emails: Vec<String>,
}

/// A stored email template with `{{variable}}` placeholders.
///
/// CC/BCC lists here are defaults; a rule's own lists win when non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub subject: String,
    pub html_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default)]
    pub cc_emails: Vec<String>,
    #[serde(default)]
    pub bcc_emails: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(id: &str, label: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            field_type: FieldType::Text,
            label: label.to_string(),
            name: None,
            required: false,
            mapping: None,
            conditional_logic: None,
            stable_id: None,
        }
    }

    fn schema_of(fields: Vec<FieldDescriptor>) -> FormSchema {
        FormSchema {
            sections: vec![Section {
                id: "s1".to_string(),
                title: String::new(),
                conditional_logic: None,
                fields,
            }],
        }
    }

    #[test]
    fn deserializes_builder_output() {
        let schema: FormSchema = serde_json::from_value(json!({
            "sections": [{
                "id": "contact",
                "title": "Contact Details",
                "fields": [
                    {"id": "f1", "type": "text", "label": "Full Name"},
                    {
                        "id": "f2",
                        "type": "email",
                        "label": "E-mail Address",
                        "required": true,
                        "stableId": "email"
                    },
                    {
                        "id": "f3",
                        "type": "select",
                        "label": "Province",
                        "conditionalLogic": {
                            "action": "show",
                            "when": {"field": "f2", "operator": "is_not_empty"}
                        }
                    }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(schema.fields().count(), 3);
        let email = schema.fields().find(|f| f.id == "f2").unwrap();
        assert_eq!(email.field_type, FieldType::Email);
        assert!(email.required);
        assert_eq!(email.stable_id.as_deref(), Some("email"));

        let province = schema.fields().find(|f| f.id == "f3").unwrap();
        let logic = province.conditional_logic.as_ref().unwrap();
        assert_eq!(logic.action, LogicAction::Show);
        assert_eq!(logic.when.operator, Operator::IsNotEmpty);
        assert_eq!(logic.when.value, Value::Null);
    }

    #[test]
    fn unknown_enum_strings_are_absorbed() {
        let condition: Condition =
            serde_json::from_value(json!({"field": "f1", "operator": "matches_regex"})).unwrap();
        assert_eq!(condition.operator, Operator::Unknown);

        let field: FieldDescriptor =
            serde_json::from_value(json!({"id": "f1", "type": "signature", "label": "Sign here"}))
                .unwrap();
        assert_eq!(field.field_type, FieldType::Unknown);

        let phone: FieldDescriptor =
            serde_json::from_value(json!({"id": "f2", "type": "phone", "label": "Phone"})).unwrap();
        assert_eq!(phone.field_type, FieldType::Tel);
    }

    #[test]
    fn rule_defaults() {
        let rule: EmailRule =
            serde_json::from_value(json!({"id": "r1", "templateId": "t1"})).unwrap();
        assert!(rule.active);
        assert!(rule.conditions.is_empty());
        assert_eq!(rule.recipient, RecipientKind::Submitter);
        assert!(rule.cc_emails.is_empty());

        let custom: EmailRule = serde_json::from_value(json!({
            "id": "r2",
            "templateId": "t1",
            "active": false,
            "recipient": "custom",
            "customRecipient": "ops@example.com"
        }))
        .unwrap();
        assert!(!custom.active);
        assert_eq!(custom.recipient, RecipientKind::Custom);
        assert_eq!(custom.custom_recipient.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn validate_rejects_duplicate_field_ids() {
        let schema = schema_of(vec![field("f1", "One"), field("f1", "Two")]);
        assert_eq!(schema.validate(), Err(SchemaError::DuplicateFieldId("f1".to_string())));
    }

    #[test]
    fn validate_rejects_duplicate_stable_ids() {
        let mut a = field("f1", "One");
        a.stable_id = Some("thing".to_string());
        let mut b = field("f2", "Two");
        b.stable_id = Some("thing".to_string());

        let schema = schema_of(vec![a, b]);
        assert_eq!(schema.validate(), Err(SchemaError::DuplicateStableId("thing".to_string())));
    }

    #[test]
    fn validate_rejects_dangling_logic_reference() {
        let mut gated = field("f1", "Gated");
        gated.conditional_logic = Some(ConditionalLogic {
            action: LogicAction::Show,
            when: Condition {
                field: "missing".to_string(),
                operator: Operator::Equals,
                value: json!("x"),
            },
        });

        let schema = schema_of(vec![gated]);
        assert_eq!(
            schema.validate(),
            Err(SchemaError::DanglingLogicReference {
                owner: "f1".to_string(),
                reference: "missing".to_string(),
            })
        );
    }

    #[test]
    fn validate_accepts_stable_id_logic_reference() {
        let mut source = field("f1", "Source");
        source.stable_id = Some("province".to_string());
        let mut gated = field("f2", "Gated");
        gated.conditional_logic = Some(ConditionalLogic {
            action: LogicAction::Hide,
            when: Condition {
                field: "province".to_string(),
                operator: Operator::IsEmpty,
                value: Value::Null,
            },
        });

        let schema = schema_of(vec![source, gated]);
        assert_eq!(schema.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_custom_mapping() {
        let mut custom = field("f1", "Whatever");
        custom.mapping =
            Some(FieldMapping { kind: MappingKind::Custom, value: None, custom_key: None });

        let schema = schema_of(vec![custom]);
        assert_eq!(schema.validate(), Err(SchemaError::EmptyCustomMapping("f1".to_string())));
    }
}

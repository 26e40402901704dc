//! Stable-id resolution.
//!
//! A stable id is the durable semantic key automation rules reference a field
//! by, so the rules survive form edits that regenerate raw field ids. The
//! resolver is deterministic and idempotent: an id already assigned is always
//! returned unchanged, and the same field shape always derives the same id.

use crate::engine::registry::RoleRegistry;
use crate::schema::{FieldDescriptor, FormSchema};
use std::collections::HashSet;
use tracing::debug;

/// Derive the stable id for `field`.
///
/// Fallback chain, first hit wins: the assigned `stableId`; the mapping
/// value; the canonical role for contact-like types; the canonical role for
/// a recognized label; the camel-cased label (prefixed with the camel-cased
/// `section_title` when supplied); the field `name`; `field_<id>`.
pub fn resolve_stable_id(
    registry: &RoleRegistry,
    field: &FieldDescriptor,
    section_title: Option<&str>,
) -> String {
    if let Some(id) = field.stable_id.as_deref().filter(|s| !s.is_empty()) {
        return id.to_string();
    }

    if let Some(value) = field.mapping.as_ref().and_then(|m| m.value.as_deref()) {
        if !value.is_empty() {
            return value.to_string();
        }
    }

    if let Some(role) = registry.contact_type_role(field.field_type) {
        return role.to_string();
    }

    if !field.label.trim().is_empty() {
        if let Some(role) = registry.label_role(&field.label) {
            return role.to_string();
        }
        let base = camel_case(&field.label);
        if !base.is_empty() {
            let prefix = section_title.map(camel_case).filter(|t| !t.is_empty());
            return match prefix {
                Some(prefix) => format!("{prefix}_{base}"),
                None => base,
            };
        }
    }

    if let Some(name) = field.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    format!("field_{}", field.id)
}

/// Assign stable ids to every field in `schema` that lacks one.
///
/// Already-assigned ids are never touched. Section titles are used as
/// prefixes only on multi-section forms, where labels repeat across
/// sections; collisions that remain get a numeric suffix so the schema still
/// validates.
pub fn assign_stable_ids(registry: &RoleRegistry, schema: &mut FormSchema) {
    let multi_section = schema.sections.len() > 1;
    let mut taken: HashSet<String> = schema
        .fields()
        .filter_map(|field| field.stable_id.clone())
        .filter(|id| !id.is_empty())
        .collect();

    for section in &mut schema.sections {
        let title =
            if multi_section && !section.title.trim().is_empty() { Some(section.title.as_str()) } else { None };

        for field in &mut section.fields {
            if field.stable_id.as_deref().is_some_and(|id| !id.is_empty()) {
                continue;
            }

            let base = resolve_stable_id(registry, field, title);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }

            debug!(field = %field.id, stable_id = %candidate, "assigned stable id");
            taken.insert(candidate.clone());
            field.stable_id = Some(candidate);
        }
    }
}

/// Camel-case a label: non-alphanumeric runs become a single capitalized
/// boundary, everything else is lowercased, and the first character is
/// forced lowercase.
pub(crate) fn camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut boundary = false;

    for ch in label.chars() {
        if !ch.is_alphanumeric() {
            boundary = true;
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if boundary {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        boundary = false;
    }

    out
}

//! Role tables (the static side of the engine).
//!
//! A [`RoleRegistry`] bundles the lookup tables the mapper and the stable-id
//! resolver consult: the ordered label-pattern table and the field-type
//! tables. It is built once by the caller and passed by reference through a
//! run; there is no ambient global table.
//!
//! The label table is ordered by precedence: the first pattern that matches
//! wins, so more specific contact roles sit above the generic location ones.
//! The patterns themselves are lazily-compiled statics (`regex!`), so
//! constructing a registry is cheap.

use crate::role;
use crate::schema::FieldType;
use regex::Regex;

#[derive(Debug)]
struct LabelPattern {
    role: &'static str,
    pattern: &'static Regex,
}

/// Lookup tables mapping field shape (type, label) to canonical roles.
#[derive(Debug)]
pub struct RoleRegistry {
    label_patterns: Vec<LabelPattern>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        // Order is precedence. The bare "name" pattern only takes exact
        // `name` labels or "full name" so that "First Name" falls through to
        // the firstName entry below it.
        let label_patterns = vec![
            entry(role::EMAIL, regex!(r"(?i)e[-_ ]?mail")),
            entry(role::PHONE, regex!(r"(?i)phone|mobile|\bcell|\btel\b")),
            entry(role::NAME, regex!(r"(?i)^\s*name\s*$|full\s*name")),
            entry(role::FIRST_NAME, regex!(r"(?i)first\s*name")),
            entry(role::LAST_NAME, regex!(r"(?i)last\s*name|surname")),
            entry(role::COMPANY, regex!(r"(?i)company|organi[sz]ation")),
            entry(role::ADDRESS, regex!(r"(?i)address")),
            entry(role::CITY, regex!(r"(?i)\bcity\b|\btown\b")),
            entry(role::STATE, regex!(r"(?i)\bstate\b|province")),
            entry(role::ZIP, regex!(r"(?i)\bzip\b|postal")),
            entry(role::COUNTRY, regex!(r"(?i)country")),
        ];

        Self { label_patterns }
    }

    /// Canonical role for a label, via the ordered pattern table.
    pub fn label_role(&self, label: &str) -> Option<&'static str> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        self.label_patterns.iter().find(|entry| entry.pattern.is_match(label)).map(|entry| entry.role)
    }

    /// Canonical role implied by an input type, for value mapping.
    pub fn type_role(&self, field_type: FieldType) -> Option<&'static str> {
        match field_type {
            FieldType::Email => Some(role::EMAIL),
            FieldType::Tel => Some(role::PHONE),
            FieldType::Name => Some(role::NAME),
            FieldType::Date => Some(role::DATE),
            FieldType::Time => Some(role::TIME),
            FieldType::DateTime => Some(role::DATETIME),
            _ => None,
        }
    }

    /// The narrower type set the stable-id resolver canonicalizes on. Date
    /// and time inputs keep label-derived ids there, so two date fields on
    /// one form do not collide.
    pub fn contact_type_role(&self, field_type: FieldType) -> Option<&'static str> {
        match field_type {
            FieldType::Email => Some(role::EMAIL),
            FieldType::Tel => Some(role::PHONE),
            FieldType::Name => Some(role::NAME),
            _ => None,
        }
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn entry(role: &'static str, pattern: &'static Regex) -> LabelPattern {
    LabelPattern { role, pattern }
}

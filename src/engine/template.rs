//! Template variable substitution.
//!
//! Replaces `{{variable}}` placeholders in template text against a layered
//! data context. Substitution is total: an unknown variable is left verbatim
//! in the output (and logged) so a human reading the sent mail can spot it,
//! and a resolved value is stringified, never re-escaped.

use crate::role;
use crate::schema::{EmailTemplate, MappedRoles, SubmissionData};
use crate::value::display_string;
use regex::Captures;
use serde_json::{Map, Value};
use tracing::warn;

/// Lookup layers for variable resolution. Earlier layers win.
#[derive(Debug, Clone)]
pub struct VariableContext<'a> {
    layers: Vec<&'a Map<String, Value>>,
}

impl<'a> VariableContext<'a> {
    /// Normalized roles first, raw submission keys as fallback.
    pub fn new(roles: &'a MappedRoles, submission: &'a SubmissionData) -> Self {
        Self { layers: vec![roles, submission] }
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.layers.iter().find_map(|layer| layer.get(name))
    }
}

/// Substitute every `{{variable}}` in `text`.
pub fn render(text: &str, context: &VariableContext<'_>) -> String {
    render_traced(text, context).0
}

/// Substitute and report which variable names stayed unresolved.
pub(crate) fn render_traced(text: &str, context: &VariableContext<'_>) -> (String, Vec<String>) {
    let mut unresolved: Vec<String> = Vec::new();
    let rendered = regex!(r"\{\{\s*([^{}]+?)\s*\}\}")
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            match resolve_variable(name, context) {
                Some(value) => value,
                None => {
                    if !unresolved.iter().any(|seen| seen == name) {
                        unresolved.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    for name in &unresolved {
        warn!(variable = %name, "template variable left unresolved");
    }
    (rendered, unresolved)
}

fn resolve_variable(name: &str, context: &VariableContext<'_>) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    if name == role::FIRST_NAME {
        return Some(first_name(context));
    }
    context.lookup(name).and_then(display_string)
}

/// `firstName` always resolves: the mapped value when non-empty, else the
/// first token of the name, else the email local-part, else "Customer".
fn first_name(context: &VariableContext<'_>) -> String {
    if let Some(direct) = context.lookup(role::FIRST_NAME).and_then(display_string) {
        if !direct.is_empty() {
            return direct;
        }
    }
    if let Some(name) = context.lookup(role::NAME).and_then(display_string) {
        if let Some(token) = name.split_whitespace().next() {
            return token.to_string();
        }
    }
    if let Some(email) = context.lookup(role::EMAIL).and_then(display_string) {
        if let Some(local) = email.split('@').next().filter(|local| !local.is_empty()) {
            return local.to_string();
        }
    }
    "Customer".to_string()
}

/// A template with all variables substituted, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

/// Render subject, HTML body, and optional text body of one template.
pub fn render_email(template: &EmailTemplate, context: &VariableContext<'_>) -> RenderedEmail {
    render_email_traced(template, context).0
}

/// Render all parts and collect the unresolved variable names across them.
pub(crate) fn render_email_traced(
    template: &EmailTemplate,
    context: &VariableContext<'_>,
) -> (RenderedEmail, Vec<String>) {
    let (subject, mut unresolved) = render_traced(&template.subject, context);
    let (html_body, html_unresolved) = render_traced(&template.html_content, context);
    let text = template
        .text_content
        .as_deref()
        .map(|text| render_traced(text, context));

    for name in html_unresolved {
        if !unresolved.contains(&name) {
            unresolved.push(name);
        }
    }
    let text_body = text.map(|(rendered, text_unresolved)| {
        for name in text_unresolved {
            if !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }
        rendered
    });

    (RenderedEmail { subject, html_body, text_body }, unresolved)
}

use crate::engine::{self, ProcessDetails, RoleRegistry};
use crate::schema::{EmailRule, EmailTemplate, FormSchema, MappedRoles, SubmissionData};
use std::fmt;
use std::time::Duration;

/// Processing context.
///
/// This holds the stored configuration a submission is processed against:
/// the email rules, the templates they point at, and the address used for
/// `team`-recipient rules.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Email rules evaluated against every submission, in stored order.
    pub rules: Vec<EmailRule>,
    /// Templates the rules reference by id.
    pub templates: Vec<EmailTemplate>,
    /// Where `team`-recipient mail goes; usually the form owner's inbox.
    pub notification_email: Option<String>,
}

/// Options that affect processing behavior.
///
/// This is intentionally minimal today and will grow as more policy knobs
/// (rule deduplication, send throttling) are implemented.
#[derive(Debug, Clone, Default)]
pub struct Options {
    // later: per-template dedup, locale for date formatting, etc.
}

/// One email ready for dispatch, produced by a firing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Rule that fired.
    pub rule_id: String,
    pub rule_name: String,
    /// Template the body came from.
    pub template_id: String,
    /// Resolved destination address.
    pub recipient: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

/// A firing rule that could not produce a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: SkipReason,
}

/// Why a firing rule was skipped instead of sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The rule's template id matched none of the stored templates.
    MissingTemplate { template_id: String },
    /// No usable recipient address could be resolved.
    MissingRecipient,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTemplate { template_id } => {
                write!(f, "template {template_id} not found")
            }
            SkipReason::MissingRecipient => write!(f, "no recipient could be resolved"),
        }
    }
}

/// Result from [`process`] and [`process_with`].
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Normalized `{role: value}` view of the submission.
    pub mapped: MappedRoles,
    /// Rendered emails for the rules that fired, in rule order.
    pub emails: Vec<OutboundEmail>,
    /// Firing rules that produced no send.
    pub skipped: Vec<SkippedRule>,
    /// Total elapsed time spent mapping + evaluating + rendering.
    pub elapsed: Duration,
}

/// Result from [`process_verbose_with`].
#[derive(Debug, Clone)]
pub struct ProcessResultVerbose {
    pub mapped: MappedRoles,
    pub emails: Vec<OutboundEmail>,
    pub skipped: Vec<SkippedRule>,
    pub elapsed: Duration,
    pub details: ProcessDetails,
}

/// Process `submission` against `schema` with an empty [`Context`].
///
/// Without rules or templates this only produces the normalized role map;
/// it is the cheap way to reuse the mapper.
///
/// # Example
/// ```
/// use formwork::{process, FormSchema};
/// use serde_json::json;
///
/// let schema: FormSchema = serde_json::from_value(json!({
///     "sections": [{"id": "s1", "fields": [
///         {"id": "f1", "type": "email", "label": "Email"}
///     ]}]
/// })).unwrap();
/// let submission = json!({"f1": "jane@example.com"});
///
/// let out = process(&schema, submission.as_object().unwrap());
/// assert_eq!(out.mapped["email"], "jane@example.com");
/// ```
pub fn process(schema: &FormSchema, submission: &SubmissionData) -> ProcessResult {
    process_with(schema, submission, &Context::default(), &Options::default())
}

/// Process `submission` against `schema` with the provided `context`/`options`.
pub fn process_with(
    schema: &FormSchema,
    submission: &SubmissionData,
    context: &Context,
    options: &Options,
) -> ProcessResult {
    let registry = RoleRegistry::new();
    let run = engine::run_pipeline(&registry, schema, submission, context, options);

    ProcessResult {
        mapped: run.mapped,
        emails: run.emails,
        skipped: run.skipped,
        elapsed: run.details.total,
    }
}

/// Process with `context`/`options` and return extra (compact) debug details.
///
/// This is useful for answering "why did no email go out" without attaching
/// a debugger. The default [`process_with`] path drops the extra traces.
pub fn process_verbose_with(
    schema: &FormSchema,
    submission: &SubmissionData,
    context: &Context,
    options: &Options,
) -> ProcessResultVerbose {
    let registry = RoleRegistry::new();
    let run = engine::run_pipeline(&registry, schema, submission, context, options);

    ProcessResultVerbose {
        mapped: run.mapped,
        emails: run.emails,
        skipped: run.skipped,
        elapsed: run.details.total,
        details: run.details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FormSchema {
        serde_json::from_value(json!({
            "sections": [{
                "id": "s1",
                "fields": [
                    {"id": "f1", "type": "email", "label": "Email"},
                    {"id": "f2", "type": "select", "label": "Service"}
                ]
            }]
        }))
        .unwrap()
    }

    fn context() -> Context {
        Context {
            rules: vec![serde_json::from_value(json!({
                "id": "r1",
                "name": "Wedding enquiry",
                "conditions": [{"field": "f2", "operator": "equals", "value": "Wedding"}],
                "templateId": "tpl-1"
            }))
            .unwrap()],
            templates: vec![serde_json::from_value(json!({
                "id": "tpl-1",
                "name": "Confirmation",
                "subject": "Hi {{firstName}}",
                "htmlContent": "<p>We got your {{f2}} enquiry.</p>"
            }))
            .unwrap()],
            notification_email: None,
        }
    }

    #[test]
    fn process_with_returns_emails() {
        let submission = json!({"f1": "jane@example.com", "f2": "Wedding"});
        let out = process_with(
            &schema(),
            submission.as_object().unwrap(),
            &context(),
            &Options::default(),
        );

        assert_eq!(out.mapped["email"], "jane@example.com");
        assert_eq!(out.emails.len(), 1);
        assert!(out.skipped.is_empty());

        let email = &out.emails[0];
        assert_eq!(email.recipient, "jane@example.com");
        assert_eq!(email.subject, "Hi jane");
        assert_eq!(email.html_body, "<p>We got your Wedding enquiry.</p>");
    }

    #[test]
    fn process_verbose_includes_details() {
        let submission = json!({"f1": "jane@example.com", "f2": "Wedding"});
        let out = process_verbose_with(
            &schema(),
            submission.as_object().unwrap(),
            &context(),
            &Options::default(),
        );

        assert_eq!(out.elapsed, out.details.total);
        assert!(out.details.mapping_total <= out.details.total);
        assert_eq!(out.details.rules.len(), 1);
        assert_eq!(out.details.renders.len(), 1);
    }
}

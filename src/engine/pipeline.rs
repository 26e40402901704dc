//! End-to-end submission processing.
//!
//! Runs the full pipeline for one submission: map fields to roles, gate
//! visibility, evaluate rules, render templates for the rules that fired.
//! Every stage is timed and traced into [`ProcessDetails`]; the plain
//! processing path drops the details, the verbose path returns them.

use crate::api::{Context, Options, OutboundEmail, SkipReason, SkippedRule};
use crate::engine::catalogue::FieldCatalogue;
use crate::engine::registry::RoleRegistry;
use crate::engine::template::{self, VariableContext};
use crate::engine::trace::{ProcessDetails, RenderTrace};
use crate::engine::{logic, mapper, rules};
use crate::role;
use crate::schema::{EmailRule, EmailTemplate, FormSchema, MappedRoles, RecipientKind, SubmissionData};
use crate::value::display_string;
use std::time::Instant;
use tracing::warn;

pub(crate) struct PipelineRun {
    pub mapped: MappedRoles,
    pub emails: Vec<OutboundEmail>,
    pub skipped: Vec<SkippedRule>,
    pub details: ProcessDetails,
}

pub(crate) fn run_pipeline(
    registry: &RoleRegistry,
    schema: &FormSchema,
    submission: &SubmissionData,
    context: &Context,
    _options: &Options,
) -> PipelineRun {
    let total_start = Instant::now();

    let mapping_start = Instant::now();
    let (mapped, mapping) = mapper::map_fields_traced(registry, schema, submission);
    let mapping_total = mapping_start.elapsed();

    let evaluation_start = Instant::now();
    let hidden = logic::hidden_field_ids(schema, submission);
    let catalogue = FieldCatalogue::new(schema, &hidden);
    let (firing, rule_verdicts) = rules::evaluate_rules(&context.rules, &catalogue, submission);
    let evaluation_total = evaluation_start.elapsed();

    let rendering_start = Instant::now();
    let variables = VariableContext::new(&mapped, submission);
    let mut emails = Vec::new();
    let mut skipped = Vec::new();
    let mut renders = Vec::new();
    for rule in firing {
        let Some(template) = context.templates.iter().find(|t| t.id == rule.template_id) else {
            warn!(rule = %rule.id, template = %rule.template_id, "firing rule skipped, template not found");
            skipped.push(SkippedRule {
                rule_id: rule.id.clone(),
                reason: SkipReason::MissingTemplate { template_id: rule.template_id.clone() },
            });
            continue;
        };
        let Some(recipient) = resolve_recipient(rule, &mapped, context) else {
            warn!(rule = %rule.id, kind = ?rule.recipient, "firing rule skipped, no recipient");
            skipped.push(SkippedRule {
                rule_id: rule.id.clone(),
                reason: SkipReason::MissingRecipient,
            });
            continue;
        };

        let (rendered, unresolved) = template::render_email_traced(template, &variables);
        let (cc, bcc) = carbon_copies(rule, template);
        emails.push(OutboundEmail {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            template_id: template.id.clone(),
            recipient,
            cc,
            bcc,
            subject: rendered.subject,
            html_body: rendered.html_body,
            text_body: rendered.text_body,
        });
        renders.push(RenderTrace {
            rule_id: rule.id.clone(),
            template_id: template.id.clone(),
            unresolved,
        });
    }
    let rendering_total = rendering_start.elapsed();

    let mut hidden_fields: Vec<String> = hidden.into_iter().collect();
    hidden_fields.sort();

    let details = ProcessDetails {
        total: total_start.elapsed(),
        mapping_total,
        mapping,
        evaluation_total,
        rules: rule_verdicts,
        rendering_total,
        renders,
        hidden_fields,
    };

    PipelineRun { mapped, emails, skipped, details }
}

/// Where a firing rule's mail goes. `None` means the rule is skipped.
fn resolve_recipient(rule: &EmailRule, mapped: &MappedRoles, context: &Context) -> Option<String> {
    match rule.recipient {
        RecipientKind::Submitter => mapped
            .get(role::EMAIL)
            .and_then(display_string)
            .filter(|email| !email.is_empty()),
        RecipientKind::Team => context
            .notification_email
            .clone()
            .filter(|email| !email.is_empty()),
        RecipientKind::Custom => rule
            .custom_recipient
            .clone()
            .filter(|email| !email.is_empty()),
        RecipientKind::Unknown => None,
    }
}

/// Rule CC/BCC lists win when non-empty; the template's are the default.
fn carbon_copies(rule: &EmailRule, template: &EmailTemplate) -> (Vec<String>, Vec<String>) {
    let cc = if rule.cc_emails.is_empty() {
        template.cc_emails.clone()
    } else {
        rule.cc_emails.clone()
    };
    let bcc = if rule.bcc_emails.is_empty() {
        template.bcc_emails.clone()
    } else {
        rule.bcc_emails.clone()
    };
    (cc, bcc)
}

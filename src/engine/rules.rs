//! Email rule evaluation.
//!
//! A rule fires when it is active and every condition holds against the
//! submission, with condition references settled through the field
//! catalogue. Conditions are ANDed; a reference nothing in the catalogue
//! can settle fails its condition outright. Rules are independent: several
//! may fire for one submission and each firing rule produces its own send.

use crate::engine::catalogue::FieldCatalogue;
use crate::engine::logic::{self, condition_met};
use crate::engine::trace::{RuleOutcome, RuleVerdict};
use crate::schema::{EmailRule, FormSchema, SubmissionData};
use tracing::debug;

/// The rules that fire for `submission`, in stored order.
///
/// Fields hidden by conditional logic are excluded from reference
/// resolution, so a rule cannot match on a value the submitter never saw.
pub fn select_firing_rules<'a>(
    rules: &'a [EmailRule],
    schema: &FormSchema,
    submission: &SubmissionData,
) -> Vec<&'a EmailRule> {
    let hidden = logic::hidden_field_ids(schema, submission);
    let catalogue = FieldCatalogue::new(schema, &hidden);
    evaluate_rules(rules, &catalogue, submission).0
}

pub(crate) fn evaluate_rules<'a>(
    rules: &'a [EmailRule],
    catalogue: &FieldCatalogue<'_>,
    submission: &SubmissionData,
) -> (Vec<&'a EmailRule>, Vec<RuleVerdict>) {
    let mut firing = Vec::new();
    let mut verdicts = Vec::with_capacity(rules.len());

    for rule in rules {
        let outcome = evaluate_rule(rule, catalogue, submission);
        if outcome == RuleOutcome::Fired {
            firing.push(rule);
        }
        verdicts.push(RuleVerdict {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            outcome,
        });
    }

    (firing, verdicts)
}

fn evaluate_rule(
    rule: &EmailRule,
    catalogue: &FieldCatalogue<'_>,
    submission: &SubmissionData,
) -> RuleOutcome {
    if !rule.active {
        return RuleOutcome::Inactive;
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        let value = catalogue
            .resolve(&condition.field, submission)
            .and_then(|id| submission.get(id));
        // Unresolvable references fail their condition, whatever the operator.
        if value.is_none() || !condition_met(condition, value) {
            debug!(rule = %rule.id, index, field = %condition.field, "rule condition failed");
            return RuleOutcome::ConditionFailed { index, field: condition.field.clone() };
        }
    }

    debug!(rule = %rule.id, conditions = rule.conditions.len(), "rule fired");
    RuleOutcome::Fired
}

//! Run traces.
//!
//! Small structs recording what a pipeline run decided and why: which
//! strategy filled each role, which rules fired or were passed over, and
//! which template variables stayed unresolved.
//!
//! Traces are meant for the verbose processing path and the debug CLI. They
//! are compact by design; the plain path simply drops them.

use std::time::Duration;

/// Which mapper strategy produced a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Declared `mapping` on the field descriptor.
    ExplicitMapping,
    /// The field's input type implied the role.
    FieldType,
    /// The field's label matched the pattern table.
    LabelPattern,
    /// Field name or id used verbatim as the role key.
    FieldKey,
    /// Contact extractor scan over the whole payload.
    ContactScan,
}

/// One filled role and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTrace {
    pub role: String,
    /// Field that supplied the value; `None` for payload-wide contact scans.
    pub field_id: Option<String>,
    pub strategy: Strategy,
}

/// Why a rule fired or did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Fired,
    Inactive,
    /// First condition that failed, with the reference it named.
    ConditionFailed { index: usize, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleVerdict {
    pub rule_id: String,
    pub rule_name: String,
    pub outcome: RuleOutcome,
}

/// Rendering outcome for one firing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTrace {
    pub rule_id: String,
    pub template_id: String,
    /// Variable names left verbatim in the output.
    pub unresolved: Vec<String>,
}

/// Details returned by the verbose processing path.
#[derive(Debug, Clone, Default)]
pub struct ProcessDetails {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Time spent mapping fields to roles.
    pub mapping_total: Duration,
    /// Per-role mapping decisions.
    pub mapping: Vec<MappingTrace>,
    /// Time spent on visibility gating and rule evaluation.
    pub evaluation_total: Duration,
    /// Per-rule verdicts, in stored rule order.
    pub rules: Vec<RuleVerdict>,
    /// Time spent rendering templates.
    pub rendering_total: Duration,
    /// Per-email rendering traces.
    pub renders: Vec<RenderTrace>,
    /// Fields hidden by conditional logic for this submission (sorted).
    pub hidden_fields: Vec<String>,
}

#[macro_use]
mod macros;
mod api;
mod engine;
mod schema;
mod value;

pub use api::{
    Context, Options, OutboundEmail, ProcessResult, ProcessResultVerbose, SkipReason, SkippedRule,
    process, process_verbose_with, process_with,
};
pub use engine::{
    ContactFields, MappingTrace, ProcessDetails, RenderTrace, RenderedEmail, RoleRegistry,
    RuleOutcome, RuleVerdict, Strategy, VariableContext, assign_stable_ids, extract_contact_fields,
    find_phone, is_visible, map_fields, render, render_email, resolve_stable_id,
    select_firing_rules,
};
pub use schema::{
    Condition, ConditionalLogic, EmailRule, EmailTemplate, FieldDescriptor, FieldMapping,
    FieldType, FormSchema, LogicAction, MappedRoles, MappingKind, Operator, RecipientKind,
    SchemaError, Section, SubmissionData,
};

// --- Role vocabulary ---------------------------------------------------------

/// Canonical role keys produced by the mapper and consumed by rules and
/// templates. Custom mappings extend this vocabulary at runtime; these are
/// the keys the engine itself knows how to fill and resolve.
pub(crate) mod role {
    pub const NAME: &str = "name";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const DATETIME: &str = "datetime";
    pub const LOCATION: &str = "location";
    pub const COMPANY: &str = "company";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP: &str = "zip";
    pub const COUNTRY: &str = "country";
}

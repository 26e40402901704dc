//! Submission processing engine.
//!
//! This module is the *public entry point* for the form-processing engine.
//! Historically, the engine lived in a single monolithic `engine.rs`; it is now
//! split into focused submodules under `src/engine/` while keeping public paths
//! stable (for example `crate::engine::RoleRegistry` and
//! `crate::engine::map_fields`).
//!
//! ## How the parts work together
//!
//! At a high level, processing one submission is a pipeline:
//!
//! ```text
//! schema ── assign_stable_ids ── (stable_id.rs, one-time, at design time)
//!
//! submission ──┬─ map_fields ──────────── {role: value}   (mapper.rs)
//!              │    ├─ registry tables                    (registry.rs)
//!              │    └─ contact extraction                 (contact.rs)
//!              │
//!              ├─ hidden_field_ids ── visibility gates    (logic.rs)
//!              │         │
//!              │         v
//!              ├─ FieldCatalogue ── reference index       (catalogue.rs)
//!              │         │
//!              │         v
//!              └─ evaluate_rules ── firing rules          (rules.rs)
//!                        │
//!                        v
//!                render_email per firing rule             (template.rs)
//!                        │
//!                        v
//!                 Vec<OutboundEmail>
//! ```
//!
//! The engine leans on **fail-closed totality**: a reference that cannot be
//! settled, a type that cannot be compared, or a variable that cannot be
//! resolved never aborts a run. Conditions fall to "not met" and unresolved
//! variables stay verbatim in the rendered text.
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: the ordered label-pattern and type tables that name
//!   canonical roles.
//! - `stable_id.rs`: deterministic stable-id derivation and schema-wide
//!   assignment.
//! - `contact.rs`: heuristic name/email extraction and the scored phone
//!   search.
//! - `mapper.rs`: the per-field strategy chain producing the `{role: value}`
//!   map.
//! - `logic.rs`: conditional show/hide evaluation and the operator semantics
//!   shared with rule conditions.
//! - `catalogue.rs`: settles loose rule references (id, stable id, label) to
//!   submitted field ids.
//! - `rules.rs`: active/condition gating that selects the rules to fire.
//! - `template.rs`: `{{variable}}` substitution with layered lookup.
//! - `pipeline.rs`: ties the stages together and times them.
//! - `trace.rs`: optional per-run decision traces for the verbose path.
//!
//! ## Public surface
//!
//! Most code interacts with the engine via:
//!
//! - [`RoleRegistry`]
//! - [`map_fields`] / [`extract_contact_fields`] / [`find_phone`]
//! - [`select_firing_rules`] / [`is_visible`]
//! - [`render`] / [`render_email`]
//!
//! ## Adding new roles
//!
//! - A new canonical role gets a constant in `crate::role` and, when it
//!   should be inferred, a row in `RoleRegistry::new`'s pattern table or the
//!   type tables.
//! - Roles that stand in for contact details may also need the extractor in
//!   `contact.rs` taught to fill them.

#[path = "engine/catalogue.rs"]
mod catalogue;
#[path = "engine/contact.rs"]
mod contact;
#[path = "engine/logic.rs"]
mod logic;
#[path = "engine/mapper.rs"]
mod mapper;
#[path = "engine/pipeline.rs"]
mod pipeline;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/rules.rs"]
mod rules;
#[path = "engine/stable_id.rs"]
mod stable_id;
#[path = "engine/template.rs"]
mod template;
#[path = "engine/trace.rs"]
mod trace;


#[allow(unused_imports)]
pub use contact::{extract_contact_fields, find_phone, ContactFields};
#[allow(unused_imports)]
pub use logic::is_visible;
#[allow(unused_imports)]
pub use mapper::map_fields;
#[allow(unused_imports)]
pub use registry::RoleRegistry;
#[allow(unused_imports)]
pub use rules::select_firing_rules;
#[allow(unused_imports)]
pub use stable_id::{assign_stable_ids, resolve_stable_id};
#[allow(unused_imports)]
pub use template::{render, render_email, RenderedEmail, VariableContext};
#[allow(unused_imports)]
pub use trace::{MappingTrace, ProcessDetails, RenderTrace, RuleOutcome, RuleVerdict, Strategy};

pub(crate) use pipeline::run_pipeline;

//! Live template evaluation.
//!
//! - [`TemplateBackend`]: what evaluates templates and pushes results
//! - [`TemplateSubscriptions`]: per-field subscription lifecycle for one chip

mod backend;
mod subscriptions;

pub use backend::{ResultCallback, TemplateBackend, TemplateRequest, Unsubscribe};
pub use subscriptions::{TemplateSubscriptions, UpdateSender};

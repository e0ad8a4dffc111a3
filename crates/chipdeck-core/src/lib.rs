pub mod config;
pub mod markup;
pub mod template;

pub(crate) mod utils;

mod cache;
mod chip;
mod error;
mod hash;

#[cfg(test)]
mod tests;

pub use cache::{CachedResults, DEFAULT_CAPACITY, ResultCache};
pub use chip::TemplateChip;
pub use error::{BackendError, BackendErrorKind, Error, Result};
pub use hash::ConfigHash;
pub use template::{
    ResultCallback, TemplateBackend, TemplateRequest, TemplateSubscriptions, Unsubscribe,
    UpdateSender,
};

pub use chipdeck_types::*;

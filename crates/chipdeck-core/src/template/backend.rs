//! The seam between chips and whatever evaluates their templates.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chipdeck_types::{ChipConfig, ChipField, TemplateResult, UserContext};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Everything a backend needs to open one live template subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRequest {
    pub template: String,
    /// Entities the template is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ids: Option<Vec<String>>,
    /// Variables exposed to the template: `config`, `user` and `entity`
    #[serde(default)]
    pub variables: serde_json::Value,
    /// Fail on undefined variables instead of rendering them empty
    #[serde(default)]
    pub strict: bool,
}

impl TemplateRequest {
    /// Build the request for one field of a chip.
    ///
    /// Returns `None` when the field has no template text.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be converted to JSON.
    pub fn for_field(
        config: &ChipConfig,
        field: ChipField,
        user: Option<&UserContext>,
    ) -> serde_json::Result<Option<Self>> {
        let Some(template) = config.field(field) else {
            return Ok(None);
        };

        let mut variables = serde_json::Map::new();
        variables.insert("config".to_string(), serde_json::to_value(config)?);
        variables.insert(
            "user".to_string(),
            user.map_or(serde_json::Value::Null, |u| u.name.clone().into()),
        );
        variables.insert(
            "entity".to_string(),
            config
                .entity
                .clone()
                .map_or(serde_json::Value::Null, Into::into),
        );

        Ok(Some(Self {
            template: template.to_string(),
            entity_ids: config.entity.clone().map(|entity| vec![entity]),
            variables: serde_json::Value::Object(variables),
            strict: true,
        }))
    }
}

/// Called by the backend every time a subscribed template renders.
pub type ResultCallback = Arc<dyn Fn(TemplateResult) + Send + Sync>;

/// Cancels a live subscription. Consumed on use.
pub struct Unsubscribe(Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BackendError>> + Send>);

impl Unsubscribe {
    pub fn new<F, Fut>(cancel: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        Self(Box::new(move || Box::pin(cancel())))
    }

    /// An unsubscribe that has nothing to cancel.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| async { Ok(()) })
    }

    /// Cancel the subscription.
    ///
    /// # Errors
    ///
    /// Returns whatever the backend reports for the cancellation.
    pub async fn call(self) -> Result<(), BackendError> {
        (self.0)().await
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}

/// A service that renders templates and pushes fresh results when the state
/// they depend on changes.
#[async_trait]
pub trait TemplateBackend: Send + Sync {
    /// Open a subscription. `on_result` is invoked for the first render and
    /// for every re-render until the returned [`Unsubscribe`] is called.
    async fn subscribe(
        &self,
        request: TemplateRequest,
        on_result: ResultCallback,
    ) -> Result<Unsubscribe, BackendError>;
}

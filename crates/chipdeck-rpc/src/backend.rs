//! [`TemplateBackend`] over an [`RpcClient`].

use std::sync::Arc;

use async_trait::async_trait;
use chipdeck_core::{
    BackendError, BackendErrorKind, ResultCallback, TemplateBackend, TemplateRequest, Unsubscribe,
};
use tracing::{debug, error, warn};

use crate::client::{ClientError, EventReceiver, RpcClient};
use crate::protocol::{NOT_FOUND, SubscriptionId, TEMPLATE_ERROR, TemplateEvent};

impl From<ClientError> for BackendError {
    fn from(e: ClientError) -> Self {
        let kind = match &e {
            ClientError::Rpc {
                code: NOT_FOUND, ..
            } => BackendErrorKind::NotFound,
            ClientError::Rpc {
                code: TEMPLATE_ERROR,
                ..
            } => BackendErrorKind::TemplateError,
            ClientError::Io(_) | ClientError::Codec(_) | ClientError::ConnectionClosed => {
                BackendErrorKind::Disconnected
            }
            ClientError::Rpc { .. } | ClientError::Json(_) | ClientError::Timeout => {
                BackendErrorKind::Other
            }
        };
        let message = match e {
            ClientError::Rpc { message, .. } => message,
            other => other.to_string(),
        };
        BackendError::new(kind, message)
    }
}

/// Renders templates on a remote server.
///
/// Each subscription gets a forwarding task that feeds rendered results to
/// the chip's callback until the subscription is cancelled or the connection
/// drops.
#[derive(Clone)]
pub struct RpcTemplateBackend {
    client: Arc<RpcClient>,
}

impl RpcTemplateBackend {
    #[must_use]
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }
}

#[async_trait]
impl TemplateBackend for RpcTemplateBackend {
    async fn subscribe(
        &self,
        request: TemplateRequest,
        on_result: ResultCallback,
    ) -> Result<Unsubscribe, BackendError> {
        let (subscription, events) = self.client.render_template(request.into()).await?;
        let forward = tokio::spawn(forward_events(subscription, events, on_result));

        let client = Arc::clone(&self.client);
        Ok(Unsubscribe::new(move || async move {
            forward.abort();
            client
                .unsubscribe(subscription)
                .await
                .map_err(BackendError::from)
        }))
    }
}

async fn forward_events(
    subscription: SubscriptionId,
    mut events: EventReceiver,
    on_result: ResultCallback,
) {
    while let Some(event) = events.recv().await {
        match event {
            TemplateEvent::Rendered(result) => on_result(result),
            TemplateEvent::Failed { error: message, level } => {
                if level
                    .as_deref()
                    .is_some_and(|level| level.eq_ignore_ascii_case("warning"))
                {
                    warn!("Template {} warning: {}", subscription, message);
                } else {
                    error!("Template {} failed to render: {}", subscription, message);
                }
            }
        }
    }
    debug!("Event stream for subscription {} ended", subscription);
}

//! RPC client for a template server.
//!
//! One reader task owns the read half of the socket. Responses are matched
//! to pending requests by id; `template_result` notifications are routed to
//! the channel of their subscription. A notification can overtake the
//! response that announces its subscription id, so notifications for ids
//! nobody has claimed yet are buffered and replayed on registration.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::protocol::{
    Message, RENDER_TEMPLATE, RenderTemplateParams, RenderTemplateResult, Request, RequestId,
    Response, RpcError, SubscriptionId, TEMPLATE_RESULT, TemplateEvent, TemplateResultParams,
    UNSUBSCRIBE, UnsubscribeParams,
};
use crate::transport::{CodecError, JsonRpcCodec};

/// Default time to wait for a response
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Early notifications kept per unclaimed subscription
const MAX_BUFFERED_EVENTS: usize = 16;

/// Unclaimed subscriptions buffered at once; the oldest is dropped first
const MAX_UNCLAIMED_SUBSCRIPTIONS: usize = 64;

/// Recently released ids remembered to discard their late events
const MAX_RELEASED_SUBSCRIPTIONS: usize = 64;

/// Errors that can occur with the RPC client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error: {code} - {message}")]
    Rpc { code: i32, message: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timeout")]
    Timeout,
}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        ClientError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

/// Pending request waiting for a response
type PendingRequest = oneshot::Sender<Response>;

type Sink = SplitSink<Framed<UnixStream, JsonRpcCodec>, Message>;

/// Receives render outcomes for one subscription
pub type EventReceiver = mpsc::UnboundedReceiver<TemplateEvent>;

/// Where `template_result` notifications go.
#[derive(Default)]
struct Router {
    routes: HashMap<SubscriptionId, mpsc::UnboundedSender<TemplateEvent>>,
    early: HashMap<SubscriptionId, Vec<TemplateEvent>>,
    /// Unclaimed ids in arrival order
    early_order: VecDeque<SubscriptionId>,
    /// Ids recently released by `unsubscribe`; late events for them are dropped
    released: VecDeque<SubscriptionId>,
}

impl Router {
    fn dispatch(&mut self, params: TemplateResultParams) {
        let TemplateResultParams {
            subscription,
            event,
        } = params;

        if let Some(route) = self.routes.get(&subscription) {
            if route.send(event).is_err() {
                debug!("Receiver for subscription {} is gone", subscription);
                self.routes.remove(&subscription);
            }
            return;
        }
        if self.released.contains(&subscription) {
            return;
        }

        if !self.early.contains_key(&subscription) {
            if self.early_order.len() >= MAX_UNCLAIMED_SUBSCRIPTIONS
                && let Some(oldest) = self.early_order.pop_front()
            {
                warn!(
                    "Too many unclaimed subscriptions, dropping events for {}",
                    oldest
                );
                self.early.remove(&oldest);
            }
            self.early_order.push_back(subscription);
        }

        let buffered = self.early.entry(subscription).or_default();
        if buffered.len() < MAX_BUFFERED_EVENTS {
            buffered.push(event);
        } else {
            warn!(
                "Dropping event for unclaimed subscription {}",
                subscription
            );
        }
    }

    fn claim(&mut self, subscription: SubscriptionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in self.take_early(subscription) {
            let _ = tx.send(event);
        }
        self.released.retain(|id| *id != subscription);
        self.routes.insert(subscription, tx);
        rx
    }

    fn release(&mut self, subscription: SubscriptionId) {
        self.routes.remove(&subscription);
        self.take_early(subscription);
        if !self.released.contains(&subscription) {
            if self.released.len() >= MAX_RELEASED_SUBSCRIPTIONS {
                self.released.pop_front();
            }
            self.released.push_back(subscription);
        }
    }

    fn take_early(&mut self, subscription: SubscriptionId) -> Vec<TemplateEvent> {
        let Some(events) = self.early.remove(&subscription) else {
            return Vec::new();
        };
        self.early_order.retain(|id| *id != subscription);
        events
    }

    fn clear(&mut self) {
        self.routes.clear();
        self.early.clear();
        self.early_order.clear();
        self.released.clear();
    }
}

fn router_lock(router: &StdMutex<Router>) -> std::sync::MutexGuard<'_, Router> {
    router.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RPC client for a template server
pub struct RpcClient {
    sender: Arc<Mutex<Sink>>,
    pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>>,
    router: Arc<StdMutex<Router>>,
    connected: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl RpcClient {
    /// Connect to the template server listening on `path`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the socket connection fails.
    pub async fn connect_to(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        let framed = Framed::new(stream, JsonRpcCodec::new());
        let (sink, stream) = framed.split();

        let pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let router = Arc::new(StdMutex::new(Router::default()));
        let connected = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(read_loop(
            stream,
            Arc::clone(&pending),
            Arc::clone(&router),
            Arc::clone(&connected),
        ));

        debug!("Connected to template server at {}", path.as_ref().display());

        Ok(Self {
            sender: Arc::new(Mutex::new(sink)),
            pending,
            router,
            connected,
            reader,
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Use a different response timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the reader still sees an open connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send an RPC request and wait for a response.
    ///
    /// A `null` result deserializes from `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails, the connection closes, the server
    /// answers with an error, or the result does not deserialize.
    pub async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::ConnectionClosed);
        }

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = Request::new(method, params, id.clone());

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }
        // The reader may have cleared the pending map just before the insert
        if !self.is_connected() {
            self.pending.lock().await.remove(&id);
            return Err(ClientError::ConnectionClosed);
        }

        {
            let mut sender = self.sender.lock().await;
            if let Err(e) = sender.send(Message::Request(request)).await {
                self.pending.lock().await.remove(&id);
                return Err(e.into());
            }
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(ClientError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ClientError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(error.into());
        }

        let result = response.result.unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(result)?)
    }

    /// Open a template subscription.
    ///
    /// Returns the server's subscription id and a channel yielding every
    /// render outcome, starting with any that arrived before the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a template the server cannot
    /// compile comes back as `ClientError::Rpc` with `TEMPLATE_ERROR`.
    pub async fn render_template(
        &self,
        params: RenderTemplateParams,
    ) -> Result<(SubscriptionId, EventReceiver), ClientError> {
        let result: RenderTemplateResult = self
            .request(RENDER_TEMPLATE, Some(serde_json::to_value(params)?))
            .await?;

        let events = router_lock(&self.router).claim(result.subscription);
        debug!("Template subscription {} registered", result.subscription);
        Ok((result.subscription, events))
    }

    /// Cancel a template subscription. Its channel closes immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; an unknown id comes back as
    /// `ClientError::Rpc` with `NOT_FOUND`.
    pub async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ClientError> {
        router_lock(&self.router).release(subscription);
        let params = UnsubscribeParams { subscription };
        let _: serde_json::Value = self
            .request(UNSUBSCRIBE, Some(serde_json::to_value(params)?))
            .await?;
        Ok(())
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut stream: futures_util::stream::SplitStream<Framed<UnixStream, JsonRpcCodec>>,
    pending: Arc<Mutex<HashMap<RequestId, PendingRequest>>>,
    router: Arc<StdMutex<Router>>,
    connected: Arc<AtomicBool>,
) {
    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                warn!("Template server connection failed: {}", e);
                break;
            }
        };

        if let Message::Response(response) = message {
            let mut pending = pending.lock().await;
            match pending.remove(&response.id) {
                Some(tx) => {
                    let _ = tx.send(response);
                }
                None => debug!("Response for unknown request {}", response.id),
            }
            continue;
        }

        match message.as_notification() {
            Some((TEMPLATE_RESULT, params)) => {
                match params
                    .cloned()
                    .map(serde_json::from_value::<TemplateResultParams>)
                {
                    Some(Ok(params)) => router_lock(&router).dispatch(params),
                    Some(Err(e)) => warn!("Malformed template_result: {}", e),
                    None => warn!("template_result without params"),
                }
            }
            Some((method, _)) => debug!("Ignoring notification {}", method),
            None => debug!("Ignoring unexpected request from server"),
        }
    }

    debug!("Template server connection closed");
    connected.store(false, Ordering::SeqCst);
    // Dropping the senders fails every waiter and closes every event channel
    pending.lock().await.clear();
    router_lock(&router).clear();
}

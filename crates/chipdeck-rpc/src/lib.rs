//! JSON-RPC 2.0 template backend for chipdeck.
//!
//! - [`protocol`]: message envelopes and the template methods
//! - [`transport`]: length-prefixed codec for message framing
//! - [`client`]: connection with request/response matching and
//!   subscription routing
//! - [`backend`]: [`chipdeck_core::TemplateBackend`] on top of the client
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chipdeck_rpc::{RpcClient, RpcTemplateBackend};
//!
//! # async fn example() -> Result<(), chipdeck_rpc::ClientError> {
//! let client = RpcClient::connect_to("/run/user/1000/chipdeck.sock").await?;
//! let backend = RpcTemplateBackend::new(Arc::new(client));
//! # let _ = backend;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod protocol;
pub mod transport;

pub use backend::RpcTemplateBackend;
pub use client::{ClientError, DEFAULT_TIMEOUT, EventReceiver, RpcClient};
pub use protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, Message,
    NOT_FOUND, Notification, PARSE_ERROR, RENDER_TEMPLATE, RenderTemplateParams,
    RenderTemplateResult, Request, RequestId, Response, RpcError, SubscriptionId, TEMPLATE_ERROR,
    TEMPLATE_RESULT, TemplateEvent, TemplateResultParams, UNSUBSCRIBE, UnsubscribeParams,
};
pub use transport::{CodecError, JsonRpcCodec, MAX_MESSAGE_SIZE};

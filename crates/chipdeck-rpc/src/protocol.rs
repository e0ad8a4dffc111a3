//! JSON-RPC 2.0 protocol types.
//!
//! Envelope types shared by every message, plus the params and results of
//! the template methods:
//!
//! | Method            | Kind         | Params                          | Result           |
//! |-------------------|--------------|---------------------------------|------------------|
//! | `render_template` | request      | [`RenderTemplateParams`]        | [`RenderTemplateResult`] |
//! | `unsubscribe`     | request      | [`UnsubscribeParams`]           | `null`           |
//! | `template_result` | notification | [`TemplateResultParams`]        |                  |

use chipdeck_core::{TemplateRequest, TemplateResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const NOT_FOUND: i32 = -32002;
pub const TEMPLATE_ERROR: i32 = -32003;

pub const RENDER_TEMPLATE: &str = "render_template";
pub const UNSUBSCRIBE: &str = "unsubscribe";
pub const TEMPLATE_RESULT: &str = "template_result";

/// Server-assigned id of a live template subscription
pub type SubscriptionId = u64;

/// JSON-RPC 2.0 Request ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// JSON-RPC 2.0 Request. Without an `id` it is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Request {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id),
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: RequestId,
}

impl Response {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 Notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found")
    }

    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    #[must_use]
    pub fn subscription_not_found(subscription: SubscriptionId) -> Self {
        Self::new(NOT_FOUND, format!("Subscription not found: {subscription}"))
    }

    #[must_use]
    pub fn template_error(message: impl Into<String>) -> Self {
        Self::new(TEMPLATE_ERROR, message)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Any message on the wire.
///
/// Untagged: an object without `id` parses as a [`Request`] with `id: None`,
/// so notifications usually arrive as `Message::Request`. Use
/// [`Message::as_notification`] instead of matching on the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
    Notification(Notification),
}

impl Message {
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(r) if r.id.is_some())
    }

    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Request(r) if r.id.is_none())
            || matches!(self, Message::Notification(_))
    }

    /// Method and params, if this message is a notification.
    #[must_use]
    pub fn as_notification(&self) -> Option<(&str, Option<&Value>)> {
        match self {
            Message::Request(r) if r.id.is_none() => Some((&r.method, r.params.as_ref())),
            Message::Notification(n) => Some((&n.method, n.params.as_ref())),
            _ => None,
        }
    }
}

/// Params of `render_template`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTemplateParams {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ids: Option<Vec<String>>,
    #[serde(default)]
    pub variables: Value,
    #[serde(default)]
    pub strict: bool,
}

impl From<TemplateRequest> for RenderTemplateParams {
    fn from(request: TemplateRequest) -> Self {
        Self {
            template: request.template,
            entity_ids: request.entity_ids,
            variables: request.variables,
            strict: request.strict,
        }
    }
}

/// Result of `render_template`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTemplateResult {
    pub subscription: SubscriptionId,
}

/// Params of `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeParams {
    pub subscription: SubscriptionId,
}

/// Params of the `template_result` notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateResultParams {
    pub subscription: SubscriptionId,
    #[serde(flatten)]
    pub event: TemplateEvent,
}

/// A render outcome pushed for a live subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateEvent {
    /// The template rendered
    Rendered(TemplateResult),
    /// The template failed to render; the last result stays valid
    Failed {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<String>,
    },
}

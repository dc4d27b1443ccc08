//! JSON-RPC 2.0 message types for LSP communication.

use std::sync::atomic::{AtomicI64, Ordering};

use lsp_types::notification::Notification;
use lsp_types::request::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thread-safe request ID generator.
static REQUEST_ID: AtomicI64 = AtomicI64::new(1);

/// JSON-RPC error code for unknown methods.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC error code for malformed parameters.
pub const INVALID_PARAMS: i64 = -32602;

/// Generates a unique request ID.
///
/// IDs are monotonically increasing and thread-safe.
#[must_use]
pub fn next_request_id() -> i64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// Serialises typed parameters, omitting `null` (e.g. `shutdown` and `exit`).
fn params_value<P: Serialize>(params: P) -> Result<Option<Value>, serde_json::Error> {
    let value = serde_json::to_value(params)?;
    Ok((!value.is_null()).then_some(value))
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Unique request identifier.
    pub id: i64,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new request with an auto-generated ID.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_request_id(),
            method: method.into(),
            params,
        }
    }

    /// Builds a request for a typed LSP method.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error when the parameters cannot be encoded.
    pub fn typed<R: Request>(params: R::Params) -> Result<Self, serde_json::Error> {
        Ok(Self::new(R::METHOD, params_value(params)?))
    }
}

/// A JSON-RPC 2.0 notification (no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }

    /// Builds a notification for a typed LSP method.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error when the parameters cannot be encoded.
    pub fn typed<N: Notification>(params: N::Params) -> Result<Self, serde_json::Error> {
        Ok(Self::new(N::METHOD, params_value(params)?))
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version.
    pub jsonrpc: String,
    /// Request identifier this response corresponds to.
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Error returned for server requests the client does not implement.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("unhandled method {method}"),
            data: None,
        }
    }

    /// Error returned for server requests with undecodable parameters.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }
}

/// A request initiated by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRequest {
    /// Identifier chosen by the server (number or string).
    pub id: Value,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A notification sent by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerNotification {
    /// The notification method.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// The client's answer to a [`ServerRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcReply {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Identifier copied from the server request.
    pub id: Value,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcReply {
    /// Successful reply carrying `result`.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Failed reply carrying `error`.
    #[must_use]
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Any message read from the server.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    /// Response to one of the client's requests.
    Response(JsonRpcResponse),
    /// Request initiated by the server.
    ServerRequest(ServerRequest),
    /// Notification sent by the server.
    Notification(ServerNotification),
}

impl JsonRpcMessage {
    /// Decodes a message body.
    ///
    /// Messages with a `method` and a non-null `id` are server requests,
    /// messages with only a `method` are notifications, everything else is a
    /// response.
    ///
    /// # Errors
    ///
    /// Returns the decoding error for malformed JSON or a mismatched shape.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        let has_method = value.get("method").is_some();
        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        match (has_method, has_id) {
            (true, true) => serde_json::from_value(value).map(Self::ServerRequest),
            (true, false) => serde_json::from_value(value).map(Self::Notification),
            (false, _) => serde_json::from_value(value).map(Self::Response),
        }
    }

    /// Short label used in trace output.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Response(response) => match response.id {
                Some(id) => format!("response #{id}"),
                None => String::from("response"),
            },
            Self::ServerRequest(request) => request.method.clone(),
            Self::Notification(notification) => notification.method.clone(),
        }
    }
}

//! Envelope types for bridge protocol messages.
//!
//! Three message shapes travel over the wire:
//!
//! - [`Request`]: client → bridge method call, correlated by `id`
//! - [`Response`]: bridge → client result for a request, same `id`
//! - [`Push`]: bridge → client unsolicited message delivery (no `id`),
//!   tagged with a numeric message-type code
//!
//! [`Message`] is the discriminated union used when decoding inbound frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method call sent to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request id for correlating the response.
    pub id: u32,
    /// Bridge method name (e.g. `"send_text"`, `"get_rooms"`).
    pub method: String,
    /// Method parameters as a JSON object.
    pub params: Value,
}

/// Result of a [`Request`], correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request id this response answers.
    pub id: u32,
    /// Success payload (mutually exclusive with `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure payload (mutually exclusive with `data`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Error details carried in a failed [`Response`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    pub message: String,
    /// Error class name reported by the bridge, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Numeric error code from the underlying client, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

/// Unsolicited inbound message from the bridge.
///
/// The bridge delivers every received chat message (and membership change)
/// as a push. `kind` is the numeric message-type tag; `data` is the
/// category-dependent payload, decoded by
/// [`InboundMessage::parse`](crate::InboundMessage::parse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Push {
    /// Numeric message-type tag (see [`MessageKind`](crate::MessageKind)).
    #[serde(rename = "type")]
    pub kind: u32,
    /// Category-dependent payload.
    pub data: Value,
}

/// Discriminated union of inbound bridge messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Response to a request (has an `id` field).
    Response(Response),
    /// Unsolicited push (has a `type` field, no `id`).
    Push(Push),
    /// Unknown shape, ignored (forward-compatible catch-all).
    Unknown(Value),
}

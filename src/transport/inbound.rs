//! Inbound payload decoding.
//!
//! Every body delivered to the listener is decoded exactly once into an
//! [`InboundMessage`]; downstream code matches on the variant instead of
//! probing the JSON again.

use serde_json::Value;
use thiserror::Error;

use crate::probe::types::{CallbackPayload, ProbeMessage};

/// Shape-classified inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Echo of one of our probes: has `timestamp` and `received`.
    ProbeCallback(CallbackPayload),
    /// A probe delivered by the channel: has `timestamp` only.
    Probe(ProbeMessage),
    /// Anything without a usable timestamp, e.g. a third-party lifecycle
    /// notification.
    LifecycleEvent(Value),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Has a probe timestamp and a `received` field, but the callback
    /// fields do not decode.
    #[error("malformed callback: {0}")]
    Callback(String),
}

impl InboundMessage {
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::classify(unwrap_envelope(value))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::ProbeCallback(_) => "callback",
            InboundMessage::Probe(_) => "probe",
            InboundMessage::LifecycleEvent(_) => "lifecycle",
        }
    }

    fn classify(value: Value) -> Result<Self, DecodeError> {
        let Some(timestamp) = value.get("timestamp").and_then(as_millis).filter(|ts| *ts > 0) else {
            return Ok(InboundMessage::LifecycleEvent(value));
        };

        if value.get("received").is_none() {
            return Ok(InboundMessage::Probe(ProbeMessage {
                timestamp,
                seq: value.get("seq").and_then(Value::as_u64),
            }));
        }

        let mut fields = value;
        fields["timestamp"] = Value::from(timestamp);
        if let Some(received) = fields.get("received").and_then(as_millis) {
            fields["received"] = Value::from(received);
        }

        let callback = serde_json::from_value::<CallbackPayload>(fields)
            .map_err(|e| DecodeError::Callback(e.to_string()))?;
        if callback.received <= 0 {
            return Err(DecodeError::Callback(format!(
                "received must be a positive epoch-millisecond value, got {}",
                callback.received
            )));
        }
        Ok(InboundMessage::ProbeCallback(callback))
    }
}

/// Epoch milliseconds from a JSON number; integral floats are accepted.
fn as_millis(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    let ms = value.as_f64()?;
    (ms.is_finite() && ms.fract() == 0.0 && ms.abs() < i64::MAX as f64).then_some(ms as i64)
}

/// Strip an SNS-style `{"Type": "Notification", "Message": "..."}` wrapper.
///
/// A message string that is not JSON is kept as a JSON string so it still
/// classifies as a lifecycle event.
fn unwrap_envelope(value: Value) -> Value {
    let message = value
        .as_object()
        .filter(|obj| obj.get("Type").and_then(Value::as_str) == Some("Notification"))
        .and_then(|obj| obj.get("Message"))
        .and_then(Value::as_str);

    match message {
        Some(message) => serde_json::from_str(message)
            .unwrap_or_else(|_| Value::String(message.to_string())),
        None => value,
    }
}

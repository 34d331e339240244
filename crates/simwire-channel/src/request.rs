//! Blocking request/response helpers over a [`Channel`].
//!
//! The simulator speaks msgpack maps with a small reserved envelope: every
//! request carries a `"type"` field which the reply must echo, results come
//! back under `"result"`, and failures come back under `"error"` /
//! `"valueError"` instead of a result. The channel itself never inspects
//! payloads; these helpers are the one layer that does.

use rmpv::Value;
use tracing::debug;

use crate::channel::Channel;
use crate::error::{ChannelError, Result};

/// Envelope key naming the request/reply type.
pub const TYPE_KEY: &str = "type";
/// Envelope key carrying a successful result.
pub const RESULT_KEY: &str = "result";
/// Envelope key carrying a simulator-side execution failure.
pub const ERROR_KEY: &str = "error";
/// Envelope key carrying a rejected-argument failure.
pub const VALUE_ERROR_KEY: &str = "valueError";

/// Encode a msgpack value and send it as one frame.
pub fn send_value(channel: &mut Channel, value: &Value) -> Result<()> {
    let payload = rmp_serde::to_vec(value)?;
    channel.send(&payload)
}

/// Receive one frame and decode it as a msgpack value.
///
/// Replies carrying the simulator's error keys are mapped to
/// [`ChannelError::Simulator`] / [`ChannelError::SimulatorValue`].
pub fn recv_value(channel: &mut Channel) -> Result<Value> {
    let payload = channel.receive()?;
    let value: Value = rmp_serde::from_slice(&payload)?;

    if let Some(message) = str_field(&value, ERROR_KEY) {
        return Err(ChannelError::Simulator(message));
    }
    if let Some(message) = str_field(&value, VALUE_ERROR_KEY) {
        return Err(ChannelError::SimulatorValue(message));
    }
    Ok(value)
}

/// One blocking request/response round trip.
///
/// Sends `{"type": msg_type, ...fields}`, waits for the reply, verifies the
/// echoed type, and returns the reply's `"result"` field (`None` when the
/// simulator acknowledged without one).
pub fn request(
    channel: &mut Channel,
    msg_type: &str,
    fields: impl IntoIterator<Item = (String, Value)>,
) -> Result<Option<Value>> {
    let mut entries = vec![(Value::from(TYPE_KEY), Value::from(msg_type))];
    entries.extend(fields.into_iter().map(|(k, v)| (Value::from(k), v)));

    debug!(msg_type, "sending request");
    send_value(channel, &Value::Map(entries))?;

    let reply = recv_value(channel)?;
    let reply_type = str_field(&reply, TYPE_KEY).unwrap_or_default();
    if reply_type != msg_type {
        return Err(ChannelError::UnexpectedReply {
            expected: msg_type.to_string(),
            got: reply_type,
        });
    }
    debug!(msg_type, "request complete");

    Ok(take_field(reply, RESULT_KEY))
}

/// Look up a string field in a msgpack map.
fn str_field(value: &Value, key: &str) -> Option<String> {
    let map = value.as_map()?;
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .and_then(|(_, v)| v.as_str())
        .map(str::to_string)
}

/// Extract a field from a msgpack map, consuming the map.
fn take_field(value: Value, key: &str) -> Option<Value> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v),
        _ => None,
    }
}

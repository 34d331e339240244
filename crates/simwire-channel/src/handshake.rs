use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channel::Channel;
use crate::error::{ChannelError, Result};

/// Protocol revision announced in the hello exchange. Both sides must report
/// the same revision or the session is refused.
pub const PROTOCOL_VERSION: &str = "v1.23";

const HELLO_TYPE: &str = "Hello";

/// The hello message, sent as a msgpack map. The simulator echoes the same
/// shape back with its own protocol revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

impl Hello {
    /// A hello announcing this client's protocol revision.
    pub fn new() -> Self {
        Self {
            msg_type: HELLO_TYPE.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }
}

impl Default for Hello {
    fn default() -> Self {
        Self::new()
    }
}

/// First exchange on a fresh connection: verify both sides speak the same
/// protocol revision.
///
/// Fails with [`ChannelError::Handshake`] on a mismatched revision or an
/// unexpected reply type.
pub fn hello(channel: &mut Channel) -> Result<()> {
    let request = rmp_serde::to_vec_named(&Hello::new())?;
    channel.send(&request)?;

    let reply = channel.receive()?;
    let reply: Hello = rmp_serde::from_slice(&reply)?;

    if reply.msg_type != HELLO_TYPE {
        return Err(ChannelError::Handshake(format!(
            "expected {HELLO_TYPE:?} reply, got {:?}",
            reply.msg_type
        )));
    }
    if reply.protocol_version != PROTOCOL_VERSION {
        return Err(ChannelError::Handshake(format!(
            "protocol version mismatch: client speaks {PROTOCOL_VERSION}, simulator reports {}",
            reply.protocol_version
        )));
    }

    info!(version = PROTOCOL_VERSION, "simulator handshake complete");
    Ok(())
}

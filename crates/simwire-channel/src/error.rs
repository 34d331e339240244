/// Errors that can occur in channel operations.
///
/// Transport faults during `send`/`receive` are recovered internally by the
/// reconnect loop and never reach the caller. What does surface is the
/// terminal set (framing desynchronization, explicit shutdown, failed
/// initial connect) plus the protocol-level errors of the handshake and
/// request helpers.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error (initial connect failure surfaces here).
    #[error("transport error: {0}")]
    Transport(#[from] simwire_transport::TransportError),

    /// Frame-level error. Only desynchronization (out-of-range or malformed
    /// length prefix) propagates out of `send`/`receive`.
    #[error("frame error: {0}")]
    Frame(#[from] simwire_frame::FrameError),

    /// Operation attempted after the channel was closed.
    #[error("channel closed")]
    Closed,

    /// Protocol-version handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Failed to encode an outgoing protocol message.
    #[error("message encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode an incoming protocol message.
    #[error("message decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The simulator reported an error executing a request.
    #[error("simulator error: {0}")]
    Simulator(String),

    /// The simulator rejected a request argument.
    #[error("simulator value error: {0}")]
    SimulatorValue(String),

    /// A reply did not echo the request type.
    #[error("unexpected reply type {got:?} (expected {expected:?})")]
    UnexpectedReply { expected: String, got: String },
}

pub type Result<T> = std::result::Result<T, ChannelError>;

//! Reliable framed transport for external simulation processes.
//!
//! simwire is the wire-protocol core of a simulator control client:
//! length-prefixed message framing over TCP, with transparent reconnection
//! when the simulator restarts or the connection drops.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP byte-stream endpoint (complete reads/writes)
//! - [`frame`] — Length-prefixed message framing (binary and legacy ASCII)
//! - [`channel`] — Reconnecting channel, handshake, and request helpers

/// Re-export transport types.
pub mod transport {
    pub use simwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use simwire_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use simwire_channel::*;
}

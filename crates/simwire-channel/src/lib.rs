//! Reconnecting frame-aware channel to the simulator process.
//!
//! This is the layer application code actually talks to. A [`Channel`] owns
//! one connection to the simulator and exposes blocking
//! [`send`](Channel::send) / [`receive`](Channel::receive) over complete
//! frames; any transport fault in between is absorbed by tearing the
//! connection down and re-establishing it, without losing the caller's
//! operation.
//!
//! On top of the opaque-payload channel sit the two protocol helpers every
//! session needs: the [`hello`] version handshake and the msgpack
//! [`request`](crate::request::request) envelope.

pub mod backoff;
pub mod channel;
pub mod error;
pub mod handshake;
pub mod request;

pub use backoff::ConnectPolicy;
pub use channel::{Channel, ChannelCloser, ChannelConfig};
pub use error::{ChannelError, Result};
pub use handshake::{hello, Hello, PROTOCOL_VERSION};
pub use request::{recv_value, request, send_value};

//! TCP byte-stream endpoint for the simwire simulator client.
//!
//! This is the lowest layer of simwire: one stream connection to the
//! simulator process, with guaranteed-complete reads and writes. Everything
//! else builds on top of the [`TcpEndpoint`] type provided here.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{TcpAcceptor, TcpEndpoint};

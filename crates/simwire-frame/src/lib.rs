//! Length-prefixed message framing for the simwire simulator protocol.
//!
//! Every message travels as a self-delimiting frame: a fixed-width length
//! prefix followed by exactly that many bytes of opaque payload. A reader
//! either obtains the complete payload or an error. A frame is never
//! partially consumable, so one logical message can never be split or merged
//! across read boundaries.
//!
//! Two prefix encodings exist (see [`Framing`]): the 4-byte big-endian
//! binary prefix used by current simulator builds, and the 16-character
//! ASCII decimal prefix of the legacy wire protocol. The encoding is fixed
//! per connection.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, FrameConfig, Framing, BINARY_PREFIX_LEN, DEFAULT_MAX_PAYLOAD,
    LEGACY_PREFIX_LEN,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A payload (outgoing) or declared length (incoming) exceeds the
    /// configured maximum. On the receive side this is the guard against
    /// protocol desynchronization: a stray byte sequence misread as a length
    /// prefix must not turn into a multi-gigabyte read.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A legacy ASCII length prefix contained non-decimal bytes.
    #[error("invalid length prefix: {0}")]
    InvalidLengthPrefix(String),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was transferred.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of the binary length prefix: a `u32`, big-endian.
pub const BINARY_PREFIX_LEN: usize = 4;

/// Size of the legacy ASCII length prefix: 16 decimal characters.
pub const LEGACY_PREFIX_LEN: usize = 16;

/// Default maximum payload size: 64 MiB.
///
/// The simulator ships multi-megabyte sensor payloads (camera images, lidar
/// point clouds), so the ceiling is generous; it still rejects the lengths
/// produced by misinterpreting payload bytes as a prefix.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Length-prefix encoding used on the wire.
///
/// Selected once per connection; the two styles are never mixed within a
/// single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// 4-byte unsigned big-endian length prefix.
    ///
    /// ```text
    /// ┌──────────────────┬───────────────────┐
    /// │ Length (4B BE)   │ Payload           │
    /// │                  │ (Length bytes)    │
    /// └──────────────────┴───────────────────┘
    /// ```
    #[default]
    Binary,
    /// 16-character ASCII decimal length prefix, zero-padded, used by older
    /// simulator builds.
    ///
    /// ```text
    /// ┌──────────────────────┬───────────────────┐
    /// │ "0000000000000042"   │ Payload           │
    /// │ (16 ASCII bytes)     │ (42 bytes)        │
    /// └──────────────────────┴───────────────────┘
    /// ```
    LegacyAscii,
}

impl Framing {
    /// Number of bytes the length prefix occupies on the wire.
    pub fn prefix_len(self) -> usize {
        match self {
            Framing::Binary => BINARY_PREFIX_LEN,
            Framing::LegacyAscii => LEGACY_PREFIX_LEN,
        }
    }

    /// Largest payload length this prefix encoding can express.
    pub fn max_encodable(self) -> usize {
        match self {
            Framing::Binary => u32::MAX as usize,
            // 16 decimal digits.
            Framing::LegacyAscii => 9_999_999_999_999_999,
        }
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 64 MiB.
    pub max_payload: usize,
    /// Length-prefix encoding for this connection.
    pub framing: Framing,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
            framing: Framing::default(),
        }
    }
}

/// Encode a frame into the wire format: length prefix followed by payload,
/// written contiguously so the pair travels as one logical unit.
pub fn encode_frame(payload: &[u8], framing: Framing, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > framing.max_encodable() {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: framing.max_encodable(),
        });
    }
    dst.reserve(framing.prefix_len() + payload.len());
    match framing {
        Framing::Binary => dst.put_u32(payload.len() as u32),
        Framing::LegacyAscii => {
            let prefix = format!("{:016}", payload.len());
            dst.put_slice(prefix.as_bytes());
        }
    }
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer and returns the
/// payload. A frame is never partially consumed.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Bytes>> {
    let prefix_len = config.framing.prefix_len();
    if src.len() < prefix_len {
        return Ok(None); // Need more data
    }

    let declared = match config.framing {
        Framing::Binary => {
            u32::from_be_bytes(src[..BINARY_PREFIX_LEN].try_into().expect("prefix length checked"))
                as usize
        }
        Framing::LegacyAscii => parse_ascii_prefix(&src[..LEGACY_PREFIX_LEN])?,
    };

    if declared > config.max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: declared,
            max: config.max_payload,
        });
    }

    let total = prefix_len + declared;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(prefix_len);
    Ok(Some(src.split_to(declared).freeze()))
}

/// Parse a legacy prefix: decimal digits, zero-padded. Leading spaces are
/// tolerated since some older senders pad with blanks instead of zeroes.
fn parse_ascii_prefix(prefix: &[u8]) -> Result<usize> {
    let text = prefix
        .iter()
        .position(|&b| b != b' ')
        .map(|start| &prefix[start..])
        .unwrap_or(&[]);

    if text.is_empty() || !text.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::InvalidLengthPrefix(
            String::from_utf8_lossy(prefix).into_owned(),
        ));
    }

    let mut value = 0usize;
    for &digit in text {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((digit - b'0') as usize))
            .ok_or_else(|| {
                FrameError::InvalidLengthPrefix(String::from_utf8_lossy(prefix).into_owned())
            })?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"sensor reading";

        encode_frame(payload, Framing::Binary, &mut buf).unwrap();
        assert_eq!(buf.len(), BINARY_PREFIX_LEN + payload.len());
        assert_eq!(&buf[..4], &(payload.len() as u32).to_be_bytes());

        let decoded = decode_frame(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(decoded.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn legacy_roundtrip() {
        let config = FrameConfig {
            framing: Framing::LegacyAscii,
            ..FrameConfig::default()
        };
        let mut buf = BytesMut::new();
        let payload = b"hello";

        encode_frame(payload, Framing::LegacyAscii, &mut buf).unwrap();
        assert_eq!(&buf[..LEGACY_PREFIX_LEN], b"0000000000000005");

        let decoded = decode_frame(&mut buf, &config).unwrap().unwrap();
        assert_eq!(decoded.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_payload_roundtrip() {
        for framing in [Framing::Binary, Framing::LegacyAscii] {
            let config = FrameConfig {
                framing,
                ..FrameConfig::default()
            };
            let mut buf = BytesMut::new();
            encode_frame(b"", framing, &mut buf).unwrap();
            let decoded = decode_frame(&mut buf, &config).unwrap().unwrap();
            assert!(decoded.is_empty());
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn incomplete_prefix_needs_more_data() {
        let mut buf = BytesMut::from(&[0x00, 0x00][..]);
        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn incomplete_payload_needs_more_data() {
        let mut buf = BytesMut::new();
        encode_frame(b"truncated", Framing::Binary, &mut buf).unwrap();
        buf.truncate(BINARY_PREFIX_LEN + 3);

        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
        // Nothing consumed: the frame is all-or-nothing.
        assert_eq!(buf.len(), BINARY_PREFIX_LEN + 3);
    }

    #[test]
    fn declared_length_over_ceiling_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(u32::MAX); // claims a ~4 GiB payload

        let err = decode_frame(&mut buf, &FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size, .. } if size == u32::MAX as usize));
    }

    #[test]
    fn legacy_prefix_with_garbage_rejected() {
        let config = FrameConfig {
            framing: Framing::LegacyAscii,
            ..FrameConfig::default()
        };
        let mut buf = BytesMut::new();
        buf.put_slice(b"00000000abc00005");
        buf.put_slice(b"hello");

        let err = decode_frame(&mut buf, &config).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLengthPrefix(_)));
    }

    #[test]
    fn legacy_prefix_space_padded_accepted() {
        let config = FrameConfig {
            framing: Framing::LegacyAscii,
            ..FrameConfig::default()
        };
        let mut buf = BytesMut::new();
        buf.put_slice(b"               5");
        buf.put_slice(b"hello");

        let decoded = decode_frame(&mut buf, &config).unwrap().unwrap();
        assert_eq!(decoded.as_ref(), b"hello");
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", Framing::Binary, &mut buf).unwrap();
        encode_frame(b"second", Framing::Binary, &mut buf).unwrap();

        let config = FrameConfig::default();
        let f1 = decode_frame(&mut buf, &config).unwrap().unwrap();
        let f2 = decode_frame(&mut buf, &config).unwrap().unwrap();

        assert_eq!(f1.as_ref(), b"first");
        assert_eq!(f2.as_ref(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn payload_contains_prefix_bytes_untouched() {
        // Binary payloads may embed anything, including plausible prefixes.
        let payload = [0x00, 0x00, 0x00, 0x04, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut buf = BytesMut::new();
        encode_frame(&payload, Framing::Binary, &mut buf).unwrap();

        let decoded = decode_frame(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(decoded.as_ref(), payload);
    }

    #[test]
    fn prefix_lengths() {
        assert_eq!(Framing::Binary.prefix_len(), 4);
        assert_eq!(Framing::LegacyAscii.prefix_len(), 16);
    }
}

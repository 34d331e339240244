use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// The length prefix and payload are staged into one buffer and written as a
/// single logical operation; a partially-written frame leaves the connection
/// corrupted, which is reported as an error and must be answered by tearing
/// the connection down, not by retrying the write.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write one frame (blocking).
    ///
    /// Oversized payloads are rejected before anything is written.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload,
            });
        }

        self.buf.clear();
        encode_frame(payload, self.config.framing, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_frame, Framing};

    fn decode_all(bytes: Vec<u8>, config: &FrameConfig) -> Vec<Vec<u8>> {
        let mut buf = BytesMut::from(bytes.as_slice());
        let mut frames = Vec::new();
        while let Some(payload) = decode_frame(&mut buf, config).unwrap() {
            frames.push(payload.to_vec());
        }
        assert!(buf.is_empty());
        frames
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(b"hello").unwrap();

        let frames = decode_all(writer.into_inner().into_inner(), &FrameConfig::default());
        assert_eq!(frames, vec![b"hello".to_vec()]);
    }

    #[test]
    fn write_consecutive_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(b"one").unwrap();
        writer.write_frame(b"two").unwrap();

        let frames = decode_all(writer.into_inner().into_inner(), &FrameConfig::default());
        assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn write_legacy_frame() {
        let config = FrameConfig {
            framing: Framing::LegacyAscii,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), config.clone());
        writer.write_frame(b"old school").unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[..16], b"0000000000000010");
        let frames = decode_all(bytes, &config);
        assert_eq!(frames, vec![b"old school".to_vec()]);
    }

    #[test]
    fn oversized_payload_rejected_before_write() {
        let config = FrameConfig {
            max_payload: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), config);

        let err = writer.write_frame(b"too big for the wire").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        // Nothing hit the stream.
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn zero_write_reported_as_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.write_frame(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn interrupted_write_retries() {
        let sink = InterruptedOnceWriter {
            interrupted: false,
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(sink);
        writer.write_frame(b"retry").unwrap();

        let frames = decode_all(writer.into_inner().data, &FrameConfig::default());
        assert_eq!(frames, vec![b"retry".to_vec()]);
    }

    #[test]
    fn short_writes_complete_the_frame() {
        let sink = OneBytePerWrite { data: Vec::new() };
        let mut writer = FrameWriter::new(sink);
        writer.write_frame(b"drip").unwrap();

        let frames = decode_all(writer.into_inner().data, &FrameConfig::default());
        assert_eq!(frames, vec![b"drip".to_vec()]);
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnceWriter {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct OneBytePerWrite {
        data: Vec<u8>,
    }

    impl Write for OneBytePerWrite {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}

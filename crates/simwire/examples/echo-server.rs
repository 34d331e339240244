//! Minimal echo endpoint — accepts connections and echoes frames back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run -- send 127.0.0.1:64256 --data ping --wait

use simwire::frame::{FrameReader, FrameWriter};
use simwire::transport::TcpAcceptor;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let acceptor = TcpAcceptor::bind(64256)?;
    eprintln!("Listening on {}", acceptor.local_addr()?);

    loop {
        let endpoint = acceptor.accept()?;
        eprintln!("Client connected: {:?}", endpoint.peer_addr().ok());

        let reader_endpoint = endpoint.try_clone()?;
        let mut reader = FrameReader::new(reader_endpoint);
        let mut writer = FrameWriter::new(endpoint);

        loop {
            match reader.read_frame() {
                Ok(payload) => {
                    eprintln!("Received {} bytes", payload.len());
                    writer.write_frame(&payload)?;
                }
                Err(e) => {
                    eprintln!("Client disconnected: {e}");
                    break;
                }
            }
        }
    }
}

//! End-to-end reconnect behavior against local echo endpoints.
//!
//! These tests play the simulator's role with a raw acceptor plus the frame
//! codec, killing and reviving connections underneath a live channel.

use std::time::Duration;

use simwire_channel::{Channel, ChannelConfig, ChannelError, ConnectPolicy};
use simwire_frame::{FrameReader, FrameWriter};
use simwire_transport::{TcpAcceptor, TcpEndpoint};

fn fast_config() -> ChannelConfig {
    ChannelConfig {
        connect_policy: ConnectPolicy {
            tries: 1,
            retry_delay: Duration::from_millis(10),
        },
        ..ChannelConfig::default()
    }
}

/// Echo whole frames on one connection until the peer drops.
fn echo_frames(endpoint: TcpEndpoint) {
    let reader_endpoint = endpoint.try_clone().unwrap();
    let mut reader = FrameReader::new(reader_endpoint);
    let mut writer = FrameWriter::new(endpoint);
    while let Ok(payload) = reader.read_frame() {
        if writer.write_frame(&payload).is_err() {
            break;
        }
    }
}

#[test]
fn send_retries_after_mid_write_fault() {
    let acceptor = TcpAcceptor::bind(0).unwrap();
    let port = acceptor.local_addr().unwrap().port();

    // First connection dies instantly; the replacement echoes.
    let server = std::thread::spawn(move || {
        let doomed = acceptor.accept().unwrap();
        drop(doomed);
        let replacement = acceptor.accept().unwrap();
        echo_frames(replacement);
    });

    let mut channel = Channel::with_config("127.0.0.1", port, fast_config()).unwrap();

    // Large enough that the write cannot be absorbed by socket buffers
    // before the dead peer resets the connection: the fault lands mid-frame
    // and the whole frame must be retried on the replacement connection.
    let payload: Vec<u8> = (0..32 * 1024 * 1024u32).map(|i| i as u8).collect();
    channel.send(&payload).unwrap();

    let echoed = channel.receive().unwrap();
    assert_eq!(echoed.len(), payload.len());
    assert_eq!(echoed.as_ref(), payload.as_slice());

    channel.close();
    server.join().unwrap();
}

#[test]
fn receive_recovers_when_endpoint_restarts() {
    let acceptor = TcpAcceptor::bind(0).unwrap();
    let port = acceptor.local_addr().unwrap().port();

    let server = std::thread::spawn(move || {
        // Phase one: a healthy echo of "ping".
        let first = acceptor.accept().unwrap();
        let reader_endpoint = first.try_clone().unwrap();
        let mut reader = FrameReader::new(reader_endpoint);
        let mut writer = FrameWriter::new(first);
        let ping = reader.read_frame().unwrap();
        assert_eq!(ping.as_ref(), b"ping");
        writer.write_frame(&ping).unwrap();

        // Crash before answering the next request...
        let pong_request = reader.read_frame().unwrap();
        assert_eq!(pong_request.as_ref(), b"pong");
        drop(reader);
        drop(writer);

        // ...then come back up and deliver the answer on a fresh connection.
        let second = acceptor.accept().unwrap();
        let mut writer = FrameWriter::new(second);
        writer.write_frame(b"pong").unwrap();
        // Hold the connection open until the client is done.
        std::thread::sleep(Duration::from_millis(200));
    });

    let mut channel = Channel::with_config("127.0.0.1", port, fast_config()).unwrap();

    channel.send(b"ping").unwrap();
    assert_eq!(channel.receive().unwrap().as_ref(), b"ping");

    // The endpoint dies while we wait for this reply; the channel reconnects
    // underneath us and the reply arrives over the replacement connection.
    channel.send(b"pong").unwrap();
    assert_eq!(channel.receive().unwrap().as_ref(), b"pong");

    channel.close();
    server.join().unwrap();
}

#[test]
fn blocks_while_unreachable_and_fails_closed_after_close() {
    let acceptor = TcpAcceptor::bind(0).unwrap();
    let port = acceptor.local_addr().unwrap().port();

    let server = std::thread::spawn(move || {
        let only = acceptor.accept().unwrap();
        drop(only);
        drop(acceptor);
    });

    let mut channel = Channel::with_config("127.0.0.1", port, fast_config()).unwrap();
    server.join().unwrap();
    let closer = channel.closer();

    // The remote is gone for good: receive must keep blocking in the
    // reconnect loop rather than failing.
    let blocked = std::thread::spawn(move || {
        let result = channel.receive();
        (channel, result)
    });

    std::thread::sleep(Duration::from_millis(400));
    assert!(
        !blocked.is_finished(),
        "receive must block while the endpoint is unreachable"
    );

    closer.close();
    let (_channel, result) = blocked.join().unwrap();
    assert!(matches!(result, Err(ChannelError::Closed)));
}

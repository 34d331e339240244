use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use simwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, Framing, DEFAULT_MAX_PAYLOAD};
use simwire_transport::TcpEndpoint;
use tracing::{debug, info, warn};

use crate::backoff::{ConnectPolicy, RetryState};
use crate::error::{ChannelError, Result};

/// Configuration for a [`Channel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Maximum payload size accepted in either direction. Default: 64 MiB.
    pub max_payload: usize,
    /// Length-prefix encoding for this connection. Fixed for the lifetime of
    /// the channel; the two encodings are never mixed within one connection.
    pub framing: Framing,
    /// Retry policy for the initial connect.
    pub connect_policy: ConnectPolicy,
    /// Per-attempt dial timeout inside the reconnect loop. Bounds how long a
    /// cross-thread close can go unnoticed while a dial is in flight.
    pub reconnect_dial_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
            framing: Framing::default(),
            connect_policy: ConnectPolicy::default(),
            reconnect_dial_timeout: Duration::from_secs(1),
        }
    }
}

/// Lifecycle state shared between a [`Channel`] and its [`ChannelCloser`]s.
///
/// Close must be able to interrupt, from another thread, both a reconnect
/// sleep and an operation blocked on the live socket. The socket handle
/// registered here exists solely so `close` can shut the connection down; it
/// is never handed out.
struct Lifecycle {
    closed: AtomicBool,
    live: Mutex<Option<TcpEndpoint>>,
    wake: Condvar,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            live: Mutex::new(None),
            wake: Condvar::new(),
        }
    }

    fn lock_live(&self) -> MutexGuard<'_, Option<TcpEndpoint>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut live = self.lock_live();
        if let Some(endpoint) = live.take() {
            let _ = endpoint.shutdown();
        }
        self.wake.notify_all();
    }

    /// Register the endpoint of a freshly-established connection. Fails if
    /// the channel was closed while the dial was in flight.
    fn register(&self, endpoint: TcpEndpoint) -> Result<()> {
        let mut live = self.lock_live();
        if self.is_closed() {
            let _ = endpoint.shutdown();
            return Err(ChannelError::Closed);
        }
        *live = Some(endpoint);
        Ok(())
    }

    fn clear(&self) {
        let mut live = self.lock_live();
        if let Some(mut endpoint) = live.take() {
            endpoint.close();
        }
    }

    /// Sleep for `dur`, waking early if the channel is closed meanwhile.
    fn sleep(&self, dur: Duration) {
        if dur.is_zero() || self.is_closed() {
            return;
        }
        let guard = self.lock_live();
        let _ = self
            .wake
            .wait_timeout_while(guard, dur, |_| !self.is_closed());
    }
}

/// Handle for closing a [`Channel`] from another thread.
///
/// Closing aborts any in-progress reconnect sleep or dial promptly and
/// unblocks an operation waiting on the socket; the unblocked and all
/// subsequent operations fail with [`ChannelError::Closed`].
#[derive(Clone)]
pub struct ChannelCloser {
    lifecycle: Arc<Lifecycle>,
}

impl ChannelCloser {
    /// Close the associated channel.
    pub fn close(&self) {
        self.lifecycle.close();
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }
}

/// Frame reader/writer pair over one live connection.
///
/// Reader and writer each hold a handle to the same underlying socket; the
/// pair is torn down as a unit before any replacement connection is dialed.
struct Wire {
    reader: FrameReader<TcpEndpoint>,
    writer: FrameWriter<TcpEndpoint>,
}

/// The reconnecting, frame-aware transport handed to application code.
///
/// A channel owns exactly one logical connection to the simulator. On any
/// I/O fault during [`send`](Channel::send) or [`receive`](Channel::receive)
/// it tears the connection down, re-establishes it with the fixed retry
/// pacing of [`RetryState`], and re-issues the interrupted operation. The
/// caller observes eventual success, a terminal protocol error, or
/// [`ChannelError::Closed`], never a silently dropped message. Note that a
/// send interrupted mid-frame may or may not have reached the simulator
/// before the fault; exactly-once delivery across a reconnect is the
/// responsibility of the request layer above.
///
/// The model is synchronous and blocking, with no background threads. One
/// channel is one half-duplex request/response session and is not meant to
/// be shared across threads; open a second channel for a second concurrent
/// stream, as the simulator accepts multiple connections. The only supported
/// cross-thread interaction is [`ChannelCloser::close`].
pub struct Channel {
    host: String,
    port: u16,
    config: ChannelConfig,
    frame_config: FrameConfig,
    wire: Option<Wire>,
    lifecycle: Arc<Lifecycle>,
}

impl Channel {
    /// Connect to the simulator at `host:port` with default configuration.
    pub fn connect(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::with_config(host, port, ChannelConfig::default())
    }

    /// Connect to the simulator at `host:port` with explicit configuration.
    ///
    /// The initial dial honors [`ChannelConfig::connect_policy`]; if every
    /// try fails, the last connect error is returned.
    pub fn with_config(host: impl Into<String>, port: u16, config: ChannelConfig) -> Result<Self> {
        let host = host.into();
        let frame_config = FrameConfig {
            max_payload: config.max_payload,
            framing: config.framing,
        };

        let endpoint = dial_initial(&host, port, &config.connect_policy)?;

        let mut channel = Self {
            host,
            port,
            config,
            frame_config,
            wire: None,
            lifecycle: Arc::new(Lifecycle::new()),
        };
        channel.install(endpoint)?;
        Ok(channel)
    }

    /// Remote host this channel dials.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port this channel dials.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// Obtain a handle that can close this channel from another thread.
    pub fn closer(&self) -> ChannelCloser {
        ChannelCloser {
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }

    /// Send one payload as a complete frame (blocking).
    ///
    /// Recoverable transport faults are absorbed by reconnecting and
    /// re-sending; only desynchronization ([`FrameError`] on the payload
    /// size) and [`ChannelError::Closed`] surface.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        loop {
            let wire = self.wire()?;
            match wire.writer.write_frame(payload) {
                Ok(()) => return Ok(()),
                Err(err) if recoverable(&err) => {
                    warn!(error = %err, "send failed, reconnecting");
                    self.reconnect()?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Receive one complete frame payload (blocking).
    ///
    /// Blocks until a frame arrives, reconnecting through any transport
    /// fault, including the simulator closing the connection mid-frame
    /// (a replacement connection starts at a fresh frame boundary).
    pub fn receive(&mut self) -> Result<Bytes> {
        loop {
            let wire = self.wire()?;
            match wire.reader.read_frame() {
                Ok(payload) => return Ok(payload),
                Err(err) if recoverable(&err) => {
                    warn!(error = %err, "receive failed, reconnecting");
                    self.reconnect()?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Close the channel and release the connection. Idempotent. All
    /// subsequent operations fail with [`ChannelError::Closed`].
    pub fn close(&mut self) {
        self.lifecycle.close();
        self.wire = None;
        debug!(host = %self.host, port = self.port, "channel closed");
    }

    fn wire(&mut self) -> Result<&mut Wire> {
        if self.lifecycle.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.wire.as_mut().ok_or(ChannelError::Closed)
    }

    /// Arm a freshly-connected endpoint: register its handle for
    /// cross-thread shutdown and build the frame reader/writer pair.
    fn install(&mut self, endpoint: TcpEndpoint) -> Result<()> {
        let reader_endpoint = endpoint.try_clone()?;
        self.lifecycle.register(endpoint.try_clone()?)?;
        self.wire = Some(Wire {
            reader: FrameReader::with_config(reader_endpoint, self.frame_config.clone()),
            writer: FrameWriter::with_config(endpoint, self.frame_config.clone()),
        });
        Ok(())
    }

    /// Drop the current connection entirely. The previous handle is fully
    /// closed before any replacement is dialed.
    fn teardown(&mut self) {
        self.lifecycle.clear();
        self.wire = None;
    }

    /// Re-establish the connection after a fault.
    ///
    /// Loops until a dial succeeds or the channel is closed; pacing per
    /// [`RetryState`]. The dial itself is bounded by
    /// [`ChannelConfig::reconnect_dial_timeout`] and the sleep is
    /// interruptible, so a concurrent close is honored promptly.
    fn reconnect(&mut self) -> Result<()> {
        self.teardown();
        info!(host = %self.host, port = self.port, "connection lost, reconnecting");

        let mut retry = RetryState::new();
        loop {
            if self.lifecycle.is_closed() {
                return Err(ChannelError::Closed);
            }
            match TcpEndpoint::connect_timeout(
                &self.host,
                self.port,
                self.config.reconnect_dial_timeout,
            ) {
                Ok(endpoint) => match self.install(endpoint) {
                    Ok(()) => {
                        info!(attempts = retry.attempts(), "reconnected");
                        return Ok(());
                    }
                    Err(ChannelError::Closed) => return Err(ChannelError::Closed),
                    Err(err) => {
                        debug!(error = %err, "failed to arm reconnected endpoint");
                        self.lifecycle.sleep(retry.next_delay());
                    }
                },
                Err(err) => {
                    debug!(error = %err, "reconnect attempt failed");
                    self.lifecycle.sleep(retry.next_delay());
                }
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.wire.is_some())
            .field("closed", &self.lifecycle.is_closed())
            .finish()
    }
}

/// Classify a frame-layer failure: transport faults and connection loss are
/// recovered by reconnecting; a bad length prefix means the stream position
/// can no longer be trusted and must propagate.
fn recoverable(err: &FrameError) -> bool {
    matches!(err, FrameError::Io(_) | FrameError::ConnectionClosed)
}

/// Initial dial with a bounded number of tries.
fn dial_initial(host: &str, port: u16, policy: &ConnectPolicy) -> Result<TcpEndpoint> {
    let mut tries_left = policy.tries.max(1);
    loop {
        match TcpEndpoint::connect(host, port) {
            Ok(endpoint) => {
                info!(host, port, "connected to simulator");
                return Ok(endpoint);
            }
            Err(err) => {
                tries_left -= 1;
                if tries_left == 0 {
                    return Err(err.into());
                }
                warn!(host, port, tries_left, error = %err, "connect failed, retrying");
                std::thread::sleep(policy.retry_delay);
            }
        }
    }
}

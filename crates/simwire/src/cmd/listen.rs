use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use simwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use simwire_transport::TcpAcceptor;
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let acceptor = TcpAcceptor::bind(args.port).map_err(|err| transport_error("bind failed", err))?;
    let addr = acceptor
        .local_addr()
        .map_err(|err| transport_error("bind failed", err))?;
    info!(%addr, "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let frame_config = FrameConfig {
        framing: args.framing.as_framing(),
        ..FrameConfig::default()
    };

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let endpoint = match acceptor.accept() {
            Ok(endpoint) => endpoint,
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        let source = endpoint
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(%source, "connection accepted");

        let reader_endpoint = endpoint
            .try_clone()
            .map_err(|err| transport_error("accept failed", err))?;
        let mut reader = FrameReader::with_config(reader_endpoint, frame_config.clone());
        let mut writer = FrameWriter::with_config(endpoint, frame_config.clone());

        while running.load(Ordering::SeqCst) {
            let payload = match reader.read_frame() {
                Ok(payload) => payload,
                Err(FrameError::ConnectionClosed) => break,
                Err(err) => return Err(frame_error("receive failed", err)),
            };

            print_frame(&payload, &source, format);
            printed = printed.saturating_add(1);

            if args.echo {
                if let Err(err) = writer.write_frame(&payload) {
                    return Err(frame_error("echo failed", err));
                }
            }

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
        info!(%source, "connection closed");
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

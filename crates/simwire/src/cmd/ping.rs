use std::time::Instant;

use serde::Serialize;
use simwire_channel::{hello, Channel, ChannelConfig, ConnectPolicy, PROTOCOL_VERSION};

use crate::cmd::PingArgs;
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PingOutput<'a> {
    target: String,
    protocol_version: &'a str,
    elapsed_ms: u128,
}

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ChannelConfig {
        framing: args.framing.as_framing(),
        connect_policy: ConnectPolicy {
            tries: args.tries.max(1),
            ..ConnectPolicy::default()
        },
        ..ChannelConfig::default()
    };

    let started = Instant::now();
    let mut channel = Channel::with_config(args.target.host.clone(), args.target.port, config)
        .map_err(|err| channel_error("connect failed", err))?;
    hello(&mut channel).map_err(|err| channel_error("handshake failed", err))?;
    let elapsed = started.elapsed();

    match format {
        OutputFormat::Json => {
            let out = PingOutput {
                target: args.target.to_string(),
                protocol_version: PROTOCOL_VERSION,
                elapsed_ms: elapsed.as_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            println!(
                "handshake ok: {} speaks {} ({} ms)",
                args.target,
                PROTOCOL_VERSION,
                elapsed.as_millis()
            );
        }
    }

    channel.close();
    Ok(SUCCESS)
}

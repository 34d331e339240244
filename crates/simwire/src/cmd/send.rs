use std::fs;

use simwire_channel::{Channel, ChannelConfig, ConnectPolicy};

use crate::cmd::SendArgs;
use crate::exit::{channel_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ChannelConfig {
        framing: args.framing.as_framing(),
        connect_policy: ConnectPolicy {
            tries: args.tries.max(1),
            ..ConnectPolicy::default()
        },
        ..ChannelConfig::default()
    };

    let mut channel = Channel::with_config(args.target.host.clone(), args.target.port, config)
        .map_err(|err| channel_error("connect failed", err))?;

    let payload = resolve_payload(&args)?;
    channel
        .send(&payload)
        .map_err(|err| channel_error("send failed", err))?;

    if args.wait {
        let reply = channel
            .receive()
            .map_err(|err| channel_error("receive failed", err))?;
        print_frame(&reply, &args.target.to_string(), format);
    }

    channel.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return rmp_serde::to_vec(&value)
            .map_err(|err| CliError::new(USAGE, format!("--json could not be encoded: {err}")));
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

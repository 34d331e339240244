use simwire_channel::PROTOCOL_VERSION;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("simwire {}", env!("CARGO_PKG_VERSION"));
    if args.extended {
        println!("protocol: {PROTOCOL_VERSION}");
        println!(
            "target: {}",
            option_env!("SIMWIRE_BUILD_TARGET").unwrap_or("unknown")
        );
    }
    Ok(SUCCESS)
}

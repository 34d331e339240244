use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand, ValueEnum};
use simwire_frame::Framing;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod ping;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single frame to the simulator.
    Send(SendArgs),
    /// Bind a local endpoint and print received frames.
    Listen(ListenArgs),
    /// Connect and run the protocol-version handshake.
    Ping(PingArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Ping(args) => ping::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// A `HOST:PORT` simulator address.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| format!("expected HOST:PORT, got {input:?}"))?;
        if host.is_empty() {
            return Err(format!("expected HOST:PORT, got {input:?}"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port in {input:?}"))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Length-prefix framing selection.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum FramingArg {
    /// 4-byte big-endian binary prefix (current simulator builds).
    Binary,
    /// 16-character ASCII decimal prefix (legacy simulator builds).
    Legacy,
}

impl FramingArg {
    pub fn as_framing(self) -> Framing {
        match self {
            FramingArg::Binary => Framing::Binary,
            FramingArg::Legacy => Framing::LegacyAscii,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Simulator address as HOST:PORT.
    pub target: Target,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// JSON payload, encoded to msgpack before sending.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Read payload bytes from a file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Length-prefix framing.
    #[arg(long, value_enum, default_value = "binary")]
    pub framing: FramingArg,
    /// Connection attempts before giving up.
    #[arg(long, default_value = "1")]
    pub tries: u32,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Port to bind on 127.0.0.1 (0 picks an ephemeral port).
    pub port: u16,
    /// Echo each received frame back to the sender.
    #[arg(long)]
    pub echo: bool,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Length-prefix framing.
    #[arg(long, value_enum, default_value = "binary")]
    pub framing: FramingArg,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Simulator address as HOST:PORT.
    pub target: Target,
    /// Length-prefix framing.
    #[arg(long, value_enum, default_value = "binary")]
    pub framing: FramingArg,
    /// Connection attempts before giving up.
    #[arg(long, default_value = "1")]
    pub tries: u32,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parses_host_and_port() {
        let target: Target = "127.0.0.1:64256".parse().unwrap();
        assert_eq!(target.host, "127.0.0.1");
        assert_eq!(target.port, 64256);
        assert_eq!(target.to_string(), "127.0.0.1:64256");
    }

    #[test]
    fn target_rejects_bad_input() {
        assert!("no-port".parse::<Target>().is_err());
        assert!(":1234".parse::<Target>().is_err());
        assert!("host:notaport".parse::<Target>().is_err());
        assert!("host:99999".parse::<Target>().is_err());
    }

    #[test]
    fn framing_arg_maps_to_wire_modes() {
        assert_eq!(FramingArg::Binary.as_framing(), Framing::Binary);
        assert_eq!(FramingArg::Legacy.as_framing(), Framing::LegacyAscii);
    }
}

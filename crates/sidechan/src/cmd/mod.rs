use std::fs::File;
use std::os::fd::RawFd;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use sidechan_peer::{SideChannel, SideChannelConfig};
use sidechan_transport::Channel;

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod backchannel;
pub mod emulate;
pub mod get;
pub mod request;
pub mod version;
pub mod walk;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query a single SNMP OID through the backend.
    Get(GetArgs),
    /// Walk every OID under a subtree.
    Walk(WalkArgs),
    /// Send a typed device request.
    Request(RequestArgs),
    /// Read from or write to the back channel.
    #[command(subcommand)]
    Backchannel(BackchannelCommand),
    /// Answer side-channel requests from a JSON device description.
    Emulate(EmulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Get(args) => get::run(args, format),
        Command::Walk(args) => walk::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Backchannel(command) => backchannel::run(command, format),
        Command::Emulate(args) => emulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SideChannelArgs {
    /// Side-channel descriptor.
    #[arg(long, env = "SIDECHAN_FD", default_value_t = 4)]
    pub fd: RawFd,
    /// Per-request timeout (e.g. 2s, 1.5s, 500ms, 0 to poll, inf to block).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

impl SideChannelArgs {
    pub fn open(&self) -> CliResult<SideChannel<File>> {
        let config = SideChannelConfig {
            timeout: parse_timeout(&self.timeout)?,
            ..SideChannelConfig::default()
        };
        let channel = open_descriptor(self.fd)?;
        Ok(SideChannel::from_channel(channel, config))
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Numeric OID, e.g. 1.3.6.1.2.1.1.5.0.
    pub oid: String,
    /// Largest value accepted, in bytes.
    #[arg(long, default_value_t = 1024)]
    pub max_size: usize,
    #[command(flatten)]
    pub channel: SideChannelArgs,
}

#[derive(Args, Debug)]
pub struct WalkArgs {
    /// Numeric OID of the subtree root.
    pub oid: String,
    #[command(flatten)]
    pub channel: SideChannelArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RequestKind {
    State,
    DeviceId,
    Bidi,
    Connected,
    SoftReset,
    DrainOutput,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Request to send.
    pub kind: RequestKind,
    #[command(flatten)]
    pub channel: SideChannelArgs,
}

#[derive(Args, Debug)]
pub struct BackChannelArgs {
    /// Back-channel descriptor.
    #[arg(long, env = "SIDECHAN_BACK_FD", default_value_t = 3)]
    pub fd: RawFd,
    /// Timeout (e.g. 2s, 1.5s, 500ms, 0 to poll, inf to block).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Subcommand, Debug)]
pub enum BackchannelCommand {
    /// Read whatever status bytes are available.
    Read {
        /// Maximum number of bytes to read.
        #[arg(long, default_value_t = 1024)]
        max: usize,
        #[command(flatten)]
        channel: BackChannelArgs,
    },
    /// Write bytes to the back channel.
    Write {
        /// String to write.
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,
        /// Read bytes from a file.
        #[arg(long, conflicts_with = "data")]
        file: Option<PathBuf>,
        #[command(flatten)]
        channel: BackChannelArgs,
    },
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// JSON device description (device_id, state, bidi, connected, oids).
    pub config: PathBuf,
    /// Side-channel descriptor to answer on.
    #[arg(long, env = "SIDECHAN_FD", default_value_t = 4)]
    pub fd: RawFd,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn open_descriptor(fd: RawFd) -> CliResult<Channel<File>> {
    if fd < 0 {
        return Err(CliError::new(USAGE, format!("invalid descriptor {fd}")));
    }
    Channel::from_inherited(fd)
        .map_err(|err| transport_error(&format!("descriptor {fd} is not usable"), err))
}

/// Parse a timeout. `inf` (or `none`) blocks; `0` polls once. Values may be
/// fractional (`1.5s`, `0.25`, `2.5ms`); a bare number is seconds.
pub fn parse_timeout(input: &str) -> CliResult<Option<Duration>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }
    if input.eq_ignore_ascii_case("inf") || input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let (number, divisor) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1000.0)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1.0)
    } else {
        (input, 1.0)
    };

    let invalid = || CliError::new(USAGE, format!("invalid timeout value: {input}"));
    // f64 parsing also accepts "inf" and "nan"; only plain decimals are timeouts.
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(invalid());
    }
    let value: f64 = number.parse().map_err(|_| invalid())?;
    Duration::try_from_secs_f64(value / divisor)
        .map(Some)
        .map_err(|_| invalid())
}

use std::fs;

use sidechan_transport::BackChannel;
use tracing::debug;

use crate::cmd::{open_descriptor, parse_timeout, BackchannelCommand};
use crate::exit::{io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{preview, print_raw, print_report, OutputFormat, Report};

pub fn run(command: BackchannelCommand, format: OutputFormat) -> CliResult<i32> {
    match command {
        BackchannelCommand::Read { max, channel } => {
            if max == 0 {
                return Err(CliError::new(USAGE, "--max must be greater than zero"));
            }
            let timeout = parse_timeout(&channel.timeout)?;
            let mut back = BackChannel::from(open_descriptor(channel.fd)?);

            let mut buf = vec![0u8; max];
            let n = back
                .read(&mut buf, timeout)
                .map_err(|err| transport_error("back-channel read failed", err))?;
            debug!(n, "back-channel read");

            if let OutputFormat::Raw = format {
                print_raw(&buf[..n]);
            } else {
                let report = Report {
                    operation: "backchannel-read",
                    status: "ok",
                    value: Some(preview(&buf[..n])),
                    size: Some(n),
                    ..Report::default()
                };
                print_report(&report, format);
            }
            Ok(SUCCESS)
        }
        BackchannelCommand::Write {
            data,
            file,
            channel,
        } => {
            let bytes = match (data, file) {
                (Some(data), _) => data.into_bytes(),
                (None, Some(path)) => fs::read(&path).map_err(|err| {
                    io_error(&format!("failed reading {}", path.display()), err)
                })?,
                (None, None) => {
                    return Err(CliError::new(USAGE, "one of --data or --file is required"))
                }
            };
            let timeout = parse_timeout(&channel.timeout)?;
            let mut back = BackChannel::from(open_descriptor(channel.fd)?);

            let n = back
                .write(&bytes, timeout)
                .map_err(|err| transport_error("back-channel write failed", err))?;

            let report = Report {
                operation: "backchannel-write",
                status: "ok",
                size: Some(n),
                ..Report::default()
            };
            print_report(&report, format);
            Ok(SUCCESS)
        }
    }
}

use std::fs::File;

use sidechan_peer::{Bidi, SideChannel};

use crate::cmd::{RequestArgs, RequestKind};
use crate::exit::{side_channel_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let mut side = args.channel.open()?;
    let report = send(&mut side, args.kind)
        .map_err(|err| side_channel_error(&format!("{} failed", operation(args.kind)), err))?;
    print_report(&report, format);
    Ok(SUCCESS)
}

fn send(side: &mut SideChannel<File>, kind: RequestKind) -> sidechan_peer::Result<Report> {
    let mut report = Report {
        operation: operation(kind),
        status: "ok",
        ..Report::default()
    };
    match kind {
        RequestKind::State => {
            let state = side.get_state()?;
            report.value = Some(format!("0x{:02x}", state.bits()));
            report.flags = state.iter_names().map(|(name, _)| name).collect();
        }
        RequestKind::DeviceId => report.value = Some(side.get_device_id()?),
        RequestKind::Bidi => {
            let bidi = side.get_bidi()?;
            report.value = Some(
                match bidi {
                    Bidi::Supported => "supported",
                    Bidi::NotSupported => "not-supported",
                }
                .to_string(),
            );
        }
        RequestKind::Connected => report.value = Some(side.get_connected()?.to_string()),
        RequestKind::SoftReset => side.soft_reset()?,
        RequestKind::DrainOutput => side.drain_output()?,
    }
    Ok(report)
}

fn operation(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::State => "get-state",
        RequestKind::DeviceId => "get-device-id",
        RequestKind::Bidi => "get-bidi",
        RequestKind::Connected => "get-connected",
        RequestKind::SoftReset => "soft-reset",
        RequestKind::DrainOutput => "drain-output",
    }
}

//! Diagnostics for the CLI. Everything goes to stderr so stdout stays
//! machine-readable for `--format json` and `--format raw`.

use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Logging flags shared by every subcommand.
///
/// A filter usually runs the CLI from a script, so both flags also read
/// the environment.
#[derive(Args, Debug, Clone, Copy)]
pub struct LogArgs {
    /// Log output format (stderr).
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        env = "SIDECHAN_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    pub format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        env = "SIDECHAN_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    pub level: LogLevel,
}

impl LogArgs {
    /// Name the emitting layer (transport, frame, peer) once the output is
    /// verbose enough to need it.
    fn show_target(&self) -> bool {
        self.level >= LogLevel::Debug
    }
}

pub fn init_logging(args: LogArgs) {
    if args.level == LogLevel::Off {
        return;
    }

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(args.level))
        .with_ansi(false)
        .with_target(args.show_target());

    match args.format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn target_shown_only_when_verbose() {
        let quiet = LogArgs {
            format: LogFormat::Text,
            level: LogLevel::Info,
        };
        let verbose = LogArgs {
            level: LogLevel::Debug,
            ..quiet
        };
        assert!(!quiet.show_target());
        assert!(verbose.show_target());
    }
}

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "rallycomp", version, about = "Rally navigation computer")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/rallycomp.toml")]
    pub config: PathBuf,

    /// Dashboard and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// GPS backend selectable on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceArg {
    /// gpsd daemon over TCP
    Gpsd,
    /// Replay a recorded NMEA log
    Nmea,
    /// Synthetic drive at gps.sim_speed_kmh
    Sim,
}

impl From<SourceArg> for rally_config::GpsSourceKind {
    fn from(s: SourceArg) -> Self {
        match s {
            SourceArg::Gpsd => rally_config::GpsSourceKind::Gpsd,
            SourceArg::Nmea => rally_config::GpsSourceKind::Nmea,
            SourceArg::Sim => rally_config::GpsSourceKind::Sim,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the computer: dashboard on stdout, driver commands on stdin
    Run {
        /// Override gps.source from the config
        #[arg(long, value_enum, value_name = "SOURCE")]
        source: Option<SourceArg>,
        /// NMEA log to replay (implies --source nmea)
        #[arg(long, value_name = "FILE")]
        nmea: Option<PathBuf>,
    },
    /// Open the GPS source, wait for a first fix and print it
    SelfCheck {
        /// Give up after this many milliseconds without a fix
        #[arg(long, value_name = "MS", default_value_t = 10_000)]
        timeout_ms: u64,
        /// Override gps.source from the config
        #[arg(long, value_enum, value_name = "SOURCE")]
        source: Option<SourceArg>,
    },
}

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "axle", version, about = "Axle counter CLI")]
pub struct Cli {
    /// Path to config TOML (built-in defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines on stdout and JSON logs on stderr
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes
    /// precedence, `logging.level` from the config applies when omitted
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded tick trace (CSV `cell,arm`, one row per tick)
    Replay {
        /// Trace CSV file
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Also write the framed byte stream that went out on the serial line
        #[arg(long, value_name = "FILE")]
        wire: Option<PathBuf>,
    },
    /// Decode a captured serial stream into messages
    Decode {
        /// Capture file (raw bytes, or hex text with --hex)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Input is hex text, e.g. `7C 10 01 01 00 0E 00 00 00 7D`
        #[arg(long, action = ArgAction::SetTrue)]
        hex: bool,
    },
    /// Run live against the cell, control lines and serial port
    ///
    /// Without the `hardware` feature a simulated cell plays back pass-bys
    /// and the serial line is kept in memory.
    Run {
        /// Stop after this many ticks (runs until Ctrl-C otherwise)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Axles per simulated pass-by
        #[arg(long, value_name = "N", default_value_t = 2)]
        sim_axles: usize,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}

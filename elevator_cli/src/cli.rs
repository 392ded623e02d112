//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "elevator", version, about = "Elevator car controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/elevator.toml")]
    pub config: PathBuf,

    /// Optional floor table CSV replacing [[floors]] (strict header)
    #[arg(long, value_name = "FILE")]
    pub floors: Option<PathBuf>,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

fn parse_code(s: &str) -> Result<u8, String> {
    elevator_config::parse_floor_code(s).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop against the simulated car
    Run {
        /// Stop after this many control cycles (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Inject a floor request (hex like 0x06 or decimal) before the first cycle
        #[arg(long, value_name = "CODE", value_parser = parse_code)]
        request: Option<u8>,
        /// Initial car height in mm (overrides sim.start_mm)
        #[arg(long = "start-mm", value_name = "MM")]
        start_mm: Option<u16>,
        /// Print control loop latency stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Build the controller and run a single cycle
    SelfCheck,
    /// Print the configured floor table
    Floors,
}

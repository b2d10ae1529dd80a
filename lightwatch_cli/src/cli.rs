//! CLI argument definitions.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lightwatch", version, about = "Light sampler with dip detection and a UDP command service")]
pub struct Cli {
    /// Path to config TOML; defaults are used when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/lightwatch.toml")]
    pub config: PathBuf,

    /// Use simulated sensor and encoder instead of real hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Override the UDP command port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Override the sampling rate in Hz
    #[arg(long, value_name = "HZ")]
    pub rate_hz: Option<u32>,

    /// Dip trigger delta in volts below the running average
    #[arg(long = "dip-trig", value_name = "VOLTS")]
    pub dip_trigger: Option<f64>,

    /// Dip release delta in volts below the running average
    #[arg(long = "dip-rel", value_name = "VOLTS")]
    pub dip_release: Option<f64>,

    /// Minimum dip width in samples
    #[arg(long = "dip-width", value_name = "SAMPLES")]
    pub dip_width: Option<u32>,

    /// Minimum gap after a dip in samples
    #[arg(long = "dip-gap", value_name = "SAMPLES")]
    pub dip_gap: Option<u32>,

    /// Encoder A line (BCM pin)
    #[arg(long = "line-a", value_name = "PIN")]
    pub line_a: Option<u8>,

    /// Encoder B line (BCM pin)
    #[arg(long = "line-b", value_name = "PIN")]
    pub line_b: Option<u8>,

    /// Encoder edges per detent
    #[arg(long, value_name = "N")]
    pub edges: Option<u32>,

    /// Enable best-effort real-time setup (mlockall + SCHED_FIFO, Linux)
    #[arg(long, action = ArgAction::SetTrue)]
    pub rt: bool,

    /// SCHED_FIFO priority when --rt is enabled (defaults to the maximum)
    #[arg(long, value_name = "PRIO")]
    pub rt_prio: Option<i32>,
}

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "motion", version, about = "Omnidirectional motion controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in reference tuning when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where the run's setpoints come from: a pose, a velocity, or a script.
#[derive(clap::Args, Debug, Clone, Default)]
#[group(required = true, multiple = true)]
pub struct GoalArgs {
    /// Target x position (mm)
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["vx", "vy", "omega", "script"])]
    pub x: Option<f64>,
    /// Target y position (mm)
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["vx", "vy", "omega", "script"])]
    pub y: Option<f64>,
    /// Target heading (rad)
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["vx", "vy", "omega", "script"])]
    pub theta: Option<f64>,

    /// Requested field-frame x velocity (mm/s)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "script")]
    pub vx: Option<f64>,
    /// Requested field-frame y velocity (mm/s)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "script")]
    pub vy: Option<f64>,
    /// Requested angular rate (rad/s)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "script")]
    pub omega: Option<f64>,

    /// Setpoint script CSV (strict header: cycle,kind,a,b,c)
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the simulated robot to a pose, at a velocity, or through a script
    Run {
        #[command(flatten)]
        goal: GoalArgs,
        /// Cycle budget (overrides runner.max_cycles)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Sleep one control cycle per step (real-time playback)
        #[arg(long, action = ArgAction::SetTrue)]
        paced: bool,
        /// Active planar speed limit in mm/s (clamped to regulator.velocity_ceiling)
        #[arg(long, value_name = "MM_PER_S")]
        speed_limit: Option<f64>,
    },
    /// Build the regulator from config and run a short simulated approach
    SelfCheck,
}

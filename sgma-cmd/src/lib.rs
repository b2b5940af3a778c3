//! Command implementations for the SGMA CLI.
//!
//! Each subcommand loads well, reading and allocation CSVs, runs the
//! engine and writes its results either to a file or to stdout.

use clap::{Args, Subcommand};
use sgma_engine::EngineConfig;

pub mod alerts;
pub mod allocation;
pub mod input;
pub mod readings;

/// CSV inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// Path to the wells CSV
    #[arg(short = 'w', long)]
    pub wells_csv: String,

    /// Path to the meter readings CSV
    #[arg(short = 'r', long)]
    pub readings_csv: String,

    /// Output path; results go to stdout when omitted
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

/// Options for commands that report against allocations.
#[derive(Args, Debug, Clone)]
pub struct ReportOptions {
    /// Path to the allocations CSV
    #[arg(short = 'a', long)]
    pub allocations_csv: String,

    /// Report date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub as_of: Option<String>,

    /// Only report this GSA
    #[arg(short = 'd', long)]
    pub district: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute extraction and fees for every reading, as CSV
    Readings {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Year-to-date allocation summaries per well and district, as JSON
    Allocation {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        report: ReportOptions,
    },

    /// Compliance alerts for wells and districts, as JSON
    Alerts {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        report: ReportOptions,
    },
}

pub fn run(command: Command, config: &EngineConfig) -> anyhow::Result<()> {
    match command {
        Command::Readings { inputs } => readings::run_readings(&inputs, config),
        Command::Allocation { inputs, report } => allocation::run_allocation(&inputs, &report, config),
        Command::Alerts { inputs, report } => alerts::run_alerts(&inputs, &report, config),
    }
}

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?;
            let config = EngineConfig::from_toml_str(&data)?;
            log::info!("Loaded config from {}", path);
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

//! SGMA CLI - Command line tool for groundwater extraction accounting.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sgma-cli",
    version,
    about = "Groundwater extraction, fee and allocation compliance toolkit"
)]
struct Cli {
    /// Engine configuration TOML (water year start, alert thresholds)
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: sgma_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = sgma_cmd::load_config(cli.config.as_deref())?;
    log::debug!("Engine config: {:?}", config);
    sgma_cmd::run(cli.command, &config)
}

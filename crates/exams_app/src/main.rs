use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use engine_logging::engine_debug;
use exams_engine::JobController;

mod cli;
mod config;
mod logging;
mod runner;
mod server;

use cli::{Cli, Command};
use config::AppConfig;
use logging::LogDestination;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(cli.log_level, destination);
    engine_debug!("{:?}", cli);

    let app_config = AppConfig::load(cli.config.as_deref())?;
    let controller = JobController::from_config(&app_config.engine_config())?;

    match cli.command {
        Command::Run(args) => {
            let summary = runner::run(&controller, args.job_config()).await?;
            println!(
                "Downloaded: {} | Skipped: {} | Failed: {} | Dry-run: {}",
                summary.downloaded, summary.skipped, summary.failed, summary.dryrun
            );
            if summary.fatal {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Serve(args) => {
            let listen = args.listen.unwrap_or(app_config.listen);
            server::serve(listen, controller).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

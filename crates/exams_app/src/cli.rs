//! Command-line definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use exams_core::{JobConfig, DEFAULT_OUTPUT_DIR, DEFAULT_WORKERS, MAX_WORKERS};
use log::LevelFilter;

/// Harvest exam papers from the public examination archive.
#[derive(Parser, Debug)]
#[command(name = "exams")]
#[command(author, version, about)]
pub struct Cli {
    /// RON file overriding engine settings and the listen address
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info", value_parser = parse_log_level)]
    pub log_level: LevelFilter,

    /// Also write logs to ./exams.log
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one job in the foreground; Ctrl-C requests a stop.
    Run(RunArgs),
    /// Serve the start / stream / stop HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Grade filter term, matched as a substring of the grade label (repeatable)
    #[arg(long = "grade")]
    pub grades: Vec<String>,

    /// Year filter, matched exactly (repeatable)
    #[arg(long = "year")]
    pub years: Vec<String>,

    /// Concurrent downloads
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Root directory for downloaded files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Report what would be downloaded without touching network or disk
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            grades: self.grades.clone(),
            years: self.years.clone(),
            output_root: self.output_dir.clone(),
            dry_run: self.dry_run,
            workers: self.workers,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on; overrides the config file
    #[arg(long)]
    pub listen: Option<SocketAddr>,
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    engine_logging::parse_level(value).ok_or_else(|| format!("unknown log level `{value}`"))
}

fn parse_workers(value: &str) -> Result<usize, String> {
    let workers: usize = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if (1..=MAX_WORKERS).contains(&workers) {
        Ok(workers)
    } else {
        Err(format!("workers must be between 1 and {MAX_WORKERS}"))
    }
}

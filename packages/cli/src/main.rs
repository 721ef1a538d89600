mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{classify, index, reconcile, ClassifyArgs, IndexArgs, ReconcileArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Redline - line-addressed Markdown editing driven by streamed patches
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./redline.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a Markdown file with line numbers
    Index(IndexArgs),

    /// Apply a change stream to a Markdown file
    Reconcile(ReconcileArgs),

    /// Show how a change stream is classified
    Classify(ClassifyArgs),
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load_from(cli.config.as_deref(), &cwd)?;
    init_logging(&config);

    match cli.command {
        Command::Index(args) => index(args, &cwd),
        Command::Reconcile(args) => reconcile(args, &cwd, &config),
        Command::Classify(args) => classify(args, &cwd, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memrank::config::Config;
use memrank_cli::commands::{ConfigCommand, ExplainCommand, FoldersCommand, RankCommand};
use memrank_cli::error::CliResult;
use memrank_cli::output::OutputFormat;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "memrank")]
#[command(about = "memrank - Rank memories and boost them along the causal graph")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Rank items with composite scoring and the causal boost")]
    Rank(RankCommand),

    #[clap(about = "Show the composite score breakdown for one item")]
    Explain(ExplainCommand),

    #[clap(about = "Rank folders by recency, importance and activity")]
    Folders(FoldersCommand),

    #[clap(about = "Configuration commands")]
    Config(ConfigCommand),
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    dispatch(&Cli::parse())
}

fn dispatch(cli: &Cli) -> CliResult<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config_path = cli.config.as_deref();

    match &cli.command {
        Command::Config(cmd) => cmd.execute(config_path, format),
        Command::Rank(cmd) => cmd.execute(&Config::discover(config_path)?, format),
        Command::Explain(cmd) => cmd.execute(&Config::discover(config_path)?, format),
        Command::Folders(cmd) => cmd.execute(&Config::discover(config_path)?, format),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,memrank=info,memrank_cli=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

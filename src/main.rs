use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod checkpoint;
mod cli;
mod config;
mod error;
mod output;
mod parser;
mod pipeline;
mod provider;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("testpilot=debug")
    } else {
        EnvFilter::new("testpilot=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Interactive(args) => cli::interactive::execute(args).await,
        Commands::History(args) => cli::history::execute(args),
        Commands::Schema => cli::schema::execute(),
    }
}

//! Mender CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mender::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => mender::cli::commands::run::execute(args, cli.json, config_path).await,
        Commands::Rankings(args) => {
            mender::cli::commands::rankings::execute(args, cli.json, config_path).await
        }
        Commands::History(args) => {
            mender::cli::commands::history::execute(args, cli.json, config_path).await
        }
    };

    if let Err(err) = result {
        mender::cli::handle_error(err, cli.json);
    }
}

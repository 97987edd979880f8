//! lalink - Log Analytics linked storage account management
//!
//! Command-line entry point.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lalink::cli::Cli;
use lalink::config::{self, Config};
use lalink::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is loaded before logging so `debug` from the file or env applies.
    let config = config::load_config().await;
    init_logging(log_filter(cli.debug, &config));

    if let Err(e) = run(cli, config).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Result<Config>) -> Result<()> {
    info!("Starting lalink");

    let mut config = config?;
    config.debug |= cli.debug;

    cli.execute(config).await
}

fn log_filter(cli_debug: bool, config: &Result<Config>) -> &'static str {
    let debug = cli_debug || config.as_ref().is_ok_and(|c| c.debug);
    if debug {
        "lalink=debug"
    } else {
        "lalink=info"
    }
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

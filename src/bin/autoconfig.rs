use clap::Parser;
use tracing_subscriber::EnvFilter;

use guardrails_autoconfig::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(Cli::parse()).await
}

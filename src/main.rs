use clap::Parser;
use rssfilter::config::{Overrides, Settings};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "rssfilter", about = "RSS filter — rewrite one upstream feed and serve it")]
struct Cli {
    /// Settings file (TOML, JSON or YAML). Defaults to ./rssfilter.toml if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listening port.
    #[arg(long)]
    port: Option<u16>,

    /// Upstream feed URL.
    #[arg(long)]
    input_source: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let overrides = Overrides {
        port: cli.port,
        input_source: cli.input_source,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    settings.validate()?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            shutdown.cancel();
        }
    });

    rssfilter::run(settings, shutdown).await
}

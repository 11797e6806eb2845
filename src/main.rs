//! Joker - serves a random joke or inspirational quote as JSON

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use joker::config::Args;
use joker::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("joker={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if args.mistral_api_key.is_empty() {
        warn!("MISTRAL_API_KEY is not set; jokes will fall back to canned copy");
    }

    info!("Listen: {}", args.listen);
    info!("Jokes: {} via {}", args.mistral_model.as_str(), args.mistral_api_url);
    info!("Quotes: {}", args.zenquotes_api_url);
    info!("Upstream timeout: {:?}", args.request_timeout());

    let selector = Arc::new(joker::new_selector(&args)?);
    let listener = TcpListener::bind(args.listen).await?;

    server::run(listener, selector, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    Ok(())
}

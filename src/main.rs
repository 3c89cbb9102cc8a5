use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use telegram_github_uploader::app::App;
use telegram_github_uploader::health::HealthServer;
use telegram_github_uploader::models::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "telegram-github-uploader")]
#[command(about = "Publish files sent to a Telegram bot into a GitHub repository")]
struct CliArgs {
    /// Port for the liveness endpoint. Overrides PORT.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegram_github_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting telegram-github-uploader");

    let args = CliArgs::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let app = Arc::new(
        App::new(&config)
            .await
            .context("Failed to initialize application")?,
    );

    let mut health = HealthServer::on_port(config.port);
    health
        .start()
        .await
        .with_context(|| format!("Failed to bind liveness port {}", config.port))?;

    let poller = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.run().await }
    });

    info!("All services running");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        result = poller => {
            if let Err(e) = result {
                error!("Polling task ended unexpectedly: {}", e);
            }
        }
        _ = health.wait() => error!("Liveness server stopped unexpectedly"),
    }

    health.shutdown().await;
    Ok(())
}

mod metrics;
mod routes;
mod sinks;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use logwarden_config::cli::Cli;
use logwarden_core::Dispatcher;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::metrics::MetricsRegistry;
use crate::routes::AppState;

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = logwarden_config::load(&cli.config)?;
    cli.apply(&mut config);

    init_tracing(&config.log_level);

    tracing::info!(workers = config.dispatcher.workers, "starting logwarden-agent");

    let (configured_sinks, breaker_settings) = sinks::build(&config.sinks).await?;
    let dispatcher = Dispatcher::new(config.dispatcher.clone(), configured_sinks, breaker_settings)?;
    dispatcher.start().await?;

    let metrics = MetricsRegistry::new()?;
    let state = Arc::new(AppState { dispatcher: Arc::clone(&dispatcher), metrics });
    let app = routes::router(state);

    let server = if let Some(addr) = &config.metrics_addr {
        let addr: SocketAddr = addr.parse()?;
        tracing::info!(%addr, "health/metrics endpoint listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        Some(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(error = %err, "http server exited");
            }
        }))
    } else {
        None
    };

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight work");

    dispatcher.stop(SHUTDOWN_DEADLINE).await?;
    if let Some(server) = server {
        server.abort();
    }

    tracing::info!(
        dlq_entries = dispatcher.dlq_len(),
        "logwarden-agent stopped"
    );
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

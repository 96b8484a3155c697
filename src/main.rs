use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use violet::telemetry;

const OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "cannot listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("violet=info,tower_http=info"));

    // Export traces and logs only when a collector is configured.
    let endpoint = std::env::var(OTLP_ENDPOINT).ok().filter(|e| !e.is_empty());
    let logs = match &endpoint {
        Some(endpoint) => {
            let provider = telemetry::setup_tracer(endpoint)?;
            opentelemetry::global::set_tracer_provider(provider);
            Some(telemetry::setup_logging(endpoint)?)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(logs)
        .init();

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(error) => {
            tracing::warn!(%error, "prometheus recorder not installed");
            None
        },
    };

    let state = violet::initialize_state(metrics)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, violet::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

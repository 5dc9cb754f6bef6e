//! otp-relay event forwarding service.
//!
//! Main entry point. Wires the event source, forwarder, health monitor,
//! and scheduler together, then waits for a shutdown signal.

use std::sync::Arc;

use anyhow::{Context, Result};
use relay_core::{Clock, ConfigStore, FigmentConfigStore, RealClock};
use relay_forward::{
    AlertSink, ChannelEventSource, EventSource, ForwardClient, Forwarder, HealthMonitor,
    RingSignal, Scheduler, ServiceConfig, TracingAlertSink,
};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting otp-relay event forwarding service");

    let service_path =
        std::env::var("OTP_RELAY_SERVICE_CONFIG").unwrap_or_else(|_| "service.toml".to_string());
    let config = ServiceConfig::load(&service_path).context("failed to load service config")?;
    info!(
        settings_path = %config.settings_path,
        poll_interval_secs = config.poll_interval_secs,
        health_interval_secs = config.health_interval_secs,
        payload_mode = %config.payload_mode,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
    let store: Arc<dyn ConfigStore> = Arc::new(FigmentConfigStore::new(&config.settings_path));
    let source: Arc<dyn EventSource> = Arc::new(ChannelEventSource::new(Arc::clone(&clock)));
    let sink = Arc::new(TracingAlertSink);

    let client = ForwardClient::new(&config.client_config())
        .context("failed to build HTTP client")?;
    let forwarder = Forwarder::new(
        client.clone(),
        Arc::clone(&store),
        config.payload_mode().context("invalid payload mode")?,
    );
    let health = HealthMonitor::new(client, Arc::clone(&store), sink.clone());

    let scheduler = Arc::new(Scheduler::new(
        source,
        forwarder,
        health,
        clock,
        config.scheduler_config(),
    ));

    // Platform adapters push events into `source` and ring signals into
    // this channel; the binary only owns the lifecycle.
    let (_ring_tx, ring_rx) = mpsc::channel::<RingSignal>(16);
    let handle = Arc::clone(&scheduler).spawn(ring_rx);

    sink.service_status("otp-relay started").await;
    info!("otp-relay is running");

    shutdown_signal().await;
    info!("Shutdown signal received, starting graceful shutdown");

    handle.shutdown().await;
    sink.service_status("otp-relay stopped").await;

    info!("otp-relay shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,otp_relay=debug,relay_forward=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
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
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

//! netstat-agent - network interface statistics collector
//!
//! Discovers interfaces under a sysfs-style directory once at startup and
//! exports one statistics value per interface as a Prometheus gauge.

use anyhow::{Context, Result};
use netstat::{
    collector::{CollectionLoopBuilder, PrometheusSink},
    health::components,
    AgentMetrics, HealthRegistry, NetstatPlugin, StructuredLogger,
};
use netstat_agent::{api, config::AgentConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = AgentConfig::load().context("Failed to load agent configuration")?;
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());

    let logger = StructuredLogger::new(host);
    logger.log_startup(AGENT_VERSION, &config.net_dir_path, &config.statistics);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::DISCOVERY).await;
    health_registry.register(components::COLLECTOR).await;

    let metrics = AgentMetrics::new();

    let mut plugin = NetstatPlugin::new(Arc::new(PrometheusSink::new()));
    for (key, value) in config.plugin_options() {
        plugin.configure(key, value)?;
    }

    let count = match plugin.initialize() {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Initialization failed");
            health_registry
                .set_unhealthy(components::DISCOVERY, e.to_string())
                .await;
            return Err(e.into());
        }
    };
    logger.log_discovery(&config.net_dir_path, count);
    metrics.set_interfaces_monitored(count as i64);
    health_registry.set_ready(true).await;

    let (collection_loop, notifications) = CollectionLoopBuilder::new()
        .plugin(plugin)
        .interval(Duration::from_secs(config.interval_secs))
        .notification_buffer(config.notification_buffer)
        .health(health_registry.clone())
        .logger(logger.clone())
        .build()?;

    let app_state = Arc::new(api::AppState::new(health_registry, notifications));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let loop_handle = tokio::spawn(collection_loop.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    loop_handle.await?;
    api_handle.abort();
    info!("Shutdown complete");

    Ok(())
}

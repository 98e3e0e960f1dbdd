//! Collection loop
//!
//! Host-side scheduler for a [`NetstatPlugin`]: ticks `collect` on a fixed
//! interval, hands queued notifications to the plugin and shuts it down when
//! the shutdown signal fires. Ticks and notifications are handled from one
//! task, so calls into the plugin never overlap.

use super::CollectStats;
use crate::error::Result;
use crate::health::{components, HealthRegistry};
use crate::lifecycle::NetstatPlugin;
use crate::models::Notification;
use crate::observability::{AgentMetrics, StructuredLogger};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Time between collection ticks (default: 10 seconds)
    pub interval: Duration,
    /// Capacity of the notification channel
    pub notification_buffer: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            notification_buffer: 64,
        }
    }
}

pub struct CollectionLoop {
    plugin: NetstatPlugin,
    config: CollectionConfig,
    metrics: AgentMetrics,
    health: Option<HealthRegistry>,
    logger: StructuredLogger,
    notifications: mpsc::Receiver<Notification>,
    consecutive_failures: u64,
}

impl CollectionLoop {
    /// Create a loop around an initialized plugin
    ///
    /// Returns the sender hosts use to push notifications to the plugin.
    pub fn new(
        plugin: NetstatPlugin,
        config: CollectionConfig,
    ) -> (Self, mpsc::Sender<Notification>) {
        let (tx, rx) = mpsc::channel(config.notification_buffer.max(1));

        let loop_instance = Self {
            plugin,
            config,
            metrics: AgentMetrics::new(),
            health: None,
            logger: StructuredLogger::new("localhost"),
            notifications: rx,
            consecutive_failures: 0,
        };

        (loop_instance, tx)
    }

    pub fn plugin(&self) -> &NetstatPlugin {
        &self.plugin
    }

    /// Run until `shutdown` fires, then shut the plugin down and return it
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> NetstatPlugin {
        info!(
            interval_secs = self.config.interval.as_secs(),
            interfaces = self.plugin.roster().len(),
            "Starting interface collection loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are recorded inside tick; the next tick retries
                    let _ = self.tick().await;
                }
                Some(notification) = self.notifications.recv() => {
                    self.plugin.on_notification(&notification);
                }
                _ = shutdown.recv() => {
                    info!("Shutting down interface collection loop");
                    break;
                }
            }
        }

        if let Err(e) = self.plugin.shutdown() {
            warn!(error = %e, "Plugin shutdown failed");
        }
        self.plugin
    }

    /// Run one collection cycle and record its outcome
    pub async fn tick(&mut self) -> Result<CollectStats> {
        let start = Instant::now();
        let result = self.plugin.collect();
        let elapsed = start.elapsed();
        self.metrics.observe_collection_latency(elapsed.as_secs_f64());

        match &result {
            Ok(stats) => {
                self.consecutive_failures = 0;
                self.metrics.inc_samples_emitted(stats.entities_read as u64);
                self.metrics.inc_read_errors(stats.read_errors as u64);
                debug!(
                    interfaces = stats.entities_read,
                    read_errors = stats.read_errors,
                    elapsed_ms = elapsed.as_millis(),
                    "Collection cycle complete"
                );

                if let Some(health) = &self.health {
                    if stats.read_errors > 0 {
                        health
                            .set_degraded(
                                components::COLLECTOR,
                                format!("{} statistics reads failed", stats.read_errors),
                            )
                            .await;
                    } else {
                        health.set_healthy(components::COLLECTOR).await;
                    }
                }
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.metrics.inc_collection_errors();
                self.logger
                    .log_collect_failed(&e.to_string(), self.consecutive_failures);

                if let Some(health) = &self.health {
                    health
                        .set_degraded(components::COLLECTOR, e.to_string())
                        .await;
                }
            }
        }

        result
    }
}

/// Builder for creating the collection loop
#[derive(Default)]
pub struct CollectionLoopBuilder {
    plugin: Option<NetstatPlugin>,
    config: CollectionConfig,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl CollectionLoopBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plugin(mut self, plugin: NetstatPlugin) -> Self {
        self.plugin = Some(plugin);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn notification_buffer(mut self, size: usize) -> Self {
        self.config.notification_buffer = size;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> anyhow::Result<(CollectionLoop, mpsc::Sender<Notification>)> {
        let plugin = self
            .plugin
            .ok_or_else(|| anyhow::anyhow!("Plugin is required"))?;
        if self.config.interval.is_zero() {
            anyhow::bail!("Collection interval must be non-zero");
        }

        let (mut collection_loop, tx) = CollectionLoop::new(plugin, self.config);
        collection_loop.health = self.health;
        if let Some(logger) = self.logger {
            collection_loop.logger = logger;
        }
        Ok((collection_loop, tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::RecordingSink;
    use crate::health::ComponentStatus;
    use crate::lifecycle::LifecycleState;
    use crate::models::Severity;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn initialized_plugin(dir: &TempDir, sink: Arc<RecordingSink>) -> NetstatPlugin {
        let mut plugin = NetstatPlugin::new(sink);
        plugin
            .configure("NetDirPath", &format!("{}/", dir.path().display()))
            .unwrap();
        plugin.configure("Statistics", "rx_bytes").unwrap();
        plugin.initialize().unwrap();
        plugin
    }

    fn write_stat(dir: &TempDir, name: &str, content: &str) {
        let stats = dir.path().join(name).join("statistics");
        fs::create_dir_all(&stats).unwrap();
        fs::write(stats.join("rx_bytes"), content).unwrap();
    }

    #[test]
    fn test_collection_config_default() {
        let config = CollectionConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.notification_buffer, 64);
    }

    #[test]
    fn test_builder_requires_plugin() {
        assert!(CollectionLoopBuilder::new().build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_interval() {
        let sink = Arc::new(RecordingSink::default());
        let result = CollectionLoopBuilder::new()
            .plugin(NetstatPlugin::new(sink))
            .interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tick_updates_health() {
        let temp_dir = TempDir::new().unwrap();
        write_stat(&temp_dir, "eth0", "7\n");
        let sink = Arc::new(RecordingSink::default());
        let health = HealthRegistry::new();

        let (mut collection_loop, _tx) = CollectionLoopBuilder::new()
            .plugin(initialized_plugin(&temp_dir, sink.clone()))
            .health(health.clone())
            .build()
            .unwrap();

        let stats = collection_loop.tick().await.unwrap();
        assert_eq!(stats.entities_read, 1);
        assert_eq!(sink.samples()[0].value, 7.0);
        assert_eq!(
            health.health().await.components[components::COLLECTOR].status,
            ComponentStatus::Healthy
        );

        fs::remove_file(temp_dir.path().join("eth0/statistics/rx_bytes")).unwrap();
        assert!(collection_loop.tick().await.is_err());
        assert_eq!(collection_loop.consecutive_failures, 1);
        assert_eq!(
            health.health().await.components[components::COLLECTOR].status,
            ComponentStatus::Degraded
        );

        write_stat(&temp_dir, "eth0", "8\n");
        collection_loop.tick().await.unwrap();
        assert_eq!(collection_loop.consecutive_failures, 0);
        assert_eq!(collection_loop.plugin().roster().get("eth0").unwrap().last_value, 8);
    }

    #[tokio::test]
    async fn test_run_collects_and_shuts_down() {
        let temp_dir = TempDir::new().unwrap();
        write_stat(&temp_dir, "eth0", "100\n");
        let sink = Arc::new(RecordingSink::default());

        let (collection_loop, notify_tx) = CollectionLoopBuilder::new()
            .plugin(initialized_plugin(&temp_dir, sink.clone()))
            .interval(Duration::from_millis(10))
            .build()
            .unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(collection_loop.run(shutdown_rx));

        notify_tx
            .send(Notification::new(Severity::Warning, "link flapped"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        let plugin = handle.await.unwrap();
        assert_eq!(plugin.state(), LifecycleState::ShutDown);
        assert!(plugin.roster().is_empty());

        let samples = sink.samples();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.type_instance == "eth0" && s.value == 100.0));
    }
}

//! Destinations for emitted gauge samples

use crate::models::GaugeSample;
use prometheus::{register_gauge_vec, GaugeVec};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::warn;

/// Receives every sample produced by a collection cycle
pub trait MetricsSink: Send + Sync {
    fn dispatch(&self, sample: GaugeSample);
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn dispatch(&self, sample: GaugeSample) {
        (**self).dispatch(sample)
    }
}

/// Forwards samples into a bounded channel
///
/// Collection never waits on the consumer: when the channel is full or
/// closed the sample is dropped and logged.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<GaugeSample>,
}

impl ChannelSink {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<GaugeSample>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { tx }, rx)
    }
}

impl MetricsSink for ChannelSink {
    fn dispatch(&self, sample: GaugeSample) {
        if let Err(e) = self.tx.try_send(sample) {
            warn!(error = %e, "Failed to send sample to channel");
        }
    }
}

static INTERFACE_GAUGE: OnceLock<GaugeVec> = OnceLock::new();

/// Publishes samples as a labelled gauge in the default Prometheus registry
#[derive(Clone, Copy)]
pub struct PrometheusSink {
    gauge: &'static GaugeVec,
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusSink {
    pub fn new() -> Self {
        let gauge = INTERFACE_GAUGE.get_or_init(|| {
            register_gauge_vec!(
                "netstat_interface_value",
                "Last statistics value read for each network interface",
                &["plugin", "interface"]
            )
            .expect("Failed to register netstat_interface_value")
        });
        Self { gauge }
    }

    /// Current exported value for `interface`
    pub fn value(&self, interface: &str) -> Option<f64> {
        self.gauge
            .get_metric_with_label_values(&[crate::models::PLUGIN_NAME, interface])
            .ok()
            .map(|g| g.get())
    }
}

impl MetricsSink for PrometheusSink {
    fn dispatch(&self, sample: GaugeSample) {
        self.gauge
            .with_label_values(&[sample.plugin.as_str(), sample.type_instance.as_str()])
            .set(sample.value);
    }
}

/// Keeps every sample in memory, for tests
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    samples: std::sync::Mutex<Vec<GaugeSample>>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn samples(&self) -> Vec<GaugeSample> {
        self.samples.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl MetricsSink for RecordingSink {
    fn dispatch(&self, sample: GaugeSample) {
        self.samples.lock().unwrap().push(sample);
    }
}

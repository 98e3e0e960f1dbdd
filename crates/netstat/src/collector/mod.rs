//! Interface statistics collection
//!
//! Discovery scans the configured root directory once for interfaces.
//! Each collection cycle then reads one statistics file per interface and
//! hands a gauge sample to a [`MetricsSink`].

mod discovery;
mod r#loop;
mod sink;
mod statistics;


pub use discovery::discover;
pub use r#loop::{CollectionConfig, CollectionLoop, CollectionLoopBuilder};
pub use sink::{ChannelSink, MetricsSink, PrometheusSink};
pub use statistics::{
    collect, parse_leading_int, read_stat_value, stat_path, CollectStats, MAX_STAT_BYTES,
};

#[cfg(test)]
pub(crate) use sink::RecordingSink;

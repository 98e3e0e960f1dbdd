//! Core data models for the netstat collector

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};

/// Plugin identifier attached to every emitted sample
pub const PLUGIN_NAME: &str = "netstat";

/// One monitored network interface
///
/// `raw_name` is the directory entry exactly as found on disk and is what
/// statistics paths are built from. `name` is its UTF-8 rendering, used for
/// logs and sample labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    raw_name: OsString,
    pub last_value: i64,
}

impl EntityRecord {
    pub fn new(raw_name: impl Into<OsString>) -> Self {
        let raw_name = raw_name.into();
        Self {
            name: raw_name.to_string_lossy().into_owned(),
            raw_name,
            last_value: 0,
        }
    }

    pub fn raw_name(&self) -> &OsStr {
        &self.raw_name
    }
}

/// Ordered collection of discovered interfaces
///
/// Membership is fixed once discovery has run; collection only rewrites
/// `last_value` in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entities: VecDeque<EntityRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record ahead of every existing one
    pub fn prepend(&mut self, record: EntityRecord) {
        self.entities.push_front(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EntityRecord> {
        self.entities.iter_mut()
    }

    pub fn get(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Kind of value carried by a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
}

/// A single point-in-time measurement for one interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSample {
    pub plugin: String,
    pub type_instance: String,
    pub kind: MetricKind,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl GaugeSample {
    pub fn new(type_instance: impl Into<String>, value: f64) -> Self {
        Self {
            plugin: PLUGIN_NAME.to_string(),
            type_instance: type_instance.into(),
            kind: MetricKind::Gauge,
            value,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Severity of a host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Failure,
    Warning,
    Okay,
}

/// Informational message pushed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default = "now_ms")]
    pub timestamp_ms: i64,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            plugin: None,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_prepend_reverses_insertion() {
        let mut roster = Roster::new();
        roster.prepend(EntityRecord::new("eth0"));
        roster.prepend(EntityRecord::new("eth1"));
        roster.prepend(EntityRecord::new("lo"));

        assert_eq!(roster.names(), vec!["lo", "eth1", "eth0"]);
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.get("eth1").unwrap().last_value, 0);
    }

    #[test]
    fn test_entity_record_keeps_raw_name() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"eth\xff0");
        let record = EntityRecord::new(raw);

        assert_eq!(record.raw_name(), raw);
        assert_eq!(record.name, "eth\u{FFFD}0");
    }

    #[test]
    fn test_gauge_sample_carries_plugin_name() {
        let sample = GaugeSample::new("eth0", 42.0);
        assert_eq!(sample.plugin, PLUGIN_NAME);
        assert_eq!(sample.kind, MetricKind::Gauge);
        assert!(sample.timestamp_ms > 0);
    }

    #[test]
    fn test_notification_deserializes_without_timestamp() {
        let n: Notification =
            serde_json::from_str(r#"{"severity":"warning","message":"link down"}"#).unwrap();
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(n.message, "link down");
        assert!(n.plugin.is_none());
        assert!(n.timestamp_ms > 0);
    }
}

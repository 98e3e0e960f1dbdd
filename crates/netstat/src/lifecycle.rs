//! Plugin lifecycle
//!
//! [`NetstatPlugin`] is the context object the host scheduler holds. The host
//! calls `configure` zero or more times, `initialize` once, `collect` on every
//! tick and `shutdown` at the end. Calls are expected to be serialized.

use crate::collector::{self, CollectStats, MetricsSink};
use crate::error::{NetstatError, Result};
use crate::models::{Notification, Roster};
use std::fmt;
use std::fs;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Config key selecting the directory to scan for interfaces
pub const KEY_NET_DIR_PATH: &str = "NetDirPath";
/// Config key selecting the per-interface statistics file
pub const KEY_STATISTICS: &str = "Statistics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Configured,
    Initialized,
    Collecting,
    ShutDown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Configured => "configured",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Collecting => "collecting",
            LifecycleState::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// Interface statistics collector driven by an external scheduler
pub struct NetstatPlugin {
    state: LifecycleState,
    root_path: Option<String>,
    stat_file: Option<String>,
    roster: Roster,
    sink: Arc<dyn MetricsSink>,
}

impl NetstatPlugin {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            state: LifecycleState::Unconfigured,
            root_path: None,
            stat_file: None,
            roster: Roster::new(),
            sink,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    pub fn stat_file(&self) -> Option<&str> {
        self.stat_file.as_deref()
    }

    fn ensure(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(NetstatError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Apply one key/value pair from the host configuration
    ///
    /// Keys match case-insensitively. A `NetDirPath` that is not a directory
    /// is logged but still stored.
    pub fn configure(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure(
            "configure",
            &[LifecycleState::Unconfigured, LifecycleState::Configured],
        )?;

        if key.eq_ignore_ascii_case(KEY_NET_DIR_PATH) {
            if !is_dir(value) {
                let e = NetstatError::InvalidDirectoryConfig(value.to_string());
                error!(error = %e, "Accepting NetDirPath anyway");
            }
            self.root_path = Some(value.to_string());
        } else if key.eq_ignore_ascii_case(KEY_STATISTICS) {
            self.stat_file = Some(value.to_string());
        } else {
            let e = NetstatError::UnknownConfigKey(key.to_string());
            error!(error = %e, "Rejected config key");
            return Err(e);
        }

        debug!(key = %key, value = %value, "Config key applied");
        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Discover interfaces under the configured root path
    ///
    /// Returns the number of interfaces found. An empty roster is only a
    /// warning.
    pub fn initialize(&mut self) -> Result<usize> {
        self.ensure(
            "initialize",
            &[LifecycleState::Unconfigured, LifecycleState::Configured],
        )?;
        info!("netstat started");

        let root = self.root_path.as_deref().ok_or(NetstatError::MissingConfig {
            key: KEY_NET_DIR_PATH,
        })?;

        let (count, roster) = collector::discover(root).inspect_err(|e| {
            error!(error = %e, "Interface discovery failed");
        })?;

        if count == 0 {
            warn!(path = %root, error = %NetstatError::EmptyRoster, "Nothing to collect");
        }

        info!(count, interfaces = ?roster.names(), "Network interfaces found");
        for entity in roster.iter() {
            info!(interface = %entity.name, "Monitoring interface");
        }

        self.roster = roster;
        self.state = LifecycleState::Initialized;
        Ok(count)
    }

    /// Read every interface once and emit a sample per interface
    pub fn collect(&mut self) -> Result<CollectStats> {
        self.ensure(
            "collect",
            &[LifecycleState::Initialized, LifecycleState::Collecting],
        )?;

        let stat_file = self.stat_file.as_deref().ok_or(NetstatError::MissingConfig {
            key: KEY_STATISTICS,
        })?;
        // initialize() cannot succeed without a root path
        let root = self.root_path.as_deref().ok_or(NetstatError::MissingConfig {
            key: KEY_NET_DIR_PATH,
        })?;

        self.state = LifecycleState::Collecting;
        collector::collect(&mut self.roster, root, stat_file, self.sink.as_ref())
    }

    /// Release the roster and configuration
    ///
    /// Calling it again after a completed shutdown does nothing.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == LifecycleState::ShutDown {
            debug!("netstat already shut down");
            return Ok(());
        }

        info!(interfaces = self.roster.len(), "netstat shutdown");
        self.roster.clear();
        self.root_path = None;
        self.stat_file = None;
        self.state = LifecycleState::ShutDown;
        Ok(())
    }

    /// Log a notification pushed by the host
    pub fn on_notification(&self, notification: &Notification) {
        debug!(severity = ?notification.severity, "netstat notification");
        info!(
            plugin = notification.plugin.as_deref().unwrap_or("-"),
            message = %notification.message,
            "Notification received"
        );
    }
}

fn is_dir(path: &str) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

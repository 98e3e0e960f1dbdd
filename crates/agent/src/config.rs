//! Agent configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional config file
pub const CONFIG_PATH_ENV: &str = "NETSTAT_CONFIG";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Directory whose entries are the interfaces to monitor
    #[serde(default = "default_net_dir_path")]
    pub net_dir_path: String,

    /// Statistics file read for each interface
    #[serde(default = "default_statistics")]
    pub statistics: String,

    /// Collection interval in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// API server port for health/metrics/notifications
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Capacity of the notification channel
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

fn default_net_dir_path() -> String {
    "/sys/class/net/".to_string()
}

fn default_statistics() -> String {
    "rx_bytes".to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_api_port() -> u16 {
    9102
}

fn default_notification_buffer() -> usize {
    64
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            net_dir_path: default_net_dir_path(),
            statistics: default_statistics(),
            interval_secs: default_interval(),
            api_port: default_api_port(),
            notification_buffer: default_notification_buffer(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the file named by `NETSTAT_CONFIG`, if any,
    /// overlaid with `NETSTAT_*` environment variables
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(file.as_deref().map(Path::new))
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("NETSTAT"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Key/value pairs in the form the plugin's `configure` expects
    pub fn plugin_options(&self) -> [(&'static str, &str); 2] {
        [
            (netstat::lifecycle::KEY_NET_DIR_PATH, self.net_dir_path.as_str()),
            (netstat::lifecycle::KEY_STATISTICS, self.statistics.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.net_dir_path, "/sys/class/net/");
        assert_eq!(config.statistics, "rx_bytes");
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.api_port, 9102);
        assert_eq!(config.notification_buffer, 64);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "net_dir_path = \"/tmp/net/\"").unwrap();
        writeln!(file, "statistics = \"tx_packets\"").unwrap();
        writeln!(file, "interval_secs = 30").unwrap();

        let config = AgentConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.net_dir_path, "/tmp/net/");
        assert_eq!(config.statistics, "tx_packets");
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.api_port, 9102);
    }

    #[test]
    fn test_plugin_options() {
        let config = AgentConfig::default();
        assert_eq!(
            config.plugin_options(),
            [("NetDirPath", "/sys/class/net/"), ("Statistics", "rx_bytes")]
        );
    }
}

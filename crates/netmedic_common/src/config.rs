//! netmedic configuration
//!
//! Configuration lives in /etc/netmedic/config.toml. Every field is
//! optional; a missing file means defaults. A file that exists but cannot be
//! read or parsed is fatal, since the run would otherwise silently use
//! settings the operator did not ask for.

use crate::error::{NetMedicError, Result};
use crate::probes::{DEFAULT_DNS_PROBE_NAME, DEFAULT_PING_TARGET};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/netmedic/config.toml";

/// Conventional primary interface name
pub const DEFAULT_INTERFACE: &str = "eth0";

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Externally routable host for the ICMP probe
    #[serde(default = "default_ping_target")]
    pub ping_target: String,

    /// Well-known name for the DNS probe
    #[serde(default = "default_dns_probe_name")]
    pub dns_probe_name: String,

    /// Timeout for each read-only query (seconds)
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_ping_target() -> String {
    DEFAULT_PING_TARGET.to_string()
}

fn default_dns_probe_name() -> String {
    DEFAULT_DNS_PROBE_NAME.to_string()
}

fn default_query_timeout() -> u64 {
    5
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_target: default_ping_target(),
            dns_probe_name: default_dns_probe_name(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

/// Repair settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Timeout for each mutating command (seconds)
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,

    #[serde(default = "default_resolv_conf_path")]
    pub resolv_conf_path: PathBuf,

    /// Permit backing up and overwriting the resolver config
    #[serde(default)]
    pub allow_resolv_conf_edit: bool,
}

fn default_action_timeout() -> u64 {
    30
}

fn default_resolv_conf_path() -> PathBuf {
    PathBuf::from(DEFAULT_RESOLV_CONF)
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: default_action_timeout(),
            resolv_conf_path: default_resolv_conf_path(),
            allow_resolv_conf_edit: false,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Interface to diagnose
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Exit non-zero when any remediation failed
    #[serde(default)]
    pub strict_exit: bool,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub repair: RepairConfig,
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            strict_exit: false,
            probe: ProbeConfig::default(),
            repair: RepairConfig::default(),
        }
    }
}

impl Config {
    /// Load config from path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Parse and validate TOML
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interface.trim().is_empty() {
            return Err(NetMedicError::Config("interface must not be empty".into()));
        }
        if self.probe.ping_target.trim().is_empty() {
            return Err(NetMedicError::Config("probe.ping_target must not be empty".into()));
        }
        if self.probe.dns_probe_name.trim().is_empty() {
            return Err(NetMedicError::Config(
                "probe.dns_probe_name must not be empty".into(),
            ));
        }
        if self.probe.query_timeout_secs == 0 {
            return Err(NetMedicError::Config(
                "probe.query_timeout_secs must be at least 1".into(),
            ));
        }
        if self.repair.action_timeout_secs == 0 {
            return Err(NetMedicError::Config(
                "repair.action_timeout_secs must be at least 1".into(),
            ));
        }
        if self.repair.resolv_conf_path.as_os_str().is_empty() {
            return Err(NetMedicError::Config(
                "repair.resolv_conf_path must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.query_timeout_secs)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.repair.action_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.probe.ping_target, "1.1.1.1");
        assert_eq!(config.probe.query_timeout_secs, 5);
        assert_eq!(config.repair.action_timeout_secs, 30);
        assert_eq!(config.repair.resolv_conf_path, PathBuf::from("/etc/resolv.conf"));
        assert!(!config.repair.allow_resolv_conf_edit);
        assert!(!config.strict_exit);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
interface = "wlan0"

[probe]
dns_probe_name = "example.com"
query_timeout_secs = 2

[repair]
allow_resolv_conf_edit = true
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.interface, "wlan0");
        assert_eq!(config.probe.dns_probe_name, "example.com");
        assert_eq!(config.query_timeout(), Duration::from_secs(2));
        assert!(config.repair.allow_resolv_conf_edit);
        // Defaults for missing fields
        assert_eq!(config.probe.ping_target, "1.1.1.1");
        assert_eq!(config.repair.action_timeout_secs, 30);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Config::parse("[probe]\nquery_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, NetMedicError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Config::parse("interface = [").unwrap_err();
        assert!(matches!(err, NetMedicError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "interface = \"enp3s0\"\nstrict_exit = true").unwrap();
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.interface, "enp3s0");
        assert!(config.strict_exit);
    }
}

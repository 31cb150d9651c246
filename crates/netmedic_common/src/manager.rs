//! Network manager detection
//!
//! Three dialects can own an interface: NetworkManager, systemd-networkd and
//! the legacy ifupdown scripts. More than one may look active; remediation
//! picks the first in precedence order and falls back to raw `ip`/`dhclient`.

use crate::executor::Executor;
use crate::runner::argv;
use serde::{Deserialize, Serialize};

/// Which toolchain remediation commands are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// NetworkManager (service-based manager)
    NetworkManager,
    /// systemd-networkd (link-state daemon)
    Networkd,
    /// ifupdown (legacy up/down scripts)
    Ifupdown,
    /// No recognized manager; raw kernel tools
    Raw,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::NetworkManager => "NetworkManager",
            Dialect::Networkd => "systemd-networkd",
            Dialect::Ifupdown => "ifupdown",
            Dialect::Raw => "raw",
        }
    }

    /// systemd unit restarted for generic remediation
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Dialect::NetworkManager => Some("NetworkManager"),
            Dialect::Networkd => Some("systemd-networkd"),
            Dialect::Ifupdown => Some("networking"),
            Dialect::Raw => None,
        }
    }
}

/// Which manager dialects look active on this host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSet {
    pub network_manager: bool,
    pub networkd: bool,
    pub ifupdown: bool,
}

impl ManagerSet {
    /// First active dialect in precedence order
    pub fn dialect(&self) -> Dialect {
        if self.network_manager {
            Dialect::NetworkManager
        } else if self.networkd {
            Dialect::Networkd
        } else if self.ifupdown {
            Dialect::Ifupdown
        } else {
            Dialect::Raw
        }
    }

    /// Names of every dialect that looked active
    pub fn active(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.network_manager {
            active.push(Dialect::NetworkManager.as_str());
        }
        if self.networkd {
            active.push(Dialect::Networkd.as_str());
        }
        if self.ifupdown {
            active.push(Dialect::Ifupdown.as_str());
        }
        active
    }
}

pub fn network_manager_query() -> Vec<String> {
    argv(&["systemctl", "is-active", "--quiet", "NetworkManager"])
}

pub fn networkd_query() -> Vec<String> {
    argv(&["systemctl", "is-active", "--quiet", "systemd-networkd"])
}

pub fn ifupdown_query() -> Vec<String> {
    argv(&["which", "ifup"])
}

/// Query the runner once per dialect
pub async fn detect(exec: &Executor<'_>) -> ManagerSet {
    let managers = ManagerSet {
        network_manager: exec.query(&network_manager_query()).await.success(),
        networkd: exec.query(&networkd_query()).await.success(),
        ifupdown: exec.query(&ifupdown_query()).await.success(),
    };

    let active = managers.active();
    if active.is_empty() {
        exec.sink()
            .info("No network manager detected, using raw fallback commands");
    } else {
        exec.sink().info(&format!(
            "Network managers active: {} (using {})",
            active.join(", "),
            managers.dialect().as_str()
        ));
    }
    if active.len() > 1 {
        exec.sink().warn(&format!(
            "Multiple network managers active: {} - this may cause conflicts",
            active.join(", ")
        ));
    }

    managers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeRunner;
    use crate::runner::CommandOutput;
    use crate::sink::MemorySink;
    use std::time::Duration;

    #[test]
    fn test_dialect_precedence() {
        let all = ManagerSet {
            network_manager: true,
            networkd: true,
            ifupdown: true,
        };
        assert_eq!(all.dialect(), Dialect::NetworkManager);

        let daemon_and_legacy = ManagerSet {
            network_manager: false,
            networkd: true,
            ifupdown: true,
        };
        assert_eq!(daemon_and_legacy.dialect(), Dialect::Networkd);

        let legacy = ManagerSet {
            ifupdown: true,
            ..Default::default()
        };
        assert_eq!(legacy.dialect(), Dialect::Ifupdown);

        assert_eq!(ManagerSet::default().dialect(), Dialect::Raw);
    }

    #[test]
    fn test_service_names() {
        assert_eq!(Dialect::NetworkManager.service_name(), Some("NetworkManager"));
        assert_eq!(Dialect::Ifupdown.service_name(), Some("networking"));
        assert_eq!(Dialect::Raw.service_name(), None);
    }

    #[tokio::test]
    async fn test_detect_issues_three_queries() {
        let runner = FakeRunner::new()
            .with("systemctl is-active --quiet systemd-networkd", CommandOutput::ok(""))
            .with("which ifup", CommandOutput::ok("/usr/sbin/ifup\n"));
        let sink = MemorySink::new();
        let exec = Executor::new(
            &runner,
            &sink,
            false,
            Duration::from_secs(5),
            Duration::from_secs(30),
        );

        let managers = detect(&exec).await;

        assert_eq!(runner.calls().len(), 3);
        assert!(!managers.network_manager);
        assert!(managers.networkd);
        assert!(managers.ifupdown);
        assert_eq!(managers.dialect(), Dialect::Networkd);
        assert!(sink.contains("may cause conflicts"));
    }
}

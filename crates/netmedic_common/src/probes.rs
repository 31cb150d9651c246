//! Probe layer - six read-only checks of interface and connectivity state
//!
//! Every probe is a single query through the executor. Anything other than
//! a clean, parseable success counts as broken: an unknown state is
//! suspicious, never healthy.

use crate::config::ProbeConfig;
use crate::executor::Executor;
use crate::runner::argv;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default target for the ICMP reachability probe
pub const DEFAULT_PING_TARGET: &str = "1.1.1.1";

/// Default hostname for the DNS probe
pub const DEFAULT_DNS_PROBE_NAME: &str = "archlinux.org";

/// Slack added on top of ping's own `-W` deadline
const PING_GRACE: Duration = Duration::from_secs(1);

// =============================================================================
// Commands
// =============================================================================

pub fn interface_exists_command(name: &str) -> Vec<String> {
    argv(&["ip", "link", "show", "dev", name])
}

pub fn link_state_command(name: &str) -> Vec<String> {
    argv(&["ip", "-o", "link", "show", "dev", name])
}

pub fn ipv4_command(name: &str) -> Vec<String> {
    argv(&["ip", "-o", "-4", "addr", "show", "dev", name])
}

pub fn default_route_command() -> Vec<String> {
    argv(&["ip", "route", "show", "default"])
}

pub fn ping_command(host: &str, timeout_secs: u64) -> Vec<String> {
    argv(&["ping", "-c", "1", "-W", &timeout_secs.to_string(), host])
}

pub fn dns_command(name: &str) -> Vec<String> {
    argv(&["getent", "hosts", name])
}

// =============================================================================
// Snapshot
// =============================================================================

/// The default route as reported by `ip route`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRoute {
    pub gateway: Option<String>,
    pub device: Option<String>,
}

/// Outcome of every probe, taken once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSnapshot {
    pub interface_exists: bool,
    pub link_up: bool,
    pub has_ipv4: bool,
    pub has_default_route: bool,
    pub ping_reachable: bool,
    pub dns_resolves: bool,

    /// IPv4 addresses bound to the interface, CIDR notation
    #[serde(default)]
    pub ipv4_addresses: Vec<String>,
    #[serde(default)]
    pub default_route: Option<DefaultRoute>,
}

impl ProbeSnapshot {
    /// Every probe passed
    pub fn healthy() -> Self {
        Self {
            interface_exists: true,
            link_up: true,
            has_ipv4: true,
            has_default_route: true,
            ping_reachable: true,
            dns_resolves: true,
            ipv4_addresses: Vec::new(),
            default_route: None,
        }
    }

    /// Snapshot built from the six booleans alone
    pub fn from_flags(
        interface_exists: bool,
        link_up: bool,
        has_ipv4: bool,
        has_default_route: bool,
        ping_reachable: bool,
        dns_resolves: bool,
    ) -> Self {
        Self {
            interface_exists,
            link_up: interface_exists && link_up,
            has_ipv4: interface_exists && has_ipv4,
            has_default_route,
            ping_reachable,
            dns_resolves,
            ipv4_addresses: Vec::new(),
            default_route: None,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.interface_exists
            && self.link_up
            && self.has_ipv4
            && self.has_default_route
            && self.ping_reachable
            && self.dns_resolves
    }
}

// =============================================================================
// Probes
// =============================================================================

pub async fn interface_exists(exec: &Executor<'_>, name: &str) -> bool {
    exec.query(&interface_exists_command(name)).await.success()
}

pub async fn link_up(exec: &Executor<'_>, name: &str) -> bool {
    let out = exec.query(&link_state_command(name)).await;
    out.success() && parse_link_up(&out.stdout)
}

pub async fn ipv4_addresses(exec: &Executor<'_>, name: &str) -> Vec<String> {
    let out = exec.query(&ipv4_command(name)).await;
    if !out.success() {
        return Vec::new();
    }
    parse_ipv4_addresses(&out.stdout)
}

pub async fn default_route(exec: &Executor<'_>) -> Option<DefaultRoute> {
    let out = exec.query(&default_route_command()).await;
    if !out.success() {
        return None;
    }
    parse_default_route(&out.stdout)
}

pub async fn ping_reachable(exec: &Executor<'_>, host: &str, timeout: Duration) -> bool {
    let secs = timeout.as_secs().max(1);
    exec.query_with_timeout(&ping_command(host, secs), timeout + PING_GRACE)
        .await
        .success()
}

pub async fn dns_resolves(exec: &Executor<'_>, name: &str, timeout: Duration) -> bool {
    let out = exec.query_with_timeout(&dns_command(name), timeout).await;
    out.success() && !out.stdout.trim().is_empty()
}

/// Run all six probes in order and log each result
///
/// Link and address probes are skipped when the interface does not exist.
pub async fn collect(exec: &Executor<'_>, interface: &str, config: &ProbeConfig) -> ProbeSnapshot {
    let sink = exec.sink();
    let timeout = exec.query_timeout();

    let exists = interface_exists(exec, interface).await;
    report(exec, exists, &format!("interface {} exists", interface));

    let (link, addresses) = if exists {
        let link = link_up(exec, interface).await;
        report(exec, link, &format!("link on {} is up", interface));
        let addresses = ipv4_addresses(exec, interface).await;
        let detail = if addresses.is_empty() {
            format!("{} has an IPv4 address", interface)
        } else {
            format!("{} has an IPv4 address ({})", interface, addresses.join(", "))
        };
        report(exec, !addresses.is_empty(), &detail);
        (link, addresses)
    } else {
        sink.debug(&format!(
            "Skipping link and address probes: {} does not exist",
            interface
        ));
        (false, Vec::new())
    };

    let route = default_route(exec).await;
    let route_detail = match route.as_ref().and_then(|r| r.gateway.as_deref()) {
        Some(gw) => format!("default route via {}", gw),
        None => "default route".to_string(),
    };
    report(exec, route.is_some(), &route_detail);

    let ping = ping_reachable(exec, &config.ping_target, timeout).await;
    report(exec, ping, &format!("{} answers ICMP echo", config.ping_target));

    let dns = dns_resolves(exec, &config.dns_probe_name, timeout).await;
    report(exec, dns, &format!("{} resolves", config.dns_probe_name));

    ProbeSnapshot {
        interface_exists: exists,
        link_up: link,
        has_ipv4: !addresses.is_empty(),
        has_default_route: route.is_some(),
        ping_reachable: ping,
        dns_resolves: dns,
        ipv4_addresses: addresses,
        default_route: route,
    }
}

fn report(exec: &Executor<'_>, passed: bool, what: &str) {
    if passed {
        exec.sink().info(&format!("[OK] {}", what));
    } else {
        exec.sink().warn(&format!("[FAIL] {}", what));
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// `state UP`, or carrier present (`LOWER_UP`) for devices reporting `state UNKNOWN`
pub fn parse_link_up(stdout: &str) -> bool {
    stdout.lines().any(|line| {
        if line.contains("state UP") {
            return true;
        }
        match (line.find('<'), line.find('>')) {
            (Some(start), Some(end)) if start < end => line[start + 1..end]
                .split(',')
                .any(|flag| flag == "LOWER_UP"),
            _ => false,
        }
    })
}

/// Addresses following each `inet` token
pub fn parse_ipv4_addresses(stdout: &str) -> Vec<String> {
    let mut addresses = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        while let Some(part) = parts.next() {
            if part == "inet" {
                if let Some(addr) = parts.next() {
                    addresses.push(addr.to_string());
                }
            }
        }
    }
    addresses
}

/// First line starting with `default`
pub fn parse_default_route(stdout: &str) -> Option<DefaultRoute> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("default"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    let value_after = |key: &str| {
        parts
            .iter()
            .position(|p| *p == key)
            .and_then(|i| parts.get(i + 1))
            .map(|s| s.to_string())
    };

    Some(DefaultRoute {
        gateway: value_after("via"),
        device: value_after("dev"),
    })
}

//! Scripted command runner for deterministic testing
//!
//! Responses are keyed by the rendered command line. Exact matches win over
//! prefix rules; among prefix rules the most recently added wins. Anything
//! unscripted fails, which the probes read as "broken".
//!
//! ```rust,ignore
//! let runner = FakeRunner::healthy_host("eth0")
//!     .with_dialect(Dialect::NetworkManager)
//!     .with("ip -o -4 addr show dev eth0", CommandOutput::ok(""));
//! ```

use crate::manager::{self, Dialect};
use crate::probes;
use crate::runner::{render_command, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A recorded runner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub timeout: Duration,
}

pub struct FakeRunner {
    exact: HashMap<String, CommandOutput>,
    prefixes: Vec<(String, CommandOutput)>,
    default_response: CommandOutput,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    /// Runner with no scripted responses; every command fails
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
            default_response: CommandOutput::failed(1, "no scripted response"),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Runner on which every probe for `iface` passes and no manager is active
    pub fn healthy_host(iface: &str) -> Self {
        let link = format!(
            "2: {}: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP \
             mode DEFAULT group default qlen 1000",
            iface
        );
        let ether = "link/ether 08:00:27:12:34:56 brd ff:ff:ff:ff:ff:ff";
        let addr = format!(
            "2: {0}    inet 192.168.1.23/24 brd 192.168.1.255 scope global dynamic {0}\\       \
             valid_lft 85000sec preferred_lft 85000sec\n",
            iface
        );
        let route = format!("default via 192.168.1.1 dev {} proto dhcp metric 100\n", iface);
        let ping = "PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.\n\
                    64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.2 ms\n";

        Self::new()
            .with(
                &render_command(&probes::interface_exists_command(iface)),
                CommandOutput::ok(&format!("{}\n    {}\n", link, ether)),
            )
            .with(
                &render_command(&probes::link_state_command(iface)),
                CommandOutput::ok(&format!("{}\\    {}\n", link, ether)),
            )
            .with(&render_command(&probes::ipv4_command(iface)), CommandOutput::ok(&addr))
            .with(&render_command(&probes::default_route_command()), CommandOutput::ok(&route))
            .with_prefix("ping ", CommandOutput::ok(ping))
            .with_prefix("getent hosts ", CommandOutput::ok("95.217.163.246  archlinux.org\n"))
    }

    /// Mark one dialect as active
    pub fn with_dialect(self, dialect: Dialect) -> Self {
        let query = match dialect {
            Dialect::NetworkManager => manager::network_manager_query(),
            Dialect::Networkd => manager::networkd_query(),
            Dialect::Ifupdown => manager::ifupdown_query(),
            Dialect::Raw => return self,
        };
        self.with(&render_command(&query), CommandOutput::ok(""))
    }

    /// Script an exact command line
    pub fn with(mut self, command: &str, output: CommandOutput) -> Self {
        self.exact.insert(command.to_string(), output);
        self
    }

    /// Script every command line starting with `prefix`
    pub fn with_prefix(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.prefixes.retain(|(p, _)| p != prefix);
        self.prefixes.push((prefix.to_string(), output));
        self
    }

    /// Response for anything unscripted
    pub fn with_default(mut self, output: CommandOutput) -> Self {
        self.default_response = output;
        self
    }

    /// Command lines in the order they were run
    pub fn calls(&self) -> Vec<String> {
        self.recorded().into_iter().map(|c| c.command).collect()
    }

    /// Every call with its timeout
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Timeout passed on the most recent run of `command`
    pub fn timeout_for(&self, command: &str) -> Option<Duration> {
        self.recorded()
            .into_iter()
            .rev()
            .find(|c| c.command == command)
            .map(|c| c.timeout)
    }

    fn respond(&self, command: &str) -> CommandOutput {
        if let Some(output) = self.exact.get(command) {
            return output.clone();
        }
        self.prefixes
            .iter()
            .rev()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandOutput {
        let command = render_command(argv);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                command: command.clone(),
                timeout,
            });
        }
        self.respond(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::argv;

    #[tokio::test]
    async fn test_exact_beats_prefix() {
        let runner = FakeRunner::new()
            .with_prefix("ping ", CommandOutput::ok("prefix"))
            .with("ping -c 1 -W 5 1.1.1.1", CommandOutput::ok("exact"));

        let exact = runner
            .run(&argv(&["ping", "-c", "1", "-W", "5", "1.1.1.1"]), Duration::from_secs(6))
            .await;
        assert_eq!(exact.stdout, "exact");

        let prefix = runner
            .run(&argv(&["ping", "-c", "1", "-W", "3", "1.1.1.1"]), Duration::from_secs(4))
            .await;
        assert_eq!(prefix.stdout, "prefix");
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_prefix_replacement() {
        let runner = FakeRunner::new()
            .with_prefix("ping ", CommandOutput::ok("old"))
            .with_prefix("ping ", CommandOutput::failed(1, "new"));
        let out = runner.run(&argv(&["ping", "x"]), Duration::from_secs(1)).await;
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_unscripted_fails() {
        let runner = FakeRunner::new();
        let out = runner.run(&argv(&["whatever"]), Duration::from_secs(1)).await;
        assert!(!out.success());
        assert_eq!(runner.timeout_for("whatever"), Some(Duration::from_secs(1)));
    }
}

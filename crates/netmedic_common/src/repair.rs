//! Repair policy - score-gated, manager-aware remediation
//!
//! Walks fault categories bottom-up through the stack (link, address,
//! route, reachability, naming) regardless of score magnitude. Fixing a
//! lower layer often makes the higher-layer remediation moot.
//!
//! Every remediation is best-effort: a failure is logged and the walk
//! continues. The only error that escapes is a fatal resolver permission
//! problem.

use crate::config::RepairConfig;
use crate::diagnosis::{Diagnosis, Suspicion};
use crate::error::Result;
use crate::executor::{Executor, MutationResult, OutcomeStatus};
use crate::manager::{self, Dialect, ManagerSet};
use crate::resolver;
use crate::runner::argv;
use serde::Serialize;

/// Score at or above which a category's remediation fires
pub const ACTION_THRESHOLD: f64 = 0.4;

/// Score above which the interface is treated as absent
pub const MISSING_THRESHOLD: f64 = 0.5;

/// Remediation order, lowest layer first
pub const REPAIR_ORDER: [Suspicion; 5] = [
    Suspicion::LinkDown,
    Suspicion::NoIPv4,
    Suspicion::NoRoute,
    Suspicion::NoInternet,
    Suspicion::DnsBroken,
];

/// Repair pass state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairState {
    Diagnosing,
    Repairing,
    Done,
}

/// One attempted action
#[derive(Debug, Clone, Serialize)]
pub struct RemediationOutcome {
    pub suspicion: Suspicion,
    pub action: String,
    /// Exact command line, if the action has one
    pub command: Option<String>,
    pub status: OutcomeStatus,
    pub output: String,
}

impl RemediationOutcome {
    pub fn from_mutation(suspicion: Suspicion, action: &str, result: MutationResult) -> Self {
        Self {
            suspicion,
            action: action.to_string(),
            command: Some(result.command),
            status: result.status,
            output: result.output,
        }
    }

    pub fn skipped(suspicion: Suspicion, action: &str, reason: &str) -> Self {
        Self {
            suspicion,
            action: action.to_string(),
            command: None,
            status: OutcomeStatus::Skipped,
            output: reason.to_string(),
        }
    }

    pub fn format_summary(&self) -> String {
        match &self.command {
            Some(cmd) => format!(
                "{} {} ({}): {}",
                self.status.symbol(),
                self.action,
                self.suspicion,
                cmd
            ),
            None => format!("{} {} ({})", self.status.symbol(), self.action, self.suspicion),
        }
    }
}

/// Result of one repair pass
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub state: RepairState,
    /// Non-actionable advice when no software fix applies
    pub hint: Option<String>,
    /// Detected managers, if any remediation needed them
    pub managers: Option<ManagerSet>,
    pub outcomes: Vec<RemediationOutcome>,
}

impl RepairReport {
    fn new() -> Self {
        Self {
            state: RepairState::Diagnosing,
            hint: None,
            managers: None,
            outcomes: Vec::new(),
        }
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failed) > 0
    }
}

pub fn hardware_hint(interface: &str) -> String {
    format!(
        "Interface {} does not exist. This is a hardware or driver problem \
         (missing device, unloaded kernel module, renamed interface); \
         no generic software fix applies. Check `ip link`, `lspci -k` / `lsusb` and `dmesg`.",
        interface
    )
}

// =============================================================================
// Commands
// =============================================================================

/// Bring the link up
pub fn link_down_command(dialect: Dialect, iface: &str) -> Vec<String> {
    match dialect {
        Dialect::NetworkManager => argv(&["nmcli", "device", "connect", iface]),
        Dialect::Networkd => argv(&["systemctl", "restart", "systemd-networkd"]),
        Dialect::Ifupdown => argv(&["ifup", iface]),
        Dialect::Raw => argv(&["ip", "link", "set", "dev", iface, "up"]),
    }
}

/// Obtain an address
pub fn no_ipv4_command(dialect: Dialect, iface: &str) -> Vec<String> {
    match dialect {
        Dialect::NetworkManager => argv(&["nmcli", "device", "connect", iface]),
        Dialect::Networkd => argv(&["systemctl", "restart", "systemd-networkd"]),
        Dialect::Ifupdown => argv(&["ifup", iface]),
        Dialect::Raw => argv(&["dhclient", "-v", iface]),
    }
}

/// Generic manager restart; no raw equivalent exists
pub fn manager_restart_command(dialect: Dialect) -> Option<Vec<String>> {
    dialect
        .service_name()
        .map(|service| argv(&["systemctl", "restart", service]))
}

fn link_down_action(dialect: Dialect, iface: &str) -> String {
    match dialect {
        Dialect::NetworkManager => format!("Ask NetworkManager to connect {}", iface),
        Dialect::Networkd => "Restart systemd-networkd".to_string(),
        Dialect::Ifupdown => format!("Bring {} up with ifup", iface),
        Dialect::Raw => format!("Set link {} up", iface),
    }
}

fn no_ipv4_action(dialect: Dialect, iface: &str) -> String {
    match dialect {
        Dialect::NetworkManager => format!("Ask NetworkManager to reconnect {}", iface),
        Dialect::Networkd => "Restart systemd-networkd".to_string(),
        Dialect::Ifupdown => format!("Re-run ifup for {}", iface),
        Dialect::Raw => format!("Request a DHCP lease on {}", iface),
    }
}

// =============================================================================
// Policy
// =============================================================================

pub struct RepairPolicy<'a> {
    interface: &'a str,
    config: &'a RepairConfig,
}

impl<'a> RepairPolicy<'a> {
    pub fn new(interface: &'a str, config: &'a RepairConfig) -> Self {
        Self { interface, config }
    }

    /// Run one pass over `diagnosis`
    pub async fn run(&self, exec: &Executor<'_>, diagnosis: &Diagnosis) -> Result<RepairReport> {
        let sink = exec.sink();
        let mut report = RepairReport::new();

        loop {
            report.state = match report.state {
                RepairState::Diagnosing => {
                    if diagnosis.score(Suspicion::InterfaceMissing) > MISSING_THRESHOLD {
                        let hint = hardware_hint(self.interface);
                        sink.error(&hint);
                        report.hint = Some(hint);
                        RepairState::Done
                    } else if diagnosis.is_healthy() {
                        sink.info("No faults suspected, nothing to repair");
                        RepairState::Done
                    } else {
                        RepairState::Repairing
                    }
                }
                RepairState::Repairing => {
                    for suspicion in REPAIR_ORDER {
                        let score = diagnosis.score(suspicion);
                        if score < ACTION_THRESHOLD {
                            sink.debug(&format!("{} = {:.1}, below threshold", suspicion, score));
                            continue;
                        }

                        sink.info(&format!(
                            "Suspected {} (score {:.1}), attempting remediation",
                            suspicion.description(),
                            score
                        ));
                        let outcomes = self.remediate(exec, suspicion, &mut report.managers).await?;
                        for outcome in outcomes {
                            log_outcome(exec, &outcome);
                            report.outcomes.push(outcome);
                        }
                    }
                    RepairState::Done
                }
                RepairState::Done => break,
            };
        }

        Ok(report)
    }

    async fn remediate(
        &self,
        exec: &Executor<'_>,
        suspicion: Suspicion,
        managers: &mut Option<ManagerSet>,
    ) -> Result<Vec<RemediationOutcome>> {
        let iface = self.interface;

        let outcome = match suspicion {
            Suspicion::InterfaceMissing => return Ok(Vec::new()),
            Suspicion::DnsBroken => return resolver::remediate(exec, self.config).await,
            Suspicion::LinkDown => {
                let dialect = dialect(exec, managers).await;
                let result = exec.mutate(&link_down_command(dialect, iface)).await;
                let action = link_down_action(dialect, iface);
                RemediationOutcome::from_mutation(suspicion, &action, result)
            }
            Suspicion::NoIPv4 => {
                let dialect = dialect(exec, managers).await;
                let result = exec.mutate(&no_ipv4_command(dialect, iface)).await;
                let action = no_ipv4_action(dialect, iface);
                RemediationOutcome::from_mutation(suspicion, &action, result)
            }
            Suspicion::NoRoute | Suspicion::NoInternet => {
                let dialect = dialect(exec, managers).await;
                match (manager_restart_command(dialect), dialect.service_name()) {
                    (Some(cmd), Some(service)) => {
                        let result = exec.mutate(&cmd).await;
                        let action = format!("Restart {}", service);
                        RemediationOutcome::from_mutation(suspicion, &action, result)
                    }
                    _ => {
                        let reason = if suspicion == Suspicion::NoRoute {
                            "no network manager to restart; add a default route by hand \
                             (ip route add default via <gateway>)"
                        } else {
                            "no network manager to restart; \
                             check the gateway, firewall and upstream link"
                        };
                        exec.sink().info(&format!("Guidance: {}", reason));
                        RemediationOutcome::skipped(suspicion, "Restart network manager", reason)
                    }
                }
            }
        };

        Ok(vec![outcome])
    }
}

/// Detect managers on first use, then reuse the result for the whole pass
async fn dialect(exec: &Executor<'_>, managers: &mut Option<ManagerSet>) -> Dialect {
    if let Some(found) = managers {
        return found.dialect();
    }
    let found = manager::detect(exec).await;
    *managers = Some(found);
    found.dialect()
}

fn log_outcome(exec: &Executor<'_>, outcome: &RemediationOutcome) {
    let sink = exec.sink();
    match outcome.status {
        OutcomeStatus::Applied => sink.info(&format!("[OK] {}", outcome.action)),
        OutcomeStatus::Failed => sink.warn(&format!(
            "Remediation failed for {}: {}{}",
            outcome.suspicion,
            outcome.action,
            if outcome.output.is_empty() {
                String::new()
            } else {
                format!(" ({})", outcome.output)
            }
        )),
        OutcomeStatus::DryRun => sink.debug(&format!("[DRY] {}", outcome.action)),
        OutcomeStatus::Skipped => sink.info(&format!("[SKIP] {}", outcome.action)),
    }
}

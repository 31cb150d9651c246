//! Network doctor - one diagnose-then-repair pass over a single interface
//!
//! Probe once, score once, repair once. Nothing is re-probed mid-repair and
//! nothing is retried; re-running the tool is the retry.

use crate::config::Config;
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::executor::{Executor, OutcomeStatus};
use crate::probes::{self, ProbeSnapshot};
use crate::repair::{RepairPolicy, RepairReport};
use crate::runner::CommandRunner;
use crate::sink::LogSink;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything one pass observed and did
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub interface: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub snapshot: ProbeSnapshot,
    pub diagnosis: Diagnosis,
    pub repair: RepairReport,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.repair.has_failures()
    }

    pub fn summary_line(&self) -> String {
        if let Some(hint) = &self.repair.hint {
            return format!("{}: no remediation possible. {}", self.interface, hint);
        }
        if self.repair.outcomes.is_empty() {
            return format!("{}: {}", self.interface, self.diagnosis.format_summary());
        }
        format!(
            "{}: {} | {} applied, {} failed, {} dry-run, {} skipped",
            self.interface,
            self.diagnosis.format_summary(),
            self.repair.count(OutcomeStatus::Applied),
            self.repair.count(OutcomeStatus::Failed),
            self.repair.count(OutcomeStatus::DryRun),
            self.repair.count(OutcomeStatus::Skipped),
        )
    }
}

pub struct NetworkDoctor<'a> {
    runner: &'a dyn CommandRunner,
    sink: &'a dyn LogSink,
    config: Config,
    dry_run: bool,
}

impl<'a> NetworkDoctor<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        sink: &'a dyn LogSink,
        config: Config,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            sink,
            config,
            dry_run,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probe, diagnose, repair
    pub async fn run(&self) -> Result<DoctorReport> {
        let started_at = Utc::now();
        let interface = self.config.interface.as_str();
        let exec = Executor::new(
            self.runner,
            self.sink,
            self.dry_run,
            self.config.query_timeout(),
            self.config.action_timeout(),
        );

        self.sink.info(&format!(
            "Diagnosing {}{}",
            interface,
            if self.dry_run { " (dry run)" } else { "" }
        ));

        let snapshot = probes::collect(&exec, interface, &self.config.probe).await;
        let diagnosis = Diagnosis::from_snapshot(&snapshot);
        self.sink.info(&format!("Diagnosis: {}", diagnosis.format_summary()));

        let repair = RepairPolicy::new(interface, &self.config.repair)
            .run(&exec, &diagnosis)
            .await?;

        let report = DoctorReport {
            interface: interface.to_string(),
            dry_run: self.dry_run,
            started_at,
            finished_at: Utc::now(),
            snapshot,
            diagnosis,
            repair,
        };

        if report.has_failures() {
            self.sink.warn(&report.summary_line());
        } else {
            self.sink.info(&report.summary_line());
        }

        Ok(report)
    }
}

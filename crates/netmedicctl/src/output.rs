//! Human-readable report rendering

use netmedic_common::executor::OutcomeStatus;
use netmedic_common::{DoctorReport, Suspicion};
use owo_colors::OwoColorize;

pub fn print_report(report: &DoctorReport) {
    let title = format!("netmedic: {}", report.interface);
    if report.dry_run {
        println!("{} {}", title.bold(), "(dry run)".yellow());
    } else {
        println!("{}", title.bold());
    }
    println!();

    println!("{}", "Diagnosis".bold());
    for suspicion in Suspicion::ALL {
        let score = report.diagnosis.score(suspicion);
        let line = format!("  {:<18} {:.1}", suspicion.as_str(), score);
        if score >= 0.7 {
            println!("{}", line.red());
        } else if score > 0.0 {
            println!("{}", line.yellow());
        } else {
            println!("{}", line.dimmed());
        }
    }
    println!();

    if let Some(hint) = &report.repair.hint {
        println!("{} {}", "[HINT]".red().bold(), hint);
        return;
    }

    if report.repair.outcomes.is_empty() {
        println!("{} {}", "[OK]".green().bold(), "Nothing to repair");
        return;
    }

    println!("{}", "Remediation".bold());
    for outcome in &report.repair.outcomes {
        let symbol = outcome.status.symbol();
        let symbol = match outcome.status {
            OutcomeStatus::Applied => symbol.green().bold().to_string(),
            OutcomeStatus::Failed => symbol.red().bold().to_string(),
            OutcomeStatus::DryRun => symbol.yellow().bold().to_string(),
            OutcomeStatus::Skipped => symbol.dimmed().to_string(),
        };
        println!("  {} {}", symbol, outcome.action);
        if let Some(cmd) = &outcome.command {
            println!("       {}", cmd.dimmed());
        }
        if outcome.status == OutcomeStatus::Failed && !outcome.output.is_empty() {
            println!("       {}", outcome.output.red());
        }
    }
    println!();
    println!("{}", report.summary_line());
}

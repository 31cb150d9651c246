//! DNS remediation
//!
//! Prefer restarting systemd-resolved. Without it, the only fix left is
//! rewriting the resolver config, which clobbers whatever wrote it. That
//! path is opt-in and always leaves a timestamped byte-for-byte backup.

use crate::config::RepairConfig;
use crate::diagnosis::Suspicion;
use crate::error::{NetMedicError, Result};
use crate::executor::{Executor, OutcomeStatus};
use crate::repair::RemediationOutcome;
use crate::runner::argv;
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Public resolvers written when the existing config is replaced
pub const FALLBACK_NAMESERVERS: [&str; 2] = ["1.1.1.1", "8.8.8.8"];

pub const RESOLVER_SERVICE: &str = "systemd-resolved";

/// Timestamp suffix format for backups
const BACKUP_STAMP: &str = "%Y%m%d%H%M%S";

pub fn resolver_active_query() -> Vec<String> {
    argv(&["systemctl", "is-active", "--quiet", RESOLVER_SERVICE])
}

pub fn resolver_restart_command() -> Vec<String> {
    argv(&["systemctl", "restart", RESOLVER_SERVICE])
}

/// `<path>.bak-<YYYYMMDDHHMMSS>`
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak-{}", now.format(BACKUP_STAMP)));
    PathBuf::from(name)
}

/// Exactly one `nameserver` line per fallback resolver
pub fn fallback_contents() -> String {
    FALLBACK_NAMESERVERS
        .iter()
        .map(|ns| format!("nameserver {}\n", ns))
        .collect()
}

/// DNS remediation for one pass
pub async fn remediate(
    exec: &Executor<'_>,
    config: &RepairConfig,
) -> Result<Vec<RemediationOutcome>> {
    let suspicion = Suspicion::DnsBroken;

    if exec.query(&resolver_active_query()).await.success() {
        let result = exec.mutate(&resolver_restart_command()).await;
        return Ok(vec![RemediationOutcome::from_mutation(
            suspicion,
            &format!("Restart {}", RESOLVER_SERVICE),
            result,
        )]);
    }

    let path = &config.resolv_conf_path;
    if !config.allow_resolv_conf_edit {
        let action = format!(
            "Back up {} and overwrite it with fallback nameservers {}",
            path.display(),
            FALLBACK_NAMESERVERS.join(", ")
        );
        exec.sink().warn(&format!(
            "Skipped (advisory): {}. Pass --allow-resolv-conf-edit to permit it.",
            action
        ));
        exec.sink().info(&format!(
            "Guidance: {} is not running. Check the nameserver lines in {}, \
             or set DNS servers through your network manager.",
            RESOLVER_SERVICE,
            path.display()
        ));
        return Ok(vec![RemediationOutcome::skipped(
            suspicion,
            &action,
            "resolver config edit not allowed",
        )]);
    }

    apply_fallback(exec, path, Local::now()).await
}

/// Why the original resolver config could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// Nothing to back up
    Missing,
    /// Any other failure; blocks the overwrite
    Unreadable(String),
}

/// Classify a read error on the original file
///
/// Permission problems are fatal for the whole run.
pub fn classify_read_error(path: &Path, err: std::io::Error) -> Result<ReadFailure> {
    match err.kind() {
        ErrorKind::PermissionDenied => Err(NetMedicError::ResolverPermission {
            path: path.to_path_buf(),
        }),
        ErrorKind::NotFound => Ok(ReadFailure::Missing),
        _ => Ok(ReadFailure::Unreadable(err.to_string())),
    }
}

/// Write `contents` to a backup path that must not exist yet
async fn write_backup(backup: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(backup)
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}

/// Back up `path` and overwrite it with the fallback nameservers
///
/// A permission error reading the original is fatal. Any other failure is
/// a failed outcome; the overwrite never happens without a backup of an
/// existing file. An existing backup is never replaced.
pub async fn apply_fallback(
    exec: &Executor<'_>,
    path: &Path,
    now: DateTime<Local>,
) -> Result<Vec<RemediationOutcome>> {
    let suspicion = Suspicion::DnsBroken;
    let backup = backup_path(path, now);
    let backup_line = format!("cp {} {}", path.display(), backup.display());
    let write_line = format!(
        "write {} ({})",
        path.display(),
        FALLBACK_NAMESERVERS
            .iter()
            .map(|ns| format!("nameserver {}", ns))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let backup_action = format!("Back up {}", path.display());
    let write_action = format!("Overwrite {} with fallback nameservers", path.display());

    let outcome =
        |action: &str, command: &str, status: OutcomeStatus, output: String| RemediationOutcome {
            suspicion,
            action: action.to_string(),
            command: Some(command.to_string()),
            status,
            output,
        };

    let mut outcomes = Vec::new();

    exec.announce_mutation(&backup_line);
    if exec.dry_run() {
        exec.announce_mutation(&write_line);
        outcomes.push(outcome(&backup_action, &backup_line, OutcomeStatus::DryRun, String::new()));
        outcomes.push(outcome(&write_action, &write_line, OutcomeStatus::DryRun, String::new()));
        return Ok(outcomes);
    }

    match tokio::fs::read(path).await {
        Ok(original) => match write_backup(&backup, &original).await {
            Ok(()) => outcomes.push(outcome(
                &backup_action,
                &backup_line,
                OutcomeStatus::Applied,
                format!("{} bytes saved to {}", original.len(), backup.display()),
            )),
            Err(e) => {
                let reason = if e.kind() == ErrorKind::AlreadyExists {
                    format!("{} already exists, refusing to replace it", backup.display())
                } else {
                    e.to_string()
                };
                outcomes.push(outcome(&backup_action, &backup_line, OutcomeStatus::Failed, reason));
                return Ok(outcomes);
            }
        },
        Err(e) => match classify_read_error(path, e)? {
            ReadFailure::Missing => {
                exec.sink()
                    .info(&format!("{} does not exist, nothing to back up", path.display()));
                outcomes.push(RemediationOutcome::skipped(
                    suspicion,
                    &backup_action,
                    "no existing file",
                ));
            }
            ReadFailure::Unreadable(reason) => {
                outcomes.push(outcome(&backup_action, &backup_line, OutcomeStatus::Failed, reason));
                return Ok(outcomes);
            }
        },
    }

    exec.announce_mutation(&write_line);
    let written = match tokio::fs::write(path, fallback_contents()).await {
        Ok(()) => outcome(&write_action, &write_line, OutcomeStatus::Applied, String::new()),
        Err(e) => outcome(&write_action, &write_line, OutcomeStatus::Failed, e.to_string()),
    };
    outcomes.push(written);

    Ok(outcomes)
}

//! Error types for netmedic.
//!
//! Probe and remediation failures are not errors: they are folded into
//! probe outcomes and `RemediationOutcome`s. Only failures that make the
//! whole pass meaningless end up here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetMedicError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(
        "Permission denied reading {}. Re-run as root or drop --allow-resolv-conf-edit.",
        path.display()
    )]
    ResolverPermission { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetMedicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_permission_message_names_path() {
        let err = NetMedicError::ResolverPermission {
            path: PathBuf::from("/etc/resolv.conf"),
        };
        assert!(err.to_string().contains("/etc/resolv.conf"));
    }
}

//! CLI - Command-line argument parsing

use clap::Parser;
use netmedic_common::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

/// Diagnose and repair connectivity on one network interface
#[derive(Parser, Debug)]
#[command(name = "netmedicctl")]
#[command(about = "netmedic - fuzzy network fault diagnosis and repair", long_about = None)]
#[command(version = env!("NETMEDIC_VERSION"))]
pub struct Cli {
    /// Interface to diagnose (overrides config)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Log every remediation command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Permit backing up and overwriting the resolver config when no resolver daemon runs
    #[arg(long)]
    pub allow_resolv_conf_edit: bool,

    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit 2 when any remediation failed
    #[arg(long)]
    pub strict_exit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["netmedicctl"]).unwrap();
        assert!(cli.interface.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.allow_resolv_conf_edit);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "netmedicctl",
            "-i",
            "wlan0",
            "--dry-run",
            "-v",
            "--allow-resolv-conf-edit",
            "--config",
            "/tmp/netmedic.toml",
            "--json",
            "--strict-exit",
        ])
        .unwrap();
        assert_eq!(cli.interface.as_deref(), Some("wlan0"));
        assert!(cli.dry_run && cli.verbose && cli.allow_resolv_conf_edit);
        assert!(cli.json && cli.strict_exit);
        assert_eq!(cli.config, PathBuf::from("/tmp/netmedic.toml"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["netmedicctl", "--fix-everything"]).is_err());
    }
}

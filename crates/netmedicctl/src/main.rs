//! netmedicctl - diagnose and repair one network interface
//!
//! One pass: probe, score, remediate, report. Logs go to stderr; the report
//! goes to stdout.

mod cli;
mod errors;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use errors::{exit_code_for, EXIT_GENERAL_ERROR};
use netmedic_common::{Config, NetworkDoctor, SystemRunner, TracingSink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("NETMEDIC_VERSION");

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_GENERAL_ERROR
        }
    };
    std::process::exit(code);
}

/// `--verbose` wins over `RUST_LOG`; `RUST_LOG` wins over the `info` default
fn filter_directives(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        _ if verbose => "debug".to_string(),
        Some(env) if !env.is_empty() => env.to_string(),
        _ => "info".to_string(),
    }
}

fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(interface) = &cli.interface {
        config.interface = interface.clone();
    }
    if cli.allow_resolv_conf_edit {
        config.repair.allow_resolv_conf_edit = true;
    }
    if cli.strict_exit {
        config.strict_exit = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    info!("netmedicctl v{}", VERSION);
    let config = load_config(&cli)?;
    let strict = config.strict_exit;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    let runner = SystemRunner::new();
    let sink = TracingSink;
    let report = runtime.block_on(NetworkDoctor::new(&runner, &sink, config, cli.dry_run).run())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }

    Ok(exit_code_for(&report, strict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_rust_log() {
        assert_eq!(filter_directives(true, Some("info")), "debug");
        assert_eq!(filter_directives(true, None), "debug");
    }

    #[test]
    fn test_rust_log_used_without_verbose() {
        assert_eq!(
            filter_directives(false, Some("netmedic_common=trace")),
            "netmedic_common=trace"
        );
    }

    #[test]
    fn test_default_is_info() {
        assert_eq!(filter_directives(false, None), "info");
        assert_eq!(filter_directives(false, Some("  ")), "info");
    }
}

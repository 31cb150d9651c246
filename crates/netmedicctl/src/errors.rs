//! Exit status for netmedicctl

use netmedic_common::DoctorReport;

/// Pass completed; failed remediations are reported, not signalled
pub const EXIT_SUCCESS: i32 = 0;

/// Fatal error: bad config, unreadable resolver config, runtime failure
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Strict mode only: at least one remediation failed
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

pub fn exit_code_for(report: &DoctorReport, strict: bool) -> i32 {
    if strict && report.has_failures() {
        EXIT_PARTIAL_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmedic_common::fakes::FakeRunner;
    use netmedic_common::manager::Dialect;
    use netmedic_common::runner::CommandOutput;
    use netmedic_common::{Config, MemorySink, NetworkDoctor};

    async fn failing_report() -> DoctorReport {
        let runner = FakeRunner::healthy_host("eth0")
            .with_dialect(Dialect::NetworkManager)
            .with("ip -o -4 addr show dev eth0", CommandOutput::ok(""))
            .with("nmcli device connect eth0", CommandOutput::failed(4, "activation failed"));
        let sink = MemorySink::new();
        NetworkDoctor::new(&runner, &sink, Config::default(), false)
            .run()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_failures_exit_zero_by_default() {
        let report = failing_report().await;
        assert_eq!(exit_code_for(&report, false), EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_failures_exit_two_when_strict() {
        let report = failing_report().await;
        assert_eq!(exit_code_for(&report, true), EXIT_PARTIAL_FAILURE);
    }

    #[tokio::test]
    async fn test_clean_run_exits_zero_when_strict() {
        let runner = FakeRunner::healthy_host("eth0");
        let sink = MemorySink::new();
        let report = NetworkDoctor::new(&runner, &sink, Config::default(), false)
            .run()
            .await
            .unwrap();
        assert_eq!(exit_code_for(&report, true), EXIT_SUCCESS);
    }
}

//! netmedic common - diagnosis and repair engine for one network interface
//!
//! Probes link, address, route, reachability and DNS state, scores each
//! fault category, and applies layered best-effort remediation through the
//! active network manager. OS commands go through an injected
//! `CommandRunner`; log lines go to an injected `LogSink`.

pub mod config;
pub mod diagnosis;
pub mod doctor;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod manager;
pub mod probes;
pub mod repair;
pub mod resolver;
pub mod runner;
pub mod sink;

pub use config::Config;
pub use diagnosis::{Diagnosis, Suspicion};
pub use doctor::{DoctorReport, NetworkDoctor};
pub use error::{NetMedicError, Result};
pub use executor::{Executor, OutcomeStatus};
pub use manager::{Dialect, ManagerSet};
pub use probes::ProbeSnapshot;
pub use repair::{RemediationOutcome, RepairPolicy, RepairReport, RepairState};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use sink::{LogLevel, LogSink, MemorySink, TracingSink};

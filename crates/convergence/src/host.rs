//! The `HostSystem` seam.
//!
//! All reads of and mutations to host state go through this trait. The fact
//! collector uses only the probe methods; the executor is the only component
//! allowed to call the mutating ones. Implementations live outside the
//! engine (hostkit provides the live apt/systemd host; tests provide mocks).

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::error::ExecutionError;
use crate::version::Version;

/// A probe against the host failed (e.g. the package database was
/// unavailable). Distinct from "resource absent": probe failures become
/// `Fact::Unknown` and force the builder to schedule an action.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

pub trait HostSystem: Send + Sync {
    // --- probes (no side effects) ---

    /// Installed version of a package, or `None` if not installed.
    fn package_version(&self, name: &str) -> Result<Option<Version>, ProbeError>;

    /// Whether a service is currently running.
    fn service_running(&self, name: &str) -> Result<bool, ProbeError>;

    /// Content digest of a file, or `None` if it does not exist.
    fn file_digest(&self, path: &Path) -> Result<Option<String>, ProbeError>;

    // --- mutations (executor only) ---

    fn install_package(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError>;

    fn copy_file(&self, source: &Path, dest: &Path, mode: u32) -> Result<(), ExecutionError>;

    fn start_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError>;

    fn stop_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError>;

    fn restart_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError>;

    fn run_command(&self, command: &str, timeout: Duration) -> Result<(), ExecutionError>;
}

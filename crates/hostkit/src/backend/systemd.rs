//! Service backend driving `systemctl`.

use convergence::{ExecutionError, ProbeError};
use std::process::Command;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether a unit is currently active. `systemctl is-active` exits
/// non-zero for inactive and failed units alike; only the printed state
/// distinguishes "stopped" from "no such unit", and both converge the
/// same way, so the probe reduces to active or not.
pub fn is_active(name: &str) -> Result<bool, ProbeError> {
    let mut cmd = Command::new("systemctl");
    cmd.args(["is-active", name]);

    let output =
        crate::command::run(cmd, PROBE_TIMEOUT).map_err(|e| ProbeError(e.to_string()))?;
    Ok(output.stdout.trim() == "active")
}

pub fn start(name: &str, timeout: Duration) -> Result<(), ExecutionError> {
    unit_action("start", name, timeout)
}

pub fn stop(name: &str, timeout: Duration) -> Result<(), ExecutionError> {
    unit_action("stop", name, timeout)
}

pub fn restart(name: &str, timeout: Duration) -> Result<(), ExecutionError> {
    unit_action("restart", name, timeout)
}

fn unit_action(verb: &str, name: &str, timeout: Duration) -> Result<(), ExecutionError> {
    let mut cmd = Command::new("systemctl");
    cmd.args([verb, name]);
    crate::command::run_checked(cmd, &format!("systemctl {verb} {name}"), timeout)?;
    Ok(())
}

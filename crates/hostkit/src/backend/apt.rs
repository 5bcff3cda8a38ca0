//! Debian package backend driving `dpkg-query` and `apt-get`.

use convergence::{ExecutionError, ProbeError, Version};
use std::process::Command;
use std::time::Duration;

/// Probe deadline: queries against the local dpkg database are fast; a
/// hang here means a stuck lock, not useful work.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Query the installed version of a package. `None` means not installed.
pub fn installed_version(name: &str) -> Result<Option<Version>, ProbeError> {
    let mut cmd = Command::new("dpkg-query");
    cmd.args(["--show", "--showformat=${db:Status-Status} ${Version}", name]);

    let output =
        crate::command::run(cmd, PROBE_TIMEOUT).map_err(|e| ProbeError(e.to_string()))?;

    // dpkg-query exits 1 for packages it has never heard of.
    if !output.success() {
        return Ok(None);
    }
    Ok(parse_query_line(&output.stdout))
}

/// Install a package non-interactively.
pub fn install(name: &str, timeout: Duration) -> Result<(), ExecutionError> {
    let mut cmd = Command::new("apt-get");
    cmd.args(["install", "-y", name])
        .env("DEBIAN_FRONTEND", "noninteractive");
    crate::command::run_checked(cmd, &format!("apt-get install {name}"), timeout)?;
    Ok(())
}

fn parse_query_line(stdout: &str) -> Option<Version> {
    let line = stdout.trim();
    let (status, version) = line.split_once(' ')?;
    // A removed-but-not-purged package still has a dpkg record.
    if status != "installed" || version.is_empty() {
        return None;
    }
    Some(Version::parse(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed() {
        let v = parse_query_line("installed 1.18.0-6ubuntu14.4").unwrap();
        assert!(v >= Version::parse("1.18"));
    }

    #[test]
    fn test_parse_removed_record_is_not_installed() {
        assert_eq!(parse_query_line("config-files 1.18.0-6ubuntu14.4"), None);
        assert_eq!(parse_query_line("not-installed "), None);
        assert_eq!(parse_query_line(""), None);
    }

    #[test]
    fn test_parse_epoch_version() {
        let v = parse_query_line("installed 1:8.0.32-0ubuntu0.22.04.2").unwrap();
        assert!(v > Version::parse("8.0"));
    }
}

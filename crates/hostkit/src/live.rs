//! The real host: dpkg/apt for packages, systemctl for services, the
//! local filesystem for files and command guards.

use convergence::{ExecutionError, HostSystem, ProbeError, Version};
use log::info;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::backend::{apt, systemd};
use crate::checksum;

/// [`HostSystem`] implementation backed by the local machine's tools.
#[derive(Debug, Default)]
pub struct LiveHost;

impl LiveHost {
    pub fn new() -> Self {
        Self
    }
}

impl HostSystem for LiveHost {
    fn package_version(&self, name: &str) -> Result<Option<Version>, ProbeError> {
        apt::installed_version(name)
    }

    fn service_running(&self, name: &str) -> Result<bool, ProbeError> {
        systemd::is_active(name)
    }

    fn file_digest(&self, path: &Path) -> Result<Option<String>, ProbeError> {
        checksum::file_digest(path).map_err(|e| ProbeError(format!("{}: {e}", path.display())))
    }

    fn install_package(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError> {
        info!("installing package {name}");
        apt::install(name, timeout)
    }

    fn copy_file(&self, source: &Path, dest: &Path, mode: u32) -> Result<(), ExecutionError> {
        info!("copying {} -> {}", source.display(), dest.display());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ExecutionError::from_io(&format!("create {}", parent.display()), &e))?;
        }
        fs::copy(source, dest).map_err(|e| {
            ExecutionError::from_io(
                &format!("copy {} -> {}", source.display(), dest.display()),
                &e,
            )
        })?;
        set_mode(dest, mode)
    }

    fn start_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError> {
        info!("starting service {name}");
        systemd::start(name, timeout)
    }

    fn stop_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError> {
        info!("stopping service {name}");
        systemd::stop(name, timeout)
    }

    fn restart_service(&self, name: &str, timeout: Duration) -> Result<(), ExecutionError> {
        info!("restarting service {name}");
        systemd::restart(name, timeout)
    }

    fn run_command(&self, command: &str, timeout: Duration) -> Result<(), ExecutionError> {
        info!("running command: {command}");
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        crate::command::run_checked(cmd, command, timeout)?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ExecutionError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ExecutionError::from_io(&format!("chmod {}", path.display()), &e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ExecutionError> {
    Ok(())
}

//! Actions: the units of change a plan is made of.

use std::path::PathBuf;

use crate::manifest::ResourceId;
use crate::version::Version;

/// What an action does to the host. Each variant carries exactly what the
/// executor needs to perform it and to re-check that it is still needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    InstallPackage {
        name: String,
        min_version: Option<Version>,
    },
    CopyFile {
        source: PathBuf,
        dest: PathBuf,
        mode: u32,
    },
    StartService {
        name: String,
    },
    StopService {
        name: String,
    },
    RestartService {
        name: String,
    },
    RunCommand {
        command: String,
        creates: Option<PathBuf>,
    },
}

/// A planned unit of change with its dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: ResourceId,
    pub kind: ActionKind,
    /// Resource ids whose actions must execute before this one.
    pub depends_on: Vec<ResourceId>,
}

impl Action {
    /// Human-readable description, used in plan output and dry-run reports.
    pub fn describe(&self) -> String {
        match &self.kind {
            ActionKind::InstallPackage { name, min_version } => match min_version {
                Some(v) => format!("Install package {name} (>= {v})"),
                None => format!("Install package {name}"),
            },
            ActionKind::CopyFile { source, dest, mode } => format!(
                "Copy {} -> {} (mode {:04o})",
                source.display(),
                dest.display(),
                mode
            ),
            ActionKind::StartService { name } => format!("Start service {name}"),
            ActionKind::StopService { name } => format!("Stop service {name}"),
            ActionKind::RestartService { name } => format!("Restart service {name}"),
            ActionKind::RunCommand { command, creates } => match creates {
                Some(path) => format!("Run '{command}' (unless {} exists)", path.display()),
                None => format!("Run '{command}'"),
            },
        }
    }
}

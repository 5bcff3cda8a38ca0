//! The desired-state manifest: the declarative input document.
//!
//! A manifest lists packages, files, services and bootstrap commands. It is
//! loaded once per run and never mutated; the plan builder compares it
//! against collected facts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::PlanError;

/// Stable identifier for a managed resource, e.g. `package:nginx`,
/// `service:mysql`, `file:/etc/nginx/nginx.conf`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    Package(String),
    Service(String),
    File(PathBuf),
    Command(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Package(name) => write!(f, "package:{name}"),
            ResourceId::Service(name) => write!(f, "service:{name}"),
            ResourceId::File(path) => write!(f, "file:{}", path.display()),
            ResourceId::Command(name) => write!(f, "command:{name}"),
        }
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <type>:<name>, got '{s}'"))?;
        if name.is_empty() {
            return Err(format!("empty resource name in '{s}'"));
        }
        match kind {
            "package" => Ok(ResourceId::Package(name.to_string())),
            "service" => Ok(ResourceId::Service(name.to_string())),
            "file" => Ok(ResourceId::File(PathBuf::from(name))),
            "command" => Ok(ResourceId::Command(name.to_string())),
            other => Err(format!("unknown resource type '{other}'")),
        }
    }
}

/// A package that must be installed, optionally at a minimum version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub min_version: Option<String>,
}

/// A file that must exist at `dest` with the content of `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSpec {
    pub source: String,
    pub dest: String,
    /// Octal mode string, e.g. "0644". Defaults to 0644.
    #[serde(default)]
    pub mode: Option<String>,
    /// Declares this file a prerequisite of the named service: the
    /// service's action will depend on this file's copy action.
    #[serde(default)]
    pub depends_on_service: Option<String>,
    /// Explicit prerequisites, as resource ids like "package:nginx".
    #[serde(default)]
    pub requires: Vec<String>,
}

/// A service with a desired running state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default = "default_running")]
    pub running: bool,
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_running() -> bool {
    true
}

/// A one-shot bootstrap command with an idempotence guard: when `creates`
/// exists on the host, the command is considered already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,
    pub run: String,
    #[serde(default)]
    pub creates: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

/// The full desired-state document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl PackageSpec {
    pub fn id(&self) -> ResourceId {
        ResourceId::Package(self.name.clone())
    }
}

impl FileSpec {
    pub fn id(&self) -> ResourceId {
        ResourceId::File(self.dest_path())
    }

    pub fn source_path(&self) -> PathBuf {
        expand(&self.source)
    }

    pub fn dest_path(&self) -> PathBuf {
        expand(&self.dest)
    }

    /// Parse the octal mode string, defaulting to 0644.
    pub fn mode_bits(&self) -> Result<u32, String> {
        match &self.mode {
            None => Ok(0o644),
            Some(s) => {
                let digits = s.trim().trim_start_matches("0o");
                u32::from_str_radix(digits, 8)
                    .map_err(|_| format!("invalid octal mode '{s}'"))
            }
        }
    }
}

impl ServiceSpec {
    pub fn id(&self) -> ResourceId {
        ResourceId::Service(self.name.clone())
    }
}

impl CommandSpec {
    pub fn id(&self) -> ResourceId {
        ResourceId::Command(self.name.clone())
    }

    pub fn creates_path(&self) -> Option<PathBuf> {
        self.creates.as_deref().map(expand)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Manifest {
    /// Load a manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path)?;
        let manifest: Manifest = toml::from_str(&raw)?;
        Ok(manifest)
    }

    /// All resource ids declared by the manifest, in manifest order.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids = Vec::new();
        ids.extend(self.packages.iter().map(PackageSpec::id));
        ids.extend(self.files.iter().map(FileSpec::id));
        ids.extend(self.services.iter().map(ServiceSpec::id));
        ids.extend(self.commands.iter().map(CommandSpec::id));
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
            && self.files.is_empty()
            && self.services.is_empty()
            && self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Manifest {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_parse_full_manifest() {
        let m = parse(
            r#"
            [[packages]]
            name = "nginx"
            min_version = "1.18"

            [[files]]
            source = "vhost.conf"
            dest = "/etc/nginx/sites-available/default"
            mode = "0644"
            depends_on_service = "nginx"

            [[services]]
            name = "nginx"

            [[commands]]
            name = "phpmyadmin-fetch"
            run = "fetch-phpmyadmin.sh"
            creates = "/usr/share/phpmyadmin/index.php"
            "#,
        );

        assert_eq!(m.packages.len(), 1);
        assert_eq!(m.packages[0].min_version.as_deref(), Some("1.18"));
        assert!(m.services[0].running, "running defaults to true");
        assert_eq!(
            m.files[0].depends_on_service.as_deref(),
            Some("nginx")
        );
        assert_eq!(m.commands[0].creates.as_deref(), Some("/usr/share/phpmyadmin/index.php"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let res: Result<Manifest, _> = toml::from_str(
            r#"
            [[packages]]
            name = "nginx"
            version = "1.18"
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_resource_id_roundtrip() {
        let id: ResourceId = "package:nginx".parse().unwrap();
        assert_eq!(id, ResourceId::Package("nginx".into()));
        assert_eq!(id.to_string(), "package:nginx");

        let id: ResourceId = "file:/etc/nginx/nginx.conf".parse().unwrap();
        assert_eq!(id.to_string(), "file:/etc/nginx/nginx.conf");

        assert!("nginx".parse::<ResourceId>().is_err());
        assert!("host:nginx".parse::<ResourceId>().is_err());
        assert!("service:".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_mode_bits() {
        let mut spec = FileSpec {
            source: "a".into(),
            dest: "b".into(),
            mode: None,
            depends_on_service: None,
            requires: vec![],
        };
        assert_eq!(spec.mode_bits().unwrap(), 0o644);

        spec.mode = Some("0755".into());
        assert_eq!(spec.mode_bits().unwrap(), 0o755);

        spec.mode = Some("0o600".into());
        assert_eq!(spec.mode_bits().unwrap(), 0o600);

        spec.mode = Some("rw-r--r--".into());
        assert!(spec.mode_bits().is_err());
    }

    #[test]
    fn test_resource_ids_in_manifest_order() {
        let m = parse(
            r#"
            [[packages]]
            name = "nginx"
            [[services]]
            name = "nginx"
            "#,
        );
        let ids = m.resource_ids();
        assert_eq!(ids[0].to_string(), "package:nginx");
        assert_eq!(ids[1].to_string(), "service:nginx");
    }
}

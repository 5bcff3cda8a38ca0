//! Fact collection: a read-only snapshot of host state.
//!
//! Facts are collected once per run, before planning, and discarded at run
//! end. A failed probe yields `Fact::Unknown` rather than an error: the
//! safe default is to act on a resource we could not observe.

use std::collections::BTreeMap;
use std::fmt;

use crate::host::HostSystem;
use crate::manifest::{Manifest, ResourceId};
use crate::version::Version;

/// An observed point-in-time property of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    PackageInstalled { version: Version },
    PackageAbsent,
    ServiceRunning,
    ServiceStopped,
    FileDigest { digest: String },
    FileAbsent,
    /// The probe itself failed. Not the same as absent.
    Unknown { reason: String },
}

impl Fact {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Fact::Unknown { .. })
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::PackageInstalled { version } => write!(f, "installed ({version})"),
            Fact::PackageAbsent => write!(f, "not installed"),
            Fact::ServiceRunning => write!(f, "running"),
            Fact::ServiceStopped => write!(f, "stopped"),
            Fact::FileDigest { digest } => write!(f, "present ({})", &digest[..digest.len().min(12)]),
            Fact::FileAbsent => write!(f, "absent"),
            Fact::Unknown { reason } => write!(f, "unknown ({reason})"),
        }
    }
}

/// Facts keyed by resource id. BTreeMap keeps iteration deterministic.
pub type Facts = BTreeMap<ResourceId, Fact>;

/// Collect facts for every resource the manifest cares about: packages,
/// services, file destinations and sources, and command guard paths.
/// Never fails and never mutates the host.
pub fn collect(host: &dyn HostSystem, manifest: &Manifest) -> Facts {
    let mut facts = Facts::new();

    for pkg in &manifest.packages {
        let fact = match host.package_version(&pkg.name) {
            Ok(Some(version)) => Fact::PackageInstalled { version },
            Ok(None) => Fact::PackageAbsent,
            Err(e) => Fact::Unknown {
                reason: e.to_string(),
            },
        };
        facts.insert(pkg.id(), fact);
    }

    for file in &manifest.files {
        facts.insert(
            ResourceId::File(file.source_path()),
            file_fact(host, &file.source_path()),
        );
        facts.insert(file.id(), file_fact(host, &file.dest_path()));
    }

    for svc in &manifest.services {
        let fact = match host.service_running(&svc.name) {
            Ok(true) => Fact::ServiceRunning,
            Ok(false) => Fact::ServiceStopped,
            Err(e) => Fact::Unknown {
                reason: e.to_string(),
            },
        };
        facts.insert(svc.id(), fact);
    }

    for cmd in &manifest.commands {
        if let Some(guard) = cmd.creates_path() {
            facts
                .entry(ResourceId::File(guard.clone()))
                .or_insert_with(|| file_fact(host, &guard));
        }
    }

    facts
}

fn file_fact(host: &dyn HostSystem, path: &std::path::Path) -> Fact {
    match host.file_digest(path) {
        Ok(Some(digest)) => Fact::FileDigest { digest },
        Ok(None) => Fact::FileAbsent,
        Err(e) => Fact::Unknown {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::host::ProbeError;
    use std::path::Path;
    use std::time::Duration;

    /// Probe-only mock: package db is down, one file present.
    struct FlakyHost;

    impl HostSystem for FlakyHost {
        fn package_version(&self, _name: &str) -> Result<Option<Version>, ProbeError> {
            Err(ProbeError("dpkg database locked".into()))
        }

        fn service_running(&self, name: &str) -> Result<bool, ProbeError> {
            Ok(name == "mysql")
        }

        fn file_digest(&self, path: &Path) -> Result<Option<String>, ProbeError> {
            if path.ends_with("nginx.conf") {
                Ok(Some("abc123".into()))
            } else {
                Ok(None)
            }
        }

        fn install_package(&self, _: &str, _: Duration) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
        fn copy_file(&self, _: &Path, _: &Path, _: u32) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
        fn start_service(&self, _: &str, _: Duration) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
        fn stop_service(&self, _: &str, _: Duration) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
        fn restart_service(&self, _: &str, _: Duration) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
        fn run_command(&self, _: &str, _: Duration) -> Result<(), ExecutionError> {
            unreachable!("collection must not mutate")
        }
    }

    fn manifest() -> Manifest {
        toml::from_str(
            r#"
            [[packages]]
            name = "nginx"

            [[files]]
            source = "/srv/templates/nginx.conf"
            dest = "/etc/nginx/nginx.conf"

            [[services]]
            name = "mysql"

            [[services]]
            name = "redis"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_probe_failure_becomes_unknown_not_absent() {
        let facts = collect(&FlakyHost, &manifest());
        let fact = &facts[&ResourceId::Package("nginx".into())];
        assert!(fact.is_unknown());
        assert_ne!(*fact, Fact::PackageAbsent);
    }

    #[test]
    fn test_service_and_file_facts() {
        let facts = collect(&FlakyHost, &manifest());
        assert_eq!(facts[&ResourceId::Service("mysql".into())], Fact::ServiceRunning);
        assert_eq!(facts[&ResourceId::Service("redis".into())], Fact::ServiceStopped);
        assert_eq!(
            facts[&ResourceId::File("/srv/templates/nginx.conf".into())],
            Fact::FileDigest { digest: "abc123".into() }
        );
        assert_eq!(
            facts[&ResourceId::File("/etc/nginx/nginx.conf".into())],
            Fact::FileDigest { digest: "abc123".into() }
        );
    }

    #[test]
    fn test_collection_is_deterministic() {
        let a: Vec<String> = collect(&FlakyHost, &manifest())
            .keys()
            .map(ToString::to_string)
            .collect();
        let b: Vec<String> = collect(&FlakyHost, &manifest())
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(a, b);
    }
}

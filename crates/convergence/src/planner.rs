//! Plan builder: compares the manifest against collected facts and produces
//! an ordered, dependency-respecting sequence of actions.
//!
//! Building is pure (desired state + facts in, plan out) and happens in full
//! before anything executes, so a plan can be printed or dry-run before
//! committing. Identical inputs produce identical plans.

use std::collections::{HashMap, HashSet};

use crate::action::{Action, ActionKind};
use crate::error::PlanError;
use crate::facts::{Fact, Facts};
use crate::manifest::{Manifest, ResourceId};
use crate::version::Version;

/// A resource already in its desired state; carried in the plan so the run
/// report can show it as skipped with a reason.
#[derive(Debug, Clone)]
pub struct Satisfied {
    pub id: ResourceId,
    pub reason: String,
}

/// An ordered action sequence. Invariant: no action appears before one of
/// its dependencies.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub satisfied: Vec<Satisfied>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Build a plan from desired state and facts.
pub fn build(manifest: &Manifest, facts: &Facts) -> Result<Plan, PlanError> {
    validate(manifest)?;

    let mut actions: Vec<Action> = Vec::new();
    let mut satisfied: Vec<Satisfied> = Vec::new();

    plan_packages(manifest, facts, &mut actions, &mut satisfied);
    plan_files(manifest, facts, &mut actions, &mut satisfied)?;
    plan_services(manifest, facts, &mut actions, &mut satisfied)?;
    plan_commands(manifest, facts, &mut actions, &mut satisfied)?;

    // Edges pointing at resources that turned out to be satisfied have
    // nothing to order against; drop them now that the action set is known.
    let scheduled: HashSet<ResourceId> = actions.iter().map(|a| a.id.clone()).collect();
    for action in &mut actions {
        let mut seen = HashSet::new();
        action
            .depends_on
            .retain(|dep| scheduled.contains(dep) && seen.insert(dep.clone()));
    }

    let actions = toposort(actions)?;
    Ok(Plan { actions, satisfied })
}

fn plan_packages(
    manifest: &Manifest,
    facts: &Facts,
    actions: &mut Vec<Action>,
    satisfied: &mut Vec<Satisfied>,
) {
    for pkg in &manifest.packages {
        let id = pkg.id();
        let min_version = pkg.min_version.as_deref().map(Version::parse);

        if let Some(Fact::PackageInstalled { version }) = facts.get(&id) {
            let meets_min = min_version.as_ref().is_none_or(|min| version >= min);
            if meets_min {
                satisfied.push(Satisfied {
                    id,
                    reason: "satisfied".into(),
                });
                continue;
            }
        }
        // Absent, outdated, or unknown: act.
        actions.push(Action {
            id,
            kind: ActionKind::InstallPackage {
                name: pkg.name.clone(),
                min_version,
            },
            depends_on: Vec::new(),
        });
    }
}

fn plan_files(
    manifest: &Manifest,
    facts: &Facts,
    actions: &mut Vec<Action>,
    satisfied: &mut Vec<Satisfied>,
) -> Result<(), PlanError> {
    for file in &manifest.files {
        let id = file.id();
        let source_id = ResourceId::File(file.source_path());

        if matches!(facts.get(&source_id), Some(Fact::FileAbsent)) {
            return Err(PlanError::InvalidSpec {
                id: id.to_string(),
                reason: format!("source file {} does not exist", file.source_path().display()),
            });
        }

        let in_sync = matches!(
            (facts.get(&source_id), facts.get(&id)),
            (
                Some(Fact::FileDigest { digest: src }),
                Some(Fact::FileDigest { digest: dest })
            ) if src == dest
        );
        if in_sync {
            satisfied.push(Satisfied {
                id,
                reason: "satisfied".into(),
            });
            continue;
        }

        let mode = file
            .mode_bits()
            .map_err(|reason| PlanError::InvalidSpec {
                id: id.to_string(),
                reason,
            })?;
        actions.push(Action {
            id,
            kind: ActionKind::CopyFile {
                source: file.source_path(),
                dest: file.dest_path(),
                mode,
            },
            depends_on: parse_requires(&file.requires),
        });
    }
    Ok(())
}

fn plan_services(
    manifest: &Manifest,
    facts: &Facts,
    actions: &mut Vec<Action>,
    satisfied: &mut Vec<Satisfied>,
) -> Result<(), PlanError> {
    let file_actions: HashSet<ResourceId> = actions
        .iter()
        .filter(|a| matches!(a.kind, ActionKind::CopyFile { .. }))
        .map(|a| a.id.clone())
        .collect();
    let package_actions: HashSet<ResourceId> = actions
        .iter()
        .filter(|a| matches!(a.kind, ActionKind::InstallPackage { .. }))
        .map(|a| a.id.clone())
        .collect();

    for svc in &manifest.services {
        let id = svc.id();
        let observed = match facts.get(&id) {
            Some(Fact::ServiceRunning) => Some(true),
            Some(Fact::ServiceStopped) => Some(false),
            _ => None,
        };

        // Files declared as prerequisites of this service that are being
        // rewritten this run.
        let changed_prereqs: Vec<ResourceId> = manifest
            .files
            .iter()
            .filter(|f| f.depends_on_service.as_deref() == Some(svc.name.as_str()))
            .map(|f| f.id())
            .filter(|fid| file_actions.contains(fid))
            .collect();

        let kind = match (observed, svc.running) {
            (Some(true), true) if changed_prereqs.is_empty() => {
                satisfied.push(Satisfied {
                    id,
                    reason: "satisfied".into(),
                });
                continue;
            }
            // Running as desired, but a prerequisite config changed.
            (Some(true), true) => ActionKind::RestartService {
                name: svc.name.clone(),
            },
            (Some(false), true) | (None, true) => ActionKind::StartService {
                name: svc.name.clone(),
            },
            (Some(false), false) => {
                satisfied.push(Satisfied {
                    id,
                    reason: "satisfied".into(),
                });
                continue;
            }
            (Some(true), false) | (None, false) => ActionKind::StopService {
                name: svc.name.clone(),
            },
        };

        let mut depends_on = changed_prereqs;
        depends_on.extend(parse_requires(&svc.requires));
        // A service implicitly waits for the install of its same-named
        // package when that install is part of this run.
        let pkg_id = ResourceId::Package(svc.name.clone());
        if package_actions.contains(&pkg_id) {
            depends_on.push(pkg_id);
        }

        actions.push(Action {
            id,
            kind,
            depends_on,
        });
    }
    Ok(())
}

fn plan_commands(
    manifest: &Manifest,
    facts: &Facts,
    actions: &mut Vec<Action>,
    satisfied: &mut Vec<Satisfied>,
) -> Result<(), PlanError> {
    for cmd in &manifest.commands {
        let id = cmd.id();

        if let Some(guard) = cmd.creates_path() {
            if matches!(
                facts.get(&ResourceId::File(guard)),
                Some(Fact::FileDigest { .. })
            ) {
                satisfied.push(Satisfied {
                    id,
                    reason: "guard present".into(),
                });
                continue;
            }
        }

        actions.push(Action {
            id,
            kind: ActionKind::RunCommand {
                command: cmd.run.clone(),
                creates: cmd.creates_path(),
            },
            depends_on: parse_requires(&cmd.requires),
        });
    }
    Ok(())
}

/// Parse pre-validated `requires` entries.
fn parse_requires(requires: &[String]) -> Vec<ResourceId> {
    requires
        .iter()
        .map(|r| r.parse().expect("validated"))
        .collect()
}

/// Stable topological sort: among ready actions, the one declared earliest
/// in the manifest goes first. Leftover nodes mean a cycle.
fn toposort(actions: Vec<Action>) -> Result<Vec<Action>, PlanError> {
    let n = actions.len();
    let index: HashMap<ResourceId, usize> = actions
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.clone(), i))
        .collect();

    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, action) in actions.iter().enumerate() {
        for dep in &action.depends_on {
            let d = index[dep];
            dependents[d].push(i);
            indegree[i] += 1;
        }
    }

    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let next = (0..n).find(|&i| !placed[i] && indegree[i] == 0);
        let Some(i) = next else {
            let members = actions
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, a)| a.id.to_string())
                .collect();
            return Err(PlanError::CyclicDependency { members });
        };
        placed[i] = true;
        for &dep in &dependents[i] {
            indegree[dep] -= 1;
        }
        order.push(i);
    }

    let mut slots: Vec<Option<Action>> = actions.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .map(|i| slots[i].take().expect("each index placed once"))
        .collect())
}

/// Semantic validation of the manifest. Structural errors (bad TOML) are
/// caught at load time; this checks the things TOML cannot express.
fn validate(manifest: &Manifest) -> Result<(), PlanError> {
    let mut declared: HashSet<ResourceId> = HashSet::new();
    for id in manifest.resource_ids() {
        if !declared.insert(id.clone()) {
            return Err(PlanError::InvalidSpec {
                id: id.to_string(),
                reason: "declared more than once".into(),
            });
        }
    }

    for pkg in &manifest.packages {
        if pkg.name.trim().is_empty() {
            return Err(PlanError::InvalidSpec {
                id: "package:".into(),
                reason: "empty package name".into(),
            });
        }
    }

    for file in &manifest.files {
        let id = file.id().to_string();
        if file.source.trim().is_empty() || file.dest.trim().is_empty() {
            return Err(PlanError::InvalidSpec {
                id,
                reason: "source and dest must be non-empty".into(),
            });
        }
        file.mode_bits().map_err(|reason| PlanError::InvalidSpec {
            id: id.clone(),
            reason,
        })?;
        if let Some(svc) = &file.depends_on_service {
            let target = ResourceId::Service(svc.clone());
            if !declared.contains(&target) {
                return Err(PlanError::UnknownDependency {
                    from: id.clone(),
                    target: target.to_string(),
                });
            }
        }
        check_requires(&id, &file.requires, &declared)?;
    }

    for svc in &manifest.services {
        if svc.name.trim().is_empty() {
            return Err(PlanError::InvalidSpec {
                id: "service:".into(),
                reason: "empty service name".into(),
            });
        }
        check_requires(&svc.id().to_string(), &svc.requires, &declared)?;
    }

    for cmd in &manifest.commands {
        let id = cmd.id().to_string();
        if cmd.name.trim().is_empty() || cmd.run.trim().is_empty() {
            return Err(PlanError::InvalidSpec {
                id,
                reason: "command name and run must be non-empty".into(),
            });
        }
        check_requires(&id, &cmd.requires, &declared)?;
    }

    detect_declared_cycles(manifest)
}

/// Cycle detection over the declared dependency graph. Runs on the
/// manifest alone: whether a manifest is cyclic cannot depend on which
/// resources happen to be satisfied this run.
fn detect_declared_cycles(manifest: &Manifest) -> Result<(), PlanError> {
    let ids = manifest.resource_ids();
    let index: HashMap<ResourceId, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect();

    // (dependent, dependency) pairs over declared resources.
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let add = |edges: &mut Vec<(usize, usize)>, from: &ResourceId, to: &ResourceId| {
        if let (Some(&f), Some(&t)) = (index.get(from), index.get(to)) {
            edges.push((f, t));
        }
    };

    for file in &manifest.files {
        let id = file.id();
        for dep in parse_requires(&file.requires) {
            add(&mut edges, &id, &dep);
        }
        // The service waits for its prerequisite file.
        if let Some(svc) = &file.depends_on_service {
            add(&mut edges, &ResourceId::Service(svc.clone()), &id);
        }
    }
    for svc in &manifest.services {
        let id = svc.id();
        for dep in parse_requires(&svc.requires) {
            add(&mut edges, &id, &dep);
        }
        add(&mut edges, &id, &ResourceId::Package(svc.name.clone()));
    }
    for cmd in &manifest.commands {
        let id = cmd.id();
        for dep in parse_requires(&cmd.requires) {
            add(&mut edges, &id, &dep);
        }
    }

    let n = ids.len();
    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(from, to) in &edges {
        dependents[to].push(from);
        indegree[from] += 1;
    }

    let mut placed = vec![false; n];
    for _ in 0..n {
        let Some(i) = (0..n).find(|&i| !placed[i] && indegree[i] == 0) else {
            let members = ids
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, id)| id.to_string())
                .collect();
            return Err(PlanError::CyclicDependency { members });
        };
        placed[i] = true;
        for &dep in &dependents[i] {
            indegree[dep] -= 1;
        }
    }

    Ok(())
}

fn check_requires(
    from: &str,
    requires: &[String],
    declared: &HashSet<ResourceId>,
) -> Result<(), PlanError> {
    for raw in requires {
        let target: ResourceId = raw.parse().map_err(|reason| PlanError::InvalidSpec {
            id: from.to_string(),
            reason,
        })?;
        if !declared.contains(&target) {
            return Err(PlanError::UnknownDependency {
                from: from.to_string(),
                target: target.to_string(),
            });
        }
    }
    Ok(())
}

//! Sequential plan executor.
//!
//! Actions run strictly in plan order; host state (package cache, service
//! manager, config directories) is process-wide mutable, so there is no
//! parallel path. Each action re-checks current state before mutating and
//! succeeds as a no-op when already satisfied. Network-class failures are
//! retried with a fixed backoff; everything else fails the action outright.

use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::action::{Action, ActionKind};
use crate::error::ExecutionError;
use crate::host::HostSystem;
use crate::planner::Plan;
use crate::report::{ActionOutcome, Outcome, RunResult};

/// Bounded retry for transient failures: fixed delay, no exponent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Options governing a single execution run.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Record outcomes without mutating the host.
    pub dry_run: bool,
    /// Keep going after a failed action instead of aborting the rest.
    pub continue_on_error: bool,
    /// Per-action timeout for blocking operations.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            continue_on_error: false,
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

/// Cooperative cancellation, honored between actions only: an in-flight
/// action runs to completion or failure before the token is consulted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callback for execution.
pub trait ProgressCallback {
    fn on_action_start(&mut self, action: &Action);
    fn on_action_done(&mut self, action: &Action, outcome: &Outcome);
}

/// No-op progress callback.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_action_start(&mut self, _action: &Action) {}
    fn on_action_done(&mut self, _action: &Action, _outcome: &Outcome) {}
}

/// Execute a plan. Resources the builder already found satisfied are
/// reported as skipped; actions execute in order until done, aborted, or
/// cancelled.
pub fn execute<P: ProgressCallback>(
    plan: &Plan,
    host: &dyn HostSystem,
    opts: &ExecuteOptions,
    cancel: &CancelToken,
    progress: &mut P,
) -> RunResult {
    let started = Instant::now();
    let mut outcomes: Vec<ActionOutcome> = plan
        .satisfied
        .iter()
        .map(|s| ActionOutcome {
            id: s.id.to_string(),
            description: format!("{} already in desired state", s.id),
            outcome: Outcome::Skipped {
                reason: s.reason.clone(),
            },
        })
        .collect();

    let mut aborted = false;
    for action in &plan.actions {
        let outcome = if aborted {
            Outcome::Skipped {
                reason: "aborted by prior failure".into(),
            }
        } else if cancel.is_cancelled() {
            Outcome::Skipped {
                reason: "cancelled".into(),
            }
        } else if opts.dry_run {
            progress.on_action_start(action);
            Outcome::Applied
        } else {
            progress.on_action_start(action);
            match apply_with_retry(action, host, opts) {
                Ok(()) => Outcome::Applied,
                Err(e) => {
                    if !opts.continue_on_error {
                        aborted = true;
                    }
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        progress.on_action_done(action, &outcome);
        outcomes.push(ActionOutcome {
            id: action.id.to_string(),
            description: action.describe(),
            outcome,
        });
    }

    RunResult {
        outcomes,
        duration: started.elapsed(),
        dry_run: opts.dry_run,
    }
}

fn apply_with_retry(
    action: &Action,
    host: &dyn HostSystem,
    opts: &ExecuteOptions,
) -> Result<(), ExecutionError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match apply(action, host, opts.timeout) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < opts.retry.max_attempts => {
                warn!(
                    "{}: attempt {attempt}/{} failed ({e}), retrying in {:?}",
                    action.id, opts.retry.max_attempts, opts.retry.delay
                );
                std::thread::sleep(opts.retry.delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Apply one action, no-opping when the host is already in the desired
/// state. Pre-check probe failures are not fatal: when we cannot observe,
/// we act.
fn apply(action: &Action, host: &dyn HostSystem, timeout: Duration) -> Result<(), ExecutionError> {
    match &action.kind {
        ActionKind::InstallPackage { name, min_version } => {
            if let Ok(Some(installed)) = host.package_version(name) {
                let meets_min = min_version.as_ref().is_none_or(|min| &installed >= min);
                if meets_min {
                    debug!("{}: already installed ({installed})", action.id);
                    return Ok(());
                }
            }
            host.install_package(name, timeout)
        }
        ActionKind::CopyFile { source, dest, mode } => {
            if let (Ok(Some(src)), Ok(Some(dst))) =
                (host.file_digest(source), host.file_digest(dest))
            {
                if src == dst {
                    debug!("{}: content already matches", action.id);
                    return Ok(());
                }
            }
            host.copy_file(source, dest, *mode)
        }
        ActionKind::StartService { name } => {
            if let Ok(true) = host.service_running(name) {
                debug!("{}: already running", action.id);
                return Ok(());
            }
            host.start_service(name, timeout)
        }
        ActionKind::StopService { name } => {
            if let Ok(false) = host.service_running(name) {
                debug!("{}: already stopped", action.id);
                return Ok(());
            }
            host.stop_service(name, timeout)
        }
        ActionKind::RestartService { name } => host.restart_service(name, timeout),
        ActionKind::RunCommand { command, creates } => {
            if let Some(guard) = creates {
                if let Ok(Some(_)) = host.file_digest(guard) {
                    debug!("{}: guard {} present", action.id, guard.display());
                    return Ok(());
                }
            }
            host.run_command(command, timeout)
        }
    }
}

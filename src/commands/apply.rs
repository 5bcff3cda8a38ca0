//! `groundwork apply` - converge the host to the manifest.

use anyhow::{Context, Result};
use chrono::Utc;
use convergence::{
    execute, exit_code, facts, planner, Action, CancelToken, ExecuteOptions, Manifest, Outcome,
    ProgressCallback, RunReport,
};
use hostkit::LiveHost;
use log::info;
use std::time::Duration;

use crate::cli::ApplyArgs;
use crate::{lock, ui};

/// How long a second invocation waits for the run lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_action_start(&mut self, action: &Action) {
        info!("applying {}: {}", action.id, action.describe());
    }

    fn on_action_done(&mut self, action: &Action, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => info!("{}: applied", action.id),
            Outcome::Skipped { reason } => info!("{}: skipped ({reason})", action.id),
            Outcome::Failed { error } => info!("{}: failed ({error})", action.id),
        }
    }
}

pub fn run(manifest_path: &std::path::Path, args: &ApplyArgs) -> Result<u8> {
    let lock_path = args
        .lock_file
        .clone()
        .unwrap_or_else(lock::default_path);
    let _lock = lock::acquire(&lock_path, LOCK_TIMEOUT)?;

    let started_at = Utc::now();
    let manifest = Manifest::load(manifest_path)?;
    let host = LiveHost::new();

    let facts = facts::collect(&host, &manifest);
    let plan = planner::build(&manifest, &facts)?;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        continue_on_error: args.continue_on_error,
        timeout: Duration::from_secs(args.timeout),
        ..Default::default()
    };

    // Ctrl-C flips the token; the executor finishes the in-flight action
    // and skips the rest as cancelled.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            ui::warn("interrupt received - finishing current action");
            cancel.cancel();
        })
        .context("failed to install interrupt handler")?;
    }

    let result = execute(&plan, &host, &opts, &cancel, &mut LogProgress);

    ui::print_result(&result);

    if let Some(path) = &args.log_file {
        let report = RunReport::new(&result, started_at);
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        ui::info(&format!("Report written to {}", path.display()));
    }

    Ok(exit_code(&result, args.continue_on_error))
}

//! Run results and the structured report.
//!
//! The run result is the only entity that outlives a run: it is printed for
//! humans, optionally persisted as JSON, and mapped to the process exit
//! status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Per-action outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Applied,
    Skipped { reason: String },
    Failed { error: String },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One line of the run: which resource, what would be / was done, how it
/// ended.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub id: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate result of executing a plan.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub outcomes: Vec<ActionOutcome>,
    pub duration: Duration,
    pub dry_run: bool,
}

impl RunResult {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| o.is_failed())
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Machine-readable summary written with `--log-file`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub dry_run: bool,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u128,
    pub outcomes: Vec<ActionOutcome>,
}

impl RunReport {
    pub fn new(result: &RunResult, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at: started_at.to_rfc3339(),
            dry_run: result.dry_run,
            applied: result.applied(),
            skipped: result.skipped(),
            failed: result.failed(),
            duration_ms: result.duration.as_millis(),
            outcomes: result.outcomes.clone(),
        }
    }
}

/// Exit statuses. Values distinguish where a run went wrong.
pub const EXIT_OK: u8 = 0;
pub const EXIT_PLAN_FAILURE: u8 = 2;
pub const EXIT_EXECUTION_FAILURE: u8 = 3;
pub const EXIT_PARTIAL_FAILURE: u8 = 4;

/// Map a run result to the process exit status.
pub fn exit_code(result: &RunResult, continue_on_error: bool) -> u8 {
    if result.is_success() {
        EXIT_OK
    } else if continue_on_error {
        EXIT_PARTIAL_FAILURE
    } else {
        EXIT_EXECUTION_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcomes: Vec<Outcome>) -> RunResult {
        RunResult {
            outcomes: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| ActionOutcome {
                    id: format!("package:p{i}"),
                    description: format!("Install package p{i}"),
                    outcome,
                })
                .collect(),
            duration: Duration::from_millis(12),
            dry_run: false,
        }
    }

    #[test]
    fn test_counts_and_success() {
        let r = result(vec![
            Outcome::Applied,
            Outcome::Skipped {
                reason: "satisfied".into(),
            },
            Outcome::Failed {
                error: "network unavailable".into(),
            },
        ]);
        assert_eq!(r.applied(), 1);
        assert_eq!(r.skipped(), 1);
        assert_eq!(r.failed(), 1);
        assert!(!r.is_success());
    }

    #[test]
    fn test_exit_codes() {
        let ok = result(vec![Outcome::Applied]);
        assert_eq!(exit_code(&ok, false), EXIT_OK);
        assert_eq!(exit_code(&ok, true), EXIT_OK);

        let bad = result(vec![Outcome::Failed {
            error: "boom".into(),
        }]);
        assert_eq!(exit_code(&bad, false), EXIT_EXECUTION_FAILURE);
        assert_eq!(exit_code(&bad, true), EXIT_PARTIAL_FAILURE);
    }

    #[test]
    fn test_report_json_shape() {
        let r = result(vec![
            Outcome::Applied,
            Outcome::Skipped {
                reason: "satisfied".into(),
            },
        ]);
        let report = RunReport::new(&r, Utc::now());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["applied"], 1);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["outcomes"][0]["status"], "applied");
        assert_eq!(json["outcomes"][1]["reason"], "satisfied");
    }
}

//! # Convergence
//!
//! Core engine for declarative host provisioning: declare the desired
//! state of packages, files, services, and guarded commands; observe the
//! current state; compute the minimal ordered plan; execute it.
//!
//! ## Pipeline
//!
//! - **Manifest**: the desired state, parsed from TOML
//! - **Facts**: read-only observations of the host, one per resource
//! - **Plan**: the ordered set of actions needed to converge, computed in
//!   full before anything runs
//! - **Execution**: sequential, idempotent application with bounded retry
//!   for transient network failures
//!
//! ## Host abstraction
//!
//! All probing and mutation goes through the [`HostSystem`] trait, so the
//! engine can be driven against a real machine or an in-memory double in
//! tests.
//!
//! ## Example
//!
//! ```ignore
//! use convergence::{execute, facts, planner, CancelToken, ExecuteOptions, Manifest, NoProgress};
//!
//! let manifest = Manifest::load("groundwork.toml".as_ref())?;
//! let facts = facts::collect(&host, &manifest);
//! let plan = planner::build(&manifest, &facts)?;
//! let result = execute(
//!     &plan,
//!     &host,
//!     &ExecuteOptions::default(),
//!     &CancelToken::new(),
//!     &mut NoProgress,
//! );
//! ```

pub mod action;
pub mod error;
pub mod executor;
pub mod facts;
pub mod host;
pub mod manifest;
pub mod planner;
pub mod report;
pub mod version;

// Re-export main types at crate root
pub use action::{Action, ActionKind};
pub use error::{ExecutionError, PlanError};
pub use executor::{
    execute, CancelToken, ExecuteOptions, NoProgress, ProgressCallback, RetryPolicy,
};
pub use facts::{collect, Fact, Facts};
pub use host::{HostSystem, ProbeError};
pub use manifest::{CommandSpec, FileSpec, Manifest, PackageSpec, ResourceId, ServiceSpec};
pub use planner::{build, Plan, Satisfied};
pub use report::{
    exit_code, ActionOutcome, Outcome, RunReport, RunResult, EXIT_EXECUTION_FAILURE, EXIT_OK,
    EXIT_PARTIAL_FAILURE, EXIT_PLAN_FAILURE,
};
pub use version::Version;

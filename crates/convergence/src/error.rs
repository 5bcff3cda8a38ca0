//! Error taxonomy for planning and execution.
//!
//! Plan errors abort the run before any mutation. Execution errors are
//! contained per action; only network failures are considered transient
//! and worth retrying.

use thiserror::Error;

/// Errors raised while building a plan. All of these are fatal and occur
/// before anything on the host has been touched.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The dependency graph contains a cycle.
    #[error("cyclic dependency between: {}", members.join(" -> "))]
    CyclicDependency {
        /// Resource ids participating in the cycle, in manifest order.
        members: Vec<String>,
    },

    /// A manifest entry is malformed.
    #[error("invalid spec for {id}: {reason}")]
    InvalidSpec { id: String, reason: String },

    /// A declared dependency names a resource not present in the manifest.
    #[error("{from} requires unknown resource {target}")]
    UnknownDependency { from: String, target: String },

    /// The manifest file could not be read.
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest file is not valid TOML.
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while executing a single action.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Network-dependent step failed (download, resolver, fetch).
    /// The only retryable class.
    #[error("network unavailable: {message}")]
    NetworkUnavailable { message: String },

    /// The action did not finish within the caller-supplied timeout.
    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The underlying tool refused the operation. Not retried.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Anything else; carries the underlying tool's exit code and stderr
    /// verbatim for diagnostics.
    #[error("{message}{}: {stderr}", .code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    Unknown {
        message: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ExecutionError {
    /// Whether this failure is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable { .. })
    }

    /// Map an IO error into the execution taxonomy.
    pub fn from_io(message: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                message: format!("{message}: {err}"),
            }
        } else {
            Self::Unknown {
                message: message.to_string(),
                code: None,
                stderr: err.to_string(),
            }
        }
    }
}

//! Per-task and dispatch-fatal error types.
//!
//! These are two different tiers. A [`TaskError`] is data: it's stored in the result map next
//! to successful outputs, and never stops the dispatcher from collecting the rest of the graph.
//! A [`DispatchError`] is fatal to the whole run (a malformed graph, a thread that couldn't be
//! spawned) and is wrapped in [`dagrunner_core::PayloadError`] the same way `ConfigError` is.

use dagrunner_core::{ConfigError, PayloadError, TaskFailure};
use thiserror::Error;

/// Why a single task did not produce a value.
#[derive(Debug, Clone)]
pub enum TaskError {
    /// The task itself panicked or raised an explicit failure value.
    Failure(TaskFailure),
    /// A dependency this task needed never produced a value (it failed, timed out, or one of
    /// *its* dependencies did).
    DependencyError(dagrunner_core::Id),
    /// Waiting for a cross-worker dependency's value exceeded the per-read timeout.
    Timeout,
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::Failure(TaskFailure::Panicked(msg)) => write!(f, "panicked: {msg}"),
            TaskError::Failure(TaskFailure::Raised(v)) => write!(f, "raised: {v}"),
            TaskError::DependencyError(id) => write!(f, "dependency {id} did not produce a value"),
            TaskError::Timeout => write!(f, "timed out waiting for a dependency"),
        }
    }
}

pub type TaskOutcome = Result<dagrunner_core::Value, TaskError>;

/// A fatal error raised while dispatching a schedule.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn worker thread pool: {0}")]
    Spawn(String),
    #[error("collection timed out before every worker reported its results")]
    CollectionTimeout,
}

pub type DispatchResult<T> = Result<T, PayloadError<DispatchError>>;

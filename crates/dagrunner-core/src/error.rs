//! Fatal, scheduling-time configuration errors, payloaded with a backtrace.

use crate::id::Id;
use std::backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// A fatal error raised while building a graph or computing a schedule. Never produced per-task —
/// see `dagrunner_exec::error::DispatchError` and the `Err` result sentinel for those.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cycle detected among tasks: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "))]
    Cycle(Vec<Id>),
    #[error("task {consumer} depends on unknown task {producer}")]
    DanglingDependency { consumer: Id, producer: Id },
    #[error("task {0} has a malformed argument specification")]
    MalformedArgShape(Id),
    #[error("task {id} has a non-finite cost: {cost}")]
    NonFiniteCost { id: Id, cost: f64 },
    #[error("worker_count must be >= 1")]
    ZeroWorkers,
}

/// A [`ConfigError`] with a captured backtrace, following this codebase's `PayloadError<E>` pattern.
pub struct PayloadError<E> {
    kind: E,
    bt: Backtrace,
}

impl<E> PayloadError<E> {
    #[inline]
    pub fn new<E2: Into<E>>(error: E2) -> Self {
        Self {
            kind: error.into(),
            bt: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> &E {
        &self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.bt
    }

    pub fn into_inner(self) -> E {
        self.kind
    }
}

impl<E: Debug> Debug for PayloadError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.kind, f)
    }
}

impl<E: Display> Display for PayloadError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.kind, f)
    }
}

impl<E: std::error::Error> std::error::Error for PayloadError<E> {}

impl<E> From<E> for PayloadError<E> {
    fn from(e: E) -> Self {
        Self::new(e)
    }
}

pub type ConfigResult<T> = Result<T, PayloadError<ConfigError>>;

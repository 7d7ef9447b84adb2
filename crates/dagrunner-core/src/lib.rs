//! Graph model, duplicate elimination, and HEFT scheduling for the dagrunner task runtime.
//!
//! This crate has no notion of threads, processes, or channels — it is the pure, synchronous
//! half of the system: build a [`graph::Graph`], optionally [`dedup::remove_duplicates`] it, then
//! [`heft::schedule`] it across a worker count. `dagrunner-exec` is the crate that actually runs
//! the resulting [`heft::Schedule`].

pub mod cost;
pub mod dedup;
pub mod dot;
pub mod error;
pub mod graph;
pub mod heft;
pub mod id;
pub mod prefix;
pub mod task;

pub use error::{ConfigError, ConfigResult, PayloadError};
pub use graph::Graph;
pub use heft::{schedule, Schedule, WorkItem};
pub use id::Id;
pub use task::{
    Arg, ArgSpec, Dependency, ExtractKey, ExtractPath, ResolvedArgs, Task, TaskFailure, TaskFn,
    TaskFnResult, Value,
};

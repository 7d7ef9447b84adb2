//! Worker-pool dispatcher for `dagrunner-core` schedules.
//!
//! [`execute`] is the single entry point: deduplicate, schedule (HEFT), dispatch across a
//! thread-per-worker pool, and merge the results back into the caller's original id space.

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod result;
pub mod routing;
pub mod worker;

use dagrunner_core::{dedup, heft, Graph, PayloadError};
use error::{DispatchError, DispatchResult};
use result::ExecutionResult;
use std::collections::HashSet;
use std::time::Duration;

/// Run every task in `graph` to completion across `worker_count` worker threads.
///
/// `output_tasks`, if given, restricts which of the caller's original ids are reported in the
/// returned [`ExecutionResult`] — every dependency chain still runs regardless of this filter.
/// `costs`, if set, populates [`ExecutionResult::costs`] with each reported task's measured
/// compute time and cross-worker communication latencies.
pub fn execute(
    graph: &Graph,
    worker_count: usize,
    output_tasks: Option<&HashSet<dagrunner_core::Id>>,
    read_timeout: Duration,
    collection_timeout: Option<Duration>,
    costs: bool,
) -> DispatchResult<ExecutionResult> {
    let (deduped, sigma) = dedup::remove_duplicates(graph)
        .map_err(|e| PayloadError::new(DispatchError::Config(e.into_inner())))?;

    let schedule = heft::schedule(&deduped, worker_count)
        .map_err(|e| PayloadError::new(DispatchError::Config(e.into_inner())))?;

    let raw = dispatch::dispatch(schedule, read_timeout, collection_timeout)?;

    let measured = costs.then_some(&raw.costs);
    Ok(result::finalize(&raw.outcomes, &sigma, output_tasks, measured))
}

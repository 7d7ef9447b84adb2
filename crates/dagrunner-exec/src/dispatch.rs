//! The dispatcher: spawns one thread per worker, each standing in for an isolated worker process,
//! drains them against an overall collection timeout, and merges their per-task outcomes.

use crate::error::{DispatchError, DispatchResult, TaskOutcome};
use crate::result::TaskCost;
use crate::routing::build_routing;
use crate::worker::run_worker;
use dagrunner_core::{Id, PayloadError, Schedule};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Raw per-task results of running `schedule`, keyed by the id the scheduler assigned (i.e. the
/// deduplicated graph's ids, not necessarily the caller's original ids; see `result::finalize`
/// for rewiring back through the survivor map).
pub struct RawReport {
    pub outcomes: IndexMap<Id, TaskOutcome>,
    pub costs: IndexMap<Id, TaskCost>,
}

/// Run every work item in `schedule` to completion, or fail with [`DispatchError::CollectionTimeout`]
/// once `collection_timeout` elapses.
///
/// `read_timeout` bounds each individual cross-worker channel read; `collection_timeout`, if set,
/// bounds the whole drain — once it elapses, a best-effort cancellation flag is raised (workers
/// stop picking up new items; in-flight items still finish or fail normally) and the call itself
/// fails rather than returning a partial result map.
pub fn dispatch(
    schedule: Schedule,
    read_timeout: Duration,
    collection_timeout: Option<Duration>,
) -> DispatchResult<RawReport> {
    let worker_count = schedule.worker_count();
    let total_items: usize = schedule.worker_tasks.iter().map(Vec::len).sum();
    info!("dispatching {total_items} task(s) across {worker_count} worker(s)");
    let start = Instant::now();

    let routing = build_routing(&schedule);
    let cancelled = AtomicBool::new(false);
    let timed_out = AtomicBool::new(false);
    let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(0);

    let per_worker = crossbeam::thread::scope(|scope| {
        if let Some(timeout) = collection_timeout {
            let cancelled = &cancelled;
            let timed_out = &timed_out;
            let done_rx = done_rx.clone();
            scope.spawn(move |_| {
                // Waits for either the drain below to signal completion (sender dropped, so
                // `Disconnected`) or the deadline (`Timeout` — the only case that's a real overrun).
                if let Err(crossbeam::channel::RecvTimeoutError::Timeout) = done_rx.recv_timeout(timeout) {
                    warn!("collection timed out after {timeout:?}, cancelling outstanding work");
                    cancelled.store(true, Ordering::Relaxed);
                    timed_out.store(true, Ordering::Relaxed);
                }
            });
        }

        let handles: Vec<_> = schedule
            .worker_tasks
            .into_iter()
            .zip(routing.outgoing)
            .zip(routing.incoming)
            .enumerate()
            .map(|(w, ((items, outgoing), incoming))| {
                debug!("worker {w}: spawning with {} task(s)", items.len());
                let cancelled = &cancelled;
                scope.spawn(move |_| run_worker(w, items, outgoing, incoming, read_timeout, cancelled))
            })
            .collect();

        let results = handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked without going through catch_unwind"))
            .collect::<Vec<_>>();
        drop(done_tx);
        results
    })
    .map_err(|_| PayloadError::new(DispatchError::Spawn("worker thread pool panicked".into())))?;

    if timed_out.load(Ordering::Relaxed) {
        return Err(PayloadError::new(DispatchError::CollectionTimeout));
    }

    let mut outcomes = IndexMap::new();
    let mut costs = IndexMap::new();
    for worker_outcomes in per_worker {
        for wo in worker_outcomes {
            costs.insert(wo.id.clone(), wo.cost);
            outcomes.insert(wo.id, wo.outcome);
        }
    }

    info!(
        "dispatch finished in {:.3} sec ({} ok, {} failed)",
        start.elapsed().as_secs_f32(),
        outcomes.values().filter(|o| o.is_ok()).count(),
        outcomes.values().filter(|o| o.is_err()).count(),
    );

    Ok(RawReport { outcomes, costs })
}

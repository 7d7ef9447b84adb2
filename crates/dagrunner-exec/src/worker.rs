//! The worker loop: for each work item in order, materialize its argument tree (local lookups
//! for same-worker dependencies, channel reads for cross-worker ones), invoke the function with
//! a caught panic boundary, and forward the result to any cross-worker consumers.

use crate::error::TaskError;
use crate::result::TaskCost;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use dagrunner_core::{Arg, ArgSpec, Dependency, Id, ResolvedArgs, TaskFailure, Value, WorkItem};
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub struct WorkerOutcome {
    pub id: Id,
    pub outcome: Result<Value, TaskError>,
    pub cost: TaskCost,
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked with a non-string payload".to_string()
    }
}

fn resolve_dependency(
    dep: &Dependency,
    consumer: &Id,
    local: &mut HashMap<Id, Value>,
    incoming: &HashMap<(Id, Id), Receiver<Value>>,
    read_timeout: Duration,
    failed: &HashSet<Id>,
    comm_times: &mut Vec<(Id, f64)>,
) -> Result<Value, TaskError> {
    if failed.contains(&dep.producer) {
        return Err(TaskError::DependencyError(dep.producer.clone()));
    }

    let raw = if let Some(v) = local.get(&dep.producer) {
        v.clone()
    } else if let Some(rx) = incoming.get(&(dep.producer.clone(), consumer.clone())) {
        let waited = Instant::now();
        let value = match rx.recv_timeout(read_timeout) {
            Ok(v) => v,
            Err(RecvTimeoutError::Timeout) => return Err(TaskError::Timeout),
            // the producer's worker dropped the sender without sending: its task failed rather
            // than simply running long.
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TaskError::DependencyError(dep.producer.clone()))
            }
        };
        comm_times.push((dep.producer.clone(), waited.elapsed().as_secs_f64()));
        // The channel is one-shot: cache the value under the producer's id so a second argument
        // slot referencing the same producer (or a later item on this worker) reuses it instead
        // of reading the already-drained channel again.
        local.insert(dep.producer.clone(), value.clone());
        value
    } else {
        // Producer placed neither locally nor routed to us: only reachable via a scheduling bug.
        return Err(TaskError::DependencyError(dep.producer.clone()));
    };

    match &dep.extract {
        Some(path) => path
            .resolve(&raw)
            .cloned()
            .ok_or_else(|| TaskError::DependencyError(dep.producer.clone())),
        None => Ok(raw),
    }
}

fn resolve_args(
    args: &ArgSpec,
    consumer: &Id,
    local: &mut HashMap<Id, Value>,
    incoming: &HashMap<(Id, Id), Receiver<Value>>,
    read_timeout: Duration,
    failed: &HashSet<Id>,
    comm_times: &mut Vec<(Id, f64)>,
) -> Result<ResolvedArgs, TaskError> {
    let mut one = |arg: &Arg| -> Result<Value, TaskError> {
        match arg {
            Arg::Value(v) => Ok(v.clone()),
            Arg::Dep(d) => resolve_dependency(d, consumer, local, incoming, read_timeout, failed, comm_times),
        }
    };
    match args {
        ArgSpec::Single(a) => Ok(ResolvedArgs::Single(one(a)?)),
        ArgSpec::Positional(items) => {
            let mut out = Vec::with_capacity(items.len());
            for a in items {
                out.push(one(a)?);
            }
            Ok(ResolvedArgs::Positional(out))
        }
        ArgSpec::Keyword(map) => {
            let mut out = indexmap::IndexMap::with_capacity(map.len());
            for (k, a) in map {
                out.insert(k.clone(), one(a)?);
            }
            Ok(ResolvedArgs::Keyword(out))
        }
    }
}

/// Run every item assigned to one worker, in the order the scheduler placed them. Returns one
/// outcome per item, in the same order.
pub fn run_worker(
    worker: usize,
    items: Vec<WorkItem>,
    outgoing: Vec<(Id, Id, Sender<Value>)>,
    incoming: HashMap<(Id, Id), Receiver<Value>>,
    read_timeout: Duration,
    cancelled: &AtomicBool,
) -> Vec<WorkerOutcome> {
    let mut outgoing_by_producer: HashMap<Id, Vec<(Id, Sender<Value>)>> = HashMap::new();
    for (producer, consumer, tx) in outgoing {
        outgoing_by_producer
            .entry(producer)
            .or_default()
            .push((consumer, tx));
    }

    let mut local: HashMap<Id, Value> = HashMap::with_capacity(items.len());
    let mut failed: HashSet<Id> = HashSet::new();
    let mut results = Vec::with_capacity(items.len());
    let total = items.len();

    for item in items {
        if cancelled.load(Ordering::Relaxed) {
            debug!(
                "worker {worker}: cancelled, stopping after {}/{total} task(s)",
                results.len()
            );
            break;
        }

        trace!("worker {worker}: starting task {}", item.id);

        let mut comm_times: Vec<(Id, f64)> = Vec::new();
        let (outcome, compute_time) =
            match resolve_args(&item.args, &item.id, &mut local, &incoming, read_timeout, &failed, &mut comm_times) {
                Err(e) => (Err(e), 0.0),
                Ok(resolved) => {
                    let invoked = Instant::now();
                    let outcome = match catch_unwind(AssertUnwindSafe(|| (item.function)(resolved))) {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(failure)) => Err(TaskError::Failure(failure)),
                        Err(panic) => Err(TaskError::Failure(TaskFailure::Panicked(panic_message(panic)))),
                    };
                    (outcome, invoked.elapsed().as_secs_f64())
                }
            };

        match &outcome {
            Ok(value) => {
                debug!("worker {worker}: task {} finished in {compute_time:.3} sec", item.id);
                local.insert(item.id.clone(), value.clone());
                if let Some(consumers) = outgoing_by_producer.remove(&item.id) {
                    for (_, tx) in consumers {
                        let _ = tx.send(value.clone());
                    }
                }
            }
            Err(e) => {
                warn!("worker {worker}: task {} failed: {e}", item.id);
                failed.insert(item.id.clone());
                // Drop any senders for this id unsent: downstream recv_timeout() resolves
                // immediately with Disconnected for consumers waiting on it.
                outgoing_by_producer.remove(&item.id);
            }
        }

        results.push(WorkerOutcome {
            id: item.id,
            outcome,
            cost: TaskCost { compute_time, comm_times },
        });
    }

    results
}

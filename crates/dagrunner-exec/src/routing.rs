//! Builds the cross-worker channel table for a schedule: one bounded, one-shot
//! `crossbeam::channel` per (producer, consumer) edge that crosses a worker boundary.
//! Same-worker dependencies never get a channel — the worker loop reads those straight out of
//! its own local result cache (see `worker.rs`).

use crossbeam::channel::{bounded, Receiver, Sender};
use dagrunner_core::{Id, Schedule, Value};
use std::collections::HashMap;

/// Per-worker channel endpoints. `outgoing[w]` and `incoming[w]` are indexed in parallel with
/// `Schedule::worker_tasks[w]`.
pub struct Routing {
    /// For worker `w`: every (producer id, consumer id, sender) where `w` produced the value
    /// and the consumer lives on a different worker.
    pub outgoing: Vec<Vec<(Id, Id, Sender<Value>)>>,
    /// For worker `w`: receivers for every cross-worker dependency one of `w`'s tasks needs,
    /// keyed by (producer id, consumer id).
    pub incoming: Vec<HashMap<(Id, Id), Receiver<Value>>>,
}

pub fn build_routing(schedule: &Schedule) -> Routing {
    let worker_count = schedule.worker_count();
    let mut outgoing: Vec<Vec<(Id, Id, Sender<Value>)>> = (0..worker_count).map(|_| Vec::new()).collect();
    let mut incoming: Vec<HashMap<(Id, Id), Receiver<Value>>> =
        (0..worker_count).map(|_| HashMap::new()).collect();

    for (consumer_worker, items) in schedule.worker_tasks.iter().enumerate() {
        for item in items {
            for dep in item.args.dependencies() {
                let producer_worker = match schedule.placement.get(&dep.producer) {
                    Some(&w) => w,
                    None => continue, // dangling deps are rejected before scheduling; defensive only
                };
                if producer_worker != consumer_worker {
                    let (tx, rx) = bounded(1);
                    outgoing[producer_worker].push((dep.producer.clone(), item.id.clone(), tx));
                    incoming[consumer_worker].insert((dep.producer.clone(), item.id.clone()), rx);
                }
            }
        }
    }

    Routing { outgoing, incoming }
}

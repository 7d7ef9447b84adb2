//! Insertion-based HEFT scheduling: rank tasks by priority, place each on the worker and
//! insertion slot yielding the earliest finish time.

use crate::cost::{comm_cost, upward_ranks};
use crate::error::{ConfigError, ConfigResult};
use crate::graph::Graph;
use crate::id::Id;
use crate::task::{ArgSpec, TaskFn};
use std::collections::HashMap;

/// A task handed to a worker: identity, the function to call, its (still-annotated-with-deps)
/// argument tree, and its compute-cost estimate. Cross-worker vs. local routing for each
/// dependency is derived from [`Schedule::placement`] by `dagrunner-exec`, rather than baked
/// in here, so the scheduler itself stays free of any notion of channels.
#[derive(Clone)]
pub struct WorkItem {
    pub id: Id,
    pub function: TaskFn,
    pub args: ArgSpec,
    pub cost: f64,
    /// The insertion slot's planned start time, for diagnostics and for verifying the scheduler's
    /// own topological-correctness guarantee, not a wall-clock guarantee at execution time.
    pub planned_start: f64,
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("cost", &self.cost)
            .field("planned_start", &self.planned_start)
            .finish()
    }
}

/// The scheduler's output: per-worker ordered work-item lists, the parallel id lists, and the
/// full id -> worker placement map. Every task in the input graph is scheduled and will run —
/// restricting what gets *reported* (an `output_tasks` filter) is a `dagrunner-exec` concern
/// applied after execution, not something that changes placement here.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub worker_tasks: Vec<Vec<WorkItem>>,
    pub worker_ids: Vec<Vec<Id>>,
    pub placement: HashMap<Id, usize>,
}

impl Schedule {
    pub fn worker_count(&self) -> usize {
        self.worker_tasks.len()
    }
}

/// Earliest start time >= `est` in `intervals` (sorted ascending by start, non-overlapping) with
/// room for `duration` — the classic HEFT "insertion" search between consecutive occupied
/// intervals and after the last.
fn find_insertion_slot(intervals: &[(f64, f64)], est: f64, duration: f64) -> f64 {
    let mut candidate = est;
    for &(s, e) in intervals {
        if e <= candidate {
            continue;
        }
        if s >= candidate + duration {
            break;
        }
        candidate = e;
    }
    candidate
}

fn insert_interval(timeline: &mut Vec<(f64, f64)>, start: f64, end: f64) {
    let pos = timeline.partition_point(|&(s, _)| s < start);
    timeline.insert(pos, (start, end));
}

/// Compute a schedule for `g` over `worker_count` workers. `g` should already be deduplicated
/// (see [`crate::dedup::remove_duplicates`]) — the scheduler itself doesn't deduplicate.
pub fn schedule(g: &Graph, worker_count: usize) -> ConfigResult<Schedule> {
    if worker_count == 0 {
        return Err(ConfigError::ZeroWorkers.into());
    }
    g.validate()?;
    let ranks = upward_ranks(g)?;
    // Rank ties between a producer and its own consumer are reachable whenever the edge and the
    // producer's cost are both zero, so breaking ties by id alone can process the consumer first
    // and leave the producer unplaced. Fall back to topological position, which `validate` above
    // already guarantees exists and orders every producer before its consumers.
    let topo = g.topological_order()?;
    let topo_index: HashMap<&Id, usize> = topo.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut priority_order: Vec<&Id> = g.keys().collect();
    priority_order.sort_by(|a, b| {
        ranks[b]
            .partial_cmp(&ranks[a])
            .unwrap()
            .then_with(|| topo_index[a].cmp(&topo_index[b]))
    });

    let mut timelines: Vec<Vec<(f64, f64)>> = vec![Vec::new(); worker_count];
    let mut finish: HashMap<Id, f64> = HashMap::with_capacity(g.len());
    let mut placement: HashMap<Id, usize> = HashMap::with_capacity(g.len());
    // (start, id) per worker, used to emit work items in placement-start order afterward.
    let mut placed_on: Vec<Vec<(f64, Id)>> = vec![Vec::new(); worker_count];

    for &id in &priority_order {
        let task = g.get(id).expect("priority_order only yields known ids");

        let mut best_worker = 0usize;
        let mut best_start = f64::INFINITY;
        let mut best_finish = f64::INFINITY;

        for w in 0..worker_count {
            let est = task
                .dependencies()
                .iter()
                .map(|dep| {
                    let producer_finish = finish[&dep.producer];
                    let producer_worker = placement[&dep.producer];
                    producer_finish + comm_cost(dep, producer_worker, w)
                })
                .fold(0.0_f64, f64::max);

            let start = find_insertion_slot(&timelines[w], est, task.cost);
            let eft = start + task.cost;

            if eft < best_finish {
                best_worker = w;
                best_start = start;
                best_finish = eft;
            }
        }

        insert_interval(&mut timelines[best_worker], best_start, best_finish);
        finish.insert(id.clone(), best_finish);
        placement.insert(id.clone(), best_worker);
        placed_on[best_worker].push((best_start, id.clone()));
    }

    let mut worker_tasks: Vec<Vec<WorkItem>> = vec![Vec::new(); worker_count];
    let mut worker_ids: Vec<Vec<Id>> = vec![Vec::new(); worker_count];
    for w in 0..worker_count {
        placed_on[w].sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for (start, id) in &placed_on[w] {
            let task = g.get(id).expect("placed task must exist in graph");
            worker_tasks[w].push(WorkItem {
                id: id.clone(),
                function: task.function.clone(),
                args: task.args.clone(),
                cost: task.cost,
                planned_start: *start,
            });
            worker_ids[w].push(id.clone());
        }
    }

    Ok(Schedule {
        worker_tasks,
        worker_ids,
        placement,
    })
}

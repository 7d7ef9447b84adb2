//! Upward-rank computation (HEFT priority) and the trivial same-worker/cross-worker
//! communication cost model.

use crate::error::ConfigResult;
use crate::graph::Graph;
use crate::id::Id;
use crate::task::Dependency;
use std::collections::HashMap;

/// `rank(t) = cost(t) + max over outgoing edges (comm_cost(e) + rank(successor(e)))`,
/// `rank(leaf) = cost(t)`. Computed in one reverse-topological sweep (sinks first) so every
/// successor's rank is already known — O(tasks + edges).
pub fn upward_ranks(g: &Graph) -> ConfigResult<HashMap<Id, f64>> {
    let order = g.topological_order()?;

    let mut successors: HashMap<&Id, Vec<(&Id, f64)>> = g.keys().map(|k| (k, Vec::new())).collect();
    for (consumer, dep) in g.edges() {
        successors.get_mut(&dep.producer).unwrap().push((consumer, dep.comm_cost));
    }

    let mut rank: HashMap<Id, f64> = HashMap::with_capacity(order.len());
    for id in order.iter().rev() {
        let task = g.get(id).expect("topological_order only yields known ids");
        let max_successor_path = successors
            .get(id)
            .into_iter()
            .flatten()
            .map(|(succ, comm)| comm + rank[*succ])
            .fold(0.0_f64, f64::max);
        rank.insert(id.clone(), task.cost + max_successor_path);
    }

    Ok(rank)
}

/// Communication cost for `dep` given where its producer and consumer land: zero on the same
/// worker, the declared edge cost otherwise.
pub fn comm_cost(dep: &Dependency, producer_worker: usize, consumer_worker: usize) -> f64 {
    if producer_worker == consumer_worker {
        0.0
    } else {
        dep.comm_cost
    }
}

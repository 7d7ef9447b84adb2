//! The computation graph: an order-preserving mapping from task id to [`Task`].

use crate::error::{ConfigError, ConfigResult};
use crate::id::Id;
use crate::task::Task;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

/// A directed acyclic graph of [`Task`]s. Edges are implicit: every [`crate::task::Dependency`]
/// appearing in a task's argument tree is an incoming edge from the referenced producer.
///
/// Iteration order is insertion order (backed by [`IndexMap`]), which is what "first occurrence
/// in graph iteration order" means throughout duplicate elimination and what makes scheduling
/// deterministic given a fixed input order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    tasks: IndexMap<Id, Task>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task. Returns the previous task at this id, if any.
    pub fn insert(&mut self, id: impl Into<Id>, task: Task) -> Option<Task> {
        self.tasks.insert(id.into(), task)
    }

    pub fn get(&self, id: &Id) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Id> {
        self.tasks.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Task)> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Id, &mut Task)> {
        self.tasks.iter_mut()
    }

    /// The insertion-order index of `id`, used as the deterministic tie-breaker for "first
    /// occurrence wins" in duplicate elimination.
    pub fn index_of(&self, id: &Id) -> Option<usize> {
        self.tasks.get_index_of(id)
    }

    /// Every (consumer, dependency) pair in the graph, consumers visited in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&Id, &crate::task::Dependency)> {
        self.tasks
            .iter()
            .flat_map(|(id, task)| task.dependencies().into_iter().map(move |d| (id, d)))
    }

    /// Checks the structural invariants: every dependency resolves, costs are finite and
    /// non-negative, and the graph has no cycles.
    pub fn validate(&self) -> ConfigResult<()> {
        for (id, task) in self.iter() {
            if !task.cost.is_finite() || task.cost < 0.0 {
                return Err(ConfigError::NonFiniteCost {
                    id: id.clone(),
                    cost: task.cost,
                }
                .into());
            }
            for dep in task.dependencies() {
                if !self.contains(&dep.producer) {
                    return Err(ConfigError::DanglingDependency {
                        consumer: id.clone(),
                        producer: dep.producer.clone(),
                    }
                    .into());
                }
                if !dep.comm_cost.is_finite() || dep.comm_cost < 0.0 {
                    return Err(ConfigError::NonFiniteCost {
                        id: dep.producer.clone(),
                        cost: dep.comm_cost,
                    }
                    .into());
                }
            }
        }
        // Cycle check doubles as computing the canonical topological order.
        self.topological_order()?;
        Ok(())
    }

    /// A deterministic topological order (producers before consumers): Kahn's algorithm with
    /// the ready set broken by original insertion index, so the same graph always yields the
    /// same order (required for P3, and for dedup's "first occurrence wins").
    pub fn topological_order(&self) -> ConfigResult<Vec<Id>> {
        let mut indegree: IndexMap<&Id, usize> = self.tasks.keys().map(|k| (k, 0)).collect();
        // dependents[p] = consumers that depend on p
        let mut dependents: IndexMap<&Id, Vec<&Id>> = self.tasks.keys().map(|k| (k, Vec::new())).collect();

        for (consumer, dep) in self.edges() {
            *indegree.get_mut(consumer).unwrap() += 1;
            dependents.get_mut(&dep.producer).unwrap().push(consumer);
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(id, _)| self.index_of(id).unwrap())
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        let mut visited: HashSet<usize> = HashSet::new();

        while let Some(&idx) = ready.iter().next() {
            ready.remove(&idx);
            let (id, _task) = self.tasks.get_index(idx).unwrap();
            visited.insert(idx);
            order.push(id.clone());

            for consumer in dependents.get(id).cloned().unwrap_or_default() {
                let deg = indegree.get_mut(consumer).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(self.index_of(consumer).unwrap());
                }
            }
        }

        if order.len() != self.tasks.len() {
            let cycle = self
                .tasks
                .keys()
                .enumerate()
                .filter(|(idx, _)| !visited.contains(idx))
                .map(|(_, id)| id.clone())
                .collect();
            return Err(ConfigError::Cycle(cycle).into());
        }

        Ok(order)
    }
}

impl FromIterator<(Id, Task)> for Graph {
    fn from_iter<T: IntoIterator<Item = (Id, Task)>>(iter: T) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Arg, ArgSpec, Dependency, ResolvedArgs, Task, TaskFnResult, Value};
    use std::sync::Arc;

    fn leaf(cost: f64) -> Task {
        Task::new(
            Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
            ArgSpec::Positional(vec![]),
            cost,
        )
    }

    fn dependent(on: &str, cost: f64) -> Task {
        Task::new(
            Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
            ArgSpec::Single(Arg::dep(Dependency::new(on, 1.0))),
            cost,
        )
    }

    #[test]
    fn detects_dangling_dependency() {
        let mut g = Graph::new();
        g.insert("a", dependent("missing", 1.0));
        assert!(matches!(
            g.validate().unwrap_err().into_inner(),
            ConfigError::DanglingDependency { .. }
        ));
    }

    #[test]
    fn detects_cycle() {
        let mut g = Graph::new();
        g.insert("a", dependent("b", 1.0));
        g.insert("b", dependent("a", 1.0));
        assert!(matches!(
            g.validate().unwrap_err().into_inner(),
            ConfigError::Cycle(_)
        ));
    }

    #[test]
    fn topological_order_respects_edges() {
        let mut g = Graph::new();
        g.insert("a", leaf(1.0));
        g.insert("b", dependent("a", 1.0));
        g.insert("c", dependent("b", 1.0));
        let order = g.topological_order().unwrap();
        let pos = |id: &str| order.iter().position(|i| i == &Id::str(id)).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }
}

//! Graphviz DOT rendering, for inspecting a graph before scheduling it.

use crate::graph::Graph;
use petgraph::graph::DiGraph;

/// Render `g` as a DOT document: one node per task id, one edge per dependency (labeled with
/// its communication cost).
pub fn to_dot(g: &Graph) -> String {
    let mut pg: DiGraph<String, String> = DiGraph::new();
    let mut nodes = std::collections::HashMap::new();

    for id in g.keys() {
        let idx = pg.add_node(id.to_string());
        nodes.insert(id.clone(), idx);
    }
    for (consumer, dep) in g.edges() {
        if let (Some(&from), Some(&to)) = (nodes.get(&dep.producer), nodes.get(consumer)) {
            pg.add_edge(from, to, format!("{:.2}", dep.comm_cost));
        }
    }

    format!("{}", petgraph::dot::Dot::new(&pg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Arg, ArgSpec, Dependency, ResolvedArgs, Task, TaskFnResult, Value};
    use std::sync::Arc;

    #[test]
    fn renders_every_task_as_a_node() {
        let mut g = Graph::new();
        g.insert(
            "a",
            Task::new(
                Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
                ArgSpec::Positional(vec![]),
                1.0,
            ),
        );
        g.insert(
            "b",
            Task::new(
                Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
                ArgSpec::Single(Arg::dep(Dependency::new("a", 1.0))),
                1.0,
            ),
        );
        let dot = to_dot(&g);
        assert!(dot.contains("a"));
        assert!(dot.contains("b"));
    }
}

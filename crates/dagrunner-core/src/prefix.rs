//! Namespacing a graph under a prefix token, for composing independently-authored subgraphs
//! into one id space without collision. Composing two prefixes in sequence is equivalent to
//! prefixing once with their concatenation.

use crate::graph::Graph;
use crate::id::Id;

/// Rewrite every task id and every dependency's producer id in `g` by prepending `prefix`.
///
/// `Id::with_leading` flattens rather than nests, so this composes associatively:
/// `prefix(prefix(g, a), b)` and `prefix(g, b.with_leading(a))` produce the same ids.
pub fn prefix(g: &Graph, prefix: impl Into<Id>) -> Graph {
    let prefix = prefix.into();
    let mut out = Graph::new();
    for (id, task) in g.iter() {
        let mut rewritten = task.clone();
        rewritten
            .args
            .rewrite_producers(|producer| producer.with_leading(prefix.clone()));
        out.insert(id.with_leading(prefix.clone()), rewritten);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Arg, ArgSpec, Dependency, ResolvedArgs, Task, TaskFnResult, Value};
    use std::sync::Arc;

    fn leaf() -> Task {
        Task::new(
            Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
            ArgSpec::Positional(vec![]),
            1.0,
        )
    }

    #[test]
    fn prefix_rewrites_ids_and_dependency_producers() {
        let mut g = Graph::new();
        g.insert("a", leaf());
        g.insert(
            "b",
            Task::new(
                Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::Null) }),
                ArgSpec::Single(Arg::dep(Dependency::new("a", 1.0))),
                1.0,
            ),
        );

        let prefixed = prefix(&g, "job1");
        assert!(prefixed.contains(&Id::tuple(vec![Id::str("job1"), Id::str("a")])));
        let b = prefixed
            .get(&Id::tuple(vec![Id::str("job1"), Id::str("b")]))
            .unwrap();
        assert_eq!(
            b.dependencies()[0].producer,
            Id::tuple(vec![Id::str("job1"), Id::str("a")])
        );
    }

    #[test]
    fn nested_prefixing_composes() {
        let mut g = Graph::new();
        g.insert("a", leaf());
        let once = prefix(&g, "inner");
        let twice = prefix(&once, "outer");

        let mut direct = Graph::new();
        direct.insert("a", leaf());
        let composed = prefix(&direct, Id::tuple(vec![Id::str("outer"), Id::str("inner")]));

        assert_eq!(
            twice.keys().cloned().collect::<Vec<_>>(),
            composed.keys().cloned().collect::<Vec<_>>()
        );
    }
}

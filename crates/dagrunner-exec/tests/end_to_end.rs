//! End-to-end scenarios against the full `dagrunner_exec::execute` pipeline.

use dagrunner_core::{Arg, ArgSpec, Dependency, Graph, Id, ResolvedArgs, Task, TaskFailure, TaskFnResult, Value};
use dagrunner_exec::execute;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn square() -> dagrunner_core::TaskFn {
    Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Single(v) => Ok(Value::from(v.as_f64().unwrap().powi(2))),
            _ => unreachable!(),
        }
    })
}

fn sum() -> dagrunner_core::TaskFn {
    Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Positional(vs) => {
                Ok(Value::from(vs[0].as_f64().unwrap() + vs[1].as_f64().unwrap()))
            }
            _ => unreachable!(),
        }
    })
}

fn sum_of_squares_graph() -> Graph {
    let mut g = Graph::new();
    g.insert("s1", Task::new(square(), ArgSpec::Single(Arg::value(3)), 8.0));
    g.insert("s2", Task::new(square(), ArgSpec::Single(Arg::value(8)), 8.0));
    g.insert(
        "sum",
        Task::new(
            sum(),
            ArgSpec::Positional(vec![
                Arg::dep(Dependency::new("s1", 1.0)),
                Arg::dep(Dependency::new("s2", 1.0)),
            ]),
            1.0,
        ),
    );
    g
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn scenario_sum_of_squares() {
    let g = sum_of_squares_graph();
    let result = execute(&g, 2, None, TIMEOUT, Some(Duration::from_secs(10)), false).unwrap();

    assert_eq!(result.values[&Id::str("s1")], Value::from(9.0));
    assert_eq!(result.values[&Id::str("s2")], Value::from(64.0));
    assert_eq!(result.values[&Id::str("sum")], Value::from(73.0));
}

#[test]
fn scenario_output_tasks_filter() {
    let g = sum_of_squares_graph();
    let mut filter = HashSet::new();
    filter.insert(Id::str("sum"));

    let result = execute(&g, 2, Some(&filter), TIMEOUT, Some(Duration::from_secs(10)), false).unwrap();

    assert_eq!(result.values.len(), 1);
    assert_eq!(result.values[&Id::str("sum")], Value::from(73.0));
}

#[test]
fn scenario_duplicate_elimination_both_original_ids_reported() {
    let shared = square();
    let mut g = Graph::new();
    g.insert("s1", Task::new(shared.clone(), ArgSpec::Single(Arg::value(5)), 8.0));
    g.insert("s2", Task::new(shared, ArgSpec::Single(Arg::value(5)), 8.0));
    g.insert(
        "consumer",
        Task::new(
            Arc::new(|args: ResolvedArgs| -> TaskFnResult {
                match args {
                    ResolvedArgs::Single(v) => Ok(v),
                    _ => unreachable!(),
                }
            }),
            ArgSpec::Single(Arg::dep(Dependency::new("s2", 1.0))),
            1.0,
        ),
    );

    let result = execute(&g, 2, None, TIMEOUT, Some(Duration::from_secs(10)), false).unwrap();

    assert_eq!(result.values[&Id::str("s1")], Value::from(25.0));
    assert_eq!(result.values[&Id::str("s2")], Value::from(25.0));
    assert_eq!(result.values[&Id::str("consumer")], Value::from(25.0));
}

#[test]
fn scenario_inflation_nests_structured_ids() {
    let mut flat = indexmap::IndexMap::new();
    flat.insert(Id::tuple([Id::str("sums"), Id::int(0), Id::int(0)]), Value::from("a"));
    flat.insert(Id::tuple([Id::str("sums"), Id::int(0), Id::int(1)]), Value::from("b"));
    flat.insert(Id::tuple([Id::str("sums"), Id::int(1), Id::int(0)]), Value::from("c"));

    let nested = dagrunner_exec::result::inflate(&flat);
    assert_eq!(nested["sums"]["0"]["0"], Value::from("a"));
    assert_eq!(nested["sums"]["0"]["1"], Value::from("b"));
    assert_eq!(nested["sums"]["1"]["0"], Value::from("c"));
}

#[test]
fn scenario_task_failure_propagates_to_direct_consumers_only() {
    let raiser: dagrunner_core::TaskFn =
        Arc::new(|_: ResolvedArgs| -> TaskFnResult { Err(TaskFailure::Raised(Value::from("boom"))) });
    let pass_through: dagrunner_core::TaskFn = Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Single(v) => Ok(v),
            _ => unreachable!(),
        }
    });

    let mut g = Graph::new();
    g.insert("t", Task::new(raiser, ArgSpec::Positional(vec![]), 1.0));
    g.insert(
        "consumer_a",
        Task::new(pass_through.clone(), ArgSpec::Single(Arg::dep(Dependency::new("t", 1.0))), 1.0),
    );
    g.insert(
        "consumer_b",
        Task::new(pass_through.clone(), ArgSpec::Single(Arg::dep(Dependency::new("t", 1.0))), 1.0),
    );
    g.insert("sibling", Task::new(pass_through, ArgSpec::Single(Arg::value(42)), 1.0));

    let result = execute(&g, 2, None, TIMEOUT, Some(Duration::from_secs(10)), false).unwrap();

    assert!(result.errors.contains_key(&Id::str("t")));
    assert!(result.errors.contains_key(&Id::str("consumer_a")));
    assert!(result.errors.contains_key(&Id::str("consumer_b")));
    assert_eq!(result.values[&Id::str("sibling")], Value::from(42));
}

/// A cross-worker producer delayed past the read timeout yields `TaskError::Timeout` for its
/// direct consumer, `TaskError::DependencyError` further downstream, and leaves unrelated tasks
/// alone. Placement is built by hand (rather than left to HEFT) so the producer and consumer are
/// guaranteed to land on different workers regardless of their costs.
#[test]
fn slow_cross_worker_dependency_times_out() {
    use dagrunner_core::{Schedule, WorkItem};
    use std::collections::HashMap;

    let slow: dagrunner_core::TaskFn = Arc::new(|_: ResolvedArgs| -> TaskFnResult {
        std::thread::sleep(Duration::from_millis(200));
        Ok(Value::from(1))
    });
    let pass_through: dagrunner_core::TaskFn = Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Single(v) => Ok(v),
            _ => unreachable!(),
        }
    });
    let downstream: dagrunner_core::TaskFn = Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Single(v) => Ok(v),
            _ => unreachable!(),
        }
    });
    let unrelated: dagrunner_core::TaskFn = Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::from(7)) });

    let item = |id: &str, function: dagrunner_core::TaskFn, args: ArgSpec| WorkItem {
        id: Id::str(id),
        function,
        args,
        cost: 1.0,
        planned_start: 0.0,
    };

    let slow_item = item("slow", slow, ArgSpec::Positional(vec![]));
    let consumer_item = item(
        "consumer",
        pass_through,
        ArgSpec::Single(Arg::dep(Dependency::new("slow", 1.0))),
    );
    let downstream_item = item(
        "downstream",
        downstream,
        ArgSpec::Single(Arg::dep(Dependency::new("consumer", 0.0))),
    );
    let unrelated_item = item("unrelated", unrelated, ArgSpec::Positional(vec![]));

    let mut placement = HashMap::new();
    placement.insert(Id::str("slow"), 0);
    placement.insert(Id::str("consumer"), 1);
    placement.insert(Id::str("downstream"), 1);
    placement.insert(Id::str("unrelated"), 1);

    let schedule = Schedule {
        worker_tasks: vec![
            vec![slow_item],
            vec![unrelated_item, consumer_item, downstream_item],
        ],
        worker_ids: vec![
            vec![Id::str("slow")],
            vec![Id::str("unrelated"), Id::str("consumer"), Id::str("downstream")],
        ],
        placement,
    };

    let raw = dagrunner_exec::dispatch::dispatch(schedule, Duration::from_millis(20), Some(Duration::from_secs(5)))
        .unwrap();

    assert!(matches!(
        &raw.outcomes[&Id::str("consumer")],
        Err(dagrunner_exec::error::TaskError::Timeout)
    ));
    assert!(matches!(
        &raw.outcomes[&Id::str("downstream")],
        Err(dagrunner_exec::error::TaskError::DependencyError(_))
    ));
    assert_eq!(raw.outcomes[&Id::str("unrelated")].as_ref().unwrap(), &Value::from(7));
}

#[test]
fn repeated_cross_worker_dependency_in_two_argument_slots_resolves_both() {
    use dagrunner_core::{Schedule, WorkItem};
    use std::collections::HashMap;

    let produce_five: dagrunner_core::TaskFn = Arc::new(|_: ResolvedArgs| -> TaskFnResult { Ok(Value::from(5)) });
    let add: dagrunner_core::TaskFn = Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Positional(vs) => {
                Ok(Value::from(vs[0].as_f64().unwrap() + vs[1].as_f64().unwrap()))
            }
            _ => unreachable!(),
        }
    });

    let producer_item = WorkItem {
        id: Id::str("producer"),
        function: produce_five,
        args: ArgSpec::Positional(vec![]),
        cost: 1.0,
        planned_start: 0.0,
    };
    // Both argument slots depend on "producer": the consumer references the same cross-worker
    // value twice.
    let consumer_item = WorkItem {
        id: Id::str("consumer"),
        function: add,
        args: ArgSpec::Positional(vec![
            Arg::dep(Dependency::new("producer", 1.0)),
            Arg::dep(Dependency::new("producer", 1.0)),
        ]),
        cost: 1.0,
        planned_start: 0.0,
    };

    let mut placement = HashMap::new();
    placement.insert(Id::str("producer"), 0);
    placement.insert(Id::str("consumer"), 1);

    let schedule = Schedule {
        worker_tasks: vec![vec![producer_item], vec![consumer_item]],
        worker_ids: vec![vec![Id::str("producer")], vec![Id::str("consumer")]],
        placement,
    };

    let raw = dagrunner_exec::dispatch::dispatch(schedule, Duration::from_secs(5), Some(Duration::from_secs(5)))
        .unwrap();

    assert_eq!(raw.outcomes[&Id::str("consumer")].as_ref().unwrap(), &Value::from(10.0));
}

#[test]
fn collection_timeout_fails_the_whole_call_instead_of_returning_partial_results() {
    let mut g = Graph::new();
    let slow: dagrunner_core::TaskFn = Arc::new(|_: ResolvedArgs| -> TaskFnResult {
        std::thread::sleep(Duration::from_millis(300));
        Ok(Value::from(1))
    });
    g.insert("slow", Task::new(slow, ArgSpec::Positional(vec![]), 1.0));

    let err = execute(&g, 1, None, Duration::from_secs(5), Some(Duration::from_millis(20)), false).unwrap_err();
    assert!(matches!(
        err.kind(),
        dagrunner_exec::error::DispatchError::CollectionTimeout
    ));
}

#[test]
fn costs_flag_reports_measured_compute_time() {
    let g = sum_of_squares_graph();
    let without = execute(&g, 2, None, TIMEOUT, Some(Duration::from_secs(10)), false).unwrap();
    assert!(without.costs.is_empty());

    let with = execute(&g, 2, None, TIMEOUT, Some(Duration::from_secs(10)), true).unwrap();
    assert!(with.costs[&Id::str("s1")].compute_time >= 0.0);
    assert!(with.costs[&Id::str("sum")].comm_times.len() <= 2);
}

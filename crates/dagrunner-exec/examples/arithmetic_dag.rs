//! Builds and runs the six-task arithmetic DAG over three workers:
//!
//!   0: x -> x^2            (x=3)
//!   1: x -> x^2            (x=4)
//!   2: x -> x/2            (x=10)
//!   3: x,y -> x+y           (deps: 0, 1)
//!   4: x,y -> x*y           (deps: 0, 2)
//!   5: x,y -> x-y           (deps: 3, 4)
//!
//! Expected: {0: 9, 1: 16, 2: 5, 3: 25, 4: 45, 5: -20}

use dagrunner_core::{Arg, ArgSpec, Dependency, Graph, ResolvedArgs, Task, TaskFnResult, Value};
use std::sync::Arc;
use std::time::Duration;

fn square() -> dagrunner_core::TaskFn {
    Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Positional(vs) => Ok(Value::from(vs[0].as_f64().unwrap().powi(2))),
            _ => unreachable!(),
        }
    })
}

fn halve() -> dagrunner_core::TaskFn {
    Arc::new(|args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Positional(vs) => Ok(Value::from(vs[0].as_f64().unwrap() / 2.0)),
            _ => unreachable!(),
        }
    })
}

fn binary(op: fn(f64, f64) -> f64) -> dagrunner_core::TaskFn {
    Arc::new(move |args: ResolvedArgs| -> TaskFnResult {
        match args {
            ResolvedArgs::Positional(vs) => {
                let x = vs[0].as_f64().unwrap();
                let y = vs[1].as_f64().unwrap();
                Ok(Value::from(op(x, y)))
            }
            _ => unreachable!(),
        }
    })
}

fn main() {
    let mut g = Graph::new();
    g.insert(0, Task::new(square(), ArgSpec::Positional(vec![Arg::value(3)]), 10.8));
    g.insert(1, Task::new(square(), ArgSpec::Positional(vec![Arg::value(4)]), 10.8));
    g.insert(2, Task::new(halve(), ArgSpec::Positional(vec![Arg::value(10)]), 11.0));
    g.insert(
        3,
        Task::new(
            binary(|x, y| x + y),
            ArgSpec::Positional(vec![Arg::dep(Dependency::new(0, 1.0)), Arg::dep(Dependency::new(1, 1.0))]),
            10.7,
        ),
    );
    g.insert(
        4,
        Task::new(
            binary(|x, y| x * y),
            ArgSpec::Positional(vec![Arg::dep(Dependency::new(0, 1.0)), Arg::dep(Dependency::new(2, 1.0))]),
            10.8,
        ),
    );
    g.insert(
        5,
        Task::new(
            binary(|x, y| x - y),
            ArgSpec::Positional(vec![Arg::dep(Dependency::new(3, 1.0)), Arg::dep(Dependency::new(4, 1.0))]),
            10.9,
        ),
    );

    let result = dagrunner_exec::execute(&g, 3, None, Duration::from_secs(5), Some(Duration::from_secs(60)), false)
        .expect("fatal configuration or dispatch error");

    let mut ids: Vec<_> = result.values.keys().cloned().collect();
    ids.sort_by_key(|id| id.to_string());
    for id in ids {
        println!("{id} = {}", result.values[&id]);
    }
    for (id, err) in &result.errors {
        eprintln!("{id} failed: {err}");
    }
}

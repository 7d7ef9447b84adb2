//! Turns a dispatcher's raw, survivor-keyed outcomes back into a caller-facing result: rewire
//! through σ so every id the caller originally submitted gets an answer (even ids that were
//! eliminated as duplicates), apply the `output_tasks` filter, and optionally inflate structured
//! ids into a nested JSON value.

use crate::error::TaskOutcome;
use dagrunner_core::{Id, Value};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Measured compute and communication time for one task's single execution: wall-clock time
/// spent inside the function invocation itself, plus, for every cross-worker dependency this
/// task had to wait on, the observed channel receive latency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCost {
    pub compute_time: f64,
    pub comm_times: Vec<(Id, f64)>,
}

/// The caller-facing result of running a graph to completion.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Successful outputs, keyed by the id the caller originally submitted.
    pub values: IndexMap<Id, Value>,
    /// Failed, dependency-errored, or timed-out tasks, same keying.
    pub errors: IndexMap<Id, crate::error::TaskError>,
    /// Measured per-task costs, present only when the caller requested `costs = true`. Keyed the
    /// same as `values`/`errors` (survivor's measurement, since duplicate-eliminated ids share one
    /// execution).
    pub costs: IndexMap<Id, TaskCost>,
}

/// `sigma` maps every id the caller originally submitted to its surviving (possibly identical)
/// id after duplicate elimination; `outcomes` is keyed by survivor id. `output_tasks`, if given,
/// restricts which original ids are reported — every dependency chain still ran regardless.
/// `measured`, if the caller asked for `costs`, carries each survivor's observed compute/comm times.
pub fn finalize(
    outcomes: &IndexMap<Id, TaskOutcome>,
    sigma: &IndexMap<Id, Id>,
    output_tasks: Option<&HashSet<Id>>,
    measured: Option<&IndexMap<Id, TaskCost>>,
) -> ExecutionResult {
    let mut result = ExecutionResult::default();

    for (original_id, survivor_id) in sigma {
        if let Some(filter) = output_tasks {
            if !filter.contains(original_id) {
                continue;
            }
        }

        match outcomes.get(survivor_id) {
            Some(Ok(value)) => {
                result.values.insert(original_id.clone(), value.clone());
            }
            Some(Err(e)) => {
                result.errors.insert(original_id.clone(), e.clone());
            }
            None => {}
        }

        if let Some(measured) = measured {
            if let Some(cost) = measured.get(survivor_id) {
                result.costs.insert(original_id.clone(), cost.clone());
            }
        }
    }

    result
}

/// Nest a flat `Id -> Value` map by structured (tuple) ids: `(a, b, c)` becomes
/// `root["a"]["b"]["c"]`. Scalar ids become top-level keys.
pub fn inflate(flat: &IndexMap<Id, Value>) -> Value {
    let mut root = serde_json::Map::new();
    for (id, value) in flat {
        let tokens: Vec<String> = match id.as_tuple() {
            Some(parts) => parts.iter().map(ToString::to_string).collect(),
            None => vec![id.to_string()],
        };
        insert_nested(&mut root, &tokens, value.clone());
    }
    Value::Object(root)
}

fn insert_nested(map: &mut serde_json::Map<String, Value>, tokens: &[String], value: Value) {
    match tokens {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Value::Object(inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}

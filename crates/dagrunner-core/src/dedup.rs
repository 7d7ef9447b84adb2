//! Duplicate elimination: canonicalize tasks by (function identity, argument tree) and merge
//! equivalence classes into a single survivor, rewiring dependents.

use crate::error::ConfigResult;
use crate::graph::Graph;
use crate::id::Id;
use crate::task::{Arg, ArgSpec, ExtractPath, Task};
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Clone, Eq, PartialEq, Hash)]
enum CanonArg {
    /// Compact JSON serialization of a literal value. serde_json's default (non-`preserve_order`)
    /// map serializes with sorted keys, so two structurally-equal values always produce the same
    /// string regardless of construction order.
    Value(String),
    Dep(Id, Option<ExtractPath>),
}

#[derive(Clone, Eq, PartialEq, Hash)]
enum CanonArgSpec {
    Single(CanonArg),
    Positional(Vec<CanonArg>),
    /// Sorted by key: "ordering within a mapping does not" participate in the canonical form.
    Keyword(Vec<(String, CanonArg)>),
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct CanonicalForm {
    function: usize,
    args: CanonArgSpec,
}

fn canon_arg(arg: &Arg, sigma: &IndexMap<Id, Id>) -> CanonArg {
    match arg {
        Arg::Value(v) => CanonArg::Value(v.to_string()),
        Arg::Dep(d) => {
            let producer = sigma.get(&d.producer).cloned().unwrap_or_else(|| d.producer.clone());
            CanonArg::Dep(producer, d.extract.clone())
        }
    }
}

fn canon_args(spec: &ArgSpec, sigma: &IndexMap<Id, Id>) -> CanonArgSpec {
    match spec {
        ArgSpec::Single(a) => CanonArgSpec::Single(canon_arg(a, sigma)),
        ArgSpec::Positional(args) => {
            CanonArgSpec::Positional(args.iter().map(|a| canon_arg(a, sigma)).collect())
        }
        ArgSpec::Keyword(map) => {
            let mut entries: Vec<(String, CanonArg)> =
                map.iter().map(|(k, a)| (k.clone(), canon_arg(a, sigma))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            CanonArgSpec::Keyword(entries)
        }
    }
}

fn canonical_form(task: &Task, sigma: &IndexMap<Id, Id>) -> CanonicalForm {
    CanonicalForm {
        function: task.function_identity(),
        args: canon_args(&task.args, sigma),
    }
}

/// Collapse structurally-duplicate tasks. Returns the deduplicated graph plus the surjective
/// map σ: every original key to its surviving key (σ(k) = k for survivors).
///
/// Requires `g` to already satisfy the structural invariants (no cycles, no dangling deps) —
/// call `g.validate()` first if that hasn't already been established.
pub fn remove_duplicates(g: &Graph) -> ConfigResult<(Graph, IndexMap<Id, Id>)> {
    let order = g.topological_order()?;

    let mut sigma: IndexMap<Id, Id> = IndexMap::new();
    let mut canon_to_survivor: HashMap<CanonicalForm, Id> = HashMap::new();

    for id in &order {
        let task = g.get(id).expect("topological_order only yields known ids");
        let canon = canonical_form(task, &sigma);
        match canon_to_survivor.get(&canon) {
            Some(survivor) => {
                sigma.insert(id.clone(), survivor.clone());
            }
            None => {
                sigma.insert(id.clone(), id.clone());
                canon_to_survivor.insert(canon, id.clone());
            }
        }
    }

    let mut deduped = Graph::new();
    for (id, task) in g.iter() {
        if sigma.get(id) == Some(id) {
            let mut rewritten = task.clone();
            rewritten.args.rewrite_producers(|producer| {
                sigma.get(producer).cloned().unwrap_or_else(|| producer.clone())
            });
            deduped.insert(id.clone(), rewritten);
        }
    }

    Ok((deduped, sigma))
}

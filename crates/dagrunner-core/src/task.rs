//! Tasks: function reference + argument specification + compute-cost estimate.

use crate::id::Id;
use indexmap::IndexMap;
use std::sync::Arc;

/// Argument and result payloads are self-describing JSON-like values. This is what actually
/// crosses the channel boundary between workers in `dagrunner-exec`, and it is exactly the shape
/// the extraction-key semantics below need (integer index into an array, string key into a map).
pub type Value = serde_json::Value;

/// A single lookup token applied to a producer's result.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ExtractKey {
    Index(usize),
    Key(String),
}

/// Either one lookup or an ordered path of lookups applied in succession.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ExtractPath {
    Single(ExtractKey),
    Path(Vec<ExtractKey>),
}

impl ExtractPath {
    /// Apply this path to `value`, returning `None` if any step doesn't resolve.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        let keys: &[ExtractKey] = match self {
            ExtractPath::Single(k) => std::slice::from_ref(k),
            ExtractPath::Path(ks) => ks.as_slice(),
        };
        let mut cur = value;
        for key in keys {
            cur = match key {
                ExtractKey::Index(i) => cur.get(i)?,
                ExtractKey::Key(k) => cur.get(k)?,
            };
        }
        Some(cur)
    }
}

/// A marker inside an argument tree referencing an upstream task's (possibly extracted) result.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub producer: Id,
    pub extract: Option<ExtractPath>,
    /// Estimated cost of shipping this value, incurred only if producer and consumer land on
    /// different workers. A cost of `0.0` is accepted as-is even though it tells HEFT the edge
    /// is free to cut.
    pub comm_cost: f64,
}

impl Dependency {
    pub fn new(producer: impl Into<Id>, comm_cost: f64) -> Self {
        Self {
            producer: producer.into(),
            extract: None,
            comm_cost,
        }
    }

    pub fn with_extract(mut self, extract: ExtractPath) -> Self {
        self.extract = Some(extract);
        self
    }
}

/// One argument slot: either a concrete value or a dependency marker to be resolved at
/// dispatch time.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Dep(Dependency),
}

impl Arg {
    pub fn value(v: impl Into<Value>) -> Self {
        Arg::Value(v.into())
    }

    pub fn dep(d: Dependency) -> Self {
        Arg::Dep(d)
    }
}

/// The explicit single/sequence/mapping trichotomy for argument shapes.
/// Never overload one container to mean more than one of these.
#[derive(Debug, Clone)]
pub enum ArgSpec {
    Single(Arg),
    Positional(Vec<Arg>),
    Keyword(IndexMap<String, Arg>),
}

impl ArgSpec {
    /// Every `Dependency` marker appearing anywhere in this tree, in a stable order.
    pub fn dependencies(&self) -> Vec<&Dependency> {
        let mut out = Vec::new();
        let collect = |arg: &Arg, out: &mut Vec<&Dependency>| {
            if let Arg::Dep(d) = arg {
                out.push(d);
            }
        };
        match self {
            ArgSpec::Single(a) => collect(a, &mut out),
            ArgSpec::Positional(args) => args.iter().for_each(|a| collect(a, &mut out)),
            ArgSpec::Keyword(map) => map.values().for_each(|a| collect(a, &mut out)),
        }
        out
    }

    /// Rewrite every dependency's `producer` id in place.
    pub fn rewrite_producers(&mut self, mut f: impl FnMut(&Id) -> Id) {
        let rewrite = |arg: &mut Arg, f: &mut dyn FnMut(&Id) -> Id| {
            if let Arg::Dep(d) = arg {
                d.producer = f(&d.producer);
            }
        };
        match self {
            ArgSpec::Single(a) => rewrite(a, &mut f),
            ArgSpec::Positional(args) => args.iter_mut().for_each(|a| rewrite(a, &mut f)),
            ArgSpec::Keyword(map) => map.values_mut().for_each(|a| rewrite(a, &mut f)),
        }
    }
}

/// What a task function reports back on failure.
#[derive(Debug, Clone)]
pub enum TaskFailure {
    /// The function panicked; payload is the captured panic message.
    Panicked(String),
    /// The function returned an explicit failure value.
    Raised(Value),
}

/// Arguments as actually handed to a function: dependencies already materialized.
pub enum ResolvedArgs {
    Single(Value),
    Positional(Vec<Value>),
    Keyword(IndexMap<String, Value>),
}

pub type TaskFnResult = Result<Value, TaskFailure>;

/// A reference-counted, thread-safe function. Two tasks have the "same function" iff their
/// `TaskFn`s share the same allocation (`Arc::ptr_eq`) — lambdas compare by identity only,
/// never by structural/source equivalence.
pub type TaskFn = Arc<dyn Fn(ResolvedArgs) -> TaskFnResult + Send + Sync>;

/// A task: function reference, argument specification, compute-cost estimate (>= 0).
#[derive(Clone)]
pub struct Task {
    pub function: TaskFn,
    pub args: ArgSpec,
    pub cost: f64,
}

impl Task {
    pub fn new(function: TaskFn, args: ArgSpec, cost: f64) -> Self {
        Self {
            function,
            args,
            cost,
        }
    }

    pub fn dependencies(&self) -> Vec<&Dependency> {
        self.args.dependencies()
    }

    /// A stable-for-this-process identity of `self.function`, suitable as a hash map key.
    /// Obtained by dropping the vtable half of the `Arc<dyn Fn>` fat pointer, the standard
    /// trick for trait-object identity comparisons.
    pub fn function_identity(&self) -> usize {
        Arc::as_ptr(&self.function) as *const () as usize
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("function", &format_args!("<fn @ {:#x}>", self.function_identity()))
            .field("args", &self.args)
            .field("cost", &self.cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fn() -> TaskFn {
        Arc::new(|_: ResolvedArgs| Ok(Value::Null))
    }

    #[test]
    fn function_identity_distinguishes_distinct_closures() {
        let a = make_fn();
        let b = make_fn();
        let t1 = Task::new(a.clone(), ArgSpec::Positional(vec![]), 1.0);
        let t2 = Task::new(a, ArgSpec::Positional(vec![]), 1.0);
        let t3 = Task::new(b, ArgSpec::Positional(vec![]), 1.0);
        assert_eq!(t1.function_identity(), t2.function_identity());
        assert_ne!(t1.function_identity(), t3.function_identity());
    }

    #[test]
    fn extract_path_resolves_index_then_key() {
        let value = serde_json::json!([{"x": 1}, {"x": 2}]);
        let path = ExtractPath::Path(vec![ExtractKey::Index(1), ExtractKey::Key("x".into())]);
        assert_eq!(path.resolve(&value), Some(&serde_json::json!(2)));
    }
}

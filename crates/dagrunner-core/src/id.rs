//! Task identifiers.
//!
//! A [`Id`] is any hashable, equality-comparable token a caller wants to name a task with.
//! Scalars (`Str`/`Int`) are the common case; `Tuple` is the structured form used by
//! [`crate::prefix::prefix`] and inflation in `dagrunner-exec`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An identifier for a task, or one component/token within a structured identifier.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Id {
    Str(String),
    Int(i64),
    /// A fixed-length ordered sequence of tokens. Supports "inflation" into nested maps
    /// (see `dagrunner_exec::result::inflate`) and is what [`crate::prefix::prefix`] produces.
    Tuple(Vec<Id>),
}

impl Id {
    pub fn str(s: impl Into<String>) -> Self {
        Id::Str(s.into())
    }

    pub fn int(i: i64) -> Self {
        Id::Int(i)
    }

    pub fn tuple(ids: impl IntoIterator<Item = Id>) -> Self {
        Id::Tuple(ids.into_iter().collect())
    }

    /// If this is a [`Id::Tuple`], its elements; otherwise `None`.
    pub fn as_tuple(&self) -> Option<&[Id]> {
        match self {
            Id::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Prepend `prefix` as the new leading token(s), turning any `Id` into a flat `Tuple`.
    ///
    /// Both sides are flattened: a scalar `a` prefixed by `p` becomes `(p, a)`; an existing
    /// tuple `(a, b)` becomes `(p, a, b)`; and if `prefix` is itself a tuple `(p1, p2)` its
    /// tokens are spliced in rather than nested, so `(p1, p2, a, b)` results. This is what makes
    /// repeated prefixing compose associatively:
    /// `x.with_leading(a).with_leading(b) == x.with_leading(b.with_leading(a))`.
    pub fn with_leading(&self, prefix: Id) -> Id {
        let mut tokens = match prefix {
            Id::Tuple(ts) => ts,
            scalar => vec![scalar],
        };
        match self {
            Id::Tuple(existing) => tokens.extend(existing.iter().cloned()),
            scalar => tokens.push(scalar.clone()),
        }
        Id::Tuple(tokens)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Str(s) => write!(f, "{s}"),
            Id::Int(i) => write!(f, "{i}"),
            Id::Tuple(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Str(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Str(s)
    }
}

impl From<i64> for Id {
    fn from(i: i64) -> Self {
        Id::Int(i)
    }
}

impl From<i32> for Id {
    fn from(i: i32) -> Self {
        Id::Int(i as i64)
    }
}

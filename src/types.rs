//! Shared types of the query surface.
//!
//! Every table has the same two-column shape: an integer `key` and a short
//! string `value`. Predicates therefore carry typed literals: an `i32` for
//! the key column, a `String` compared lexicographically for the value
//! column.

use std::fmt;

/// A single table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: i32,
    pub value: String,
}

impl Tuple {
    pub fn new(key: i32, value: impl Into<String>) -> Self {
        Tuple {
            key,
            value: value.into(),
        }
    }
}

/// What a SELECT statement projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectTarget {
    /// `SELECT key`
    Key,
    /// `SELECT value`
    Value,
    /// `SELECT *` (or `SELECT key, value`)
    All,
    /// `SELECT count(*)`
    Count,
}

/// Comparison operator of a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    /// Apply the comparator to an already-computed three-way ordering.
    pub fn matches(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompOp::Eq => ord == Equal,
            CompOp::Ne => ord != Equal,
            CompOp::Lt => ord == Less,
            CompOp::Le => ord != Greater,
            CompOp::Gt => ord == Greater,
            CompOp::Ge => ord != Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A single WHERE condition, already bound to its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Key { op: CompOp, literal: i32 },
    Value { op: CompOp, literal: String },
}

impl Predicate {
    /// Evaluate the predicate against a tuple.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        match self {
            Predicate::Key { op, literal } => op.matches(tuple.key.cmp(literal)),
            Predicate::Value { op, literal } => {
                op.matches(tuple.value.as_str().cmp(literal.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comp_op_matches_orderings() {
        use std::cmp::Ordering::*;
        assert!(CompOp::Eq.matches(Equal));
        assert!(!CompOp::Eq.matches(Less));
        assert!(CompOp::Ne.matches(Greater));
        assert!(CompOp::Le.matches(Equal));
        assert!(CompOp::Le.matches(Less));
        assert!(!CompOp::Le.matches(Greater));
        assert!(CompOp::Ge.matches(Greater));
        assert!(!CompOp::Lt.matches(Equal));
    }

    #[test]
    fn predicate_matches_tuple() {
        let t = Tuple::new(42, "oak");
        assert!(Predicate::Key { op: CompOp::Gt, literal: 40 }.matches(&t));
        assert!(!Predicate::Key { op: CompOp::Eq, literal: 41 }.matches(&t));
        assert!(Predicate::Value { op: CompOp::Eq, literal: "oak".into() }.matches(&t));
        // string comparison is lexicographic, as strcmp would order it
        assert!(Predicate::Value { op: CompOp::Lt, literal: "pine".into() }.matches(&t));
    }
}

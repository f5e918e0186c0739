//! Predicate folding for SELECT.
//!
//! The planner collapses the WHERE conditions of a statement into a
//! `SelectPlan`: an optional exact key, the tightest lower and upper key
//! bounds, and flags the executor needs to pick between a heap scan and
//! an index range scan. Contradictory conditions are detected here so the
//! executor can answer without touching any file pages.

use crate::types::{CompOp, Predicate, SelectTarget};

/// One folded range endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub value: i32,
    pub inclusive: bool,
}

/// Folded view of a statement's predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectPlan {
    /// From key-EQ conditions.
    pub equal: Option<i32>,
    /// Tightest lower bound from GT/GE conditions.
    pub min: Option<Bound>,
    /// Tightest upper bound from LT/LE conditions.
    pub max: Option<Bound>,
    /// The conditions can never all hold; the result set is empty.
    pub impossible: bool,
    /// At least one non-NE key condition exists.
    pub indexable: bool,
    pub has_value_pred: bool,
    pub has_ne_key_pred: bool,
}

impl SelectPlan {
    /// Whether an index scan is eligible for this statement: some key
    /// condition the index can seek on, or a bare count(*).
    pub fn use_index(&self, target: SelectTarget) -> bool {
        self.indexable || target == SelectTarget::Count
    }

    /// First key the index scan should seek to.
    pub fn start_key(&self) -> i32 {
        if let Some(equal) = self.equal {
            equal
        } else if let Some(min) = self.min {
            if min.inclusive {
                min.value
            } else {
                min.value.saturating_add(1)
            }
        } else {
            0
        }
    }
}

/// Fold a predicate list into a plan.
pub fn fold(conds: &[Predicate]) -> SelectPlan {
    let mut plan = SelectPlan::default();
    let mut value_eq: Option<&str> = None;

    for cond in conds {
        match cond {
            Predicate::Key { op, literal } => match op {
                CompOp::Eq => {
                    plan.indexable = true;
                    if plan.equal.is_some_and(|prev| prev != *literal) {
                        plan.impossible = true;
                    }
                    plan.equal = Some(*literal);
                }
                CompOp::Ge => {
                    plan.indexable = true;
                    if plan.min.is_none_or(|b| *literal > b.value) {
                        plan.min = Some(Bound {
                            value: *literal,
                            inclusive: true,
                        });
                    }
                }
                CompOp::Gt => {
                    plan.indexable = true;
                    if plan.min.is_none_or(|b| *literal >= b.value) {
                        plan.min = Some(Bound {
                            value: *literal,
                            inclusive: false,
                        });
                    }
                }
                CompOp::Le => {
                    plan.indexable = true;
                    if plan.max.is_none_or(|b| *literal < b.value) {
                        plan.max = Some(Bound {
                            value: *literal,
                            inclusive: true,
                        });
                    }
                }
                CompOp::Lt => {
                    plan.indexable = true;
                    if plan.max.is_none_or(|b| *literal <= b.value) {
                        plan.max = Some(Bound {
                            value: *literal,
                            inclusive: false,
                        });
                    }
                }
                CompOp::Ne => plan.has_ne_key_pred = true,
            },
            Predicate::Value { op, literal } => {
                plan.has_value_pred = true;
                if *op == CompOp::Eq {
                    if value_eq.is_some_and(|prev| prev != literal.as_str()) {
                        plan.impossible = true;
                    }
                    value_eq = Some(literal.as_str());
                }
            }
        }
    }

    if let (Some(min), Some(max)) = (plan.min, plan.max) {
        if min.value > max.value
            || (min.value == max.value && !(min.inclusive && max.inclusive))
        {
            plan.impossible = true;
        }
    }
    plan
}

//! Leaf comparison operators and tree combinators.

use std::{cmp::Ordering, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Comparison operator applied by a value node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComparisonOp {
    /// Less than (`<`).
    Lt,
    /// Less than or equal to (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal to (`>=`).
    Ge,
    /// Equals (`=`), or `IS NULL` when the node carries no value.
    Eq,
    /// Not equals (`!=`), or `IS NOT NULL` when the node carries no value.
    Ne,
    /// Set membership.
    In,
    /// Negated set membership.
    NotIn,
    /// Matches every cell. Only produced by enumeration rewriting.
    AlwaysTrue,
    /// Matches no cell. Only produced by enumeration rewriting.
    AlwaysFalse,
}

impl ComparisonOp {
    /// Returns the canonical upper-case name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Lt => "LT",
            ComparisonOp::Le => "LE",
            ComparisonOp::Gt => "GT",
            ComparisonOp::Ge => "GE",
            ComparisonOp::Eq => "EQ",
            ComparisonOp::Ne => "NE",
            ComparisonOp::In => "IN",
            ComparisonOp::NotIn => "NOT_IN",
            ComparisonOp::AlwaysTrue => "ALWAYS_TRUE",
            ComparisonOp::AlwaysFalse => "ALWAYS_FALSE",
        }
    }

    /// Returns the logical negation of this operator.
    ///
    /// Rewritten sentinels have no negation and yield `None`.
    #[must_use]
    pub fn negated(self) -> Option<Self> {
        match self {
            ComparisonOp::Lt => Some(ComparisonOp::Ge),
            ComparisonOp::Le => Some(ComparisonOp::Gt),
            ComparisonOp::Gt => Some(ComparisonOp::Le),
            ComparisonOp::Ge => Some(ComparisonOp::Lt),
            ComparisonOp::Eq => Some(ComparisonOp::Ne),
            ComparisonOp::Ne => Some(ComparisonOp::Eq),
            ComparisonOp::In => Some(ComparisonOp::NotIn),
            ComparisonOp::NotIn => Some(ComparisonOp::In),
            ComparisonOp::AlwaysTrue | ComparisonOp::AlwaysFalse => None,
        }
    }

    /// Returns true for `IN` and `NOT_IN`.
    #[must_use]
    pub fn is_set_membership(self) -> bool {
        matches!(self, ComparisonOp::In | ComparisonOp::NotIn)
    }

    /// Returns true for `LT`, `LE`, `GT` and `GE`.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge
        )
    }

    /// Returns true for the sentinels synthesized by enumeration rewriting.
    #[must_use]
    pub fn is_internal(self) -> bool {
        matches!(self, ComparisonOp::AlwaysTrue | ComparisonOp::AlwaysFalse)
    }

    /// Evaluates a binary operator against the ordering of `cell` relative to the literal.
    ///
    /// # Panics
    ///
    /// Panics for set membership and sentinel operators, which do not compare orderings.
    #[must_use]
    pub fn test_ordering(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Lt => ordering == Ordering::Less,
            ComparisonOp::Le => ordering != Ordering::Greater,
            ComparisonOp::Gt => ordering == Ordering::Greater,
            ComparisonOp::Ge => ordering != Ordering::Less,
            ComparisonOp::Eq => ordering == Ordering::Equal,
            ComparisonOp::Ne => ordering != Ordering::Equal,
            other => panic!("{other} does not compare orderings"),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator joining the children of an expression node.
///
/// `Nand` never comes out of ordinary tree building: only negation and
/// optimization produce it. `Not` is accepted by
/// [`QueryCondition::negate`](crate::condition::QueryCondition::negate) and is
/// never stored on an expression node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CombinationOp {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Negated conjunction.
    Nand,
    /// Single operand negation.
    Not,
}

impl CombinationOp {
    /// Returns the canonical upper-case name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CombinationOp::And => "AND",
            CombinationOp::Or => "OR",
            CombinationOp::Nand => "NAND",
            CombinationOp::Not => "NOT",
        }
    }
}

impl fmt::Display for CombinationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Node;
use crate::{error::ConstructionError, op::CombinationOp};

/// Inner node joining two or more children under one combinator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "ExprNodeRepr", into = "ExprNodeRepr")
)]
pub struct ExprNode {
    children: Vec<Node>,
    combination_op: CombinationOp,
}

impl ExprNode {
    /// Joins `children` under `combination_op`.
    ///
    /// `NOT` is a unary request, never a stored combinator, and fewer than two
    /// children is not an expression.
    #[cfg(any(feature = "serde", test))]
    pub(crate) fn new(
        children: Vec<Node>,
        combination_op: CombinationOp,
    ) -> Result<Self, ConstructionError> {
        if combination_op == CombinationOp::Not {
            return Err(ConstructionError::UnsupportedCombinationOp(combination_op));
        }
        if children.len() < 2 {
            return Err(ConstructionError::TooFewChildren(children.len()));
        }
        Ok(Self {
            children,
            combination_op,
        })
    }

    /// Builds a node from parts already known to be well formed.
    pub(crate) fn from_parts(children: Vec<Node>, combination_op: CombinationOp) -> Self {
        debug_assert!(combination_op != CombinationOp::Not);
        debug_assert!(children.len() >= 2);
        Self {
            children,
            combination_op,
        }
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// Combinator joining the children.
    #[must_use]
    pub fn combination_op(&self) -> CombinationOp {
        self.combination_op
    }
}

#[cfg(feature = "serde")]
#[derive(Clone, Serialize, Deserialize)]
struct ExprNodeRepr {
    children: Vec<Node>,
    combination_op: CombinationOp,
}

#[cfg(feature = "serde")]
impl TryFrom<ExprNodeRepr> for ExprNode {
    type Error = ConstructionError;

    fn try_from(repr: ExprNodeRepr) -> Result<Self, Self::Error> {
        ExprNode::new(repr.children, repr.combination_op)
    }
}

#[cfg(feature = "serde")]
impl From<ExprNode> for ExprNodeRepr {
    fn from(node: ExprNode) -> Self {
        Self {
            children: node.children,
            combination_op: node.combination_op,
        }
    }
}

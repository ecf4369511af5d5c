//! Query condition syntax tree.
//!
//! A tree is a [`Node`]: either a [`ValueNode`] leaf comparing one field
//! against a literal, or an [`ExprNode`] joining two or more subtrees under a
//! [`CombinationOp`]. Trees are built bottom-up with [`Node::combine`], and
//! every transformation (negation, optimization) returns a fresh tree.

mod expr;
mod value;

use std::{collections::HashSet, fmt};

pub use expr::ExprNode;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
pub use value::{NodeValue, ValueNode};

use crate::{
    byte_value::ByteValue,
    error::{RewriteError, ValidityError},
    op::{CombinationOp, ComparisonOp},
    rewrite::EnumerationRewriter,
    schema::Schema,
    validate::SchemaValidator,
};

/// Root or subtree of a query condition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    /// Leaf comparison.
    Value(ValueNode),
    /// Combination of two or more subtrees.
    Expr(ExprNode),
}

impl From<ValueNode> for Node {
    fn from(node: ValueNode) -> Self {
        Node::Value(node)
    }
}

impl From<ExprNode> for Node {
    fn from(node: ExprNode) -> Self {
        Node::Expr(node)
    }
}

impl Node {
    /// Returns true for expression nodes.
    #[must_use]
    pub fn is_expr(&self) -> bool {
        matches!(self, Node::Expr(_))
    }

    /// Returns the leaf, if this is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            Node::Value(node) => Some(node),
            Node::Expr(_) => None,
        }
    }

    /// Returns the expression, if this is one.
    #[must_use]
    pub fn as_expr(&self) -> Option<&ExprNode> {
        match self {
            Node::Expr(node) => Some(node),
            Node::Value(_) => None,
        }
    }

    fn expect_value(&self, accessor: &str) -> &ValueNode {
        match self {
            Node::Value(node) => node,
            Node::Expr(_) => panic!("{accessor} is not valid on an expression node"),
        }
    }

    fn expect_expr(&self, accessor: &str) -> &ExprNode {
        match self {
            Node::Expr(node) => node,
            Node::Value(_) => panic!("{accessor} is not valid on a value node"),
        }
    }

    /// Field name of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.expect_value("field_name").field_name()
    }

    /// Comparison operator of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn op(&self) -> ComparisonOp {
        self.expect_value("op").op()
    }

    /// Literal of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn value(&self) -> NodeValue<'_> {
        self.expect_value("value").value()
    }

    /// Raw literal bytes of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn data(&self) -> &ByteValue {
        self.expect_value("data").data()
    }

    /// Raw set offsets of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn offsets(&self) -> &ByteValue {
        self.expect_value("offsets").offsets()
    }

    /// Enumeration flag of a leaf.
    ///
    /// # Panics
    ///
    /// Panics on expression nodes.
    #[must_use]
    pub fn use_enumeration(&self) -> bool {
        self.expect_value("use_enumeration").use_enumeration()
    }

    /// Children of an expression.
    ///
    /// # Panics
    ///
    /// Panics on value nodes.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        self.expect_expr("children").children()
    }

    /// Combinator of an expression.
    ///
    /// # Panics
    ///
    /// Panics on value nodes.
    #[must_use]
    pub fn combination_op(&self) -> CombinationOp {
        self.expect_expr("combination_op").combination_op()
    }

    /// Joins `self` and `rhs` under `op` without mutating either.
    ///
    /// An operand that is already an `AND`/`OR` expression with the same
    /// combinator contributes its children instead of itself, so chains of one
    /// combinator stay flat. `NAND` is not associative and never flattens.
    ///
    /// # Panics
    ///
    /// Panics when `op` is `NOT`.
    #[must_use]
    pub fn combine(&self, rhs: &Node, op: CombinationOp) -> Node {
        assert!(
            op != CombinationOp::Not,
            "NOT cannot combine two nodes; negate the tree instead"
        );
        let flattens =
            |expr: &ExprNode| expr.combination_op() == op && op != CombinationOp::Nand;

        let mut children = Vec::new();
        for operand in [self, rhs] {
            match operand {
                Node::Expr(expr) if flattens(expr) => {
                    children.extend(expr.children().iter().cloned());
                }
                other => children.push(other.clone()),
            }
        }
        Node::Expr(ExprNode::from_parts(children, op))
    }

    /// Returns the logical complement of the tree.
    ///
    /// Leaves flip their operator, `AND` and `OR` swap with every child
    /// negated, and `NAND` becomes `AND` over its unchanged children.
    ///
    /// # Panics
    ///
    /// Panics when a leaf carries `ALWAYS_TRUE` or `ALWAYS_FALSE`.
    #[must_use]
    pub fn negated_tree(&self) -> Node {
        match self {
            Node::Value(node) => Node::Value(node.negated()),
            Node::Expr(expr) => {
                let (op, children) = match expr.combination_op() {
                    CombinationOp::And => (
                        CombinationOp::Or,
                        expr.children().iter().map(Node::negated_tree).collect(),
                    ),
                    CombinationOp::Or => (
                        CombinationOp::And,
                        expr.children().iter().map(Node::negated_tree).collect(),
                    ),
                    CombinationOp::Nand => (CombinationOp::And, expr.children().to_vec()),
                    CombinationOp::Not => unreachable!("NOT is never stored on an expression"),
                };
                Node::Expr(ExprNode::from_parts(children, op))
            }
        }
    }

    /// Returns an equivalent tree free of `OR`, which evaluates cheaper.
    ///
    /// `OR(c1..cn)` becomes `NAND(!c1..!cn)`; other combinators keep their
    /// shape and optimize their children.
    ///
    /// # Panics
    ///
    /// Panics when an `OR` subtree contains `ALWAYS_TRUE` or `ALWAYS_FALSE`.
    #[must_use]
    pub fn optimized_tree(&self) -> Node {
        match self {
            Node::Value(node) => Node::Value(node.clone()),
            Node::Expr(expr) => {
                let (op, children) = match expr.combination_op() {
                    CombinationOp::Or => (
                        CombinationOp::Nand,
                        expr.children()
                            .iter()
                            .map(|child| child.negated_tree().optimized_tree())
                            .collect(),
                    ),
                    op => (
                        op,
                        expr.children().iter().map(Node::optimized_tree).collect(),
                    ),
                };
                Node::Expr(ExprNode::from_parts(children, op))
            }
        }
    }

    /// Adds the field name of every leaf to `names`.
    pub fn collect_field_names(&self, names: &mut HashSet<String>) {
        match self {
            Node::Value(node) => {
                if !names.contains(node.field_name()) {
                    names.insert(node.field_name().to_string());
                }
            }
            Node::Expr(expr) => {
                for child in expr.children() {
                    child.collect_field_names(names);
                }
            }
        }
    }

    /// Distinct field names referenced by the tree.
    #[must_use]
    pub fn field_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        self.collect_field_names(&mut names);
        names
    }

    /// Returns true when readers predating set membership and nested
    /// combinators can consume the tree: a single leaf, or one `AND` over leaves.
    #[must_use]
    pub fn is_backwards_compatible(&self) -> bool {
        match self {
            Node::Value(node) => node.is_backwards_compatible(),
            Node::Expr(expr) => {
                expr.combination_op() == CombinationOp::And
                    && expr.children().iter().all(|child| {
                        child
                            .as_value()
                            .is_some_and(ValueNode::is_backwards_compatible)
                    })
            }
        }
    }

    /// Checks every leaf against `schema`.
    pub fn check_node_validity<S>(&self, schema: &S) -> Result<(), ValidityError>
    where
        S: Schema + ?Sized,
    {
        SchemaValidator::new(schema).check(self)
    }

    /// Sets the enumeration flag on every leaf.
    pub fn set_use_enumeration(&mut self, use_enumeration: bool) {
        match self {
            Node::Value(node) => node.set_use_enumeration(use_enumeration),
            Node::Expr(expr) => {
                for child in expr.children_mut() {
                    child.set_use_enumeration(use_enumeration);
                }
            }
        }
    }

    /// Replaces enumeration literals with the index values stored in attributes.
    ///
    /// The tree is left unchanged when an error is returned.
    pub fn rewrite_enumeration_conditions<S>(&mut self, schema: &S) -> Result<(), RewriteError>
    where
        S: Schema + ?Sized,
    {
        EnumerationRewriter::new(schema).rewrite(self)
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field_name(), self.op())?;
        if self.is_null() {
            return f.write_str(" null");
        }
        for byte in self.data().as_slice() {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, child) in self.children().iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.combination_op())?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Value(node) => node.fmt(f),
            Node::Expr(expr) => expr.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructionError;

    fn leaf(field: &str, op: ComparisonOp, value: u32) -> Node {
        ValueNode::new(field, Some(&value.to_le_bytes()), op)
            .expect("valid leaf")
            .into()
    }

    fn x_lt() -> Node {
        leaf("x", ComparisonOp::Lt, 0xabcdef12)
    }

    fn set(field: &str, op: ComparisonOp) -> Node {
        ValueNode::from_members(field, ["foo", "bar"], op)
            .expect("valid set")
            .into()
    }

    #[test]
    fn renders_little_endian_bytes() {
        assert_eq!(x_lt().to_string(), "x LT 12 ef cd ab");
        let null: Node = ValueNode::new("y", None, ComparisonOp::Eq)
            .expect("null leaf")
            .into();
        assert_eq!(null.to_string(), "y EQ null");
    }

    #[test]
    fn combine_flattens_matching_combinators() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Gt, 3);
        let a = leaf("a", ComparisonOp::Eq, 1);
        let b = leaf("b", ComparisonOp::Ne, 2);

        let xy = x.combine(&y, CombinationOp::Or);
        let ab = a.combine(&b, CombinationOp::Or);
        let flat = xy.combine(&ab, CombinationOp::Or);
        assert_eq!(flat.children().len(), 4);
        assert_eq!(flat.combination_op(), CombinationOp::Or);

        let nested = xy.combine(&ab, CombinationOp::And);
        assert_eq!(nested.children().len(), 2);
        assert_eq!(
            nested.to_string(),
            format!("(({x} OR {y}) AND ({a} OR {b}))")
        );
        // Operands are left untouched.
        assert_eq!(xy.children().len(), 2);
    }

    #[test]
    fn combine_flattens_left_operand_into_right_list() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Gt, 3);
        let z = leaf("z", ComparisonOp::Le, 8);
        let yz = y.combine(&z, CombinationOp::And);
        let combined = x.combine(&yz, CombinationOp::And);
        assert_eq!(combined.to_string(), format!("({x} AND {y} AND {z})"));
    }

    #[test]
    fn nand_never_flattens() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Gt, 3);
        let nand = x.combine(&y, CombinationOp::Or).optimized_tree();
        let z = leaf("z", ComparisonOp::Eq, 1);
        let combined = nand.combine(&z, CombinationOp::Nand);
        assert_eq!(combined.children().len(), 2);
        assert_eq!(combined.children()[0], nand);
    }

    #[test]
    #[should_panic(expected = "NOT cannot combine two nodes")]
    fn combine_rejects_not() {
        let _ = x_lt().combine(&x_lt(), CombinationOp::Not);
    }

    #[test]
    fn negation_applies_de_morgan() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Eq, 7);
        let tree = x.combine(&y, CombinationOp::And);
        let negated = tree.negated_tree();
        assert_eq!(negated.combination_op(), CombinationOp::Or);
        assert_eq!(negated.children()[0].op(), ComparisonOp::Ge);
        assert_eq!(negated.children()[1].op(), ComparisonOp::Ne);
        assert_eq!(negated.negated_tree(), tree);
    }

    #[test]
    fn negating_nand_restores_conjunction() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Eq, 7);
        let nand = x.combine(&y, CombinationOp::Or).optimized_tree();
        let negated = nand.negated_tree();
        assert_eq!(negated.combination_op(), CombinationOp::And);
        assert_eq!(negated.children(), nand.children());
    }

    #[test]
    fn negation_swaps_set_membership() {
        let negated = set("s", ComparisonOp::In).negated_tree();
        assert_eq!(negated.op(), ComparisonOp::NotIn);
    }

    #[test]
    fn optimize_replaces_disjunction_with_nand() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Eq, 7);
        let z = leaf("z", ComparisonOp::Gt, 1);
        let tree = x
            .combine(&y, CombinationOp::Or)
            .combine(&z, CombinationOp::And);
        let optimized = tree.optimized_tree();
        assert_eq!(optimized.combination_op(), CombinationOp::And);
        let nand = &optimized.children()[0];
        assert_eq!(nand.combination_op(), CombinationOp::Nand);
        assert_eq!(nand.children()[0].op(), ComparisonOp::Ge);
        assert_eq!(nand.children()[1].op(), ComparisonOp::Ne);
        assert_eq!(optimized.children()[1], z);
    }

    #[test]
    fn optimize_leaves_value_nodes_alone() {
        assert_eq!(x_lt().optimized_tree(), x_lt());
    }

    #[test]
    fn field_names_are_distinct() {
        let tree = x_lt()
            .combine(&leaf("x", ComparisonOp::Gt, 1), CombinationOp::Or)
            .combine(&set("s", ComparisonOp::In), CombinationOp::And);
        let names = tree.field_names();
        assert_eq!(names.len(), 2);
        assert!(names.contains("x"));
        assert!(names.contains("s"));
    }

    #[test]
    fn backwards_compatibility() {
        let x = x_lt();
        let y = leaf("y", ComparisonOp::Eq, 7);
        assert!(x.is_backwards_compatible());
        assert!(x.combine(&y, CombinationOp::And).is_backwards_compatible());
        assert!(!x.combine(&y, CombinationOp::Or).is_backwards_compatible());
        assert!(!set("s", ComparisonOp::In).is_backwards_compatible());
        assert!(!x
            .combine(&set("s", ComparisonOp::NotIn), CombinationOp::And)
            .is_backwards_compatible());
        let nested = x
            .combine(&y, CombinationOp::Or)
            .combine(&x, CombinationOp::And);
        assert!(!nested.is_backwards_compatible());
    }

    #[test]
    fn clones_are_independent() {
        let tree = x_lt().combine(&set("s", ComparisonOp::In), CombinationOp::And);
        let mut copy = tree.clone();
        assert_eq!(copy.to_string(), tree.to_string());
        copy.set_use_enumeration(true);
        assert!(copy.children().iter().all(Node::use_enumeration));
        assert!(!tree.children().iter().any(Node::use_enumeration));
    }

    #[test]
    #[should_panic(expected = "children is not valid on a value node")]
    fn children_panics_on_leaf() {
        let _ = x_lt().children();
    }

    #[test]
    #[should_panic(expected = "field_name is not valid on an expression node")]
    fn field_name_panics_on_expression() {
        let tree = x_lt().combine(&x_lt(), CombinationOp::And);
        let _ = tree.field_name();
    }

    #[test]
    fn expression_construction_checks_shape() {
        assert_eq!(
            ExprNode::new(vec![x_lt()], CombinationOp::And),
            Err(ConstructionError::TooFewChildren(1))
        );
        assert_eq!(
            ExprNode::new(vec![x_lt(), x_lt()], CombinationOp::Not),
            Err(ConstructionError::UnsupportedCombinationOp(CombinationOp::Not))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bincode_preserves_tree() {
        let tree = x_lt()
            .combine(&set("s", ComparisonOp::NotIn), CombinationOp::Or)
            .optimized_tree();
        let bytes = bincode::serialize(&tree).expect("serialize");
        let decoded: Node = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(decoded, tree);
    }
}

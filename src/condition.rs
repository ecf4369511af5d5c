//! Query-level owner of an optional condition tree.

use std::collections::HashSet;

use once_cell::sync::OnceCell;

use crate::{
    error::{ConditionError, EvalError, RewriteError, ValidityError},
    eval::{evaluate, CellView},
    logging::qc_log,
    node::{Node, ValueNode},
    op::{CombinationOp, ComparisonOp},
    schema::Schema,
};

/// Filter attached to a read query.
///
/// A condition starts empty and is initialized once with a single leaf, or
/// built from an existing tree. Combining and negating produce new
/// conditions; the operands are never modified.
#[derive(Clone, Debug, Default)]
pub struct QueryCondition {
    tree: Option<Node>,
    field_names: OnceCell<HashSet<String>>,
}

impl QueryCondition {
    /// Creates an empty condition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the condition with `field op value`; `None` builds the null-check form.
    pub fn init(
        &mut self,
        field_name: impl Into<String>,
        value: Option<&[u8]>,
        op: ComparisonOp,
    ) -> Result<(), ConditionError> {
        if self.tree.is_some() {
            return Err(ConditionError::AlreadyInitialized);
        }
        let node = ValueNode::new(field_name, value, op)?;
        self.replace_tree(node.into());
        Ok(())
    }

    /// Initializes the condition with a set membership test.
    pub fn init_set(
        &mut self,
        field_name: impl Into<String>,
        data: &[u8],
        offsets: &[u8],
        op: ComparisonOp,
    ) -> Result<(), ConditionError> {
        if self.tree.is_some() {
            return Err(ConditionError::AlreadyInitialized);
        }
        let node = ValueNode::new_set(field_name, data, offsets, op)?;
        self.replace_tree(node.into());
        Ok(())
    }

    fn replace_tree(&mut self, tree: Node) {
        self.tree = Some(tree);
        self.field_names = OnceCell::new();
    }

    /// Returns true until the condition is initialized.
    #[must_use]
    pub fn empty(&self) -> bool {
        self.tree.is_none()
    }

    /// Root of the tree, if initialized.
    #[must_use]
    pub fn ast(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    /// Checks the tree against `schema`; an empty condition is always valid.
    pub fn check<S>(&self, schema: &S) -> Result<(), ValidityError>
    where
        S: Schema + ?Sized,
    {
        match &self.tree {
            Some(tree) => tree.check_node_validity(schema),
            None => Ok(()),
        }
    }

    /// Joins this condition and `rhs` under `AND` or `OR`.
    pub fn combine(
        &self,
        rhs: &QueryCondition,
        op: CombinationOp,
    ) -> Result<QueryCondition, ConditionError> {
        if !matches!(op, CombinationOp::And | CombinationOp::Or) {
            return Err(ConditionError::UnsupportedCombine(op));
        }
        let (Some(lhs_tree), Some(rhs_tree)) = (&self.tree, &rhs.tree) else {
            return Err(ConditionError::Empty("combine"));
        };
        let tree = lhs_tree.combine(rhs_tree, op);
        qc_log!(
            log::Level::Trace,
            "condition_combined",
            "op={} children={}",
            op,
            tree.children().len()
        );
        Ok(tree.into())
    }

    /// Returns the logical complement; only `NOT` is accepted.
    ///
    /// # Panics
    ///
    /// Panics when the tree has been enumeration rewritten into
    /// `ALWAYS_TRUE` / `ALWAYS_FALSE` leaves.
    pub fn negate(&self, op: CombinationOp) -> Result<QueryCondition, ConditionError> {
        if op != CombinationOp::Not {
            return Err(ConditionError::UnsupportedNegate(op));
        }
        let tree = self.tree.as_ref().ok_or(ConditionError::Empty("negate"))?;
        let negated = tree.negated_tree();
        qc_log!(
            log::Level::Trace,
            "condition_negated",
            "expr={}",
            negated.is_expr()
        );
        Ok(negated.into())
    }

    /// Distinct field names the condition references, computed once.
    pub fn field_names(&self) -> &HashSet<String> {
        self.field_names.get_or_init(|| {
            self.tree
                .as_ref()
                .map(Node::field_names)
                .unwrap_or_default()
        })
    }

    /// Sets the enumeration flag on every leaf.
    pub fn set_use_enumeration(&mut self, use_enumeration: bool) {
        if let Some(tree) = self.tree.as_mut() {
            tree.set_use_enumeration(use_enumeration);
        }
    }

    /// Maps enumeration literals to stored index values; the tree is unchanged on error.
    pub fn rewrite_enumeration_conditions<S>(&mut self, schema: &S) -> Result<(), RewriteError>
    where
        S: Schema + ?Sized,
    {
        match self.tree.as_mut() {
            Some(tree) => tree.rewrite_enumeration_conditions(schema),
            None => Ok(()),
        }
    }

    /// Returns true when legacy readers can consume the condition.
    #[must_use]
    pub fn is_backwards_compatible(&self) -> bool {
        self.tree
            .as_ref()
            .map_or(true, Node::is_backwards_compatible)
    }

    /// Returns an equivalent condition with every `OR` rewritten to `NAND`.
    #[must_use]
    pub fn optimized(&self) -> QueryCondition {
        match &self.tree {
            Some(tree) => tree.optimized_tree().into(),
            None => QueryCondition::new(),
        }
    }

    /// Returns whether one cell passes the filter; an empty condition passes every cell.
    pub fn evaluate<S, C>(&self, schema: &S, cell: &C) -> Result<bool, EvalError>
    where
        S: Schema + ?Sized,
        C: CellView + ?Sized,
    {
        match &self.tree {
            Some(tree) => evaluate(tree, schema, cell),
            None => Ok(true),
        }
    }
}

impl From<Node> for QueryCondition {
    fn from(tree: Node) -> Self {
        Self {
            tree: Some(tree),
            field_names: OnceCell::new(),
        }
    }
}

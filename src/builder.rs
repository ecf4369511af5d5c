//! Builder for composing query condition trees.

use crate::{
    error::ConstructionError,
    node::{Node, ValueNode},
    op::{CombinationOp, ComparisonOp},
};

/// Converts a typed literal into the bytes a value node stores.
///
/// Numbers use their native-endian representation, matching how cells are
/// laid out in memory.
pub trait IntoLiteral {
    /// Returns the literal bytes.
    fn into_literal(self) -> Vec<u8>;
}

macro_rules! impl_numeric_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoLiteral for $ty {
                fn into_literal(self) -> Vec<u8> {
                    self.to_ne_bytes().to_vec()
                }
            }
        )*
    };
}

impl_numeric_literal!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl IntoLiteral for bool {
    fn into_literal(self) -> Vec<u8> {
        vec![u8::from(self)]
    }
}

impl IntoLiteral for &str {
    fn into_literal(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl IntoLiteral for String {
    fn into_literal(self) -> Vec<u8> {
        self.into_bytes()
    }
}

impl IntoLiteral for &[u8] {
    fn into_literal(self) -> Vec<u8> {
        self.to_vec()
    }
}

impl IntoLiteral for Vec<u8> {
    fn into_literal(self) -> Vec<u8> {
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuilderCombine {
    Leaf,
    Conjunction,
    Disjunction,
}

/// Builder for composing query conditions incrementally.
///
/// Construction errors are deferred: the first one is reported by
/// [`NodeBuilder::build`].
#[derive(Debug)]
pub struct NodeBuilder {
    combine: BuilderCombine,
    clauses: Vec<Node>,
    use_enumeration: bool,
    error: Option<ConstructionError>,
}

impl NodeBuilder {
    const fn new(combine: BuilderCombine) -> Self {
        Self {
            combine,
            clauses: Vec::new(),
            use_enumeration: false,
            error: None,
        }
    }

    /// Creates a builder that expects a single clause.
    #[must_use]
    pub fn leaf() -> Self {
        Self::new(BuilderCombine::Leaf)
    }

    /// Creates a builder that emits an `AND` of all clauses.
    #[must_use]
    pub fn and() -> Self {
        Self::new(BuilderCombine::Conjunction)
    }

    /// Creates a builder that emits an `OR` of all clauses.
    #[must_use]
    pub fn or() -> Self {
        Self::new(BuilderCombine::Disjunction)
    }

    /// Flags every leaf added so far and later for enumeration rewriting.
    #[must_use]
    pub fn use_enumeration(mut self, use_enumeration: bool) -> Self {
        self.use_enumeration = use_enumeration;
        self
    }

    /// Adds an existing tree as a clause.
    #[must_use]
    pub fn node(mut self, node: Node) -> Self {
        self.clauses.push(node);
        self
    }

    /// Adds a comparison against a literal.
    #[must_use]
    pub fn compare<V>(self, field: impl Into<String>, op: ComparisonOp, value: V) -> Self
    where
        V: IntoLiteral,
    {
        let literal = value.into_literal();
        self.push(ValueNode::new(field, Some(literal.as_slice()), op))
    }

    /// Adds an `EQ` comparison.
    #[must_use]
    pub fn equals<V: IntoLiteral>(self, field: impl Into<String>, value: V) -> Self {
        self.compare(field, ComparisonOp::Eq, value)
    }

    /// Adds an `NE` comparison.
    #[must_use]
    pub fn not_equals<V: IntoLiteral>(self, field: impl Into<String>, value: V) -> Self {
        self.compare(field, ComparisonOp::Ne, value)
    }

    /// Adds an `LT` comparison.
    #[must_use]
    pub fn less_than<V: IntoLiteral>(self, field: impl Into<String>, value: V) -> Self {
        self.compare(field, ComparisonOp::Lt, value)
    }

    /// Adds an `LE` comparison.
    #[must_use]
    pub fn less_than_or_equal<V: IntoLiteral>(self, field: impl Into<String>, value: V) -> Self {
        self.compare(field, ComparisonOp::Le, value)
    }

    /// Adds a `GT` comparison.
    #[must_use]
    pub fn greater_than<V: IntoLiteral>(self, field: impl Into<String>, value: V) -> Self {
        self.compare(field, ComparisonOp::Gt, value)
    }

    /// Adds a `GE` comparison.
    #[must_use]
    pub fn greater_than_or_equal<V: IntoLiteral>(
        self,
        field: impl Into<String>,
        value: V,
    ) -> Self {
        self.compare(field, ComparisonOp::Ge, value)
    }

    /// Adds an `IS NULL` check.
    #[must_use]
    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.push(ValueNode::new(field, None, ComparisonOp::Eq))
    }

    /// Adds an `IS NOT NULL` check.
    #[must_use]
    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.push(ValueNode::new(field, None, ComparisonOp::Ne))
    }

    /// Adds an `IN` set membership test.
    #[must_use]
    pub fn in_set<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoLiteral,
    {
        self.push_set(field, ComparisonOp::In, values)
    }

    /// Adds a `NOT_IN` set membership test.
    #[must_use]
    pub fn not_in_set<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoLiteral,
    {
        self.push_set(field, ComparisonOp::NotIn, values)
    }

    fn branch<F>(mut self, combine: BuilderCombine, build: F) -> Self
    where
        F: FnOnce(NodeBuilder) -> NodeBuilder,
    {
        match build(NodeBuilder::new(combine)).build() {
            Ok(node) => self.clauses.push(node),
            Err(err) => self.record(err),
        }
        self
    }

    /// Adds a nested conjunction built by the supplied closure.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(NodeBuilder) -> NodeBuilder,
    {
        self.branch(BuilderCombine::Conjunction, build)
    }

    /// Adds a nested disjunction built by the supplied closure.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(NodeBuilder) -> NodeBuilder,
    {
        self.branch(BuilderCombine::Disjunction, build)
    }

    /// Adds the negation of a conjunction built by the supplied closure.
    #[must_use]
    pub fn not_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(NodeBuilder) -> NodeBuilder,
    {
        match build(NodeBuilder::and()).build() {
            Ok(node) => self.clauses.push(node.negated_tree()),
            Err(err) => self.record(err),
        }
        self
    }

    fn push_set<I, V>(self, field: impl Into<String>, op: ComparisonOp, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoLiteral,
    {
        let members: Vec<Vec<u8>> = values.into_iter().map(IntoLiteral::into_literal).collect();
        self.push(ValueNode::from_members(field, members, op))
    }

    fn push(mut self, leaf: Result<ValueNode, ConstructionError>) -> Self {
        match leaf {
            Ok(leaf) => self.clauses.push(leaf.into()),
            Err(err) => self.record(err),
        }
        self
    }

    fn record(&mut self, err: ConstructionError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Consumes the builder and returns the composed tree.
    ///
    /// # Panics
    ///
    /// Panics when no clause was added, or when a leaf builder holds more than one.
    pub fn build(self) -> Result<Node, ConstructionError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        assert!(
            !self.clauses.is_empty(),
            "NodeBuilder requires at least one clause"
        );
        let op = match self.combine {
            BuilderCombine::Leaf => {
                assert!(
                    self.clauses.len() == 1,
                    "NodeBuilder::leaf must contain exactly one clause"
                );
                None
            }
            BuilderCombine::Conjunction => Some(CombinationOp::And),
            BuilderCombine::Disjunction => Some(CombinationOp::Or),
        };

        let mut clauses = self.clauses.into_iter();
        let Some(mut root) = clauses.next() else {
            unreachable!("clauses checked non-empty");
        };
        if let Some(op) = op {
            for clause in clauses {
                root = root.combine(&clause, op);
            }
        }
        if self.use_enumeration {
            root.set_use_enumeration(true);
        }
        Ok(root)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::leaf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeValue;

    #[test]
    fn leaf_builder_emits_value_node() {
        let node = NodeBuilder::leaf()
            .less_than("x", 7u32)
            .build()
            .expect("leaf");
        assert_eq!(node.op(), ComparisonOp::Lt);
        assert_eq!(node.data().as_slice(), &7u32.to_ne_bytes());
    }

    #[test]
    fn and_builder_flattens_clauses() {
        let node = NodeBuilder::and()
            .greater_than("a", 1i32)
            .less_than_or_equal("b", 2.5f64)
            .is_not_null("c")
            .build()
            .expect("conjunction");
        assert_eq!(node.combination_op(), CombinationOp::And);
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.children()[2].value(), NodeValue::Null);
    }

    #[test]
    fn groups_nest_under_other_combinators() {
        let node = NodeBuilder::or()
            .equals("s", "foo")
            .and_group(|b| b.in_set("t", ["a", "b"]).not_equals("u", 0u8))
            .not_group(|b| b.greater_than_or_equal("v", 3i64))
            .build()
            .expect("disjunction");
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.children()[1].combination_op(), CombinationOp::And);
        assert_eq!(node.children()[2].op(), ComparisonOp::Lt);
    }

    #[test]
    fn construction_errors_surface_from_build() {
        let err = NodeBuilder::and()
            .equals("a", 1i32)
            .in_set("t", Vec::<&str>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, ConstructionError::EmptyData);

        let err = NodeBuilder::leaf()
            .compare("a", ComparisonOp::AlwaysTrue, 1i32)
            .build()
            .unwrap_err();
        assert_eq!(err, ConstructionError::InternalOp(ComparisonOp::AlwaysTrue));
    }

    #[test]
    fn enumeration_flag_applies_to_every_leaf() {
        let node = NodeBuilder::or()
            .equals("c", "red")
            .not_in_set("c", ["blue"])
            .use_enumeration(true)
            .build()
            .expect("disjunction");
        assert!(node.children().iter().all(Node::use_enumeration));
    }

    #[test]
    #[should_panic(expected = "NodeBuilder requires at least one clause")]
    fn leaf_builder_requires_clause() {
        let _ = NodeBuilder::leaf().build();
    }

    #[test]
    #[should_panic(expected = "NodeBuilder::leaf must contain exactly one clause")]
    fn leaf_builder_rejects_multiple_clauses() {
        let _ = NodeBuilder::leaf()
            .equals("a", 1i32)
            .equals("a", 2i32)
            .build();
    }

    #[test]
    #[should_panic(expected = "NodeBuilder requires at least one clause")]
    fn and_builder_requires_clause() {
        let _ = NodeBuilder::and().build();
    }
}

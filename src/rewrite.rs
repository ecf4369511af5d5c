//! Maps enumeration literals in a tree to the index values stored in attributes.
//!
//! Conditions on enumerated attributes are written against the enumeration's
//! values (`color = "red"`), but cells store the value's position in the
//! enumeration. Rewriting swaps every flagged literal for its index, cast to
//! the attribute's integral datatype. Literals absent from the enumeration
//! collapse to `ALWAYS_FALSE` (or `ALWAYS_TRUE` for `NE`), and absent set
//! members are dropped.

use crate::{
    byte_value::ByteValue,
    error::RewriteError,
    logging::{qc_log, LogScope},
    node::{Node, ValueNode},
    op::ComparisonOp,
    schema::Schema,
};

const REWRITE_LOG: LogScope = LogScope::new("enumeration_rewriter");

/// Rewrites trees against one schema.
pub struct EnumerationRewriter<'a, S: Schema + ?Sized> {
    schema: &'a S,
}

impl<'a, S: Schema + ?Sized> EnumerationRewriter<'a, S> {
    /// Creates a rewriter for `schema`.
    #[must_use]
    pub fn new(schema: &'a S) -> Self {
        Self { schema }
    }

    /// Rewrites every flagged leaf under `node`.
    ///
    /// Leaves that are unflagged, null, or on fields without an enumeration
    /// are left untouched. Rewritten leaves have their flag cleared, so a
    /// second pass is a no-op. On error `node` is unchanged.
    pub fn rewrite(&self, node: &mut Node) -> Result<(), RewriteError> {
        let mut rewritten = node.clone();
        self.rewrite_node(&mut rewritten)?;
        *node = rewritten;
        Ok(())
    }

    fn rewrite_node(&self, node: &mut Node) -> Result<(), RewriteError> {
        match node {
            Node::Value(value) => self.rewrite_value(value),
            Node::Expr(expr) => expr
                .children_mut()
                .iter_mut()
                .try_for_each(|child| self.rewrite_node(child)),
        }
    }

    fn rewrite_value(&self, node: &mut ValueNode) -> Result<(), RewriteError> {
        if !node.use_enumeration() || node.is_null() {
            return Ok(());
        }
        let Some(field) = self
            .schema
            .field(node.field_name())
            .filter(|field| field.is_attribute())
        else {
            return Ok(());
        };
        let Some(enumeration_name) = field.enumeration_name() else {
            return Ok(());
        };
        let enumeration = self.schema.enumeration(enumeration_name).ok_or_else(|| {
            RewriteError::EnumerationNotLoaded {
                field: field.name().to_string(),
                enumeration: enumeration_name.to_string(),
            }
        })?;

        let op = node.op();
        if op.is_ordering() && !enumeration.ordered() {
            return Err(RewriteError::UnorderedInequality {
                field: field.name().to_string(),
                enumeration: enumeration_name.to_string(),
                op,
            });
        }

        let datatype = field.datatype();
        let cast = |index: u64| {
            ByteValue::from_index(index, datatype).map_err(|source| RewriteError::IndexCast {
                field: field.name().to_string(),
                source,
            })
        };

        if op.is_set_membership() {
            let mut data = ByteValue::new();
            let mut offsets = ByteValue::new();
            let mut total = 0usize;
            for member in node.members() {
                total += 1;
                if let Some(index) = enumeration.index_of(member) {
                    offsets.push_offset(data.len() as u64);
                    data.extend_from_slice(cast(index)?.as_slice());
                }
            }
            let kept = offsets.offsets().count();
            qc_log!(
                log::Level::Debug,
                scope: REWRITE_LOG,
                "enumeration_rewrite",
                "field={} enumeration={} op={} members={} kept={}",
                field.name(),
                enumeration_name,
                op,
                total,
                kept
            );
            node.replace_members(data, offsets);
        } else {
            match enumeration.index_of(node.data().as_slice()) {
                Some(index) => {
                    qc_log!(
                        log::Level::Debug,
                        scope: REWRITE_LOG,
                        "enumeration_rewrite",
                        "field={} enumeration={} op={} index={}",
                        field.name(),
                        enumeration_name,
                        op,
                        index
                    );
                    node.replace_literal(op, cast(index)?);
                }
                None => {
                    let sentinel = if op == ComparisonOp::Ne {
                        ComparisonOp::AlwaysTrue
                    } else {
                        ComparisonOp::AlwaysFalse
                    };
                    let width = field.cell_size().unwrap_or_else(|| datatype.size());
                    qc_log!(
                        log::Level::Debug,
                        scope: REWRITE_LOG,
                        "enumeration_rewrite_missing_value",
                        "field={} enumeration={} op={} rewritten={}",
                        field.name(),
                        enumeration_name,
                        op,
                        sentinel
                    );
                    node.replace_literal(sentinel, ByteValue::zeroed(width as usize));
                }
            }
        }

        node.set_use_enumeration(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        datatype::Datatype,
        error::CastError,
        node::NodeValue,
        op::CombinationOp,
        schema::{ArraySchema, Enumeration, Field},
    };

    fn schema() -> ArraySchema {
        let fruit = Enumeration::from_strings("fruit", false, ["a", "b"]).expect("enumeration");
        let sizes =
            Enumeration::from_strings("sizes", true, ["small", "medium", "large"]).expect("sizes");
        let wide = Enumeration::from_strings("wide", false, (0..300).map(|i| format!("v{i}")))
            .expect("wide");
        ArraySchema::new()
            .with_field(Field::dimension("d", Datatype::Int64))
            .and_then(|s| {
                s.with_field(Field::attribute("f", Datatype::Int32).with_enumeration("fruit"))
            })
            .and_then(|s| {
                s.with_field(Field::attribute("z", Datatype::UInt8).with_enumeration("sizes"))
            })
            .and_then(|s| {
                s.with_field(Field::attribute("w", Datatype::Int8).with_enumeration("wide"))
            })
            .and_then(|s| {
                s.with_field(Field::attribute("x", Datatype::UInt8).with_enumeration("gone"))
            })
            .and_then(|s| s.with_field(Field::attribute("p", Datatype::StringAscii).var_sized()))
            .and_then(|s| s.with_enumeration(fruit))
            .and_then(|s| s.with_enumeration(sizes))
            .and_then(|s| s.with_enumeration(wide))
            .expect("schema")
    }

    fn enumerated(field: &str, literal: &str, op: ComparisonOp) -> Node {
        ValueNode::new(field, Some(literal.as_bytes()), op)
            .expect("leaf")
            .with_enumeration(true)
            .into()
    }

    fn rewrite(node: &mut Node) -> Result<(), RewriteError> {
        EnumerationRewriter::new(&schema()).rewrite(node)
    }

    #[test]
    fn literal_becomes_index() {
        let mut node = enumerated("f", "b", ComparisonOp::Eq);
        rewrite(&mut node).expect("rewrite");
        assert_eq!(node.op(), ComparisonOp::Eq);
        assert_eq!(node.data().as_slice(), &1i32.to_ne_bytes());
        assert!(!node.use_enumeration());
    }

    #[test]
    fn missing_literal_becomes_sentinel() {
        let mut eq = enumerated("f", "zz", ComparisonOp::Eq);
        rewrite(&mut eq).expect("rewrite");
        assert_eq!(eq.op(), ComparisonOp::AlwaysFalse);
        assert_eq!(eq.data().as_slice(), &[0, 0, 0, 0]);

        let mut ne = enumerated("f", "zz", ComparisonOp::Ne);
        rewrite(&mut ne).expect("rewrite");
        assert_eq!(ne.op(), ComparisonOp::AlwaysTrue);

        let mut lt = enumerated("z", "huge", ComparisonOp::Lt);
        rewrite(&mut lt).expect("rewrite");
        assert_eq!(lt.op(), ComparisonOp::AlwaysFalse);
        assert_eq!(lt.data().len(), 1);
    }

    #[test]
    fn set_members_are_mapped_and_unknown_dropped() {
        let mut node: Node = ValueNode::from_members("f", ["a", "b", "c"], ComparisonOp::In)
            .expect("set")
            .with_enumeration(true)
            .into();
        rewrite(&mut node).expect("rewrite");
        let NodeValue::Members(members) = node.value() else {
            panic!("expected members");
        };
        assert_eq!(members.len(), 2);
        assert!(members.contains(&0i32.to_ne_bytes()[..]));
        assert!(members.contains(&1i32.to_ne_bytes()[..]));
        assert_eq!(node.offsets().offsets().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[test]
    fn set_with_no_known_members_becomes_empty() {
        let mut node: Node = ValueNode::from_members("f", ["q"], ComparisonOp::NotIn)
            .expect("set")
            .with_enumeration(true)
            .into();
        rewrite(&mut node).expect("rewrite");
        assert!(node.data().is_empty());
        assert!(node.offsets().is_empty());
        assert_eq!(node.op(), ComparisonOp::NotIn);
    }

    #[test]
    fn ordering_requires_ordered_enumeration() {
        let mut node = enumerated("f", "a", ComparisonOp::Lt);
        assert_eq!(
            rewrite(&mut node),
            Err(RewriteError::UnorderedInequality {
                field: "f".to_string(),
                enumeration: "fruit".to_string(),
                op: ComparisonOp::Lt
            })
        );

        let mut ordered = enumerated("z", "medium", ComparisonOp::Ge);
        rewrite(&mut ordered).expect("ordered rewrite");
        assert_eq!(ordered.data().as_slice(), &[1]);
    }

    #[test]
    fn unloaded_enumeration_fails() {
        let mut node = enumerated("x", "a", ComparisonOp::Eq);
        assert_eq!(
            rewrite(&mut node),
            Err(RewriteError::EnumerationNotLoaded {
                field: "x".to_string(),
                enumeration: "gone".to_string()
            })
        );
    }

    #[test]
    fn index_out_of_range_fails() {
        let mut node = enumerated("w", "v200", ComparisonOp::Eq);
        assert_eq!(
            rewrite(&mut node),
            Err(RewriteError::IndexCast {
                field: "w".to_string(),
                source: CastError::OutOfRange {
                    index: 200,
                    datatype: Datatype::Int8
                }
            })
        );
    }

    #[test]
    fn unflagged_and_plain_fields_are_untouched() {
        let mut unflagged: Node = ValueNode::new("f", Some(b"a"), ComparisonOp::Eq)
            .expect("leaf")
            .into();
        let before = unflagged.clone();
        rewrite(&mut unflagged).expect("rewrite");
        assert_eq!(unflagged, before);

        let mut plain = enumerated("p", "a", ComparisonOp::Eq);
        rewrite(&mut plain).expect("rewrite");
        assert_eq!(plain.data().as_slice(), b"a");
        assert!(plain.use_enumeration());

        let mut null: Node = ValueNode::new("f", None, ComparisonOp::Eq)
            .expect("leaf")
            .with_enumeration(true)
            .into();
        rewrite(&mut null).expect("rewrite");
        assert!(null.use_enumeration());
    }

    #[test]
    fn rewrite_recurses_and_is_idempotent() {
        let mut tree = enumerated("f", "a", ComparisonOp::Eq)
            .combine(&enumerated("f", "zz", ComparisonOp::Ne), CombinationOp::Or)
            .combine(&enumerated("z", "large", ComparisonOp::Le), CombinationOp::And);
        rewrite(&mut tree).expect("rewrite");
        let once = tree.clone();
        rewrite(&mut tree).expect("second rewrite");
        assert_eq!(tree, once);

        let or = &tree.children()[0];
        assert_eq!(or.children()[0].data().as_slice(), &0i32.to_ne_bytes());
        assert_eq!(or.children()[1].op(), ComparisonOp::AlwaysTrue);
        assert_eq!(tree.children()[1].data().as_slice(), &[2]);
    }

    #[test]
    fn failed_rewrite_leaves_tree_unchanged() {
        let mut tree = enumerated("f", "a", ComparisonOp::Eq)
            .combine(&enumerated("f", "a", ComparisonOp::Lt), CombinationOp::And);
        let before = tree.clone();
        assert!(matches!(
            rewrite(&mut tree),
            Err(RewriteError::UnorderedInequality { .. })
        ));
        assert_eq!(tree, before);
        assert!(tree.children().iter().all(Node::use_enumeration));
    }
}

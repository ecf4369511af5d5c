//! Evaluates a rewritten tree against the field values of a single cell.

use std::{
    cmp::Ordering,
    collections::HashMap,
    hash::BuildHasher,
    mem::size_of,
};

use crate::{
    datatype::Datatype,
    error::EvalError,
    node::{ExprNode, Node, ValueNode},
    op::{CombinationOp, ComparisonOp},
    schema::{Field, Schema},
};

/// Read access to one cell's values.
pub trait CellView {
    /// Returns the value stored for `field`: `Some(None)` for a null cell,
    /// `None` when the cell has no such field.
    fn value(&self, field: &str) -> Option<Option<&[u8]>>;
}

impl<H: BuildHasher> CellView for HashMap<String, Option<Vec<u8>>, H> {
    fn value(&self, field: &str) -> Option<Option<&[u8]>> {
        self.get(field).map(Option::as_deref)
    }
}

/// Returns whether the cell satisfies `node`.
///
/// `AND`, `OR` and `NAND` short-circuit over their children in order. Leaves
/// still flagged for enumeration rewriting on an enumerated attribute are
/// rejected, since their literals are not comparable to stored indices.
pub fn evaluate<S, C>(node: &Node, schema: &S, cell: &C) -> Result<bool, EvalError>
where
    S: Schema + ?Sized,
    C: CellView + ?Sized,
{
    match node {
        Node::Value(value) => evaluate_value(value, schema, cell),
        Node::Expr(expr) => evaluate_expr(expr, schema, cell),
    }
}

fn evaluate_expr<S, C>(expr: &ExprNode, schema: &S, cell: &C) -> Result<bool, EvalError>
where
    S: Schema + ?Sized,
    C: CellView + ?Sized,
{
    match expr.combination_op() {
        CombinationOp::And => {
            for child in expr.children() {
                if !evaluate(child, schema, cell)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        CombinationOp::Or => {
            for child in expr.children() {
                if evaluate(child, schema, cell)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        CombinationOp::Nand => {
            for child in expr.children() {
                if !evaluate(child, schema, cell)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        CombinationOp::Not => unreachable!("NOT is never stored on an expression"),
    }
}

fn evaluate_value<S, C>(node: &ValueNode, schema: &S, cell: &C) -> Result<bool, EvalError>
where
    S: Schema + ?Sized,
    C: CellView + ?Sized,
{
    let name = node.field_name();
    let field = schema
        .field(name)
        .ok_or_else(|| EvalError::UnknownField(name.to_string()))?;
    let pending = node.use_enumeration() && !node.is_null() && field.is_attribute();
    if pending && field.enumeration_name().is_some() {
        return Err(EvalError::PendingEnumerationRewrite(name.to_string()));
    }
    let op = node.op();
    match op {
        ComparisonOp::AlwaysTrue => return Ok(true),
        ComparisonOp::AlwaysFalse => return Ok(false),
        _ => {}
    }

    let value = cell
        .value(name)
        .ok_or_else(|| EvalError::UnknownField(name.to_string()))?;

    if node.is_null() {
        return Ok(match op {
            ComparisonOp::Eq => value.is_none(),
            ComparisonOp::Ne => value.is_some(),
            _ => false,
        });
    }
    // A null cell only matches the null literal forms handled above.
    let Some(value) = value else {
        return Ok(false);
    };

    if field.datatype().is_unsupported_in_conditions() {
        return Err(EvalError::UnsupportedDatatype {
            field: name.to_string(),
            datatype: field.datatype(),
        });
    }

    if op.is_set_membership() {
        let found = node.members().iter().any(|member| *member == value);
        return Ok(found == (op == ComparisonOp::In));
    }

    match ordering(field, value, node.data().as_slice())? {
        Some(ordering) => Ok(op.test_ordering(ordering)),
        // Unordered floats (NaN) are only ever unequal.
        None => Ok(op == ComparisonOp::Ne),
    }
}

/// Orders `value` relative to `literal` as the field's datatype.
fn ordering(field: &Field, value: &[u8], literal: &[u8]) -> Result<Option<Ordering>, EvalError> {
    let datatype = field.datatype();
    if datatype.is_byte_string() || field.var_size() || field.cell_size() != Some(datatype.size()) {
        return Ok(Some(value.cmp(literal)));
    }

    let size_error = |actual: usize| EvalError::CellSize {
        field: field.name().to_string(),
        expected: datatype.size(),
        actual,
    };

    macro_rules! compare_as {
        ($ty:ty) => {{
            const WIDTH: usize = size_of::<$ty>();
            let value = <[u8; WIDTH]>::try_from(value).map_err(|_| size_error(value.len()))?;
            let literal =
                <[u8; WIDTH]>::try_from(literal).map_err(|_| size_error(literal.len()))?;
            <$ty>::from_ne_bytes(value).partial_cmp(&<$ty>::from_ne_bytes(literal))
        }};
    }

    let ordering = match datatype {
        Datatype::Int8 => compare_as!(i8),
        Datatype::UInt8 | Datatype::Bool => compare_as!(u8),
        Datatype::Int16 => compare_as!(i16),
        Datatype::UInt16 => compare_as!(u16),
        Datatype::Int32 => compare_as!(i32),
        Datatype::UInt32 => compare_as!(u32),
        Datatype::Int64 | Datatype::Datetime(_) | Datatype::Time(_) => compare_as!(i64),
        Datatype::UInt64 => compare_as!(u64),
        Datatype::Float32 => compare_as!(f32),
        Datatype::Float64 => compare_as!(f64),
        other => {
            return Err(EvalError::UnsupportedDatatype {
                field: field.name().to_string(),
                datatype: other,
            })
        }
    };
    Ok(ordering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        datatype::TimeUnit,
        schema::{ArraySchema, Enumeration},
    };

    fn schema() -> ArraySchema {
        let colors = Enumeration::from_strings("colors", false, ["red"]).expect("enumeration");
        ArraySchema::new()
            .with_field(Field::dimension("d", Datatype::Int32))
            .and_then(|s| {
                s.with_field(Field::attribute("f", Datatype::Float64).with_nullable(true))
            })
            .and_then(|s| s.with_field(Field::attribute("s", Datatype::StringUtf8).var_sized()))
            .and_then(|s| s.with_field(Field::attribute("t", Datatype::Datetime(TimeUnit::Day))))
            .and_then(|s| {
                s.with_field(Field::attribute("c", Datatype::UInt8).with_enumeration("colors"))
            })
            .and_then(|s| s.with_enumeration(colors))
            .expect("schema")
    }

    fn cell(d: i32, f: Option<f64>, s: &str) -> HashMap<String, Option<Vec<u8>>> {
        HashMap::from([
            ("d".to_string(), Some(d.to_ne_bytes().to_vec())),
            ("f".to_string(), f.map(|v| v.to_ne_bytes().to_vec())),
            ("s".to_string(), Some(s.as_bytes().to_vec())),
            ("t".to_string(), Some(19_000i64.to_ne_bytes().to_vec())),
            ("c".to_string(), Some(vec![0])),
        ])
    }

    fn leaf(field: &str, value: Option<&[u8]>, op: ComparisonOp) -> Node {
        ValueNode::new(field, value, op).expect("leaf").into()
    }

    fn eval(node: &Node, cell: &HashMap<String, Option<Vec<u8>>>) -> bool {
        evaluate(node, &schema(), cell).expect("evaluate")
    }

    #[test]
    fn numeric_comparisons() {
        let row = cell(5, Some(1.5), "abc");
        assert!(eval(&leaf("d", Some(&7i32.to_ne_bytes()), ComparisonOp::Lt), &row));
        assert!(!eval(&leaf("d", Some(&(-7i32).to_ne_bytes()), ComparisonOp::Le), &row));
        assert!(eval(&leaf("f", Some(&1.5f64.to_ne_bytes()), ComparisonOp::Eq), &row));
        assert!(eval(&leaf("t", Some(&18_999i64.to_ne_bytes()), ComparisonOp::Gt), &row));
    }

    #[test]
    fn string_comparisons_are_bytewise_then_by_length() {
        let row = cell(0, None, "abc");
        assert!(eval(&leaf("s", Some(b"abd"), ComparisonOp::Lt), &row));
        assert!(eval(&leaf("s", Some(b"ab"), ComparisonOp::Gt), &row));
        assert!(eval(&leaf("s", Some(b"abc"), ComparisonOp::Ge), &row));
        assert!(eval(&leaf("s", Some(b""), ComparisonOp::Ne), &row));
    }

    #[test]
    fn null_semantics() {
        let null_row = cell(0, None, "");
        let row = cell(0, Some(2.0), "");
        let is_null = leaf("f", None, ComparisonOp::Eq);
        let not_null = leaf("f", None, ComparisonOp::Ne);
        assert!(eval(&is_null, &null_row));
        assert!(!eval(&is_null, &row));
        assert!(eval(&not_null, &row));
        assert!(!eval(&not_null, &null_row));

        let two = 2.0f64.to_ne_bytes();
        assert!(!eval(&leaf("f", Some(&two), ComparisonOp::Ne), &null_row));
        assert!(!eval(&leaf("f", Some(&two), ComparisonOp::Eq), &null_row));
        assert!(!eval(&leaf("f", Some(&two), ComparisonOp::Lt), &null_row));
    }

    #[test]
    fn set_membership() {
        let row = cell(0, None, "bar");
        let in_set: Node = ValueNode::from_members("s", ["foo", "bar"], ComparisonOp::In)
            .expect("set")
            .into();
        assert!(eval(&in_set, &row));
        assert!(!eval(&in_set.negated_tree(), &row));
        assert!(eval(&in_set.negated_tree(), &cell(0, None, "baz")));
    }

    #[test]
    fn combinators_short_circuit() {
        let row = cell(5, Some(1.0), "abc");
        let yes = leaf("d", Some(&5i32.to_ne_bytes()), ComparisonOp::Eq);
        let no = leaf("d", Some(&6i32.to_ne_bytes()), ComparisonOp::Eq);
        // Unknown fields fail, so reaching them would surface an error.
        let unknown = leaf("zz", Some(&[0]), ComparisonOp::Eq);

        assert!(!eval(&no.combine(&unknown, CombinationOp::And), &row));
        assert!(eval(&yes.combine(&unknown, CombinationOp::Or), &row));
        assert!(eval(&no.combine(&unknown, CombinationOp::Nand), &row));
        assert!(!eval(&yes.combine(&yes, CombinationOp::Nand), &row));
    }

    #[test]
    fn optimized_tree_evaluates_identically() {
        let row = cell(5, Some(1.0), "abc");
        let tree = leaf("d", Some(&9i32.to_ne_bytes()), ComparisonOp::Gt)
            .combine(&leaf("s", Some(b"abc"), ComparisonOp::Eq), CombinationOp::Or)
            .combine(&leaf("f", None, ComparisonOp::Ne), CombinationOp::And);
        assert!(eval(&tree, &row));
        assert!(eval(&tree.optimized_tree(), &row));
        assert!(!eval(&tree.negated_tree(), &row));
    }

    #[test]
    fn errors() {
        let row = cell(5, None, "");
        let schema = schema();
        assert_eq!(
            evaluate(&leaf("zz", Some(&[0]), ComparisonOp::Eq), &schema, &row),
            Err(EvalError::UnknownField("zz".to_string()))
        );
        let pending: Node = ValueNode::new("c", Some(b"red"), ComparisonOp::Eq)
            .expect("leaf")
            .with_enumeration(true)
            .into();
        assert_eq!(
            evaluate(&pending, &schema, &row),
            Err(EvalError::PendingEnumerationRewrite("c".to_string()))
        );
        let mut rewritten = pending.clone();
        rewritten
            .rewrite_enumeration_conditions(&schema)
            .expect("rewrite");
        assert_eq!(evaluate(&rewritten, &schema, &row), Ok(true));

        assert_eq!(
            evaluate(&leaf("d", Some(&[1, 2]), ComparisonOp::Lt), &schema, &row),
            Err(EvalError::CellSize {
                field: "d".to_string(),
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn constant_leaves_ignore_cell_contents() {
        let schema = schema();
        let empty = HashMap::<String, Option<Vec<u8>>>::new();
        let mut missing: Node = ValueNode::new("c", Some(b"zz"), ComparisonOp::Ne)
            .expect("leaf")
            .with_enumeration(true)
            .into();
        missing
            .rewrite_enumeration_conditions(&schema)
            .expect("rewrite");
        assert_eq!(missing.op(), ComparisonOp::AlwaysTrue);
        assert_eq!(evaluate(&missing, &schema, &empty), Ok(true));

        let mut absent: Node = ValueNode::new("c", Some(b"zz"), ComparisonOp::Eq)
            .expect("leaf")
            .with_enumeration(true)
            .into();
        absent
            .rewrite_enumeration_conditions(&schema)
            .expect("rewrite");
        assert_eq!(evaluate(&absent, &schema, &empty), Ok(false));
    }
}

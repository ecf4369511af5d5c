//! Schema validity checks for query condition trees.

use crate::{
    datatype::Datatype,
    error::ValidityError,
    logging::qc_log,
    node::{ExprNode, Node, ValueNode},
    op::ComparisonOp,
    schema::{CellValNum, Field, Schema},
};

/// Value type a leaf literal is compared as.
///
/// Leaves that still reference an enumeration compare against the
/// enumeration's values rather than the attribute's stored indices.
#[derive(Clone, Copy, Debug)]
struct LiteralType {
    datatype: Datatype,
    cell_val_num: CellValNum,
    enumerated: bool,
}

impl LiteralType {
    fn cell_size(self) -> Option<u64> {
        match self.cell_val_num {
            CellValNum::Fixed(n) => Some(self.datatype.size() * u64::from(n)),
            CellValNum::Var => None,
        }
    }
}

/// Checks trees against one schema, stopping at the first violation.
pub struct SchemaValidator<'a, S: Schema + ?Sized> {
    schema: &'a S,
}

impl<'a, S: Schema + ?Sized> SchemaValidator<'a, S> {
    /// Creates a validator for `schema`.
    #[must_use]
    pub fn new(schema: &'a S) -> Self {
        Self { schema }
    }

    /// Checks `node` and every descendant.
    pub fn check(&self, node: &Node) -> Result<(), ValidityError> {
        match node {
            Node::Value(value) => self.check_value(value).map_err(|err| {
                qc_log!(
                    log::Level::Debug,
                    "validity_failed",
                    "field={} op={} reason=\"{}\"",
                    value.field_name(),
                    value.op(),
                    err
                );
                err
            }),
            Node::Expr(expr) => self.check_expr(expr),
        }
    }

    fn check_expr(&self, expr: &ExprNode) -> Result<(), ValidityError> {
        if expr.children().len() < 2 {
            return Err(ValidityError::TooFewChildren(expr.children().len()));
        }
        expr.children().iter().try_for_each(|child| self.check(child))
    }

    fn literal_type(&self, node: &ValueNode, field: &Field) -> Result<LiteralType, ValidityError> {
        let enumeration = match field.enumeration_name() {
            Some(name) if node.use_enumeration() && field.is_attribute() => name,
            _ => {
                return Ok(LiteralType {
                    datatype: field.datatype(),
                    cell_val_num: field.cell_val_num(),
                    enumerated: false,
                })
            }
        };
        let enumeration = self.schema.enumeration(enumeration).ok_or_else(|| {
            ValidityError::EnumerationNotLoaded {
                field: field.name().to_string(),
                enumeration: enumeration.to_string(),
            }
        })?;
        Ok(LiteralType {
            datatype: enumeration.datatype(),
            cell_val_num: enumeration.cell_val_num(),
            enumerated: true,
        })
    }

    fn check_value(&self, node: &ValueNode) -> Result<(), ValidityError> {
        let field_name = node.field_name();
        let field = self
            .schema
            .field(field_name)
            .ok_or_else(|| ValidityError::UnknownField(field_name.to_string()))?;
        let literal = self.literal_type(node, field)?;
        let is_string = literal.datatype.is_byte_string();
        let op = node.op();

        if node.is_null() {
            if !matches!(op, ComparisonOp::Eq | ComparisonOp::Ne) {
                return Err(ValidityError::NullWithNonEqualityOp {
                    field: field_name.to_string(),
                    op,
                });
            }
            if !field.nullable() && !is_string {
                return Err(ValidityError::NullOnNonNullable(field_name.to_string()));
            }
        }

        let var_size = literal.cell_val_num.is_var();
        if var_size && !is_string && !node.is_null() {
            return Err(ValidityError::VarSizedNonString(field_name.to_string()));
        }

        if !var_size && !is_string && literal.cell_val_num != CellValNum::SINGLE {
            return Err(ValidityError::MultiValueNonString(field_name.to_string()));
        }

        let cell_size = literal.cell_size();
        if let Some(expected) = cell_size {
            let exempt =
                (field.nullable() && node.is_null()) || is_string || op.is_set_membership();
            let actual = node.data().len() as u64;
            if !exempt && actual != expected {
                return Err(ValidityError::ValueSizeMismatch {
                    field: field_name.to_string(),
                    expected,
                    actual,
                });
            }

            if op.is_set_membership() && !literal.enumerated {
                if let Some(member) = node.members().iter().find(|m| m.len() as u64 != expected) {
                    return Err(ValidityError::SetMemberSizeMismatch {
                        field: field_name.to_string(),
                        expected,
                        actual: member.len() as u64,
                    });
                }
            }
        }

        if field.datatype().is_unsupported_in_conditions() {
            return Err(ValidityError::UnsupportedDatatype {
                field: field_name.to_string(),
                datatype: field.datatype(),
            });
        }
        Ok(())
    }
}

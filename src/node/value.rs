use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    byte_value::{check_offsets, split_members, ByteValue, OFFSET_WIDTH},
    error::ConstructionError,
    op::ComparisonOp,
};

/// Literal carried by a value node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeValue<'a> {
    /// `IS NULL` / `IS NOT NULL` forms carry no literal.
    Null,
    /// Single literal; empty literals are an empty slice.
    Bytes(&'a [u8]),
    /// Members of an `IN` / `NOT_IN` set.
    Members(HashSet<&'a [u8]>),
}

/// Leaf predicate: `field op value`, `field IN {values}`, or `field IS [NOT] NULL`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "ValueNodeRepr", into = "ValueNodeRepr")
)]
pub struct ValueNode {
    field_name: String,
    op: ComparisonOp,
    is_null: bool,
    data: ByteValue,
    offsets: ByteValue,
    use_enumeration: bool,
}

impl ValueNode {
    /// Creates a single-value predicate; `None` builds the null-check form.
    ///
    /// Set membership needs [`ValueNode::new_set`]; the rewritten sentinels cannot be built here.
    pub fn new(
        field_name: impl Into<String>,
        value: Option<&[u8]>,
        op: ComparisonOp,
    ) -> Result<Self, ConstructionError> {
        if op.is_internal() {
            return Err(ConstructionError::InternalOp(op));
        }
        if op.is_set_membership() {
            return Err(ConstructionError::MissingOffsets(op));
        }
        Ok(Self {
            field_name: field_name.into(),
            op,
            is_null: value.is_none(),
            data: value.map(ByteValue::from).unwrap_or_default(),
            offsets: ByteValue::new(),
            use_enumeration: false,
        })
    }

    /// Creates a set membership predicate from concatenated member bytes and
    /// native-endian `u64` offsets.
    pub fn new_set(
        field_name: impl Into<String>,
        data: &[u8],
        offsets: &[u8],
        op: ComparisonOp,
    ) -> Result<Self, ConstructionError> {
        if op.is_internal() {
            return Err(ConstructionError::InternalOp(op));
        }
        if !op.is_set_membership() {
            return Err(ConstructionError::UnexpectedOffsets(op));
        }
        if data.is_empty() {
            return Err(ConstructionError::EmptyData);
        }
        if offsets.is_empty() {
            return Err(ConstructionError::EmptyOffsets);
        }
        if offsets.len() % OFFSET_WIDTH != 0 {
            return Err(ConstructionError::OffsetsSize(offsets.len()));
        }
        let offsets = ByteValue::from(offsets);
        check_offsets(data.len(), offsets.offsets())?;
        Ok(Self {
            field_name: field_name.into(),
            op,
            is_null: false,
            data: ByteValue::from(data),
            offsets,
            use_enumeration: false,
        })
    }

    /// Creates a set membership predicate from individual members.
    pub fn from_members<I, M>(
        field_name: impl Into<String>,
        members: I,
        op: ComparisonOp,
    ) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[u8]>,
    {
        let mut data = ByteValue::new();
        let mut offsets = ByteValue::new();
        for member in members {
            offsets.push_offset(data.len() as u64);
            data.extend_from_slice(member.as_ref());
        }
        Self::new_set(field_name, data.as_slice(), offsets.as_slice(), op)
    }

    /// Sets whether literals must be mapped through an enumeration.
    #[must_use]
    pub fn with_enumeration(mut self, use_enumeration: bool) -> Self {
        self.use_enumeration = use_enumeration;
        self
    }

    /// Field the predicate applies to.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Comparison operator.
    #[must_use]
    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    /// Returns true for the `IS NULL` / `IS NOT NULL` forms.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Literal bytes, or concatenated member bytes for set membership.
    #[must_use]
    pub fn data(&self) -> &ByteValue {
        &self.data
    }

    /// Member offsets; empty unless the operator is `IN` or `NOT_IN`.
    #[must_use]
    pub fn offsets(&self) -> &ByteValue {
        &self.offsets
    }

    /// Returns true when literals still have to be mapped through an enumeration.
    #[must_use]
    pub fn use_enumeration(&self) -> bool {
        self.use_enumeration
    }

    /// Sets the enumeration flag.
    pub fn set_use_enumeration(&mut self, use_enumeration: bool) {
        self.use_enumeration = use_enumeration;
    }

    /// Returns the literal in the shape matching the operator.
    #[must_use]
    pub fn value(&self) -> NodeValue<'_> {
        if self.op.is_set_membership() {
            NodeValue::Members(self.members().into_iter().collect())
        } else if self.is_null {
            NodeValue::Null
        } else {
            NodeValue::Bytes(self.data.as_slice())
        }
    }

    /// Set members in offset order; empty for single-value operators.
    #[must_use]
    pub fn members(&self) -> Vec<&[u8]> {
        let offsets: Vec<u64> = self.offsets.offsets().collect();
        split_members(self.data.as_slice(), &offsets)
    }

    /// Returns false only for set membership, which legacy consumers cannot interpret.
    #[must_use]
    pub fn is_backwards_compatible(&self) -> bool {
        !self.op.is_set_membership()
    }

    /// Copy of this node with the operator negated.
    ///
    /// # Panics
    ///
    /// Panics on `ALWAYS_TRUE` / `ALWAYS_FALSE`, which only exist after rewriting.
    #[must_use]
    pub fn negated(&self) -> Self {
        let Some(op) = self.op.negated() else {
            panic!("Invalid negation of rewritten query.");
        };
        Self {
            op,
            ..self.clone()
        }
    }

    /// Replaces the literal of a single-value node.
    pub(crate) fn replace_literal(&mut self, op: ComparisonOp, data: ByteValue) {
        debug_assert!(!op.is_set_membership());
        self.op = op;
        self.data = data;
    }

    /// Replaces the members of a set membership node.
    pub(crate) fn replace_members(&mut self, data: ByteValue, offsets: ByteValue) {
        debug_assert!(self.op.is_set_membership());
        self.data = data;
        self.offsets = offsets;
    }
}

#[cfg(feature = "serde")]
#[derive(Clone, Serialize, Deserialize)]
struct ValueNodeRepr {
    field_name: String,
    op: ComparisonOp,
    is_null: bool,
    data: ByteValue,
    offsets: ByteValue,
    use_enumeration: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<ValueNodeRepr> for ValueNode {
    type Error = ConstructionError;

    fn try_from(repr: ValueNodeRepr) -> Result<Self, Self::Error> {
        if repr.op.is_set_membership() {
            // Rewriting may drop every member, so empty sets are valid here.
            if repr.offsets.len() % OFFSET_WIDTH != 0 {
                return Err(ConstructionError::OffsetsSize(repr.offsets.len()));
            }
            check_offsets(repr.data.len(), repr.offsets.offsets())?;
        } else if !repr.offsets.is_empty() {
            return Err(ConstructionError::UnexpectedOffsets(repr.op));
        }
        if repr.is_null && !repr.data.is_empty() {
            return Err(ConstructionError::NullWithData(repr.data.len()));
        }
        Ok(Self {
            field_name: repr.field_name,
            op: repr.op,
            is_null: repr.is_null,
            data: repr.data,
            offsets: repr.offsets,
            use_enumeration: repr.use_enumeration,
        })
    }
}

#[cfg(feature = "serde")]
impl From<ValueNode> for ValueNodeRepr {
    fn from(node: ValueNode) -> Self {
        Self {
            field_name: node.field_name,
            op: node.op,
            is_null: node.is_null,
            data: node.data,
            offsets: node.offsets,
            use_enumeration: node.use_enumeration,
        }
    }
}

use thiserror::Error;

use crate::{
    datatype::Datatype,
    op::{CombinationOp, ComparisonOp},
};

/// Raised while building a node; no partially constructed node is ever returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("Invalid use of internal operation: {0}")]
    InternalOp(ComparisonOp),
    #[error("Set membership operation {0} requires offsets")]
    MissingOffsets(ComparisonOp),
    #[error("Non-set operation {0} cannot use offsets")]
    UnexpectedOffsets(ComparisonOp),
    #[error("Set membership data must not be empty")]
    EmptyData,
    #[error("Set membership offsets must not be empty")]
    EmptyOffsets,
    #[error("Invalid offsets size {0}: not a multiple of 8 bytes")]
    OffsetsSize(usize),
    #[error("Invalid offsets: offset {index} ({offset}) is smaller than the previous offset")]
    OffsetsNotOrdered { index: usize, offset: u64 },
    #[error("Invalid offsets: offset {offset} references beyond data size {data_size}")]
    OffsetOutOfBounds { offset: u64, data_size: u64 },
    #[error("Null values carry no data, got {0} bytes")]
    NullWithData(usize),
    #[error("Expression nodes require at least 2 children, got {0}")]
    TooFewChildren(usize),
    #[error("Combination operator {0} cannot join child nodes")]
    UnsupportedCombinationOp(CombinationOp),
}

/// A predicate that does not fit the schema it is checked against.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidityError {
    #[error("Value node field name is not a dimension or attribute: {0}")]
    UnknownField(String),
    #[error("Null value can only be used with equality operators, got {op} on '{field}'")]
    NullWithNonEqualityOp { field: String, op: ComparisonOp },
    #[error("Null value can only be used with nullable attributes: {0}")]
    NullOnNonNullable(String),
    #[error("Value node non-empty field may only be var-sized for ASCII or UTF-8 strings: {0}")]
    VarSizedNonString(String),
    #[error(
        "Value node field must have one value per cell for non-string fixed size fields: {0}"
    )]
    MultiValueNonString(String),
    #[error("Value node condition value size mismatch on '{field}': {expected} != {actual}")]
    ValueSizeMismatch {
        field: String,
        expected: u64,
        actual: u64,
    },
    #[error("Value node set member size mismatch on '{field}': {expected} != {actual}")]
    SetMemberSizeMismatch {
        field: String,
        expected: u64,
        actual: u64,
    },
    #[error("Value node field '{field}' has unsupported datatype {datatype}")]
    UnsupportedDatatype { field: String, datatype: Datatype },
    #[error("Enumeration '{enumeration}' for field '{field}' is not loaded")]
    EnumerationNotLoaded { field: String, enumeration: String },
    #[error("Non value AST node does not have at least 2 children, got {0}")]
    TooFewChildren(usize),
}

/// Failure to cast an enumeration index into an attribute's storage type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CastError {
    #[error("Datatype {0} cannot hold enumeration indices")]
    NonIntegral(Datatype),
    #[error("Index {index} does not fit into datatype {datatype}")]
    OutOfRange { index: u64, datatype: Datatype },
}

/// Failure while mapping enumeration literals to their index values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("Unable to rewrite query condition. Enumeration '{enumeration}' for field '{field}' is not loaded")]
    EnumerationNotLoaded { field: String, enumeration: String },
    #[error("Cannot apply {op} on '{field}' against the unordered enumeration '{enumeration}'")]
    UnorderedInequality {
        field: String,
        enumeration: String,
        op: ComparisonOp,
    },
    #[error("Unable to store enumeration index for '{field}': {source}")]
    IndexCast {
        field: String,
        #[source]
        source: CastError,
    },
}

/// Failure while building an enumeration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnumerationError {
    #[error("Enumeration '{0}' must have a non-empty name")]
    EmptyName(String),
    #[error("Enumeration '{name}' cannot use datatype {datatype}")]
    UnsupportedDatatype { name: String, datatype: Datatype },
    #[error("Enumeration '{name}' data size {size} is not a multiple of value size {value_size}")]
    DataSize {
        name: String,
        size: usize,
        value_size: u64,
    },
    #[error("Enumeration '{0}' has variable sized values and requires offsets")]
    MissingOffsets(String),
    #[error("Enumeration '{0}' has fixed sized values and cannot use offsets")]
    UnexpectedOffsets(String),
    #[error("Enumeration '{name}' has invalid offsets: {source}")]
    Offsets {
        name: String,
        #[source]
        source: ConstructionError,
    },
    #[error("Enumeration '{0}' contains a duplicated value")]
    DuplicateValue(String),
}

/// Failure while assembling an in-memory array schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field '{0}' is already defined")]
    DuplicateField(String),
    #[error("Enumeration '{0}' is already loaded")]
    DuplicateEnumeration(String),
    #[error("Dimension '{0}' cannot be nullable")]
    NullableDimension(String),
    #[error("Dimension '{0}' cannot reference an enumeration")]
    EnumeratedDimension(String),
    #[error("Attribute '{field}' with an enumeration must use an integral datatype, got {datatype}")]
    EnumeratedNonIntegral { field: String, datatype: Datatype },
    #[error("Field '{0}' must have a cell value number greater than zero")]
    ZeroCellValNum(String),
}

/// Failure while evaluating a tree against a single cell.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Unknown dimension or attribute: {0}")]
    UnknownField(String),
    #[error("Field '{0}' still carries enumeration literals; rewrite the condition first")]
    PendingEnumerationRewrite(String),
    #[error("Cannot compare values of datatype {datatype} on '{field}'")]
    UnsupportedDatatype { field: String, datatype: Datatype },
    #[error("Cell value for '{field}' has {actual} bytes, expected {expected}")]
    CellSize {
        field: String,
        expected: u64,
        actual: usize,
    },
}

/// Misuse of a [`QueryCondition`](crate::condition::QueryCondition).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Cannot reinitialize query condition")]
    AlreadyInitialized,
    #[error("Cannot {0} an empty query condition")]
    Empty(&'static str),
    #[error("Cannot combine query conditions; only the 'AND' and 'OR' combination ops are supported, got {0}")]
    UnsupportedCombine(CombinationOp),
    #[error("Cannot negate query condition; only the 'NOT' combination op is supported, got {0}")]
    UnsupportedNegate(CombinationOp),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

//! Query condition syntax trees for multidimensional array reads.
//!
//! A query condition is the boolean filter applied to cells while reading an
//! array. Leaves compare one dimension or attribute against a literal,
//! interior nodes join subtrees with `AND`, `OR` or `NAND`. Trees are pure
//! values: they are built and transformed without a schema, then validated
//! against one, rewritten through its enumerations, and finally evaluated
//! cell by cell.
//!
//! ```
//! use tiledb_query_ast::{CombinationOp, ComparisonOp, NodeBuilder};
//!
//! let tree = NodeBuilder::or()
//!     .less_than("x", 5i32)
//!     .greater_than("y", 3i32)
//!     .build()
//!     .expect("valid literals");
//! assert_eq!(tree.combination_op(), CombinationOp::Or);
//! let negated = tree.negated_tree();
//! assert_eq!(negated.children()[0].op(), ComparisonOp::Ge);
//! ```

pub mod builder;
pub mod byte_value;
pub mod condition;
pub mod datatype;
/// Error types.
pub mod error;
pub mod eval;
mod logging;
pub mod node;
pub mod op;
pub mod rewrite;
pub mod schema;
pub mod validate;

pub use builder::{IntoLiteral, NodeBuilder};
pub use byte_value::ByteValue;
pub use condition::QueryCondition;
pub use datatype::{Datatype, TimeUnit};
pub use error::{
    CastError, ConditionError, ConstructionError, EnumerationError, EvalError, RewriteError,
    SchemaError, ValidityError,
};
pub use eval::{evaluate, CellView};
pub use node::{ExprNode, Node, NodeValue, ValueNode};
pub use op::{CombinationOp, ComparisonOp};
pub use rewrite::EnumerationRewriter;
pub use schema::{ArraySchema, CellValNum, Enumeration, Field, FieldKind, Schema};
pub use validate::SchemaValidator;

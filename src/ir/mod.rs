//! The expression data model: the planner's view of the compiler's
//! typed, immutable expression tree (spec.md §3). Outside this crate's
//! scope is the general visitor infrastructure that produces this tree in
//! the first place — here it is simply an arena the planner walks twice.

pub use self::expr::{Expr, ExprArena, ExprId, Function};
pub use self::types::{DataType, Dim, Shape, TensorType, Type};

mod expr;
mod types;

//! Abstract syntax tree of the DQL select subset.
//!
//! Tree walkers receive and return a [`SelectStatement`] by value, so every
//! node is plain owned data that can be rewritten freely.

mod display;

mod expr;
pub use expr::{
    AggregateFunction, ArithmeticOp, ComparisonOp, Condition, Expr, Function, Literal, Parameter,
    PathExpr,
};

mod select;
pub use select::{
    FromItem, Join, JoinKind, OrderByItem, RangeVariable, SelectClause, SelectExpression,
    SelectStatement,
};

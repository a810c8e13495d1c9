use crate::ast::Parameter;

use strata_core::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),

    /// A column alias of the select list.
    Alias(String),

    Param(Param),

    Null,

    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),

    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },

    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },

    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `CONCAT(..)`, rendered per flavor.
    Concat(Vec<Expr>),

    Func {
        name: &'static str,
        distinct: bool,
        args: Vec<Expr>,
    },

    Neg(Box<Expr>),

    Nested(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Table alias. `None` in statements over a single unaliased table.
    pub table: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Known when the statement is built.
    Value(Value),

    /// Supplied by the caller when the query runs.
    Query(Parameter),
}

impl Expr {
    pub fn column(table: Option<&str>, name: impl Into<String>) -> Expr {
        Expr::Column(ColumnRef {
            table: table.map(str::to_string),
            name: name.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        match value.into() {
            Value::Null => Expr::Null,
            value => Expr::Param(Param::Value(value)),
        }
    }

    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(lhs, BinaryOp::Eq, rhs)
    }

    /// Conjunction of `exprs`, without wrapping a single operand.
    pub fn and_from_vec(mut exprs: Vec<Expr>) -> Option<Expr> {
        match exprs.len() {
            0 => None,
            1 => exprs.pop(),
            _ => Some(Expr::And(exprs)),
        }
    }
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl From<Param> for Expr {
    fn from(value: Param) -> Self {
        Expr::Param(value)
    }
}

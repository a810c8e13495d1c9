/// A scalar or entity-valued expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An identification variable, e.g. `u` in `SELECT u`.
    Alias(String),

    /// `alias.field` or `alias.association`.
    Path(PathExpr),

    Literal(Literal),

    Parameter(Parameter),

    Arithmetic {
        lhs: Box<Expr>,
        op: ArithmeticOp,
        rhs: Box<Expr>,
    },

    Negate(Box<Expr>),

    Aggregate {
        function: AggregateFunction,
        distinct: bool,
        arg: Box<Expr>,
    },

    Function {
        function: Function,
        args: Vec<Expr>,
    },

    /// A parenthesized expression.
    Nested(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    pub alias: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// `?1`
    Positional(usize),

    /// `:name`
    Named(String),
}

impl From<usize> for Parameter {
    fn from(position: usize) -> Parameter {
        Parameter::Positional(position)
    }
}

/// A leading `:` is accepted and ignored.
impl From<&str> for Parameter {
    fn from(name: &str) -> Parameter {
        Parameter::Named(name.strip_prefix(':').unwrap_or(name).to_string())
    }
}

impl From<String> for Parameter {
    fn from(name: String) -> Parameter {
        Parameter::from(name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Lower,
    Upper,
    Length,
    Concat,

    /// `IDENTITY(alias.association)`: the foreign key value of a to-one
    /// association.
    Identity,
}

/// A boolean condition in `WHERE`, `HAVING` or a join's `WITH`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Comparison {
        lhs: Expr,
        op: ComparisonOp,
        rhs: Expr,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    In {
        expr: Expr,
        list: Vec<Expr>,
        negated: bool,
    },
    Like {
        expr: Expr,
        pattern: Expr,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
    },
    Nested(Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Expr {
    pub fn alias(alias: impl Into<String>) -> Expr {
        Expr::Alias(alias.into())
    }

    pub fn path(alias: impl Into<String>, field: impl Into<String>) -> Expr {
        Expr::Path(PathExpr {
            alias: alias.into(),
            field: field.into(),
        })
    }

    pub fn as_alias(&self) -> Option<&str> {
        match self {
            Expr::Alias(alias) => Some(alias),
            _ => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate { .. })
    }

    /// Calls `f` on this expression and every nested expression.
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Arithmetic { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::Negate(expr) | Expr::Nested(expr) => expr.visit(f),
            Expr::Aggregate { arg, .. } => arg.visit(f),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            Expr::Alias(_) | Expr::Path(_) | Expr::Literal(_) | Expr::Parameter(_) => {}
        }
    }
}

impl Condition {
    /// Calls `f` on every expression of the condition tree.
    pub fn visit_exprs(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Condition::And(items) | Condition::Or(items) => {
                for item in items {
                    item.visit_exprs(f);
                }
            }
            Condition::Not(cond) | Condition::Nested(cond) => cond.visit_exprs(f),
            Condition::Comparison { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Condition::IsNull { expr, .. } => expr.visit(f),
            Condition::In { expr, list, .. } => {
                expr.visit(f);
                for item in list {
                    item.visit(f);
                }
            }
            Condition::Like { expr, pattern, .. } => {
                expr.visit(f);
                pattern.visit(f);
            }
            Condition::Between {
                expr, low, high, ..
            } => {
                expr.visit(f);
                low.visit(f);
                high.visit(f);
            }
        }
    }
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Avg => "AVG",
        }
    }
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Lower => "LOWER",
            Function::Upper => "UPPER",
            Function::Length => "LENGTH",
            Function::Concat => "CONCAT",
            Function::Identity => "IDENTITY",
        }
    }

    /// Accepted argument counts.
    pub(crate) fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Lower | Function::Upper | Function::Length | Function::Identity => {
                (1, Some(1))
            }
            Function::Concat => (2, None),
        }
    }
}

impl ArithmeticOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

impl ComparisonOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }
}

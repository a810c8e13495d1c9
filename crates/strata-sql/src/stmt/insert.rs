use super::{Expr, Statement};

/// Single-row `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,

    /// Columns read back with `RETURNING` on flavors that support it.
    pub returning: Vec<String>,
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Statement::Insert(value)
    }
}

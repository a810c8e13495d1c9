use super::{Condition, Expr, PathExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub select: SelectClause,
    pub from: Vec<FromItem>,
    pub filter: Option<Condition>,
    pub group_by: Vec<Expr>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderByItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause {
    pub distinct: bool,
    pub exprs: Vec<SelectExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpression {
    pub expr: Expr,

    /// Result variable given with `AS`.
    pub alias: Option<String>,

    /// `HIDDEN` expressions are computed but not part of the result.
    pub hidden: bool,
}

/// One comma-separated entry of the `FROM` clause: a root entity with the
/// joins hanging off it.
#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub range: RangeVariable,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeVariable {
    pub entity: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,

    /// `parent.association`
    pub path: PathExpr,

    pub alias: String,

    /// `WITH` condition
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub descending: bool,
}

impl SelectStatement {
    /// Removes the first select expression that is exactly `expr`. Returns
    /// true when one was removed.
    pub fn remove_select_expression(&mut self, expr: &Expr) -> bool {
        match self.select.exprs.iter().position(|item| item.expr == *expr) {
            Some(index) => {
                self.select.exprs.remove(index);
                true
            }
            None => false,
        }
    }

    /// Aliases of the `FROM` roots, in declaration order.
    pub fn root_aliases(&self) -> impl Iterator<Item = &str> {
        self.from.iter().map(|item| item.range.alias.as_str())
    }
}

impl SelectExpression {
    pub fn new(expr: Expr) -> SelectExpression {
        SelectExpression {
            expr,
            alias: None,
            hidden: false,
        }
    }
}

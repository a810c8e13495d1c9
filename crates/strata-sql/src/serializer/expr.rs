use super::{Comma, Delimited, Flavor, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Expr::*;

        match self {
            Column(column) => fmt!(f, column),
            Alias(alias) => fmt!(f, Ident(alias)),
            Param(param) => {
                let placeholder = f.params.push(param);
                fmt!(f, placeholder);
            }
            Null => fmt!(f, "NULL"),
            Binary { lhs, op, rhs } => fmt!(f, &**lhs, " ", op.as_str(), " ", &**rhs),
            And(operands) => fmt!(f, Delimited(operands, " AND ")),
            Or(operands) => fmt!(f, Delimited(operands, " OR ")),
            Not(expr) => fmt!(f, "NOT ", &**expr),
            IsNull { expr, negated } => {
                let op = if *negated { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, &**expr, op);
            }
            InList {
                expr,
                list,
                negated,
            } => {
                let op = if *negated { " NOT IN (" } else { " IN (" };
                fmt!(f, &**expr, op, Comma(list), ")");
            }
            Like {
                expr,
                pattern,
                negated,
            } => {
                let op = if *negated { " NOT LIKE " } else { " LIKE " };
                fmt!(f, &**expr, op, &**pattern);
            }
            Between {
                expr,
                low,
                high,
                negated,
            } => {
                let op = if *negated { " NOT BETWEEN " } else { " BETWEEN " };
                fmt!(f, &**expr, op, &**low, " AND ", &**high);
            }
            Concat(args) => match f.serializer.flavor {
                Flavor::Mysql => fmt!(f, "CONCAT(", Comma(args), ")"),
                Flavor::Sqlite | Flavor::Postgresql => fmt!(f, Delimited(args, " || ")),
            },
            Func {
                name,
                distinct,
                args,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                fmt!(f, *name, "(", distinct, Comma(args), ")");
            }
            Neg(expr) => fmt!(f, "-", &**expr),
            Nested(expr) => fmt!(f, "(", &**expr, ")"),
        }
    }
}

impl ToSql for &stmt::ColumnRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        if let Some(table) = &self.table {
            fmt!(f, Ident(table), ".");
        }
        fmt!(f, Ident(&self.name));
    }
}

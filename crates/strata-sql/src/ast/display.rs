//! Renders AST nodes back to DQL. Used to name the offending fragment in
//! query errors and in debug logging.

use super::*;

use std::fmt;

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.select.distinct {
            f.write_str("DISTINCT ")?;
        }
        comma(f, &self.select.exprs)?;

        f.write_str(" FROM ")?;
        comma(f, &self.from)?;

        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            comma(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma(f, &self.order_by)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match (&self.alias, self.hidden) {
            (Some(alias), true) => write!(f, " AS HIDDEN {alias}"),
            (Some(alias), false) => write!(f, " AS {alias}"),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for FromItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.range.entity, self.range.alias)?;
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JoinKind::Inner => f.write_str("JOIN ")?,
            JoinKind::Left => f.write_str("LEFT JOIN ")?,
        }
        write!(f, "{} {}", self.path, self.alias)?;
        if let Some(condition) = &self.condition {
            write!(f, " WITH {condition}")?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.descending {
            f.write_str(" DESC")?;
        }
        Ok(())
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.field)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Alias(alias) => f.write_str(alias),
            Expr::Path(path) => write!(f, "{path}"),
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Parameter(parameter) => write!(f, "{parameter}"),
            Expr::Arithmetic { lhs, op, rhs } => write!(f, "{lhs} {} {rhs}", op.as_str()),
            Expr::Negate(expr) => write!(f, "-{expr}"),
            Expr::Aggregate {
                function,
                distinct,
                arg,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                write!(f, "{}({distinct}{arg})", function.name())
            }
            Expr::Function { function, args } => {
                write!(f, "{}(", function.name())?;
                comma(f, args)?;
                f.write_str(")")
            }
            Expr::Nested(expr) => write!(f, "({expr})"),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Positional(position) => write!(f, "?{position}"),
            Parameter::Named(name) => write!(f, ":{name}"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Bool(true) => f.write_str("true"),
            Literal::Bool(false) => f.write_str("false"),
            Literal::Integer(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: bool| if negated { "NOT " } else { "" };

        match self {
            Condition::And(items) => delimited(f, items, " AND "),
            Condition::Or(items) => delimited(f, items, " OR "),
            Condition::Not(cond) => write!(f, "NOT {cond}"),
            Condition::Comparison { lhs, op, rhs } => write!(f, "{lhs} {} {rhs}", op.as_str()),
            Condition::IsNull { expr, negated } => write!(f, "{expr} IS {}NULL", not(*negated)),
            Condition::In {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} {}IN (", not(*negated))?;
                comma(f, list)?;
                f.write_str(")")
            }
            Condition::Like {
                expr,
                pattern,
                negated,
            } => write!(f, "{expr} {}LIKE {pattern}", not(*negated)),
            Condition::Between {
                expr,
                low,
                high,
                negated,
            } => write!(f, "{expr} {}BETWEEN {low} AND {high}", not(*negated)),
            Condition::Nested(cond) => write!(f, "({cond})"),
        }
    }
}

fn comma<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    delimited(f, items, ", ")
}

fn delimited<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

use crate::ast::{AggregateFunction, Expr, SelectClause, SelectExpression, SelectStatement};
use crate::QueryComponents;

use strata_core::{Error, Result};

/// Rewrites a query into one counting the distinct root entities it
/// selects. Used to size a page of results.
pub fn count_walker(
    mut stmt: SelectStatement,
    _components: &QueryComponents,
) -> Result<SelectStatement> {
    if let Some(having) = &stmt.having {
        return Err(Error::query_semantical(
            having.to_string(),
            "Cannot count query that uses a HAVING clause.",
        ));
    }

    let root = match &stmt.from[..] {
        [item] => item.range.alias.clone(),
        _ => {
            let roots: Vec<_> = stmt.root_aliases().collect();
            return Err(Error::query_semantical(
                roots.join(", "),
                "Cannot count query which selects two FROM components, cannot make distinction",
            ));
        }
    };

    stmt.select = SelectClause {
        distinct: false,
        exprs: vec![SelectExpression::new(Expr::Aggregate {
            function: AggregateFunction::Count,
            distinct: true,
            arg: Box::new(Expr::Alias(root)),
        })],
    };
    stmt.order_by.clear();

    Ok(stmt)
}

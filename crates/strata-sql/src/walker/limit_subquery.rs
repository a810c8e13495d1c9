use crate::ast::{Expr, Function, SelectClause, SelectExpression, SelectStatement};
use crate::QueryComponents;

use strata_core::{Error, Result};

/// Rewrites a query into one selecting the distinct identifiers of its
/// root entity, keeping the filter and order. Paging over fetch-joined
/// collections runs this query first to find the root ids of a page.
///
/// Ordered expressions are kept as hidden select expressions so `DISTINCT`
/// and `ORDER BY` agree.
pub fn limit_subquery_walker(
    mut stmt: SelectStatement,
    components: &QueryComponents,
) -> Result<SelectStatement> {
    let root = match &stmt.from[..] {
        [item] => item.range.alias.clone(),
        _ => {
            let roots: Vec<_> = stmt.root_aliases().collect();
            return Err(Error::query_semantical(
                roots.join(", "),
                "Cannot select distinct identifiers from query with multiple FROM clauses.",
            ));
        }
    };

    let component = components.get(&root).ok_or_else(|| {
        Error::query_semantical(&root, format!("'{root}' is not defined."))
    })?;

    let mut exprs = vec![];
    for id in &component.class.identifier {
        let path = Expr::path(&root, id);

        let expr = if component.class.has_association(id) {
            Expr::Function {
                function: Function::Identity,
                args: vec![path],
            }
        } else {
            path
        };

        exprs.push(SelectExpression::new(expr));
    }

    // Result variables of the original select list no longer exist
    stmt.order_by
        .retain(|item| !matches!(item.expr, Expr::Alias(_)));

    for (i, item) in stmt.order_by.iter().enumerate() {
        if exprs.iter().any(|selected| selected.expr == item.expr) {
            continue;
        }

        exprs.push(SelectExpression {
            expr: item.expr.clone(),
            alias: Some(format!("_ord{i}")),
            hidden: true,
        });
    }

    stmt.select = SelectClause {
        distinct: true,
        exprs,
    };

    Ok(stmt)
}

use crate::ast::SelectStatement;
use crate::QueryComponents;

use strata_core::Result;

/// Moves entity results ahead of scalars and orders them parent before
/// child, so the hydrator always sees a fetch-joined entity's parent
/// first. The sort is stable: roots keep their relative order, as do
/// entities at the same join depth and all scalar expressions.
pub fn reorder_fetch_joins(
    mut stmt: SelectStatement,
    components: &QueryComponents,
) -> Result<SelectStatement> {
    let exprs = std::mem::take(&mut stmt.select.exprs);

    let (mut entities, scalars): (Vec<_>, Vec<_>) = exprs.into_iter().partition(|item| {
        item.expr
            .as_alias()
            .is_some_and(|alias| components.contains(alias))
    });

    entities.sort_by_key(|item| {
        item.expr
            .as_alias()
            .and_then(|alias| components.get(alias))
            .map_or(0, |component| component.nesting_level)
    });

    stmt.select.exprs = entities;
    stmt.select.exprs.extend(scalars);

    Ok(stmt)
}

use crate::ast::{Condition, Expr, PathExpr, SelectStatement};
use crate::{QueryComponent, QueryComponents};

use strata_core::mapping::{AssociationMapping, ClassMetadata, FieldMapping};
use strata_core::{Error, Result, Schema};

/// Binds every identification variable of `stmt` to its class and checks
/// that all expressions refer to known variables, fields and associations.
pub(crate) fn resolve(stmt: &SelectStatement, schema: &Schema) -> Result<QueryComponents> {
    let mut components = QueryComponents::default();

    for item in &stmt.from {
        let entity = &item.range.entity;
        let class = schema
            .get(entity)
            .filter(|class| !class.is_mapped_superclass)
            .ok_or_else(|| {
                Error::query_semantical(entity, format!("Class '{entity}' is not defined."))
            })?;

        declare(
            &mut components,
            &item.range.alias,
            QueryComponent {
                class: class.clone(),
                parent: None,
                relation: None,
                nesting_level: 0,
                join_kind: None,
            },
        )?;

        for join in &item.joins {
            let path = &join.path;
            let parent = components.get(&path.alias).ok_or_else(|| {
                Error::query_semantical(
                    path.to_string(),
                    format!(
                        "Identification Variable {} used in join path expression but was not defined before.",
                        path.alias
                    ),
                )
            })?;

            let assoc = parent.class.association(&path.field).ok_or_else(|| {
                Error::query_semantical(
                    path.to_string(),
                    format!(
                        "Class {} has no association named {}",
                        parent.class.name, path.field
                    ),
                )
            })?;

            let component = QueryComponent {
                class: schema.target_of(assoc)?.clone(),
                parent: Some(path.alias.clone()),
                relation: Some(path.field.clone()),
                nesting_level: parent.nesting_level + 1,
                join_kind: Some(join.kind),
            };
            declare(&mut components, &join.alias, component)?;
        }
    }

    for item in &stmt.select.exprs {
        if let Some(name) = &item.alias {
            if components.contains(name) || components.is_result_variable(name) {
                return Err(already_defined(name));
            }
            components.add_result_variable(name.clone());
        }
    }

    let check = Check {
        components: &components,
    };

    for item in &stmt.select.exprs {
        check.expr(&item.expr, false)?;
    }

    for item in &stmt.from {
        for join in &item.joins {
            if let Some(condition) = &join.condition {
                check.condition(condition, false)?;
            }
        }
    }

    if let Some(filter) = &stmt.filter {
        check.condition(filter, false)?;
    }

    for expr in &stmt.group_by {
        check.expr(expr, true)?;
    }

    if let Some(having) = &stmt.having {
        check.condition(having, true)?;
    }

    for item in &stmt.order_by {
        check.expr(&item.expr, true)?;
    }

    Ok(components)
}

fn declare(components: &mut QueryComponents, alias: &str, component: QueryComponent) -> Result<()> {
    if components.contains(alias) {
        return Err(already_defined(alias));
    }
    components.insert(alias.to_string(), component);
    Ok(())
}

fn already_defined(name: &str) -> Error {
    Error::query_semantical(name, format!("'{name}' is already defined."))
}

struct Check<'a> {
    components: &'a QueryComponents,
}

impl Check<'_> {
    fn condition(&self, condition: &Condition, result_variables: bool) -> Result<()> {
        let mut ret = Ok(());
        condition.visit_exprs(&mut |expr| {
            if ret.is_ok() {
                ret = self.one(expr, result_variables);
            }
        });
        ret
    }

    fn expr(&self, expr: &Expr, result_variables: bool) -> Result<()> {
        let mut ret = Ok(());
        expr.visit(&mut |expr| {
            if ret.is_ok() {
                ret = self.one(expr, result_variables);
            }
        });
        ret
    }

    fn one(&self, expr: &Expr, result_variables: bool) -> Result<()> {
        match expr {
            Expr::Alias(alias) => {
                let known = self.components.contains(alias)
                    || (result_variables && self.components.is_result_variable(alias));
                if !known {
                    return Err(not_defined(alias, alias));
                }
            }
            Expr::Path(path) => {
                let component = self
                    .components
                    .get(&path.alias)
                    .ok_or_else(|| not_defined(&path.to_string(), &path.alias))?;
                path_target(&component.class, path)?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn not_defined(fragment: &str, alias: &str) -> Error {
    Error::query_semantical(fragment, format!("'{alias}' is not defined."))
}

/// What a path expression points at.
pub(crate) enum PathTarget<'a> {
    Field(&'a FieldMapping),
    Association(&'a AssociationMapping),
}

/// Looks `path.field` up on `class`. Collection-valued associations are
/// rejected since they have no single value.
pub(crate) fn path_target<'a>(class: &'a ClassMetadata, path: &PathExpr) -> Result<PathTarget<'a>> {
    if let Some(field) = class.field(&path.field) {
        return Ok(PathTarget::Field(field));
    }

    match class.association(&path.field) {
        Some(assoc) if assoc.is_to_many() => Err(Error::query_semantical(
            path.to_string(),
            "Invalid PathExpression. StateFieldPathExpression or SingleValuedAssociationField expected.",
        )),
        Some(assoc) => Ok(PathTarget::Association(assoc)),
        None => Err(Error::query_semantical(
            path.to_string(),
            format!(
                "Class {} has no field or association named {}",
                class.name, path.field
            ),
        )),
    }
}

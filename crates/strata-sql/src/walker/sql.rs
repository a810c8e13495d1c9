use super::resolve::{path_target, PathTarget};
use crate::ast::{self, Condition, Expr, Function, Literal, PathExpr, SelectExpression};
use crate::stmt::{self, BinaryOp, Param};
use crate::{QueryComponents, ResultSetMapping, TableAliases};

use std::collections::{HashMap, HashSet};
use strata_core::mapping::{AssociationMapping, ClassMetadata, FieldType, JoinColumn};
use strata_core::{Error, Result, Schema, Value};

/// Lowers a resolved DQL statement into an SQL select and the mapping of
/// its result columns.
///
/// A walker lives for one compilation: table aliases and column counters
/// start fresh every time.
pub(crate) struct SqlWalker<'a> {
    schema: &'a Schema,
    components: &'a QueryComponents,
    aliases: TableAliases,
    rsm: ResultSetMapping,

    /// Numbers both `<column>_<n>` and `sclr_<n>` aliases.
    column_counter: usize,

    /// Names unnamed, non-path scalar results.
    scalar_result_counter: usize,

    /// DQL result variable to the SQL column alias it was emitted under.
    result_variables: HashMap<String, String>,
}

impl<'a> SqlWalker<'a> {
    pub(crate) fn new(schema: &'a Schema, components: &'a QueryComponents) -> SqlWalker<'a> {
        SqlWalker {
            schema,
            components,
            aliases: TableAliases::new(),
            rsm: ResultSetMapping::new(),
            column_counter: 0,
            scalar_result_counter: 1,
            result_variables: HashMap::new(),
        }
    }

    pub(crate) fn walk_select_statement(
        mut self,
        stmt: &ast::SelectStatement,
    ) -> Result<(stmt::Select, ResultSetMapping)> {
        // Table aliases follow declaration order
        for (alias, component) in self.components.iter() {
            self.aliases
                .get(&component.class.table.qualified_name(), Some(alias));
        }

        let selected: HashSet<&str> = stmt
            .select
            .exprs
            .iter()
            .filter_map(|item| item.expr.as_alias())
            .filter(|alias| self.components.contains(alias))
            .collect();

        let mut select = stmt::Select {
            distinct: stmt.select.distinct,
            ..stmt::Select::default()
        };

        let mut entity_index = 0;
        for item in &stmt.select.exprs {
            self.walk_select_expression(item, &selected, &mut entity_index, &mut select.columns)?;
        }

        let mut filters = vec![];

        for item in &stmt.from {
            let alias = &item.range.alias;
            let class = self.class_of(alias)?;
            let table_alias = self.table_alias(alias)?;

            if let Some(restriction) = self.discriminator_restriction(&class, &table_alias)? {
                filters.push(restriction);
            }

            let mut joins = vec![];
            for join in &item.joins {
                joins.extend(self.walk_join(join)?);
            }

            select.from.push(stmt::TableWithJoins {
                table: stmt::TableRef::new(class.table.qualified_name(), Some(table_alias)),
                joins,
            });
        }

        if let Some(filter) = &stmt.filter {
            filters.insert(0, self.walk_condition(filter)?);
        }
        select.filter = and_all(filters);

        for expr in &stmt.group_by {
            select.group_by.push(self.walk_expr(expr)?);
        }

        if let Some(having) = &stmt.having {
            select.having = Some(self.walk_condition(having)?);
        }

        for item in &stmt.order_by {
            select.order_by.push(stmt::OrderBy {
                expr: self.walk_expr(&item.expr)?,
                descending: item.descending,
            });
        }

        Ok((select, self.rsm))
    }

    /// Selects the elements of a to-many association. The source side is
    /// bound through named parameters called after the referenced source
    /// columns.
    pub(crate) fn walk_collection(
        mut self,
        alias: &str,
        assoc: &AssociationMapping,
    ) -> Result<(stmt::Select, ResultSetMapping)> {
        let target = self.class_of(alias)?;
        let table_alias = self.table_alias(alias)?;

        self.rsm.add_entity_result(&target.name, alias, None);

        let mut select = stmt::Select::default();
        self.entity_columns(alias, &target, &table_alias, true, &mut select.columns)?;

        let mut from = stmt::TableWithJoins {
            table: stmt::TableRef::new(target.table.qualified_name(), Some(table_alias.clone())),
            joins: vec![],
        };
        let mut filters = vec![];

        let owning = owning_side(&target, assoc)?;
        let source_keys = if let Some(join_table) = owning.join_table() {
            let bridge_table = join_table.qualified_name();
            let bridge_alias = self.aliases.get(&bridge_table, Some(alias));

            let (to_source, to_target) = if assoc.is_owning_side() {
                (&join_table.join_columns, &join_table.inverse_join_columns)
            } else {
                (&join_table.inverse_join_columns, &join_table.join_columns)
            };

            from.joins.push(stmt::Join {
                kind: stmt::JoinKind::Inner,
                table: stmt::TableRef::new(bridge_table, Some(bridge_alias.clone())),
                on: and_all(key_equalities(to_target, &bridge_alias, &table_alias))
                    .unwrap_or(stmt::Expr::Null),
            });

            (bridge_alias, to_source.as_slice())
        } else {
            (table_alias.clone(), owning.join_columns())
        };

        let (keys_alias, key_columns) = source_keys;
        for jc in key_columns {
            filters.push(stmt::Expr::eq(
                stmt::Expr::column(Some(&keys_alias), &jc.name),
                stmt::Expr::Param(Param::Query(ast::Parameter::Named(
                    jc.referenced_column_name.clone(),
                ))),
            ));
        }

        if let Some(restriction) = self.discriminator_restriction(&target, &table_alias)? {
            filters.push(restriction);
        }

        select.from.push(from);
        select.filter = and_all(filters);

        for (field, direction) in assoc.order_by().into_iter().flatten() {
            let column = target.column_name(field).ok_or_else(|| {
                Error::invalid_mapping(format!(
                    "association `{}#{}` is ordered by unknown field `{field}`",
                    assoc.source_entity(),
                    assoc.field_name()
                ))
            })?;

            select.order_by.push(stmt::OrderBy {
                expr: stmt::Expr::column(Some(&table_alias), column),
                descending: direction.eq_ignore_ascii_case("DESC"),
            });
        }

        Ok((select, self.rsm))
    }

    fn walk_select_expression(
        &mut self,
        item: &SelectExpression,
        selected: &HashSet<&str>,
        entity_index: &mut usize,
        columns: &mut Vec<stmt::SelectItem>,
    ) -> Result<()> {
        if let Some(alias) = item.expr.as_alias() {
            if let Some(component) = self.components.get(alias) {
                let class = component.class.clone();

                if !item.hidden {
                    match (&component.parent, &component.relation) {
                        (Some(parent), Some(relation)) => {
                            if !selected.contains(parent.as_str()) {
                                return Err(self.unselected_parent(alias, parent, selected));
                            }
                            self.rsm.add_joined_entity_result(
                                &class.name,
                                alias,
                                parent,
                                relation,
                            );
                        }
                        _ => {
                            let result_alias = item
                                .alias
                                .clone()
                                .unwrap_or_else(|| entity_index.to_string());
                            *entity_index += 1;
                            self.rsm
                                .add_entity_result(&class.name, alias, Some(result_alias));
                        }
                    }
                }

                let table_alias = self.table_alias(alias)?;
                return self.entity_columns(alias, &class, &table_alias, !item.hidden, columns);
            }
        }

        let (expr, column_alias, name, ty) = match &item.expr {
            Expr::Path(path) => {
                let class = self.class_of(&path.alias)?;
                let field = match path_target(&class, path)? {
                    PathTarget::Field(field) => field,
                    PathTarget::Association(_) => {
                        return Err(Error::query_semantical(
                            path.to_string(),
                            "Invalid PathExpression. Must be a StateFieldPathExpression.",
                        ));
                    }
                };

                let table_alias = self.table_alias(&path.alias)?;
                let column_alias = self.column_alias(&field.column_name);
                let name = item.alias.clone().unwrap_or_else(|| field.field_name.clone());
                let expr = stmt::Expr::column(Some(&table_alias), &field.column_name);

                (expr, column_alias, name, Some(field.ty))
            }
            expr => {
                let column_alias = self.column_alias("sclr");
                let name = match &item.alias {
                    Some(alias) => alias.clone(),
                    None if item.hidden => String::new(),
                    None => {
                        let name = self.scalar_result_counter.to_string();
                        self.scalar_result_counter += 1;
                        name
                    }
                };

                (self.walk_expr(expr)?, column_alias, name, self.scalar_type(expr)?)
            }
        };

        if let Some(alias) = &item.alias {
            self.result_variables
                .insert(alias.clone(), column_alias.clone());
        }

        if !item.hidden {
            self.rsm.add_scalar_result(&column_alias, name, ty);
        }

        columns.push(stmt::SelectItem {
            expr,
            alias: Some(column_alias),
        });

        Ok(())
    }

    fn unselected_parent(&self, alias: &str, parent: &str, selected: &HashSet<&str>) -> Error {
        let has_selected_ancestor = self
            .components
            .ancestors(alias)
            .any(|ancestor| selected.contains(ancestor));

        if has_selected_ancestor {
            Error::query_semantical(
                alias,
                format!("Cannot fetch-join '{alias}' without selecting its parent '{parent}'."),
            )
        } else {
            Error::query_semantical(
                alias,
                "Cannot select entity through identification variables without choosing at least one root entity alias.",
            )
        }
    }

    /// Emits the columns of an entity result: every field (including those
    /// of single-table subclasses), the discriminator and the foreign keys
    /// of owning to-one associations.
    pub(crate) fn entity_columns(
        &mut self,
        alias: &str,
        class: &ClassMetadata,
        table_alias: &str,
        map: bool,
        columns: &mut Vec<stmt::SelectItem>,
    ) -> Result<()> {
        let hierarchy = self.hierarchy(class)?;

        let mut seen_fields = HashSet::new();
        for (index, member) in hierarchy.iter().enumerate() {
            for field in member.fields.values() {
                if !seen_fields.insert(field.field_name.clone()) {
                    continue;
                }

                let column_alias = self.column_alias(&field.column_name);
                columns.push(stmt::SelectItem {
                    expr: stmt::Expr::column(Some(table_alias), &field.column_name),
                    alias: Some(column_alias.clone()),
                });

                if map {
                    let declaring_class = (index > 0).then(|| member.name.clone());
                    self.rsm
                        .add_field_result(alias, column_alias, &field.field_name, declaring_class);
                }
            }
        }

        if let Some(discriminator) = &class.discriminator_column {
            let column_alias = self.column_alias(&discriminator.name);
            columns.push(stmt::SelectItem {
                expr: stmt::Expr::column(Some(table_alias), &discriminator.name),
                alias: Some(column_alias.clone()),
            });

            if map {
                self.rsm.add_meta_result(
                    alias,
                    &column_alias,
                    &discriminator.name,
                    false,
                    Some(discriminator.ty),
                );
                self.rsm.set_discriminator_column(alias, column_alias);
            }
        }

        let mut seen_columns = HashSet::new();
        for member in &hierarchy {
            for assoc in member.associations.values() {
                if !(assoc.is_to_one() && assoc.is_owning_side()) {
                    continue;
                }

                let target = self.schema.target_of(assoc)?.clone();

                for jc in assoc.join_columns() {
                    if !seen_columns.insert(jc.name.clone()) {
                        continue;
                    }

                    let column_alias = self.column_alias(&jc.name);
                    columns.push(stmt::SelectItem {
                        expr: stmt::Expr::column(Some(table_alias), &jc.name),
                        alias: Some(column_alias.clone()),
                    });

                    if map {
                        let ty = target
                            .field_for_column(&jc.referenced_column_name)
                            .map(|field| field.ty);
                        self.rsm
                            .add_meta_result(alias, column_alias, &jc.name, assoc.is_id(), ty);
                    }
                }
            }
        }

        Ok(())
    }

    /// `class` followed by its single-table subclasses.
    fn hierarchy(&self, class: &ClassMetadata) -> Result<Vec<ClassMetadata>> {
        let mut ret = vec![class.clone()];

        if class.discriminator_column.is_some() {
            for subclass in &class.subclasses {
                ret.push((**self.schema.class(subclass)?).clone());
            }
        }

        Ok(ret)
    }

    fn walk_join(&mut self, join: &ast::Join) -> Result<Vec<stmt::Join>> {
        let parent_alias = self.table_alias(&join.path.alias)?;
        let target_alias = self.table_alias(&join.alias)?;

        let parent = self.class_of(&join.path.alias)?;
        let target = self.class_of(&join.alias)?;

        let assoc = parent.association(&join.path.field).ok_or_else(|| {
            Error::query_semantical(
                join.path.to_string(),
                format!(
                    "Class {} has no association named {}",
                    parent.name, join.path.field
                ),
            )
        })?;

        let kind = match join.kind {
            ast::JoinKind::Inner => stmt::JoinKind::Inner,
            ast::JoinKind::Left => stmt::JoinKind::Left,
        };

        let mut joins = vec![];
        let mut on = vec![];

        if let Some(join_table) = owning_side(&target, assoc)?.join_table() {
            let bridge_table = join_table.qualified_name();
            let bridge_alias = self.aliases.get(&bridge_table, Some(&join.alias));

            // Bridge columns pointing at the parent side, then at the target
            let (to_parent, to_target) = if assoc.is_owning_side() {
                (&join_table.join_columns, &join_table.inverse_join_columns)
            } else {
                (&join_table.inverse_join_columns, &join_table.join_columns)
            };

            let bridge_on = key_equalities(to_parent, &bridge_alias, &parent_alias);
            joins.push(stmt::Join {
                kind,
                table: stmt::TableRef::new(bridge_table, Some(bridge_alias.clone())),
                on: and_all(bridge_on).unwrap_or(stmt::Expr::Null),
            });

            on.extend(key_equalities(to_target, &bridge_alias, &target_alias));
        } else if assoc.is_owning_side() {
            on.extend(key_equalities(
                assoc.join_columns(),
                &parent_alias,
                &target_alias,
            ));
        } else {
            let owning = owning_side(&target, assoc)?;
            on.extend(key_equalities(
                owning.join_columns(),
                &target_alias,
                &parent_alias,
            ));
        }

        if let Some(condition) = &join.condition {
            on.push(self.walk_condition(condition)?);
        }

        if let Some(restriction) = self.discriminator_restriction(&target, &target_alias)? {
            on.push(restriction);
        }

        joins.push(stmt::Join {
            kind,
            table: stmt::TableRef::new(target.table.qualified_name(), Some(target_alias)),
            on: and_all(on).unwrap_or(stmt::Expr::Null),
        });

        Ok(joins)
    }

    /// Restricts a single-table subclass to its discriminator values.
    fn discriminator_restriction(
        &self,
        class: &ClassMetadata,
        table_alias: &str,
    ) -> Result<Option<stmt::Expr>> {
        let Some(discriminator) = &class.discriminator_column else {
            return Ok(None);
        };

        if class.is_inheritance_root() {
            return Ok(None);
        }

        let list = class
            .discriminator_values()
            .into_iter()
            .map(|value| Ok(stmt::Expr::value(discriminator.ty.convert(Value::from(value))?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(stmt::Expr::InList {
            expr: Box::new(stmt::Expr::column(Some(table_alias), &discriminator.name)),
            list,
            negated: false,
        }))
    }

    pub(crate) fn walk_condition(&mut self, condition: &Condition) -> Result<stmt::Expr> {
        Ok(match condition {
            Condition::And(items) => stmt::Expr::And(
                items
                    .iter()
                    .map(|item| self.walk_condition(item))
                    .collect::<Result<_>>()?,
            ),
            Condition::Or(items) => stmt::Expr::Or(
                items
                    .iter()
                    .map(|item| self.walk_condition(item))
                    .collect::<Result<_>>()?,
            ),
            Condition::Not(condition) => stmt::Expr::Not(Box::new(self.walk_condition(condition)?)),
            Condition::Comparison { lhs, op, rhs } => {
                let op = match op {
                    ast::ComparisonOp::Eq => BinaryOp::Eq,
                    ast::ComparisonOp::Ne => BinaryOp::Ne,
                    ast::ComparisonOp::Lt => BinaryOp::Lt,
                    ast::ComparisonOp::Le => BinaryOp::Le,
                    ast::ComparisonOp::Gt => BinaryOp::Gt,
                    ast::ComparisonOp::Ge => BinaryOp::Ge,
                };
                stmt::Expr::binary(self.walk_expr(lhs)?, op, self.walk_expr(rhs)?)
            }
            Condition::IsNull { expr, negated } => stmt::Expr::IsNull {
                expr: Box::new(self.walk_expr(expr)?),
                negated: *negated,
            },
            Condition::In {
                expr,
                list,
                negated,
            } => stmt::Expr::InList {
                expr: Box::new(self.walk_expr(expr)?),
                list: list
                    .iter()
                    .map(|item| self.walk_expr(item))
                    .collect::<Result<_>>()?,
                negated: *negated,
            },
            Condition::Like {
                expr,
                pattern,
                negated,
            } => stmt::Expr::Like {
                expr: Box::new(self.walk_expr(expr)?),
                pattern: Box::new(self.walk_expr(pattern)?),
                negated: *negated,
            },
            Condition::Between {
                expr,
                low,
                high,
                negated,
            } => stmt::Expr::Between {
                expr: Box::new(self.walk_expr(expr)?),
                low: Box::new(self.walk_expr(low)?),
                high: Box::new(self.walk_expr(high)?),
                negated: *negated,
            },
            Condition::Nested(condition) => {
                stmt::Expr::Nested(Box::new(self.walk_condition(condition)?))
            }
        })
    }

    pub(crate) fn walk_expr(&mut self, expr: &Expr) -> Result<stmt::Expr> {
        Ok(match expr {
            Expr::Alias(alias) => {
                if let Some(column_alias) = self.result_variables.get(alias) {
                    return Ok(stmt::Expr::Alias(column_alias.clone()));
                }
                self.identifier_column(alias)?
            }
            Expr::Path(path) => self.path_column(path)?,
            Expr::Literal(literal) => match literal {
                Literal::Null => stmt::Expr::Null,
                Literal::Bool(v) => stmt::Expr::value(*v),
                Literal::Integer(v) => stmt::Expr::value(*v),
                Literal::Float(v) => stmt::Expr::value(*v),
                Literal::String(v) => stmt::Expr::value(v.as_str()),
            },
            Expr::Parameter(parameter) => stmt::Expr::Param(Param::Query(parameter.clone())),
            Expr::Arithmetic { lhs, op, rhs } => {
                let op = match op {
                    ast::ArithmeticOp::Add => BinaryOp::Add,
                    ast::ArithmeticOp::Sub => BinaryOp::Sub,
                    ast::ArithmeticOp::Mul => BinaryOp::Mul,
                    ast::ArithmeticOp::Div => BinaryOp::Div,
                };
                stmt::Expr::binary(self.walk_expr(lhs)?, op, self.walk_expr(rhs)?)
            }
            Expr::Negate(expr) => stmt::Expr::Neg(Box::new(self.walk_expr(expr)?)),
            Expr::Aggregate {
                function,
                distinct,
                arg,
            } => stmt::Expr::Func {
                name: function.name(),
                distinct: *distinct,
                args: vec![self.walk_expr(arg)?],
            },
            Expr::Function {
                function: Function::Identity,
                args,
            } => match &args[..] {
                [Expr::Path(path)] => self.association_column(path)?,
                _ => {
                    return Err(Error::query_semantical(
                        expr.to_string(),
                        "IDENTITY() expects a single-valued association path expression.",
                    ))
                }
            },
            Expr::Function {
                function: Function::Concat,
                args,
            } => stmt::Expr::Concat(
                args.iter()
                    .map(|arg| self.walk_expr(arg))
                    .collect::<Result<_>>()?,
            ),
            Expr::Function { function, args } => stmt::Expr::Func {
                name: function.name(),
                distinct: false,
                args: args
                    .iter()
                    .map(|arg| self.walk_expr(arg))
                    .collect::<Result<_>>()?,
            },
            Expr::Nested(expr) => stmt::Expr::Nested(Box::new(self.walk_expr(expr)?)),
        })
    }

    /// An entity used as a value stands for its identifier column.
    fn identifier_column(&mut self, alias: &str) -> Result<stmt::Expr> {
        let class = self.class_of(alias)?;
        let table_alias = self.table_alias(alias)?;

        match &class.identifier_columns()[..] {
            [column] => Ok(stmt::Expr::column(Some(&table_alias), *column)),
            _ => Err(Error::query_semantical(
                alias,
                format!(
                    "Entity {} has a composite identifier and cannot be used as a single value.",
                    class.name
                ),
            )),
        }
    }

    fn path_column(&mut self, path: &PathExpr) -> Result<stmt::Expr> {
        let class = self.class_of(&path.alias)?;
        match path_target(&class, path)? {
            PathTarget::Field(field) => {
                let table_alias = self.table_alias(&path.alias)?;
                Ok(stmt::Expr::column(Some(&table_alias), &field.column_name))
            }
            PathTarget::Association(_) => self.association_column(path),
        }
    }

    /// The foreign key column of a single-column owning to-one association.
    fn association_column(&mut self, path: &PathExpr) -> Result<stmt::Expr> {
        let class = self.class_of(&path.alias)?;
        let assoc = match path_target(&class, path)? {
            PathTarget::Association(assoc) if assoc.is_owning_side() => assoc,
            _ => {
                return Err(Error::query_semantical(
                    path.to_string(),
                    "Invalid PathExpression. SingleValuedAssociationField with a join column expected.",
                ))
            }
        };

        match assoc.join_columns() {
            [jc] => {
                let table_alias = self.table_alias(&path.alias)?;
                Ok(stmt::Expr::column(Some(&table_alias), &jc.name))
            }
            _ => Err(Error::query_semantical(
                path.to_string(),
                "Associations with composite join columns cannot be used as a single value.",
            )),
        }
    }

    fn scalar_type(&self, expr: &Expr) -> Result<Option<FieldType>> {
        Ok(match expr {
            Expr::Aggregate {
                function: ast::AggregateFunction::Count,
                ..
            }
            | Expr::Function {
                function: Function::Length,
                ..
            } => Some(FieldType::Integer),
            Expr::Path(path) => {
                let class = self.class_of(&path.alias)?;
                class.field(&path.field).map(|field| field.ty)
            }
            _ => None,
        })
    }

    fn class_of(&self, alias: &str) -> Result<std::sync::Arc<ClassMetadata>> {
        self.components
            .get(alias)
            .map(|component| component.class.clone())
            .ok_or_else(|| Error::query_semantical(alias, format!("'{alias}' is not defined.")))
    }

    fn table_alias(&mut self, alias: &str) -> Result<String> {
        let class = self.class_of(alias)?;
        Ok(self
            .aliases
            .get(&class.table.qualified_name(), Some(alias)))
    }

    fn column_alias(&mut self, column: &str) -> String {
        let alias = format!("{column}_{}", self.column_counter);
        self.column_counter += 1;
        alias
    }
}

/// The side of `assoc` holding the join information. `target` is the
/// class `assoc` points at.
pub(crate) fn owning_side<'a>(
    target: &'a ClassMetadata,
    assoc: &'a AssociationMapping,
) -> Result<&'a AssociationMapping> {
    if assoc.is_owning_side() {
        return Ok(assoc);
    }

    let mapped_by = assoc.mapped_by().unwrap_or_default();
    target.association(mapped_by).ok_or_else(|| {
        Error::invalid_mapping(format!(
            "association `{}#{}` is mapped by `{}#{mapped_by}`, which does not exist",
            assoc.source_entity(),
            assoc.field_name(),
            target.name
        ))
    })
}

/// `left.name = right.referenced` for each join column.
pub(crate) fn key_equalities(
    join_columns: &[JoinColumn],
    left: &str,
    right: &str,
) -> Vec<stmt::Expr> {
    join_columns
        .iter()
        .map(|jc| {
            stmt::Expr::eq(
                stmt::Expr::column(Some(left), &jc.name),
                stmt::Expr::column(Some(right), &jc.referenced_column_name),
            )
        })
        .collect()
}

/// Conjunction that keeps `OR` operands grouped.
pub(crate) fn and_all(exprs: Vec<stmt::Expr>) -> Option<stmt::Expr> {
    let exprs = exprs
        .into_iter()
        .map(|expr| match expr {
            stmt::Expr::Or(_) => stmt::Expr::Nested(Box::new(expr)),
            expr => expr,
        })
        .collect();

    stmt::Expr::and_from_vec(exprs)
}

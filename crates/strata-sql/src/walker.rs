mod count;
pub use count::count_walker;

mod limit_subquery;
pub use limit_subquery::limit_subquery_walker;

mod reorder;
pub use reorder::reorder_fetch_joins;

pub(crate) mod resolve;

mod sql;
use sql::SqlWalker;

use crate::ast::{Parameter, SelectStatement};
use crate::serializer::Serializer;
use crate::stmt::{Param, Statement};
use crate::{QueryComponent, QueryComponents, ResultSetMapping};

use indexmap::IndexMap;
use strata_core::driver::Dialect;
use strata_core::mapping::AssociationMapping;
use strata_core::{Error, Result, Schema, Value};

/// A rewrite of the DQL tree applied before SQL generation.
///
/// Walkers run in the order given and each sees the output of the previous
/// one. The components describe the statement as it was parsed.
pub type TreeWalker = fn(SelectStatement, &QueryComponents) -> Result<SelectStatement>;

#[derive(Debug, Clone, Copy)]
pub struct CompileOptions<'a> {
    pub dialect: Dialect,

    pub tree_walkers: &'a [TreeWalker],

    /// `OFFSET`
    pub first_result: Option<u64>,

    /// `LIMIT`
    pub max_results: Option<u64>,
}

/// SQL text with its parameters and the mapping of its result columns.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,

    /// One entry per placeholder, in placeholder order.
    pub parameters: Vec<Param>,

    pub rsm: ResultSetMapping,
}

impl<'a> CompileOptions<'a> {
    pub fn new(dialect: Dialect) -> CompileOptions<'a> {
        CompileOptions {
            dialect,
            tree_walkers: &[],
            first_result: None,
            max_results: None,
        }
    }
}

impl CompiledQuery {
    /// Resolves the placeholders against the values bound to the query.
    pub fn bind(&self, values: &IndexMap<Parameter, Value>) -> Result<Vec<Value>> {
        self.parameters
            .iter()
            .map(|param| match param {
                Param::Value(value) => Ok(value.clone()),
                Param::Query(parameter) => values.get(parameter).cloned().ok_or_else(|| {
                    Error::query_semantical(
                        parameter.to_string(),
                        format!("Parameter '{parameter}' is not bound."),
                    )
                }),
            })
            .collect()
    }
}

/// Parses `dql` and compiles it to SQL.
pub fn compile(dql: &str, schema: &Schema, options: CompileOptions<'_>) -> Result<CompiledQuery> {
    compile_statement(crate::parse(dql)?, schema, options)
}

pub fn compile_statement(
    stmt: SelectStatement,
    schema: &Schema,
    options: CompileOptions<'_>,
) -> Result<CompiledQuery> {
    let components = resolve::resolve(&stmt, schema)?;
    let mut stmt = reorder_fetch_joins(stmt, &components)?;

    for walker in options.tree_walkers {
        stmt = walker(stmt, &components)?;
    }

    let components = if options.tree_walkers.is_empty() {
        components
    } else {
        resolve::resolve(&stmt, schema)?
    };

    let (mut select, rsm) = SqlWalker::new(schema, &components).walk_select_statement(&stmt)?;
    select.limit = options.max_results;
    select.offset = options.first_result;

    let mut parameters = vec![];
    let sql =
        Serializer::new(options.dialect).serialize(&Statement::Select(select), &mut parameters);

    log::debug!("compiled `{stmt}` to `{sql}`");

    Ok(CompiledQuery {
        sql,
        parameters,
        rsm,
    })
}

/// Compiles the select loading the elements of the to-many association
/// `assoc`. The owner is bound through named parameters called after the
/// owner's referenced columns.
pub fn compile_collection(
    schema: &Schema,
    assoc: &AssociationMapping,
    dialect: Dialect,
) -> Result<CompiledQuery> {
    if !assoc.is_to_many() {
        return Err(Error::invalid_mapping(format!(
            "association `{}#{}` is not a collection",
            assoc.source_entity(),
            assoc.field_name()
        )));
    }

    let alias = "e";
    let mut components = QueryComponents::default();
    components.insert(
        alias.to_string(),
        QueryComponent {
            class: schema.target_of(assoc)?.clone(),
            parent: None,
            relation: None,
            nesting_level: 0,
            join_kind: None,
        },
    );

    let (select, rsm) = SqlWalker::new(schema, &components).walk_collection(alias, assoc)?;

    let mut parameters = vec![];
    let sql = Serializer::new(dialect).serialize(&Statement::Select(select), &mut parameters);

    log::debug!(
        "compiled collection {}#{} to `{sql}`",
        assoc.source_entity(),
        assoc.field_name()
    );

    Ok(CompiledQuery {
        sql,
        parameters,
        rsm,
    })
}

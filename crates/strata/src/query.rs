use crate::db::QueryCacheKey;
use crate::hydration::{ResultItem, ScalarColumnHydrator, ScalarHydrator, SingleScalarHydrator};
use crate::Db;

use indexmap::IndexMap;
use std::sync::Arc;
use strata_core::{Error, Result, Value};
use strata_sql::ast::Parameter;
use strata_sql::{CompiledQuery, TreeWalker};

/// A DQL query bound to a [`Db`].
///
/// Parameters, tree walkers and limits are set with the builder methods and
/// the query runs when one of the `get_*` methods is called. A query can be
/// run more than once.
pub struct Query<'a> {
    db: &'a mut Db,
    dql: String,
    parameters: IndexMap<Parameter, Value>,
    tree_walkers: Vec<(&'static str, TreeWalker)>,
    first_result: Option<u64>,
    max_results: Option<u64>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(db: &'a mut Db, dql: &str) -> Query<'a> {
        Query {
            db,
            dql: dql.to_string(),
            parameters: IndexMap::new(),
            tree_walkers: vec![],
            first_result: None,
            max_results: None,
        }
    }

    pub fn dql(&self) -> &str {
        &self.dql
    }

    /// Binds a named (`"name"` or `":name"`) or positional (`1`) parameter.
    pub fn set_parameter(
        &mut self,
        key: impl Into<Parameter>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameter(&self, key: impl Into<Parameter>) -> Option<&Value> {
        self.parameters.get(&key.into())
    }

    /// Adds a rewrite applied to the parsed query before SQL generation.
    ///
    /// The name identifies the walker in the query cache key.
    pub fn tree_walker(&mut self, name: &'static str, walker: TreeWalker) -> &mut Self {
        self.tree_walkers.push((name, walker));
        self
    }

    pub fn first_result(&mut self, first_result: u64) -> &mut Self {
        self.first_result = Some(first_result);
        self
    }

    pub fn max_results(&mut self, max_results: u64) -> &mut Self {
        self.max_results = Some(max_results);
        self
    }

    /// The SQL the query compiles to.
    pub fn sql(&mut self) -> Result<String> {
        Ok(self.compile()?.sql.clone())
    }

    /// Runs the query and hydrates entities into the unit of work.
    pub fn get_result(&mut self) -> Result<Vec<ResultItem>> {
        let compiled = self.compile()?;
        self.db.execute_object(&compiled, &self.parameters)
    }

    /// Runs the query and returns each row as a map of result names to
    /// values.
    pub fn get_scalar_result(&mut self) -> Result<Vec<IndexMap<String, Value>>> {
        let compiled = self.compile()?;
        let rows = self.db.rows(&compiled, &self.parameters)?;
        ScalarHydrator::new(self.db.schema()).hydrate(rows, &compiled.rsm)
    }

    /// Runs the query and returns the first column of every row.
    pub fn get_single_column_result(&mut self) -> Result<Vec<Value>> {
        let compiled = self.compile()?;
        let rows = self.db.rows(&compiled, &self.parameters)?;
        ScalarColumnHydrator::new(self.db.schema()).hydrate(rows, &compiled.rsm)
    }

    /// Runs the query and returns its only value.
    ///
    /// Fails with `NoResult` when there is no row and with `NonUniqueResult`
    /// when there is more than one row or value.
    pub fn get_single_scalar_result(&mut self) -> Result<Value> {
        let compiled = self.compile()?;
        let rows = self.db.rows(&compiled, &self.parameters)?;
        SingleScalarHydrator::new(self.db.schema()).hydrate(rows, &compiled.rsm)
    }

    /// Runs the query and returns its only result.
    pub fn get_single_result(&mut self) -> Result<ResultItem> {
        let mut results = self.get_result()?;
        match results.len() {
            0 => Err(Error::no_result()),
            1 => Ok(results.remove(0)),
            _ => Err(Error::non_unique_result()),
        }
    }

    /// Like [`get_single_result`](Self::get_single_result), with `None` when
    /// there is no result.
    pub fn get_one_or_null_result(&mut self) -> Result<Option<ResultItem>> {
        let mut results = self.get_result()?;
        match results.len() {
            0 => Ok(None),
            1 => Ok(Some(results.remove(0))),
            _ => Err(Error::non_unique_result()),
        }
    }

    fn compile(&mut self) -> Result<Arc<CompiledQuery>> {
        let key = QueryCacheKey::new(
            &self.dql,
            &self.tree_walkers,
            self.first_result,
            self.max_results,
        );
        let tree_walkers: Vec<_> = self.tree_walkers.iter().map(|(_, walker)| *walker).collect();
        self.db.compile(key, &tree_walkers)
    }
}

impl core::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Query")
            .field("dql", &self.dql)
            .field("parameters", &self.parameters)
            .field("first_result", &self.first_result)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

mod builder;
pub use builder::Builder;

mod connect;
pub use connect::Connect;

use crate::hydration::{ObjectHydrator, ResultItem};
use crate::unit_of_work::Pending;
use crate::{Entity, EntityId, EntityState, Query, UnitOfWork};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::driver::{Capability, Driver};
use strata_core::{Connection, Error, Result, Schema, Value};
use strata_sql::ast::Parameter;
use strata_sql::{compile_collection, CompiledQuery, Serializer, Statement, TreeWalker};

/// Key of a compiled query in the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct QueryCacheKey {
    pub(crate) dql: String,
    pub(crate) tree_walkers: Vec<&'static str>,
    pub(crate) first_result: Option<u64>,
    pub(crate) max_results: Option<u64>,
}

impl QueryCacheKey {
    pub(crate) fn new(
        dql: &str,
        tree_walkers: &[(&'static str, TreeWalker)],
        first_result: Option<u64>,
        max_results: Option<u64>,
    ) -> QueryCacheKey {
        QueryCacheKey {
            dql: dql.to_string(),
            tree_walkers: tree_walkers.iter().map(|(name, _)| *name).collect(),
            first_result,
            max_results,
        }
    }
}

/// A database handle: one connection, the mapping schema and the unit of
/// work tracking the entities loaded through it.
pub struct Db {
    schema: Arc<Schema>,
    driver: Box<dyn Driver>,
    connection: Box<dyn Connection>,
    uow: UnitOfWork,
    query_cache: Option<HashMap<QueryCacheKey, Arc<CompiledQuery>>>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn capability(&self) -> &'static Capability {
        self.driver.capability()
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }

    /// Creates the tables of every registered entity.
    pub fn push_schema(&mut self) -> Result<()> {
        let serializer = Serializer::new(self.capability().dialect);

        for stmt in Statement::create_tables(&self.schema)? {
            let mut params = vec![];
            let sql = serializer.serialize(&stmt, &mut params);
            log::debug!("{sql}");
            self.connection.execute(&sql, &[])?;
        }

        Ok(())
    }

    pub fn create_query(&mut self, dql: &str) -> Query<'_> {
        Query::new(self, dql)
    }

    pub fn create(&mut self, class: &str) -> Result<EntityId> {
        self.uow.create(class)
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.uow.get(id)
    }

    pub fn state(&self, id: EntityId) -> Result<EntityState> {
        self.uow.state(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.uow.contains(id)
    }

    pub fn set(&mut self, id: EntityId, field: &str, value: impl Into<Value>) -> Result<()> {
        self.uow.set(id, field, value)
    }

    pub fn set_reference(
        &mut self,
        id: EntityId,
        field: &str,
        target: Option<EntityId>,
    ) -> Result<()> {
        self.uow.set_reference(id, field, target)
    }

    /// Adds `element` to a collection, loading the collection first when
    /// it is not initialized.
    pub fn add_to_collection(
        &mut self,
        id: EntityId,
        field: &str,
        element: EntityId,
    ) -> Result<()> {
        self.initialize_collection_if_needed(id, field)?;
        self.uow.add_to_collection(id, field, element)
    }

    pub fn remove_from_collection(
        &mut self,
        id: EntityId,
        field: &str,
        element: EntityId,
    ) -> Result<()> {
        self.initialize_collection_if_needed(id, field)?;
        self.uow.remove_from_collection(id, field, element)
    }

    pub fn persist(&mut self, id: EntityId) -> Result<()> {
        self.uow.persist(id)
    }

    /// Schedules `id` for deletion. Collections that cascade the removal are
    /// loaded first so their elements are removed too.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        let mut stack = vec![id];
        let mut visited = vec![];

        while let Some(id) = stack.pop() {
            if visited.contains(&id) || !self.uow.contains(id) {
                continue;
            }
            visited.push(id);

            let class = self.uow.get(id)?.class().clone();
            for assoc in class.associations.values() {
                if !assoc.is_cascade_remove() {
                    continue;
                }

                if assoc.is_to_many() {
                    self.initialize_collection_if_needed(id, assoc.field_name())?;
                    if let Some(collection) = self.uow.get(id)?.collection(assoc.field_name()) {
                        stack.extend(collection.items());
                    }
                } else if let Some(target) = self.uow.get(id)?.reference(assoc.field_name()) {
                    stack.push(target);
                }
            }
        }

        self.uow.remove(id)
    }

    pub fn flush(&mut self) -> Result<()> {
        let capability = self.driver.capability();
        self.uow.flush(&mut *self.connection, capability)
    }

    pub fn clear(&mut self) {
        self.uow.clear();
    }

    /// Finds an entity by identifier. Composite identifiers are passed as a
    /// list in identifier order.
    pub fn find(&mut self, class: &str, id: impl Into<Value>) -> Result<Option<EntityId>> {
        let class = self.schema.class(class)?.clone();
        let columns = class.identifier_columns();

        let key = match id.into() {
            Value::List(values) => values,
            value => vec![value],
        };
        if key.len() != columns.len() {
            return Err(Error::invalid_entity_state(format!(
                "`{}` is identified by {} values, got {}",
                class.name,
                columns.len(),
                key.len()
            )));
        }

        let key = columns
            .iter()
            .zip(key)
            .map(|(column, value)| match class.field_for_column(column) {
                Some(field) => field.ty.convert(value),
                None => Ok(value),
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(found) = self.uow.lookup(&class, &key) {
            if !self.uow.get(found)?.is_initialized() {
                self.initialize(found)?;
            }
            return Ok(Some(found));
        }

        let found = self.load_by_identifier(&class.name, &class.identifier, key)?;
        Ok(found)
    }

    /// Loads an uninitialized reference in place.
    pub fn initialize(&mut self, id: EntityId) -> Result<()> {
        let entity = self.uow.get(id)?;
        if entity.is_initialized() {
            return Ok(());
        }

        let class = entity.class().clone();
        let key = self.uow.identifier(id)?;
        let root = self.schema.root_of(&class)?.name.clone();

        match self.load_by_identifier(&root, &class.identifier, key)? {
            Some(loaded) if loaded == id => Ok(()),
            _ => Err(Error::invalid_entity_state(format!(
                "entity of class `{}` with identifier {:?} was not found",
                class.name,
                self.uow.identifier(id)?
            ))),
        }
    }

    /// Loads the elements of a collection, replacing what it held.
    pub fn initialize_collection(&mut self, id: EntityId, field: &str) -> Result<()> {
        let class = self.uow.get(id)?.class().clone();
        let Some(assoc) = class.association(field) else {
            return Err(Error::invalid_entity_state(format!(
                "class `{}` has no association `{field}`",
                class.name
            )));
        };

        let compiled = compile_collection(&self.schema, assoc, self.capability().dialect)?;

        let mut owner = IndexMap::new();
        for param in &compiled.parameters {
            if let strata_sql::stmt::Param::Query(parameter @ Parameter::Named(column)) = param {
                owner.insert(parameter.clone(), self.uow.column_value(id, column)?);
            }
        }

        let results = self.execute_object(&compiled, &owner)?;
        let items = results.iter().filter_map(ResultItem::as_entity).collect();
        self.uow.set_loaded_collection(id, field, items);

        self.resolve_pending()
    }

    fn initialize_collection_if_needed(&mut self, id: EntityId, field: &str) -> Result<()> {
        let entity = self.uow.get(id)?;
        let uninitialized = entity
            .collection(field)
            .is_some_and(|collection| !collection.is_initialized());

        if uninitialized && entity.state() == EntityState::Managed {
            self.initialize_collection(id, field)?;
        }
        Ok(())
    }

    fn load_by_identifier(
        &mut self,
        class: &str,
        identifier: &[String],
        key: Vec<Value>,
    ) -> Result<Option<EntityId>> {
        let filter = identifier
            .iter()
            .enumerate()
            .map(|(index, field)| format!("e.{field} = :id{index}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let dql = format!("SELECT e FROM {class} e WHERE {filter}");

        let mut query = self.create_query(&dql);
        for (index, value) in key.into_iter().enumerate() {
            query.set_parameter(format!("id{index}"), value);
        }

        Ok(query.get_one_or_null_result()?.and_then(|item| item.as_entity()))
    }

    /// Loads the entity on the inverse side of a one-to-one association.
    fn load_inverse_one_to_one(&mut self, id: EntityId, field: &str) -> Result<()> {
        let class = self.uow.get(id)?.class().clone();
        let Some(assoc) = class.association(field) else {
            return Ok(());
        };
        let Some(mapped_by) = assoc.mapped_by() else {
            return Ok(());
        };

        let target = self.schema.target_of(assoc)?.clone();
        let owning = target.association(mapped_by).ok_or_else(|| {
            Error::invalid_mapping(format!(
                "`{}#{field}` is mapped by unknown association `{}#{mapped_by}`",
                class.name, target.name
            ))
        })?;
        let [jc] = owning.join_columns() else {
            return Err(Error::invalid_mapping(format!(
                "`{}#{mapped_by}` must have a single join column",
                target.name
            )));
        };
        let value = self.uow.column_value(id, &jc.referenced_column_name)?;

        let dql = format!("SELECT e FROM {} e WHERE e.{mapped_by} = :owner", target.name);
        let found = self
            .create_query(&dql)
            .set_parameter("owner", value)
            .get_one_or_null_result()?
            .and_then(|item| item.as_entity());

        self.uow.set_loaded_reference(id, field, found);
        Ok(())
    }

    /// Compiles a query, reusing the cached result when the query cache is
    /// enabled.
    pub(crate) fn compile(
        &mut self,
        key: QueryCacheKey,
        tree_walkers: &[TreeWalker],
    ) -> Result<Arc<CompiledQuery>> {
        if let Some(compiled) = self.query_cache.as_ref().and_then(|cache| cache.get(&key)) {
            log::trace!("query cache hit; dql={}", key.dql);
            return Ok(compiled.clone());
        }

        let mut options = strata_sql::CompileOptions::new(self.capability().dialect);
        options.tree_walkers = tree_walkers;
        options.first_result = key.first_result;
        options.max_results = key.max_results;

        let compiled = Arc::new(strata_sql::compile(&key.dql, &self.schema, options)?);

        if let Some(cache) = &mut self.query_cache {
            cache.insert(key, compiled.clone());
        }

        Ok(compiled)
    }

    pub(crate) fn rows(
        &mut self,
        compiled: &CompiledQuery,
        parameters: &IndexMap<Parameter, Value>,
    ) -> Result<strata_core::driver::Rows> {
        let params = compiled.bind(parameters)?;
        log::debug!("{}; params={params:?}", compiled.sql);
        self.connection.query(&compiled.sql, &params)
    }

    /// Runs a compiled query through the object hydrator and loads what
    /// the hydration left pending.
    pub(crate) fn execute_object(
        &mut self,
        compiled: &CompiledQuery,
        parameters: &IndexMap<Parameter, Value>,
    ) -> Result<Vec<ResultItem>> {
        let rows = self.rows(compiled, parameters)?;
        let results =
            ObjectHydrator::new(&self.schema, &mut self.uow).hydrate(rows, &compiled.rsm)?;
        self.resolve_pending()?;
        Ok(results)
    }

    fn resolve_pending(&mut self) -> Result<()> {
        while let Some(pending) = self.uow.pop_pending() {
            match pending {
                Pending::Reference(id) => self.initialize(id)?,
                Pending::Collection(id, field) => {
                    let initialized = self
                        .uow
                        .get(id)?
                        .collection(&field)
                        .is_some_and(|collection| collection.is_initialized());
                    if !initialized {
                        self.initialize_collection(id, &field)?;
                    }
                }
                Pending::InverseToOne(id, field) => {
                    if !self.uow.get(id)?.references.contains_key(&field) {
                        self.load_inverse_one_to_one(id, &field)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl core::fmt::Debug for Db {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Db")
            .field("driver", &self.driver)
            .field("classes", &self.schema.len())
            .finish_non_exhaustive()
    }
}

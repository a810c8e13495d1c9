use super::{EntityId, EntityState, UnitOfWork};

use std::collections::HashSet;
use strata_core::driver::Capability;
use strata_core::{Connection, Error, Result, Value};
use strata_sql::persister::{self, ColumnValues};
use strata_sql::stmt::{Param, Statement};
use strata_sql::Serializer;

impl UnitOfWork {
    /// Writes every scheduled change to the database.
    ///
    /// New entities are inserted so that an entity is written after the
    /// entities its foreign keys point at. Foreign keys inside a cycle are
    /// inserted as null and set by a follow-up update.
    pub fn flush(&mut self, conn: &mut dyn Connection, capability: &Capability) -> Result<()> {
        self.persist_reachable()?;

        let order = self.commit_order();
        log::debug!(
            "flush; inserts={} removals={}",
            order.len(),
            self.scheduled_removals.len()
        );

        let mut inserted = HashSet::new();
        for id in order {
            self.insert(conn, capability, id)?;
            inserted.insert(id);
        }

        for index in 0..self.entities.len() {
            let id = EntityId(index);
            if self.entities[index].state == EntityState::Managed {
                self.update(conn, capability, id)?;
                self.sync_collections(conn, capability, id, inserted.contains(&id))?;
            }
        }

        let removals: Vec<_> = self.scheduled_removals.iter().rev().copied().collect();
        for id in removals {
            self.delete(conn, capability, id)?;
        }

        self.scheduled_inserts.clear();
        self.scheduled_removals.clear();
        Ok(())
    }

    /// Persists new entities reachable through cascading associations and
    /// rejects the ones reachable through any other association.
    fn persist_reachable(&mut self) -> Result<()> {
        let mut stack: Vec<EntityId> = (0..self.entities.len())
            .map(EntityId)
            .filter(|id| self.entities[id.0].state == EntityState::Managed)
            .collect();
        let mut visited = HashSet::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            for (assoc, target) in self.links(id)? {
                match self.entities[target.0].state {
                    EntityState::New if assoc.is_cascade_persist() => {
                        self.persist(target)?;
                        stack.push(target);
                    }
                    EntityState::New => {
                        return Err(Error::invalid_entity_state(format!(
                            "a new entity was found through the relationship `{}#{}` that was \
                             not configured to cascade persist operations",
                            self.entities[id.0].class.name,
                            assoc.field_name()
                        )))
                    }
                    EntityState::Managed => stack.push(target),
                    EntityState::Detached | EntityState::Removed => {}
                }
            }
        }

        Ok(())
    }

    fn commit_order(&self) -> Vec<EntityId> {
        let mut order = vec![];
        let mut visited = HashSet::new();

        for id in &self.scheduled_inserts {
            self.visit(*id, &mut visited, &mut order);
        }

        order
    }

    fn visit(&self, id: EntityId, visited: &mut HashSet<EntityId>, order: &mut Vec<EntityId>) {
        if !visited.insert(id) {
            return;
        }

        let entity = &self.entities[id.0];
        for assoc in entity.class.associations.values() {
            if !(assoc.is_to_one() && assoc.is_owning_side()) {
                continue;
            }

            if let Some(target) = entity.reference(assoc.field_name()) {
                if self.scheduled_inserts.contains(&target) {
                    self.visit(target, visited, order);
                }
            }
        }

        order.push(id);
    }

    fn insert(
        &mut self,
        conn: &mut dyn Connection,
        capability: &Capability,
        id: EntityId,
    ) -> Result<()> {
        let class = self.entities[id.0].class.clone();
        let generated = class.is_id_generator_identity();

        let mut values = ColumnValues::new();
        for field in class.fields.values() {
            let value = self.entities[id.0]
                .get(&field.field_name)
                .cloned()
                .unwrap_or_default();
            if field.id && generated && value.is_null() {
                continue;
            }
            values.insert(field.column_name.clone(), value);
        }

        // References to entities without an identifier yet.
        let mut deferred = vec![];

        for assoc in class.associations.values() {
            if !(assoc.is_to_one() && assoc.is_owning_side()) {
                continue;
            }

            let target = self.entities[id.0].reference(assoc.field_name());
            for jc in assoc.join_columns() {
                let value = match target {
                    Some(target) => self.column_value(target, &jc.referenced_column_name)?,
                    None => Value::Null,
                };

                if target.is_some() && value.is_null() {
                    deferred.push(assoc.field_name().to_string());
                }
                values.entry(jc.name.clone()).or_insert(value);
            }
        }

        let stmt = persister::insert(&class, &values, capability)?;
        let returning = matches!(&stmt, Statement::Insert(insert) if !insert.returning.is_empty());

        if returning {
            let rows = self.query(conn, capability, &stmt)?;
            if generated {
                let value = rows.into_iter().next().and_then(|row| row.into_values().next());
                self.assign_identifier(id, value.unwrap_or_default())?;
            }
        } else {
            self.execute(conn, capability, &stmt)?;
            if generated {
                let value = conn.last_insert_id()?;
                self.assign_identifier(id, value)?;
            }
        }

        let key = self.identifier(id)?;
        let identity = super::identity_key(&class, &key);
        self.identity_map.insert(identity, id);

        let entity = &mut self.entities[id.0];
        entity.snapshot();
        if let Some(original) = &mut entity.original {
            for field in deferred {
                original.references.insert(field, None);
            }
        }

        Ok(())
    }

    fn assign_identifier(&mut self, id: EntityId, value: Value) -> Result<()> {
        let entity = &mut self.entities[id.0];
        let Some(field) = entity
            .class
            .identifier
            .first()
            .and_then(|name| entity.class.field(name))
        else {
            return Err(Error::invalid_mapping(format!(
                "class `{}` has a generated identifier but no identifier field",
                entity.class.name
            )));
        };

        if value.is_null() {
            return Err(Error::invalid_entity_state(format!(
                "no identifier was generated for `{}`",
                entity.class.name
            )));
        }

        let value = field.ty.convert(value)?;
        let name = field.field_name.clone();
        entity.fields.insert(name, value);
        Ok(())
    }

    fn update(
        &mut self,
        conn: &mut dyn Connection,
        capability: &Capability,
        id: EntityId,
    ) -> Result<()> {
        let entity = &self.entities[id.0];
        let Some(original) = &entity.original else {
            return Ok(());
        };
        if !entity.initialized {
            return Ok(());
        }

        let class = entity.class.clone();
        let mut changes = ColumnValues::new();

        for field in class.fields.values() {
            let current = entity.get(&field.field_name).cloned().unwrap_or_default();
            let previous = original
                .fields
                .get(&field.field_name)
                .cloned()
                .unwrap_or_default();
            if current != previous {
                changes.insert(field.column_name.clone(), current);
            }
        }

        for assoc in class.associations.values() {
            if !(assoc.is_to_one() && assoc.is_owning_side()) {
                continue;
            }

            let current = entity.reference(assoc.field_name());
            let previous = original.references.get(assoc.field_name()).copied().flatten();
            if current == previous {
                continue;
            }

            for jc in assoc.join_columns() {
                let value = match current {
                    Some(target) => self.column_value(target, &jc.referenced_column_name)?,
                    None => Value::Null,
                };
                changes.insert(jc.name.clone(), value);
            }
        }

        let key = self.identifier_columns(id)?;
        if let Some(stmt) = persister::update(&class, &changes, &key)? {
            self.execute(conn, capability, &stmt)?;
        }

        self.entities[id.0].snapshot();
        Ok(())
    }

    /// Rewrites the join table rows of dirty owning many-to-many
    /// collections.
    fn sync_collections(
        &mut self,
        conn: &mut dyn Connection,
        capability: &Capability,
        id: EntityId,
        inserted: bool,
    ) -> Result<()> {
        let class = self.entities[id.0].class.clone();

        for assoc in class.associations.values() {
            if assoc.join_table().is_none() || !assoc.is_owning_side() {
                continue;
            }

            let items = match self.entities[id.0].collection(assoc.field_name()) {
                Some(collection) if collection.dirty => collection.items.clone(),
                _ => continue,
            };

            let owner = self.row(id)?;
            if !inserted {
                self.execute(conn, capability, &persister::delete_bridge(assoc, &owner)?)?;
            }

            for item in items {
                let element = self.row(item)?;
                self.execute(
                    conn,
                    capability,
                    &persister::insert_bridge(assoc, &owner, &element)?,
                )?;
            }

            if let Some(collection) = self.entities[id.0]
                .collections
                .get_mut(assoc.field_name())
            {
                collection.dirty = false;
            }
        }

        Ok(())
    }

    fn delete(
        &mut self,
        conn: &mut dyn Connection,
        capability: &Capability,
        id: EntityId,
    ) -> Result<()> {
        let class = self.entities[id.0].class.clone();
        let key = self.identifier_columns(id)?;

        for assoc in class.associations.values() {
            if assoc.join_table().is_some() && assoc.is_owning_side() {
                let owner = self.row(id)?;
                self.execute(conn, capability, &persister::delete_bridge(assoc, &owner)?)?;
            }
        }

        self.execute(conn, capability, &persister::delete(&class, &key)?)?;

        let identity = super::identity_key(&class, &self.identifier(id)?);
        self.identity_map.remove(&identity);
        self.entities[id.0].state = EntityState::Detached;
        Ok(())
    }

    /// Every column of the row of `id`.
    fn row(&self, id: EntityId) -> Result<ColumnValues> {
        let class = &self.entities[id.0].class;
        class
            .column_names()
            .into_iter()
            .map(|column| Ok((column.to_string(), self.column_value(id, column)?)))
            .collect()
    }

    fn identifier_columns(&self, id: EntityId) -> Result<ColumnValues> {
        let class = &self.entities[id.0].class;
        class
            .identifier_columns()
            .into_iter()
            .map(|column| Ok((column.to_string(), self.column_value(id, column)?)))
            .collect()
    }

    fn execute(
        &self,
        conn: &mut dyn Connection,
        capability: &Capability,
        stmt: &Statement,
    ) -> Result<u64> {
        let (sql, params) = to_sql(stmt, capability)?;
        log::debug!("{sql}; params={params:?}");
        conn.execute(&sql, &params)
    }

    fn query(
        &self,
        conn: &mut dyn Connection,
        capability: &Capability,
        stmt: &Statement,
    ) -> Result<Vec<strata_core::driver::Row>> {
        let (sql, params) = to_sql(stmt, capability)?;
        log::debug!("{sql}; params={params:?}");
        conn.query(&sql, &params)?.into_vec()
    }
}

fn to_sql(stmt: &Statement, capability: &Capability) -> Result<(String, Vec<Value>)> {
    let mut params = vec![];
    let sql = Serializer::new(capability.dialect).serialize(stmt, &mut params);

    let values = params
        .into_iter()
        .map(|param| match param {
            Param::Value(value) => Ok(value),
            Param::Query(parameter) => Err(Error::query_semantical(
                parameter.to_string(),
                format!("Parameter '{parameter}' is not bound."),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((sql, values))
}

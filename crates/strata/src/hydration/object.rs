use super::{convert, entity_class, ResultItem};
use crate::{EntityId, UnitOfWork};

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strata_core::driver::{Row, Rows};
use strata_core::mapping::ClassMetadata;
use strata_core::{Error, Result, Schema, Value};
use strata_sql::{ColumnKind, ResultSetMapping};

/// Builds entity graphs from rows.
///
/// Entities are created, or reused when already managed, through the
/// [`UnitOfWork`]. Fetch-joined associations are wired up as rows arrive;
/// a parent repeated over many rows is reported once.
pub struct ObjectHydrator<'a> {
    schema: &'a Schema,
    uow: &'a mut UnitOfWork,
}

/// State of one hydration run.
#[derive(Default)]
struct Run {
    /// `(alias, parent, identifier)` of every entity seen so far.
    seen: HashMap<(String, Option<EntityId>, String), EntityId>,

    /// Root `(alias, identifier)` to its position in the result.
    positions: HashMap<(String, String), usize>,

    /// Entities whose values were written by this run.
    hydrated: HashSet<EntityId>,

    /// Fetch-joined collections met in this run, and whether this run
    /// initialized them.
    collections: HashMap<(EntityId, String), bool>,

    results: Vec<ResultItem>,
}

/// Values of one row, grouped per entity alias.
#[derive(Default)]
struct RowData {
    fields: IndexMap<String, IndexMap<String, Value>>,
    meta: IndexMap<String, IndexMap<String, Value>>,
    scalars: IndexMap<String, Value>,
}

impl<'a> ObjectHydrator<'a> {
    pub fn new(schema: &'a Schema, uow: &'a mut UnitOfWork) -> ObjectHydrator<'a> {
        ObjectHydrator { schema, uow }
    }

    pub fn hydrate(&mut self, rows: Rows, rsm: &ResultSetMapping) -> Result<Vec<ResultItem>> {
        let mut run = Run::default();
        let mut count = 0;
        let aliases = parents_first(rsm);

        for row in rows {
            self.hydrate_row(row?, rsm, &aliases, &mut run)?;
            count += 1;
        }

        log::trace!(
            "hydrated {count} rows into {} results",
            run.results.len()
        );
        Ok(run.results)
    }

    fn hydrate_row(
        &mut self,
        row: Row,
        rsm: &ResultSetMapping,
        aliases: &[(&String, &String)],
        run: &mut Run,
    ) -> Result<()> {
        let mut data = self.gather(row, rsm)?;
        let mixed = rsm.is_mixed() || !rsm.has_entities();

        let mut row_entities: HashMap<&str, Option<EntityId>> = HashMap::new();
        let mut roots = vec![];

        for &(alias, class_name) in aliases {
            let fields = data.fields.swap_remove(alias).unwrap_or_default();
            let meta = data.meta.swap_remove(alias).unwrap_or_default();

            let class = self.concrete_class(rsm, alias, self.schema.class(class_name)?, &meta)?;
            let key = UnitOfWork::row_identifier(&class, &fields, &meta);

            let Some(parent_alias) = rsm.parent_alias_map.get(alias) else {
                let entity = match &key {
                    Some(key) => {
                        let seen = (alias.clone(), None, format!("{key:?}"));
                        let entity = match run.seen.get(&seen) {
                            Some(entity) => *entity,
                            None => {
                                let (entity, filled) = self.uow.load(&class, key, fields, &meta)?;
                                if filled {
                                    run.hydrated.insert(entity);
                                }
                                run.seen.insert(seen, entity);
                                entity
                            }
                        };
                        roots.push((alias, format!("{key:?}"), entity));
                        Some(entity)
                    }
                    None => None,
                };

                row_entities.insert(alias, entity);
                continue;
            };

            let Some(parent) = row_entities.get(parent_alias.as_str()).copied() else {
                return Err(Error::unknown_result_alias(parent_alias, alias));
            };
            let Some(parent) = parent else {
                row_entities.insert(alias, None);
                continue;
            };

            let relation = &rsm.relation_map[alias];
            let parent_class = self.uow.get(parent)?.class().clone();
            let Some(assoc) = parent_class.association(relation).cloned() else {
                return Err(Error::invalid_mapping(format!(
                    "class `{}` has no association `{relation}`",
                    parent_class.name
                )));
            };

            let started = if assoc.is_to_many() {
                let collection = (parent, relation.clone());
                match run.collections.get(&collection) {
                    Some(started) => *started,
                    None => {
                        let started = self.uow.begin_loaded_collection(parent, relation);
                        run.collections.insert(collection, started);
                        started
                    }
                }
            } else {
                false
            };

            let element = match &key {
                Some(key) => {
                    let seen = (alias.clone(), Some(parent), format!("{key:?}"));
                    let element = match run.seen.get(&seen) {
                        Some(element) => *element,
                        None => {
                            let (element, filled) = self.uow.load(&class, key, fields, &meta)?;
                            if filled {
                                run.hydrated.insert(element);
                            }
                            run.seen.insert(seen, element);
                            element
                        }
                    };
                    Some(element)
                }
                None => None,
            };

            // Entities initialized before this run keep their associations,
            // unflushed changes included.
            if assoc.is_to_many() {
                if let (Some(element), true) = (element, started) {
                    self.uow.push_loaded(parent, relation, element);
                }
            } else {
                if run.hydrated.contains(&parent) {
                    self.uow.set_loaded_reference(parent, relation, element);
                }

                // Bidirectional one-to-one: the element points back.
                let inverse = assoc.inversed_by().or(assoc.mapped_by());
                if let (Some(element), Some(inverse)) = (element, inverse) {
                    if run.hydrated.contains(&element)
                        && class.association(inverse).is_some_and(|a| a.is_to_one())
                    {
                        self.uow.set_loaded_reference(element, inverse, Some(parent));
                    }
                }
            }

            row_entities.insert(alias, element);
        }

        if !mixed {
            for (alias, key, entity) in roots {
                if run
                    .positions
                    .insert((alias.clone(), key), run.results.len())
                    .is_none()
                {
                    run.results.push(ResultItem::Entity(entity));
                }
            }
            return Ok(());
        }

        // Mixed results: the first root entity decides which result the row
        // contributes to.
        let position = match roots.first() {
            Some((alias, key, _)) => run.positions.get(&((*alias).clone(), key.clone())).copied(),
            None => None,
        };

        let position = match position {
            Some(position) => position,
            None => {
                run.results.push(ResultItem::Mixed {
                    entities: IndexMap::new(),
                    scalars: IndexMap::new(),
                });
                run.results.len() - 1
            }
        };

        for (alias, key, _) in &roots {
            run.positions
                .entry(((*alias).clone(), key.clone()))
                .or_insert(position);
        }

        if let ResultItem::Mixed { entities, scalars } = &mut run.results[position] {
            for (index, (alias, _, entity)) in roots.iter().enumerate() {
                let result_key = rsm
                    .entity_mappings
                    .get(*alias)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| index.to_string());
                entities.insert(result_key, *entity);
            }

            scalars.extend(data.scalars);
        }

        Ok(())
    }

    /// Splits a row into per-alias field values, meta values and scalars,
    /// converting each through its mapped type.
    fn gather(&self, row: Row, rsm: &ResultSetMapping) -> Result<RowData> {
        let mut data = RowData::default();

        for (column, value) in row {
            match rsm.column(&column) {
                None => {}
                Some(ColumnKind::Field(field)) => {
                    let class = entity_class(
                        self.schema,
                        rsm,
                        &field.alias,
                        &column,
                        field.declaring_class.as_deref(),
                    )?;
                    let Some(mapping) = class.field(&field.field) else {
                        return Err(Error::invalid_mapping(format!(
                            "result column `{column}` maps to unknown field `{}#{}`",
                            class.name, field.field
                        )));
                    };

                    data.fields
                        .entry(field.alias.clone())
                        .or_default()
                        .insert(field.field.clone(), mapping.ty.convert(value)?);
                }
                Some(ColumnKind::Meta(meta)) => {
                    entity_class(self.schema, rsm, &meta.alias, &column, None)?;
                    data.meta
                        .entry(meta.alias.clone())
                        .or_default()
                        .insert(meta.column.clone(), convert(meta.ty, value)?);
                }
                Some(ColumnKind::Scalar(scalar)) => {
                    data.scalars
                        .insert(scalar.name.clone(), convert(scalar.ty, value)?);
                }
            }
        }

        Ok(data)
    }

    /// The class named by the row's discriminator value, or `class` when
    /// the alias has no discriminator column.
    fn concrete_class(
        &self,
        rsm: &ResultSetMapping,
        alias: &str,
        class: &Arc<ClassMetadata>,
        meta: &IndexMap<String, Value>,
    ) -> Result<Arc<ClassMetadata>> {
        let (true, Some(column)) = (
            rsm.discriminator_columns.contains_key(alias),
            &class.discriminator_column,
        ) else {
            return Ok(class.clone());
        };

        let Some(value) = meta.get(&column.name).filter(|value| !value.is_null()) else {
            return Ok(class.clone());
        };

        let name = class
            .discriminator_key(value)
            .and_then(|key| class.discriminator_map.get(&key));
        match name {
            Some(name) => Ok(self.schema.class(name)?.clone()),
            None => Err(Error::invalid_entity_state(format!(
                "the discriminator value {value} is invalid for `{}`; known values are {:?}",
                class.name,
                class.discriminator_map.keys().collect::<Vec<_>>()
            ))),
        }
    }
}

/// Aliases of the mapping, each joined alias after its parent.
fn parents_first(rsm: &ResultSetMapping) -> Vec<(&String, &String)> {
    let depth = |alias: &str| {
        let mut depth = 0;
        let mut current = alias;
        // A cyclic chain stops at the alias count.
        while let Some(parent) = rsm.parent_alias_map.get(current) {
            depth += 1;
            if depth > rsm.alias_map.len() {
                break;
            }
            current = parent.as_str();
        }
        depth
    };

    let mut aliases: Vec<_> = rsm.alias_map.iter().collect();
    aliases.sort_by_key(|(alias, _)| depth(alias.as_str()));
    aliases
}

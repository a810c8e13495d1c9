//! Turning result rows into values and entity graphs.
//!
//! Every hydrator reads its [`Rows`](strata_core::driver::Rows) exactly once,
//! front to back. Columns the [`ResultSetMapping`] does not know are not
//! reported.

mod object;
pub use object::ObjectHydrator;

mod scalar;
pub use scalar::ScalarHydrator;

mod scalar_column;
pub use scalar_column::ScalarColumnHydrator;

mod single_scalar;
pub use single_scalar::SingleScalarHydrator;

use crate::EntityId;

use indexmap::IndexMap;
use std::sync::Arc;
use strata_core::driver::Row;
use strata_core::mapping::{ClassMetadata, FieldType};
use strata_core::{Error, Result, Schema, Value};
use strata_sql::{ColumnKind, ResultSetMapping};

/// One element of an object query result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultItem {
    /// A root entity of a query selecting entities only.
    Entity(EntityId),

    /// Entities and scalar values selected together.
    Mixed {
        /// Keyed by result alias, or by position when the entity has none.
        entities: IndexMap<String, EntityId>,
        scalars: IndexMap<String, Value>,
    },
}

impl ResultItem {
    /// The entity of a pure entity result.
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            ResultItem::Entity(id) => Some(*id),
            ResultItem::Mixed { .. } => None,
        }
    }

    /// An entity of a mixed result.
    pub fn entity(&self, key: &str) -> Option<EntityId> {
        match self {
            ResultItem::Entity(_) => None,
            ResultItem::Mixed { entities, .. } => entities.get(key).copied(),
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&Value> {
        match self {
            ResultItem::Entity(_) => None,
            ResultItem::Mixed { scalars, .. } => scalars.get(name),
        }
    }
}

/// The reportable values of one row: field results keyed `alias_field`,
/// meta results keyed `alias_column` and scalars by their result name.
pub(crate) fn scalar_row(
    schema: &Schema,
    rsm: &ResultSetMapping,
    row: Row,
) -> Result<IndexMap<String, Value>> {
    let mut ret = IndexMap::new();

    for (column, value) in row {
        match rsm.column(&column) {
            None => {}
            Some(ColumnKind::Scalar(scalar)) => {
                ret.insert(scalar.name.clone(), convert(scalar.ty, value)?);
            }
            Some(ColumnKind::Field(field)) => {
                let class = entity_class(
                    schema,
                    rsm,
                    &field.alias,
                    &column,
                    field.declaring_class.as_deref(),
                )?;
                let ty = class.field(&field.field).map(|mapping| mapping.ty);
                ret.insert(
                    format!("{}_{}", field.alias, field.field),
                    convert(ty, value)?,
                );
            }
            Some(ColumnKind::Meta(meta)) => {
                entity_class(schema, rsm, &meta.alias, &column, None)?;
                ret.insert(
                    format!("{}_{}", meta.alias, meta.column),
                    convert(meta.ty, value)?,
                );
            }
        }
    }

    Ok(ret)
}

/// Class of an entity alias referenced by `column`. Fails when the alias,
/// or the parent of a joined alias, is not an entity result.
pub(crate) fn entity_class<'a>(
    schema: &'a Schema,
    rsm: &ResultSetMapping,
    alias: &str,
    column: &str,
    declaring_class: Option<&str>,
) -> Result<&'a Arc<ClassMetadata>> {
    let Some(class) = rsm.alias_map.get(alias) else {
        return Err(Error::unknown_result_alias(alias, column));
    };

    if let Some(parent) = rsm.parent_alias_map.get(alias) {
        if !rsm.alias_map.contains_key(parent) {
            return Err(Error::unknown_result_alias(parent, column));
        }
    }

    schema.class(declaring_class.unwrap_or(class))
}

pub(crate) fn convert(ty: Option<FieldType>, value: Value) -> Result<Value> {
    match ty {
        Some(ty) => ty.convert(value),
        None => Ok(value),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use strata_core::map;
    use strata_core::mapping::{AssociationKind, ClassDefinition, FieldType, MetadataFactory};
    use strata_core::{Schema, Value};

    /// Users with articles, as used by the hydrator tests.
    pub(crate) fn schema() -> Schema {
        let mut factory = MetadataFactory::new();
        factory
            .register(
                ClassDefinition::entity("CmsUser")
                    .id("id", FieldType::Integer)
                    .field("name", FieldType::String)
                    .association(map! {
                        "type" => AssociationKind::OneToMany.code(),
                        "fieldName" => "articles",
                        "targetEntity" => "CmsArticle",
                        "mappedBy" => "user",
                    }),
            )
            .register(
                ClassDefinition::entity("CmsArticle")
                    .id("id", FieldType::Integer)
                    .field("topic", FieldType::String)
                    .association(map! {
                        "type" => AssociationKind::ManyToOne.code(),
                        "fieldName" => "user",
                        "targetEntity" => "CmsUser",
                        "inversedBy" => "articles",
                    }),
            );
        factory.schema().unwrap()
    }

    pub(crate) fn string(s: &str) -> Value {
        Value::from(s)
    }
}

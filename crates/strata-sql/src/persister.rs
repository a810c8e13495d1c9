//! Statements writing entity state back to the database.

use crate::stmt::{Delete, Expr, Insert, Statement, Update};

use indexmap::IndexMap;
use strata_core::driver::Capability;
use strata_core::mapping::{AssociationMapping, ClassMetadata, JoinColumn};
use strata_core::{Error, Result, Value};

/// Column name to value for one table row.
pub type ColumnValues = IndexMap<String, Value>;

/// Inserts one entity row. The discriminator of single-table subclasses is
/// added here. Generated identifiers are read back with `RETURNING` when
/// the backend supports it.
pub fn insert(
    class: &ClassMetadata,
    values: &ColumnValues,
    capability: &Capability,
) -> Result<Statement> {
    let mut columns = vec![];
    let mut exprs = vec![];

    for (column, value) in values {
        columns.push(column.clone());
        exprs.push(Expr::value(value.clone()));
    }

    if let Some(discriminator) = &class.discriminator_column {
        let Some(value) = &class.discriminator_value else {
            return Err(Error::invalid_mapping(format!(
                "class `{}` has no discriminator value",
                class.name
            )));
        };

        if !columns.contains(&discriminator.name) {
            columns.push(discriminator.name.clone());
            exprs.push(Expr::value(
                discriminator.ty.convert(Value::from(value.as_str()))?,
            ));
        }
    }

    let returning = if class.is_id_generator_identity() && capability.insert_returning {
        class
            .identifier_columns()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        vec![]
    };

    Ok(Insert {
        table: class.table.qualified_name(),
        columns,
        values: exprs,
        returning,
    }
    .into())
}

/// Updates the changed columns of one entity row. Returns `None` when
/// nothing changed.
pub fn update(
    class: &ClassMetadata,
    changes: &ColumnValues,
    id: &ColumnValues,
) -> Result<Option<Statement>> {
    if changes.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        Update {
            table: class.table.qualified_name(),
            assignments: changes
                .iter()
                .map(|(column, value)| (column.clone(), Expr::value(value.clone())))
                .collect(),
            filter: Some(key_filter(class, id)?),
        }
        .into(),
    ))
}

pub fn delete(class: &ClassMetadata, id: &ColumnValues) -> Result<Statement> {
    Ok(Delete {
        table: class.table.qualified_name(),
        filter: Some(key_filter(class, id)?),
    }
    .into())
}

/// Links `owner` and `element` through the join table of the owning
/// many-to-many `assoc`. Both rows are keyed by column name.
pub fn insert_bridge(
    assoc: &AssociationMapping,
    owner: &ColumnValues,
    element: &ColumnValues,
) -> Result<Statement> {
    let join_table = bridge_table(assoc)?;

    let mut columns = vec![];
    let mut values = vec![];

    for (join_columns, row) in [
        (&join_table.join_columns, owner),
        (&join_table.inverse_join_columns, element),
    ] {
        for jc in join_columns {
            columns.push(jc.name.clone());
            values.push(Expr::value(referenced_value(assoc, jc, row)?));
        }
    }

    Ok(Insert {
        table: join_table.qualified_name(),
        columns,
        values,
        returning: vec![],
    }
    .into())
}

/// Removes every join table row of `owner` for the owning many-to-many
/// `assoc`.
pub fn delete_bridge(assoc: &AssociationMapping, owner: &ColumnValues) -> Result<Statement> {
    let join_table = bridge_table(assoc)?;

    let filter = join_table
        .join_columns
        .iter()
        .map(|jc| {
            Ok(Expr::eq(
                Expr::column(None, &jc.name),
                Expr::value(referenced_value(assoc, jc, owner)?),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Delete {
        table: join_table.qualified_name(),
        filter: Expr::and_from_vec(filter),
    }
    .into())
}

fn bridge_table(assoc: &AssociationMapping) -> Result<&strata_core::mapping::JoinTable> {
    match assoc.join_table() {
        Some(join_table) if assoc.is_owning_side() => Ok(join_table),
        _ => Err(Error::invalid_mapping(format!(
            "association `{}#{}` does not own a join table",
            assoc.source_entity(),
            assoc.field_name()
        ))),
    }
}

fn referenced_value(
    assoc: &AssociationMapping,
    jc: &JoinColumn,
    row: &ColumnValues,
) -> Result<Value> {
    match row.get(&jc.referenced_column_name) {
        Some(Value::Null) | None => Err(Error::invalid_entity_state(format!(
            "cannot link `{}#{}`: column `{}` has no value",
            assoc.source_entity(),
            assoc.field_name(),
            jc.referenced_column_name
        ))),
        Some(value) => Ok(value.clone()),
    }
}

fn key_filter(class: &ClassMetadata, id: &ColumnValues) -> Result<Expr> {
    let filter = class
        .identifier_columns()
        .into_iter()
        .map(|column| match id.get(column) {
            Some(value) if !value.is_null() => Ok(Expr::eq(
                Expr::column(None, column),
                Expr::value(value.clone()),
            )),
            _ => Err(Error::invalid_entity_state(format!(
                "entity of class `{}` has no value for identifier column `{column}`",
                class.name
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Expr::and_from_vec(filter).ok_or_else(|| {
        Error::invalid_mapping(format!("class `{}` has no identifier", class.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Param;
    use crate::Serializer;

    use strata_core::map;
    use strata_core::mapping::{AssociationKind, ClassDefinition, FieldType, MetadataFactory};
    use strata_core::Schema;

    fn schema() -> Schema {
        let mut factory = MetadataFactory::new();
        factory
            .register(
                ClassDefinition::entity("File")
                    .id("id", FieldType::Integer)
                    .column("file_id"),
            )
            .register(
                ClassDefinition::entity("Picture")
                    .id("id", FieldType::Integer)
                    .column("picture_id")
                    .association(map! {
                        "type" => AssociationKind::ManyToOne.code(),
                        "fieldName" => "file",
                        "targetEntity" => "File",
                        "joinColumns" => vec![Value::Map(map! {
                            "name" => "file_id",
                            "referencedColumnName" => "file_id",
                        })],
                    }),
            )
            .register(
                ClassDefinition::entity("Tag")
                    .id("id", FieldType::Integer)
                    .association(map! {
                        "type" => AssociationKind::ManyToMany.code(),
                        "fieldName" => "pictures",
                        "targetEntity" => "Picture",
                    }),
            );
        factory.schema().unwrap()
    }

    fn to_sql(stmt: &Statement) -> (String, Vec<Param>) {
        let mut params = vec![];
        let sql = Serializer::sqlite().serialize(stmt, &mut params);
        (sql, params)
    }

    #[test]
    fn insert_leaves_generated_id_out() {
        let schema = schema();
        let picture = schema.class("Picture").unwrap();

        let values: ColumnValues = map! { "file_id" => 3 };
        let (sql, params) = to_sql(&insert(picture, &values, &Capability::SQLITE).unwrap());
        assert_eq!(sql, "INSERT INTO Picture (file_id) VALUES (?1)");
        assert_eq!(params, [Param::Value(Value::I64(3))]);

        let stmt = insert(picture, &values, &Capability::POSTGRESQL).unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("expected INSERT")
        };
        assert_eq!(insert.returning, ["picture_id"]);
    }

    #[test]
    fn update_without_changes_is_skipped() {
        let schema = schema();
        let picture = schema.class("Picture").unwrap();
        let id: ColumnValues = map! { "picture_id" => 1 };

        assert!(update(picture, &ColumnValues::new(), &id).unwrap().is_none());

        let changes: ColumnValues = map! { "file_id" => Value::Null };
        let (sql, _) = to_sql(&update(picture, &changes, &id).unwrap().unwrap());
        assert_eq!(sql, "UPDATE Picture SET file_id = NULL WHERE picture_id = ?1");
    }

    #[test]
    fn delete_requires_identifier() {
        let schema = schema();
        let picture = schema.class("Picture").unwrap();

        let err = delete(picture, &ColumnValues::new()).unwrap_err();
        assert!(err.is_invalid_entity_state());
    }

    #[test]
    fn bridge_rows() {
        let schema = schema();
        let tag = schema.class("Tag").unwrap();
        let pictures = tag.association("pictures").unwrap();

        let owner: ColumnValues = map! { "id" => 7 };
        let element: ColumnValues = map! { "id" => 9 };

        let (sql, params) = to_sql(&insert_bridge(pictures, &owner, &element).unwrap());
        assert_eq!(
            sql,
            "INSERT INTO tag_picture (tag_id, picture_id) VALUES (?1, ?2)"
        );
        assert_eq!(
            params,
            [Param::Value(Value::I64(7)), Param::Value(Value::I64(9))]
        );

        let (sql, _) = to_sql(&delete_bridge(pictures, &owner).unwrap());
        assert_eq!(sql, "DELETE FROM tag_picture WHERE tag_id = ?1");
    }
}

use super::Completion;
use crate::mapping::{AssociationKind, AssociationMapping, Cascade, JoinColumn, JoinTable};
use crate::{Error, Result};

use indexmap::IndexMap;

/// Validates an association against its kind and fills in every derived
/// property: owning side, default join columns, key column maps, default join
/// table and cache region.
pub(super) fn association(assoc: &mut AssociationMapping, cx: &Completion<'_>) -> Result<()> {
    let path = format!("{}#{}", assoc.source_entity(), assoc.field_name());

    if assoc.mapped_by().is_some() && assoc.inversed_by().is_some() {
        return Err(Error::invalid_mapping(format!(
            "association `{path}` declares both mappedBy and inversedBy"
        )));
    }

    let owning = assoc.mapped_by().is_none();
    assoc.set_owning_side(owning);

    match assoc.kind() {
        AssociationKind::ManyToOne if !owning => {
            return Err(Error::invalid_mapping(format!(
                "many-to-one association `{path}` is always the owning side and cannot be mappedBy"
            )));
        }
        AssociationKind::OneToMany if owning => {
            return Err(Error::invalid_mapping(format!(
                "one-to-many association `{path}` requires mappedBy"
            )));
        }
        _ => {}
    }

    if assoc.is_id() && !(assoc.is_to_one() && owning) {
        return Err(Error::invalid_mapping(format!(
            "association `{path}` cannot be part of the identifier; only owning to-one associations can"
        )));
    }

    if !owning {
        if !assoc.join_columns().is_empty() {
            return Err(Error::invalid_mapping(format!(
                "inverse side association `{path}` cannot declare join columns"
            )));
        }
        if assoc.join_table().is_some() {
            return Err(Error::invalid_mapping(format!(
                "inverse side association `{path}` cannot declare a join table"
            )));
        }
    }

    if assoc.orphan_removal() {
        assoc.set_cascade_flag(Cascade::Remove, true);
    }

    if owning {
        match assoc.kind() {
            AssociationKind::OneToOne | AssociationKind::ManyToOne => to_one(assoc, cx)?,
            AssociationKind::ManyToMany => many_to_many(assoc, cx)?,
            AssociationKind::OneToMany => {}
        }
    }

    if let Some(cache) = assoc.cache() {
        if cache.region.is_none() {
            let mut cache = cache.clone();
            cache.region = Some(format!(
                "{}__{}",
                cx.root_entity_name.replace('\\', "_").to_lowercase(),
                assoc.field_name()
            ));
            assoc.set_cache(Some(cache));
        }
    }

    Ok(())
}

fn to_one(assoc: &mut AssociationMapping, cx: &Completion<'_>) -> Result<()> {
    let mut columns = assoc.join_columns().to_vec();

    if columns.is_empty() {
        columns.push(JoinColumn::new(
            cx.naming.join_column_name(assoc.field_name()),
            cx.naming.reference_column_name(),
        ));
    }

    if assoc.kind() == AssociationKind::OneToOne
        && !assoc.is_id()
        && columns.len() == 1
        && columns[0].unique.is_none()
    {
        columns[0].unique = Some(true);
    }

    if assoc.is_id() {
        for column in &mut columns {
            column.nullable.get_or_insert(false);
        }
    }

    let mut field_names = IndexMap::new();
    let mut source_to_target = IndexMap::new();
    let mut target_to_source = IndexMap::new();

    for column in &columns {
        field_names.insert(
            column.name.clone(),
            column.field_name.clone().unwrap_or_else(|| column.name.clone()),
        );
        source_to_target.insert(column.name.clone(), column.referenced_column_name.clone());
        target_to_source.insert(column.referenced_column_name.clone(), column.name.clone());
    }

    if columns.iter().any(JoinColumn::is_on_delete_cascade) {
        assoc.set_on_delete_cascade(true);
    }

    assoc.set_join_columns(columns)?;
    assoc.set_join_column_field_names(field_names)?;
    assoc.set_key_columns(source_to_target, target_to_source)
}

fn many_to_many(assoc: &mut AssociationMapping, cx: &Completion<'_>) -> Result<()> {
    let source = assoc.source_entity().to_string();
    let target = assoc.target_entity().to_string();

    let mut table = match assoc.join_table() {
        Some(table) => table.clone(),
        None => JoinTable::new(cx.naming.join_table_name(&source, &target)),
    };
    table.name = cx.table_name(&table.name);

    // A self-referencing bridge needs distinct column names for both sides.
    let self_referencing = source == target
        && table.join_columns.is_empty()
        && table.inverse_join_columns.is_empty();

    if table.join_columns.is_empty() {
        table.join_columns.push(
            JoinColumn::new(
                cx.naming
                    .join_key_column_name(&source, self_referencing.then_some("source")),
                cx.naming.reference_column_name(),
            )
            .on_delete("CASCADE"),
        );
    }

    if table.inverse_join_columns.is_empty() {
        table.inverse_join_columns.push(
            JoinColumn::new(
                cx.naming
                    .join_key_column_name(&target, self_referencing.then_some("target")),
                cx.naming.reference_column_name(),
            )
            .on_delete("CASCADE"),
        );
    }

    let mut columns = vec![];
    let mut to_source = IndexMap::new();
    let mut to_target = IndexMap::new();

    for column in &table.join_columns {
        columns.push(column.name.clone());
        to_source.insert(column.name.clone(), column.referenced_column_name.clone());
    }
    for column in &table.inverse_join_columns {
        columns.push(column.name.clone());
        to_target.insert(column.name.clone(), column.referenced_column_name.clone());
    }

    if table.join_columns.iter().any(JoinColumn::is_on_delete_cascade) {
        assoc.set_on_delete_cascade(true);
    }

    assoc.set_join_table(table)?;
    assoc.set_relation_key_columns(columns, to_source, to_target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::NamingStrategy;

    fn cx() -> Completion<'static> {
        Completion {
            naming: NamingStrategy::Default,
            table_name_prefix: None,
            root_entity_name: "App\\Picture",
        }
    }

    fn complete(raw: crate::MappingArray) -> Result<AssociationMapping> {
        let mut assoc = AssociationMapping::from_mapping_array(&raw)?;
        association(&mut assoc, &cx())?;
        Ok(assoc)
    }

    #[test]
    fn many_to_one_gets_default_join_column() {
        let assoc = complete(map! {
            "type" => 2,
            "fieldName" => "file",
            "sourceEntity" => "App\\Picture",
            "targetEntity" => "App\\File",
        })
        .unwrap();

        assert!(assoc.is_owning_side());
        assert_eq!(assoc.join_columns(), [JoinColumn::new("file_id", "id")]);
        assert_eq!(
            assoc.source_to_target_key_columns().unwrap()["file_id"],
            "id"
        );
        assert_eq!(assoc.target_to_source_key_columns().unwrap()["id"], "file_id");
    }

    #[test]
    fn one_to_one_single_join_column_is_unique() {
        let assoc = complete(map! {
            "type" => 1,
            "fieldName" => "thumbnail",
            "sourceEntity" => "App\\Picture",
            "targetEntity" => "App\\File",
        })
        .unwrap();

        assert!(assoc.join_columns()[0].is_unique());
    }

    #[test]
    fn self_referencing_many_to_many_uses_source_and_target_columns() {
        let assoc = complete(map! {
            "type" => 8,
            "fieldName" => "friends",
            "sourceEntity" => "App\\Node",
            "targetEntity" => "App\\Node",
        })
        .unwrap();

        let table = assoc.join_table().unwrap();
        assert_eq!(table.name, "node_node");
        assert_eq!(table.join_columns[0].name, "node_source");
        assert_eq!(table.inverse_join_columns[0].name, "node_target");
        assert!(assoc.is_on_delete_cascade());
        assert_eq!(assoc.join_table_columns(), ["node_source", "node_target"]);
    }

    #[test]
    fn orphan_removal_implies_cascade_remove() {
        let assoc = complete(map! {
            "type" => 4,
            "fieldName" => "pictures",
            "sourceEntity" => "App\\File",
            "targetEntity" => "App\\Picture",
            "mappedBy" => "file",
            "orphanRemoval" => true,
        })
        .unwrap();

        assert!(!assoc.is_owning_side());
        assert!(assoc.is_cascade_remove());
    }

    #[test]
    fn one_to_many_without_mapped_by_is_rejected() {
        let err = complete(map! {
            "type" => 4,
            "fieldName" => "pictures",
            "sourceEntity" => "App\\File",
            "targetEntity" => "App\\Picture",
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid mapping: one-to-many association `App\\File#pictures` requires mappedBy"
        );
    }

    #[test]
    fn both_sides_declared_is_rejected() {
        let err = complete(map! {
            "type" => 1,
            "fieldName" => "file",
            "sourceEntity" => "App\\Picture",
            "targetEntity" => "App\\File",
            "mappedBy" => "picture",
            "inversedBy" => "picture",
        })
        .unwrap_err();

        assert!(err.is_invalid_mapping());
    }

    #[test]
    fn cache_region_defaults_to_root_and_field() {
        let assoc = complete(map! {
            "type" => 2,
            "fieldName" => "file",
            "sourceEntity" => "App\\Picture",
            "targetEntity" => "App\\File",
            "cache" => map! { "usage" => 1 },
        })
        .unwrap();

        assert_eq!(
            assoc.cache().unwrap().region.as_deref(),
            Some("app_picture__file")
        );
    }
}

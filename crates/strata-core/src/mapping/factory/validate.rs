use crate::{Error, Result, Schema};

/// Checks relations between classes: targets exist and both sides of a
/// bidirectional association point at each other.
pub(super) fn schema(schema: &Schema) -> Result<()> {
    for class in schema.classes() {
        if class.is_mapped_superclass {
            continue;
        }

        for assoc in class.associations.values() {
            let path = format!("{}#{}", class.name, assoc.field_name());

            let Some(target) = schema.get(assoc.target_entity()) else {
                return Err(Error::invalid_mapping(format!(
                    "association `{path}` targets `{}` which is not a registered entity class",
                    assoc.target_entity()
                )));
            };

            if target.is_mapped_superclass {
                return Err(Error::invalid_mapping(format!(
                    "association `{path}` targets mapped superclass `{}`",
                    target.name
                )));
            }

            if let Some(mapped_by) = assoc.mapped_by() {
                match target.association(mapped_by) {
                    None => {
                        return Err(Error::invalid_mapping(format!(
                            "association `{path}` is mapped by `{}#{mapped_by}` which is not an association",
                            target.name
                        )))
                    }
                    Some(owner) if !owner.is_owning_side() => {
                        return Err(Error::invalid_mapping(format!(
                            "association `{path}` is mapped by `{}#{mapped_by}` which is not an owning side",
                            target.name
                        )))
                    }
                    Some(owner) if owner.inversed_by().is_some_and(|f| f != assoc.field_name()) => {
                        return Err(Error::invalid_mapping(format!(
                            "association `{path}` is mapped by `{}#{mapped_by}` which is inversed by `{}`",
                            target.name,
                            owner.inversed_by().unwrap_or_default()
                        )))
                    }
                    Some(_) => {}
                }
            }

            if let Some(inversed_by) = assoc.inversed_by() {
                match target.association(inversed_by) {
                    Some(inverse) if inverse.mapped_by() == Some(assoc.field_name()) => {}
                    _ => {
                        return Err(Error::invalid_mapping(format!(
                            "association `{path}` is inversed by `{}#{inversed_by}` which must declare mappedBy=\"{}\"",
                            target.name,
                            assoc.field_name()
                        )))
                    }
                }
            }

            if assoc.is_to_one() && assoc.is_owning_side() {
                let columns = target.column_names();
                for join_column in assoc.join_columns() {
                    if !columns.contains(&join_column.referenced_column_name.as_str()) {
                        return Err(Error::invalid_mapping(format!(
                            "join column `{}` of `{path}` references unknown column `{}` on `{}`",
                            join_column.name, join_column.referenced_column_name, target.name
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

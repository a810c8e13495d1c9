//! Flat-map and JSON forms of class metadata, used to persist metadata in
//! a cache. Associations go through `AssociationMapping::to_flat_map` and are
//! re-validated by `from_mapping_array` on load.

use super::{
    ClassMetadata, DiscriminatorColumn, IdGenerator, InheritanceType, TableRef,
};
use crate::mapping::{raw, AssociationMapping, CacheConfig, FieldMapping, FieldType};
use crate::{Error, MappingArray, Result, Value};

const NAME: &str = "ClassMetadata";

impl ClassMetadata {
    pub fn to_flat_map(&self) -> MappingArray {
        let mut map = map! {
            "name" => &self.name,
            "rootEntityName" => &self.root_entity_name,
            "parentClasses" => raw::string_list_value(&self.parent_classes),
            "subClasses" => raw::string_list_value(&self.subclasses),
            "isMappedSuperclass" => self.is_mapped_superclass,
            "table" => table_value(&self.table),
            "fieldMappings" => Value::List(
                self.fields
                    .values()
                    .map(|field| Value::Map(field.to_mapping_array()))
                    .collect(),
            ),
            "identifier" => raw::string_list_value(&self.identifier),
            "idGenerator" => match self.id_generator {
                IdGenerator::None => "NONE",
                IdGenerator::Identity => "IDENTITY",
            },
            "associationMappings" => Value::List(
                self.associations
                    .values()
                    .map(|assoc| Value::Map(assoc.to_flat_map()))
                    .collect(),
            ),
            "inheritanceType" => match self.inheritance {
                InheritanceType::None => "NONE",
                InheritanceType::SingleTable => "SINGLE_TABLE",
            },
            "discriminatorMap" => raw::string_map_value(&self.discriminator_map),
        };

        if let Some(column) = &self.discriminator_column {
            map.insert(
                "discriminatorColumn".into(),
                Value::Map(map! {
                    "name" => &column.name,
                    "type" => column.ty.name(),
                }),
            );
        }
        if let Some(value) = &self.discriminator_value {
            map.insert("discriminatorValue".into(), value.into());
        }
        if let Some(cache) = &self.cache {
            map.insert("cache".into(), Value::Map(cache.to_mapping_array()));
        }

        map
    }

    pub fn from_flat_map(raw: &MappingArray) -> Result<ClassMetadata> {
        let name = raw::required_str(raw, "name", NAME)?;
        let table = match raw.get("table") {
            Some(value) => table_from_value(value)?,
            None => TableRef::new(super::short_name(&name)),
        };

        let mut class = ClassMetadata::new(name, table);

        for (key, value) in raw {
            match key.as_str() {
                "name" | "table" => {}
                "rootEntityName" => class.root_entity_name = raw::string(value, key, NAME)?,
                "parentClasses" => class.parent_classes = raw::string_list(value, key, NAME)?,
                "subClasses" => class.subclasses = raw::string_list(value, key, NAME)?,
                "isMappedSuperclass" => {
                    class.is_mapped_superclass = raw::boolean(value, key, NAME)?
                }
                "fieldMappings" => {
                    for field in raw::list(value, key, NAME)? {
                        let field = FieldMapping::from_mapping_array(raw::map(field, key, NAME)?)?;
                        class.fields.insert(field.field_name.clone(), field);
                    }
                }
                "identifier" => class.identifier = raw::string_list(value, key, NAME)?,
                "idGenerator" => {
                    class.id_generator = match raw::string(value, key, NAME)?.as_str() {
                        "NONE" => IdGenerator::None,
                        "IDENTITY" => IdGenerator::Identity,
                        other => {
                            return Err(Error::invalid_mapping(format!(
                                "unknown id generator `{other}`"
                            )))
                        }
                    }
                }
                "associationMappings" => {
                    for assoc in raw::list(value, key, NAME)? {
                        let assoc =
                            AssociationMapping::from_mapping_array(raw::map(assoc, key, NAME)?)?;
                        class
                            .associations
                            .insert(assoc.field_name().to_string(), assoc);
                    }
                }
                "inheritanceType" => {
                    class.inheritance = match raw::string(value, key, NAME)?.as_str() {
                        "NONE" => InheritanceType::None,
                        "SINGLE_TABLE" => InheritanceType::SingleTable,
                        other => {
                            return Err(Error::invalid_mapping(format!(
                                "unknown inheritance type `{other}`"
                            )))
                        }
                    }
                }
                "discriminatorColumn" => {
                    let column = raw::map(value, key, NAME)?;
                    let ty = raw::required_str(column, "type", NAME)?;
                    class.discriminator_column = Some(DiscriminatorColumn {
                        name: raw::required_str(column, "name", NAME)?,
                        ty: FieldType::from_name(&ty).ok_or_else(|| {
                            Error::invalid_mapping(format!("unknown field type `{ty}`"))
                        })?,
                    });
                }
                "discriminatorMap" => class.discriminator_map = raw::string_map(value, key, NAME)?,
                "discriminatorValue" => {
                    class.discriminator_value = raw::opt_string(value, key, NAME)?
                }
                "cache" => class.cache = Some(CacheConfig::from_value(value, NAME)?),
                _ => return Err(Error::unknown_mapping_property(key.as_str(), NAME)),
            }
        }

        Ok(class)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&Value::Map(self.to_flat_map()))?)
    }

    pub fn from_json(json: &str) -> Result<ClassMetadata> {
        match serde_json::from_str::<Value>(json)? {
            Value::Map(raw) => ClassMetadata::from_flat_map(&raw),
            other => Err(Error::invalid_mapping(format!(
                "cached metadata must be a map, got {}",
                other.kind_name()
            ))),
        }
    }
}

fn table_value(table: &TableRef) -> Value {
    let mut map = map! { "name" => &table.name };
    if let Some(schema) = &table.schema {
        map.insert("schema".into(), schema.into());
    }
    Value::Map(map)
}

fn table_from_value(value: &Value) -> Result<TableRef> {
    let map = raw::map(value, "table", NAME)?;
    Ok(TableRef {
        name: raw::required_str(map, "name", NAME)?,
        schema: match map.get("schema") {
            Some(schema) => raw::opt_string(schema, "schema", NAME)?,
            None => None,
        },
    })
}

use super::{raw, JoinColumn};
use crate::{Error, MappingArray, Result, Value};

const NAME: &str = "JoinTable";

/// The bridge table of a many-to-many association.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    pub name: String,

    pub schema: Option<String>,

    /// Bridge columns referencing the owning side.
    pub join_columns: Vec<JoinColumn>,

    /// Bridge columns referencing the target side.
    pub inverse_join_columns: Vec<JoinColumn>,
}

impl JoinTable {
    pub fn new(name: impl Into<String>) -> JoinTable {
        JoinTable {
            name: name.into(),
            schema: None,
            join_columns: vec![],
            inverse_join_columns: vec![],
        }
    }

    /// Table name qualified with the schema, if any.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn from_mapping_array(raw: &MappingArray) -> Result<JoinTable> {
        let mut table = JoinTable::new(raw::required_str(raw, "name", NAME)?);

        for (key, value) in raw {
            match key.as_str() {
                "name" => {}
                "schema" => table.schema = raw::opt_string(value, key, NAME)?,
                "joinColumns" if value.is_null() => {}
                "joinColumns" => {
                    table.join_columns = JoinColumn::list_from_value(value, key, NAME)?
                }
                "inverseJoinColumns" if value.is_null() => {}
                "inverseJoinColumns" => {
                    table.inverse_join_columns = JoinColumn::list_from_value(value, key, NAME)?
                }
                _ => return Err(Error::unknown_mapping_property(key.as_str(), NAME)),
            }
        }

        Ok(table)
    }

    pub fn to_mapping_array(&self) -> MappingArray {
        let mut map = map! { "name" => &self.name };

        if let Some(schema) = &self.schema {
            map.insert("schema".into(), schema.into());
        }
        if !self.join_columns.is_empty() {
            map.insert(
                "joinColumns".into(),
                JoinColumn::list_to_value(&self.join_columns),
            );
        }
        if !self.inverse_join_columns.is_empty() {
            map.insert(
                "inverseJoinColumns".into(),
                JoinColumn::list_to_value(&self.inverse_join_columns),
            );
        }

        map
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Map(self.to_mapping_array())
    }
}

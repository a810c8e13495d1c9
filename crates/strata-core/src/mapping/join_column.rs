use super::raw;
use crate::{Error, MappingArray, Result, Value};

const NAME: &str = "JoinColumn";

/// One foreign-key column pairing of an association.
///
/// Join columns are owned by their association in declaration order; that
/// order is the column order of composite keys in generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinColumn {
    /// Column on the table holding the foreign key.
    pub name: String,

    /// Column on the referenced table.
    pub referenced_column_name: String,

    pub nullable: Option<bool>,

    pub unique: Option<bool>,

    /// Referential action, e.g. `CASCADE` or `SET NULL`.
    pub on_delete: Option<String>,

    /// Overrides the generated column definition.
    pub column_definition: Option<String>,

    /// Set when the join column also backs a mapped field.
    pub field_name: Option<String>,
}

impl JoinColumn {
    pub fn new(name: impl Into<String>, referenced_column_name: impl Into<String>) -> JoinColumn {
        JoinColumn {
            name: name.into(),
            referenced_column_name: referenced_column_name.into(),
            nullable: None,
            unique: None,
            on_delete: None,
            column_definition: None,
            field_name: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    /// Join columns are nullable unless declared otherwise.
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(true)
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    pub fn is_on_delete_cascade(&self) -> bool {
        self.on_delete
            .as_deref()
            .is_some_and(|action| action.eq_ignore_ascii_case("cascade"))
    }

    pub fn from_mapping_array(raw: &MappingArray) -> Result<JoinColumn> {
        let mut column = JoinColumn::new(
            raw::required_str(raw, "name", NAME)?,
            raw::required_str(raw, "referencedColumnName", NAME)?,
        );

        for (key, value) in raw {
            match key.as_str() {
                "name" | "referencedColumnName" => {}
                "nullable" => column.nullable = raw::opt_bool(value, key, NAME)?,
                "unique" => column.unique = raw::opt_bool(value, key, NAME)?,
                "onDelete" => column.on_delete = raw::opt_string(value, key, NAME)?,
                "columnDefinition" => {
                    column.column_definition = raw::opt_string(value, key, NAME)?
                }
                "fieldName" => column.field_name = raw::opt_string(value, key, NAME)?,
                _ => return Err(Error::unknown_mapping_property(key.as_str(), NAME)),
            }
        }

        Ok(column)
    }

    pub(crate) fn from_value(value: &Value, owner: &str) -> Result<JoinColumn> {
        JoinColumn::from_mapping_array(raw::map(value, "joinColumns", owner)?)
    }

    pub(crate) fn list_from_value(
        value: &Value,
        key: &str,
        owner: &str,
    ) -> Result<Vec<JoinColumn>> {
        raw::list(value, key, owner)?
            .iter()
            .map(|column| JoinColumn::from_value(column, owner))
            .collect()
    }

    pub(crate) fn list_to_value(columns: &[JoinColumn]) -> Value {
        Value::List(
            columns
                .iter()
                .map(|column| Value::Map(column.to_mapping_array()))
                .collect(),
        )
    }

    pub fn to_mapping_array(&self) -> MappingArray {
        let mut map = map! {
            "name" => &self.name,
            "referencedColumnName" => &self.referenced_column_name,
        };

        if let Some(nullable) = self.nullable {
            map.insert("nullable".into(), nullable.into());
        }
        if let Some(unique) = self.unique {
            map.insert("unique".into(), unique.into());
        }
        if let Some(on_delete) = &self.on_delete {
            map.insert("onDelete".into(), on_delete.into());
        }
        if let Some(definition) = &self.column_definition {
            map.insert("columnDefinition".into(), definition.into());
        }
        if let Some(field_name) = &self.field_name {
            map.insert("fieldName".into(), field_name.into());
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mapping_array_reads_optional_keys() {
        let column = JoinColumn::from_mapping_array(&map! {
            "name" => "file_id",
            "referencedColumnName" => "file_id",
            "nullable" => false,
            "onDelete" => "CASCADE",
        })
        .unwrap();

        assert_eq!(column.name, "file_id");
        assert!(!column.is_nullable());
        assert!(column.is_on_delete_cascade());
        assert!(!column.is_unique());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = JoinColumn::from_mapping_array(&map! {
            "name" => "file_id",
            "referencedColumnName" => "file_id",
            "nulable" => true,
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "unknown mapping property `nulable` on JoinColumn"
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = JoinColumn::from_mapping_array(&map! {
            "referencedColumnName" => "id",
        })
        .unwrap_err();

        assert!(err.is_invalid_mapping());
    }

    #[test]
    fn to_mapping_array_omits_unset_keys() {
        let column = JoinColumn::new("user_id", "id").unique(true);
        let raw = column.to_mapping_array();

        assert_eq!(
            raw.keys().collect::<Vec<_>>(),
            ["name", "referencedColumnName", "unique"]
        );
        assert_eq!(JoinColumn::from_mapping_array(&raw).unwrap(), column);
    }
}

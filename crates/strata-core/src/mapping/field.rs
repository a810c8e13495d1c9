use super::raw;
use crate::{Error, MappingArray, Result, Value};

const NAME: &str = "FieldMapping";

/// Mapped type of a field; converts driver values into domain values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    BigInt,
    SmallInt,
    String,
    Text,
    Boolean,
    Float,
    Decimal,
    Guid,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::BigInt => "bigint",
            FieldType::SmallInt => "smallint",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Guid => "guid",
        }
    }

    pub fn from_name(name: &str) -> Option<FieldType> {
        Some(match name {
            "integer" => FieldType::Integer,
            "bigint" => FieldType::BigInt,
            "smallint" => FieldType::SmallInt,
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "boolean" => FieldType::Boolean,
            "float" => FieldType::Float,
            "decimal" => FieldType::Decimal,
            "guid" => FieldType::Guid,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::BigInt | FieldType::SmallInt
        )
    }

    /// Converts a value read from the database into this type. Null passes
    /// through unchanged.
    pub fn convert(self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        let converted = match self {
            _ if self.is_integer() => match &value {
                Value::I64(_) => Some(value.clone()),
                Value::Bool(b) => Some(Value::I64(*b as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::I64),
                Value::F64(f) if f.fract() == 0.0 => Some(Value::I64(*f as i64)),
                _ => None,
            },
            FieldType::Boolean => match &value {
                Value::Bool(_) => Some(value.clone()),
                Value::I64(0) => Some(Value::Bool(false)),
                Value::I64(1) => Some(Value::Bool(true)),
                Value::String(s) => match s.as_str() {
                    "0" | "false" => Some(Value::Bool(false)),
                    "1" | "true" => Some(Value::Bool(true)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Float => match &value {
                Value::F64(_) => Some(value.clone()),
                Value::I64(i) => Some(Value::F64(*i as f64)),
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::F64),
                _ => None,
            },
            _ => match &value {
                Value::String(_) => Some(value.clone()),
                Value::I64(i) => Some(Value::String(i.to_string())),
                Value::F64(f) => Some(Value::String(f.to_string())),
                _ => None,
            },
        };

        converted.ok_or_else(|| Error::type_conversion(value, self.name()))
    }
}

/// A mapped, non-association field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub field_name: String,
    pub column_name: String,
    pub ty: FieldType,
    pub nullable: bool,
    pub unique: bool,

    /// True when the field is (part of) the identifier.
    pub id: bool,

    pub inherited: Option<String>,
    pub declared: Option<String>,
}

impl FieldMapping {
    pub fn new(
        field_name: impl Into<String>,
        column_name: impl Into<String>,
        ty: FieldType,
    ) -> FieldMapping {
        FieldMapping {
            field_name: field_name.into(),
            column_name: column_name.into(),
            ty,
            nullable: false,
            unique: false,
            id: false,
            inherited: None,
            declared: None,
        }
    }

    pub fn from_mapping_array(raw: &MappingArray) -> Result<FieldMapping> {
        let ty_name = raw::required_str(raw, "type", NAME)?;
        let ty = FieldType::from_name(&ty_name)
            .ok_or_else(|| Error::invalid_mapping(format!("unknown field type `{ty_name}`")))?;

        let mut field = FieldMapping::new(
            raw::required_str(raw, "fieldName", NAME)?,
            raw::required_str(raw, "columnName", NAME)?,
            ty,
        );

        for (key, value) in raw {
            match key.as_str() {
                "fieldName" | "columnName" | "type" => {}
                "nullable" => field.nullable = raw::boolean(value, key, NAME)?,
                "unique" => field.unique = raw::boolean(value, key, NAME)?,
                "id" => field.id = raw::boolean(value, key, NAME)?,
                "inherited" => field.inherited = raw::opt_string(value, key, NAME)?,
                "declared" => field.declared = raw::opt_string(value, key, NAME)?,
                _ => return Err(Error::unknown_mapping_property(key.as_str(), NAME)),
            }
        }

        Ok(field)
    }

    pub fn to_mapping_array(&self) -> MappingArray {
        let mut map = map! {
            "fieldName" => &self.field_name,
            "columnName" => &self.column_name,
            "type" => self.ty.name(),
            "nullable" => self.nullable,
            "unique" => self.unique,
            "id" => self.id,
        };

        if let Some(inherited) = &self.inherited {
            map.insert("inherited".into(), inherited.into());
        }
        if let Some(declared) = &self.declared {
            map.insert("declared".into(), declared.into());
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversion() {
        assert_eq!(
            FieldType::Integer.convert(Value::from("1")).unwrap(),
            Value::I64(1)
        );
        assert_eq!(FieldType::Integer.convert(Value::Null).unwrap(), Value::Null);

        let err = FieldType::Integer.convert(Value::from("one")).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert String to integer");
    }

    #[test]
    fn string_conversion() {
        assert_eq!(
            FieldType::String.convert(Value::I64(7)).unwrap(),
            Value::from("7")
        );
        assert!(FieldType::String.convert(Value::Bool(true)).is_err());
    }

    #[test]
    fn boolean_conversion() {
        assert_eq!(
            FieldType::Boolean.convert(Value::I64(1)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            FieldType::Boolean.convert(Value::from("0")).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn field_round_trip() {
        let mut field = FieldMapping::new("name", "name", FieldType::String);
        field.declared = Some("Person".into());

        assert_eq!(
            FieldMapping::from_mapping_array(&field.to_mapping_array()).unwrap(),
            field
        );
    }
}

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use strata_core::Value as CoreValue;

/// A strata value crossing the rusqlite boundary.
#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Converts one column of a SQLite row. SQLite has no boolean type, so
    /// booleans come back as integers and are converted by the hydrators.
    pub fn from_sql(value: ValueRef<'_>) -> rusqlite::Result<Self> {
        let core_value = match value {
            ValueRef::Null => CoreValue::Null,
            ValueRef::Integer(value) => CoreValue::I64(value),
            ValueRef::Real(value) => CoreValue::F64(value),
            ValueRef::Text(value) => CoreValue::String(
                std::str::from_utf8(value)
                    .map_err(rusqlite::Error::Utf8Error)?
                    .to_string(),
            ),
            ValueRef::Blob(_) => {
                return Err(rusqlite::Error::InvalidColumnType(
                    0,
                    "blob".into(),
                    rusqlite::types::Type::Blob,
                ))
            }
        };

        Ok(Value(core_value))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match &self.0 {
            CoreValue::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            CoreValue::Bool(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            CoreValue::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            CoreValue::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            CoreValue::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            value => Err(rusqlite::Error::ToSqlConversionFailure(
                format!(
                    "{} values cannot be bound to a SQLite statement",
                    value.kind_name()
                )
                .into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_bind_as_integers() {
        let value = Value::from(CoreValue::Bool(true));
        assert_eq!(
            value.to_sql().unwrap(),
            ToSqlOutput::Owned(SqlValue::Integer(1))
        );
    }

    #[test]
    fn lists_cannot_be_bound() {
        let value = Value::from(CoreValue::List(vec![]));
        assert!(value.to_sql().is_err());
    }

    #[test]
    fn reads_text_and_reals() {
        assert_eq!(
            Value::from_sql(ValueRef::Text(b"file")).unwrap().into_inner(),
            CoreValue::from("file")
        );
        assert_eq!(
            Value::from_sql(ValueRef::Real(1.5)).unwrap().into_inner(),
            CoreValue::F64(1.5)
        );
    }
}

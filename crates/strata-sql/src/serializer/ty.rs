use super::{Flavor, Formatter, Params, ToSql};

use strata_core::mapping::FieldType;

impl ToSql for FieldType {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let ty = match (self, &f.serializer.flavor) {
            (FieldType::Integer, _) => "INTEGER",
            (FieldType::BigInt, _) => "BIGINT",
            (FieldType::SmallInt, _) => "SMALLINT",
            (FieldType::String, _) | (FieldType::Guid, _) => "VARCHAR(255)",
            (FieldType::Text, _) => "TEXT",
            (FieldType::Boolean, _) => "BOOLEAN",
            (FieldType::Float, Flavor::Postgresql) => "DOUBLE PRECISION",
            (FieldType::Float, _) => "DOUBLE",
            (FieldType::Decimal, _) => "NUMERIC(10, 0)",
        };
        fmt!(f, ty);
    }
}

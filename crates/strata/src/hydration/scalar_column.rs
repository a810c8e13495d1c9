use super::scalar_row;

use strata_core::driver::Rows;
use strata_core::{Error, Result, Schema, Value};
use strata_sql::ResultSetMapping;

/// Reads the single reportable column of every row.
pub struct ScalarColumnHydrator<'a> {
    schema: &'a Schema,
}

impl<'a> ScalarColumnHydrator<'a> {
    pub fn new(schema: &'a Schema) -> ScalarColumnHydrator<'a> {
        ScalarColumnHydrator { schema }
    }

    pub fn hydrate(&self, rows: Rows, rsm: &ResultSetMapping) -> Result<Vec<Value>> {
        let mut results = vec![];

        for row in rows {
            let row = scalar_row(self.schema, rsm, row?)?;
            if row.len() > 1 {
                return Err(Error::non_unique_result());
            }
            results.push(row.into_values().next().unwrap_or_default());
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydration::tests::schema;
    use strata_core::map;
    use strata_core::mapping::FieldType;

    #[test]
    fn one_value_per_row() {
        let schema = schema();
        let mut rsm = ResultSetMapping::new();
        rsm.add_scalar_result("sclr_0", "id", Some(FieldType::Integer));

        let rows = Rows::from_vec(vec![map! { "sclr_0" => 1 }, map! { "sclr_0" => "2" }]);
        let values = ScalarColumnHydrator::new(&schema).hydrate(rows, &rsm).unwrap();
        assert_eq!(values, [Value::I64(1), Value::I64(2)]);
    }

    #[test]
    fn more_than_one_column() {
        let schema = schema();
        let mut rsm = ResultSetMapping::new();
        rsm.add_scalar_result("sclr_0", "id", None)
            .add_scalar_result("sclr_1", "name", None);

        let rows = Rows::from_vec(vec![map! { "sclr_0" => 1, "sclr_1" => "x" }]);
        let err = ScalarColumnHydrator::new(&schema).hydrate(rows, &rsm).unwrap_err();
        assert!(err.is_non_unique_result());
    }
}

use super::scalar_row;

use strata_core::driver::Rows;
use strata_core::{Error, Result, Schema, Value};
use strata_sql::ResultSetMapping;

/// Reads a result that must consist of exactly one value.
pub struct SingleScalarHydrator<'a> {
    schema: &'a Schema,
}

impl<'a> SingleScalarHydrator<'a> {
    pub fn new(schema: &'a Schema) -> SingleScalarHydrator<'a> {
        SingleScalarHydrator { schema }
    }

    /// Fails with `NoResult` when there are no rows and with
    /// `NonUniqueResult` when there is a second row or a second reportable
    /// column. A row without reportable columns yields null.
    pub fn hydrate(&self, mut rows: Rows, rsm: &ResultSetMapping) -> Result<Value> {
        let Some(row) = rows.next() else {
            return Err(Error::no_result());
        };
        let row = scalar_row(self.schema, rsm, row?)?;

        match rows.next() {
            Some(Err(err)) => return Err(err),
            Some(Ok(_)) => return Err(Error::non_unique_result()),
            None => {}
        }

        if row.len() > 1 {
            return Err(Error::non_unique_result());
        }

        Ok(row.into_values().next().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydration::tests::{schema, string};
    use std_util::prelude::*;
    use strata_core::map;
    use strata_core::mapping::FieldType;

    fn rsm() -> ResultSetMapping {
        let mut rsm = ResultSetMapping::new();
        rsm.add_entity_result("CmsUser", "u", None)
            .add_field_result("u", "u__id", "id", None)
            .add_field_result("u", "u__name", "name", None);
        rsm
    }

    #[test]
    fn single_field() {
        let schema = schema();
        let rows = Rows::from_vec(vec![map! { "u__name" => "romanb" }]);

        let value = assert_ok!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm()));
        assert_eq!(value, string("romanb"));
    }

    #[test]
    fn single_field_is_converted() {
        let schema = schema();
        let rows = Rows::from_vec(vec![map! { "u__id" => "1" }]);

        let value = assert_ok!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm()));
        assert_eq!(value, Value::I64(1));
    }

    #[test]
    fn two_columns_are_not_unique() {
        let schema = schema();
        let rows = Rows::from_vec(vec![map! { "u__id" => 1, "u__name" => "romanb" }]);

        let err = assert_err!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm()));
        assert!(err.is_non_unique_result());
    }

    #[test]
    fn two_rows_are_not_unique() {
        let schema = schema();
        let rows = Rows::from_vec(vec![
            map! { "u__name" => "romanb" },
            map! { "u__name" => "jwage" },
        ]);

        let err = assert_err!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm()));
        assert!(err.is_non_unique_result());
    }

    #[test]
    fn two_rows_of_two_columns_are_not_unique() {
        let schema = schema();
        let rows = Rows::from_vec(vec![
            map! { "u__id" => 1, "u__name" => "romanb" },
            map! { "u__id" => 2, "u__name" => "jwage" },
        ]);

        let err = assert_err!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm()));
        assert!(err.is_non_unique_result());
    }

    #[test]
    fn no_rows() {
        let schema = schema();

        let err = assert_err!(SingleScalarHydrator::new(&schema).hydrate(Rows::empty(), &rsm()));
        assert!(err.is_no_result());
        assert!(!err.is_non_unique_result());
    }

    #[test]
    fn hidden_columns_are_not_reported() {
        let schema = schema();
        let mut rsm = ResultSetMapping::new();
        rsm.add_scalar_result("sclr_0", "cnt", Some(FieldType::Integer));

        let rows = Rows::from_vec(vec![map! { "sclr_0" => "3", "sclr_1" => "hidden" }]);
        let value = assert_ok!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm));
        assert_eq!(value, Value::I64(3));

        let rows = Rows::from_vec(vec![map! { "sclr_1" => "hidden" }]);
        let value = assert_ok!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm));
        assert!(value.is_null());
    }

    #[test]
    fn hidden_columns_do_not_make_two_rows_unique() {
        let schema = schema();
        let mut rsm = ResultSetMapping::new();
        rsm.add_scalar_result("sclr_0", "name", Some(FieldType::String));

        let rows = Rows::from_vec(vec![
            map! { "sclr_0" => "romanb", "sclr_1" => 1 },
            map! { "sclr_0" => "jwage", "sclr_1" => 2 },
        ]);
        let err = assert_err!(SingleScalarHydrator::new(&schema).hydrate(rows, &rsm));
        assert!(err.is_non_unique_result());
    }
}

use super::scalar_row;

use indexmap::IndexMap;
use strata_core::driver::Rows;
use strata_core::{Result, Schema, Value};
use strata_sql::ResultSetMapping;

/// Reads every row as a flat map of reportable values.
pub struct ScalarHydrator<'a> {
    schema: &'a Schema,
}

impl<'a> ScalarHydrator<'a> {
    pub fn new(schema: &'a Schema) -> ScalarHydrator<'a> {
        ScalarHydrator { schema }
    }

    pub fn hydrate(
        &self,
        rows: Rows,
        rsm: &ResultSetMapping,
    ) -> Result<Vec<IndexMap<String, Value>>> {
        let results = rows
            .map(|row| scalar_row(self.schema, rsm, row?))
            .collect::<Result<Vec<_>>>()?;

        log::trace!("hydrated {} scalar rows", results.len());
        Ok(results)
    }
}

use crate::{Result, Value};

use indexmap::IndexMap;

/// One result row: column alias to value, in select-list order.
pub type Row = IndexMap<String, Value>;

/// A forward-only, single-pass sequence of rows.
///
/// Hydrators pull rows one at a time; nothing buffers the full result set
/// on their behalf.
pub struct Rows {
    iter: Box<dyn Iterator<Item = Result<Row>>>,
}

impl Rows {
    pub fn new<I>(iter: I) -> Rows
    where
        I: IntoIterator<Item = Result<Row>>,
        I::IntoIter: 'static,
    {
        Rows {
            iter: Box::new(iter.into_iter()),
        }
    }

    /// Rows backed by an in-memory vector, as returned by array-based
    /// drivers and tests.
    pub fn from_vec(rows: Vec<Row>) -> Rows {
        Rows::new(rows.into_iter().map(Ok))
    }

    pub fn empty() -> Rows {
        Rows::from_vec(vec![])
    }

    /// Drains the remaining rows.
    pub fn into_vec(self) -> Result<Vec<Row>> {
        self.iter.collect()
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

impl core::fmt::Debug for Rows {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rows").finish_non_exhaustive()
    }
}

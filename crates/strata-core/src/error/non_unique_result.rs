use super::Error;

/// Error when a query expected to produce exactly one value produced more
/// than one row, or a row with more than one reportable column.
#[derive(Debug)]
pub(super) struct NonUniqueResult;

impl std::error::Error for NonUniqueResult {}

impl core::fmt::Display for NonUniqueResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("the query returned multiple rows or columns; exactly one scalar was expected")
    }
}

impl Error {
    pub fn non_unique_result() -> Error {
        Error::from(super::ErrorKind::NonUniqueResult(NonUniqueResult))
    }

    /// Returns `true` if this error is a non-unique result error.
    pub fn is_non_unique_result(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NonUniqueResult(_))
    }
}

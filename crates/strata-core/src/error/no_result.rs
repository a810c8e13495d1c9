use super::Error;

/// Error when a query expected to produce a value produced no rows.
#[derive(Debug)]
pub(super) struct NoResult;

impl std::error::Error for NoResult {}

impl core::fmt::Display for NoResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("no result was found for a query although at least one row was expected")
    }
}

impl Error {
    pub fn no_result() -> Error {
        Error::from(super::ErrorKind::NoResult(NoResult))
    }

    /// Returns `true` if this error is a no result error.
    pub fn is_no_result(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NoResult(_))
    }
}

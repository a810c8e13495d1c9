use super::Error;

/// Error when a result column refers to a result alias the result-set
/// mapping does not declare.
///
/// This is a contract violation between the query compiler and the row
/// source, never skipped.
#[derive(Debug)]
pub(super) struct UnknownResultAlias {
    alias: Box<str>,
    column: Box<str>,
}

impl std::error::Error for UnknownResultAlias {}

impl core::fmt::Display for UnknownResultAlias {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "result column `{}` references unknown result alias `{}`",
            self.column, self.alias
        )
    }
}

impl Error {
    pub fn unknown_result_alias(alias: impl Into<String>, column: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownResultAlias(UnknownResultAlias {
            alias: alias.into().into(),
            column: column.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown result alias error.
    pub fn is_unknown_result_alias(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownResultAlias(_))
    }
}

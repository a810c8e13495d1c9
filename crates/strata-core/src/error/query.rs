use super::Error;

/// Error raised while compiling a DQL string into SQL.
#[derive(Debug)]
pub(super) struct QueryError {
    kind: QueryErrorKind,
    message: Box<str>,
}

#[derive(Debug)]
enum QueryErrorKind {
    /// The string is not valid DQL. Holds the column and the offending token.
    Syntax { col: usize, token: Box<str> },

    /// The DQL parses but does not resolve against the mapping metadata.
    /// Holds the offending fragment.
    Semantical { fragment: Box<str> },
}

impl std::error::Error for QueryError {}

impl core::fmt::Display for QueryError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            QueryErrorKind::Syntax { col, token } => {
                write!(f, "[Syntax Error] line 0, col {col}: Error: {}", self.message)?;
                if token.is_empty() {
                    f.write_str(", got end of string.")
                } else {
                    write!(f, ", got '{token}'")
                }
            }
            QueryErrorKind::Semantical { fragment } => write!(
                f,
                "[Semantical Error] near '{fragment}': Error: {}",
                self.message
            ),
        }
    }
}

impl Error {
    /// Creates a DQL syntax error at column `col`. An empty `token` means
    /// the input ended early.
    pub fn query_syntax(col: usize, token: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Query(QueryError {
            kind: QueryErrorKind::Syntax {
                col,
                token: token.into().into(),
            },
            message: message.into().into(),
        }))
    }

    /// Creates a semantical error referencing the offending DQL fragment.
    pub fn query_semantical(fragment: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Query(QueryError {
            kind: QueryErrorKind::Semantical {
                fragment: fragment.into().into(),
            },
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a query translation error.
    pub fn is_query(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Query(_))
    }

    /// Returns `true` if this error is a DQL syntax error.
    pub fn is_query_syntax(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::Query(QueryError {
                kind: QueryErrorKind::Syntax { .. },
                ..
            })
        )
    }
}

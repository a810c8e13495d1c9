mod adhoc;
mod driver_operation_failed;
mod invalid_connection_url;
mod invalid_entity_state;
mod invalid_mapping;
mod no_result;
mod non_unique_result;
mod query;
mod type_conversion;
mod unknown_mapping_property;
mod unknown_result_alias;

use adhoc::AdhocError;
use driver_operation_failed::DriverOperationFailed;
use invalid_connection_url::InvalidConnectionUrl;
use invalid_entity_state::InvalidEntityState;
use invalid_mapping::InvalidMapping;
use no_result::NoResult;
use non_unique_result::NonUniqueResult;
use query::QueryError;
use std::sync::Arc;
use type_conversion::TypeConversionError;
use unknown_mapping_property::UnknownMappingProperty;
use unknown_result_alias::UnknownResultAlias;

/// Returns early with an ad-hoc error built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Creates an ad-hoc error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Strata.
///
/// Every failure in mapping validation, query translation, hydration and
/// persistence is reported through this type. Use the `is_*` predicates to
/// branch on a specific condition, e.g. [`Error::is_no_result`] versus
/// [`Error::is_non_unique_result`].
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        Arc::get_mut(inner).unwrap().cause = Some(self);
        err
    }

    /// The innermost error of the context chain.
    pub fn root(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    UnknownMappingProperty(UnknownMappingProperty),
    InvalidMapping(InvalidMapping),
    Query(QueryError),
    NonUniqueResult(NonUniqueResult),
    NoResult(NoResult),
    UnknownResultAlias(UnknownResultAlias),
    TypeConversion(TypeConversionError),
    InvalidEntityState(InvalidEntityState),
    DriverOperationFailed(DriverOperationFailed),
    InvalidConnectionUrl(InvalidConnectionUrl),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            UnknownMappingProperty(err) => core::fmt::Display::fmt(err, f),
            InvalidMapping(err) => core::fmt::Display::fmt(err, f),
            Query(err) => core::fmt::Display::fmt(err, f),
            NonUniqueResult(err) => core::fmt::Display::fmt(err, f),
            NoResult(err) => core::fmt::Display::fmt(err, f),
            UnknownResultAlias(err) => core::fmt::Display::fmt(err, f),
            TypeConversion(err) => core::fmt::Display::fmt(err, f),
            InvalidEntityState(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown strata error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn error_size() {
        // Ensure Error stays at one word (size of pointer/Arc)
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = Error::from_args(format_args!("root cause"));
        let mid = Error::from_args(format_args!("middle context"));
        let top = Error::from_args(format_args!("top context"));

        let chained = root.context(mid).context(top);
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
    }

    #[test]
    fn predicates_follow_the_outer_kind() {
        let err = Error::no_result().context(err!("Query::get_single_result"));
        assert!(!err.is_no_result());
        assert!(err.root().is_no_result());
    }

    #[test]
    fn anyhow_bridge() {
        let anyhow_err = anyhow::anyhow!("something failed");
        let our_err: Error = anyhow_err.into();
        assert_eq!(our_err.to_string(), "something failed");
    }

    #[test]
    fn unknown_mapping_property() {
        let err = Error::unknown_mapping_property("fetchMode", "ManyToOneAssociationMapping");
        assert!(err.is_unknown_mapping_property());
        assert_eq!(
            err.to_string(),
            "unknown mapping property `fetchMode` on ManyToOneAssociationMapping"
        );
    }

    #[test]
    fn invalid_mapping() {
        let err = Error::invalid_mapping("a join table is only legal on many-to-many associations");
        assert!(err.is_invalid_mapping());
        assert_eq!(
            err.to_string(),
            "invalid mapping: a join table is only legal on many-to-many associations"
        );
    }

    #[test]
    fn query_semantical() {
        let err =
            Error::query_semantical("u.foo", "Class User has no field or association named foo");
        assert!(err.is_query());
        assert_eq!(
            err.to_string(),
            "[Semantical Error] near 'u.foo': Error: Class User has no field or association named foo"
        );
    }

    #[test]
    fn query_syntax() {
        let err = Error::query_syntax(7, "FORM", "Expected FROM");
        assert!(err.is_query());
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 7: Error: Expected FROM, got 'FORM'"
        );
    }

    #[test]
    fn hydration_cardinality_errors_are_distinct() {
        let non_unique = Error::non_unique_result();
        let none = Error::no_result();

        assert!(non_unique.is_non_unique_result());
        assert!(!non_unique.is_no_result());
        assert!(none.is_no_result());
        assert!(!none.is_non_unique_result());

        assert_eq!(
            non_unique.to_string(),
            "the query returned multiple rows or columns; exactly one scalar was expected"
        );
        assert_eq!(
            none.to_string(),
            "no result was found for a query although at least one row was expected"
        );
    }

    #[test]
    fn unknown_result_alias() {
        let err = Error::unknown_result_alias("x", "x__id");
        assert!(err.is_unknown_result_alias());
        assert_eq!(
            err.to_string(),
            "result column `x__id` references unknown result alias `x`"
        );
    }

    #[test]
    fn type_conversion_error() {
        let err = Error::type_conversion(Value::String("abc".into()), "integer");
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert String to integer");
    }

    #[test]
    fn invalid_entity_state() {
        let err = Error::invalid_entity_state("entity is not managed");
        assert!(err.is_invalid_entity_state());
        assert_eq!(err.to_string(), "invalid entity state: entity is not managed");
    }

    #[test]
    fn driver_operation_failed_walks_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::driver_operation_failed(io_err);
        assert!(err.is_driver_operation_failed());
        assert_eq!(err.to_string(), "file not found");
    }
}

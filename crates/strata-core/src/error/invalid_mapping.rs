use super::Error;

/// Error when mapping metadata is invalid.
///
/// This occurs when:
/// - A mandatory key is missing or has the wrong type
/// - An attribute is not legal for the association kind (join table on a to-one)
/// - Owning and inverse side configuration contradict each other
/// - A referenced class or field is not registered
/// - Inheritance is inconsistent (duplicate field, inverse to-many on a mapped superclass)
///
/// These errors abort the metadata build for the class being loaded.
#[derive(Debug)]
pub(super) struct InvalidMapping {
    message: Box<str>,
}

impl std::error::Error for InvalidMapping {}

impl core::fmt::Display for InvalidMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMapping(InvalidMapping {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid mapping error.
    pub fn is_invalid_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidMapping(_))
    }
}

use super::Error;

/// Error when an entity is used in a way its lifecycle state does not allow,
/// such as flushing a new entity reached through an association that does
/// not cascade persist.
#[derive(Debug)]
pub(super) struct InvalidEntityState {
    message: Box<str>,
}

impl std::error::Error for InvalidEntityState {}

impl core::fmt::Display for InvalidEntityState {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid entity state: {}", self.message)
    }
}

impl Error {
    pub fn invalid_entity_state(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidEntityState(InvalidEntityState {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid entity state error.
    pub fn is_invalid_entity_state(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidEntityState(_))
    }
}

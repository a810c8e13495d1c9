use super::Error;

/// Error when raw mapping input names a property the target mapping type
/// does not have.
///
/// Raised by association, join column and join table ingestion, and by the
/// indexed accessors on [`AssociationMapping`](crate::mapping::AssociationMapping).
/// Misspelled configuration keys are never stored.
#[derive(Debug)]
pub(super) struct UnknownMappingProperty {
    property: Box<str>,
    mapping: &'static str,
}

impl std::error::Error for UnknownMappingProperty {}

impl core::fmt::Display for UnknownMappingProperty {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unknown mapping property `{}` on {}",
            self.property, self.mapping
        )
    }
}

impl Error {
    /// Creates an unknown mapping property error.
    ///
    /// `mapping` is the concrete mapping type name, e.g.
    /// `ManyToOneAssociationMapping` or `JoinColumn`.
    pub fn unknown_mapping_property(property: impl Into<String>, mapping: &'static str) -> Error {
        Error::from(super::ErrorKind::UnknownMappingProperty(
            UnknownMappingProperty {
                property: property.into().into(),
                mapping,
            },
        ))
    }

    /// Returns `true` if this error is an unknown mapping property error.
    pub fn is_unknown_mapping_property(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownMappingProperty(_))
    }
}

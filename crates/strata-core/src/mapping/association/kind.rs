use crate::{Error, Result, Value};

/// Cardinality of an association.
///
/// The discriminant is the code used for `type` in raw mapping arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    OneToOne = 1,
    ManyToOne = 2,
    OneToMany = 4,
    ManyToMany = 8,
}

impl AssociationKind {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<AssociationKind> {
        Some(match code {
            1 => AssociationKind::OneToOne,
            2 => AssociationKind::ManyToOne,
            4 => AssociationKind::OneToMany,
            8 => AssociationKind::ManyToMany,
            _ => return None,
        })
    }

    pub(crate) fn from_value(value: &Value) -> Result<AssociationKind> {
        value
            .as_i64()
            .and_then(AssociationKind::from_code)
            .ok_or_else(|| {
                Error::invalid_mapping(format!("invalid association type {value}"))
            })
    }

    pub fn is_to_one(self) -> bool {
        matches!(self, AssociationKind::OneToOne | AssociationKind::ManyToOne)
    }

    pub fn is_to_many(self) -> bool {
        !self.is_to_one()
    }

    /// Name of the concrete mapping variant, used in error messages.
    pub fn mapping_name(self) -> &'static str {
        match self {
            AssociationKind::OneToOne => "OneToOneAssociationMapping",
            AssociationKind::ManyToOne => "ManyToOneAssociationMapping",
            AssociationKind::OneToMany => "OneToManyAssociationMapping",
            AssociationKind::ManyToMany => "ManyToManyAssociationMapping",
        }
    }
}

/// When the target of an association is loaded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Lazy = 2,
    Eager = 3,
    ExtraLazy = 4,
}

impl FetchMode {
    pub(crate) fn from_value(value: &Value) -> Result<FetchMode> {
        Ok(match value {
            Value::I64(2) => FetchMode::Lazy,
            Value::I64(3) => FetchMode::Eager,
            Value::I64(4) => FetchMode::ExtraLazy,
            Value::String(s) if s.eq_ignore_ascii_case("LAZY") => FetchMode::Lazy,
            Value::String(s) if s.eq_ignore_ascii_case("EAGER") => FetchMode::Eager,
            Value::String(s) if s.eq_ignore_ascii_case("EXTRA_LAZY") => FetchMode::ExtraLazy,
            _ => {
                return Err(Error::invalid_mapping(format!(
                    "invalid fetch mode {value}"
                )))
            }
        })
    }
}

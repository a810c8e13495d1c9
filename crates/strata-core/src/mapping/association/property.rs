use super::AssociationKind;

macro_rules! properties {
    ( $( $variant:ident => $name:literal, )* ) => {
        /// The closed set of attributes of an association mapping, by their
        /// raw mapping key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Property {
            $( $variant, )*
        }

        impl Property {
            /// Every property in flattening order.
            pub const ALL: &'static [Property] = &[ $( Property::$variant, )* ];

            /// The raw mapping key.
            pub fn name(self) -> &'static str {
                match self {
                    $( Property::$variant => $name, )*
                }
            }

            /// Exact, case-sensitive lookup by raw mapping key.
            pub fn from_name(name: &str) -> Option<Property> {
                match name {
                    $( $name => Some(Property::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

properties! {
    Type => "type",
    FieldName => "fieldName",
    SourceEntity => "sourceEntity",
    TargetEntity => "targetEntity",
    MappedBy => "mappedBy",
    InversedBy => "inversedBy",
    Cascade => "cascade",
    Fetch => "fetch",
    Inherited => "inherited",
    Declared => "declared",
    Cache => "cache",
    Id => "id",
    IsCascadeRemove => "isCascadeRemove",
    IsCascadePersist => "isCascadePersist",
    IsCascadeRefresh => "isCascadeRefresh",
    IsCascadeMerge => "isCascadeMerge",
    IsCascadeDetach => "isCascadeDetach",
    IsOnDeleteCascade => "isOnDeleteCascade",
    IsOwningSide => "isOwningSide",
    JoinColumns => "joinColumns",
    JoinColumnFieldNames => "joinColumnFieldNames",
    SourceToTargetKeyColumns => "sourceToTargetKeyColumns",
    TargetToSourceKeyColumns => "targetToSourceKeyColumns",
    JoinTable => "joinTable",
    JoinTableColumns => "joinTableColumns",
    RelationToSourceKeyColumns => "relationToSourceKeyColumns",
    RelationToTargetKeyColumns => "relationToTargetKeyColumns",
    OriginalClass => "originalClass",
    OriginalField => "originalField",
    OrphanRemoval => "orphanRemoval",
    Unique => "unique",
    OrderBy => "orderBy",
    IndexBy => "indexBy",
}

impl Property {
    /// The four keys every raw mapping must carry.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            Property::Type | Property::FieldName | Property::SourceEntity | Property::TargetEntity
        )
    }

    /// Properties that always hold a value and cannot be unset.
    pub fn is_always_set(self) -> bool {
        use Property::*;

        self.is_mandatory()
            || matches!(
                self,
                IsCascadeRemove
                    | IsCascadePersist
                    | IsCascadeRefresh
                    | IsCascadeMerge
                    | IsCascadeDetach
                    | IsOwningSide
            )
    }

    /// Whether an association of `kind` carries this property at all.
    pub fn is_legal_for(self, kind: AssociationKind) -> bool {
        use Property::*;

        match self {
            JoinTable | JoinTableColumns | RelationToSourceKeyColumns
            | RelationToTargetKeyColumns => kind == AssociationKind::ManyToMany,
            JoinColumns | JoinColumnFieldNames | SourceToTargetKeyColumns
            | TargetToSourceKeyColumns => kind.is_to_one(),
            OrderBy | IndexBy => kind.is_to_many(),
            OrphanRemoval => kind != AssociationKind::ManyToOne,
            _ => true,
        }
    }

    fn bit(self) -> u64 {
        1 << self as u32
    }
}

/// Tracks which optional properties have been assigned, so an explicit
/// null can be told apart from a property that was never set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PropertySet(u64);

impl PropertySet {
    pub(crate) fn contains(self, property: Property) -> bool {
        property.is_always_set() || self.0 & property.bit() != 0
    }

    pub(crate) fn insert(&mut self, property: Property) {
        if !property.is_always_set() {
            self.0 |= property.bit();
        }
    }

    pub(crate) fn remove(&mut self, property: Property) {
        self.0 &= !property.bit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for &property in Property::ALL {
            assert_eq!(Property::from_name(property.name()), Some(property));
        }
        assert_eq!(Property::from_name("JoinTable"), None);
        assert!(Property::ALL.len() <= 64);
    }

    #[test]
    fn legality_table() {
        use AssociationKind::*;

        assert!(Property::JoinTable.is_legal_for(ManyToMany));
        assert!(!Property::JoinTable.is_legal_for(ManyToOne));
        assert!(!Property::JoinTable.is_legal_for(OneToOne));
        assert!(Property::JoinColumns.is_legal_for(OneToOne));
        assert!(!Property::JoinColumns.is_legal_for(OneToMany));
        assert!(Property::OrderBy.is_legal_for(OneToMany));
        assert!(!Property::OrderBy.is_legal_for(ManyToOne));
        assert!(!Property::OrphanRemoval.is_legal_for(ManyToOne));
        assert!(Property::MappedBy.is_legal_for(ManyToOne));
    }
}

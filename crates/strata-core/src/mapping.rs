pub(crate) mod raw;

mod association;
pub use association::{AssociationKind, AssociationMapping, FetchMode, Property};

mod cache;
pub use cache::{CacheConfig, CacheUsage};

mod cascade;
pub use cascade::Cascade;

mod class;
pub use class::{ClassMetadata, DiscriminatorColumn, IdGenerator, InheritanceType, TableRef};

mod definition;
pub use definition::ClassDefinition;

mod factory;
pub use factory::MetadataFactory;

mod field;
pub use field::{FieldMapping, FieldType};

mod join_column;
pub use join_column::JoinColumn;

mod join_table;
pub use join_table::JoinTable;

mod naming;
pub use naming::NamingStrategy;

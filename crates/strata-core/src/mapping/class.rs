mod flat;

use super::{AssociationMapping, CacheConfig, FieldMapping, FieldType};
use crate::Value;

use indexmap::IndexMap;

/// Complete mapping metadata of one class, produced by the
/// [`MetadataFactory`](super::MetadataFactory).
///
/// Metadata is immutable once built and shared through `Arc` by query
/// compilation, hydration and the unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    /// Class name as registered.
    pub name: String,

    /// Topmost entity of the hierarchy. Equal to `name` for roots.
    pub root_entity_name: String,

    /// Ancestors, nearest first.
    pub parent_classes: Vec<String>,

    /// Registered descendants.
    pub subclasses: Vec<String>,

    pub is_mapped_superclass: bool,

    pub table: TableRef,

    /// Mapped fields in declaration order, inherited fields first.
    pub fields: IndexMap<String, FieldMapping>,

    /// Identifier field names. May name an association when the identifier
    /// is derived from a to-one relation.
    pub identifier: Vec<String>,

    pub id_generator: IdGenerator,

    /// Associations in declaration order, inherited ones first.
    pub associations: IndexMap<String, AssociationMapping>,

    pub inheritance: InheritanceType,

    pub discriminator_column: Option<DiscriminatorColumn>,

    /// Discriminator value to class name.
    pub discriminator_map: IndexMap<String, String>,

    /// Value stored in the discriminator column for this class.
    pub discriminator_value: Option<String>,

    pub cache: Option<CacheConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IdGenerator {
    /// Identifiers are assigned by the application.
    #[default]
    None,

    /// The database generates the identifier on insert.
    Identity,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InheritanceType {
    #[default]
    None,
    SingleTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorColumn {
    pub name: String,
    pub ty: FieldType,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> TableRef {
        TableRef {
            name: name.into(),
            schema: None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>, table: TableRef) -> ClassMetadata {
        let name = name.into();

        ClassMetadata {
            root_entity_name: name.clone(),
            name,
            parent_classes: vec![],
            subclasses: vec![],
            is_mapped_superclass: false,
            table,
            fields: IndexMap::new(),
            identifier: vec![],
            id_generator: IdGenerator::None,
            associations: IndexMap::new(),
            inheritance: InheritanceType::None,
            discriminator_column: None,
            discriminator_map: IndexMap::new(),
            discriminator_value: None,
            cache: None,
        }
    }

    /// Class name without namespace.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.get(name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationMapping> {
        self.associations.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.contains_key(name)
    }

    pub fn column_name(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|f| f.column_name.as_str())
    }

    pub fn field_for_column(&self, column: &str) -> Option<&FieldMapping> {
        self.fields.values().find(|f| f.column_name == column)
    }

    pub fn is_identifier(&self, field: &str) -> bool {
        self.identifier.iter().any(|id| id == field)
    }

    pub fn is_identifier_composite(&self) -> bool {
        self.identifier.len() > 1
    }

    pub fn is_inheritance_root(&self) -> bool {
        self.name == self.root_entity_name
    }

    pub fn is_id_generator_identity(&self) -> bool {
        self.id_generator == IdGenerator::Identity
    }

    /// Columns holding the identifier, in identifier order. Association
    /// identifiers contribute their join columns.
    pub fn identifier_columns(&self) -> Vec<&str> {
        let mut columns = vec![];

        for id in &self.identifier {
            if let Some(field) = self.fields.get(id) {
                columns.push(field.column_name.as_str());
            } else if let Some(assoc) = self.associations.get(id) {
                columns.extend(assoc.join_columns().iter().map(|jc| jc.name.as_str()));
            }
        }

        columns
    }

    /// Column names this class reads and writes on its own table: mapped
    /// fields followed by owning to-one join columns.
    pub fn column_names(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self
            .fields
            .values()
            .map(|f| f.column_name.as_str())
            .collect();

        for assoc in self.associations.values() {
            if assoc.is_to_one() && assoc.is_owning_side() {
                for jc in assoc.join_columns() {
                    if !columns.contains(&jc.name.as_str()) {
                        columns.push(&jc.name);
                    }
                }
            }
        }

        columns
    }

    /// Discriminator values selecting this class and its subclasses.
    pub fn discriminator_values(&self) -> Vec<&str> {
        self.discriminator_map
            .iter()
            .filter(|(_, class)| **class == self.name || self.subclasses.contains(class))
            .map(|(value, _)| value.as_str())
            .collect()
    }

    /// Converts a raw discriminator column value into the map key.
    pub fn discriminator_key(&self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::I64(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

pub(crate) fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

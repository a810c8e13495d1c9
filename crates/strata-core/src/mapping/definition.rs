use super::{CacheConfig, FieldType, IdGenerator};
use crate::{MappingArray, Value};

use indexmap::IndexMap;

/// Mapping input for one class, as produced by an external mapping driver
/// (attributes, XML, ...). Turned into [`ClassMetadata`](super::ClassMetadata)
/// by the [`MetadataFactory`](super::MetadataFactory).
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) is_mapped_superclass: bool,
    pub(crate) table: Option<String>,
    pub(crate) schema: Option<String>,
    pub(crate) fields: Vec<FieldDefinition>,
    pub(crate) associations: Vec<MappingArray>,
    pub(crate) id_generator: IdGenerator,
    pub(crate) discriminator: Option<DiscriminatorDefinition>,
    pub(crate) cache: Option<CacheConfig>,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldDefinition {
    pub(crate) name: String,
    pub(crate) ty: FieldType,
    pub(crate) column: Option<String>,
    pub(crate) nullable: bool,
    pub(crate) unique: bool,
    pub(crate) id: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct DiscriminatorDefinition {
    pub(crate) column: String,
    pub(crate) ty: FieldType,
    pub(crate) map: IndexMap<String, String>,
}

impl ClassDefinition {
    pub fn entity(name: impl Into<String>) -> ClassDefinition {
        ClassDefinition {
            name: name.into(),
            parent: None,
            is_mapped_superclass: false,
            table: None,
            schema: None,
            fields: vec![],
            associations: vec![],
            id_generator: IdGenerator::None,
            discriminator: None,
            cache: None,
        }
    }

    pub fn mapped_superclass(name: impl Into<String>) -> ClassDefinition {
        ClassDefinition {
            is_mapped_superclass: true,
            ..ClassDefinition::entity(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Adds a database-generated identifier field.
    pub fn id(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.id_generator = IdGenerator::Identity;
        self.push_field(name.into(), ty, true)
    }

    /// Adds an identifier field whose value the application assigns.
    pub fn assigned_id(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push_field(name.into(), ty, true)
    }

    pub fn field(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push_field(name.into(), ty, false)
    }

    /// Overrides the column of the most recently added field.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.column = Some(column.into());
        }
        self
    }

    /// Marks the most recently added field nullable.
    pub fn nullable(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.nullable = true;
        }
        self
    }

    /// Marks the most recently added field unique.
    pub fn unique(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.unique = true;
        }
        self
    }

    /// Adds an association from its raw mapping array. `sourceEntity` is
    /// filled in when absent.
    pub fn association(mut self, mut raw: MappingArray) -> Self {
        if !raw.contains_key("sourceEntity") {
            raw.insert("sourceEntity".into(), Value::from(&self.name));
        }
        self.associations.push(raw);
        self
    }

    /// Declares single-table inheritance rooted at this class.
    pub fn single_table_inheritance<I, K, V>(mut self, column: impl Into<String>, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.discriminator = Some(DiscriminatorDefinition {
            column: column.into(),
            ty: FieldType::String,
            map: map
                .into_iter()
                .map(|(value, class)| (value.into(), class.into()))
                .collect(),
        });
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    fn push_field(mut self, name: String, ty: FieldType, id: bool) -> Self {
        self.fields.push(FieldDefinition {
            name,
            ty,
            column: None,
            nullable: false,
            unique: false,
            id,
        });
        self
    }
}

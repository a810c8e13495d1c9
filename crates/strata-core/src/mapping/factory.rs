mod complete;
mod validate;

use super::{
    class::short_name, AssociationMapping, ClassDefinition, ClassMetadata, DiscriminatorColumn,
    FieldMapping, IdGenerator, InheritanceType, NamingStrategy, TableRef,
};
use crate::{Error, Result, Schema};

use indexmap::IndexMap;
use std::sync::Arc;

/// Builds [`ClassMetadata`] from registered [`ClassDefinition`]s.
///
/// Metadata is built lazily, parents before children, and memoized: asking
/// twice for the same class returns the same `Arc`.
#[derive(Debug, Default)]
pub struct MetadataFactory {
    definitions: IndexMap<String, ClassDefinition>,
    loaded: IndexMap<String, Arc<ClassMetadata>>,
    naming: NamingStrategy,
    table_name_prefix: Option<String>,
    duplicates: Vec<String>,
}

/// Settings shared by every association completed while loading one class.
pub(super) struct Completion<'a> {
    pub(super) naming: NamingStrategy,
    pub(super) table_name_prefix: Option<&'a str>,
    pub(super) root_entity_name: &'a str,
}

impl Completion<'_> {
    pub(super) fn table_name(&self, name: &str) -> String {
        match self.table_name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

impl MetadataFactory {
    pub fn new() -> MetadataFactory {
        MetadataFactory::default()
    }

    pub fn naming_strategy(&mut self, naming: NamingStrategy) -> &mut Self {
        self.naming = naming;
        self
    }

    /// Prefix added to every table name, including join tables.
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn register(&mut self, definition: ClassDefinition) -> &mut Self {
        let name = definition.name().to_string();
        if self.definitions.insert(name.clone(), definition).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Makes already built metadata available, e.g. metadata restored from a
    /// cache. Preloaded metadata wins over a registered definition.
    pub fn preload(&mut self, metadata: Arc<ClassMetadata>) -> &mut Self {
        self.loaded.insert(metadata.name.clone(), metadata);
        self
    }

    pub fn has_metadata_for(&self, name: &str) -> bool {
        self.resolve_name(name).is_some()
    }

    /// Returns the metadata of `name`, building it and its ancestors first if
    /// needed. `name` may be a short class name when it is unambiguous.
    pub fn metadata_for(&mut self, name: &str) -> Result<Arc<ClassMetadata>> {
        self.check_duplicates()?;
        self.load(name, &mut vec![])
    }

    /// Builds the metadata of every registered class, in registration order.
    pub fn all_metadata(&mut self) -> Result<Vec<Arc<ClassMetadata>>> {
        self.check_duplicates()?;

        let names: Vec<String> = self
            .definitions
            .keys()
            .chain(self.loaded.keys())
            .cloned()
            .collect();

        let mut all = IndexMap::new();
        for name in names {
            let metadata = self.load(&name, &mut vec![])?;
            all.entry(metadata.name.clone()).or_insert(metadata);
        }

        Ok(all.into_values().collect())
    }

    /// Builds every class and checks the relations between them.
    pub fn schema(&mut self) -> Result<Schema> {
        let classes = self.all_metadata()?;
        let schema = Schema::new(classes);
        validate::schema(&schema)?;
        Ok(schema)
    }

    fn check_duplicates(&self) -> Result<()> {
        match self.duplicates.first() {
            Some(name) => Err(Error::invalid_mapping(format!(
                "class `{name}` is registered more than once"
            ))),
            None => Ok(()),
        }
    }

    /// Canonical name of a registered or preloaded class. Falls back to a
    /// unique short-name match.
    fn resolve_name(&self, name: &str) -> Option<String> {
        if self.definitions.contains_key(name) || self.loaded.contains_key(name) {
            return Some(name.to_string());
        }

        let mut matches = self
            .definitions
            .keys()
            .chain(self.loaded.keys())
            .filter(|candidate| short_name(candidate) == name);

        let first = matches.next()?;
        match matches.find(|other| *other != first) {
            Some(_) => None,
            None => Some(first.clone()),
        }
    }

    /// Resolves an association target relative to the source namespace.
    fn resolve_target(&self, source: &str, target: &str) -> String {
        if !target.contains('\\') {
            if let Some((namespace, _)) = source.rsplit_once('\\') {
                let qualified = format!("{namespace}\\{target}");
                if self.definitions.contains_key(&qualified)
                    || self.loaded.contains_key(&qualified)
                {
                    return qualified;
                }
            }
        }

        self.resolve_name(target)
            .unwrap_or_else(|| target.to_string())
    }

    fn load(&mut self, name: &str, loading: &mut Vec<String>) -> Result<Arc<ClassMetadata>> {
        let Some(name) = self.resolve_name(name) else {
            return Err(Error::invalid_mapping(format!(
                "class `{name}` is not a registered entity class"
            )));
        };

        if let Some(metadata) = self.loaded.get(&name) {
            return Ok(metadata.clone());
        }

        if loading.contains(&name) {
            return Err(Error::invalid_mapping(format!(
                "class `{name}` inherits from itself"
            )));
        }

        let Some(definition) = self.definitions.get(&name).cloned() else {
            return Err(Error::invalid_mapping(format!(
                "class `{name}` is not a registered entity class"
            )));
        };

        loading.push(name.clone());

        let parent = match &definition.parent {
            Some(parent) => Some(self.load(parent, loading)?),
            None => None,
        };

        let metadata = Arc::new(self.build(&definition, parent.as_deref())?);
        log::debug!(
            "loaded metadata for {}; table={} fields={} associations={}",
            metadata.name,
            metadata.table.qualified_name(),
            metadata.fields.len(),
            metadata.associations.len()
        );

        loading.pop();
        self.loaded.insert(name, metadata.clone());
        Ok(metadata)
    }

    fn build(
        &self,
        def: &ClassDefinition,
        parent: Option<&ClassMetadata>,
    ) -> Result<ClassMetadata> {
        let entity_parent = parent.filter(|parent| !parent.is_mapped_superclass);

        if let Some(parent) = entity_parent {
            if parent.inheritance == InheritanceType::None {
                return Err(Error::invalid_mapping(format!(
                    "entity `{}` extends entity `{}` which declares no inheritance type",
                    def.name, parent.name
                )));
            }
            if def.discriminator.is_some() {
                return Err(Error::invalid_mapping(format!(
                    "entity `{}` declares a discriminator map; only the inheritance root `{}` may",
                    def.name, parent.root_entity_name
                )));
            }
        }

        let table = match entity_parent {
            // Single table inheritance: the hierarchy shares the root table.
            Some(parent) => parent.table.clone(),
            None => TableRef {
                name: self.table_name(
                    def.table
                        .clone()
                        .unwrap_or_else(|| self.naming.class_to_table_name(&def.name)),
                ),
                schema: def.schema.clone(),
            },
        };

        let mut class = ClassMetadata::new(&def.name, table);
        class.is_mapped_superclass = def.is_mapped_superclass;
        class.cache = def.cache.clone();
        class.subclasses = self.subclasses_of(&def.name);

        if let Some(parent) = parent {
            self.inherit(&mut class, parent);
        }

        for field in &def.fields {
            if class.has_field(&field.name) || class.has_association(&field.name) {
                return Err(duplicate_field(&class.name, &field.name));
            }

            let mut mapping = FieldMapping::new(
                &field.name,
                field
                    .column
                    .clone()
                    .unwrap_or_else(|| self.naming.property_to_column_name(&field.name)),
                field.ty,
            );
            mapping.nullable = field.nullable;
            mapping.unique = field.unique;
            mapping.id = field.id;

            if field.id {
                class.identifier.push(field.name.clone());
            }
            class.fields.insert(field.name.clone(), mapping);
        }

        if def.id_generator == IdGenerator::Identity {
            class.id_generator = IdGenerator::Identity;
        }

        if let Some(discriminator) = &def.discriminator {
            class.inheritance = InheritanceType::SingleTable;
            class.discriminator_column = Some(DiscriminatorColumn {
                name: discriminator.column.clone(),
                ty: discriminator.ty,
            });
            class.discriminator_map = discriminator
                .map
                .iter()
                .map(|(value, target)| {
                    let target = self.resolve_name(target).unwrap_or_else(|| target.clone());
                    (value.clone(), target)
                })
                .collect();
        }

        if class.inheritance == InheritanceType::SingleTable && !class.is_mapped_superclass {
            class.discriminator_value = class
                .discriminator_map
                .iter()
                .find(|(_, target)| **target == class.name)
                .map(|(value, _)| value.clone());

            if class.discriminator_value.is_none() && !class.is_inheritance_root() {
                return Err(Error::invalid_mapping(format!(
                    "entity `{}` is not part of the discriminator map of `{}`",
                    class.name, class.root_entity_name
                )));
            }
        }

        let cx = Completion {
            naming: self.naming,
            table_name_prefix: self.table_name_prefix.as_deref(),
            root_entity_name: &class.root_entity_name,
        };

        let mut own = vec![];
        for raw in &def.associations {
            let mut assoc = AssociationMapping::from_mapping_array(raw)?;
            let target = self.resolve_target(assoc.source_entity(), assoc.target_entity());
            assoc.set_target_entity(target);
            complete::association(&mut assoc, &cx)?;
            own.push(assoc);
        }

        for assoc in own {
            let field = assoc.field_name().to_string();
            if class.has_field(&field) || class.has_association(&field) {
                return Err(duplicate_field(&class.name, &field));
            }
            if class.is_mapped_superclass && assoc.is_to_many() && !assoc.is_owning_side() {
                return Err(Error::invalid_mapping(format!(
                    "mapped superclass `{}` cannot declare the inverse side to-many association `{field}`",
                    class.name
                )));
            }
            if assoc.is_id() {
                class.identifier.push(field.clone());
            }
            class.associations.insert(field, assoc);
        }

        if class.cache.is_some() {
            for id in &class.identifier {
                if let Some(assoc) = class.associations.get(id) {
                    if assoc.cache().is_none() {
                        return Err(Error::invalid_mapping(format!(
                            "Entity association field \"{}#{}\" not configured as part of the second-level cache.",
                            class.name, id
                        )));
                    }
                }
            }
        }

        Ok(class)
    }

    /// Copies fields, associations and hierarchy settings from `parent`.
    fn inherit(&self, class: &mut ClassMetadata, parent: &ClassMetadata) {
        class.parent_classes = std::iter::once(parent.name.clone())
            .chain(parent.parent_classes.iter().cloned())
            .collect();

        if !parent.is_mapped_superclass {
            class.root_entity_name = parent.root_entity_name.clone();
            class.inheritance = parent.inheritance;
            class.discriminator_column = parent.discriminator_column.clone();
            class.discriminator_map = parent.discriminator_map.clone();
        }

        for field in parent.fields.values() {
            let mut field = field.clone();
            if !parent.is_mapped_superclass && field.inherited.is_none() {
                field.inherited = Some(parent.name.clone());
            }
            if field.declared.is_none() {
                field.declared = Some(parent.name.clone());
            }
            class.fields.insert(field.field_name.clone(), field);
        }

        for assoc in parent.associations.values() {
            let mut assoc = assoc.clone();

            if parent.is_mapped_superclass {
                assoc.set_source_entity(&class.name);
            }

            let inherited = match (parent.is_mapped_superclass, assoc.inherited()) {
                (false, None) => Some(parent.name.clone()),
                _ => None,
            };
            let declared = match assoc.declared() {
                Some(_) => None,
                None => Some(parent.name.clone()),
            };
            assoc.set_provenance(inherited, declared);

            class
                .associations
                .insert(assoc.field_name().to_string(), assoc);
        }

        class.identifier = parent.identifier.clone();
        class.id_generator = parent.id_generator;
    }

    fn table_name(&self, name: String) -> String {
        match &self.table_name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name,
        }
    }

    /// Registered classes that have `name` among their ancestors.
    fn subclasses_of(&self, name: &str) -> Vec<String> {
        self.definitions
            .values()
            .filter(|def| self.ancestors(def).iter().any(|ancestor| ancestor == name))
            .map(|def| def.name.clone())
            .collect()
    }

    fn ancestors(&self, def: &ClassDefinition) -> Vec<String> {
        let mut ancestors = vec![];
        let mut next = def.parent.as_deref();

        while let Some(parent) = next {
            let Some(parent) = self.resolve_name(parent) else {
                break;
            };
            if ancestors.contains(&parent) {
                break;
            }
            next = self
                .definitions
                .get(&parent)
                .and_then(|def| def.parent.as_deref());
            ancestors.push(parent);
        }

        ancestors
    }
}

fn duplicate_field(class: &str, field: &str) -> Error {
    Error::invalid_mapping(format!("property `{class}#{field}` is mapped more than once"))
}

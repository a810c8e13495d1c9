mod commit;

mod entity;
pub use entity::{Collection, Entity, EntityId, EntityState};

use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strata_core::mapping::{AssociationMapping, ClassMetadata};
use strata_core::{Error, Result, Schema, Value};

/// Work discovered while hydrating that needs further queries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pending {
    /// An uninitialized reference that must be loaded right away, either
    /// because the association is eager or because its concrete class is
    /// only known once the row is read.
    Reference(EntityId),

    /// An eager collection.
    Collection(EntityId, String),

    /// The inverse side of a one-to-one association.
    InverseToOne(EntityId, String),
}

/// Tracks entity instances and the changes to write back on flush.
///
/// Entities live in an arena and are addressed by [`EntityId`]. Managed
/// entities are indexed by identifier in the identity map, so loading the
/// same row twice yields the same handle.
#[derive(Debug)]
pub struct UnitOfWork {
    schema: Arc<Schema>,
    entities: Vec<Entity>,

    /// `(root class, identifier)` to entity.
    identity_map: HashMap<(String, String), EntityId>,

    scheduled_inserts: IndexSet<EntityId>,
    scheduled_removals: IndexSet<EntityId>,

    pending: Vec<Pending>,
}

impl UnitOfWork {
    pub fn new(schema: Arc<Schema>) -> UnitOfWork {
        UnitOfWork {
            schema,
            entities: vec![],
            identity_map: HashMap::new(),
            scheduled_inserts: IndexSet::new(),
            scheduled_removals: IndexSet::new(),
            pending: vec![],
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Creates a new, unpersisted entity of `class`.
    pub fn create(&mut self, class: &str) -> Result<EntityId> {
        let class = self.schema.class(class)?.clone();
        if class.is_mapped_superclass {
            return Err(Error::invalid_entity_state(format!(
                "cannot instantiate mapped superclass `{}`",
                class.name
            )));
        }

        let mut entity = Entity::new(class.clone(), EntityState::New);
        for assoc in class.associations.values() {
            if assoc.is_to_many() {
                entity.collections.insert(
                    assoc.field_name().to_string(),
                    Collection {
                        initialized: true,
                        ..Collection::default()
                    },
                );
            }
        }

        Ok(self.push(entity))
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id.0).ok_or_else(|| unknown_entity(id))
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(id.0).ok_or_else(|| unknown_entity(id))
    }

    pub fn state(&self, id: EntityId) -> Result<EntityState> {
        Ok(self.get(id)?.state)
    }

    /// True when `id` is managed and in the identity map.
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id)
            .is_ok_and(|entity| entity.state == EntityState::Managed)
    }

    /// Sets a mapped field, converting the value to the field's type.
    pub fn set(&mut self, id: EntityId, field: &str, value: impl Into<Value>) -> Result<()> {
        let entity = self.get_mut(id)?;
        let Some(mapping) = entity.class.field(field) else {
            return Err(Error::invalid_entity_state(format!(
                "class `{}` has no field `{field}`",
                entity.class.name
            )));
        };

        let value = mapping.ty.convert(value.into())?;
        entity.fields.insert(field.to_string(), value);
        Ok(())
    }

    pub fn set_reference(
        &mut self,
        id: EntityId,
        field: &str,
        target: Option<EntityId>,
    ) -> Result<()> {
        let assoc = self.association(id, field)?;
        if !assoc.is_to_one() {
            return Err(Error::invalid_entity_state(format!(
                "`{}#{field}` is a collection",
                assoc.source_entity()
            )));
        }

        if let Some(target) = target {
            self.check_target(&assoc, target)?;
        }

        self.get_mut(id)?
            .references
            .insert(field.to_string(), target);
        Ok(())
    }

    /// Adds `element` to an initialized collection.
    pub fn add_to_collection(
        &mut self,
        id: EntityId,
        field: &str,
        element: EntityId,
    ) -> Result<()> {
        let assoc = self.association(id, field)?;
        self.check_target(&assoc, element)?;

        let collection = self.collection_mut(id, &assoc)?;
        if collection.push(element) {
            collection.dirty = true;
        }
        Ok(())
    }

    pub fn remove_from_collection(
        &mut self,
        id: EntityId,
        field: &str,
        element: EntityId,
    ) -> Result<()> {
        let assoc = self.association(id, field)?;
        let collection = self.collection_mut(id, &assoc)?;

        let before = collection.items.len();
        collection.items.retain(|item| *item != element);
        collection.dirty |= collection.items.len() != before;
        Ok(())
    }

    fn collection_mut(
        &mut self,
        id: EntityId,
        assoc: &AssociationMapping,
    ) -> Result<&mut Collection> {
        if !assoc.is_to_many() {
            return Err(Error::invalid_entity_state(format!(
                "`{}#{}` is not a collection",
                assoc.source_entity(),
                assoc.field_name()
            )));
        }

        let collection = self
            .get_mut(id)?
            .collections
            .entry(assoc.field_name().to_string())
            .or_default();

        if !collection.initialized {
            return Err(Error::invalid_entity_state(format!(
                "collection `{}#{}` must be initialized before it is modified",
                assoc.source_entity(),
                assoc.field_name()
            )));
        }

        Ok(collection)
    }

    /// Makes a new entity managed and schedules its insertion. Cascades
    /// along associations configured with `persist`.
    pub fn persist(&mut self, id: EntityId) -> Result<()> {
        self.persist_cascading(id, &mut HashSet::new())
    }

    fn persist_cascading(&mut self, id: EntityId, visited: &mut HashSet<EntityId>) -> Result<()> {
        if !visited.insert(id) {
            return Ok(());
        }

        let state = self.get(id)?.state;
        match state {
            EntityState::New => {
                self.get_mut(id)?.state = EntityState::Managed;
                self.scheduled_inserts.insert(id);
            }
            EntityState::Removed => {
                self.get_mut(id)?.state = EntityState::Managed;
                self.scheduled_removals.shift_remove(&id);
            }
            EntityState::Managed => {}
            EntityState::Detached => {
                return Err(Error::invalid_entity_state(format!(
                    "detached entity of class `{}` passed to persist",
                    self.get(id)?.class.name
                )))
            }
        }

        for (assoc, target) in self.links(id)? {
            if assoc.is_cascade_persist() {
                self.persist_cascading(target, visited)?;
            }
        }

        Ok(())
    }

    /// Schedules a managed entity for deletion. Cascades along associations
    /// configured with `remove`; only loaded elements are reached.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        self.remove_cascading(id, &mut HashSet::new())
    }

    fn remove_cascading(&mut self, id: EntityId, visited: &mut HashSet<EntityId>) -> Result<()> {
        if !visited.insert(id) {
            return Ok(());
        }

        let state = self.get(id)?.state;
        match state {
            EntityState::New | EntityState::Removed => {}
            // Persisted but never flushed: forget the insert.
            EntityState::Managed if self.scheduled_inserts.shift_remove(&id) => {
                self.get_mut(id)?.state = EntityState::New;
            }
            EntityState::Managed => {
                self.get_mut(id)?.state = EntityState::Removed;
                self.scheduled_removals.insert(id);
            }
            EntityState::Detached => {
                return Err(Error::invalid_entity_state(format!(
                    "detached entity of class `{}` passed to remove",
                    self.get(id)?.class.name
                )))
            }
        }

        for (assoc, target) in self.links(id)? {
            if assoc.is_cascade_remove() {
                self.remove_cascading(target, visited)?;
            }
        }

        Ok(())
    }

    /// Detaches every entity and empties the identity map. Handles stay
    /// readable.
    pub fn clear(&mut self) {
        for entity in &mut self.entities {
            if matches!(entity.state, EntityState::Managed | EntityState::Removed) {
                entity.state = EntityState::Detached;
            }
        }

        self.identity_map.clear();
        self.scheduled_inserts.clear();
        self.scheduled_removals.clear();
        self.pending.clear();

        log::debug!("unit of work cleared");
    }

    /// Looks a managed entity up by identifier values in identifier column
    /// order.
    pub fn lookup(&self, class: &ClassMetadata, key: &[Value]) -> Option<EntityId> {
        self.identity_map.get(&identity_key(class, key)).copied()
    }

    /// Every association target of `id` that is currently known: set
    /// references and loaded collection elements.
    fn links(&self, id: EntityId) -> Result<Vec<(AssociationMapping, EntityId)>> {
        let entity = self.get(id)?;
        let mut links = vec![];

        for assoc in entity.class.associations.values() {
            if assoc.is_to_one() {
                if let Some(target) = entity.reference(assoc.field_name()) {
                    links.push((assoc.clone(), target));
                }
            } else if let Some(collection) = entity.collection(assoc.field_name()) {
                for item in collection.items() {
                    links.push((assoc.clone(), *item));
                }
            }
        }

        Ok(links)
    }

    fn association(&self, id: EntityId, field: &str) -> Result<AssociationMapping> {
        let entity = self.get(id)?;
        entity.class.association(field).cloned().ok_or_else(|| {
            Error::invalid_entity_state(format!(
                "class `{}` has no association `{field}`",
                entity.class.name
            ))
        })
    }

    fn check_target(&self, assoc: &AssociationMapping, target: EntityId) -> Result<()> {
        let class = &self.get(target)?.class;
        let expected = self.schema.target_of(assoc)?;

        if class.name == expected.name || class.parent_classes.contains(&expected.name) {
            Ok(())
        } else {
            Err(Error::invalid_entity_state(format!(
                "`{}#{}` expects `{}`, got `{}`",
                assoc.source_entity(),
                assoc.field_name(),
                expected.name,
                class.name
            )))
        }
    }

    fn push(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities.push(entity);
        id
    }
}

/// Hydration support.
impl UnitOfWork {
    /// Identifier of a row, in identifier column order. `None` when any
    /// part is null.
    pub(crate) fn row_identifier(
        class: &ClassMetadata,
        fields: &IndexMap<String, Value>,
        meta: &IndexMap<String, Value>,
    ) -> Option<Vec<Value>> {
        class
            .identifier_columns()
            .into_iter()
            .map(|column| {
                let value = match class.field_for_column(column) {
                    Some(field) => fields.get(&field.field_name),
                    None => meta.get(column),
                };
                value.filter(|value| !value.is_null()).cloned()
            })
            .collect()
    }

    /// Registers a loaded row. Returns the already managed entity when the
    /// identifier is known; an uninitialized reference is filled in place
    /// and takes the row's concrete class.
    ///
    /// The flag is `true` when the row's values were written to the entity.
    /// An entity that was initialized before keeps its values, including
    /// changes not flushed yet.
    pub(crate) fn load(
        &mut self,
        class: &Arc<ClassMetadata>,
        key: &[Value],
        fields: IndexMap<String, Value>,
        meta: &IndexMap<String, Value>,
    ) -> Result<(EntityId, bool)> {
        let identity = identity_key(class, key);

        let id = match self.identity_map.get(&identity) {
            Some(&id) if self.entities[id.0].initialized => return Ok((id, false)),
            Some(&id) => {
                self.entities[id.0].class = class.clone();
                id
            }
            None => {
                let id = self.push(Entity::new(class.clone(), EntityState::Managed));
                self.identity_map.insert(identity, id);
                id
            }
        };

        self.fill(id, fields, meta)?;
        Ok((id, true))
    }

    fn fill(
        &mut self,
        id: EntityId,
        mut fields: IndexMap<String, Value>,
        meta: &IndexMap<String, Value>,
    ) -> Result<()> {
        let class = self.entities[id.0].class.clone();
        let mut references = IndexMap::new();
        let mut collections = IndexMap::new();

        for assoc in class.associations.values() {
            let field = assoc.field_name().to_string();

            if assoc.is_to_many() {
                if assoc.is_eager() {
                    self.pending.push(Pending::Collection(id, field.clone()));
                }
                collections.insert(field, Collection::uninitialized());
                continue;
            }

            if !assoc.is_owning_side() {
                self.pending.push(Pending::InverseToOne(id, field));
                continue;
            }

            let join_columns = assoc.join_columns();
            if !join_columns.iter().any(|jc| meta.contains_key(&jc.name)) {
                continue;
            }

            let referenced: IndexMap<&str, Value> = join_columns
                .iter()
                .map(|jc| {
                    (
                        jc.referenced_column_name.as_str(),
                        meta.get(&jc.name).cloned().unwrap_or_default(),
                    )
                })
                .collect();

            if referenced.values().all(Value::is_null) {
                references.insert(field, None);
                continue;
            }

            let target = self.schema.target_of(assoc)?.clone();
            let key = target
                .identifier_columns()
                .into_iter()
                .map(|column| {
                    referenced.get(column).cloned().ok_or_else(|| {
                        Error::invalid_mapping(format!(
                            "join columns of `{}#{}` must reference the identifier of `{}`",
                            class.name,
                            assoc.field_name(),
                            target.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let reference = self.reference(&target, key);
            if !self.entities[reference.0].initialized
                && (assoc.is_eager() || !target.subclasses.is_empty())
            {
                self.pending.push(Pending::Reference(reference));
            }
            references.insert(field, Some(reference));
        }

        let entity = &mut self.entities[id.0];
        entity.fields = class
            .fields
            .keys()
            .map(|name| {
                let value = fields.swap_remove(name).unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        entity.references.extend(references);
        for (field, collection) in collections {
            entity.collections.entry(field).or_insert(collection);
        }
        entity.initialized = true;
        entity.state = EntityState::Managed;
        entity.snapshot();

        Ok(())
    }

    /// Returns the managed entity for `key`, creating an uninitialized
    /// reference that only knows its identifier if there is none.
    pub(crate) fn reference(&mut self, class: &Arc<ClassMetadata>, key: Vec<Value>) -> EntityId {
        let identity = identity_key(class, &key);
        if let Some(&id) = self.identity_map.get(&identity) {
            return id;
        }

        let mut entity = Entity::new(class.clone(), EntityState::Managed);
        entity.initialized = false;
        for (column, value) in class.identifier_columns().into_iter().zip(key) {
            if let Some(field) = class.field_for_column(column) {
                entity.fields.insert(field.field_name.clone(), value);
            }
        }

        let id = self.push(entity);
        self.identity_map.insert(identity, id);
        id
    }

    /// Sets a to-one association as read from the database.
    pub(crate) fn set_loaded_reference(
        &mut self,
        id: EntityId,
        field: &str,
        target: Option<EntityId>,
    ) {
        let entity = &mut self.entities[id.0];
        entity.references.insert(field.to_string(), target);
        if let Some(original) = &mut entity.original {
            original.references.insert(field.to_string(), target);
        }
    }

    /// Marks a fetch-joined collection initialized. Returns `false` when it
    /// already was; its elements, including changes not flushed yet, are
    /// then kept as they are.
    pub(crate) fn begin_loaded_collection(&mut self, id: EntityId, field: &str) -> bool {
        let collection = self.entities[id.0]
            .collections
            .entry(field.to_string())
            .or_default();
        if collection.initialized {
            return false;
        }

        collection.items.clear();
        collection.initialized = true;
        true
    }

    pub(crate) fn push_loaded(&mut self, id: EntityId, field: &str, element: EntityId) {
        self.entities[id.0]
            .collections
            .entry(field.to_string())
            .or_default()
            .push(element);
    }

    /// Replaces a collection with the elements read from the database.
    pub(crate) fn set_loaded_collection(
        &mut self,
        id: EntityId,
        field: &str,
        items: Vec<EntityId>,
    ) {
        self.entities[id.0].collections.insert(
            field.to_string(),
            Collection {
                items,
                initialized: true,
                dirty: false,
            },
        );
    }

    pub(crate) fn pop_pending(&mut self) -> Option<Pending> {
        self.pending.pop()
    }

    /// Value of `column` in the row of `id`. Foreign key columns are read
    /// through the referenced entity.
    pub(crate) fn column_value(&self, id: EntityId, column: &str) -> Result<Value> {
        let entity = self.get(id)?;

        if let Some(field) = entity.class.field_for_column(column) {
            return Ok(entity.get(&field.field_name).cloned().unwrap_or_default());
        }

        for assoc in entity.class.associations.values() {
            if !(assoc.is_to_one() && assoc.is_owning_side()) {
                continue;
            }

            if let Some(jc) = assoc.join_columns().iter().find(|jc| jc.name == column) {
                return match entity.reference(assoc.field_name()) {
                    Some(target) => self.column_value(target, &jc.referenced_column_name),
                    None => Ok(Value::Null),
                };
            }
        }

        Err(Error::invalid_mapping(format!(
            "class `{}` has no column `{column}`",
            entity.class.name
        )))
    }

    /// Identifier values of `id` in identifier column order.
    pub(crate) fn identifier(&self, id: EntityId) -> Result<Vec<Value>> {
        let class = self.get(id)?.class.clone();
        class
            .identifier_columns()
            .into_iter()
            .map(|column| self.column_value(id, column))
            .collect()
    }
}

fn identity_key(class: &ClassMetadata, key: &[Value]) -> (String, String) {
    (class.root_entity_name.clone(), format!("{key:?}"))
}

fn unknown_entity(id: EntityId) -> Error {
    Error::invalid_entity_state(format!("entity {} is not known to this unit of work", id.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std_util::prelude::*;
    use strata_core::map;
    use strata_core::mapping::{AssociationKind, ClassDefinition, FieldType, MetadataFactory};

    fn uow() -> UnitOfWork {
        let mut factory = MetadataFactory::new();
        factory
            .register(
                ClassDefinition::entity("File")
                    .id("id", FieldType::Integer)
                    .column("file_id")
                    .field("path", FieldType::String),
            )
            .register(
                ClassDefinition::entity("Picture")
                    .id("id", FieldType::Integer)
                    .association(map! {
                        "type" => AssociationKind::ManyToOne.code(),
                        "fieldName" => "file",
                        "targetEntity" => "File",
                        "cascade" => vec![Value::from("persist")],
                        "joinColumns" => vec![Value::Map(map! {
                            "name" => "file_id",
                            "referencedColumnName" => "file_id",
                        })],
                    })
                    .association(map! {
                        "type" => AssociationKind::ManyToMany.code(),
                        "fieldName" => "tags",
                        "targetEntity" => "Tag",
                    }),
            )
            .register(ClassDefinition::entity("Tag").id("id", FieldType::Integer));
        UnitOfWork::new(Arc::new(factory.schema().unwrap()))
    }

    #[test]
    fn persist_cascades_to_references() {
        let mut uow = uow();
        let picture = uow.create("Picture").unwrap();
        let file = uow.create("File").unwrap();
        let tag = uow.create("Tag").unwrap();

        uow.set_reference(picture, "file", Some(file)).unwrap();
        uow.add_to_collection(picture, "tags", tag).unwrap();
        uow.persist(picture).unwrap();

        assert_eq!(uow.state(picture).unwrap(), EntityState::Managed);
        assert_eq!(uow.state(file).unwrap(), EntityState::Managed);
        assert_eq!(uow.state(tag).unwrap(), EntityState::New);
    }

    #[test]
    fn fields_are_converted() {
        let mut uow = uow();
        let file = uow.create("File").unwrap();

        uow.set(file, "path", 12).unwrap();
        assert_eq!(uow.get(file).unwrap().get("path"), Some(&Value::from("12")));
        assert_eq!(uow.get(file).unwrap().get("id"), Some(&Value::Null));
        assert_none!(uow.get(file).unwrap().get("size"));

        let err = assert_err!(uow.set(file, "size", 1));
        assert!(err.is_invalid_entity_state());
    }

    #[test]
    fn references_are_type_checked() {
        let mut uow = uow();
        let picture = uow.create("Picture").unwrap();
        let tag = uow.create("Tag").unwrap();

        let err = assert_err!(uow.set_reference(picture, "file", Some(tag)));
        assert!(err.is_invalid_entity_state());

        let err = assert_err!(uow.set_reference(picture, "tags", None));
        assert!(err.is_invalid_entity_state());
    }

    #[test]
    fn loading_twice_yields_the_same_entity() {
        let mut uow = uow();
        let file = uow.schema().class("File").unwrap().clone();

        let fields: IndexMap<String, Value> = map! { "id" => 1, "path" => "a.png" };
        let (first, filled) = uow
            .load(&file, &[Value::I64(1)], fields.clone(), &IndexMap::new())
            .unwrap();
        assert!(filled);
        let (second, filled) = uow
            .load(&file, &[Value::I64(1)], map! { "id" => 1, "path" => "b.png" }, &IndexMap::new())
            .unwrap();
        assert!(!filled);

        assert_eq!(first, second);
        assert_eq!(uow.get(first).unwrap().get("path"), Some(&Value::from("a.png")));
        assert_eq!(uow.lookup(&file, &[Value::I64(1)]), Some(first));
    }

    #[test]
    fn foreign_keys_become_references() {
        let mut uow = uow();
        let picture = uow.schema().class("Picture").unwrap().clone();

        let id = uow
            .load(
                &picture,
                &[Value::I64(3)],
                map! { "id" => 3 },
                &map! { "file_id" => 7 },
            )
            .unwrap()
            .0;

        let file = uow.get(id).unwrap().reference("file").unwrap();
        let reference = uow.get(file).unwrap();
        assert!(!reference.is_initialized());
        assert_eq!(reference.state(), EntityState::Managed);
        assert_eq!(reference.get("id"), Some(&Value::I64(7)));
        assert_eq!(uow.column_value(id, "file_id").unwrap(), Value::I64(7));

        let tags = uow.get(id).unwrap().collection("tags").unwrap();
        assert!(!tags.is_initialized());
        assert!(assert_err!(uow.add_to_collection(id, "tags", file)).is_invalid_entity_state());
    }

    #[test]
    fn clear_detaches_everything() {
        let mut uow = uow();
        let file = uow.schema().class("File").unwrap().clone();
        let (id, _) = uow
            .load(&file, &[Value::I64(1)], map! { "id" => 1 }, &IndexMap::new())
            .unwrap();

        uow.clear();

        assert_eq!(uow.state(id).unwrap(), EntityState::Detached);
        assert!(!uow.contains(id));
        assert_none!(uow.lookup(&file, &[Value::I64(1)]));
        assert!(assert_err!(uow.persist(id)).is_invalid_entity_state());
    }
}

use indexmap::IndexMap;
use std::sync::Arc;
use strata_core::mapping::ClassMetadata;
use strata_core::Value;

static NULL: Value = Value::Null;

/// Handle to an entity tracked by a [`UnitOfWork`](super::UnitOfWork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Created but not yet persisted.
    New,

    /// Tracked by the identity map; changes are written on flush.
    Managed,

    /// No longer tracked. Detached entities keep their last known state.
    Detached,

    /// Scheduled for deletion on the next flush.
    Removed,
}

/// The state of one entity instance.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) class: Arc<ClassMetadata>,
    pub(crate) state: EntityState,

    /// False for references created from a foreign key that were never
    /// loaded. Uninitialized entities only know their identifier.
    pub(crate) initialized: bool,

    pub(crate) fields: IndexMap<String, Value>,

    /// To-one associations. A missing key means the association was never
    /// loaded, `None` means it is null.
    pub(crate) references: IndexMap<String, Option<EntityId>>,

    pub(crate) collections: IndexMap<String, Collection>,

    /// What the database holds, for change detection.
    pub(crate) original: Option<Original>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Original {
    pub(crate) fields: IndexMap<String, Value>,
    pub(crate) references: IndexMap<String, Option<EntityId>>,
}

/// A to-many association of one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub(crate) items: Vec<EntityId>,
    pub(crate) initialized: bool,

    /// Elements changed since the last flush.
    pub(crate) dirty: bool,
}

impl Entity {
    pub(crate) fn new(class: Arc<ClassMetadata>, state: EntityState) -> Entity {
        Entity {
            class,
            state,
            initialized: true,
            fields: IndexMap::new(),
            references: IndexMap::new(),
            collections: IndexMap::new(),
            original: None,
        }
    }

    pub fn class(&self) -> &Arc<ClassMetadata> {
        &self.class
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Value of a mapped field. Unset fields read as null.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            Some(value) => Some(value),
            None if self.class.has_field(field) => Some(&NULL),
            None => None,
        }
    }

    /// Target of a to-one association, `None` when null or not loaded.
    pub fn reference(&self, field: &str) -> Option<EntityId> {
        self.references.get(field).copied().flatten()
    }

    pub fn collection(&self, field: &str) -> Option<&Collection> {
        self.collections.get(field)
    }

    pub(crate) fn snapshot(&mut self) {
        self.original = Some(Original {
            fields: self.fields.clone(),
            references: self.references.clone(),
        });
    }
}

impl Collection {
    pub(crate) fn uninitialized() -> Collection {
        Collection::default()
    }

    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.items.contains(&id)
    }

    /// Appends `id` unless present. Returns true when it was added.
    pub(crate) fn push(&mut self, id: EntityId) -> bool {
        if self.items.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }
}

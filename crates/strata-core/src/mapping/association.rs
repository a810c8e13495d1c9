mod kind;
pub use kind::{AssociationKind, FetchMode};

mod property;
pub use property::Property;
use property::PropertySet;

use super::{raw, CacheConfig, Cascade, JoinColumn, JoinTable};
use crate::{Error, MappingArray, Result, Value};

use indexmap::IndexMap;

/// One declared relationship field of an entity class.
///
/// A single record type covers all four cardinalities; [`Property::is_legal_for`]
/// decides which optional attributes an instance may carry, and every write
/// is checked against it. Optional attributes remember whether they were
/// assigned, so reading an attribute distinguishes "never set" (`None`)
/// from "set to null" (`Some(Value::Null)`).
///
/// The cascade list and the `is_cascade_*` flags are two views of the same
/// state: writing either one updates the other.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationMapping {
    kind: AssociationKind,
    field_name: String,
    source_entity: String,
    target_entity: String,

    mapped_by: Option<String>,
    inversed_by: Option<String>,
    cascade: Option<Vec<Cascade>>,
    fetch: Option<FetchMode>,

    /// Nearest parent entity the association was inherited from. Not set for
    /// associations declared on mapped superclasses.
    inherited: Option<String>,

    /// First class in the hierarchy declaring the association.
    declared: Option<String>,

    cache: Option<CacheConfig>,
    id: Option<bool>,
    is_on_delete_cascade: Option<bool>,
    is_owning_side: bool,

    // To-one owning side
    join_columns: Option<Vec<JoinColumn>>,
    join_column_field_names: Option<IndexMap<String, String>>,
    source_to_target_key_columns: Option<IndexMap<String, String>>,
    target_to_source_key_columns: Option<IndexMap<String, String>>,

    // Many-to-many owning side
    join_table: Option<JoinTable>,
    join_table_columns: Option<Vec<String>>,
    relation_to_source_key_columns: Option<IndexMap<String, String>>,
    relation_to_target_key_columns: Option<IndexMap<String, String>>,

    original_class: Option<String>,
    original_field: Option<String>,
    orphan_removal: Option<bool>,
    unique: Option<bool>,

    // To-many
    order_by: Option<IndexMap<String, String>>,
    index_by: Option<String>,

    assigned: PropertySet,
}

impl AssociationMapping {
    pub fn new(
        kind: AssociationKind,
        field_name: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> AssociationMapping {
        AssociationMapping {
            kind,
            field_name: field_name.into(),
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
            mapped_by: None,
            inversed_by: None,
            cascade: None,
            fetch: None,
            inherited: None,
            declared: None,
            cache: None,
            id: None,
            is_on_delete_cascade: None,
            is_owning_side: true,
            join_columns: None,
            join_column_field_names: None,
            source_to_target_key_columns: None,
            target_to_source_key_columns: None,
            join_table: None,
            join_table_columns: None,
            relation_to_source_key_columns: None,
            relation_to_target_key_columns: None,
            original_class: None,
            original_field: None,
            orphan_removal: None,
            unique: None,
            order_by: None,
            index_by: None,
            assigned: PropertySet::default(),
        }
    }

    /// Builds a mapping from a raw key-value map.
    ///
    /// `type`, `fieldName`, `sourceEntity` and `targetEntity` are mandatory.
    /// Every other key must name a property of the concrete variant or the
    /// call fails with an unknown mapping property error. `joinColumns` and
    /// `joinTable` are converted into their typed descriptors; a null
    /// `joinColumns` and a null or empty `joinTable` are treated as absent.
    pub fn from_mapping_array(raw: &MappingArray) -> Result<AssociationMapping> {
        let kind = match raw.get("type") {
            Some(value) => AssociationKind::from_value(value)?,
            None => {
                return Err(Error::invalid_mapping(
                    "missing mandatory key `type` on AssociationMapping",
                ))
            }
        };
        let owner = kind.mapping_name();

        let mut mapping = AssociationMapping::new(
            kind,
            raw::required_str(raw, "fieldName", owner)?,
            raw::required_str(raw, "sourceEntity", owner)?,
            raw::required_str(raw, "targetEntity", owner)?,
        );

        for (key, value) in raw {
            let property = mapping.property(key)?;

            if property.is_mandatory() {
                continue;
            }

            mapping.write(property, value)?;
        }

        Ok(mapping)
    }

    /// Flattens the mapping into a raw key-value map.
    ///
    /// Mandatory keys come first, followed by every assigned property.
    /// Join columns and join tables are flattened recursively.
    /// `from_mapping_array` of the result reproduces an equal mapping.
    pub fn to_flat_map(&self) -> MappingArray {
        Property::ALL
            .iter()
            .filter_map(|&property| {
                self.read(property)
                    .map(|value| (property.name().to_string(), value))
            })
            .collect()
    }

    /// Reads a property by its raw mapping key.
    ///
    /// Returns `None` when the property was never assigned and
    /// `Some(Value::Null)` when it was explicitly set to null.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        let property = self.property(name)?;
        Ok(self.read(property))
    }

    /// Returns true when the property has been assigned, including an
    /// explicit null. Unknown names are never contained.
    pub fn contains(&self, name: &str) -> bool {
        Property::from_name(name)
            .is_some_and(|property| {
                property.is_legal_for(self.kind) && self.assigned.contains(property)
            })
    }

    /// Writes a property by its raw mapping key, applying the same
    /// conversions as `from_mapping_array`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let property = self.property(name)?;
        self.write(property, &value.into())
    }

    /// Returns a property to the never-assigned state.
    pub fn unset(&mut self, name: &str) -> Result<()> {
        let property = self.property(name)?;

        if property.is_always_set() {
            return Err(Error::invalid_mapping(format!(
                "`{}` cannot be unset on {}",
                property.name(),
                self.kind.mapping_name()
            )));
        }

        match property {
            Property::MappedBy => self.mapped_by = None,
            Property::InversedBy => self.inversed_by = None,
            Property::Cascade => self.cascade = None,
            Property::Fetch => self.fetch = None,
            Property::Inherited => self.inherited = None,
            Property::Declared => self.declared = None,
            Property::Cache => self.cache = None,
            Property::Id => self.id = None,
            Property::IsOnDeleteCascade => self.is_on_delete_cascade = None,
            Property::JoinColumns => self.join_columns = None,
            Property::JoinColumnFieldNames => self.join_column_field_names = None,
            Property::SourceToTargetKeyColumns => self.source_to_target_key_columns = None,
            Property::TargetToSourceKeyColumns => self.target_to_source_key_columns = None,
            Property::JoinTable => self.join_table = None,
            Property::JoinTableColumns => self.join_table_columns = None,
            Property::RelationToSourceKeyColumns => self.relation_to_source_key_columns = None,
            Property::RelationToTargetKeyColumns => self.relation_to_target_key_columns = None,
            Property::OriginalClass => self.original_class = None,
            Property::OriginalField => self.original_field = None,
            Property::OrphanRemoval => self.orphan_removal = None,
            Property::Unique => self.unique = None,
            Property::OrderBy => self.order_by = None,
            Property::IndexBy => self.index_by = None,
            _ => unreachable!("always-set property {property:?}"),
        }

        self.assigned.remove(property);
        Ok(())
    }

    fn property(&self, name: &str) -> Result<Property> {
        match Property::from_name(name) {
            Some(property) => {
                self.check_legal(property)?;
                Ok(property)
            }
            None => Err(Error::unknown_mapping_property(
                name,
                self.kind.mapping_name(),
            )),
        }
    }

    fn check_legal(&self, property: Property) -> Result<()> {
        if property.is_legal_for(self.kind) {
            Ok(())
        } else if property == Property::JoinTable {
            Err(Error::invalid_mapping(format!(
                "association `{}` on {} is {}; a join table is only legal on many-to-many associations",
                self.field_name,
                self.source_entity,
                self.kind.mapping_name()
            )))
        } else {
            Err(Error::unknown_mapping_property(
                property.name(),
                self.kind.mapping_name(),
            ))
        }
    }

    fn write(&mut self, property: Property, value: &Value) -> Result<()> {
        use Property as P;

        let owner = self.kind.mapping_name();
        let key = property.name();

        match property {
            P::Type => {
                if AssociationKind::from_value(value)? != self.kind {
                    return Err(Error::invalid_mapping(format!(
                        "the type of association `{}` cannot be changed",
                        self.field_name
                    )));
                }
            }
            P::FieldName => self.field_name = raw::string(value, key, owner)?,
            P::SourceEntity => self.source_entity = raw::string(value, key, owner)?,
            P::TargetEntity => self.target_entity = raw::string(value, key, owner)?,
            P::MappedBy => self.mapped_by = raw::opt_string(value, key, owner)?,
            P::InversedBy => self.inversed_by = raw::opt_string(value, key, owner)?,
            P::Cascade => self.cascade = nullable(value, |v| Cascade::list_from_value(v, owner))?,
            P::Fetch => self.fetch = nullable(value, FetchMode::from_value)?,
            P::Inherited => self.inherited = raw::opt_string(value, key, owner)?,
            P::Declared => self.declared = raw::opt_string(value, key, owner)?,
            P::Cache => self.cache = nullable(value, |v| CacheConfig::from_value(v, owner))?,
            P::Id => self.id = raw::opt_bool(value, key, owner)?,
            P::IsCascadeRemove => {
                self.set_cascade_flag(Cascade::Remove, raw::boolean(value, key, owner)?)
            }
            P::IsCascadePersist => {
                self.set_cascade_flag(Cascade::Persist, raw::boolean(value, key, owner)?)
            }
            P::IsCascadeRefresh => {
                self.set_cascade_flag(Cascade::Refresh, raw::boolean(value, key, owner)?)
            }
            P::IsCascadeMerge => {
                self.set_cascade_flag(Cascade::Merge, raw::boolean(value, key, owner)?)
            }
            P::IsCascadeDetach => {
                self.set_cascade_flag(Cascade::Detach, raw::boolean(value, key, owner)?)
            }
            P::IsOnDeleteCascade => self.is_on_delete_cascade = raw::opt_bool(value, key, owner)?,
            P::IsOwningSide => self.is_owning_side = raw::boolean(value, key, owner)?,
            P::JoinColumns => {
                if value.is_null() {
                    self.join_columns = None;
                    self.assigned.remove(property);
                    return Ok(());
                }
                self.join_columns = Some(JoinColumn::list_from_value(value, key, owner)?);
            }
            P::JoinColumnFieldNames => {
                self.join_column_field_names = nullable(value, |v| raw::string_map(v, key, owner))?
            }
            P::SourceToTargetKeyColumns => {
                self.source_to_target_key_columns =
                    nullable(value, |v| raw::string_map(v, key, owner))?
            }
            P::TargetToSourceKeyColumns => {
                self.target_to_source_key_columns =
                    nullable(value, |v| raw::string_map(v, key, owner))?
            }
            P::JoinTable => {
                if value.is_null() || value.is_empty_collection() {
                    self.join_table = None;
                    self.assigned.remove(property);
                    return Ok(());
                }
                self.join_table = Some(JoinTable::from_mapping_array(raw::map(
                    value, key, owner,
                )?)?);
            }
            P::JoinTableColumns => {
                self.join_table_columns = nullable(value, |v| raw::string_list(v, key, owner))?
            }
            P::RelationToSourceKeyColumns => {
                self.relation_to_source_key_columns =
                    nullable(value, |v| raw::string_map(v, key, owner))?
            }
            P::RelationToTargetKeyColumns => {
                self.relation_to_target_key_columns =
                    nullable(value, |v| raw::string_map(v, key, owner))?
            }
            P::OriginalClass => self.original_class = raw::opt_string(value, key, owner)?,
            P::OriginalField => self.original_field = raw::opt_string(value, key, owner)?,
            P::OrphanRemoval => self.orphan_removal = raw::opt_bool(value, key, owner)?,
            P::Unique => self.unique = raw::opt_bool(value, key, owner)?,
            P::OrderBy => self.order_by = nullable(value, |v| order_by(v, owner))?,
            P::IndexBy => self.index_by = raw::opt_string(value, key, owner)?,
        }

        self.assigned.insert(property);
        Ok(())
    }

    fn read(&self, property: Property) -> Option<Value> {
        use Property as P;

        if !self.assigned.contains(property) {
            return None;
        }

        Some(match property {
            P::Type => Value::I64(self.kind.code()),
            P::FieldName => Value::from(&self.field_name),
            P::SourceEntity => Value::from(&self.source_entity),
            P::TargetEntity => Value::from(&self.target_entity),
            P::MappedBy => Value::from(self.mapped_by.as_ref()),
            P::InversedBy => Value::from(self.inversed_by.as_ref()),
            P::Cascade => self
                .cascade
                .as_deref()
                .map(Cascade::list_to_value)
                .unwrap_or_default(),
            P::Fetch => Value::from(self.fetch.map(|fetch| fetch as i64)),
            P::Inherited => Value::from(self.inherited.as_ref()),
            P::Declared => Value::from(self.declared.as_ref()),
            P::Cache => self
                .cache
                .as_ref()
                .map(|cache| Value::Map(cache.to_mapping_array()))
                .unwrap_or_default(),
            P::Id => Value::from(self.id),
            P::IsCascadeRemove => Value::from(self.is_cascade_remove()),
            P::IsCascadePersist => Value::from(self.is_cascade_persist()),
            P::IsCascadeRefresh => Value::from(self.is_cascade_refresh()),
            P::IsCascadeMerge => Value::from(self.is_cascade_merge()),
            P::IsCascadeDetach => Value::from(self.is_cascade_detach()),
            P::IsOnDeleteCascade => Value::from(self.is_on_delete_cascade),
            P::IsOwningSide => Value::from(self.is_owning_side),
            P::JoinColumns => self
                .join_columns
                .as_deref()
                .map(JoinColumn::list_to_value)
                .unwrap_or_default(),
            P::JoinColumnFieldNames => string_map_or_null(&self.join_column_field_names),
            P::SourceToTargetKeyColumns => string_map_or_null(&self.source_to_target_key_columns),
            P::TargetToSourceKeyColumns => string_map_or_null(&self.target_to_source_key_columns),
            P::JoinTable => self
                .join_table
                .as_ref()
                .map(JoinTable::to_value)
                .unwrap_or_default(),
            P::JoinTableColumns => self
                .join_table_columns
                .as_deref()
                .map(raw::string_list_value)
                .unwrap_or_default(),
            P::RelationToSourceKeyColumns => {
                string_map_or_null(&self.relation_to_source_key_columns)
            }
            P::RelationToTargetKeyColumns => {
                string_map_or_null(&self.relation_to_target_key_columns)
            }
            P::OriginalClass => Value::from(self.original_class.as_ref()),
            P::OriginalField => Value::from(self.original_field.as_ref()),
            P::OrphanRemoval => Value::from(self.orphan_removal),
            P::Unique => Value::from(self.unique),
            P::OrderBy => string_map_or_null(&self.order_by),
            P::IndexBy => Value::from(self.index_by.as_ref()),
        })
    }
}

// Typed accessors
impl AssociationMapping {
    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn source_entity(&self) -> &str {
        &self.source_entity
    }

    pub fn target_entity(&self) -> &str {
        &self.target_entity
    }

    pub fn is_to_one(&self) -> bool {
        self.kind.is_to_one()
    }

    pub fn is_to_many(&self) -> bool {
        self.kind.is_to_many()
    }

    pub fn mapped_by(&self) -> Option<&str> {
        self.mapped_by.as_deref()
    }

    pub fn inversed_by(&self) -> Option<&str> {
        self.inversed_by.as_deref()
    }

    pub fn is_owning_side(&self) -> bool {
        self.is_owning_side
    }

    /// Configured cascade operations as declared, `all` included.
    pub fn cascade(&self) -> &[Cascade] {
        self.cascade.as_deref().unwrap_or(&[])
    }

    pub fn is_cascade(&self, op: Cascade) -> bool {
        self.cascade
            .as_ref()
            .is_some_and(|list| list.contains(&op) || list.contains(&Cascade::All))
    }

    pub fn is_cascade_persist(&self) -> bool {
        self.is_cascade(Cascade::Persist)
    }

    pub fn is_cascade_remove(&self) -> bool {
        self.is_cascade(Cascade::Remove)
    }

    pub fn is_cascade_detach(&self) -> bool {
        self.is_cascade(Cascade::Detach)
    }

    pub fn is_cascade_merge(&self) -> bool {
        self.is_cascade(Cascade::Merge)
    }

    pub fn is_cascade_refresh(&self) -> bool {
        self.is_cascade(Cascade::Refresh)
    }

    pub fn fetch(&self) -> FetchMode {
        self.fetch.unwrap_or_default()
    }

    pub fn is_eager(&self) -> bool {
        self.fetch() == FetchMode::Eager
    }

    pub fn inherited(&self) -> Option<&str> {
        self.inherited.as_deref()
    }

    pub fn declared(&self) -> Option<&str> {
        self.declared.as_deref()
    }

    pub fn cache(&self) -> Option<&CacheConfig> {
        self.cache.as_ref()
    }

    /// True when the association is (part of) the identifier of its class.
    pub fn is_id(&self) -> bool {
        self.id.unwrap_or(false)
    }

    pub fn is_on_delete_cascade(&self) -> bool {
        self.is_on_delete_cascade.unwrap_or(false)
    }

    pub fn join_columns(&self) -> &[JoinColumn] {
        self.join_columns.as_deref().unwrap_or(&[])
    }

    pub fn join_column_field_names(&self) -> Option<&IndexMap<String, String>> {
        self.join_column_field_names.as_ref()
    }

    /// Join column name to referenced column name.
    pub fn source_to_target_key_columns(&self) -> Option<&IndexMap<String, String>> {
        self.source_to_target_key_columns.as_ref()
    }

    /// Referenced column name to join column name.
    pub fn target_to_source_key_columns(&self) -> Option<&IndexMap<String, String>> {
        self.target_to_source_key_columns.as_ref()
    }

    pub fn join_table(&self) -> Option<&JoinTable> {
        self.join_table.as_ref()
    }

    pub fn join_table_columns(&self) -> &[String] {
        self.join_table_columns.as_deref().unwrap_or(&[])
    }

    /// Bridge column name to owning-side column name.
    pub fn relation_to_source_key_columns(&self) -> Option<&IndexMap<String, String>> {
        self.relation_to_source_key_columns.as_ref()
    }

    /// Bridge column name to target-side column name.
    pub fn relation_to_target_key_columns(&self) -> Option<&IndexMap<String, String>> {
        self.relation_to_target_key_columns.as_ref()
    }

    pub fn original_class(&self) -> Option<&str> {
        self.original_class.as_deref()
    }

    pub fn original_field(&self) -> Option<&str> {
        self.original_field.as_deref()
    }

    pub fn orphan_removal(&self) -> bool {
        self.orphan_removal.unwrap_or(false)
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    /// Field name to `ASC` or `DESC`.
    pub fn order_by(&self) -> Option<&IndexMap<String, String>> {
        self.order_by.as_ref()
    }

    pub fn index_by(&self) -> Option<&str> {
        self.index_by.as_deref()
    }
}

// Typed setters
impl AssociationMapping {
    pub fn set_mapped_by(&mut self, mapped_by: Option<String>) {
        self.mapped_by = mapped_by;
        self.assigned.insert(Property::MappedBy);
    }

    pub fn set_inversed_by(&mut self, inversed_by: Option<String>) {
        self.inversed_by = inversed_by;
        self.assigned.insert(Property::InversedBy);
    }

    pub fn set_owning_side(&mut self, owning: bool) {
        self.is_owning_side = owning;
    }

    pub fn set_cascade(&mut self, ops: Vec<Cascade>) {
        self.cascade = Some(ops);
        self.assigned.insert(Property::Cascade);
    }

    /// Enables or disables one cascade operation, keeping the raw list in
    /// sync. Disabling an operation covered by `all` expands `all` into the
    /// remaining operations.
    pub fn set_cascade_flag(&mut self, op: Cascade, enabled: bool) {
        if op == Cascade::All {
            for op in Cascade::OPERATIONS {
                self.set_cascade_flag(op, enabled);
            }
            return;
        }

        if self.is_cascade(op) == enabled {
            return;
        }

        let list = self.cascade.get_or_insert_with(Vec::new);

        if enabled {
            list.push(op);
        } else if list.contains(&Cascade::All) {
            *list = Cascade::OPERATIONS
                .into_iter()
                .filter(|other| *other != op)
                .collect();
        } else {
            list.retain(|other| *other != op);
        }

        self.assigned.insert(Property::Cascade);
    }

    pub fn set_fetch(&mut self, fetch: FetchMode) {
        self.fetch = Some(fetch);
        self.assigned.insert(Property::Fetch);
    }

    pub fn set_id(&mut self, id: bool) {
        self.id = Some(id);
        self.assigned.insert(Property::Id);
    }

    pub fn set_unique(&mut self, unique: bool) {
        self.unique = Some(unique);
        self.assigned.insert(Property::Unique);
    }

    pub fn set_on_delete_cascade(&mut self, on_delete_cascade: bool) {
        self.is_on_delete_cascade = Some(on_delete_cascade);
        self.assigned.insert(Property::IsOnDeleteCascade);
    }

    pub fn set_orphan_removal(&mut self, orphan_removal: bool) -> Result<()> {
        self.check_legal(Property::OrphanRemoval)?;
        self.orphan_removal = Some(orphan_removal);
        self.assigned.insert(Property::OrphanRemoval);
        Ok(())
    }

    pub fn set_cache(&mut self, cache: Option<CacheConfig>) {
        self.cache = cache;
        self.assigned.insert(Property::Cache);
    }

    pub fn set_join_columns(&mut self, columns: Vec<JoinColumn>) -> Result<()> {
        self.check_legal(Property::JoinColumns)?;
        self.join_columns = Some(columns);
        self.assigned.insert(Property::JoinColumns);
        Ok(())
    }

    pub fn set_join_column_field_names(&mut self, names: IndexMap<String, String>) -> Result<()> {
        self.check_legal(Property::JoinColumnFieldNames)?;
        self.join_column_field_names = Some(names);
        self.assigned.insert(Property::JoinColumnFieldNames);
        Ok(())
    }

    pub fn set_key_columns(
        &mut self,
        source_to_target: IndexMap<String, String>,
        target_to_source: IndexMap<String, String>,
    ) -> Result<()> {
        self.check_legal(Property::SourceToTargetKeyColumns)?;
        self.source_to_target_key_columns = Some(source_to_target);
        self.target_to_source_key_columns = Some(target_to_source);
        self.assigned.insert(Property::SourceToTargetKeyColumns);
        self.assigned.insert(Property::TargetToSourceKeyColumns);
        Ok(())
    }

    pub fn set_join_table(&mut self, join_table: JoinTable) -> Result<()> {
        self.check_legal(Property::JoinTable)?;
        self.join_table = Some(join_table);
        self.assigned.insert(Property::JoinTable);
        Ok(())
    }

    pub fn set_relation_key_columns(
        &mut self,
        columns: Vec<String>,
        to_source: IndexMap<String, String>,
        to_target: IndexMap<String, String>,
    ) -> Result<()> {
        self.check_legal(Property::JoinTableColumns)?;
        self.join_table_columns = Some(columns);
        self.relation_to_source_key_columns = Some(to_source);
        self.relation_to_target_key_columns = Some(to_target);
        self.assigned.insert(Property::JoinTableColumns);
        self.assigned.insert(Property::RelationToSourceKeyColumns);
        self.assigned.insert(Property::RelationToTargetKeyColumns);
        Ok(())
    }

    pub fn set_order_by(&mut self, order_by: IndexMap<String, String>) -> Result<()> {
        self.check_legal(Property::OrderBy)?;
        self.order_by = Some(order_by);
        self.assigned.insert(Property::OrderBy);
        Ok(())
    }

    pub fn set_index_by(&mut self, index_by: impl Into<String>) -> Result<()> {
        self.check_legal(Property::IndexBy)?;
        self.index_by = Some(index_by.into());
        self.assigned.insert(Property::IndexBy);
        Ok(())
    }

    /// Stamps inheritance provenance. Only the metadata factory does this.
    pub(crate) fn set_provenance(&mut self, inherited: Option<String>, declared: Option<String>) {
        if let Some(inherited) = inherited {
            self.inherited = Some(inherited);
            self.assigned.insert(Property::Inherited);
        }
        if let Some(declared) = declared {
            self.declared = Some(declared);
            self.assigned.insert(Property::Declared);
        }
    }

    pub(crate) fn set_source_entity(&mut self, source_entity: impl Into<String>) {
        self.source_entity = source_entity.into();
    }

    pub(crate) fn set_target_entity(&mut self, target_entity: impl Into<String>) {
        self.target_entity = target_entity.into();
    }

    pub(crate) fn set_original(&mut self, class: impl Into<String>, field: impl Into<String>) {
        self.original_class = Some(class.into());
        self.original_field = Some(field.into());
        self.assigned.insert(Property::OriginalClass);
        self.assigned.insert(Property::OriginalField);
    }
}

fn nullable<T>(value: &Value, f: impl FnOnce(&Value) -> Result<T>) -> Result<Option<T>> {
    match value {
        Value::Null => Ok(None),
        _ => f(value).map(Some),
    }
}

fn string_map_or_null(map: &Option<IndexMap<String, String>>) -> Value {
    map.as_ref().map(raw::string_map_value).unwrap_or_default()
}

fn order_by(value: &Value, owner: &str) -> Result<IndexMap<String, String>> {
    let order_by = raw::string_map(value, "orderBy", owner)?;

    for (field, direction) in &order_by {
        if !direction.eq_ignore_ascii_case("ASC") && !direction.eq_ignore_ascii_case("DESC") {
            return Err(Error::invalid_mapping(format!(
                "invalid order direction `{direction}` for `{field}` on {owner}"
            )));
        }
    }

    Ok(order_by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn many_to_one() -> MappingArray {
        map! {
            "type" => 2,
            "fieldName" => "file",
            "sourceEntity" => "Picture",
            "targetEntity" => "File",
        }
    }

    #[test]
    fn unset_and_null_are_distinct() {
        let mut mapping = AssociationMapping::from_mapping_array(&many_to_one()).unwrap();

        assert_eq!(mapping.get("inversedBy").unwrap(), None);
        assert!(!mapping.contains("inversedBy"));

        mapping.set("inversedBy", Value::Null).unwrap();
        assert_eq!(mapping.get("inversedBy").unwrap(), Some(Value::Null));
        assert!(mapping.contains("inversedBy"));

        mapping.unset("inversedBy").unwrap();
        assert_eq!(mapping.get("inversedBy").unwrap(), None);
        assert!(!mapping.contains("inversedBy"));
    }

    #[test]
    fn cascade_list_and_flags_stay_in_sync() {
        let mut mapping = AssociationMapping::from_mapping_array(&many_to_one()).unwrap();
        assert!(!mapping.is_cascade_persist());

        mapping
            .set("cascade", vec![Value::from("persist"), Value::from("remove")])
            .unwrap();
        assert!(mapping.is_cascade_persist());
        assert!(mapping.is_cascade_remove());
        assert_eq!(mapping.get("isCascadeRemove").unwrap(), Some(Value::Bool(true)));

        mapping.set("isCascadeRemove", false).unwrap();
        assert_eq!(mapping.cascade(), [Cascade::Persist]);

        mapping.set("isCascadeRefresh", true).unwrap();
        assert_eq!(mapping.cascade(), [Cascade::Persist, Cascade::Refresh]);
    }

    #[test]
    fn disabling_one_operation_expands_all() {
        let mut mapping =
            AssociationMapping::new(AssociationKind::OneToMany, "children", "Node", "Node");
        mapping.set_cascade(vec![Cascade::All]);
        assert!(mapping.is_cascade_detach());

        mapping.set_cascade_flag(Cascade::Detach, false);
        assert!(!mapping.is_cascade_detach());
        assert!(mapping.is_cascade_merge());
        assert_eq!(mapping.cascade().len(), 4);
    }

    #[test]
    fn writing_join_columns_normalizes_raw_arrays() {
        let mut mapping = AssociationMapping::from_mapping_array(&many_to_one()).unwrap();
        mapping
            .set(
                "joinColumns",
                vec![Value::Map(map! {
                    "name" => "file_id",
                    "referencedColumnName" => "file_id",
                })],
            )
            .unwrap();

        assert_eq!(mapping.join_columns(), [JoinColumn::new("file_id", "file_id")]);
    }

    #[test]
    fn type_cannot_change() {
        let mut mapping = AssociationMapping::from_mapping_array(&many_to_one()).unwrap();
        assert!(mapping.set("type", 8).unwrap_err().is_invalid_mapping());
        assert!(mapping.set("type", 2).is_ok());
        assert!(mapping.unset("fieldName").unwrap_err().is_invalid_mapping());
    }

    #[test]
    fn illegal_property_for_kind() {
        let mut mapping = AssociationMapping::from_mapping_array(&many_to_one()).unwrap();

        let err = mapping.set("orderBy", map! { "name" => "ASC" }).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown mapping property `orderBy` on ManyToOneAssociationMapping"
        );
        assert!(!mapping.contains("orderBy"));
        assert!(mapping.get("orderBy").is_err());
    }

    #[test]
    fn order_by_direction_is_validated() {
        let mut mapping =
            AssociationMapping::new(AssociationKind::OneToMany, "children", "Node", "Node");
        assert!(mapping.set("orderBy", map! { "name" => "UP" }).is_err());
        mapping.set("orderBy", map! { "name" => "desc" }).unwrap();
        assert_eq!(mapping.order_by().unwrap()["name"], "desc");
    }
}

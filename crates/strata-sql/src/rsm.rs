use indexmap::IndexMap;
use strata_core::mapping::FieldType;

/// Describes how the columns of an SQL result map back onto entities and
/// scalar values.
///
/// Built by the SQL walker for every compiled query. Native queries and
/// tests construct one by hand with the `add_*` methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSetMapping {
    /// Every entity alias, root or joined, to its class name.
    pub alias_map: IndexMap<String, String>,

    /// Top-level entity results and the key they are reported under in
    /// mixed results. `None` means the position of the entity result.
    pub entity_mappings: IndexMap<String, Option<String>>,

    /// Joined entity alias to the alias it hangs off.
    pub parent_alias_map: IndexMap<String, String>,

    /// Joined entity alias to the association field on its parent.
    pub relation_map: IndexMap<String, String>,

    /// Result column to entity field.
    pub field_mappings: IndexMap<String, FieldResult>,

    /// Result column to scalar result.
    pub scalar_mappings: IndexMap<String, ScalarResult>,

    /// Result column to a raw column of an entity (foreign keys and
    /// discriminators).
    pub meta_mappings: IndexMap<String, MetaResult>,

    /// Entity alias to the result column holding its discriminator.
    pub discriminator_columns: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldResult {
    pub alias: String,
    pub field: String,

    /// Class declaring the field when it belongs to a subclass of the
    /// alias's class.
    pub declaring_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarResult {
    pub name: String,
    pub ty: Option<FieldType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaResult {
    pub alias: String,
    pub column: String,
    pub is_identifier: bool,
    pub ty: Option<FieldType>,
}

/// The value a column of a result row stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind<'a> {
    Field(&'a FieldResult),
    Scalar(&'a ScalarResult),
    Meta(&'a MetaResult),
}

impl ResultSetMapping {
    pub fn new() -> ResultSetMapping {
        ResultSetMapping::default()
    }

    pub fn add_entity_result(
        &mut self,
        class: impl Into<String>,
        alias: impl Into<String>,
        result_alias: Option<String>,
    ) -> &mut Self {
        let alias = alias.into();
        self.alias_map.insert(alias.clone(), class.into());
        self.entity_mappings.insert(alias, result_alias);
        self
    }

    pub fn add_joined_entity_result(
        &mut self,
        class: impl Into<String>,
        alias: impl Into<String>,
        parent_alias: impl Into<String>,
        relation: impl Into<String>,
    ) -> &mut Self {
        let alias = alias.into();
        self.alias_map.insert(alias.clone(), class.into());
        self.parent_alias_map
            .insert(alias.clone(), parent_alias.into());
        self.relation_map.insert(alias, relation.into());
        self
    }

    pub fn add_field_result(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
        field: impl Into<String>,
        declaring_class: Option<String>,
    ) -> &mut Self {
        self.field_mappings.insert(
            column.into(),
            FieldResult {
                alias: alias.into(),
                field: field.into(),
                declaring_class,
            },
        );
        self
    }

    pub fn add_scalar_result(
        &mut self,
        column: impl Into<String>,
        name: impl Into<String>,
        ty: Option<FieldType>,
    ) -> &mut Self {
        self.scalar_mappings.insert(
            column.into(),
            ScalarResult {
                name: name.into(),
                ty,
            },
        );
        self
    }

    pub fn add_meta_result(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
        column_name: impl Into<String>,
        is_identifier: bool,
        ty: Option<FieldType>,
    ) -> &mut Self {
        self.meta_mappings.insert(
            column.into(),
            MetaResult {
                alias: alias.into(),
                column: column_name.into(),
                is_identifier,
                ty,
            },
        );
        self
    }

    pub fn set_discriminator_column(
        &mut self,
        alias: impl Into<String>,
        column: impl Into<String>,
    ) -> &mut Self {
        self.discriminator_columns
            .insert(alias.into(), column.into());
        self
    }

    /// Classifies a result column. Columns the mapping does not know are
    /// not part of the result and yield `None`.
    pub fn column(&self, column: &str) -> Option<ColumnKind<'_>> {
        if let Some(field) = self.field_mappings.get(column) {
            Some(ColumnKind::Field(field))
        } else if let Some(scalar) = self.scalar_mappings.get(column) {
            Some(ColumnKind::Scalar(scalar))
        } else {
            self.meta_mappings.get(column).map(ColumnKind::Meta)
        }
    }

    pub fn is_entity_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias)
    }

    pub fn is_joined(&self, alias: &str) -> bool {
        self.parent_alias_map.contains_key(alias)
    }

    /// True when the result combines entities with scalar values.
    pub fn is_mixed(&self) -> bool {
        !self.scalar_mappings.is_empty()
    }

    pub fn has_entities(&self) -> bool {
        !self.alias_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_columns() {
        let mut rsm = ResultSetMapping::new();
        rsm.add_entity_result("CmsUser", "u", None)
            .add_field_result("u", "u__id", "id", None)
            .add_meta_result("u", "u__address_id", "address_id", false, None)
            .add_scalar_result("sclr_0", "score", Some(FieldType::Integer));

        assert!(matches!(
            rsm.column("u__id"),
            Some(ColumnKind::Field(FieldResult { field, .. })) if field == "id"
        ));
        assert!(matches!(rsm.column("sclr_0"), Some(ColumnKind::Scalar(_))));
        assert!(matches!(rsm.column("u__address_id"), Some(ColumnKind::Meta(_))));
        assert_eq!(rsm.column("hidden"), None);
        assert!(rsm.is_mixed());
    }

    #[test]
    fn joined_results() {
        let mut rsm = ResultSetMapping::new();
        rsm.add_entity_result("Cart", "ca", None)
            .add_joined_entity_result("Customer", "c", "ca", "customer");

        assert!(rsm.is_entity_alias("c"));
        assert!(rsm.is_joined("c"));
        assert!(!rsm.is_joined("ca"));
        assert_eq!(rsm.relation_map["c"], "customer");
        assert_eq!(rsm.entity_mappings.len(), 1);
        assert!(!rsm.is_mixed());
    }
}

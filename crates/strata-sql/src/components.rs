use crate::ast::JoinKind;

use indexmap::IndexMap;
use std::sync::Arc;
use strata_core::mapping::{AssociationMapping, ClassMetadata};

/// What an identification variable of a query stands for.
#[derive(Debug, Clone)]
pub struct QueryComponent {
    pub class: Arc<ClassMetadata>,

    /// Alias this component was joined from. `None` for `FROM` roots.
    pub parent: Option<String>,

    /// Association field on the parent class.
    pub relation: Option<String>,

    /// Number of joins between this component and its root.
    pub nesting_level: usize,

    pub join_kind: Option<JoinKind>,
}

/// The identification variables and result variables of one query, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct QueryComponents {
    components: IndexMap<String, QueryComponent>,

    /// Names given to select expressions with `AS`.
    result_variables: Vec<String>,
}

impl QueryComponent {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl QueryComponents {
    pub fn get(&self, alias: &str) -> Option<&QueryComponent> {
        self.components.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.components.contains_key(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryComponent)> {
        self.components
            .iter()
            .map(|(alias, component)| (alias.as_str(), component))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_result_variable(&self, name: &str) -> bool {
        self.result_variables.iter().any(|var| var == name)
    }

    pub fn result_variables(&self) -> &[String] {
        &self.result_variables
    }

    /// The association `alias` was joined through.
    pub fn relation(&self, alias: &str) -> Option<&AssociationMapping> {
        let component = self.components.get(alias)?;
        let parent = self.components.get(component.parent.as_deref()?)?;
        parent.class.association(component.relation.as_deref()?)
    }

    /// Aliases from `alias` up to its root, nearest first, excluding
    /// `alias` itself.
    pub fn ancestors<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut next = self.components.get(alias).and_then(|c| c.parent.as_deref());
        std::iter::from_fn(move || {
            let current = next?;
            next = self.components.get(current).and_then(|c| c.parent.as_deref());
            Some(current)
        })
    }

    pub(crate) fn insert(&mut self, alias: String, component: QueryComponent) {
        self.components.insert(alias, component);
    }

    pub(crate) fn add_result_variable(&mut self, name: String) {
        self.result_variables.push(name);
    }
}

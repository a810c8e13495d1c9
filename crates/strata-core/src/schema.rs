use crate::mapping::{AssociationMapping, ClassMetadata};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// The complete, validated set of class metadata a database handle works
/// with.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    classes: IndexMap<String, Arc<ClassMetadata>>,
}

impl Schema {
    pub fn new(classes: impl IntoIterator<Item = Arc<ClassMetadata>>) -> Schema {
        Schema {
            classes: classes
                .into_iter()
                .map(|class| (class.name.clone(), class))
                .collect(),
        }
    }

    /// Looks a class up by its full name, or by its short name when that is
    /// unambiguous.
    pub fn get(&self, name: &str) -> Option<&Arc<ClassMetadata>> {
        if let Some(class) = self.classes.get(name) {
            return Some(class);
        }

        let mut matches = self
            .classes
            .values()
            .filter(|class| class.short_name() == name);
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn class(&self, name: &str) -> Result<&Arc<ClassMetadata>> {
        self.get(name).ok_or_else(|| {
            Error::invalid_mapping(format!("class `{name}` is not a registered entity class"))
        })
    }

    /// Metadata of the class an association points to.
    pub fn target_of(&self, assoc: &AssociationMapping) -> Result<&Arc<ClassMetadata>> {
        self.class(assoc.target_entity())
    }

    /// Metadata of the inheritance root of `class`.
    pub fn root_of(&self, class: &ClassMetadata) -> Result<&Arc<ClassMetadata>> {
        self.class(&class.root_entity_name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassMetadata>> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

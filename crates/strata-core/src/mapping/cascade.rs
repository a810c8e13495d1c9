use crate::{Error, Result, Value};

/// A persistence operation that can cascade along an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cascade {
    Persist,
    Remove,
    Detach,
    Merge,
    Refresh,
    /// Shorthand for every other operation.
    All,
}

impl Cascade {
    /// Individual operations, excluding `All`.
    pub const OPERATIONS: [Cascade; 5] = [
        Cascade::Persist,
        Cascade::Remove,
        Cascade::Detach,
        Cascade::Merge,
        Cascade::Refresh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Cascade::Persist => "persist",
            Cascade::Remove => "remove",
            Cascade::Detach => "detach",
            Cascade::Merge => "merge",
            Cascade::Refresh => "refresh",
            Cascade::All => "all",
        }
    }

    pub fn from_name(name: &str) -> Option<Cascade> {
        Some(match name {
            "persist" => Cascade::Persist,
            "remove" => Cascade::Remove,
            "detach" => Cascade::Detach,
            "merge" => Cascade::Merge,
            "refresh" => Cascade::Refresh,
            "all" => Cascade::All,
            _ => return None,
        })
    }

    pub(crate) fn list_from_value(value: &Value, owner: &str) -> Result<Vec<Cascade>> {
        super::raw::string_list(value, "cascade", owner)?
            .iter()
            .map(|name| {
                Cascade::from_name(name).ok_or_else(|| {
                    Error::invalid_mapping(format!(
                        "unknown cascade operation `{name}` on {owner}"
                    ))
                })
            })
            .collect()
    }

    pub(crate) fn list_to_value(list: &[Cascade]) -> Value {
        Value::List(list.iter().map(|op| Value::from(op.name())).collect())
    }
}

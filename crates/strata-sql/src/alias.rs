use std::collections::HashMap;

/// Assigns SQL table aliases for one compilation.
///
/// The alias is the lower-cased first letter of the table name (or `t` when
/// the name does not start with an ASCII letter) followed by a counter and
/// an underscore. Lookups are memoized on the table name plus the DQL
/// alias, so the same table joined under two identification variables gets
/// two aliases while repeated lookups agree.
#[derive(Debug, Default)]
pub struct TableAliases {
    aliases: HashMap<String, String>,
    counter: usize,
}

impl TableAliases {
    pub fn new() -> TableAliases {
        TableAliases::default()
    }

    pub fn get(&mut self, table: &str, dql_alias: Option<&str>) -> String {
        let key = match dql_alias {
            Some(dql_alias) => format!("{table}@[{dql_alias}]"),
            None => table.to_string(),
        };

        if let Some(alias) = self.aliases.get(&key) {
            return alias.clone();
        }

        let prefix = match table.chars().next() {
            Some(ch) if ch.is_ascii_alphabetic() => ch.to_ascii_lowercase(),
            _ => 't',
        };

        let alias = format!("{prefix}{}_", self.counter);
        self.counter += 1;

        self.aliases.insert(key, alias.clone());
        alias
    }
}

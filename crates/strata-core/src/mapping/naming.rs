use super::class::short_name;

use heck::ToSnakeCase;

/// Derives table and column names that the mapping does not spell out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    /// Class and field names are used as they are.
    #[default]
    Default,

    /// Class and field names are converted to `snake_case`.
    Underscore,
}

impl NamingStrategy {
    pub fn class_to_table_name(self, class: &str) -> String {
        let name = short_name(class);
        match self {
            NamingStrategy::Default => name.to_string(),
            NamingStrategy::Underscore => name.to_snake_case(),
        }
    }

    pub fn property_to_column_name(self, field: &str) -> String {
        match self {
            NamingStrategy::Default => field.to_string(),
            NamingStrategy::Underscore => field.to_snake_case(),
        }
    }

    pub fn reference_column_name(self) -> &'static str {
        "id"
    }

    /// Join column of a to-one association, e.g. `file` becomes `file_id`.
    pub fn join_column_name(self, field: &str) -> String {
        format!(
            "{}_{}",
            self.property_to_column_name(field),
            self.reference_column_name()
        )
    }

    /// Bridge table of a many-to-many association.
    pub fn join_table_name(self, source: &str, target: &str) -> String {
        format!(
            "{}_{}",
            self.class_to_table_name(source),
            self.class_to_table_name(target)
        )
        .to_lowercase()
    }

    /// Bridge column referencing `class`. `suffix` replaces the referenced
    /// column name, which self-referencing bridges use to tell both sides
    /// apart.
    pub fn join_key_column_name(self, class: &str, suffix: Option<&str>) -> String {
        format!(
            "{}_{}",
            self.class_to_table_name(class),
            suffix.unwrap_or(self.reference_column_name())
        )
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy() {
        let naming = NamingStrategy::Default;
        assert_eq!(naming.class_to_table_name("App\\CmsUser"), "CmsUser");
        assert_eq!(naming.join_column_name("file"), "file_id");
        assert_eq!(naming.join_table_name("App\\CmsUser", "App\\CmsGroup"), "cmsuser_cmsgroup");
        assert_eq!(naming.join_key_column_name("App\\CmsUser", None), "cmsuser_id");
    }

    #[test]
    fn underscore_strategy() {
        let naming = NamingStrategy::Underscore;
        assert_eq!(naming.class_to_table_name("App\\CmsUser"), "cms_user");
        assert_eq!(naming.property_to_column_name("pictureId"), "picture_id");
        assert_eq!(naming.join_column_name("mainFile"), "main_file_id");
        assert_eq!(naming.join_key_column_name("Node", Some("target")), "node_target");
    }
}

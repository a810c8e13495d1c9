#![allow(dead_code)]

use strata_core::mapping::{AssociationKind, ClassDefinition, FieldType, MetadataFactory};
use strata_core::{map, Schema, Value};
use strata_sql::{compile, CompileOptions, CompiledQuery, TreeWalker};

use strata_core::driver::Dialect;

pub fn cms() -> Schema {
    let mut factory = MetadataFactory::new();
    factory
        .register(
            ClassDefinition::entity("CmsUser")
                .id("id", FieldType::Integer)
                .field("status", FieldType::String)
                .field("username", FieldType::String)
                .unique()
                .field("name", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::OneToMany.code(),
                    "fieldName" => "articles",
                    "targetEntity" => "CmsArticle",
                    "mappedBy" => "user",
                })
                .association(map! {
                    "type" => AssociationKind::ManyToMany.code(),
                    "fieldName" => "groups",
                    "targetEntity" => "CmsGroup",
                    "inversedBy" => "users",
                }),
        )
        .register(
            ClassDefinition::entity("CmsArticle")
                .id("id", FieldType::Integer)
                .field("topic", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::ManyToOne.code(),
                    "fieldName" => "user",
                    "targetEntity" => "CmsUser",
                    "inversedBy" => "articles",
                }),
        )
        .register(
            ClassDefinition::entity("CmsGroup")
                .id("id", FieldType::Integer)
                .field("name", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::ManyToMany.code(),
                    "fieldName" => "users",
                    "targetEntity" => "CmsUser",
                    "mappedBy" => "groups",
                }),
        );
    factory.schema().unwrap()
}

/// A single-table hierarchy whose items reference their parent item.
pub fn items() -> Schema {
    let mut factory = MetadataFactory::new();
    factory
        .register(
            ClassDefinition::entity("Item")
                .id("id", FieldType::Integer)
                .association(map! {
                    "type" => AssociationKind::ManyToOne.code(),
                    "fieldName" => "parent",
                    "targetEntity" => "Item",
                    "inversedBy" => "children",
                })
                .association(map! {
                    "type" => AssociationKind::OneToMany.code(),
                    "fieldName" => "children",
                    "targetEntity" => "Item",
                    "mappedBy" => "parent",
                })
                .single_table_inheritance("type", [("item", "Item"), ("subitem", "SubItem")]),
        )
        .register(
            ClassDefinition::entity("SubItem")
                .extends("Item")
                .field("label", FieldType::String)
                .nullable(),
        );
    factory.schema().unwrap()
}

pub fn sqlite(dql: &str, schema: &Schema) -> CompiledQuery {
    compile(dql, schema, CompileOptions::new(Dialect::Sqlite)).unwrap()
}

pub fn sqlite_with(dql: &str, schema: &Schema, walkers: &[TreeWalker]) -> CompiledQuery {
    let mut options = CompileOptions::new(Dialect::Sqlite);
    options.tree_walkers = walkers;
    compile(dql, schema, options).unwrap()
}

pub fn semantical_error(dql: &str, schema: &Schema) -> String {
    match compile(dql, schema, CompileOptions::new(Dialect::Sqlite)) {
        Ok(compiled) => panic!("expected an error; sql={}", compiled.sql),
        Err(err) => {
            assert!(err.is_query(), "{err}");
            err.to_string()
        }
    }
}

pub fn string(value: &str) -> Value {
    Value::from(value)
}

#![allow(dead_code)]

use strata::mapping::{AssociationKind, ClassDefinition, FieldType};
use strata::{map, Builder, Db, EntityId, Value};
use strata_driver_sqlite::Sqlite;

/// Builds a database on a fresh in-memory SQLite connection with its tables
/// created.
pub fn db(register: impl FnOnce(&mut Builder)) -> Db {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut builder = Db::builder();
    register(&mut builder);

    let mut db = builder.build(Sqlite::in_memory()).unwrap();
    db.push_schema().unwrap();
    db
}

pub fn cms(builder: &mut Builder) {
    builder
        .register(
            ClassDefinition::entity("CmsUser")
                .id("id", FieldType::Integer)
                .field("username", FieldType::String)
                .unique()
                .field("name", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::OneToMany.code(),
                    "fieldName" => "articles",
                    "targetEntity" => "CmsArticle",
                    "mappedBy" => "user",
                    "cascade" => vec![Value::from("persist"), Value::from("remove")],
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
}

pub fn ecommerce(builder: &mut Builder) {
    builder
        .register(
            ClassDefinition::entity("Customer")
                .id("id", FieldType::Integer)
                .field("name", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::OneToOne.code(),
                    "fieldName" => "cart",
                    "targetEntity" => "Cart",
                    "mappedBy" => "customer",
                }),
        )
        .register(
            ClassDefinition::entity("Cart")
                .id("id", FieldType::Integer)
                .field("payment", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::OneToOne.code(),
                    "fieldName" => "customer",
                    "targetEntity" => "Customer",
                    "inversedBy" => "cart",
                }),
        );
}

/// Creates a persisted user with one article per topic.
pub fn user_with_articles(db: &mut Db, username: &str, topics: &[&str]) -> EntityId {
    let user = db.create("CmsUser").unwrap();
    db.set(user, "username", username).unwrap();
    db.set(user, "name", username.to_uppercase()).unwrap();

    for topic in topics {
        let article = db.create("CmsArticle").unwrap();
        db.set(article, "topic", *topic).unwrap();
        db.set_reference(article, "user", Some(user)).unwrap();
        db.add_to_collection(user, "articles", article).unwrap();
    }

    db.persist(user).unwrap();
    user
}

pub fn id(db: &Db, entity: EntityId) -> Value {
    db.get(entity).unwrap().get("id").cloned().unwrap()
}

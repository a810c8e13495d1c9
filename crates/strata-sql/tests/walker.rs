mod support;
use support::*;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::driver::Dialect;
use strata_core::mapping::FieldType;
use strata_core::Value;
use strata_sql::ast::Parameter;
use strata_sql::stmt::Param;
use strata_sql::{compile, compile_collection, CompileOptions};

#[test]
fn select_entity() {
    let schema = cms();
    let compiled = sqlite("SELECT u FROM CmsUser u WHERE u.id = ?1", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0, c0_.status AS status_1, c0_.username AS username_2, \
         c0_.name AS name_3 FROM CmsUser c0_ WHERE c0_.id = ?1"
    );
    assert_eq!(
        compiled.parameters,
        [Param::Query(Parameter::Positional(1))]
    );

    let rsm = &compiled.rsm;
    assert_eq!(rsm.alias_map["u"], "CmsUser");
    assert_eq!(rsm.entity_mappings["u"].as_deref(), Some("0"));
    assert_eq!(rsm.field_mappings["username_2"].field, "username");
    assert!(!rsm.is_mixed());
}

#[test]
fn fetch_join_one_to_many() {
    let schema = cms();
    let compiled = sqlite("SELECT u, a FROM CmsUser u JOIN u.articles a", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0, c0_.status AS status_1, c0_.username AS username_2, \
         c0_.name AS name_3, c1_.id AS id_4, c1_.topic AS topic_5, c1_.user_id AS user_id_6 \
         FROM CmsUser c0_ INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id"
    );

    let rsm = &compiled.rsm;
    assert_eq!(rsm.parent_alias_map["a"], "u");
    assert_eq!(rsm.relation_map["a"], "articles");
    assert!(rsm.is_joined("a"));
    assert_eq!(rsm.meta_mappings["user_id_6"].column, "user_id");
    assert_eq!(rsm.meta_mappings["user_id_6"].ty, Some(FieldType::Integer));
}

#[test]
fn many_to_many_joins_through_the_bridge_table() {
    let schema = cms();

    let owning = sqlite("SELECT u, g FROM CmsUser u LEFT JOIN u.groups g", &schema);
    assert_eq!(
        owning.sql,
        "SELECT c0_.id AS id_0, c0_.status AS status_1, c0_.username AS username_2, \
         c0_.name AS name_3, c1_.id AS id_4, c1_.name AS name_5 FROM CmsUser c0_ \
         LEFT JOIN cmsuser_cmsgroup c2_ ON c2_.cmsuser_id = c0_.id \
         LEFT JOIN CmsGroup c1_ ON c2_.cmsgroup_id = c1_.id"
    );

    let inverse = sqlite("SELECT g, u FROM CmsGroup g JOIN g.users u", &schema);
    assert_eq!(
        inverse.sql,
        "SELECT c0_.id AS id_0, c0_.name AS name_1, c1_.id AS id_2, c1_.status AS status_3, \
         c1_.username AS username_4, c1_.name AS name_5 FROM CmsGroup c0_ \
         INNER JOIN cmsuser_cmsgroup c2_ ON c2_.cmsgroup_id = c0_.id \
         INNER JOIN CmsUser c1_ ON c2_.cmsuser_id = c1_.id"
    );
}

#[test]
fn entities_are_hydrated_before_scalars() {
    let schema = cms();
    let compiled = sqlite("SELECT a.topic, a FROM CmsArticle a", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0, c0_.topic AS topic_1, c0_.user_id AS user_id_2, \
         c0_.topic AS topic_3 FROM CmsArticle c0_"
    );
    assert_eq!(compiled.rsm.scalar_mappings["topic_3"].name, "topic");
    assert!(compiled.rsm.is_mixed());
}

#[test]
fn scalar_results_and_result_variables() {
    let schema = cms();
    let compiled = sqlite(
        "SELECT u.name, COUNT(a) AS cnt, LOWER(u.status) FROM CmsUser u JOIN u.articles a \
         GROUP BY u.name ORDER BY cnt DESC",
        &schema,
    );

    assert_eq!(
        compiled.sql,
        "SELECT c0_.name AS name_0, COUNT(c1_.id) AS sclr_1, LOWER(c0_.status) AS sclr_2 \
         FROM CmsUser c0_ INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id \
         GROUP BY c0_.name ORDER BY sclr_1 DESC"
    );

    let scalars = &compiled.rsm.scalar_mappings;
    assert_eq!(scalars["name_0"].name, "name");
    assert_eq!(scalars["sclr_1"].name, "cnt");
    assert_eq!(scalars["sclr_1"].ty, Some(FieldType::Integer));
    assert_eq!(scalars["sclr_2"].name, "1");
    assert!(!compiled.rsm.has_entities());
}

#[test]
fn literals_and_parameters_are_bound() {
    let schema = cms();
    let compiled = sqlite(
        "SELECT u.id FROM CmsUser u WHERE u.status = 'active' OR u.name = :name",
        &schema,
    );

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0 FROM CmsUser c0_ WHERE c0_.status = ?1 OR c0_.name = ?2"
    );

    let mut values = IndexMap::new();
    values.insert(Parameter::Named("name".into()), string("Roman"));
    assert_eq!(
        assert_ok!(compiled.bind(&values)),
        [string("active"), string("Roman")]
    );

    let err = assert_err!(compiled.bind(&IndexMap::new()));
    assert_eq!(
        err.to_string(),
        "[Semantical Error] near ':name': Error: Parameter ':name' is not bound."
    );
}

#[test]
fn nested_conditions_keep_their_grouping() {
    let schema = cms();
    let compiled = sqlite(
        "SELECT u.id FROM CmsUser u WHERE (u.status = ?1 OR u.status = ?2) AND u.name IS NOT NULL",
        &schema,
    );

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0 FROM CmsUser c0_ \
         WHERE (c0_.status = ?1 OR c0_.status = ?2) AND c0_.name IS NOT NULL"
    );
}

#[test]
fn identity_of_an_association() {
    let schema = cms();
    let compiled = sqlite(
        "SELECT IDENTITY(a.user) AS author FROM CmsArticle a WHERE a.user = ?1",
        &schema,
    );

    assert_eq!(
        compiled.sql,
        "SELECT c0_.user_id AS sclr_0 FROM CmsArticle c0_ WHERE c0_.user_id = ?1"
    );
}

#[test]
fn join_with_condition() {
    let schema = cms();
    let compiled = sqlite(
        "SELECT u, a FROM CmsUser u LEFT JOIN u.articles a WITH a.topic LIKE 'rust%'",
        &schema,
    );

    assert!(compiled.sql.ends_with(
        "LEFT JOIN CmsArticle c1_ ON c1_.user_id = c0_.id AND c1_.topic LIKE ?1"
    ));
    assert_eq!(compiled.parameters, [Param::Value(string("rust%"))]);
}

#[test]
fn limit_and_offset_follow_the_dialect() {
    let schema = cms();
    let dql = "SELECT u.id FROM CmsUser u";

    let mut options = CompileOptions::new(Dialect::Sqlite);
    options.first_result = Some(20);
    assert_eq!(
        assert_ok!(compile(dql, &schema, options)).sql,
        "SELECT c0_.id AS id_0 FROM CmsUser c0_ LIMIT -1 OFFSET 20"
    );

    let mut options = CompileOptions::new(Dialect::Postgresql);
    options.first_result = Some(20);
    options.max_results = Some(10);
    assert_eq!(
        assert_ok!(compile(dql, &schema, options)).sql,
        "SELECT c0_.id AS id_0 FROM CmsUser c0_ LIMIT 10 OFFSET 20"
    );
}

#[test]
fn single_table_subclass_is_restricted_by_discriminator() {
    let schema = items();
    let compiled = sqlite("SELECT s FROM SubItem s", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT i0_.id AS id_0, i0_.label AS label_1, i0_.type AS type_2, \
         i0_.parent_id AS parent_id_3 FROM Item i0_ WHERE i0_.type IN (?1)"
    );
    assert_eq!(compiled.parameters, [Param::Value(string("subitem"))]);
    assert_eq!(compiled.rsm.discriminator_columns["s"], "type_2");
}

#[test]
fn single_table_root_selects_subclass_columns() {
    let schema = items();
    let compiled = sqlite("SELECT i, p FROM Item i LEFT JOIN i.parent p", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT i0_.id AS id_0, i0_.label AS label_1, i0_.type AS type_2, \
         i0_.parent_id AS parent_id_3, i1_.id AS id_4, i1_.label AS label_5, \
         i1_.type AS type_6, i1_.parent_id AS parent_id_7 \
         FROM Item i0_ LEFT JOIN Item i1_ ON i0_.parent_id = i1_.id"
    );

    let rsm = &compiled.rsm;
    assert_eq!(
        rsm.field_mappings["label_1"].declaring_class.as_deref(),
        Some("SubItem")
    );
    assert_none!(rsm.field_mappings["id_0"].declaring_class);
    assert_eq!(rsm.discriminator_columns["p"], "type_6");
    assert_eq!(rsm.meta_mappings["parent_id_3"].ty, Some(FieldType::Integer));
}

#[test]
fn collections_load_by_owner_key() {
    let schema = cms();

    let user = schema.class("CmsUser").unwrap();
    let articles = assert_ok!(compile_collection(
        &schema,
        user.association("articles").unwrap(),
        Dialect::Sqlite
    ));
    assert_eq!(
        articles.sql,
        "SELECT c0_.id AS id_0, c0_.topic AS topic_1, c0_.user_id AS user_id_2 \
         FROM CmsArticle c0_ WHERE c0_.user_id = ?1"
    );
    assert_eq!(
        articles.parameters,
        [Param::Query(Parameter::Named("id".into()))]
    );

    let groups = assert_ok!(compile_collection(
        &schema,
        user.association("groups").unwrap(),
        Dialect::Sqlite
    ));
    assert_eq!(
        groups.sql,
        "SELECT c0_.id AS id_0, c0_.name AS name_1 FROM CmsGroup c0_ \
         INNER JOIN cmsuser_cmsgroup c1_ ON c1_.cmsgroup_id = c0_.id WHERE c1_.cmsuser_id = ?1"
    );

    let mut owner = IndexMap::new();
    owner.insert(Parameter::Named("id".into()), Value::I64(4));
    assert_eq!(assert_ok!(groups.bind(&owner)), [Value::I64(4)]);
}

#[test]
fn to_one_association_is_not_a_collection() {
    let schema = cms();
    let article = schema.class("CmsArticle").unwrap();

    let err = assert_err!(compile_collection(
        &schema,
        article.association("user").unwrap(),
        Dialect::Sqlite
    ));
    assert!(err.is_invalid_mapping());
}

mod support;
use support::*;

use pretty_assertions::assert_eq;
use strata_core::Result;
use strata_sql::ast::{Expr, SelectStatement};
use strata_sql::walker::{count_walker, limit_subquery_walker};
use strata_sql::{QueryComponents, TreeWalker};

fn remove_articles(mut stmt: SelectStatement, _: &QueryComponents) -> Result<SelectStatement> {
    stmt.remove_select_expression(&Expr::alias("a"));
    Ok(stmt)
}

fn order_by_name(mut stmt: SelectStatement, _: &QueryComponents) -> Result<SelectStatement> {
    stmt.order_by.push(strata_sql::ast::OrderByItem {
        expr: Expr::path("u", "name"),
        descending: false,
    });
    Ok(stmt)
}

#[test]
fn fetch_joins_are_reordered_parent_first() {
    let schema = cms();
    let compiled = sqlite("SELECT a, u.name, u FROM CmsUser u JOIN u.articles a", &schema);

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0, c0_.status AS status_1, c0_.username AS username_2, \
         c0_.name AS name_3, c1_.id AS id_4, c1_.topic AS topic_5, c1_.user_id AS user_id_6, \
         c0_.name AS name_7 FROM CmsUser c0_ INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id"
    );
    assert_eq!(compiled.rsm.scalar_mappings["name_7"].name, "name");
}

#[test]
fn custom_walker_removes_a_fetch_join() {
    let schema = cms();
    let compiled = sqlite_with(
        "SELECT u, a FROM CmsUser u JOIN u.articles a",
        &schema,
        &[remove_articles],
    );

    assert_eq!(
        compiled.sql,
        "SELECT c0_.id AS id_0, c0_.status AS status_1, c0_.username AS username_2, \
         c0_.name AS name_3 FROM CmsUser c0_ INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id"
    );
    assert!(!compiled.rsm.is_entity_alias("a"));
}

#[test]
fn walkers_run_in_order() {
    let schema = cms();
    let walkers: [TreeWalker; 2] = [order_by_name, limit_subquery_walker];
    let compiled = sqlite_with("SELECT u FROM CmsUser u", &schema, &walkers);

    assert_eq!(
        compiled.sql,
        "SELECT DISTINCT c0_.id AS id_0, c0_.name AS name_1 FROM CmsUser c0_ \
         ORDER BY c0_.name ASC"
    );
    // Hidden ordering columns are not part of the result
    assert_eq!(compiled.rsm.scalar_mappings.len(), 1);
}

#[test]
fn count_walker_counts_distinct_roots() {
    let schema = cms();
    let compiled = sqlite_with(
        "SELECT u, a FROM CmsUser u JOIN u.articles a WHERE a.topic = ?1 ORDER BY u.name",
        &schema,
        &[count_walker],
    );

    assert_eq!(
        compiled.sql,
        "SELECT COUNT(DISTINCT c0_.id) AS sclr_0 FROM CmsUser c0_ \
         INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id WHERE c1_.topic = ?1"
    );
}

#[test]
fn count_walker_rejects_having() {
    let schema = cms();
    let err = strata_sql::compile(
        "SELECT u.name, COUNT(a) AS total FROM CmsUser u JOIN u.articles a \
         GROUP BY u.name HAVING COUNT(a) > 1",
        &schema,
        strata_sql::CompileOptions {
            tree_walkers: &[count_walker],
            ..strata_sql::CompileOptions::new(strata_core::driver::Dialect::Sqlite)
        },
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "[Semantical Error] near 'COUNT(a) > 1': Error: Cannot count query that uses a HAVING clause."
    );
}

#[test]
fn limit_subquery_of_a_plain_entity_query() {
    let schema = cms();
    let compiled = sqlite_with("SELECT e FROM CmsUser e", &schema, &[limit_subquery_walker]);

    assert_eq!(compiled.sql, "SELECT DISTINCT c0_.id AS id_0 FROM CmsUser c0_");
}

#[test]
fn limit_subquery_keeps_ordering_by_joined_fields() {
    let schema = cms();
    let compiled = sqlite_with(
        "SELECT u, a FROM CmsUser u JOIN u.articles a ORDER BY a.topic DESC, u.id",
        &schema,
        &[limit_subquery_walker],
    );

    assert_eq!(
        compiled.sql,
        "SELECT DISTINCT c0_.id AS id_0, c1_.topic AS topic_1 FROM CmsUser c0_ \
         INNER JOIN CmsArticle c1_ ON c1_.user_id = c0_.id ORDER BY c1_.topic DESC, c0_.id ASC"
    );
}

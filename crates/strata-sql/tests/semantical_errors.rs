mod support;
use support::*;

use pretty_assertions::assert_eq;

#[test]
fn unknown_class() {
    assert_eq!(
        semantical_error("SELECT u FROM Unknown u", &cms()),
        "[Semantical Error] near 'Unknown': Error: Class 'Unknown' is not defined."
    );
}

#[test]
fn unknown_field() {
    assert_eq!(
        semantical_error("SELECT u.foo FROM CmsUser u", &cms()),
        "[Semantical Error] near 'u.foo': Error: Class CmsUser has no field or association named foo"
    );
}

#[test]
fn collection_valued_path() {
    assert_eq!(
        semantical_error("SELECT u.id FROM CmsUser u WHERE u.articles = 1", &cms()),
        "[Semantical Error] near 'u.articles': Error: Invalid PathExpression. \
         StateFieldPathExpression or SingleValuedAssociationField expected."
    );
}

#[test]
fn association_selected_as_scalar() {
    assert_eq!(
        semantical_error("SELECT a.user FROM CmsArticle a", &cms()),
        "[Semantical Error] near 'a.user': Error: Invalid PathExpression. \
         Must be a StateFieldPathExpression."
    );
}

#[test]
fn unknown_association_in_join() {
    assert_eq!(
        semantical_error("SELECT u FROM CmsUser u JOIN u.foo f", &cms()),
        "[Semantical Error] near 'u.foo': Error: Class CmsUser has no association named foo"
    );
}

#[test]
fn join_from_undeclared_variable() {
    assert_eq!(
        semantical_error("SELECT u FROM CmsUser u JOIN x.articles a", &cms()),
        "[Semantical Error] near 'x.articles': Error: Identification Variable x used in \
         join path expression but was not defined before."
    );
}

#[test]
fn variable_declared_twice() {
    assert_eq!(
        semantical_error("SELECT u FROM CmsUser u, CmsArticle u", &cms()),
        "[Semantical Error] near 'u': Error: 'u' is already defined."
    );
    assert_eq!(
        semantical_error("SELECT u.id AS x, u.name AS x FROM CmsUser u", &cms()),
        "[Semantical Error] near 'x': Error: 'x' is already defined."
    );
}

#[test]
fn undefined_variable_in_where() {
    assert_eq!(
        semantical_error("SELECT u FROM CmsUser u WHERE x.id = 1", &cms()),
        "[Semantical Error] near 'x.id': Error: 'x' is not defined."
    );
}

#[test]
fn joined_entity_without_root() {
    assert_eq!(
        semantical_error("SELECT a FROM CmsUser u JOIN u.articles a", &cms()),
        "[Semantical Error] near 'a': Error: Cannot select entity through identification \
         variables without choosing at least one root entity alias."
    );
}

#[test]
fn fetch_join_without_parent() {
    assert_eq!(
        semantical_error(
            "SELECT a, g FROM CmsArticle a JOIN a.user u JOIN u.groups g",
            &cms()
        ),
        "[Semantical Error] near 'g': Error: Cannot fetch-join 'g' without selecting its parent 'u'."
    );
}

#[test]
fn syntax_errors_pass_through() {
    assert_eq!(
        semantical_error("SELECT u FORM CmsUser u", &cms()),
        "[Syntax Error] line 0, col 14: Error: Expected FROM, got 'CmsUser'"
    );
}

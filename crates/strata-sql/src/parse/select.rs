use super::{Parse, Parser, Token};
use crate::ast::{
    Condition, Expr, FromItem, Join, JoinKind, OrderByItem, RangeVariable, SelectClause,
    SelectExpression, SelectStatement,
};

use strata_core::Result;

impl Parse for SelectStatement {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let select = p.parse()?;

        p.expect_keyword("FROM")?;
        let from = p.parse_comma_separated()?;

        let filter = if p.eat_keyword("WHERE") {
            Some(p.parse()?)
        } else {
            None
        };

        let group_by = if p.eat_keyword("GROUP") {
            p.expect_keyword("BY")?;
            p.parse_comma_separated()?
        } else {
            vec![]
        };

        let having = if p.eat_keyword("HAVING") {
            Some(p.parse::<Condition>()?)
        } else {
            None
        };

        let order_by = if p.eat_keyword("ORDER") {
            p.expect_keyword("BY")?;
            p.parse_comma_separated()?
        } else {
            vec![]
        };

        Ok(SelectStatement {
            select,
            from,
            filter,
            group_by,
            having,
            order_by,
        })
    }
}

impl Parse for SelectClause {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        p.expect_keyword("SELECT")?;
        let distinct = p.eat_keyword("DISTINCT");
        let exprs = p.parse_comma_separated()?;
        Ok(SelectClause { distinct, exprs })
    }
}

impl Parse for SelectExpression {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let expr = p.parse::<Expr>()?;

        let explicit_as = p.eat_keyword("AS");
        let hidden = p.eat_keyword("HIDDEN");

        let alias = if explicit_as || hidden || is_alias_next(p) {
            Some(p.expect_ident("result variable")?)
        } else {
            None
        };

        Ok(SelectExpression {
            expr,
            alias,
            hidden,
        })
    }
}

impl Parse for FromItem {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let range = p.parse()?;
        let mut joins = vec![];

        while p.is_keyword("JOIN") || p.is_keyword("LEFT") || p.is_keyword("INNER") {
            joins.push(p.parse()?);
        }

        Ok(FromItem { range, joins })
    }
}

impl Parse for RangeVariable {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let entity = p.expect_ident("abstract schema name")?;
        p.eat_keyword("AS");
        let alias = p.expect_ident("identification variable")?;
        Ok(RangeVariable { entity, alias })
    }
}

impl Parse for Join {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let kind = if p.eat_keyword("LEFT") {
            p.eat_keyword("OUTER");
            JoinKind::Left
        } else {
            p.eat_keyword("INNER");
            JoinKind::Inner
        };

        p.expect_keyword("JOIN")?;

        let parent = p.expect_ident("identification variable")?;
        p.expect(&Token::Period, "'.'")?;
        let field = p.expect_ident("association field")?;

        p.eat_keyword("AS");
        let alias = p.expect_ident("identification variable")?;

        let condition = if p.eat_keyword("WITH") {
            Some(p.parse()?)
        } else {
            None
        };

        Ok(Join {
            kind,
            path: crate::ast::PathExpr {
                alias: parent,
                field,
            },
            alias,
            condition,
        })
    }
}

impl Parse for OrderByItem {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let expr = p.parse()?;

        let descending = if p.eat_keyword("DESC") {
            true
        } else {
            p.eat_keyword("ASC");
            false
        };

        Ok(OrderByItem { expr, descending })
    }
}

/// An unreserved identifier directly after a select expression names it.
fn is_alias_next(p: &mut Parser<'_>) -> bool {
    matches!(p.peek(), Some(token @ Token::Ident(_)) if !token.is_reserved())
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parse;

    use pretty_assertions::assert_eq;

    #[test]
    fn fetch_join_with_scalars() {
        let stmt =
            parse("select c, c.name, ca, ca.payment from Cart ca join ca.customer c").unwrap();

        assert_eq!(
            stmt.select.exprs,
            [
                SelectExpression::new(Expr::alias("c")),
                SelectExpression::new(Expr::path("c", "name")),
                SelectExpression::new(Expr::alias("ca")),
                SelectExpression::new(Expr::path("ca", "payment")),
            ]
        );
        assert_eq!(
            stmt.from,
            [FromItem {
                range: RangeVariable {
                    entity: "Cart".into(),
                    alias: "ca".into(),
                },
                joins: vec![Join {
                    kind: JoinKind::Inner,
                    path: PathExpr {
                        alias: "ca".into(),
                        field: "customer".into(),
                    },
                    alias: "c".into(),
                    condition: None,
                }],
            }]
        );
    }

    #[test]
    fn clauses() {
        let stmt = parse(
            "SELECT DISTINCT u, COUNT(p.id) AS HIDDEN n FROM CmsUser AS u \
             LEFT OUTER JOIN u.phonenumbers p WITH p.number LIKE '1%' \
             WHERE u.id IN (1, 2) AND NOT u.name IS NULL \
             GROUP BY u.id HAVING COUNT(p.id) > 1 ORDER BY u.name DESC, u.id",
        )
        .unwrap();

        assert!(stmt.select.distinct);
        assert_eq!(stmt.select.exprs[1].alias.as_deref(), Some("n"));
        assert!(stmt.select.exprs[1].hidden);
        assert_eq!(stmt.from[0].joins[0].kind, JoinKind::Left);
        assert!(stmt.from[0].joins[0].condition.is_some());
        assert!(matches!(stmt.filter, Some(Condition::And(ref items)) if items.len() == 2));
        assert_eq!(stmt.group_by, [Expr::path("u", "id")]);
        assert!(stmt.having.is_some());
        assert_eq!(stmt.order_by.len(), 2);
        assert!(stmt.order_by[0].descending);
        assert!(!stmt.order_by[1].descending);
    }

    #[test]
    fn implicit_result_variable() {
        let stmt = parse("SELECT u.name userName FROM CmsUser u").unwrap();
        assert_eq!(stmt.select.exprs[0].alias.as_deref(), Some("userName"));
    }

    #[test]
    fn syntax_error_names_token_and_column() {
        // `FORM` is read as a result variable
        let err = parse("SELECT u FORM CmsUser u").unwrap_err();
        assert!(err.is_query_syntax());
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 14: Error: Expected FROM, got 'CmsUser'"
        );
    }

    #[test]
    fn syntax_error_at_end_of_string() {
        let err = parse("SELECT u FROM").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 13: Error: Expected abstract schema name, got end of string."
        );
    }

    #[test]
    fn reserved_word_is_not_an_alias() {
        let err = parse("SELECT u FROM CmsUser WHERE").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 22: Error: Expected identification variable, got 'WHERE'"
        );
    }
}

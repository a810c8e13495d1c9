use super::{Lexeme, Parse, Parser, Token};
use crate::ast::{
    AggregateFunction, ArithmeticOp, ComparisonOp, Condition, Expr, Function, Literal, Parameter,
    PathExpr,
};

use strata_core::{Error, Result};

impl Parse for Condition {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let mut items = vec![parse_and(p)?];

        while p.eat_keyword("OR") {
            items.push(parse_and(p)?);
        }

        Ok(flatten(items, Condition::Or))
    }
}

fn parse_and(p: &mut Parser<'_>) -> Result<Condition> {
    let mut items = vec![parse_not(p)?];

    while p.eat_keyword("AND") {
        items.push(parse_not(p)?);
    }

    Ok(flatten(items, Condition::And))
}

fn flatten(mut items: Vec<Condition>, f: fn(Vec<Condition>) -> Condition) -> Condition {
    if items.len() == 1 {
        items.remove(0)
    } else {
        f(items)
    }
}

fn parse_not(p: &mut Parser<'_>) -> Result<Condition> {
    if p.eat_keyword("NOT") {
        return Ok(Condition::Not(Box::new(parse_not(p)?)));
    }

    if p.is_next(&Token::LParen) && is_nested_condition(p) {
        p.next_token();
        let cond = p.parse()?;
        p.expect(&Token::RParen, "')'")?;
        return Ok(Condition::Nested(Box::new(cond)));
    }

    parse_simple_condition(p)
}

/// Looks past the parenthesized group at the next token. When an operator
/// follows the closing paren, the group is the left operand of a
/// comparison and not a nested condition.
fn is_nested_condition(p: &mut Parser<'_>) -> bool {
    let mut depth = 0;
    let mut n = 0;

    loop {
        match p.peek_nth(n) {
            Some(Token::LParen) => depth += 1,
            Some(Token::RParen) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Some(_) => {}
            None => return true,
        }
        n += 1;
    }

    let is_operand = match p.peek_nth(n + 1) {
        Some(
            Token::Eq
            | Token::Ne
            | Token::Lt
            | Token::Le
            | Token::Gt
            | Token::Ge
            | Token::Plus
            | Token::Minus
            | Token::Star
            | Token::Slash,
        ) => true,
        Some(token) => ["IS", "IN", "LIKE", "BETWEEN", "NOT"]
            .iter()
            .any(|keyword| token.is_keyword(keyword)),
        None => false,
    };

    !is_operand
}

fn parse_simple_condition(p: &mut Parser<'_>) -> Result<Condition> {
    let expr = p.parse::<Expr>()?;

    if let Some(op) = p.peek().and_then(comparison_op) {
        p.next_token();
        let rhs = p.parse()?;
        return Ok(Condition::Comparison { lhs: expr, op, rhs });
    }

    if p.eat_keyword("IS") {
        let negated = p.eat_keyword("NOT");
        p.expect_keyword("NULL")?;
        return Ok(Condition::IsNull { expr, negated });
    }

    let negated = p.eat_keyword("NOT");

    if p.eat_keyword("IN") {
        p.expect(&Token::LParen, "'('")?;
        let list = p.parse_comma_separated()?;
        p.expect(&Token::RParen, "')'")?;
        return Ok(Condition::In {
            expr,
            list,
            negated,
        });
    }

    if p.eat_keyword("LIKE") {
        let pattern = p.parse()?;
        return Ok(Condition::Like {
            expr,
            pattern,
            negated,
        });
    }

    if p.eat_keyword("BETWEEN") {
        let low = p.parse()?;
        p.expect_keyword("AND")?;
        let high = p.parse()?;
        return Ok(Condition::Between {
            expr,
            low,
            high,
            negated,
        });
    }

    Err(p.error("comparison operator"))
}

fn comparison_op(token: &Token) -> Option<ComparisonOp> {
    Some(match token {
        Token::Eq => ComparisonOp::Eq,
        Token::Ne => ComparisonOp::Ne,
        Token::Lt => ComparisonOp::Lt,
        Token::Le => ComparisonOp::Le,
        Token::Gt => ComparisonOp::Gt,
        Token::Ge => ComparisonOp::Ge,
        _ => return None,
    })
}

impl Parse for Expr {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let mut lhs = parse_term(p)?;

        loop {
            let op = match p.peek() {
                Some(Token::Plus) => ArithmeticOp::Add,
                Some(Token::Minus) => ArithmeticOp::Sub,
                _ => return Ok(lhs),
            };
            p.next_token();

            let rhs = parse_term(p)?;
            lhs = Expr::Arithmetic {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
    }
}

fn parse_term(p: &mut Parser<'_>) -> Result<Expr> {
    let mut lhs = parse_unary(p)?;

    loop {
        let op = match p.peek() {
            Some(Token::Star) => ArithmeticOp::Mul,
            Some(Token::Slash) => ArithmeticOp::Div,
            _ => return Ok(lhs),
        };
        p.next_token();

        let rhs = parse_unary(p)?;
        lhs = Expr::Arithmetic {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        };
    }
}

fn parse_unary(p: &mut Parser<'_>) -> Result<Expr> {
    if p.eat(&Token::Minus) {
        return Ok(Expr::Negate(Box::new(parse_unary(p)?)));
    }

    parse_primary(p)
}

fn parse_primary(p: &mut Parser<'_>) -> Result<Expr> {
    let Some(token) = p.peek().cloned() else {
        return Err(p.error("expression"));
    };

    let expr = match token {
        Token::Integer(v) => Expr::Literal(Literal::Integer(v)),
        Token::Float(v) => Expr::Literal(Literal::Float(v)),
        Token::String(v) => Expr::Literal(Literal::String(v)),
        Token::Positional(position) => Expr::Parameter(Parameter::Positional(position)),
        Token::Named(name) => Expr::Parameter(Parameter::Named(name)),
        Token::LParen => {
            p.next_token();
            let expr = p.parse()?;
            p.expect(&Token::RParen, "')'")?;
            return Ok(Expr::Nested(Box::new(expr)));
        }
        ref token if token.is_keyword("NULL") => Expr::Literal(Literal::Null),
        ref token if token.is_keyword("TRUE") => Expr::Literal(Literal::Bool(true)),
        ref token if token.is_keyword("FALSE") => Expr::Literal(Literal::Bool(false)),
        Token::Ident(ref name) if p.peek_nth(1) == Some(&Token::LParen) => {
            if let Some(function) = aggregate_function(name) {
                return parse_aggregate(p, function);
            }
            if let Some(function) = scalar_function(name) {
                return parse_function(p, function);
            }
            return Err(p.error("known function"));
        }
        ref token @ Token::Ident(_) if !token.is_reserved() => return parse_path(p),
        _ => return Err(p.error("expression")),
    };

    p.next_token();
    Ok(expr)
}

fn parse_path(p: &mut Parser<'_>) -> Result<Expr> {
    let alias = p.expect_ident("identification variable")?;

    if !p.eat(&Token::Period) {
        return Ok(Expr::Alias(alias));
    }

    let field = p.expect_ident("field name")?;
    Ok(Expr::Path(PathExpr { alias, field }))
}

fn parse_aggregate(p: &mut Parser<'_>, function: AggregateFunction) -> Result<Expr> {
    p.next_token();
    p.expect(&Token::LParen, "'('")?;
    let distinct = p.eat_keyword("DISTINCT");
    let arg = p.parse()?;
    p.expect(&Token::RParen, "')'")?;

    Ok(Expr::Aggregate {
        function,
        distinct,
        arg: Box::new(arg),
    })
}

fn parse_function(p: &mut Parser<'_>, function: Function) -> Result<Expr> {
    let Some(Lexeme { col, text, .. }) = p.next_token() else {
        return Err(p.error("function"));
    };
    p.expect(&Token::LParen, "'('")?;
    let args = p.parse_comma_separated()?;
    p.expect(&Token::RParen, "')'")?;

    let (min, max) = function.arity();
    if args.len() < min || max.is_some_and(|max| args.len() > max) {
        let expected = match max {
            Some(max) if max == min => format!("{min} argument(s) for {}", function.name()),
            _ => format!("at least {min} arguments for {}", function.name()),
        };
        return Err(Error::query_syntax(col, text, format!("Expected {expected}")));
    }

    Ok(Expr::Function { function, args })
}

fn aggregate_function(name: &str) -> Option<AggregateFunction> {
    Some(match name.to_ascii_uppercase().as_str() {
        "COUNT" => AggregateFunction::Count,
        "SUM" => AggregateFunction::Sum,
        "MIN" => AggregateFunction::Min,
        "MAX" => AggregateFunction::Max,
        "AVG" => AggregateFunction::Avg,
        _ => return None,
    })
}

fn scalar_function(name: &str) -> Option<Function> {
    Some(match name.to_ascii_uppercase().as_str() {
        "LOWER" => Function::Lower,
        "UPPER" => Function::Upper,
        "LENGTH" => Function::Length,
        "CONCAT" => Function::Concat,
        "IDENTITY" => Function::Identity,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Lexer;

    fn condition(src: &str) -> Result<Condition> {
        let mut parser = Parser::new(Lexer::new(src));
        let cond = parser.parse()?;
        parser.expect_eof()?;
        Ok(cond)
    }

    #[test]
    fn precedence() {
        let cond = condition("a.x = 1 OR a.y = 2 AND a.z = 3").unwrap();
        let Condition::Or(items) = cond else {
            panic!("expected OR");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Condition::And(_)));
    }

    #[test]
    fn arithmetic_binds_tighter_than_comparison() {
        let cond = condition("a.x + 2 * a.y > -1").unwrap();
        let Condition::Comparison { lhs, op, rhs } = cond else {
            panic!("expected a comparison");
        };
        assert_eq!(op, ComparisonOp::Gt);
        assert!(matches!(
            lhs,
            Expr::Arithmetic {
                op: ArithmeticOp::Add,
                ..
            }
        ));
        assert_eq!(
            rhs,
            Expr::Negate(Box::new(Expr::Literal(Literal::Integer(1))))
        );
    }

    #[test]
    fn parenthesized_operand_versus_nested_condition() {
        assert!(matches!(
            condition("(a.x + 1) > 2").unwrap(),
            Condition::Comparison { .. }
        ));
        assert!(matches!(
            condition("(a.x = 1 OR a.y = 2) AND a.z IS NOT NULL").unwrap(),
            Condition::And(ref items) if matches!(items[0], Condition::Nested(_))
        ));
    }

    #[test]
    fn negated_predicates() {
        assert!(matches!(
            condition("a.name NOT LIKE 'x%'").unwrap(),
            Condition::Like { negated: true, .. }
        ));
        assert!(matches!(
            condition("a.id NOT IN (?1, :two)").unwrap(),
            Condition::In { negated: true, ref list, .. } if list.len() == 2
        ));
        assert!(matches!(
            condition("a.id BETWEEN 1 AND 10").unwrap(),
            Condition::Between { negated: false, .. }
        ));
    }

    #[test]
    fn function_arity() {
        let err = condition("LOWER(a.x, a.y) = 'a'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 0: Error: Expected 1 argument(s) for LOWER, got 'LOWER'"
        );
    }

    #[test]
    fn missing_operator() {
        let err = condition("a.x 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 4: Error: Expected comparison operator, got '1'"
        );
    }

    #[test]
    fn invalid_character() {
        let err = condition("a.x = #").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Syntax Error] line 0, col 6: Error: Expected expression, got '#'"
        );
    }
}

//! Hand-written lexer and recursive-descent parser for DQL.

mod expr;

mod lexer;
use lexer::Lexer;

mod parser;
use parser::Parser;

mod select;

mod token;
use token::{Lexeme, Token};

use crate::ast::SelectStatement;
use strata_core::Result;

pub(crate) trait Parse: Sized {
    fn parse(parser: &mut Parser<'_>) -> Result<Self>;
}

/// Parses a DQL `SELECT` statement.
pub fn parse(dql: &str) -> Result<SelectStatement> {
    let mut parser = Parser::new(Lexer::new(dql));
    let stmt: SelectStatement = parser.parse()?;
    parser.expect_eof()?;
    Ok(stmt)
}

use super::{Lexeme, Lexer, Parse, Token};

use strata_core::{Error, Result};

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(lexer: Lexer<'a>) -> Parser<'a> {
        Parser { lexer }
    }

    pub(crate) fn parse<T: Parse>(&mut self) -> Result<T> {
        T::parse(self)
    }

    /// Parses `T {, T}`.
    pub(crate) fn parse_comma_separated<T: Parse>(&mut self) -> Result<Vec<T>> {
        let mut ret = vec![self.parse()?];

        while self.eat(&Token::Comma) {
            ret.push(self.parse()?);
        }

        Ok(ret)
    }

    pub(crate) fn peek(&mut self) -> Option<&Token> {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> Option<&Token> {
        self.lexer.peek_nth(n).map(|lexeme| &lexeme.token)
    }

    pub(crate) fn next_token(&mut self) -> Option<Lexeme> {
        self.lexer.next()
    }

    pub(crate) fn is_next(&mut self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    pub(crate) fn is_keyword(&mut self, keyword: &str) -> bool {
        self.is_nth_keyword(0, keyword)
    }

    pub(crate) fn is_nth_keyword(&mut self, n: usize, keyword: &str) -> bool {
        self.peek_nth(n).is_some_and(|token| token.is_keyword(keyword))
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.is_next(token) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: &Token, expected: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(keyword))
        }
    }

    /// Takes an identifier that is not a reserved word.
    pub(crate) fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            Some(token @ Token::Ident(_)) if !token.is_reserved() => {}
            _ => return Err(self.error(expected)),
        }

        match self.next_token() {
            Some(Lexeme {
                token: Token::Ident(ident),
                ..
            }) => Ok(ident),
            _ => Err(self.error(expected)),
        }
    }

    pub(crate) fn expect_eof(&mut self) -> Result<()> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(self.error("end of string"))
        }
    }

    pub(crate) fn is_eof(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Syntax error at the next token, which is named in the message.
    pub(crate) fn error(&mut self, expected: &str) -> Error {
        let end = self.lexer.end();
        let message = format!("Expected {expected}");

        match self.lexer.peek_nth(0) {
            Some(lexeme) => Error::query_syntax(lexeme.col, lexeme.text.clone(), message),
            None => Error::query_syntax(end, "", message),
        }
    }
}

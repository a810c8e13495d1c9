use super::{Lexeme, Token};

use std::collections::VecDeque;

pub(crate) struct Lexer<'a> {
    src: &'a str,

    /// Characters consumed so far.
    col: usize,

    next: VecDeque<Lexeme>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src,
            col: 0,
            next: VecDeque::new(),
        }
    }

    pub(crate) fn next(&mut self) -> Option<Lexeme> {
        self.lex_n(1);
        self.next.pop_front()
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> Option<&Lexeme> {
        self.lex_n(n + 1);
        self.next.get(n)
    }

    /// Column at which the input ends.
    pub(crate) fn end(&self) -> usize {
        self.col + self.src.chars().count()
    }

    fn lex_n(&mut self, n: usize) {
        while self.next.len() < n {
            self.skip_whitespace();

            let start_col = self.col;
            let start = self.src;

            let Some(ch) = self.try_next_char() else {
                return;
            };

            let token = match ch {
                ',' => Token::Comma,
                '.' => Token::Period,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '=' => Token::Eq,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '<' => {
                    if self.take_if(|ch| ch == '>').is_some() {
                        Token::Ne
                    } else if self.take_if(|ch| ch == '=').is_some() {
                        Token::Le
                    } else {
                        Token::Lt
                    }
                }
                '>' => {
                    if self.take_if(|ch| ch == '=').is_some() {
                        Token::Ge
                    } else {
                        Token::Gt
                    }
                }
                '!' => match self.take_if(|ch| ch == '=') {
                    Some(_) => Token::Ne,
                    None => Token::Invalid,
                },
                '?' => {
                    let digits = self.take_while(|ch| ch.is_ascii_digit());
                    match digits.parse() {
                        Ok(position) => Token::Positional(position),
                        Err(_) => Token::Invalid,
                    }
                }
                ':' => {
                    let name = self.take_while(ident_ch);
                    if name.is_empty() {
                        Token::Invalid
                    } else {
                        Token::Named(name)
                    }
                }
                '\'' => self.string(),
                ch if ch.is_ascii_digit() => self.number(ch),
                ch if ch.is_alphabetic() || ch == '_' || ch == '\\' => {
                    let mut ident = String::new();
                    if ch != '\\' {
                        ident.push(ch);
                    }
                    ident.push_str(&self.take_while(|ch| ident_ch(ch) || ch == '\\'));
                    Token::Ident(ident)
                }
                _ => Token::Invalid,
            };

            let len = start.len() - self.src.len();
            self.next.push_back(Lexeme {
                token,
                col: start_col,
                text: start[..len].to_string(),
            });
        }
    }

    /// Lexes the rest of a single-quoted string; `''` escapes a quote.
    fn string(&mut self) -> Token {
        let mut s = String::new();

        loop {
            match self.try_next_char() {
                Some('\'') => {
                    if self.take_if(|ch| ch == '\'').is_some() {
                        s.push('\'');
                    } else {
                        return Token::String(s);
                    }
                }
                Some(ch) => s.push(ch),
                None => return Token::Invalid,
            }
        }
    }

    fn number(&mut self, first: char) -> Token {
        let mut digits = String::new();
        digits.push(first);
        digits.push_str(&self.take_while(|ch| ch.is_ascii_digit()));

        let is_float = self.peek_char() == Some('.')
            && self.peek_char_n(1).is_some_and(|ch| ch.is_ascii_digit());

        if is_float {
            self.consume(1);
            digits.push('.');
            digits.push_str(&self.take_while(|ch| ch.is_ascii_digit()));
            return digits.parse().map(Token::Float).unwrap_or(Token::Invalid);
        }

        digits.parse().map(Token::Integer).unwrap_or(Token::Invalid)
    }

    fn try_next_char(&mut self) -> Option<char> {
        match self.src.chars().next() {
            Some(ch) => {
                self.consume(ch.len_utf8());
                Some(ch)
            }
            None => None,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.peek_char_n(0)
    }

    fn peek_char_n(&mut self, n: usize) -> Option<char> {
        self.src.chars().nth(n)
    }

    fn take_if<P>(&mut self, predicate: P) -> Option<char>
    where
        P: FnOnce(char) -> bool,
    {
        match self.peek_char() {
            Some(ch) if predicate(ch) => {
                self.consume(ch.len_utf8());
                Some(ch)
            }
            _ => None,
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(ch) = self.take_if(&predicate) {
            s.push(ch);
        }
        s
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                '/' if self.peek_char_n(1) == Some('*') => {
                    self.consume(2);
                    self.skip_block_comment();
                }
                '-' if self.peek_char_n(1) == Some('-') => self.skip_line_comment(),
                ch if ch.is_whitespace() => self.consume(ch.len_utf8()),
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                '*' => {
                    self.consume(1);

                    if self.peek_char() == Some('/') {
                        self.consume(1);
                        return;
                    }
                }
                _ => self.consume(ch.len_utf8()),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                '\n' => {
                    self.consume(1);
                    return;
                }
                _ => self.consume(ch.len_utf8()),
            }
        }
    }

    /// Advances by `amount` bytes.
    fn consume(&mut self, amount: usize) {
        let (consumed, src) = self.src.split_at(amount);
        self.col += consumed.chars().count();
        self.src = src;
    }
}

fn ident_ch(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        std::iter::from_fn(|| lexer.next().map(|lexeme| lexeme.token)).collect()
    }

    #[test]
    fn lexes_a_query() {
        assert_eq!(
            tokens("SELECT u.id FROM App\\User u WHERE u.id >= ?1 AND u.name <> :name"),
            [
                Token::Ident("SELECT".into()),
                Token::Ident("u".into()),
                Token::Period,
                Token::Ident("id".into()),
                Token::Ident("FROM".into()),
                Token::Ident("App\\User".into()),
                Token::Ident("u".into()),
                Token::Ident("WHERE".into()),
                Token::Ident("u".into()),
                Token::Period,
                Token::Ident("id".into()),
                Token::Ge,
                Token::Positional(1),
                Token::Ident("AND".into()),
                Token::Ident("u".into()),
                Token::Period,
                Token::Ident("name".into()),
                Token::Ne,
                Token::Named("name".into()),
            ]
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            tokens("'it''s' 42 1.5 /* skipped */ -- also skipped\n!="),
            [
                Token::String("it's".into()),
                Token::Integer(42),
                Token::Float(1.5),
                Token::Ne,
            ]
        );
    }

    #[test]
    fn tracks_columns() {
        let mut lexer = Lexer::new("SELECT  çx FORM");
        assert_eq!(lexer.next().unwrap().col, 0);
        assert_eq!(lexer.next().unwrap().col, 8);
        let form = lexer.next().unwrap();
        assert_eq!((form.col, form.text.as_str()), (11, "FORM"));
        assert_eq!(lexer.end(), 15);
    }

    #[test]
    fn unterminated_string_is_invalid() {
        assert_eq!(tokens("'abc"), [Token::Invalid]);
    }
}

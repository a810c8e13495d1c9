#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Integer(i64),
    Float(f64),
    String(String),

    /// `?1`
    Positional(usize),

    /// `:name`
    Named(String),

    Comma,
    Period,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,

    /// Input the lexer cannot make sense of. Reported by the parser.
    Invalid,
}

/// A token with its position and source text.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub(crate) token: Token,

    /// Character offset in the DQL string.
    pub(crate) col: usize,

    pub(crate) text: String,
}

/// Words that can never be used as an identification variable.
const RESERVED: &[&str] = &[
    "AND", "AS", "ASC", "BETWEEN", "BY", "DESC", "DISTINCT", "FALSE", "FROM", "GROUP", "HAVING",
    "HIDDEN", "IN", "INNER", "IS", "JOIN", "LEFT", "LIKE", "NOT", "NULL", "OR", "ORDER", "OUTER",
    "SELECT", "TRUE", "WHERE", "WITH",
];

impl Token {
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident.eq_ignore_ascii_case(keyword))
    }

    pub(crate) fn is_reserved(&self) -> bool {
        RESERVED.iter().any(|keyword| self.is_keyword(keyword))
    }
}

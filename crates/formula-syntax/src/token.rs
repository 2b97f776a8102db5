//! Token kinds, printable names and operator precedence.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Precedence of anything that is not a binary operator.
pub const LOWEST_PREC: u8 = 0;
/// Binding power of prefix operators.
pub const UNARY_PREC: u8 = 6;
pub const HIGHEST_PREC: u8 = 7;

/// Lexical token kinds.
///
/// The variants fall into three bands: literal kinds (which carry a text payload captured by the
/// scanner), operators, and structural punctuation. `Illegal` and `Eof` sit outside all bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Token {
    Illegal,
    Eof,

    // Literals.
    Ident,
    /// Formula lead `=` (first character on its line).
    Frml,
    Bool,
    Cell,
    Err,
    ErrRef,
    Func,
    Rng,
    Ref,
    Sheet,
    Int,
    Float,
    Imag,
    String,

    // Operators.
    Add,
    Sub,
    Mul,
    Quo,
    Exp,
    Land,
    Lor,
    Eql,
    Lss,
    Gtr,
    /// `<>`
    Not,
    Leq,
    Geq,

    // Punctuation.
    LParen,
    LBrack,
    LBrace,
    Comma,
    Period,
    RParen,
    RBrack,
    RBrace,
    Semicolon,
    Colon,
}

const ALL: [Token; 39] = [
    Token::Illegal,
    Token::Eof,
    Token::Ident,
    Token::Frml,
    Token::Bool,
    Token::Cell,
    Token::Err,
    Token::ErrRef,
    Token::Func,
    Token::Rng,
    Token::Ref,
    Token::Sheet,
    Token::Int,
    Token::Float,
    Token::Imag,
    Token::String,
    Token::Add,
    Token::Sub,
    Token::Mul,
    Token::Quo,
    Token::Exp,
    Token::Land,
    Token::Lor,
    Token::Eql,
    Token::Lss,
    Token::Gtr,
    Token::Not,
    Token::Leq,
    Token::Geq,
    Token::LParen,
    Token::LBrack,
    Token::LBrace,
    Token::Comma,
    Token::Period,
    Token::RParen,
    Token::RBrack,
    Token::RBrace,
    Token::Semicolon,
    Token::Colon,
];

impl Token {
    /// Looks a token up by its discriminant.
    #[must_use]
    pub fn from_repr(raw: u8) -> Option<Token> {
        ALL.get(usize::from(raw)).copied()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Token::Illegal => "ILLEGAL",
            Token::Eof => "EOF",

            Token::Ident => "IDENT",
            Token::Frml => "FRML",
            Token::Bool => "BOOL",
            Token::Cell => "CELL",
            Token::Err => "ERR",
            Token::ErrRef => "ERREF",
            Token::Func => "FUNC",
            Token::Rng => "RNG",
            Token::Ref => "REF",
            Token::Sheet => "SHEET",
            Token::Int => "INT",
            Token::Float => "FLOAT",
            Token::Imag => "IMAG",
            Token::String => "STRING",

            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Quo => "/",
            Token::Exp => "^",
            Token::Land => "AND",
            Token::Lor => "OR",
            Token::Eql => "=",
            Token::Lss => "<",
            Token::Gtr => ">",
            Token::Not => "<>",
            Token::Leq => "<=",
            Token::Geq => ">=",

            Token::LParen => "(",
            Token::LBrack => "[",
            Token::LBrace => "{",
            Token::Comma => ",",
            Token::Period => ".",
            Token::RParen => ")",
            Token::RBrack => "]",
            Token::RBrace => "}",
            Token::Semicolon => ";",
            Token::Colon => ":",
        }
    }

    /// Maps a single character to its operator or punctuation token.
    ///
    /// Characters that never start a token on their own map to [`Token::Illegal`]. Multi-character
    /// operators (`<=`, `>=`, `<>`) and `=` are resolved by the scanner, not here.
    #[must_use]
    pub fn single_char(ch: char) -> Token {
        match ch {
            '+' => Token::Add,
            '-' => Token::Sub,
            '*' => Token::Mul,
            '/' => Token::Quo,
            '^' => Token::Exp,

            '(' => Token::LParen,
            '[' => Token::LBrack,
            '{' => Token::LBrace,
            ',' => Token::Comma,
            '.' => Token::Period,

            ')' => Token::RParen,
            ']' => Token::RBrack,
            '}' => Token::RBrace,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            _ => Token::Illegal,
        }
    }

    /// Binary operator precedence; [`LOWEST_PREC`] for everything that is not a binary operator.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Token::Lor => 1,
            Token::Land => 2,
            Token::Eql | Token::Lss | Token::Leq | Token::Gtr | Token::Geq | Token::Not => 3,
            Token::Add | Token::Sub => 4,
            Token::Mul | Token::Quo => 5,
            _ => LOWEST_PREC,
        }
    }

    #[must_use]
    pub fn is_literal(self) -> bool {
        Token::Ident <= self && self <= Token::String
    }

    #[must_use]
    pub fn is_operator(self) -> bool {
        Token::Add <= self && self <= Token::Colon
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Printable name for a raw token discriminant.
///
/// Never fails: values outside the catalog render as `token(N)`.
#[must_use]
pub fn token_name(raw: u8) -> Cow<'static, str> {
    match Token::from_repr(raw) {
        Some(tok) => Cow::Borrowed(tok.as_str()),
        None => Cow::Owned(format!("token({raw})")),
    }
}

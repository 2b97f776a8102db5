#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Syntax front end for spreadsheet formulas.
//!
//! Raw formula bytes are turned into a syntax tree in one pull-based pass: the [`Scanner`]
//! produces one [`Lexeme`] per call, and the parser consumes them to build an [`Expr`] tree.
//! Parsing is best-effort. Malformed input yields [`Expr::Bad`] placeholders, and every lexical
//! and syntactic problem is collected as a [`Diagnostic`] instead of aborting.
//!
//! ```
//! use formula_syntax::{parse_formula, Expr};
//!
//! let parsed = parse_formula("=SUM(A1:D3, 2)");
//! assert!(parsed.is_ok());
//! assert!(matches!(parsed.root, Expr::Call(_)));
//!
//! let parsed = parse_formula("(1+2");
//! assert_eq!(
//!     parsed.error.map(|e| e.to_string()).as_deref(),
//!     Some("4: expected ')', found 'EOF'")
//! );
//! ```
//!
//! Positions ([`Pos`]) are 1-based byte offsets with `0` meaning "no position"; diagnostic
//! offsets are 0-based. [`Position::locate`] turns either into a line and column.

pub mod ast;
pub mod error;
pub mod parser;
pub mod position;
pub mod scanner;
pub mod token;
pub mod walk;

pub use crate::ast::{
    BadExpr, BasicLit, BinaryExpr, CallExpr, Expr, Field, FieldList, Ident, Node, ParenExpr,
    Spanned, UnaryExpr,
};
pub use crate::error::{Diagnostic, DiagnosticList, ErrorHandler, ParseErrors};
pub use crate::parser::{
    parse_bytes, parse_bytes_with_options, parse_formula, parse_parameters, ParseOptions, Parsed,
};
pub use crate::position::{Pos, Position, Span, NO_POS};
pub use crate::scanner::{lex, Lexed, Lexeme, Scanner};
pub use crate::token::{token_name, Token};
pub use crate::walk::{inspect, walk, Visitor, Walk};

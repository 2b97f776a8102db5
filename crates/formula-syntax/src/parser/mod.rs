//! Recursive-descent formula parser with precedence climbing for binary operators.
//!
//! The parser never fails: malformed input produces [`BadExpr`](crate::ast::BadExpr) placeholders
//! and diagnostics, and parsing continues from the current token. Diagnostics from the scanner and
//! the parser share one list, which is sorted before it is handed back in [`Parsed::error`].

use std::mem;

use crate::ast::{BasicLit, CallExpr, Expr, Field, FieldList, Ident, ParenExpr, Spanned};
use crate::ast::{BinaryExpr, UnaryExpr};
use crate::error::{Diagnostic, DiagnosticList, ParseErrors};
use crate::position::{Pos, NO_POS};
use crate::scanner::{Lexeme, Scanner};
use crate::token::{Token, LOWEST_PREC};

const TRACE_TARGET: &str = "formula_syntax::parser";

/// Maximum depth of nested parentheses, calls and prefix operators.
pub const MAX_NESTING: usize = 64;

/// Longest accepted source, in characters (Excel's formula length limit).
///
/// Operator chains and call suffixes are parsed in a loop but build a tree as deep as the chain is
/// long. Every traversal of that tree (positions, walking, equality, drop) recurses per level, so
/// the input length is what bounds its depth.
pub const MAX_FORMULA_CHARS: usize = 8_192;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Emit a `trace` event for every grammar production and every consumed token.
    pub trace: bool,
}

/// Result of a best-effort parse.
///
/// `root` is always present; it may contain [`Expr::Bad`] nodes when `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub root: T,
    pub error: Option<ParseErrors>,
}

impl<T> Parsed<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Recorded diagnostics, ordered by offset.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.error {
            Some(err) => err.diagnostics(),
            None => &[],
        }
    }

    pub fn into_result(self) -> Result<T, ParseErrors> {
        match self.error {
            None => Ok(self.root),
            Some(err) => Err(err),
        }
    }
}

/// Parses a single formula. A leading `=` is skipped.
#[must_use]
pub fn parse_bytes(source: &[u8]) -> Parsed<Expr> {
    parse_bytes_with_options(source, &ParseOptions::default())
}

#[must_use]
pub fn parse_bytes_with_options(source: &[u8], opts: &ParseOptions) -> Parsed<Expr> {
    if let Some(error) = length_error(source) {
        return Parsed {
            root: Expr::bad(Pos::from_offset(0), Pos::from_offset(source.len())),
            error: Some(error),
        };
    }
    let mut parser = Parser::new(source, opts);
    let root = parser.traced("Formula", |p| {
        if p.tok == Token::Frml {
            p.next();
        }
        let x = p.parse_expr();
        p.expect_end();
        x
    });
    parser.finish(root)
}

#[must_use]
pub fn parse_formula(formula: &str) -> Parsed<Expr> {
    parse_bytes(formula.as_bytes())
}

/// Parses a parenthesized, comma-separated parameter list such as `(A1, B2:C3, 1+2)`.
///
/// Every entry becomes an unnamed [`Field`]. A trailing comma before `)` is accepted.
#[must_use]
pub fn parse_parameters(source: &[u8], opts: &ParseOptions) -> Parsed<FieldList> {
    if let Some(error) = length_error(source) {
        return Parsed {
            root: FieldList::default(),
            error: Some(error),
        };
    }
    let mut parser = Parser::new(source, opts);
    let root = parser.parse_parameters();
    parser.expect_end();
    parser.finish(root)
}

/// Rejects sources over [`MAX_FORMULA_CHARS`]. Characters are counted as UTF-8 lead bytes, so a
/// stray continuation byte does not count.
fn length_error(source: &[u8]) -> Option<ParseErrors> {
    let chars = source.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
    if chars <= MAX_FORMULA_CHARS {
        return None;
    }
    log::debug!(target: TRACE_TARGET, "rejecting {chars}-character formula");
    let mut diagnostics = DiagnosticList::new();
    diagnostics.add(
        0,
        format!("formula exceeds the {MAX_FORMULA_CHARS}-character limit (got {chars})"),
    );
    diagnostics.into_error()
}

fn is_value_kind(kind: Token) -> bool {
    matches!(
        kind,
        Token::Int | Token::Float | Token::Imag | Token::String | Token::Ref | Token::Rng
    )
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    trace: bool,
    /// Trace indentation.
    depth: usize,
    nesting: usize,

    // Lookahead.
    pos: Pos,
    tok: Token,
    lit: String,
}

impl<'a> Parser<'a> {
    fn new(source: &'a [u8], opts: &ParseOptions) -> Self {
        let mut parser = Self {
            scanner: Scanner::with_diagnostics(source),
            trace: opts.trace,
            depth: 0,
            nesting: 0,
            pos: NO_POS,
            tok: Token::Illegal,
            lit: String::new(),
        };
        parser.next();
        parser
    }

    fn finish<T>(self, root: T) -> Parsed<T> {
        let mut diagnostics = self.scanner.into_handler();
        diagnostics.sort();
        Parsed {
            root,
            error: diagnostics.into_error(),
        }
    }

    fn traced<T>(&mut self, production: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        if !self.trace {
            return f(self);
        }
        let indent = 2 * self.depth;
        log::trace!(target: TRACE_TARGET, "{:.<indent$}{production} (", "");
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        log::trace!(target: TRACE_TARGET, "{:.<indent$})", "");
        out
    }

    fn next(&mut self) {
        if self.trace && self.pos.is_valid() {
            let indent = 2 * self.depth;
            if self.tok.is_literal() {
                log::trace!(target: TRACE_TARGET, "{:.<indent$}{} {}", "", self.tok, self.lit);
            } else if self.tok.is_operator() {
                log::trace!(target: TRACE_TARGET, "{:.<indent$}\"{}\"", "", self.tok);
            } else {
                log::trace!(target: TRACE_TARGET, "{:.<indent$}{}", "", self.tok);
            }
        }

        let Lexeme {
            pos,
            token,
            literal,
        } = self.scanner.scan();
        self.pos = pos;
        self.tok = token;
        self.lit = literal;
    }

    fn error(&mut self, pos: Pos, msg: impl Into<String>) {
        let offset = pos.offset().unwrap_or(0);
        self.scanner.handler_mut().add(offset, msg);
    }

    /// Describes the lookahead token for an "expected X, found Y" message.
    fn found(&self) -> String {
        if self.scanner.newline_before() {
            "newline".to_string()
        } else if self.tok.is_literal() && !self.lit.is_empty() {
            self.lit.clone()
        } else {
            format!("'{}'", self.tok)
        }
    }

    fn error_expected(&mut self, pos: Pos, what: &str) {
        let mut msg = format!("expected {what}");
        if pos == self.pos {
            msg.push_str(", found ");
            msg.push_str(&self.found());
        }
        self.error(pos, msg);
    }

    /// Consumes the lookahead, reporting a diagnostic if it is not `tok`.
    fn expect(&mut self, tok: Token) -> Pos {
        let pos = self.pos;
        if self.tok != tok {
            self.error_expected(pos, &format!("'{tok}'"));
        }
        self.next();
        pos
    }

    fn expect_closing(&mut self, tok: Token, context: &str) -> Pos {
        if self.tok != tok && self.scanner.newline_before() {
            let pos = self.pos;
            self.error(pos, format!("missing ',' before newline in {context}"));
            self.next();
            return pos;
        }
        self.expect(tok)
    }

    fn expect_end(&mut self) {
        if self.tok != Token::Eof {
            let pos = self.pos;
            self.error_expected(pos, "end of formula");
        }
    }

    /// Whether another list element follows. A stray token in place of the comma is reported and
    /// then treated as one.
    fn at_comma(&mut self, context: &str, follow: Token) -> bool {
        if self.tok == Token::Comma {
            return true;
        }
        if self.tok != follow && self.tok != Token::Eof {
            let pos = self.pos;
            self.error(pos, format!("missing ',' in {context}"));
            return true;
        }
        false
    }

    /// Replaces literals that cannot stand as expressions with a [`Expr::Bad`].
    ///
    /// `parse_operand` only builds value-kind literals, so this fires for trees assembled by
    /// hand; parsed calls, identifiers and parentheses pass through unchanged.
    fn check_expr(&mut self, x: Expr) -> Expr {
        let invalid = matches!(x.unparen(), Expr::BasicLit(lit) if !is_value_kind(lit.kind));
        if !invalid {
            return x;
        }
        let (pos, end) = (x.pos(), x.end());
        self.error_expected(pos, "expression");
        Expr::bad(pos, end)
    }

    fn parse_ident(&mut self) -> Ident {
        let name_pos = self.pos;
        let name = mem::take(&mut self.lit);
        self.next();
        Ident { name_pos, name }
    }

    fn parse_operand(&mut self) -> Expr {
        self.traced("Operand", |p| match p.tok {
            Token::Ident => Expr::Ident(p.parse_ident()),
            kind if is_value_kind(kind) => {
                let lit = BasicLit {
                    value_pos: p.pos,
                    kind,
                    value: mem::take(&mut p.lit),
                };
                p.next();
                Expr::BasicLit(lit)
            }
            Token::LParen => {
                let lparen = p.pos;
                p.next();
                let x = p.parse_rhs();
                let rparen = p.expect(Token::RParen);
                Expr::Paren(ParenExpr {
                    lparen,
                    x: Box::new(x),
                    rparen,
                })
            }
            _ => {
                let pos = p.pos;
                p.error_expected(pos, "operand");
                Expr::bad(pos, p.pos)
            }
        })
    }

    fn parse_call(&mut self, fun: Expr) -> Expr {
        self.traced("Call", |p| {
            let lparen = p.expect(Token::LParen);
            let mut args = Vec::new();
            while p.tok != Token::RParen && p.tok != Token::Eof {
                args.push(p.parse_rhs());
                if !p.at_comma("argument list", Token::RParen) {
                    break;
                }
                p.next();
            }
            let rparen = p.expect_closing(Token::RParen, "argument list");
            Expr::Call(CallExpr {
                fun: Box::new(fun),
                lparen,
                args,
                rparen,
            })
        })
    }

    fn parse_primary_expr(&mut self) -> Expr {
        self.traced("PrimaryExpr", |p| {
            let mut x = p.parse_operand();
            while p.tok == Token::LParen {
                let fun = p.check_expr(x);
                x = p.parse_call(fun);
            }
            x
        })
    }

    fn parse_unary_expr(&mut self) -> Expr {
        self.traced("UnaryExpr", |p| {
            if p.nesting >= MAX_NESTING {
                let pos = p.pos;
                p.error(pos, format!("expression nesting exceeds {MAX_NESTING} levels"));
                return Expr::bad(pos, pos);
            }
            p.nesting += 1;
            let x = match p.tok {
                Token::Add | Token::Sub | Token::Not | Token::Mul => {
                    let (op_pos, op) = (p.pos, p.tok);
                    p.next();
                    let x = p.parse_unary_expr();
                    Expr::Unary(UnaryExpr {
                        op_pos,
                        op,
                        x: Box::new(p.check_expr(x)),
                    })
                }
                _ => p.parse_primary_expr(),
            };
            p.nesting -= 1;
            x
        })
    }

    fn parse_binary_expr(&mut self, prec1: u8) -> Expr {
        self.traced("BinaryExpr", |p| {
            let mut x = p.parse_unary_expr();
            loop {
                let (op, oprec) = (p.tok, p.tok.precedence());
                if oprec < prec1 {
                    return x;
                }
                let op_pos = p.expect(op);
                let y = p.parse_binary_expr(oprec + 1);
                let x_checked = p.check_expr(x);
                let y_checked = p.check_expr(y);
                x = Expr::Binary(BinaryExpr {
                    x: Box::new(x_checked),
                    op_pos,
                    op,
                    y: Box::new(y_checked),
                });
            }
        })
    }

    fn parse_expr(&mut self) -> Expr {
        self.traced("Expression", |p| p.parse_binary_expr(LOWEST_PREC + 1))
    }

    fn parse_rhs(&mut self) -> Expr {
        let x = self.parse_expr();
        self.check_expr(x)
    }

    fn parse_parameter_list(&mut self) -> Vec<Field> {
        self.traced("ParameterList", |p| {
            let mut list = Vec::new();
            loop {
                list.push(Field {
                    names: Vec::new(),
                    ty: p.parse_expr(),
                    tag: None,
                });
                if p.tok != Token::Comma {
                    break;
                }
                p.next();
                if p.tok == Token::RParen {
                    break;
                }
            }
            list
        })
    }

    fn parse_parameters(&mut self) -> FieldList {
        self.traced("Parameters", |p| {
            let opening = p.expect(Token::LParen);
            let list = if p.tok != Token::RParen {
                p.parse_parameter_list()
            } else {
                Vec::new()
            };
            let closing = p.expect(Token::RParen);
            FieldList {
                opening,
                list,
                closing,
            }
        })
    }
}

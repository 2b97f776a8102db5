//! Formula scanner.
//!
//! A single-pass, char-at-a-time state machine over an in-memory byte buffer. The scanner is
//! pull-based: every call to [`Scanner::scan`] returns exactly one [`Lexeme`]. Problems are
//! reported through an [`ErrorHandler`] and never stop scanning.

use crate::error::{DiagnosticList, ErrorHandler};
use crate::position::{Pos, Position};
use crate::token::Token;
use serde::{Deserialize, Serialize};

/// A scanned token: start position, kind, and literal text.
///
/// `literal` is the raw source text for literal kinds (and for `ILLEGAL`), empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexeme {
    pub pos: Pos,
    pub token: Token,
    pub literal: String,
}

pub struct Scanner<'a, H = DiagnosticList> {
    src: &'a [u8],
    handler: H,

    /// Current char, `None` at end of input.
    ch: Option<char>,
    /// Offset of `ch`.
    offset: usize,
    /// Offset just past `ch`.
    rd_offset: usize,
    /// Offset at which the line holding `ch` starts.
    line_offset: usize,
    line_starts: Vec<usize>,
    newline_before: bool,
    prev: Token,
}

impl<'a, H: ErrorHandler> Scanner<'a, H> {
    pub fn new(src: &'a [u8], handler: H) -> Self {
        let mut scanner = Self {
            src,
            handler,
            ch: None,
            offset: 0,
            rd_offset: 0,
            line_offset: 0,
            line_starts: vec![0],
            newline_before: false,
            prev: Token::Illegal,
        };
        scanner.next();
        scanner
    }

    pub fn source(&self) -> &'a [u8] {
        self.src
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Whether a line break was skipped before the most recently scanned token.
    pub fn newline_before(&self) -> bool {
        self.newline_before
    }

    /// Kind of the most recently scanned token (`ILLEGAL` before the first scan).
    pub fn prev_token(&self) -> Token {
        self.prev
    }

    /// Line/column for `pos`, or `None` for the "no position" sentinel.
    pub fn position(&self, pos: Pos) -> Option<Position> {
        let offset = pos.offset()?;
        if offset <= self.offset {
            Some(Position::from_line_starts(&self.line_starts, offset))
        } else {
            // Not scanned yet; the line table doesn't reach that far.
            Some(Position::locate(self.src, offset))
        }
    }

    /// Scans the next token.
    pub fn scan(&mut self) -> Lexeme {
        self.newline_before = false;
        self.skip_whitespace();

        let start = self.offset;
        let pos = Pos::from_offset(start);

        let (token, literal) = match self.ch {
            None => (Token::Eof, String::new()),
            Some(ch) if is_letter(ch) => self.scan_word(),
            Some(ch)
                if ch.is_ascii_digit()
                    || (ch == '.' && self.peek().is_some_and(|b| b.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            Some(ch) => {
                self.next();
                match ch {
                    '=' => {
                        if start == self.line_offset {
                            (Token::Frml, String::new())
                        } else {
                            (Token::Eql, String::new())
                        }
                    }
                    '"' => (Token::String, self.scan_string(start)),
                    '<' => match self.ch {
                        Some('=') => {
                            self.next();
                            (Token::Leq, String::new())
                        }
                        Some('>') => {
                            self.next();
                            (Token::Not, String::new())
                        }
                        _ => (Token::Lss, String::new()),
                    },
                    '>' => (self.switch2(Token::Gtr, Token::Geq), String::new()),
                    _ => match Token::single_char(ch) {
                        Token::Illegal => {
                            // NUL and undecodable bytes were already reported by `next`.
                            if ch != '\0' && ch != char::REPLACEMENT_CHARACTER {
                                self.error(
                                    start,
                                    &format!("illegal character U+{:04X} {ch:?}", u32::from(ch)),
                                );
                            }
                            (Token::Illegal, ch.to_string())
                        }
                        tok => (tok, String::new()),
                    },
                }
            }
        };

        self.prev = token;
        Lexeme {
            pos,
            token,
            literal,
        }
    }

    fn next(&mut self) {
        if self.rd_offset < self.src.len() {
            self.offset = self.rd_offset;
            if self.ch == Some('\n') {
                self.line_offset = self.offset;
                self.line_starts.push(self.offset);
            }
            let (ch, width) = match self.src[self.rd_offset] {
                0 => {
                    self.error(self.offset, "illegal character NUL");
                    ('\0', 1)
                }
                b if b.is_ascii() => (char::from(b), 1),
                _ => match decode_char(&self.src[self.rd_offset..]) {
                    Some(decoded) => decoded,
                    None => {
                        self.error(self.offset, "illegal UTF-8 encoding");
                        (char::REPLACEMENT_CHARACTER, 1)
                    }
                },
            };
            self.rd_offset += width;
            self.ch = Some(ch);
        } else {
            self.offset = self.src.len();
            if self.ch == Some('\n') {
                self.line_offset = self.offset;
                self.line_starts.push(self.offset);
            }
            self.ch = None;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.rd_offset).copied()
    }

    fn error(&mut self, offset: usize, msg: &str) {
        self.handler.report(offset, msg);
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch @ (' ' | '\t' | '\n' | '\r')) = self.ch {
            if ch == '\n' {
                self.newline_before = true;
            }
            self.next();
        }
    }

    fn switch2(&mut self, tok0: Token, tok1: Token) -> Token {
        if self.ch == Some('=') {
            self.next();
            tok1
        } else {
            tok0
        }
    }

    fn scan_word(&mut self) -> (Token, String) {
        let (mut lit, is_ref) = self.scan_identifier();
        let tok = if self.ch == Some('(') {
            Token::Ident
        } else if is_ref {
            if self.ch == Some(':') && self.reference_after_colon() {
                self.next(); // ':'
                let (rest, _) = self.scan_identifier();
                lit.push(':');
                lit.push_str(&rest);
                Token::Rng
            } else {
                Token::Ref
            }
        } else {
            Token::Ident
        };

        log::trace!(
            target: "formula_syntax::scanner",
            "{lit:?} classified as {tok} (previous token {})",
            self.prev
        );

        (tok, lit)
    }

    /// Consumes a run of letters and digits. Returns the run and whether it is shaped like a cell
    /// reference.
    fn scan_identifier(&mut self) -> (String, bool) {
        let offs = self.offset;
        while self.ch.is_some_and(|c| is_letter(c) || is_digit(c)) {
            self.next();
        }
        let run = &self.src[offs..self.offset];
        (lossy(run), is_reference_shape(run))
    }

    /// With `ch == ':'`, checks whether the run after the colon is reference-shaped without
    /// consuming anything.
    fn reference_after_colon(&self) -> bool {
        let start = self.rd_offset;
        let mut end = start;
        while let Some((c, width)) = self.src.get(end..).and_then(decode_char) {
            if !(is_letter(c) || is_digit(c)) {
                break;
            }
            end += width;
        }
        is_reference_shape(&self.src[start..end])
    }

    fn digits(&mut self, base: u32, invalid: &mut Option<usize>) -> u8 {
        let mut digsep = 0;
        if base <= 10 {
            let max = char::from_digit(base, 10).unwrap_or(':');
            while let Some(ch) = self.ch.filter(|&c| c.is_ascii_digit() || c == '_') {
                let ds = if ch == '_' {
                    2
                } else {
                    if ch >= max && invalid.is_none() {
                        *invalid = Some(self.offset);
                    }
                    1
                };
                digsep |= ds;
                self.next();
            }
        } else {
            while let Some(ch) = self.ch.filter(|&c| c.is_ascii_hexdigit() || c == '_') {
                digsep |= if ch == '_' { 2 } else { 1 };
                self.next();
            }
        }
        digsep
    }

    fn scan_number(&mut self) -> (Token, String) {
        let offs = self.offset;
        let mut tok = Token::Illegal;

        let mut base = 10;
        let mut prefix = Prefix::None;
        // Bit 0: a digit was seen. Bit 1: a separator was seen.
        let mut digsep = 0u8;
        let mut invalid = None;

        // Integer part.
        if self.ch != Some('.') {
            tok = Token::Int;
            if self.ch == Some('0') {
                self.next();
                match self.ch.map(|c| c.to_ascii_lowercase()) {
                    Some('x') => {
                        self.next();
                        (base, prefix) = (16, Prefix::Hex);
                    }
                    Some('o') => {
                        self.next();
                        (base, prefix) = (8, Prefix::Octal);
                    }
                    Some('b') => {
                        self.next();
                        (base, prefix) = (2, Prefix::Binary);
                    }
                    _ => {
                        (base, prefix) = (8, Prefix::LeadingZero);
                        digsep = 1;
                    }
                }
            }
            digsep |= self.digits(base, &mut invalid);
        }

        // Fractional part.
        if self.ch == Some('.') {
            tok = Token::Float;
            if matches!(prefix, Prefix::Octal | Prefix::Binary) {
                self.error(
                    self.offset,
                    &format!("invalid radix point in {}", prefix.literal_name()),
                );
            }
            self.next();
            digsep |= self.digits(base, &mut invalid);
        }

        if digsep & 1 == 0 {
            self.error(
                self.offset,
                &format!("{} has no digits", prefix.literal_name()),
            );
        }

        // Exponent.
        match self.ch {
            Some(e) if matches!(e.to_ascii_lowercase(), 'e' | 'p') => {
                let lower = e.to_ascii_lowercase();
                if lower == 'e' && !matches!(prefix, Prefix::None | Prefix::LeadingZero) {
                    self.error(
                        self.offset,
                        &format!("{e:?} exponent requires decimal mantissa"),
                    );
                } else if lower == 'p' && prefix != Prefix::Hex {
                    self.error(
                        self.offset,
                        &format!("{e:?} exponent requires hexadecimal mantissa"),
                    );
                }
                self.next();
                tok = Token::Float;
                if matches!(self.ch, Some('+' | '-')) {
                    self.next();
                }
                let ds = self.digits(10, &mut None);
                digsep |= ds;
                if ds & 1 == 0 {
                    self.error(self.offset, "exponent has no digits");
                }
            }
            _ if prefix == Prefix::Hex && tok == Token::Float => {
                self.error(self.offset, "hexadecimal mantissa requires a 'p' exponent");
            }
            _ => {}
        }

        // Imaginary suffix.
        if self.ch == Some('i') {
            tok = Token::Imag;
            self.next();
        }

        let lit = &self.src[offs..self.offset];
        if tok == Token::Int {
            if let Some(at) = invalid {
                let digit = char::from(self.src[at]);
                self.error(
                    at,
                    &format!("invalid digit {digit:?} in {}", prefix.literal_name()),
                );
            }
        }
        if digsep & 2 != 0 {
            if let Some(i) = invalid_separator(lit) {
                self.error(offs + i, "'_' must separate successive digits");
            }
        }

        (tok, lossy(lit))
    }

    /// Scans the remainder of a string literal. `start` is the offset of the opening quote, which
    /// has already been consumed. A doubled quote does not terminate the literal.
    fn scan_string(&mut self, start: usize) -> String {
        loop {
            match self.ch {
                None | Some('\n') => {
                    self.error(start, "string literal not terminated");
                    break;
                }
                Some('"') => {
                    self.next();
                    if self.ch == Some('"') {
                        self.next();
                        continue;
                    }
                    break;
                }
                Some(_) => self.next(),
            }
        }
        lossy(&self.src[start..self.offset])
    }
}

impl<'a> Scanner<'a, DiagnosticList> {
    /// Scanner that collects its diagnostics into a fresh [`DiagnosticList`].
    pub fn with_diagnostics(src: &'a [u8]) -> Self {
        Self::new(src, DiagnosticList::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    /// A bare leading `0`: digits are validated as octal.
    LeadingZero,
    Hex,
    Octal,
    Binary,
}

impl Prefix {
    fn literal_name(self) -> &'static str {
        match self {
            Prefix::Hex => "hexadecimal literal",
            Prefix::Octal => "octal literal",
            Prefix::Binary => "binary literal",
            Prefix::None | Prefix::LeadingZero => "decimal literal",
        }
    }
}

/// Index of the first `_` in `lit` that does not sit strictly between two digits.
fn invalid_separator(lit: &[u8]) -> Option<usize> {
    let mut x1 = b' ';
    // Class of the previous char: b'0' digit, b'_' separator, b'.' anything else.
    let mut d = b'.';
    let mut i = 0;

    if lit.len() >= 2 && lit[0] == b'0' {
        x1 = lit[1].to_ascii_lowercase();
        if matches!(x1, b'x' | b'o' | b'b') {
            i = 2;
        }
    }

    while i < lit.len() {
        let p = d;
        d = lit[i];
        if d == b'_' {
            if p != b'0' {
                return Some(i);
            }
        } else if d.is_ascii_digit() || (x1 == b'x' && d.is_ascii_hexdigit()) {
            d = b'0';
        } else {
            if p == b'_' {
                return Some(i - 1);
            }
            d = b'.';
        }
        i += 1;
    }

    (d == b'_').then(|| lit.len() - 1)
}

/// The scanned tokens of a whole source, plus its sorted diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexed {
    /// Every lexeme up to and including the terminating `EOF`.
    pub tokens: Vec<Lexeme>,
    pub diagnostics: DiagnosticList,
}

/// Scans `source` to the end.
pub fn lex(source: &[u8]) -> Lexed {
    let mut scanner = Scanner::with_diagnostics(source);
    let mut tokens = Vec::new();
    loop {
        let lexeme = scanner.scan();
        let done = lexeme.token == Token::Eof;
        tokens.push(lexeme);
        if done {
            break;
        }
    }
    let mut diagnostics = scanner.into_handler();
    diagnostics.sort();
    Lexed {
        tokens,
        diagnostics,
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || (!ch.is_ascii() && ch.is_alphabetic())
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit() || (!ch.is_ascii() && ch.is_numeric())
}

/// One ASCII letter, optionally followed by one ASCII digit (`A`, `B7`).
fn is_reference_shape(run: &[u8]) -> bool {
    match run {
        [col] => col.is_ascii_alphabetic(),
        [col, row] => col.is_ascii_alphabetic() && row.is_ascii_digit(),
        _ => false,
    }
}

/// Decodes the UTF-8 char at the start of `bytes`, with its width.
fn decode_char(bytes: &[u8]) -> Option<(char, usize)> {
    let chunk = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(chunk) {
        Ok(s) => s,
        Err(err) => std::str::from_utf8(&chunk[..err.valid_up_to()]).ok()?,
    };
    valid.chars().next().map(|c| (c, c.len_utf8()))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_all(src: &str) -> (Vec<(Token, String)>, Vec<(usize, String)>) {
        let lexed = lex(src.as_bytes());
        let tokens = lexed
            .tokens
            .into_iter()
            .filter(|l| l.token != Token::Eof)
            .map(|l| (l.token, l.literal))
            .collect();
        let diags = lexed
            .diagnostics
            .into_vec()
            .into_iter()
            .map(|d| (d.offset, d.message))
            .collect();
        (tokens, diags)
    }

    fn single(src: &str) -> (Token, String) {
        let (tokens, _) = scan_all(src);
        assert_eq!(tokens.len(), 1, "{src:?} -> {tokens:?}");
        tokens.into_iter().next().unwrap()
    }

    fn messages(src: &str) -> Vec<(usize, String)> {
        scan_all(src).1
    }

    #[test]
    fn invalid_separator_positions() {
        assert_eq!(invalid_separator(b"1_000"), None);
        assert_eq!(invalid_separator(b"1__0"), Some(2));
        assert_eq!(invalid_separator(b"1_"), Some(1));
        assert_eq!(invalid_separator(b"1_.5"), Some(1));
        assert_eq!(invalid_separator(b"1._5"), Some(2));
        assert_eq!(invalid_separator(b"0x_1"), Some(2));
        assert_eq!(invalid_separator(b"0x1_f"), None);
        assert_eq!(invalid_separator(b"0b1_0"), None);
        assert_eq!(invalid_separator(b"1e1_0"), None);
    }

    #[test]
    fn reference_shapes() {
        assert!(is_reference_shape(b"A"));
        assert!(is_reference_shape(b"d3"));
        assert!(!is_reference_shape(b"AB"));
        assert!(!is_reference_shape(b"A10"));
        assert!(!is_reference_shape(b"_1"));
        assert!(!is_reference_shape(b""));
    }

    #[test]
    fn decode_char_handles_truncated_sequences() {
        assert_eq!(decode_char("é".as_bytes()), Some(('é', 2)));
        assert_eq!(decode_char(&[0xC3]), None);
        assert_eq!(decode_char(&[0xFF, b'a']), None);
        assert_eq!(decode_char(b""), None);
    }

    #[test]
    fn numbers_with_prefixes() {
        assert_eq!(single("0x1F"), (Token::Int, "0x1F".to_string()));
        assert_eq!(single("0o17"), (Token::Int, "0o17".to_string()));
        assert_eq!(single("0b101"), (Token::Int, "0b101".to_string()));
        assert_eq!(single("0x1.8p3"), (Token::Float, "0x1.8p3".to_string()));
        assert_eq!(single("1e10"), (Token::Float, "1e10".to_string()));
        assert_eq!(single("2.5E-3"), (Token::Float, "2.5E-3".to_string()));
        assert_eq!(single(".5"), (Token::Float, ".5".to_string()));
        assert_eq!(single("3i"), (Token::Imag, "3i".to_string()));
        assert_eq!(single("1_000"), (Token::Int, "1_000".to_string()));
        assert!(messages("0x1.8p3").is_empty());
        assert!(messages("1_000").is_empty());
    }

    #[test]
    fn number_diagnostics() {
        assert_eq!(
            messages("0b102"),
            vec![(4, "invalid digit '2' in binary literal".to_string())]
        );
        assert_eq!(
            messages("0o8"),
            vec![(2, "invalid digit '8' in octal literal".to_string())]
        );
        assert_eq!(
            messages("09"),
            vec![(1, "invalid digit '9' in decimal literal".to_string())]
        );
        assert_eq!(
            messages("0b1.1"),
            vec![(3, "invalid radix point in binary literal".to_string())]
        );
        assert_eq!(
            messages("0x"),
            vec![(2, "hexadecimal literal has no digits".to_string())]
        );
        assert_eq!(
            messages("0x1.8"),
            vec![(5, "hexadecimal mantissa requires a 'p' exponent".to_string())]
        );
        assert_eq!(
            messages("1p3"),
            vec![(1, "'p' exponent requires hexadecimal mantissa".to_string())]
        );
        assert_eq!(
            messages("0o1e3"),
            vec![(3, "'e' exponent requires decimal mantissa".to_string())]
        );
        assert_eq!(
            messages("1e+"),
            vec![(3, "exponent has no digits".to_string())]
        );
        assert_eq!(
            messages("1__0"),
            vec![(2, "'_' must separate successive digits".to_string())]
        );
        assert_eq!(
            messages("12_"),
            vec![(2, "'_' must separate successive digits".to_string())]
        );
    }

    #[test]
    fn invalid_digit_in_float_is_accepted() {
        // Leading zero only validates octal digits for integers.
        assert_eq!(single("09.5"), (Token::Float, "09.5".to_string()));
        assert!(messages("09.5").is_empty());
    }

    #[test]
    fn scanning_continues_after_number_diagnostics() {
        let (tokens, diags) = scan_all("0b12+A1");
        assert_eq!(
            tokens,
            vec![
                (Token::Int, "0b12".to_string()),
                (Token::Add, String::new()),
                (Token::Ref, "A1".to_string()),
            ]
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn strings() {
        assert_eq!(single("\"abc\""), (Token::String, "\"abc\"".to_string()));
        assert_eq!(
            single("\"say \"\"hi\"\"\""),
            (Token::String, "\"say \"\"hi\"\"\"".to_string())
        );
        assert_eq!(single("\"\""), (Token::String, "\"\"".to_string()));
    }

    #[test]
    fn unterminated_string_returns_partial_text() {
        let (tokens, diags) = scan_all("1+\"abc");
        assert_eq!(tokens[2], (Token::String, "\"abc".to_string()));
        assert_eq!(diags, vec![(2, "string literal not terminated".to_string())]);

        let (tokens, diags) = scan_all("\"ab\ncd\"");
        assert_eq!(tokens[0], (Token::String, "\"ab".to_string()));
        assert_eq!(diags[0], (0, "string literal not terminated".to_string()));
    }

    #[test]
    fn words() {
        assert_eq!(single("A1"), (Token::Ref, "A1".to_string()));
        assert_eq!(single("b"), (Token::Ref, "b".to_string()));
        assert_eq!(single("A1:D3"), (Token::Rng, "A1:D3".to_string()));
        assert_eq!(single("SUM"), (Token::Ident, "SUM".to_string()));
        assert_eq!(single("AB12"), (Token::Ident, "AB12".to_string()));
        assert_eq!(single("_x"), (Token::Ident, "_x".to_string()));
        assert_eq!(single("größe"), (Token::Ident, "größe".to_string()));
    }

    #[test]
    fn reference_followed_by_paren_is_identifier() {
        let (tokens, _) = scan_all("A(1)");
        assert_eq!(tokens[0], (Token::Ident, "A".to_string()));
        assert_eq!(tokens[1], (Token::LParen, String::new()));
    }

    #[test]
    fn colon_without_reference_is_not_merged() {
        let (tokens, _) = scan_all("A1:FOO");
        assert_eq!(
            tokens,
            vec![
                (Token::Ref, "A1".to_string()),
                (Token::Colon, String::new()),
                (Token::Ident, "FOO".to_string()),
            ]
        );

        let (tokens, _) = scan_all("A1:");
        assert_eq!(
            tokens,
            vec![(Token::Ref, "A1".to_string()), (Token::Colon, String::new())]
        );
    }

    #[test]
    fn equals_is_formula_lead_only_at_line_start() {
        let (tokens, _) = scan_all("=A1=1");
        assert_eq!(tokens[0].0, Token::Frml);
        assert_eq!(tokens[2].0, Token::Eql);

        let (tokens, _) = scan_all("1\n=2");
        assert_eq!(tokens[1].0, Token::Frml);

        let (tokens, _) = scan_all(" =1");
        assert_eq!(tokens[0].0, Token::Eql);
    }

    #[test]
    fn comparison_operators() {
        let (tokens, _) = scan_all("1<2<=3<>4>5>=6");
        let kinds: Vec<Token> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Int,
                Token::Lss,
                Token::Int,
                Token::Leq,
                Token::Int,
                Token::Not,
                Token::Int,
                Token::Gtr,
                Token::Int,
                Token::Geq,
                Token::Int,
            ]
        );
    }

    #[test]
    fn illegal_characters() {
        let (tokens, diags) = scan_all("1$");
        assert_eq!(tokens[1], (Token::Illegal, "$".to_string()));
        assert_eq!(diags, vec![(1, "illegal character U+0024 '$'".to_string())]);

        let lexed = lex(b"1\x002");
        assert_eq!(lexed.tokens[1].token, Token::Illegal);
        let msgs: Vec<&str> = lexed.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["illegal character NUL"]);

        let lexed = lex(b"\xff+1");
        assert_eq!(lexed.tokens[0].token, Token::Illegal);
        let msgs: Vec<&str> = lexed.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["illegal UTF-8 encoding"]);
        assert_eq!(lexed.tokens[1].token, Token::Add);
    }

    #[test]
    fn positions_are_one_based() {
        let lexed = lex(b"  SUM( A1 )");
        let positions: Vec<(Token, Pos)> =
            lexed.tokens.iter().map(|l| (l.token, l.pos)).collect();
        assert_eq!(
            positions,
            vec![
                (Token::Ident, Pos(3)),
                (Token::LParen, Pos(6)),
                (Token::Ref, Pos(8)),
                (Token::RParen, Pos(11)),
                (Token::Eof, Pos(12)),
            ]
        );
    }

    #[test]
    fn eof_is_sticky() {
        let mut scanner = Scanner::with_diagnostics(b"1");
        assert_eq!(scanner.scan().token, Token::Int);
        assert_eq!(scanner.scan().token, Token::Eof);
        let again = scanner.scan();
        assert_eq!(again.token, Token::Eof);
        assert_eq!(again.pos, Pos(2));
    }

    #[test]
    fn tracks_newlines_and_lines() {
        let mut scanner = Scanner::with_diagnostics(b"1+\n  A1");
        scanner.scan();
        scanner.scan();
        assert!(!scanner.newline_before());
        let a1 = scanner.scan();
        assert!(scanner.newline_before());
        assert_eq!(scanner.prev_token(), Token::Ref);
        let position = scanner.position(a1.pos).expect("valid pos");
        assert_eq!((position.line, position.column), (2, 3));
        assert_eq!(scanner.position(crate::position::NO_POS), None);
    }

    #[test]
    fn handler_closure_receives_diagnostics() {
        let mut seen = Vec::new();
        {
            let mut scanner = Scanner::new(b"0b2", |offset: usize, msg: &str| {
                seen.push((offset, msg.to_string()));
            });
            while scanner.scan().token != Token::Eof {}
        }
        assert_eq!(seen, vec![(2, "invalid digit '2' in binary literal".to_string())]);
    }
}

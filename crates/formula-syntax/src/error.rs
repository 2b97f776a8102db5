//! Diagnostics shared by the scanner and the parser.
//!
//! Lexical and syntactic problems are never raised as control flow: they are appended to a
//! [`DiagnosticList`] while scanning/parsing continues, sorted once at the end, and handed back
//! to the caller as a [`ParseErrors`] value.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `(offset, message)` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 0-based byte offset into the source.
    pub offset: usize,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    /// Line/column of this diagnostic within `src`.
    #[must_use]
    pub fn position(&self, src: &[u8]) -> Position {
        Position::locate(src, self.offset)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.offset, self.message)
    }
}

/// Receives diagnostics as the scanner discovers them.
pub trait ErrorHandler {
    fn report(&mut self, offset: usize, message: &str);
}

impl<F> ErrorHandler for F
where
    F: FnMut(usize, &str),
{
    fn report(&mut self, offset: usize, message: &str) {
        self(offset, message)
    }
}

/// Growable, sortable list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticList {
    items: Vec<Diagnostic>,
}

impl DiagnosticList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, offset: usize, message: impl Into<String>) {
        self.items.push(Diagnostic::new(offset, message));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Orders diagnostics by ascending offset. Diagnostics at the same offset keep their
    /// insertion order.
    pub fn sort(&mut self) {
        self.items.sort_by_key(|d| d.offset);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// `None` when nothing was recorded, otherwise the aggregate error.
    #[must_use]
    pub fn into_error(self) -> Option<ParseErrors> {
        if self.items.is_empty() {
            None
        } else {
            Some(ParseErrors {
                diagnostics: self.items,
            })
        }
    }
}

impl ErrorHandler for DiagnosticList {
    fn report(&mut self, offset: usize, message: &str) {
        self.add(offset, message);
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&summarize(&self.items))
    }
}

/// Aggregate error returned when parsing recorded at least one diagnostic.
///
/// Displays as the first diagnostic, followed by `(and N more errors)` when there are more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", summarize(.diagnostics))]
pub struct ParseErrors {
    diagnostics: Vec<Diagnostic>,
}

impl ParseErrors {
    /// Diagnostics sorted by ascending offset.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no errors".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more errors)", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_list_has_no_error() {
        let list = DiagnosticList::new();
        assert_eq!(list.to_string(), "no errors");
        assert!(list.into_error().is_none());
    }

    #[test]
    fn error_message_counts_remaining_diagnostics() {
        let mut list = DiagnosticList::new();
        list.add(4, "expected ')', found EOF");
        assert_eq!(
            list.clone().into_error().map(|e| e.to_string()).as_deref(),
            Some("4: expected ')', found EOF")
        );

        list.add(1, "expected operand, found ')'");
        list.add(9, "string literal not terminated");
        list.sort();
        let err = list.into_error().expect("three diagnostics");
        assert_eq!(
            err.to_string(),
            "1: expected operand, found ')' (and 2 more errors)"
        );
        let offsets: Vec<usize> = err.diagnostics().iter().map(|d| d.offset).collect();
        assert_eq!(offsets, vec![1, 4, 9]);
    }

    #[test]
    fn sort_is_stable_for_equal_offsets() {
        let mut list = DiagnosticList::new();
        list.add(3, "b");
        list.add(0, "a");
        list.add(3, "c");
        list.sort();
        let messages: Vec<&str> = list.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn closures_are_error_handlers() {
        let mut seen = Vec::new();
        {
            let mut handler = |offset: usize, msg: &str| seen.push((offset, msg.to_string()));
            handler.report(2, "illegal character NUL");
        }
        assert_eq!(seen, vec![(2, "illegal character NUL".to_string())]);
    }

    #[test]
    fn diagnostic_resolves_line_and_column() {
        let diag = Diagnostic::new(4, "x");
        let pos = diag.position(b"1+\n(2");
        assert_eq!((pos.line, pos.column), (2, 2));
    }
}

//! Source positions.
//!
//! Tokens and AST nodes carry a compact [`Pos`]: a 1-based byte offset into the source buffer
//! where `0` ([`NO_POS`]) means "no position". Line/column information is not stored anywhere;
//! it is reconstructed on demand via [`Position::locate`] or
//! [`Scanner::position`](crate::scanner::Scanner::position).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// 1-based byte offset into the source buffer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Pos(pub usize);

/// The "no position" sentinel.
pub const NO_POS: Pos = Pos(0);

impl Pos {
    /// Position of the byte at 0-based `offset`.
    #[must_use]
    pub const fn from_offset(offset: usize) -> Self {
        Pos(offset + 1)
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != NO_POS.0
    }

    /// 0-based byte offset, or `None` for [`NO_POS`].
    #[must_use]
    pub const fn offset(self) -> Option<usize> {
        match self.0 {
            0 => None,
            p => Some(p - 1),
        }
    }
}

impl Add<usize> for Pos {
    type Output = Pos;

    fn add(self, rhs: usize) -> Pos {
        Pos(self.0 + rhs)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("-")
        }
    }
}

/// Half-open, 0-based byte span into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering `[pos, end)`. Missing positions collapse onto the other bound.
    #[must_use]
    pub fn from_pos(pos: Pos, end: Pos) -> Self {
        let start = pos.offset().or(end.offset()).unwrap_or(0);
        let end = end.offset().unwrap_or(start).max(start);
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A resolved source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 0-based byte offset.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in bytes.
    pub column: usize,
}

impl Position {
    /// Resolves a 0-based byte offset against `src`.
    ///
    /// Offsets past the end of `src` resolve against the end of the buffer.
    #[must_use]
    pub fn locate(src: &[u8], offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = &src[..offset];
        let line = 1 + before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |nl| nl + 1);
        Self {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }

    /// Resolves `line_starts` (0-based offsets at which each line begins, ascending, starting
    /// with `0`) for `offset`.
    #[must_use]
    pub fn from_line_starts(line_starts: &[usize], offset: usize) -> Self {
        let idx = match line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = line_starts.get(idx).copied().unwrap_or(0);
        Self {
            offset,
            line: idx + 1,
            column: offset.saturating_sub(line_start) + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

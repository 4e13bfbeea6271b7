//! Java syntax primitives for the minimizer.
//!
//! This crate provides:
//! - [`java::parse`]: a tolerant recursive-descent parser producing a small,
//!   span-carrying AST ([`ast`]). Parsing never fails; problems are reported as
//!   [`ParseError`]s next to a best-effort tree.
//! - [`edit`]: byte-range text edits used to rewrite sources while keeping
//!   every untouched byte identical.

pub mod ast;
pub mod edit;
pub mod java;
mod lexer;

pub use edit::{apply_text_edits, EditError, TextEdit};
pub use java::{parse, parse_expression, Parse};

use serde::{Deserialize, Serialize};

/// A half-open byte range within a source file (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    #[inline]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    #[inline]
    pub fn contains_span(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn slice(self, text: &str) -> &str {
        &text[self.start..self.end]
    }
}

/// A syntax error found while parsing. The parser keeps going after reporting
/// one, so a [`Parse`] may carry many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub range: Span,
}

#[cfg(test)]
mod tests;

use crate::token::LocatableToken;
use serde::Serialize;

/// A source span in 1-based line/column coordinates, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Selection {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// An empty selection, used as an insertion point.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn of_token(token: &LocatableToken) -> Self {
        Self::new(token.line, token.column, token.end_line, token.end_column)
    }

    /// Span from the first to the last token.
    pub fn of_tokens(tokens: &[LocatableToken]) -> Option<Self> {
        let first = tokens.first()?;
        let last = tokens.last()?;
        Some(Self::new(first.line, first.column, last.end_line, last.end_column))
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }

    pub fn start(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    pub fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_column)
    }

    /// The insertion point just past this selection.
    pub fn end_point(&self) -> Self {
        Self::point(self.end_line, self.end_column)
    }

    pub fn extend_end(&mut self, line: u32, column: u32) {
        self.end_line = line;
        self.end_column = column;
    }

    /// Grows this selection to also cover `other`.
    pub fn combine_with(&mut self, other: &Selection) {
        if other.start() < self.start() {
            self.line = other.line;
            self.column = other.column;
        }
        if other.end() > self.end() {
            self.end_line = other.end_line;
            self.end_column = other.end_column;
        }
    }
}

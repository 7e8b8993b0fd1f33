//! Materialized row representation.
//!
//! A [`Row`] is one visual line of the mirrored document: its text, the
//! cursor columns currently on it, its style spans, and — when the row
//! begins a logical (not soft-wrapped) line — its logical line number.
//!
//! Rows also carry an optional, consumer-owned association payload. The
//! cache stores and clears it but never constructs or inspects it; a
//! renderer typically caches a shaped/laid-out representation of the text
//! there and flushes it when the theme changes.

use smallvec::SmallVec;

/// A styled span of text within a row.
///
/// `start`/`len` are byte offsets into the row's text. `style` is an opaque
/// style identifier resolved by the consumer; this crate never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleSpan {
    /// Byte offset of the span start.
    pub start: usize,
    /// Byte length of the span.
    pub len: usize,
    /// Opaque style identifier.
    pub style: u32,
}

/// Cursor columns on a single row. Almost always empty or a single entry,
/// so keep small counts inline.
pub type CursorColumns = SmallVec<[usize; 2]>;

/// One materialized row, generic over the consumer's association payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<T> {
    /// The row's text.
    pub text: String,
    /// Columns on this row that hold a cursor.
    pub cursor: CursorColumns,
    /// Style spans over the text.
    pub styles: Vec<StyleSpan>,
    /// Logical line number, present only on rows that begin a logical line.
    /// Soft-wrap continuation rows carry `None`.
    pub line_number: Option<u64>,
    /// Consumer-owned payload. Cleared when the row is replaced wholesale,
    /// preserved across in-place updates.
    pub assoc: Option<T>,
}

impl<T> Row<T> {
    /// Create a plain text row with no cursors, styles, or number.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: CursorColumns::new(),
            styles: Vec::new(),
            line_number: None,
            assoc: None,
        }
    }

    /// Returns true if at least one cursor sits on this row.
    #[must_use]
    #[inline]
    pub fn has_cursor(&self) -> bool {
        !self.cursor.is_empty()
    }

    /// Returns true if this row begins a logical line.
    #[must_use]
    #[inline]
    pub fn is_logical_start(&self) -> bool {
        self.line_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_is_bare() {
        let row: Row<()> = Row::from_text("hello");
        assert_eq!(row.text, "hello");
        assert!(!row.has_cursor());
        assert!(!row.is_logical_start());
        assert!(row.assoc.is_none());
    }

    #[test]
    fn cursor_columns_inline_capacity() {
        let mut cursor = CursorColumns::new();
        cursor.push(0);
        cursor.push(7);
        assert!(!cursor.spilled());
    }
}

//! Delta wire protocol.
//!
//! The external text engine describes each change to the mirrored document
//! as a [`Delta`]: an ordered list of operations over the *old* row window
//! plus a wholesale replacement of the annotation set. The vocabulary is
//! exactly `invalidate`, `ins`, `copy`, `update`, `skip`, with integer row
//! counts; `ins`/`update` carry literal row payloads and `copy` a starting
//! logical line number.
//!
//! On the wire a delta is JSON:
//!
//! ```json
//! {
//!   "ops": [
//!     {"op": "ins", "n": 2, "lines": [{"text": "a", "ln": 1}, {"text": "b"}]},
//!     {"op": "skip", "n": 1},
//!     {"op": "copy", "n": 3, "ln": 2}
//!   ],
//!   "annotations": [{"type": "selection", "ranges": [[0, 0, 0, 4]], "n": 1}]
//! }
//! ```
//!
//! Decoding validates structure (op payload lengths against their counts).
//! Semantic validity — counts that do not overrun the old window — is the
//! sender's contract and is not checked here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::row::{Row, StyleSpan};

/// Error decoding a delta from its wire form.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// The JSON itself did not parse into the delta shape.
    #[error("malformed delta: {0}")]
    Malformed(#[from] serde_json::Error),
    /// An op's declared row count disagrees with its payload length.
    #[error("{op} op declares {n} rows but carries {lines} payloads")]
    CountMismatch {
        /// The offending op name.
        op: &'static str,
        /// Declared row count.
        n: usize,
        /// Actual payload length.
        lines: usize,
    },
}

/// Literal payload for a freshly inserted row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    /// The row's text.
    pub text: String,
    /// Cursor columns on the row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cursor: Vec<usize>,
    /// Style spans over the text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleSpan>,
    /// Logical line number, absent on soft-wrap continuation rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ln: Option<u64>,
}

impl NewRow {
    /// Build a payload carrying only text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Build a payload carrying text and a logical line number.
    #[must_use]
    pub fn numbered(text: impl Into<String>, ln: u64) -> Self {
        Self {
            text: text.into(),
            ln: Some(ln),
            ..Self::default()
        }
    }

    /// Materialize a fresh row from this payload. The association payload
    /// starts empty; inserted rows are replacements, not updates.
    #[must_use]
    pub fn materialize<T>(&self) -> Row<T> {
        Row {
            text: self.text.clone(),
            cursor: self.cursor.iter().copied().collect(),
            styles: self.styles.clone(),
            line_number: self.ln,
            assoc: None,
        }
    }
}

/// Partial payload applied on top of an existing row by an `update` op.
///
/// Omitted text means "keep the existing text"; cursor and style lists are
/// replaced wholesale; an omitted line number keeps the old one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowPatch {
    /// Replacement text, or `None` to keep the row's current text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New cursor columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cursor: Vec<usize>,
    /// New style spans.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleSpan>,
    /// Replacement logical line number, or `None` to keep the old one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ln: Option<u64>,
}

impl RowPatch {
    /// Apply this patch to an existing row, consuming it.
    ///
    /// The association payload survives: updates restyle a row, they do
    /// not replace it from the consumer's point of view.
    #[must_use]
    pub fn apply_to<T>(&self, old: Row<T>) -> Row<T> {
        Row {
            text: self.text.clone().unwrap_or(old.text),
            cursor: self.cursor.iter().copied().collect(),
            styles: self.styles.clone(),
            line_number: self.ln.or(old.line_number),
            assoc: old.assoc,
        }
    }
}

/// One operation over the old row window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    /// Mark `n` rows of the new window as not-yet-known. Consumes no old
    /// content.
    Invalidate {
        /// Row count.
        n: usize,
    },
    /// Insert `n` fresh rows. Consumes no old content.
    #[serde(rename = "ins")]
    Insert {
        /// Row count; must equal `lines.len()`.
        n: usize,
        /// The inserted rows.
        lines: Vec<NewRow>,
    },
    /// Carry `n` rows over from the old window, renumbering logical lines
    /// from `ln`.
    Copy {
        /// Row count.
        n: usize,
        /// Logical line number of the first row conceptually copied.
        ln: u64,
    },
    /// Restyle `n` old rows in place.
    Update {
        /// Row count; must equal `lines.len()`.
        n: usize,
        /// Per-row patches.
        lines: Vec<RowPatch>,
    },
    /// Discard `n` old rows.
    Skip {
        /// Row count.
        n: usize,
    },
}

impl Op {
    /// The op's declared row count.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Op::Invalidate { n }
            | Op::Insert { n, .. }
            | Op::Copy { n, .. }
            | Op::Update { n, .. }
            | Op::Skip { n } => *n,
        }
    }
}

/// Opaque annotation span attached to a delta.
///
/// The cache stores annotations wholesale and hands them back to the
/// consumer untouched; their meaning belongs to the engine and renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation kind, e.g. `"selection"` or `"find"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Covered ranges as `[start_line, start_col, end_line, end_col]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<[u64; 4]>,
    /// Opaque per-range payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payloads: Option<serde_json::Value>,
    /// Number of ranges, as declared by the engine.
    #[serde(default)]
    pub n: u64,
}

/// One complete update message from the text engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Operations over the old window, in order.
    #[serde(default)]
    pub ops: Vec<Op>,
    /// Replacement annotation set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Delta {
    /// Build a delta from ops alone, with an empty annotation set.
    #[must_use]
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self {
            ops,
            annotations: Vec::new(),
        }
    }

    /// Decode a delta from its JSON wire form and validate its structure.
    pub fn from_json(raw: &str) -> Result<Self, DeltaError> {
        let delta: Self = serde_json::from_str(raw)?;
        delta.validate()?;
        Ok(delta)
    }

    /// Check that every op's payload length matches its declared count.
    pub fn validate(&self) -> Result<(), DeltaError> {
        for op in &self.ops {
            let (name, lines) = match op {
                Op::Insert { lines, .. } => ("ins", lines.len()),
                Op::Update { lines, .. } => ("update", lines.len()),
                _ => continue,
            };
            if lines != op.count() {
                return Err(DeltaError::CountMismatch {
                    op: name,
                    n: op.count(),
                    lines,
                });
            }
        }
        Ok(())
    }
}

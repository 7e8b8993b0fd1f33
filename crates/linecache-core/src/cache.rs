//! Three-zone row cache state and the delta application algorithm.
//!
//! The cache mirrors the engine's view of the document as three zones:
//! a count of leading rows known to exist but not materialized, a window
//! of concrete row slots (each of which may itself be missing), and a
//! count of trailing unmaterialized rows. Row indices are always expressed
//! against the full document height; a lookup outside the materialized
//! window simply finds nothing.
//!
//! ## Delta application
//!
//! [`CacheState::apply`] replays one [`Delta`] in a single pass over its
//! ops, reading the old zoned state through a cursor while building the
//! replacement state, and reports the damaged row ranges (in new indices)
//! for the renderer. The whole pass runs under one held lock (see
//! [`crate::sync`]), so readers only ever observe a state produced by a
//! whole prefix of deltas.
//!
//! Deltas are trusted: an op stream whose counts overrun the old window is
//! a protocol violation by the engine and gets no defensive handling here.

use crate::damage::DamageList;
use crate::delta::{Annotation, Delta, Op};
use crate::row::Row;

/// The cache's guarded state: zoned row storage, annotations, revision,
/// and the reader-wait flag.
///
/// All access goes through the lock owned by [`crate::sync::LineCache`];
/// the methods here assume the caller holds it.
#[derive(Debug)]
pub struct CacheState<T> {
    /// Leading rows that exist but are not materialized.
    invalid_before: usize,
    /// The materialized window. A `None` slot is a row that is counted
    /// but individually invalidated.
    rows: Vec<Option<Row<T>>>,
    /// Trailing rows that exist but are not materialized.
    invalid_after: usize,
    /// Bumped on every delta with at least one op. Starts at 1 and never
    /// returns to 0, so a renderer can cache "last drawn revision".
    revision: u64,
    /// Annotation set, replaced wholesale by each delta.
    annotations: Vec<Annotation>,
    /// Set by a blocked reader, cleared by the writer (or by the reader on
    /// an unobserved timeout). Guarded by the same lock as everything else.
    pub(crate) waiting_reader: bool,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheState<T> {
    /// Create an empty cache (height 0, revision 1).
    #[must_use]
    pub fn new() -> Self {
        Self {
            invalid_before: 0,
            rows: Vec::new(),
            invalid_after: 0,
            revision: 1,
            annotations: Vec::new(),
            waiting_reader: false,
        }
    }

    /// Total document height as currently known, across all three zones.
    #[must_use]
    #[inline]
    pub fn height(&self) -> usize {
        self.invalid_before + self.rows.len() + self.invalid_after
    }

    /// Returns true if the document has no rows at all.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    /// The current revision. Strictly increases with every content delta.
    #[must_use]
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Count of leading unmaterialized rows.
    #[must_use]
    #[inline]
    pub fn invalid_before(&self) -> usize {
        self.invalid_before
    }

    /// Count of trailing unmaterialized rows.
    #[must_use]
    #[inline]
    pub fn invalid_after(&self) -> usize {
        self.invalid_after
    }

    /// The annotation set delivered with the most recent delta.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up the row at `index` (an index into the full height).
    ///
    /// Returns `None` outside the materialized window and for slots that
    /// are individually invalidated; neither case is an error.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row<T>> {
        index
            .checked_sub(self.invalid_before)
            .and_then(|ix| self.rows.get(ix))
            .and_then(Option::as_ref)
    }

    /// Attach a consumer association payload to the row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a materialized row. That is a logic defect
    /// in the calling renderer, not a recoverable condition.
    pub fn set_assoc(&mut self, index: usize, assoc: T) {
        let slot = index
            .checked_sub(self.invalid_before)
            .and_then(|ix| self.rows.get_mut(ix));
        match slot {
            Some(Some(row)) => row.assoc = Some(assoc),
            _ => panic!("set_assoc: row {index} is not materialized"),
        }
    }

    /// Clear every row's association payload.
    ///
    /// Used when the consumer's cached data goes stale wholesale, e.g. on
    /// a theme change.
    pub fn flush_assoc(&mut self) {
        for row in self.rows.iter_mut().flatten() {
            row.assoc = None;
        }
    }

    /// Damage covering every materialized row with a cursor on it.
    ///
    /// Lets the renderer repaint blinking cursors without a delta.
    #[must_use]
    pub fn cursor_damage(&self) -> DamageList {
        let mut damage = DamageList::new();
        for (ix, slot) in self.rows.iter().enumerate() {
            if slot.as_ref().is_some_and(Row::has_cursor) {
                damage.mark_span(self.invalid_before + ix, 1);
            }
        }
        damage
    }

    /// Replay one delta against the cache, returning the damaged row
    /// ranges in new-state indices.
    ///
    /// A delta with no ops replaces the annotation set only: it bumps
    /// nothing and damages nothing. Any delta with ops bumps the revision,
    /// and if the document shrank, the vanished trailing rows
    /// `[new_height, old_height)` are damaged so the renderer clears them.
    pub fn apply(&mut self, delta: &Delta) -> DamageList {
        if delta.ops.is_empty() {
            self.annotations = delta.annotations.clone();
            return DamageList::new();
        }

        let old_height = self.height();
        let old_invalid_before = self.invalid_before;
        let old_window_end = self.invalid_before + self.rows.len();
        let mut old_rows = std::mem::take(&mut self.rows);
        // Carry-forward ops drain `old_rows` in place, so remember which
        // slots held a row before the pass started.
        let old_materialized: Vec<bool> = old_rows.iter().map(Option::is_some).collect();

        let mut damage = DamageList::new();
        // Cursor into the conceptual old row stream (all three zones).
        let mut old_ix = 0usize;
        let mut new_invalid_before = 0usize;
        let mut new_rows: Vec<Option<Row<T>>> = Vec::new();
        let mut new_invalid_after = 0usize;

        for op in &delta.ops {
            match op {
                Op::Invalidate { n } => {
                    // A statement about the new window only; consumes no
                    // old content. Damage is emitted just for positions
                    // that held a materialized old row, since rows that
                    // were already unknown need no redraw.
                    let write_pos = new_invalid_before + new_rows.len() + new_invalid_after;
                    let overlap_start = write_pos.max(old_invalid_before);
                    let overlap_end = (write_pos + n).min(old_window_end);
                    for pos in overlap_start..overlap_end {
                        if old_materialized[pos - old_invalid_before] {
                            damage.mark_span(pos, 1);
                        }
                    }
                    if new_rows.is_empty() {
                        new_invalid_before += n;
                    } else {
                        new_invalid_after += n;
                    }
                }
                Op::Insert { n, lines } => {
                    debug_assert_eq!(*n, lines.len(), "insert count disagrees with payload");
                    // An invalid-after run may never sit in front of
                    // concrete content: flush it into explicit missing
                    // slots first.
                    new_rows.extend(std::iter::repeat_with(|| None).take(new_invalid_after));
                    new_invalid_after = 0;
                    let write_pos = new_invalid_before + new_rows.len();
                    damage.mark_span(write_pos, lines.len());
                    new_rows.extend(lines.iter().map(|line| Some(line.materialize())));
                }
                Op::Copy { .. } | Op::Update { .. } => {
                    let n = op.count();
                    let mut remaining = n;

                    // Portion still inside the old invalid-before zone:
                    // propagated as counts, never materialized, never
                    // damaged.
                    if old_ix < old_invalid_before {
                        let n_invalid = remaining.min(old_invalid_before - old_ix);
                        if new_rows.is_empty() {
                            new_invalid_before += n_invalid;
                        } else {
                            new_invalid_after += n_invalid;
                        }
                        old_ix += n_invalid;
                        remaining -= n_invalid;
                    }

                    // Materialized portion.
                    if remaining > 0 && old_ix < old_window_end {
                        let n_carry = remaining.min(old_window_end - old_ix);
                        // Same ordering rule as insert.
                        new_rows
                            .extend(std::iter::repeat_with(|| None).take(new_invalid_after));
                        new_invalid_after = 0;
                        let write_pos = new_invalid_before + new_rows.len();
                        let start = old_ix - old_invalid_before;

                        match op {
                            Op::Copy { ln, .. } => {
                                // An unmoved copy is the no-redraw fast
                                // path; only a true move is damaged.
                                if old_ix != write_pos {
                                    damage.mark_span(write_pos, n_carry);
                                }
                                // Renumber logical starts from `ln`. When
                                // the first carried slot is a continuation
                                // row (or missing entirely), `ln` names
                                // the logical line that slot belongs to,
                                // so numbering resumes one later.
                                let first_is_start = old_rows[start]
                                    .as_ref()
                                    .is_some_and(Row::is_logical_start);
                                let mut next = if first_is_start { *ln } else { *ln + 1 };
                                for slot in &mut old_rows[start..start + n_carry] {
                                    match slot.take() {
                                        Some(mut row) => {
                                            if row.line_number.is_some() {
                                                row.line_number = Some(next);
                                                next += 1;
                                            }
                                            new_rows.push(Some(row));
                                        }
                                        None => new_rows.push(None),
                                    }
                                }
                            }
                            Op::Update { lines, .. } => {
                                // Content changed in place: always damaged.
                                damage.mark_span(write_pos, n_carry);
                                // Patches are consumed positionally across
                                // the whole op, including any leading
                                // invalid portion.
                                let patch_base = n - remaining;
                                for (i, slot) in
                                    old_rows[start..start + n_carry].iter_mut().enumerate()
                                {
                                    match (slot.take(), lines.get(patch_base + i)) {
                                        (Some(row), Some(patch)) => {
                                            new_rows.push(Some(patch.apply_to(row)));
                                        }
                                        (Some(row), None) => new_rows.push(Some(row)),
                                        (None, _) => new_rows.push(None),
                                    }
                                }
                            }
                            _ => unreachable!("outer match narrowed to copy/update"),
                        }
                        old_ix += n_carry;
                        remaining -= n_carry;
                    }

                    // Whatever is left runs off the end of the old window:
                    // propagate it as unmaterialized rows.
                    if remaining > 0 {
                        if new_rows.is_empty() {
                            new_invalid_before += remaining;
                        } else {
                            new_invalid_after += remaining;
                        }
                        old_ix += remaining;
                    }
                }
                Op::Skip { n } => {
                    old_ix += n;
                }
            }
        }

        let new_height = new_invalid_before + new_rows.len() + new_invalid_after;
        self.invalid_before = new_invalid_before;
        self.rows = new_rows;
        self.invalid_after = new_invalid_after;
        self.annotations = delta.annotations.clone();
        self.revision += 1;

        if new_height < old_height {
            damage.mark_range(new_height, old_height);
        }
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{NewRow, RowPatch};

    fn insert_delta(texts: &[&str]) -> Delta {
        let lines: Vec<NewRow> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| NewRow::numbered(*text, i as u64 + 1))
            .collect();
        Delta::from_ops(vec![Op::Insert {
            n: lines.len(),
            lines,
        }])
    }

    fn filled_cache(texts: &[&str]) -> CacheState<&'static str> {
        let mut cache = CacheState::new();
        cache.apply(&insert_delta(texts));
        cache
    }

    #[test]
    fn starts_empty_at_revision_one() {
        let cache: CacheState<()> = CacheState::new();
        assert!(cache.is_empty());
        assert_eq!(cache.height(), 0);
        assert_eq!(cache.revision(), 1);
        assert!(cache.row(0).is_none());
    }

    #[test]
    fn insert_into_empty_cache() {
        let cache = filled_cache(&["a", "b", "c"]);
        assert_eq!(cache.height(), 3);
        assert_eq!(cache.revision(), 2);
        assert_eq!(cache.row(0).unwrap().text, "a");
        assert_eq!(cache.row(2).unwrap().text, "c");
        assert!(cache.row(3).is_none());
    }

    #[test]
    fn insert_damages_inserted_range() {
        let mut cache: CacheState<()> = CacheState::new();
        let damage = cache.apply(&insert_delta(&["a", "b", "c"]));
        assert_eq!(damage.ranges().len(), 1);
        assert_eq!(damage.ranges()[0].start, 0);
        assert_eq!(damage.ranges()[0].end, 3);
    }

    #[test]
    #[should_panic(expected = "insert count disagrees")]
    fn insert_count_payload_mismatch_is_loud() {
        let mut cache: CacheState<()> = CacheState::new();
        // Bypasses `Delta::from_json` validation on purpose.
        cache.apply(&Delta::from_ops(vec![Op::Insert {
            n: 2,
            lines: vec![NewRow::text("a")],
        }]));
    }

    #[test]
    fn annotations_only_delta_is_silent() {
        let mut cache = filled_cache(&["a"]);
        let rev = cache.revision();
        let delta = Delta {
            ops: Vec::new(),
            annotations: vec![Annotation {
                kind: "selection".into(),
                ..Annotation::default()
            }],
        };
        let damage = cache.apply(&delta);
        assert!(damage.is_empty());
        assert_eq!(cache.revision(), rev);
        assert_eq!(cache.annotations().len(), 1);
        assert_eq!(cache.annotations()[0].kind, "selection");
    }

    #[test]
    fn annotations_replaced_wholesale() {
        let mut cache = filled_cache(&["a"]);
        cache.apply(&Delta {
            ops: Vec::new(),
            annotations: vec![Annotation::default(), Annotation::default()],
        });
        cache.apply(&Delta::default());
        assert!(cache.annotations().is_empty());
    }

    #[test]
    fn revision_strictly_increases_on_content_deltas() {
        let mut cache: CacheState<()> = CacheState::new();
        let mut last = cache.revision();
        for delta in [
            insert_delta(&["a", "b"]),
            Delta::from_ops(vec![Op::Copy { n: 2, ln: 1 }]),
            Delta::from_ops(vec![Op::Skip { n: 2 }]),
        ] {
            cache.apply(&delta);
            assert!(cache.revision() > last);
            last = cache.revision();
        }
    }

    #[test]
    fn copy_of_whole_window_is_undamaged_identity() {
        let mut cache = filled_cache(&["a", "b", "c"]);
        let damage = cache.apply(&Delta::from_ops(vec![Op::Copy { n: 3, ln: 1 }]));
        assert!(damage.is_empty());
        assert_eq!(cache.height(), 3);
        assert_eq!(cache.row(0).unwrap().line_number, Some(1));
        assert_eq!(cache.row(2).unwrap().line_number, Some(3));
    }

    #[test]
    fn copy_renumbers_from_logical_start() {
        let mut cache = filled_cache(&["a", "b", "c"]);
        // Drop the first row; the remaining two become lines 10 and 11.
        cache.apply(&Delta::from_ops(vec![
            Op::Skip { n: 1 },
            Op::Copy { n: 2, ln: 10 },
        ]));
        assert_eq!(cache.height(), 2);
        assert_eq!(cache.row(0).unwrap().line_number, Some(10));
        assert_eq!(cache.row(1).unwrap().line_number, Some(11));
    }

    #[test]
    fn copy_starting_on_continuation_row_numbers_from_next_line() {
        let mut cache: CacheState<()> = CacheState::new();
        // A logical line soft-wrapped across rows 0-1, then line 2.
        cache.apply(&Delta::from_ops(vec![Op::Insert {
            n: 3,
            lines: vec![
                NewRow::numbered("long line, first visual row", 1),
                NewRow::text("long line, wrapped tail"),
                NewRow::numbered("next line", 2),
            ],
        }]));
        // Copy from the continuation row down: `ln` names the wrapped
        // line, so the first renumbered row gets ln + 1.
        cache.apply(&Delta::from_ops(vec![
            Op::Skip { n: 1 },
            Op::Copy { n: 2, ln: 5 },
        ]));
        assert_eq!(cache.row(0).unwrap().line_number, None);
        assert_eq!(cache.row(1).unwrap().line_number, Some(6));
    }

    #[test]
    fn moved_copy_is_damaged() {
        let mut cache = filled_cache(&["a", "b", "c"]);
        // "c" moves from row 2 to row 0.
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Skip { n: 2 },
            Op::Copy { n: 1, ln: 1 },
        ]));
        // The move itself, then the shrink of rows [1, 3).
        assert!(damage.covers(0));
        assert_eq!(cache.row(0).unwrap().text, "c");
    }

    #[test]
    fn shrink_damages_vanished_tail() {
        let mut cache = filled_cache(&["a", "b", "c", "d"]);
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Copy { n: 2, ln: 1 },
            Op::Skip { n: 2 },
        ]));
        assert_eq!(cache.height(), 2);
        let shrink = damage.ranges().last().unwrap();
        assert_eq!((shrink.start, shrink.end), (2, 4));
    }

    #[test]
    fn update_damages_and_preserves_assoc() {
        let mut cache = filled_cache(&["a", "b"]);
        cache.set_assoc(1, "layout-b");
        let damage = cache.apply(&Delta::from_ops(vec![Op::Update {
            n: 2,
            lines: vec![
                RowPatch {
                    cursor: vec![0],
                    ..RowPatch::default()
                },
                RowPatch {
                    text: Some("B".into()),
                    ..RowPatch::default()
                },
            ],
        }]));
        assert!(damage.covers(0) && damage.covers(1));
        let row0 = cache.row(0).unwrap();
        assert_eq!(row0.text, "a");
        assert_eq!(row0.cursor.as_slice(), &[0]);
        let row1 = cache.row(1).unwrap();
        assert_eq!(row1.text, "B");
        assert_eq!(row1.assoc, Some("layout-b"));
        // Logical numbers survive patches that omit them.
        assert_eq!(row1.line_number, Some(2));
    }

    #[test]
    fn invalidate_after_copy_damages_previously_materialized_row() {
        let mut cache = filled_cache(&["a", "b", "c", "d"]);
        // Scroll down one row, then invalidate the tail. New index 2
        // used to display old row "c"; even though the copy already
        // consumed that slot, the position still needs a redraw.
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Skip { n: 1 },
            Op::Copy { n: 2, ln: 1 },
            Op::Invalidate { n: 1 },
        ]));
        assert!(damage.covers(2));
        assert_eq!(cache.height(), 3);
        assert_eq!(cache.row(1).unwrap().text, "c");
        assert!(cache.row(2).is_none());
        assert_eq!(cache.invalid_after(), 1);
    }

    #[test]
    fn invalidate_damages_only_materialized_rows() {
        let mut cache = filled_cache(&["a", "b", "c"]);
        // Window slides down: rows 0-2 become invalid-before, and only
        // the previously materialized ones are damaged.
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Invalidate { n: 3 },
            Op::Skip { n: 3 },
        ]));
        assert_eq!(damage.ranges().len(), 1);
        assert_eq!((damage.ranges()[0].start, damage.ranges()[0].end), (0, 3));
        assert_eq!(cache.invalid_before(), 3);
        assert!(cache.row(1).is_none());

        // Re-invalidating already unknown rows damages nothing.
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Invalidate { n: 3 },
            Op::Skip { n: 3 },
        ]));
        assert!(damage.is_empty());
        assert_eq!(cache.height(), 3);
    }

    #[test]
    fn leading_invalidate_extends_invalid_before() {
        let mut cache = filled_cache(&["a", "b"]);
        cache.apply(&Delta::from_ops(vec![
            Op::Invalidate { n: 5 },
            Op::Copy { n: 2, ln: 6 },
        ]));
        assert_eq!(cache.invalid_before(), 5);
        assert_eq!(cache.invalid_after(), 0);
        assert_eq!(cache.height(), 7);
        assert!(cache.row(4).is_none());
        assert_eq!(cache.row(5).unwrap().text, "a");
    }

    #[test]
    fn trailing_invalidate_extends_invalid_after() {
        let mut cache = filled_cache(&["a", "b"]);
        cache.apply(&Delta::from_ops(vec![
            Op::Copy { n: 2, ln: 1 },
            Op::Invalidate { n: 4 },
        ]));
        assert_eq!(cache.invalid_after(), 4);
        assert_eq!(cache.height(), 6);
        assert!(cache.row(5).is_none());
    }

    #[test]
    fn insert_flushes_pending_invalid_run() {
        let mut cache = filled_cache(&["a"]);
        cache.apply(&Delta::from_ops(vec![
            Op::Copy { n: 1, ln: 1 },
            Op::Invalidate { n: 2 },
            Op::Insert {
                n: 1,
                lines: vec![NewRow::numbered("tail", 4)],
            },
        ]));
        assert_eq!(cache.height(), 4);
        assert_eq!(cache.invalid_after(), 0);
        assert!(cache.row(1).is_none());
        assert!(cache.row(2).is_none());
        assert_eq!(cache.row(3).unwrap().text, "tail");
    }

    #[test]
    fn copy_through_invalid_before_propagates_counts() {
        let mut cache: CacheState<()> = CacheState::new();
        cache.apply(&Delta::from_ops(vec![
            Op::Invalidate { n: 2 },
            Op::Insert {
                n: 2,
                lines: vec![NewRow::numbered("x", 3), NewRow::numbered("y", 4)],
            },
        ]));
        assert_eq!(cache.invalid_before(), 2);

        // Copy the whole old stream, invalid head included.
        let damage = cache.apply(&Delta::from_ops(vec![Op::Copy { n: 4, ln: 3 }]));
        assert!(damage.is_empty());
        assert_eq!(cache.invalid_before(), 2);
        assert_eq!(cache.height(), 4);
        assert_eq!(cache.row(2).unwrap().text, "x");
    }

    #[test]
    fn end_to_end_invalidate_middle_row() {
        let mut cache: CacheState<()> = CacheState::new();
        let damage = cache.apply(&insert_delta(&["A", "B", "C"]));
        assert_eq!(cache.height(), 3);
        assert_eq!(cache.revision(), 2);
        assert_eq!((damage.ranges()[0].start, damage.ranges()[0].end), (0, 3));

        // The engine drops row 1 from the window: keep A, invalidate the
        // middle slot (discarding B's old content), keep C as line 2.
        let damage = cache.apply(&Delta::from_ops(vec![
            Op::Copy { n: 1, ln: 1 },
            Op::Invalidate { n: 1 },
            Op::Skip { n: 1 },
            Op::Copy { n: 1, ln: 2 },
        ]));
        assert_eq!(cache.height(), 3);
        assert_eq!(cache.revision(), 3);
        assert_eq!(damage.ranges().len(), 1);
        assert_eq!((damage.ranges()[0].start, damage.ranges()[0].end), (1, 2));
        assert_eq!(cache.row(0).unwrap().text, "A");
        assert!(cache.row(1).is_none());
        let row2 = cache.row(2).unwrap();
        assert_eq!(row2.text, "C");
        assert_eq!(row2.line_number, Some(2));
    }

    #[test]
    fn height_accounts_all_zones_and_ignores_skip() {
        let mut cache = filled_cache(&["a", "b", "c"]);
        cache.apply(&Delta::from_ops(vec![
            Op::Invalidate { n: 4 },
            Op::Copy { n: 2, ln: 9 },
            Op::Skip { n: 1 },
            Op::Invalidate { n: 3 },
        ]));
        assert_eq!(cache.height(), 4 + 2 + 3);
        assert_eq!(cache.invalid_before(), 4);
        assert_eq!(cache.invalid_after(), 3);
    }

    #[test]
    fn cursor_damage_finds_cursor_rows() {
        let mut cache: CacheState<()> = CacheState::new();
        cache.apply(&Delta::from_ops(vec![Op::Insert {
            n: 3,
            lines: vec![
                NewRow {
                    cursor: vec![2],
                    ..NewRow::text("a")
                },
                NewRow::text("b"),
                NewRow {
                    cursor: vec![0, 4],
                    ..NewRow::text("c")
                },
            ],
        }]));
        let damage = cache.cursor_damage();
        assert!(damage.covers(0));
        assert!(!damage.covers(1));
        assert!(damage.covers(2));
    }

    #[test]
    fn flush_assoc_clears_every_row() {
        let mut cache = filled_cache(&["a", "b"]);
        cache.set_assoc(0, "x");
        cache.set_assoc(1, "y");
        cache.flush_assoc();
        assert!(cache.row(0).unwrap().assoc.is_none());
        assert!(cache.row(1).unwrap().assoc.is_none());
    }

    #[test]
    #[should_panic(expected = "not materialized")]
    fn set_assoc_outside_window_panics() {
        let mut cache = filled_cache(&["a"]);
        cache.set_assoc(5, "nope");
    }

    #[test]
    #[should_panic(expected = "not materialized")]
    fn set_assoc_on_invalidated_slot_panics() {
        let mut cache = filled_cache(&["a", "b"]);
        cache.apply(&Delta::from_ops(vec![
            Op::Copy { n: 1, ln: 1 },
            Op::Invalidate { n: 1 },
            Op::Skip { n: 1 },
        ]));
        // Height is still 2 but row 1 is no longer materialized.
        cache.set_assoc(1, "nope");
    }

    #[test]
    fn insert_replacement_clears_assoc() {
        let mut cache = filled_cache(&["a"]);
        cache.set_assoc(0, "stale");
        cache.apply(&Delta::from_ops(vec![
            Op::Skip { n: 1 },
            Op::Insert {
                n: 1,
                lines: vec![NewRow::numbered("fresh", 1)],
            },
        ]));
        let row = cache.row(0).unwrap();
        assert_eq!(row.text, "fresh");
        assert!(row.assoc.is_none());
    }
}

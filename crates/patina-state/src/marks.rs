//! Named and implicit marks.
//!
//! Implicit marks (operator start/end, last change, last insert, visual
//! bounds) are written only by operator executors and visual teardown; named
//! marks only by the explicit mark-set command. Every stored position
//! re-maps when an edit elsewhere changes line or column numbering.

use patina_text::Position;
use tracing::debug;

/// A buffer identity for file marks (A-Z), opaque to this crate.
pub type BufferId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSlot {
    /// "a".."z": local to the owning buffer.
    Lower(u8),
    /// "A".."Z": carries a buffer identity across files.
    Upper(u8),
    /// "[": start of the last operated-on range.
    OpStart,
    /// "]": end of the last operated-on range.
    OpEnd,
    /// ".": position of the last change.
    LastChange,
    /// "^": position of the last insert.
    LastInsert,
    /// "<": start of the last visual area.
    VisualStart,
    /// ">": end of the last visual area.
    VisualEnd,
}

impl MarkSlot {
    pub fn resolve(name: char) -> Option<Self> {
        Some(match name {
            'a'..='z' => MarkSlot::Lower(name as u8 - b'a'),
            'A'..='Z' => MarkSlot::Upper(name as u8 - b'A'),
            '[' => MarkSlot::OpStart,
            ']' => MarkSlot::OpEnd,
            '.' => MarkSlot::LastChange,
            '^' => MarkSlot::LastInsert,
            '<' => MarkSlot::VisualStart,
            '>' => MarkSlot::VisualEnd,
            _ => return None,
        })
    }

    /// Only named marks may be set by the mark-set command.
    pub fn user_settable(self) -> bool {
        matches!(self, MarkSlot::Lower(_) | MarkSlot::Upper(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkLookup {
    Found(Position),
    Unset,
    /// A file mark pointing into a different buffer.
    InAnotherFile(BufferId),
}

#[derive(Debug, Clone)]
pub struct MarkFile {
    buffer_id: BufferId,
    lower: [Option<Position>; 26],
    upper: [Option<(BufferId, Position)>; 26],
    op_start: Option<Position>,
    op_end: Option<Position>,
    last_change: Option<Position>,
    last_insert: Option<Position>,
    visual_start: Option<Position>,
    visual_end: Option<Position>,
}

impl MarkFile {
    pub fn new(buffer_id: BufferId) -> Self {
        Self {
            buffer_id,
            lower: [None; 26],
            upper: [None; 26],
            op_start: None,
            op_end: None,
            last_change: None,
            last_insert: None,
            visual_start: None,
            visual_end: None,
        }
    }

    pub fn set(&mut self, slot: MarkSlot, pos: Position) {
        debug!(target: "state.marks", ?slot, lnum = pos.lnum, col = pos.col, "mark_set");
        match slot {
            MarkSlot::Lower(i) => self.lower[i as usize] = Some(pos),
            MarkSlot::Upper(i) => self.upper[i as usize] = Some((self.buffer_id, pos)),
            MarkSlot::OpStart => self.op_start = Some(pos),
            MarkSlot::OpEnd => self.op_end = Some(pos),
            MarkSlot::LastChange => self.last_change = Some(pos),
            MarkSlot::LastInsert => self.last_insert = Some(pos),
            MarkSlot::VisualStart => self.visual_start = Some(pos),
            MarkSlot::VisualEnd => self.visual_end = Some(pos),
        }
    }

    pub fn get(&self, slot: MarkSlot) -> MarkLookup {
        let stored = match slot {
            MarkSlot::Lower(i) => self.lower[i as usize],
            MarkSlot::Upper(i) => {
                return match self.upper[i as usize] {
                    Some((buf, pos)) if buf == self.buffer_id => MarkLookup::Found(pos),
                    Some((buf, _)) => MarkLookup::InAnotherFile(buf),
                    None => MarkLookup::Unset,
                };
            }
            MarkSlot::OpStart => self.op_start,
            MarkSlot::OpEnd => self.op_end,
            MarkSlot::LastChange => self.last_change,
            MarkSlot::LastInsert => self.last_insert,
            MarkSlot::VisualStart => self.visual_start,
            MarkSlot::VisualEnd => self.visual_end,
        };
        stored.map(MarkLookup::Found).unwrap_or(MarkLookup::Unset)
    }

    fn visit(&mut self, mut f: impl FnMut(&mut Position)) {
        for m in self.lower.iter_mut().flatten() {
            f(m);
        }
        let own = self.buffer_id;
        for entry in self.upper.iter_mut() {
            if let Some((buf, pos)) = entry
                && *buf == own
            {
                f(pos);
            }
        }
        for m in [
            &mut self.op_start,
            &mut self.op_end,
            &mut self.last_change,
            &mut self.last_insert,
            &mut self.visual_start,
            &mut self.visual_end,
        ]
        .into_iter()
        .flatten()
        {
            f(m);
        }
    }

    /// `count` lines were inserted after line `after`.
    pub fn adjust_insert(&mut self, after: usize, count: usize) {
        self.visit(|pos| {
            if pos.lnum > after {
                pos.lnum += count;
            }
        });
    }

    /// Lines `first..=last` were deleted: positions inside collapse to the
    /// deletion point, positions after shift up by the removed count.
    pub fn adjust_delete(&mut self, first: usize, last: usize) {
        let removed = last - first + 1;
        self.visit(|pos| {
            if pos.lnum >= first && pos.lnum <= last {
                pos.lnum = first;
                pos.col = 0;
                pos.coladd = 0;
            } else if pos.lnum > last {
                pos.lnum -= removed;
            }
        });
    }

    /// A same-line edit at `lnum` shifted columns at/after `from_col` by
    /// `delta` bytes.
    pub fn adjust_cols(&mut self, lnum: usize, from_col: usize, delta: isize) {
        self.visit(|pos| {
            if pos.lnum == lnum && pos.col >= from_col {
                pos.col = pos.col.saturating_add_signed(delta);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_accepts_named_and_implicit() {
        assert_eq!(MarkSlot::resolve('c'), Some(MarkSlot::Lower(2)));
        assert_eq!(MarkSlot::resolve('['), Some(MarkSlot::OpStart));
        assert_eq!(MarkSlot::resolve('?'), None);
        assert!(MarkSlot::resolve('a').unwrap().user_settable());
        assert!(!MarkSlot::resolve('.').unwrap().user_settable());
    }

    #[test]
    fn set_get_round_trip() {
        let mut mf = MarkFile::new(1);
        mf.set(MarkSlot::Lower(0), Position::new(3, 4));
        assert_eq!(
            mf.get(MarkSlot::Lower(0)),
            MarkLookup::Found(Position::new(3, 4))
        );
        assert_eq!(mf.get(MarkSlot::Lower(1)), MarkLookup::Unset);
    }

    #[test]
    fn file_mark_reports_other_buffer() {
        let mut mf = MarkFile::new(1);
        mf.set(MarkSlot::Upper(0), Position::new(2, 0));
        mf.buffer_id = 2;
        assert_eq!(mf.get(MarkSlot::Upper(0)), MarkLookup::InAnotherFile(1));
    }

    #[test]
    fn deleted_range_collapses_contained_marks() {
        let mut mf = MarkFile::new(1);
        mf.set(MarkSlot::Lower(0), Position::new(5, 7));
        mf.set(MarkSlot::Lower(1), Position::new(9, 2));
        mf.adjust_delete(4, 6);
        assert_eq!(
            mf.get(MarkSlot::Lower(0)),
            MarkLookup::Found(Position::new(4, 0))
        );
        assert_eq!(
            mf.get(MarkSlot::Lower(1)),
            MarkLookup::Found(Position::new(6, 2))
        );
    }

    #[test]
    fn insert_shifts_following_lines_only() {
        let mut mf = MarkFile::new(1);
        mf.set(MarkSlot::Lower(0), Position::new(2, 0));
        mf.set(MarkSlot::Lower(1), Position::new(8, 0));
        mf.adjust_insert(4, 3);
        assert_eq!(
            mf.get(MarkSlot::Lower(0)),
            MarkLookup::Found(Position::new(2, 0))
        );
        assert_eq!(
            mf.get(MarkSlot::Lower(1)),
            MarkLookup::Found(Position::new(11, 0))
        );
    }

    #[test]
    fn column_shift_applies_on_one_line() {
        let mut mf = MarkFile::new(1);
        mf.set(MarkSlot::Lower(0), Position::new(3, 10));
        mf.set(MarkSlot::Lower(1), Position::new(3, 2));
        mf.adjust_cols(3, 5, -4);
        assert_eq!(
            mf.get(MarkSlot::Lower(0)),
            MarkLookup::Found(Position::new(3, 6))
        );
        assert_eq!(
            mf.get(MarkSlot::Lower(1)),
            MarkLookup::Found(Position::new(3, 2))
        );
    }
}

//! Buffer positions, the line-storage service contract, and the reference
//! rope-backed buffer.
//!
//! Lines are addressed 1-based and exchanged without trailing newlines; the
//! storage engine behind the trait owns the physical representation.

use anyhow::{Result, bail};
use ropey::Rope;

pub mod block;
pub mod vcol;

pub use block::{BlockMode, BlockSlice, block_slice};
pub use vcol::{col_at_vcol, line_vcol_width, vcol_of};

/// A buffer position: 1-based line, byte offset within that line, and a
/// virtual-editing overshoot past end-of-line. Ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub lnum: usize,
    pub col: usize,
    pub coladd: usize,
}

impl Position {
    pub fn new(lnum: usize, col: usize) -> Self {
        Self {
            lnum,
            col,
            coladd: 0,
        }
    }

    pub fn with_coladd(lnum: usize, col: usize, coladd: usize) -> Self {
        Self { lnum, col, coladd }
    }
}

/// A pair of positions. Not necessarily ordered until `normalize` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Order the endpoints. Returns whether they were swapped so callers can
    /// keep inclusivity relative to the original direction.
    pub fn normalize(&mut self) -> bool {
        if self.end < self.start {
            std::mem::swap(&mut self.start, &mut self.end);
            true
        } else {
            false
        }
    }

    pub fn line_count(&self) -> usize {
        self.end.lnum - self.start.lnum + 1
    }
}

/// Shape of a motion, selection, or register payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionShape {
    #[default]
    Char,
    Line,
    Block,
}

/// The line-storage service this core edits through. 1-based line numbers;
/// a buffer never has zero lines.
pub trait LineStorage {
    fn line(&self, lnum: usize) -> Result<String>;
    fn set_line(&mut self, lnum: usize, text: &str) -> Result<()>;
    /// Insert a new line after `after` (0 inserts before the first line).
    fn insert_line(&mut self, after: usize, text: &str) -> Result<()>;
    fn delete_lines(&mut self, first: usize, count: usize) -> Result<()>;
    fn line_count(&self) -> usize;
}

/// Reference `LineStorage` backed by a `ropey::Rope`. Embedders with their
/// own storage engine implement the trait directly; tests run on this one.
#[derive(Debug, Clone)]
pub struct RopeBuffer {
    rope: Rope,
}

impl RopeBuffer {
    pub fn from_str(content: &str) -> Self {
        let rope = if content.is_empty() {
            Rope::from_str("")
        } else {
            Rope::from_str(content)
        };
        Self { rope }
    }

    /// Entire contents with a trailing newline after every line.
    pub fn to_string_lossless(&self) -> String {
        self.rope.to_string()
    }

    /// Lines as owned strings, newline stripped.
    pub fn lines_vec(&self) -> Vec<String> {
        (1..=self.line_count())
            .map(|n| self.line(n).unwrap_or_default())
            .collect()
    }

    fn check_lnum(&self, lnum: usize) -> Result<()> {
        if lnum == 0 || lnum > self.line_count() {
            bail!("line {lnum} out of range 1..={}", self.line_count());
        }
        Ok(())
    }

    fn line_char_bounds(&self, lnum: usize) -> (usize, usize, bool) {
        let start = self.rope.line_to_char(lnum - 1);
        let raw = self.rope.line(lnum - 1).to_string();
        let has_nl = raw.ends_with('\n');
        let end = start + raw.chars().count();
        (start, end, has_nl)
    }
}

impl LineStorage for RopeBuffer {
    fn line(&self, lnum: usize) -> Result<String> {
        self.check_lnum(lnum)?;
        let mut s = self.rope.line(lnum - 1).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Ok(s)
    }

    fn set_line(&mut self, lnum: usize, text: &str) -> Result<()> {
        self.check_lnum(lnum)?;
        let (start, end, has_nl) = self.line_char_bounds(lnum);
        let content_end = if has_nl { end - 1 } else { end };
        self.rope.remove(start..content_end);
        self.rope.insert(start, text);
        Ok(())
    }

    fn insert_line(&mut self, after: usize, text: &str) -> Result<()> {
        if after > self.line_count() {
            bail!("insert after line {after} out of range");
        }
        if after == 0 {
            self.rope.insert(0, &format!("{text}\n"));
            return Ok(());
        }
        let (_, end, has_nl) = self.line_char_bounds(after);
        if has_nl {
            self.rope.insert(end, &format!("{text}\n"));
        } else {
            // Last physical line without a newline: terminate it first.
            self.rope.insert(end, &format!("\n{text}"));
        }
        Ok(())
    }

    fn delete_lines(&mut self, first: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.check_lnum(first)?;
        let last = (first + count - 1).min(self.line_count());
        let start = self.rope.line_to_char(first - 1);
        let (_, end, _) = self.line_char_bounds(last);
        self.rope.remove(start..end);
        // A buffer never goes to zero lines.
        if self.rope.len_chars() == 0 {
            self.rope = Rope::from_str("");
        }
        Ok(())
    }

    fn line_count(&self) -> usize {
        let n = self.rope.len_lines();
        // ropey counts a trailing newline as starting one more (empty) line.
        if n > 1 && self.rope.line(n - 1).len_chars() == 0 {
            n - 1
        } else {
            n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn position_ordering_is_lexicographic() {
        let a = Position::new(1, 5);
        let b = Position::new(2, 0);
        let c = Position::new(2, 3);
        assert!(a < b);
        assert!(b < c);
        assert!(Position::with_coladd(2, 3, 0) < Position::with_coladd(2, 3, 4));
    }

    #[test]
    fn range_normalize_reports_swap() {
        let mut r = Range::new(Position::new(3, 0), Position::new(1, 2));
        assert!(r.normalize());
        assert_eq!(r.start, Position::new(1, 2));
        assert!(!r.normalize());
        assert_eq!(r.line_count(), 3);
    }

    #[test]
    fn rope_buffer_line_access() {
        let buf = RopeBuffer::from_str("alpha\nbeta\ngamma\n");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line(2).unwrap(), "beta");
        assert!(buf.line(4).is_err());
    }

    #[test]
    fn rope_buffer_set_and_insert() {
        let mut buf = RopeBuffer::from_str("one\ntwo\n");
        buf.set_line(2, "TWO").unwrap();
        assert_eq!(buf.line(2).unwrap(), "TWO");
        buf.insert_line(1, "mid").unwrap();
        assert_eq!(buf.lines_vec(), vec!["one", "mid", "TWO"]);
        buf.insert_line(0, "top").unwrap();
        assert_eq!(buf.line(1).unwrap(), "top");
        assert_eq!(buf.line_count(), 4);
    }

    #[test]
    fn rope_buffer_delete_never_empties() {
        let mut buf = RopeBuffer::from_str("a\nb\nc\n");
        buf.delete_lines(1, 3).unwrap();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line(1).unwrap(), "");
    }

    #[test]
    fn rope_buffer_delete_middle() {
        let mut buf = RopeBuffer::from_str("a\nb\nc\nd\n");
        buf.delete_lines(2, 2).unwrap();
        assert_eq!(buf.lines_vec(), vec!["a", "d"]);
    }

    #[test]
    fn last_line_without_newline_is_one_line() {
        let buf = RopeBuffer::from_str("solo");
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line(1).unwrap(), "solo");
    }
}

//! Virtual-column math.
//!
//! A virtual column is the on-screen column (0-based) after tab expansion and
//! wide-grapheme accounting, distinct from the raw byte offset.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// One grapheme with its byte offset and display geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHit {
    /// Byte offset of the grapheme in the line.
    pub col: usize,
    /// Byte length of the grapheme.
    pub bytes: usize,
    /// Virtual column the grapheme starts at.
    pub start_vcol: usize,
    /// Display width in columns (tabs expand to the next tab stop).
    pub width: usize,
}

fn cell_width(g: &str, at_vcol: usize, tabstop: usize) -> usize {
    if g == "\t" {
        let ts = tabstop.max(1);
        ts - (at_vcol % ts)
    } else {
        UnicodeWidthStr::width(g).max(1)
    }
}

/// Iterate grapheme cells of `line` under `tabstop`.
pub fn cells(line: &str, tabstop: usize) -> impl Iterator<Item = CellHit> + '_ {
    let mut vcol = 0usize;
    line.grapheme_indices(true).map(move |(col, g)| {
        let width = cell_width(g, vcol, tabstop);
        let hit = CellHit {
            col,
            bytes: g.len(),
            start_vcol: vcol,
            width,
        };
        vcol += width;
        hit
    })
}

/// Virtual column at which the grapheme starting at byte `col` begins.
/// `col` at or past end-of-line yields the line's total display width.
pub fn vcol_of(line: &str, col: usize, tabstop: usize) -> usize {
    let mut total = 0;
    for hit in cells(line, tabstop) {
        if hit.col >= col {
            return hit.start_vcol;
        }
        total = hit.start_vcol + hit.width;
    }
    total
}

/// Total display width of the line.
pub fn line_vcol_width(line: &str, tabstop: usize) -> usize {
    cells(line, tabstop).map(|h| h.width).sum()
}

/// The grapheme cell containing `vcol`, or `None` when the line ends first.
pub fn cell_at_vcol(line: &str, vcol: usize, tabstop: usize) -> Option<CellHit> {
    cells(line, tabstop).find(|h| h.start_vcol <= vcol && vcol < h.start_vcol + h.width)
}

/// Byte offset of the grapheme containing `vcol`; end-of-line when short.
pub fn col_at_vcol(line: &str, vcol: usize, tabstop: usize) -> usize {
    cell_at_vcol(line, vcol, tabstop)
        .map(|h| h.col)
        .unwrap_or(line.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_ascii_maps_one_to_one() {
        assert_eq!(vcol_of("abcd", 2, 8), 2);
        assert_eq!(col_at_vcol("abcd", 3, 8), 3);
        assert_eq!(line_vcol_width("abcd", 8), 4);
    }

    #[test]
    fn tab_expands_to_next_stop() {
        // 'a' at vcol 0, tab covers vcols 1..=7, 'b' at vcol 8.
        let line = "a\tb";
        assert_eq!(vcol_of(line, 1, 8), 1);
        assert_eq!(vcol_of(line, 2, 8), 8);
        assert_eq!(col_at_vcol(line, 4, 8), 1);
        assert_eq!(col_at_vcol(line, 8, 8), 2);
        assert_eq!(line_vcol_width(line, 8), 9);
    }

    #[test]
    fn tab_width_depends_on_position() {
        // "ab\tc": tab starts at vcol 2, covers 2..=7.
        let hit = cell_at_vcol("ab\tc", 5, 8).unwrap();
        assert_eq!(hit.col, 2);
        assert_eq!(hit.start_vcol, 2);
        assert_eq!(hit.width, 6);
    }

    #[test]
    fn wide_grapheme_spans_two_columns() {
        // CJK char is two columns wide.
        let line = "a\u{4e16}b";
        assert_eq!(line_vcol_width(line, 8), 4);
        assert_eq!(vcol_of(line, 1 + '\u{4e16}'.len_utf8(), 8), 3);
        // vcol 2 is the second half of the wide char.
        assert_eq!(col_at_vcol(line, 2, 8), 1);
    }

    #[test]
    fn past_end_clamps() {
        assert_eq!(col_at_vcol("ab", 10, 8), 2);
        assert_eq!(cell_at_vcol("ab", 10, 8), None);
    }
}

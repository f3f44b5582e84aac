//! Rectangular (block) geometry.
//!
//! A block spans an inclusive virtual-column range on every line it touches.
//! Because a tab stop can be only partially covered, each line resolves to a
//! byte span plus space counts describing the partially covered cells. The
//! result must be re-derived per call: editing one line changes tab alignment
//! for the lines after it.

use crate::vcol::{CellHit, cells, line_vcol_width};
use tracing::trace;

/// What the caller will do with the slice; partial-cell space counts mean
/// different things for removal versus materialization (mirroring how a cut
/// tab leaves padding while a yanked tab contributes covered-width spaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// `start_spaces`/`end_spaces` are the KEPT columns of partially covered
    /// cells (outside the block); the byte span is what gets removed.
    Delete,
    /// `start_spaces`/`end_spaces` are the covered columns of partially
    /// covered cells (inside the block); the byte span holds only fully
    /// covered cells. Used by yank, put and replace.
    Fill,
}

/// Per-line resolution of a block's virtual-column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockSlice {
    pub start_spaces: usize,
    pub end_spaces: usize,
    /// Byte offset where the affected span begins.
    pub text_start: usize,
    /// Byte length of the affected span.
    pub text_len: usize,
    /// The line ends before the block's left edge. Append-style operations
    /// must still pad up to the block column.
    pub is_short: bool,
}

/// Resolve the block columns `start_vcol..=end_vcol` against one line.
pub fn block_slice(
    line: &str,
    start_vcol: usize,
    end_vcol: usize,
    tabstop: usize,
    mode: BlockMode,
) -> BlockSlice {
    debug_assert!(start_vcol <= end_vcol);
    let width = line_vcol_width(line, tabstop);
    if width <= start_vcol {
        return BlockSlice {
            text_start: line.len(),
            is_short: true,
            ..BlockSlice::default()
        };
    }

    let mut first: Option<CellHit> = None;
    let mut last: Option<CellHit> = None;
    for hit in cells(line, tabstop) {
        if first.is_none() && hit.start_vcol + hit.width > start_vcol {
            first = Some(hit);
        }
        if hit.start_vcol <= end_vcol {
            last = Some(hit);
        } else {
            break;
        }
    }
    let first = first.expect("line wider than start_vcol must contain a cell");
    let last = last.expect("first covered cell implies a last covered cell");

    let left_partial = first.start_vcol < start_vcol;
    let right_partial = width > end_vcol + 1 && last.start_vcol + last.width > end_vcol + 1;

    let mut out = BlockSlice::default();

    // Single cell covering both edges needs the overlap handled as one piece.
    if left_partial && right_partial && first.col == last.col {
        match mode {
            BlockMode::Delete => {
                out.start_spaces = start_vcol - first.start_vcol;
                out.end_spaces = (first.start_vcol + first.width - 1) - end_vcol;
                out.text_start = first.col;
                out.text_len = first.bytes;
            }
            BlockMode::Fill => {
                out.start_spaces = end_vcol - start_vcol + 1;
                out.text_start = first.col + first.bytes;
            }
        }
        trace!(target: "text.block", ?mode, ?out, "block_slice_single_cell");
        return out;
    }

    let (text_start, start_spaces) = if left_partial {
        match mode {
            BlockMode::Delete => (first.col, start_vcol - first.start_vcol),
            BlockMode::Fill => (
                first.col + first.bytes,
                first.start_vcol + first.width - start_vcol,
            ),
        }
    } else {
        (first.col, 0)
    };

    let (text_end, end_spaces) = if width <= end_vcol + 1 {
        // Block extends to or past the end of the line.
        (line.len(), 0)
    } else if right_partial {
        match mode {
            BlockMode::Delete => (
                last.col + last.bytes,
                (last.start_vcol + last.width - 1) - end_vcol,
            ),
            BlockMode::Fill => (last.col, end_vcol - last.start_vcol + 1),
        }
    } else {
        (last.col + last.bytes, 0)
    };

    out.start_spaces = start_spaces;
    out.end_spaces = end_spaces;
    out.text_start = text_start;
    out.text_len = text_end.saturating_sub(text_start);
    trace!(target: "text.block", ?mode, ?out, "block_slice");
    out
}

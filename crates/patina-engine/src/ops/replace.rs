//! The replace executor (`r{char}` and visual `r`).
//!
//! Every grapheme in the range becomes the replacement character. A carriage
//! return replacement splits the line instead (single-line char ranges
//! only, matching the normal-mode command).

use patina_text::{BlockMode, LineStorage, MotionShape, Position, block_slice};
use unicode_segmentation::UnicodeSegmentation;

use super::{OpCtx, OpOutcome, exclusive_end, slice};
use crate::error::NormalError;
use crate::pending::PendingOp;
use crate::{Engine, fetch_line};

fn fill(ch: char, seg: &str) -> String {
    let n = seg.graphemes(true).count();
    std::iter::repeat(ch).take(n).collect()
}

fn replace_span(
    buffer: &mut (dyn LineStorage + '_),
    ch: char,
    lnum: usize,
    from: usize,
    to: usize,
) -> Result<(), NormalError> {
    let line = fetch_line(buffer, lnum)?;
    let seg = slice(&line, from, to);
    let mut new = slice(&line, 0, from);
    new.push_str(&fill(ch, &seg));
    new.push_str(&slice(&line, to, line.len()));
    buffer.set_line(lnum, &new).map_err(NormalError::from)
}

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let ch = op.replace_char.ok_or(NormalError::InapplicableContext)?;

    if (ch == '\r' || ch == '\n') && op.shape == MotionShape::Char && !op.is_visual {
        return split_line(engine, cx, op);
    }
    if ch.is_control() {
        return Err(NormalError::InapplicableContext);
    }

    let mut cursor = op.start;
    match op.shape {
        MotionShape::Char => {
            let end = exclusive_end(cx.buffer, op)?;
            if op.start.lnum == end.lnum {
                replace_span(cx.buffer, ch, op.start.lnum, op.start.col, end.col)?;
                // The cursor lands on the last replaced character.
                let line = fetch_line(cx.buffer, op.start.lnum)?;
                let seg = slice(&line, op.start.col, end.col);
                let replaced = seg.graphemes(true).count();
                if replaced > 1 && !op.is_visual {
                    cursor.col = op.start.col + ch.len_utf8() * (replaced - 1);
                }
            } else {
                let first = fetch_line(cx.buffer, op.start.lnum)?;
                replace_span(cx.buffer, ch, op.start.lnum, op.start.col, first.len())?;
                for lnum in op.start.lnum + 1..end.lnum {
                    let len = fetch_line(cx.buffer, lnum)?.len();
                    replace_span(cx.buffer, ch, lnum, 0, len)?;
                }
                replace_span(cx.buffer, ch, end.lnum, 0, end.col)?;
            }
        }
        MotionShape::Line => {
            for lnum in op.start.lnum..=op.end.lnum {
                let len = fetch_line(cx.buffer, lnum)?.len();
                replace_span(cx.buffer, ch, lnum, 0, len)?;
            }
        }
        MotionShape::Block => {
            let ts = engine.options.tabstop;
            for lnum in op.start.lnum..=op.end.lnum {
                let line = fetch_line(cx.buffer, lnum)?;
                let f = block_slice(
                    &line,
                    op.block_start_vcol,
                    op.block_end_vcol,
                    ts,
                    BlockMode::Fill,
                );
                if f.is_short {
                    continue;
                }
                // Partially covered cells become replacement chars too: the
                // whole covered width is filled.
                let covered = f.start_spaces
                    + slice(&line, f.text_start, f.text_start + f.text_len)
                        .graphemes(true)
                        .count()
                    + f.end_spaces;
                let del = block_slice(
                    &line,
                    op.block_start_vcol,
                    op.block_end_vcol,
                    ts,
                    BlockMode::Delete,
                );
                let mut new = slice(&line, 0, del.text_start);
                new.push_str(&" ".repeat(del.start_spaces));
                new.push_str(&std::iter::repeat(ch).take(covered).collect::<String>());
                new.push_str(&" ".repeat(del.end_spaces));
                new.push_str(&slice(&line, del.text_start + del.text_len, line.len()));
                cx.buffer.set_line(lnum, &new).map_err(NormalError::from)?;
            }
        }
    }
    Ok(OpOutcome::at(cursor))
}

/// `r<CR>`: the replaced characters are removed and the line splits at the
/// cursor.
fn split_line(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let end = exclusive_end(cx.buffer, op)?;
    let line = fetch_line(cx.buffer, op.start.lnum)?;
    let head = slice(&line, 0, op.start.col);
    let tail = slice(&line, end.col, line.len());
    cx.buffer
        .set_line(op.start.lnum, head.trim_end())
        .map_err(NormalError::from)?;
    cx.buffer
        .insert_line(op.start.lnum, &tail)
        .map_err(NormalError::from)?;
    engine.note_lines_inserted(op.start.lnum, 1);
    Ok(OpOutcome::at(Position::new(op.start.lnum + 1, 0)))
}

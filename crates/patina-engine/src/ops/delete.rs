//! The delete executor.

use patina_state::RegisterContent;
use patina_text::{BlockMode, MotionShape, Position, block_slice};
use tracing::trace;

use super::{OpCtx, OpOutcome, charwise_segments, exclusive_end, reg_id, slice, spaces, whole_lines};
use crate::error::NormalError;
use crate::motion::first_nonblank_col;
use crate::pending::PendingOp;
use crate::{Engine, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    match op.shape {
        MotionShape::Char => charwise(engine, cx, op, true),
        MotionShape::Line => linewise(engine, cx, op, true),
        MotionShape::Block => blockwise(engine, cx, op, true),
    }
}

/// Char-wise removal; `record` is off when the change executor reuses this
/// after recording under its own rules.
pub(crate) fn charwise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
    record: bool,
) -> Result<OpOutcome, NormalError> {
    let start = op.start;
    let end = exclusive_end(cx.buffer, op)?;
    let segments = charwise_segments(cx.buffer, start, end)?;
    let within_line = start.lnum == end.lnum;
    if record {
        let id = reg_id(op)?;
        engine.registers.record_delete(
            id,
            RegisterContent::charwise(segments),
            within_line,
            cx.clipboard.as_deref_mut(),
        )?;
    }

    if within_line {
        let line = fetch_line(cx.buffer, start.lnum)?;
        let removed = end.col - start.col;
        let mut new = slice(&line, 0, start.col);
        new.push_str(&slice(&line, end.col, line.len()));
        cx.buffer
            .set_line(start.lnum, &new)
            .map_err(NormalError::from)?;
        engine.marks.adjust_cols(start.lnum, end.col, -(removed as isize));
    } else {
        let first = fetch_line(cx.buffer, start.lnum)?;
        let last = fetch_line(cx.buffer, end.lnum)?;
        let mut new = slice(&first, 0, start.col);
        new.push_str(&slice(&last, end.col, last.len()));
        cx.buffer
            .set_line(start.lnum, &new)
            .map_err(NormalError::from)?;
        cx.buffer
            .delete_lines(start.lnum + 1, end.lnum - start.lnum)
            .map_err(NormalError::from)?;
        engine.note_lines_deleted(start.lnum + 1, end.lnum);
    }
    trace!(target: "engine.op", lnum = start.lnum, "delete_charwise");
    Ok(OpOutcome::at(start))
}

pub(crate) fn linewise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
    record: bool,
) -> Result<OpOutcome, NormalError> {
    let first = op.start.lnum;
    let last = op.end.lnum;
    if record {
        let id = reg_id(op)?;
        engine.registers.record_delete(
            id,
            RegisterContent::linewise(whole_lines(cx.buffer, first, last)?),
            false,
            cx.clipboard.as_deref_mut(),
        )?;
    }
    cx.buffer
        .delete_lines(first, last - first + 1)
        .map_err(NormalError::from)?;
    engine.note_lines_deleted(first, last);
    let lnum = first.min(cx.buffer.line_count());
    let col = first_nonblank_col(&fetch_line(cx.buffer, lnum)?);
    Ok(OpOutcome::at(Position::new(lnum, col)).reporting(last - first + 1))
}

pub(crate) fn blockwise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
    record: bool,
) -> Result<OpOutcome, NormalError> {
    let ts = engine.options.tabstop;
    let (sv, ev) = (op.block_start_vcol, op.block_end_vcol);
    let width = ev - sv + 1;

    if record {
        let mut reg_lines = Vec::with_capacity(op.line_count);
        for lnum in op.start.lnum..=op.end.lnum {
            let line = fetch_line(cx.buffer, lnum)?;
            let fill = block_slice(&line, sv, ev, ts, BlockMode::Fill);
            let mut text = spaces(fill.start_spaces);
            text.push_str(&slice(&line, fill.text_start, fill.text_start + fill.text_len));
            text.push_str(&spaces(fill.end_spaces));
            reg_lines.push(text);
        }
        let id = reg_id(op)?;
        engine.registers.record_delete(
            id,
            RegisterContent::blockwise(reg_lines, width),
            false,
            cx.clipboard.as_deref_mut(),
        )?;
    }

    for lnum in op.start.lnum..=op.end.lnum {
        let line = fetch_line(cx.buffer, lnum)?;
        let del = block_slice(&line, sv, ev, ts, BlockMode::Delete);
        if del.is_short {
            continue;
        }
        let mut new = slice(&line, 0, del.text_start);
        new.push_str(&spaces(del.start_spaces + del.end_spaces));
        new.push_str(&slice(&line, del.text_start + del.text_len, line.len()));
        cx.buffer.set_line(lnum, &new).map_err(NormalError::from)?;
    }
    let first_line = fetch_line(cx.buffer, op.start.lnum)?;
    let col = patina_text::col_at_vcol(&first_line, sv, ts);
    Ok(OpOutcome::at(Position::new(op.start.lnum, col)))
}

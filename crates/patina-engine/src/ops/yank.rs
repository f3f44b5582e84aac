//! The yank executor. Never mutates the buffer; the cursor moves to the
//! start of the yanked area (line-wise yanks keep their column).

use patina_state::RegisterContent;
use patina_text::{BlockMode, MotionShape, Position, block_slice};

use super::{OpCtx, OpOutcome, charwise_segments, exclusive_end, reg_id, slice, spaces, whole_lines};
use crate::error::NormalError;
use crate::pending::PendingOp;
use crate::{Engine, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let id = reg_id(op)?;
    let (content, cursor, reported) = match op.shape {
        MotionShape::Char => {
            let end = exclusive_end(cx.buffer, op)?;
            let segments = charwise_segments(cx.buffer, op.start, end)?;
            let reported = if op.line_count > 1 { op.line_count } else { 0 };
            (RegisterContent::charwise(segments), op.start, reported)
        }
        MotionShape::Line => {
            let lines = whole_lines(cx.buffer, op.start.lnum, op.end.lnum)?;
            // Line-wise yank keeps the cursor column.
            let cursor = Position::new(op.start.lnum, engine.cursor().col);
            (RegisterContent::linewise(lines), cursor, op.line_count)
        }
        MotionShape::Block => {
            let ts = engine.options.tabstop;
            let (sv, ev) = (op.block_start_vcol, op.block_end_vcol);
            let mut lines = Vec::with_capacity(op.line_count);
            for lnum in op.start.lnum..=op.end.lnum {
                let line = fetch_line(cx.buffer, lnum)?;
                let fill = block_slice(&line, sv, ev, ts, BlockMode::Fill);
                let mut text = spaces(fill.start_spaces);
                text.push_str(&slice(&line, fill.text_start, fill.text_start + fill.text_len));
                text.push_str(&spaces(fill.end_spaces));
                lines.push(text);
            }
            let first_line = fetch_line(cx.buffer, op.start.lnum)?;
            let col = patina_text::col_at_vcol(&first_line, sv, ts);
            (
                RegisterContent::blockwise(lines, ev - sv + 1),
                Position::new(op.start.lnum, col),
                op.line_count,
            )
        }
    };
    engine
        .registers
        .record_yank(id, content, cx.clipboard.as_deref_mut())?;
    Ok(OpOutcome {
        cursor,
        changed: false,
        lines_reported: reported,
        enter_insert: None,
    })
}

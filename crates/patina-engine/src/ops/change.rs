//! The change executor: delete the range, then hand control to insert mode.

use patina_state::RegisterContent;
use patina_text::{MotionShape, Position};

use super::{OpCtx, OpOutcome, delete, reg_id, whole_lines};
use crate::error::NormalError;
use crate::motion::first_nonblank_col;
use crate::pending::PendingOp;
use crate::{BlockInsert, Engine, InsertRequest, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    match op.shape {
        MotionShape::Char => {
            let mut out = delete::charwise(engine, cx, op, true)?;
            out.enter_insert = Some(InsertRequest {
                at: out.cursor,
                block_replay: false,
            });
            Ok(out)
        }
        MotionShape::Line => linewise(engine, cx, op),
        MotionShape::Block => {
            let out = delete::blockwise(engine, cx, op, true)?;
            // Re-typing happens on the first line; the rest replay after the
            // embedder reports the insert finished.
            engine.arm_block_insert(BlockInsert {
                first: op.start.lnum,
                last: op.end.lnum,
                vcol: op.block_start_vcol,
                append: false,
            });
            Ok(OpOutcome {
                enter_insert: Some(InsertRequest {
                    at: out.cursor,
                    block_replay: true,
                }),
                ..out
            })
        }
    }
}

/// Line-wise change empties the lines into one, optionally keeping the
/// first line's indent.
fn linewise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let first = op.start.lnum;
    let last = op.end.lnum;
    let first_line = fetch_line(cx.buffer, first)?;
    let indent = if engine.options.autoindent {
        first_line[..first_nonblank_col(&first_line)].to_string()
    } else {
        String::new()
    };
    let id = reg_id(op)?;
    engine.registers.record_delete(
        id,
        RegisterContent::linewise(whole_lines(cx.buffer, first, last)?),
        false,
        cx.clipboard.as_deref_mut(),
    )?;
    cx.buffer
        .set_line(first, &indent)
        .map_err(NormalError::from)?;
    if last > first {
        cx.buffer
            .delete_lines(first + 1, last - first)
            .map_err(NormalError::from)?;
        engine.note_lines_deleted(first + 1, last);
    }
    let cursor = Position::new(first, indent.len());
    Ok(OpOutcome {
        cursor,
        changed: true,
        lines_reported: last - first + 1,
        enter_insert: Some(InsertRequest {
            at: cursor,
            block_replay: false,
        }),
    })
}

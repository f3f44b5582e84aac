//! Block insert/append (visual-block `I` and `A`).
//!
//! Arming places the cursor on the block edge of the first line and asks the
//! embedder to enter insert mode; the text typed there replays onto the
//! remaining block lines once `apply_block_insert` is called.

use patina_text::{Position, col_at_vcol, line_vcol_width};

use super::{OpCtx, OpOutcome};
use crate::error::NormalError;
use crate::pending::{OpKind, PendingOp};
use crate::{BlockInsert, Engine, InsertRequest, fetch_line};

pub(crate) fn arm(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let append = op.kind == OpKind::AppendBlock;
    let vcol = if append {
        op.block_end_vcol + 1
    } else {
        op.block_start_vcol
    };
    let line = fetch_line(cx.buffer, op.start.lnum)?;
    let ts = engine.options.tabstop;
    let col = if line_vcol_width(&line, ts) < vcol {
        line.len()
    } else {
        col_at_vcol(&line, vcol, ts)
    };
    engine.arm_block_insert(BlockInsert {
        first: op.start.lnum,
        last: op.end.lnum,
        vcol,
        append,
    });
    let cursor = Position::new(op.start.lnum, col);
    Ok(OpOutcome {
        cursor,
        changed: false,
        lines_reported: 0,
        enter_insert: Some(InsertRequest {
            at: cursor,
            block_replay: true,
        }),
    })
}

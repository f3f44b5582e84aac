//! Indent shifts (`<` and `>`).
//!
//! A shift rebuilds the leading whitespace of every non-empty line in the
//! range. The block shape shifts the same lines as line-wise; the geometry
//! of the block only selected them.

use patina_text::{Position, vcol_of};

use super::{OpCtx, OpOutcome};
use crate::error::NormalError;
use crate::motion::first_nonblank_col;
use crate::pending::{OpKind, PendingOp};
use crate::{Engine, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let unit = engine.options.shift_unit();
    let ts = engine.options.tabstop;
    let amount = unit * op.shift_units.max(1);
    let right = op.kind == OpKind::ShiftRight;

    for lnum in op.start.lnum..=op.end.lnum {
        let line = fetch_line(cx.buffer, lnum)?;
        if line.trim().is_empty() {
            if !line.is_empty() {
                cx.buffer.set_line(lnum, "").map_err(NormalError::from)?;
            }
            continue;
        }
        let text_col = first_nonblank_col(&line);
        let current = vcol_of(&line, text_col, ts);
        let mut target = if right {
            current + amount
        } else {
            current.saturating_sub(amount)
        };
        if engine.options.shift_round {
            target = (target / unit) * unit;
        }
        let indent = build_indent(target, ts, engine.options.expand_tab);
        let new = format!("{indent}{}", &line[text_col..]);
        cx.buffer.set_line(lnum, &new).map_err(NormalError::from)?;
    }

    let first_line = fetch_line(cx.buffer, op.start.lnum)?;
    let cursor = Position::new(op.start.lnum, first_nonblank_col(&first_line));
    Ok(OpOutcome::at(cursor).reporting(op.line_count))
}

fn build_indent(width: usize, tabstop: usize, expand_tab: bool) -> String {
    if expand_tab {
        " ".repeat(width)
    } else {
        let ts = tabstop.max(1);
        let mut s = "\t".repeat(width / ts);
        s.push_str(&" ".repeat(width % ts));
        s
    }
}

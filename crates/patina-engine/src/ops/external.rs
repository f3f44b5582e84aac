//! Executors that defer to the embedding application.
//!
//! Filtering, formatting, `=` indenting, `:` ranges, and operator-function
//! calls all act on whole lines and may change how many lines the range
//! holds. The delegate reports the new count so marks and the jumplist can
//! follow.

use patina_text::Position;

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
    let delegate = cx
        .delegate
        .as_deref_mut()
        .ok_or(NormalError::InapplicableContext)?;
    let first = op.start.lnum;
    let last = op.end.lnum;
    let old = last - first + 1;

    if op.kind == OpKind::Colon {
        delegate.colon(first, last)?;
        return Ok(OpOutcome {
            cursor: op.start,
            changed: false,
            lines_reported: 0,
            enter_insert: None,
        });
    }

    let new = match op.kind {
        OpKind::Filter => delegate.filter(cx.buffer, first, last)?,
        OpKind::Indent => delegate.indent(cx.buffer, first, last)?,
        OpKind::Format => delegate.format(cx.buffer, first, last)?,
        OpKind::CallFunction => delegate.call_function(cx.buffer, first, last)?,
        _ => return Err(NormalError::InapplicableContext),
    };

    if new > old {
        engine.note_lines_inserted(last, new - old);
    } else if new < old {
        engine.note_lines_deleted(first + new, last);
    }

    let line = fetch_line(cx.buffer, first)?;
    let cursor = Position::new(first, first_nonblank_col(&line));
    Ok(OpOutcome::at(cursor).reporting(old.max(new)))
}

//! Operator executors.
//!
//! Each executor receives the finalized range, mutates the buffer through
//! the narrow `OpCtx`, records registers, and reports the cursor landing
//! spot. The undo scope is already open when an executor runs.

use patina_state::{Clipboard, RegisterId};
use patina_text::{LineStorage, Position};

use crate::error::NormalError;
use crate::pending::{OpKind, PendingOp};
use crate::{Engine, InsertRequest, RangeDelegate, fetch_line};

pub(crate) mod blockedit;
pub(crate) mod caseop;
pub(crate) mod change;
pub(crate) mod delete;
pub(crate) mod external;
pub(crate) mod join;
pub(crate) mod put;
pub(crate) mod replace;
pub(crate) mod shift;
pub(crate) mod yank;

/// Mutation context handed to executors: the buffer and the optional
/// collaborators, but never the undo log (the scope around the executor owns
/// that). `'e` is the embedder borrow the trait objects carry; `'a` is the
/// short reborrow for one executor call. Keeping them apart lets the
/// `Option` fields take `as_deref_mut` reborrows without stretching `'a` to
/// the whole dispatch.
pub(crate) struct OpCtx<'a, 'e> {
    pub buffer: &'a mut (dyn LineStorage + 'e),
    pub clipboard: Option<&'a mut (dyn Clipboard + 'e)>,
    pub delegate: Option<&'a mut (dyn RangeDelegate + 'e)>,
}

pub(crate) struct OpOutcome {
    pub cursor: Position,
    pub changed: bool,
    /// Line count for the "N lines ..." report; 0 suppresses it.
    pub lines_reported: usize,
    pub enter_insert: Option<InsertRequest>,
}

impl OpOutcome {
    pub(crate) fn at(cursor: Position) -> Self {
        Self {
            cursor,
            changed: true,
            lines_reported: 0,
            enter_insert: None,
        }
    }

    pub(crate) fn reporting(mut self, lines: usize) -> Self {
        self.lines_reported = lines;
        self
    }
}

pub(crate) fn execute(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    match op.kind {
        OpKind::None => Err(NormalError::InapplicableContext),
        OpKind::Delete => delete::run(engine, cx, op),
        OpKind::Yank => yank::run(engine, cx, op),
        OpKind::Change => change::run(engine, cx, op),
        OpKind::ShiftLeft | OpKind::ShiftRight => shift::run(engine, cx, op),
        OpKind::Upper | OpKind::Lower | OpKind::Rot13 | OpKind::ToggleCase => {
            caseop::run(engine, cx, op)
        }
        OpKind::Join | OpKind::JoinNoSpace => join::run(engine, cx, op),
        OpKind::Replace => replace::run(engine, cx, op),
        OpKind::InsertBlock | OpKind::AppendBlock => blockedit::arm(engine, cx, op),
        OpKind::Filter | OpKind::Indent | OpKind::Format | OpKind::Colon
        | OpKind::CallFunction => external::run(engine, cx, op),
    }
}

pub(crate) fn reg_id(op: &PendingOp) -> Result<Option<RegisterId>, NormalError> {
    op.reg
        .map(RegisterId::resolve)
        .transpose()
        .map_err(NormalError::from)
}

pub(crate) fn spaces(n: usize) -> String {
    " ".repeat(n)
}

pub(crate) fn slice(line: &str, from: usize, to: usize) -> String {
    line.get(from..to).unwrap_or("").to_string()
}

/// Convert the finalized (possibly inclusive) char-wise end into an
/// exclusive byte boundary.
pub(crate) fn exclusive_end(
    buffer: &dyn LineStorage,
    op: &PendingOp,
) -> Result<Position, NormalError> {
    let mut end = op.end;
    if op.inclusive {
        let line = fetch_line(buffer, end.lnum)?;
        end.col = (end.col + crate::motion::grapheme_len_at(&line, end.col)).min(line.len());
    }
    Ok(end)
}

/// The char-wise text between `start` and the exclusive `end`, one entry
/// per touched line.
pub(crate) fn charwise_segments(
    buffer: &dyn LineStorage,
    start: Position,
    end_ex: Position,
) -> Result<Vec<String>, NormalError> {
    if start.lnum == end_ex.lnum {
        let line = fetch_line(buffer, start.lnum)?;
        return Ok(vec![slice(&line, start.col, end_ex.col)]);
    }
    let first = fetch_line(buffer, start.lnum)?;
    let mut out = vec![slice(&first, start.col, first.len())];
    for lnum in start.lnum + 1..end_ex.lnum {
        out.push(fetch_line(buffer, lnum)?);
    }
    let last = fetch_line(buffer, end_ex.lnum)?;
    out.push(slice(&last, 0, end_ex.col));
    Ok(out)
}

pub(crate) fn whole_lines(
    buffer: &dyn LineStorage,
    first: usize,
    last: usize,
) -> Result<Vec<String>, NormalError> {
    (first..=last).map(|l| fetch_line(buffer, l)).collect()
}

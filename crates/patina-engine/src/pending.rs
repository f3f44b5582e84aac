//! Pending-operator state and range finalization.
//!
//! An operator key arms a `PendingOp`; the following motion (or the doubled
//! operator key, or the visual selection) supplies the range. Finalization
//! runs a fixed pipeline: normalize the endpoints, resolve the shape,
//! resolve block geometry, then hand the range to the executor inside a
//! single undo scope.

use patina_state::{ChangeScope, MarkSlot, RegisterId};
use patina_text::{
    MotionShape, Position, Range,
    vcol::cell_at_vcol,
    vcol::vcol_of,
};
use tracing::debug;

use crate::cmdtable::Cmd;
use crate::error::NormalError;
use crate::motion::{MotionResult, first_nonblank_col, last_grapheme_start};
use crate::ops::{self, OpCtx};
use crate::{EditContext, Engine, InsertRequest, fetch_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpKind {
    #[default]
    None,
    Delete,
    Yank,
    Change,
    ShiftLeft,
    ShiftRight,
    Filter,
    Indent,
    Format,
    Colon,
    Upper,
    Lower,
    Rot13,
    ToggleCase,
    Join,
    JoinNoSpace,
    Replace,
    InsertBlock,
    AppendBlock,
    CallFunction,
}

impl OpKind {
    /// Operator kind for a single-key operator.
    pub(crate) fn from_key(c: char) -> Option<Self> {
        Some(match c {
            'd' => OpKind::Delete,
            'y' => OpKind::Yank,
            'c' => OpKind::Change,
            '<' => OpKind::ShiftLeft,
            '>' => OpKind::ShiftRight,
            '=' => OpKind::Indent,
            '!' => OpKind::Filter,
            _ => return None,
        })
    }

    /// Operator kind for a `g`-prefixed pair.
    pub(crate) fn from_g(c: char) -> Option<Self> {
        Some(match c {
            '~' => OpKind::ToggleCase,
            'u' => OpKind::Lower,
            'U' => OpKind::Upper,
            '?' => OpKind::Rot13,
            'q' => OpKind::Format,
            '@' => OpKind::CallFunction,
            _ => return None,
        })
    }

    /// Whether execution mutates the buffer (and so needs an undo scope).
    pub(crate) fn mutates(self) -> bool {
        !matches!(self, OpKind::None | OpKind::Yank)
    }

    pub(crate) fn verb(self) -> &'static str {
        match self {
            OpKind::Delete => "deleted",
            OpKind::Yank => "yanked",
            OpKind::Change | OpKind::Replace => "changed",
            OpKind::ShiftLeft => "unindented",
            OpKind::ShiftRight => "indented",
            OpKind::Indent => "indented",
            OpKind::Filter => "filtered",
            OpKind::Format => "formatted",
            OpKind::Join | OpKind::JoinNoSpace => "joined",
            OpKind::Upper | OpKind::Lower | OpKind::Rot13 | OpKind::ToggleCase => "changed",
            _ => "changed",
        }
    }
}

/// Everything known about the operator between arming and execution.
#[derive(Debug, Clone)]
pub struct PendingOp {
    pub kind: OpKind,
    pub start: Position,
    pub end: Position,
    pub shape: MotionShape,
    pub inclusive: bool,
    pub reg: Option<char>,
    /// Count typed before the operator key; multiplies the motion's count.
    pub count: usize,
    /// Shape override typed after the operator (v / V / Ctrl-V).
    pub shape_force: Option<MotionShape>,
    pub block_start_vcol: usize,
    pub block_end_vcol: usize,
    /// Shift amount in shiftwidth units (visual shifts take their count
    /// as units rather than as a line multiplier).
    pub shift_units: usize,
    pub replace_char: Option<char>,
    pub is_visual: bool,
    pub line_count: usize,
}

impl Default for PendingOp {
    fn default() -> Self {
        Self {
            kind: OpKind::None,
            start: Position::new(1, 0),
            end: Position::new(1, 0),
            shape: MotionShape::Char,
            inclusive: false,
            reg: None,
            count: 0,
            shape_force: None,
            block_start_vcol: 0,
            block_end_vcol: 0,
            shift_units: 1,
            replace_char: None,
            is_visual: false,
            line_count: 0,
        }
    }
}

impl PendingOp {
    pub(crate) fn armed(kind: OpKind, start: Position, reg: Option<char>, count: usize) -> Self {
        Self {
            kind,
            start,
            end: start,
            reg,
            count,
            ..Self::default()
        }
    }
}

impl Engine {
    /// Close a pending operator with a finished motion.
    pub(crate) fn finish_operator(
        &mut self,
        cx: &mut EditContext<'_>,
        m: MotionResult,
        _cmd: &Cmd,
    ) -> Result<(bool, Option<InsertRequest>), NormalError> {
        let mut op = std::mem::take(&mut self.op);
        op.end = m.target;
        op.shape = m.shape;
        op.inclusive = m.inclusive;
        self.finalize_op(cx, op)
    }

    /// The shared back half of every operator: normalize, resolve shape and
    /// block geometry, run the executor inside one undo scope, update marks
    /// and cursor, and report.
    pub(crate) fn finalize_op(
        &mut self,
        cx: &mut EditContext<'_>,
        mut op: PendingOp,
    ) -> Result<(bool, Option<InsertRequest>), NormalError> {
        self.op = PendingOp::default();
        if let Some(c) = op.reg {
            let id = RegisterId::resolve(c)?;
            if !id.is_writable()
                && matches!(op.kind, OpKind::Delete | OpKind::Yank | OpKind::Change)
            {
                return Err(NormalError::ReadOnlyRegister(id.display_char()));
            }
        }

        let mut range = Range::new(op.start, op.end);
        range.normalize();
        op.start = range.start;
        op.end = range.end;
        if let Some(forced) = op.shape_force {
            op.shape = forced;
        }

        // An exclusive char-wise motion that lands in column 0 retracts to
        // the previous line end; when the range started at or before the
        // first non-blank it becomes line-wise instead.
        if op.shape == MotionShape::Char
            && !op.inclusive
            && op.shape_force.is_none()
            && self.options.promote_charwise
            && op.end.lnum > op.start.lnum
            && op.end.col == 0
        {
            op.end.lnum -= 1;
            let start_line = fetch_line(cx.buffer, op.start.lnum)?;
            let end_line = fetch_line(cx.buffer, op.end.lnum)?;
            if op.start.col <= first_nonblank_col(&start_line) {
                op.shape = MotionShape::Line;
            } else if end_line.is_empty() {
                op.end.col = 0;
            } else {
                op.inclusive = true;
                op.end.col = last_grapheme_start(&end_line);
            }
        }

        op.line_count = op.end.lnum - op.start.lnum + 1;

        if op.shape == MotionShape::Block {
            let ts = self.options.tabstop;
            let start_line = fetch_line(cx.buffer, op.start.lnum)?;
            let end_line = fetch_line(cx.buffer, op.end.lnum)?;
            let a = vcol_of(&start_line, op.start.col, ts) + op.start.coladd;
            let mut b = vcol_of(&end_line, op.end.col, ts) + op.end.coladd;
            // The end cell participates with its whole display width.
            if let Some(hit) = cell_at_vcol(&end_line, b, ts) {
                b = hit.start_vcol + hit.width - 1;
            }
            op.block_start_vcol = a.min(b);
            op.block_end_vcol = a.max(b);
        }

        let empty = op.shape == MotionShape::Char && !op.inclusive && op.start == op.end;
        if empty {
            if self.options.strict_empty_region
                && matches!(op.kind, OpKind::Delete | OpKind::Yank | OpKind::Change)
            {
                return Err(NormalError::EmptyRegion);
            }
            if op.kind != OpKind::Change {
                debug!(target: "engine.op", kind = ?op.kind, "empty_region_noop");
                return Ok((false, None));
            }
        }

        debug!(
            target: "engine.op",
            kind = ?op.kind, shape = ?op.shape,
            start_lnum = op.start.lnum, start_col = op.start.col,
            end_lnum = op.end.lnum, end_col = op.end.col,
            "operator_execute"
        );

        let clip_enabled = self.options.clipboard;
        let out = {
            let EditContext {
                buffer,
                undo,
                clipboard,
                delegate,
                ..
            } = cx;
            let _scope = if op.kind.mutates() {
                Some(
                    ChangeScope::begin(&mut **undo, &**buffer, Range::new(op.start, op.end))
                        .map_err(NormalError::from)?,
                )
            } else {
                None
            };
            let mut octx = OpCtx {
                buffer: &mut **buffer,
                clipboard: if clip_enabled {
                    clipboard.as_deref_mut()
                } else {
                    None
                },
                delegate: delegate.as_deref_mut(),
            };
            ops::execute(self, &mut octx, &op)?
        };

        self.marks.set(MarkSlot::OpStart, op.start);
        let end_mark = self.clamp_position(cx.buffer, op.end);
        self.marks.set(MarkSlot::OpEnd, end_mark);
        if out.changed {
            self.marks.set(MarkSlot::LastChange, out.cursor);
        }
        self.cursor = self.clamp_position(cx.buffer, out.cursor);
        if out.changed {
            cx.ui.request_redraw(op.start.lnum, cx.buffer.line_count());
        }
        if out.lines_reported > self.options.report {
            cx.ui
                .message(&format!("{} lines {}", out.lines_reported, op.kind.verb()));
        }
        Ok((out.changed, out.enter_insert))
    }
}

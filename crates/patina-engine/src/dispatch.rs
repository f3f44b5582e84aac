//! The key dispatch cycle.
//!
//! Prefix parsing (counts and register names), the awaiting-argument state,
//! command execution, and the repeat template all live here. One call to
//! `dispatch` consumes exactly one key; commands spanning several keys carry
//! their state in the engine between calls.

use patina_keys::{
    K_CTRL_H, K_CTRL_V, K_DEL, K_DOWN, K_ENTER, K_ESC, K_INTERRUPT, K_UP, Key, KeyInput, KeySource,
};
use patina_state::{ChangeScope, MarkLookup, MarkSlot, RegisterContent, RegisterId};
use patina_text::{MotionShape, Position, Range, col_at_vcol, vcol_of};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::cmdtable::{
    self, AUX_FORWARD, AUX_PUT_AFTER, Cmd, CommandDescriptor, CommandFlags, Outcome,
};
use crate::error::NormalError;
use crate::motion::{
    self, FindKind, FindSpec, MotionResult, first_nonblank_col, grapheme_len_at,
    last_grapheme_start, next_grapheme_start, prev_grapheme_start,
};
use crate::ops::{self, OpCtx};
use crate::pending::{OpKind, PendingOp};
use crate::textobject;
use crate::{
    ChangeTemplate, DispatchResult, EditContext, Engine, InsertRequest, SearchDirection,
    fetch_line,
};

/// Counts larger than this saturate instead of overflowing.
const COUNT_CLAMP: usize = 999_999_999;

/// Count and register prefix being typed for the current command.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CountCycle {
    pub count: usize,
    /// Count typed before a register prefix; multiplies the count typed
    /// after it.
    pub mult: usize,
    pub reg: Option<char>,
}

/// Where the dispatcher is between keys.
#[derive(Debug, Default)]
pub(crate) enum InputState {
    #[default]
    Idle,
    /// A command consumed its trigger key and waits for supplementary keys.
    AwaitingArg {
        key: Key,
        args: SmallVec<[Key; 2]>,
        count: usize,
        reg: Option<char>,
    },
}

/// The key that doubles a `g`-prefixed operator into its line-wise form
/// (`guu`, `gUU`, `g~~`, `g??`, `gqq`).
fn g_double_char(kind: OpKind) -> Option<char> {
    Some(match kind {
        OpKind::Lower => 'u',
        OpKind::Upper => 'U',
        OpKind::Rot13 => '?',
        OpKind::ToggleCase => '~',
        OpKind::Format => 'q',
        _ => return None,
    })
}

fn aux_of(cmd: &Cmd) -> i32 {
    cmdtable::lookup(cmd.key).map_or(0, |d| d.aux)
}

impl Engine {
    /// Feed one input unit. `Idle` is consumed without effect; `Eof` is not
    /// consumed.
    pub fn dispatch_input(&mut self, input: KeyInput, cx: &mut EditContext<'_>) -> DispatchResult {
        match input {
            KeyInput::Key(key) => self.dispatch(key, cx),
            KeyInput::Idle => DispatchResult {
                consumed: true,
                ..DispatchResult::default()
            },
            KeyInput::Eof => DispatchResult::default(),
        }
    }

    /// Feed one decoded key. Failures ring the bell, clear the partial
    /// command, and leave the buffer untouched.
    pub fn dispatch(&mut self, key: Key, cx: &mut EditContext<'_>) -> DispatchResult {
        trace!(target: "engine.dispatch", ?key, "key");
        match self.dispatch_inner(key, cx) {
            Ok(result) => result,
            Err(err) => {
                self.fail(&err, cx);
                DispatchResult {
                    consumed: true,
                    ..DispatchResult::default()
                }
            }
        }
    }

    /// Drain a key source. Returns whether any key changed the buffer.
    pub fn run_source(&mut self, source: &mut dyn KeySource, cx: &mut EditContext<'_>) -> bool {
        let mut dirty = false;
        loop {
            match source.next_key() {
                KeyInput::Eof => break,
                input => dirty |= self.dispatch_input(input, cx).dirty,
            }
        }
        dirty
    }

    fn fail(&mut self, err: &NormalError, cx: &mut EditContext<'_>) {
        debug!(target: "engine.dispatch", %err, "command_failed");
        cx.ui.bell();
        if err.has_message() {
            cx.ui.error(&err.to_string());
        }
        self.clear_pending();
    }

    fn clear_pending(&mut self) {
        self.op = PendingOp::default();
        self.cycle = CountCycle::default();
        self.input = InputState::Idle;
        self.record = None;
    }

    fn consumed_pending() -> DispatchResult {
        DispatchResult {
            consumed: true,
            pending: true,
            ..DispatchResult::default()
        }
    }

    fn record_key(&mut self, key: Key) {
        if self.replaying {
            return;
        }
        if let Some(rec) = self.record.as_mut() {
            rec.keys.push(key);
        }
    }

    /// Fold the typed count with the register-prefix multiplier and a
    /// pending operator's stored count, consuming all three.
    fn take_count(&mut self) -> usize {
        let typed = self.cycle.count;
        self.cycle.count = 0;
        let mut count = if self.cycle.mult > 0 {
            let c = self.cycle.mult * typed.max(1);
            self.cycle.mult = 0;
            c
        } else {
            typed
        };
        if self.is_operator_pending() && self.op.count > 0 {
            count = self.op.count * count.max(1);
            self.op.count = 0;
        }
        count.min(COUNT_CLAMP)
    }

    pub(crate) fn dispatch_inner(
        &mut self,
        key: Key,
        cx: &mut EditContext<'_>,
    ) -> Result<DispatchResult, NormalError> {
        if key == K_INTERRUPT {
            cx.ui.bell();
            self.clear_pending();
            if self.visual.active {
                self.leave_visual(cx)?;
            }
            return Ok(DispatchResult {
                consumed: true,
                ..DispatchResult::default()
            });
        }

        // Supplementary-key completion.
        if let InputState::AwaitingArg {
            key: trigger,
            mut args,
            count,
            reg,
        } = std::mem::take(&mut self.input)
        {
            if key == K_ESC {
                self.clear_pending();
                return Ok(DispatchResult {
                    consumed: true,
                    ..DispatchResult::default()
                });
            }
            args.push(key);
            if trigger != Key::from_char('"') {
                self.record_key(key);
            }
            let desc = cmdtable::lookup(trigger).ok_or(NormalError::UnknownCommand)?;
            let mut cmd = Cmd::new(trigger, count, reg);
            cmd.args = args;
            return self.run_command(desc, cmd, cx);
        }

        // A fresh command cycle opens a fresh repeat record. Nothing typed
        // inside a selection is recorded.
        let fresh = !self.is_operator_pending()
            && self.cycle.count == 0
            && self.cycle.mult == 0
            && self.cycle.reg.is_none();
        if fresh && !self.replaying {
            self.record = if self.visual.active {
                None
            } else {
                Some(ChangeTemplate::default())
            };
        }

        if key == K_ESC {
            if self.is_operator_pending()
                || self.cycle.count > 0
                || self.cycle.mult > 0
                || self.cycle.reg.is_some()
            {
                self.clear_pending();
            } else if self.visual.active {
                self.leave_visual(cx)?;
            }
            return Ok(DispatchResult {
                consumed: true,
                ..DispatchResult::default()
            });
        }

        // Count digits. A leading zero is the column-zero motion instead.
        if let Some(c) = key.as_char()
            && c.is_ascii_digit()
            && (c != '0' || self.cycle.count > 0)
        {
            let d = (c as u8 - b'0') as usize;
            self.cycle.count = (self.cycle.count * 10 + d).min(COUNT_CLAMP);
            if !self.replaying
                && let Some(rec) = self.record.as_mut()
            {
                if rec.keys.is_empty() {
                    rec.count = self.cycle.count;
                } else {
                    rec.keys.push(key);
                }
            }
            return Ok(Self::consumed_pending());
        }

        // Erasing a count digit, while one is being typed.
        if (key == K_CTRL_H || key == K_DEL) && self.cycle.count > 0 {
            self.cycle.count /= 10;
            if !self.replaying
                && let Some(rec) = self.record.as_mut()
            {
                if rec.keys.is_empty() {
                    rec.count = self.cycle.count;
                } else if rec.keys.last().is_some_and(|k| k.is_digit()) {
                    rec.keys.pop();
                }
            }
            return Ok(Self::consumed_pending());
        }

        // The doubling key of a pending g-operator (guu, g~~ and friends)
        // is not a table command of its own.
        if self.is_operator_pending()
            && let Some(c) = key.as_char()
            && g_double_char(self.op.kind) == Some(c)
        {
            self.record_key(key);
            let count = self.take_count();
            let reg = self.cycle.reg.take();
            let cmd = Cmd::new(key, count, reg);
            let outcome = doubled_linewise(self, cx, &cmd)?;
            return self.run_outcome(outcome, CommandFlags::empty(), cx, &cmd);
        }

        let desc = cmdtable::lookup(key).ok_or(NormalError::UnknownCommand)?;
        if desc.flags.contains(CommandFlags::NO_OP_PENDING) && self.is_operator_pending() {
            return Err(NormalError::InapplicableContext);
        }
        if desc.flags.contains(CommandFlags::NOT_IN_CMDWIN) && cx.in_cmdline_window {
            return Err(NormalError::InapplicableContext);
        }

        let count = self.take_count();
        let reg = self.cycle.reg;
        if !desc.flags.contains(CommandFlags::KEEP_REG) {
            self.cycle.reg = None;
        }

        if key != Key::from_char('"') {
            if !self.replaying
                && let Some(rec) = self.record.as_mut()
                && rec.keys.is_empty()
            {
                rec.count = count;
            }
            self.record_key(key);
        }

        // 'i' and 'a' become text-object prefixes when a range is wanted.
        let wants_arg = desc.flags.contains(CommandFlags::NEEDS_ARG)
            || (matches!(key.as_char(), Some('i' | 'a'))
                && (self.is_operator_pending() || self.visual.active));
        if wants_arg {
            self.input = InputState::AwaitingArg {
                key,
                args: SmallVec::new(),
                count,
                reg,
            };
            return Ok(Self::consumed_pending());
        }

        self.run_command(desc, Cmd::new(key, count, reg), cx)
    }

    fn run_command(
        &mut self,
        desc: &CommandDescriptor,
        cmd: Cmd,
        cx: &mut EditContext<'_>,
    ) -> Result<DispatchResult, NormalError> {
        // Column stickiness survives only consecutive vertical moves.
        let vertical = matches!(cmd.key.as_char(), Some('j' | 'k'))
            || cmd.key == K_UP
            || cmd.key == K_DOWN;
        if !vertical {
            self.want_vcol = None;
        }
        debug!(target: "engine.dispatch", key = ?cmd.key, count = cmd.count, reg = ?cmd.reg, "command");
        let outcome = (desc.handler)(self, cx, &cmd)?;
        self.run_outcome(outcome, desc.flags, cx, &cmd)
    }

    fn run_outcome(
        &mut self,
        outcome: Outcome,
        flags: CommandFlags,
        cx: &mut EditContext<'_>,
        cmd: &Cmd,
    ) -> Result<DispatchResult, NormalError> {
        match outcome {
            Outcome::Pending => Ok(Self::consumed_pending()),
            Outcome::Done {
                dirty,
                enter_insert,
            } => {
                if let Some(req) = enter_insert {
                    self.marks.set(MarkSlot::LastInsert, req.at);
                }
                self.maybe_commit_record(dirty || enter_insert.is_some(), flags);
                Ok(DispatchResult {
                    consumed: true,
                    dirty,
                    pending: false,
                    enter_insert,
                })
            }
            Outcome::Motion(m) => {
                if self.is_operator_pending() {
                    let (dirty, enter_insert) = self.finish_operator(cx, m, cmd)?;
                    if let Some(req) = enter_insert {
                        self.marks.set(MarkSlot::LastInsert, req.at);
                    }
                    self.maybe_commit_record(dirty || enter_insert.is_some(), flags);
                    Ok(DispatchResult {
                        consumed: true,
                        dirty,
                        pending: false,
                        enter_insert,
                    })
                } else {
                    if m.jump {
                        self.jumps.push(self.cursor);
                    }
                    self.cursor = self.clamp_position(cx.buffer, m.target);
                    Ok(DispatchResult {
                        consumed: true,
                        ..DispatchResult::default()
                    })
                }
            }
        }
    }

    fn maybe_commit_record(&mut self, changed: bool, flags: CommandFlags) {
        if !changed || self.replaying || flags.contains(CommandFlags::NO_OP_PENDING) {
            return;
        }
        if let Some(rec) = self.record.take()
            && !rec.keys.is_empty()
        {
            self.last_change = Some(rec);
        }
    }

    /// Tear down the selection: set the visual marks, store the reselect
    /// geometry, and return the normalized endpoints.
    fn leave_visual(
        &mut self,
        cx: &mut EditContext<'_>,
    ) -> Result<(Position, Position), NormalError> {
        let mut range = Range::new(self.visual.anchor, self.cursor);
        range.normalize();
        self.marks.set(MarkSlot::VisualStart, range.start);
        self.marks.set(MarkSlot::VisualEnd, range.end);
        let ts = self.options.tabstop;
        let width = match self.visual.shape {
            MotionShape::Line => 0,
            _ => {
                let sline = fetch_line(cx.buffer, range.start.lnum)?;
                let eline = fetch_line(cx.buffer, range.end.lnum)?;
                let a = vcol_of(&sline, range.start.col, ts);
                let b = vcol_of(&eline, range.end.col, ts);
                b.abs_diff(a) + 1
            }
        };
        self.reselect = Some(self.visual.leave(self.cursor, width));
        Ok((range.start, range.end))
    }

    /// Run an operator over the active selection.
    fn visual_operator(
        &mut self,
        cx: &mut EditContext<'_>,
        kind: OpKind,
        cmd: &Cmd,
        replace_char: Option<char>,
        force_shape: Option<MotionShape>,
    ) -> Result<Outcome, NormalError> {
        let shape = force_shape.unwrap_or(self.visual.shape);
        let (start, end) = self.leave_visual(cx)?;
        let mut op = PendingOp::armed(kind, start, cmd.reg, 0);
        op.end = end;
        op.shape = shape;
        op.inclusive = match shape {
            MotionShape::Line => false,
            MotionShape::Block => true,
            MotionShape::Char => !self.options.selection_exclusive,
        };
        op.is_visual = true;
        op.replace_char = replace_char;
        op.shift_units = cmd.count1();
        let (dirty, enter_insert) = self.finalize_op(cx, op)?;
        Ok(Outcome::Done {
            dirty,
            enter_insert,
        })
    }

    /// A put outside the operator pipeline, in its own undo scope. When
    /// `content` is given it is used directly instead of reading `reg`.
    fn run_put(
        &mut self,
        cx: &mut EditContext<'_>,
        content: Option<RegisterContent>,
        before: bool,
        cursor_after: bool,
        count: usize,
        reg: Option<char>,
    ) -> Result<Outcome, NormalError> {
        if content.is_none() && !self.options.clipboard {
            // Fail before opening an undo scope.
            self.registers
                .for_put(reg, None)?
                .ok_or(NormalError::NothingToPut)?;
        }
        let clip_enabled = self.options.clipboard;
        let start = self.cursor;
        let out = {
            let EditContext {
                buffer,
                undo,
                clipboard,
                delegate,
                ..
            } = cx;
            let _scope = ChangeScope::begin(&mut **undo, &**buffer, Range::new(start, start))
                .map_err(NormalError::from)?;
            let mut octx = OpCtx {
                buffer: &mut **buffer,
                clipboard: if clip_enabled {
                    clipboard.as_deref_mut()
                } else {
                    None
                },
                delegate: delegate.as_deref_mut(),
            };
            match content {
                Some(c) => ops::put::place(self, &mut octx, &c, before, cursor_after, count)?,
                None => ops::put::run(self, &mut octx, before, cursor_after, count, reg)?,
            }
        };
        self.marks.set(MarkSlot::LastChange, out.cursor);
        self.cursor = self.clamp_position(cx.buffer, out.cursor);
        cx.ui.request_redraw(start.lnum, cx.buffer.line_count());
        if out.lines_reported > self.options.report {
            cx.ui
                .message(&format!("{} more lines", out.lines_reported));
        }
        Ok(Outcome::dirty())
    }

    /// Replay the last recorded change, with prefix overrides.
    fn repeat_last_change(
        &mut self,
        cx: &mut EditContext<'_>,
        count_override: usize,
        reg_override: Option<char>,
    ) -> Result<Outcome, NormalError> {
        let t = self
            .last_change
            .clone()
            .ok_or(NormalError::InapplicableContext)?;
        debug!(target: "engine.dispatch", keys = t.keys.len(), "repeat_change");
        self.replaying = true;
        self.cycle.count = if count_override > 0 {
            count_override
        } else {
            t.count
        };
        self.cycle.reg = reg_override.or(t.reg);
        let mut dirty = false;
        let mut enter_insert = None;
        for key in t.keys.iter().copied() {
            match self.dispatch_inner(key, cx) {
                Ok(r) => {
                    dirty |= r.dirty;
                    enter_insert = r.enter_insert.or(enter_insert);
                }
                Err(err) => {
                    self.replaying = false;
                    return Err(err);
                }
            }
        }
        self.replaying = false;
        Ok(Outcome::Done {
            dirty,
            enter_insert,
        })
    }
}

// Handler helpers.

/// Arm an operator, or close it when it doubles or a selection is active.
fn arm_operator(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
    kind: OpKind,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, kind, cmd, None, None);
    }
    if engine.is_operator_pending() {
        if engine.op.kind == kind {
            return doubled_linewise(engine, cx, cmd);
        }
        return Err(NormalError::UnknownCommand);
    }
    engine.op = PendingOp::armed(kind, engine.cursor, cmd.reg, cmd.count);
    Ok(Outcome::Pending)
}

/// The doubled form of a pending operator works on whole lines.
fn doubled_linewise(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let mut op = std::mem::take(&mut engine.op);
    let first = engine.cursor.lnum;
    let last = (first + cmd.count1() - 1).min(cx.buffer.line_count());
    op.start = Position::new(first, engine.cursor.col);
    op.end = Position::new(last, 0);
    op.shape = MotionShape::Line;
    op.inclusive = false;
    let (dirty, enter_insert) = engine.finalize_op(cx, op)?;
    Ok(Outcome::Done {
        dirty,
        enter_insert,
    })
}

/// Close a synthesized char-wise operator over `start..end` immediately.
fn synth_char_op(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
    kind: OpKind,
    start: Position,
    end: Position,
    replace_char: Option<char>,
) -> Result<Outcome, NormalError> {
    let mut op = PendingOp::armed(kind, start, cmd.reg, 0);
    op.end = end;
    op.inclusive = false;
    op.replace_char = replace_char;
    let (dirty, enter_insert) = engine.finalize_op(cx, op)?;
    Ok(Outcome::Done {
        dirty,
        enter_insert,
    })
}

/// Close a synthesized line-wise operator over `count` lines from the
/// cursor.
fn synth_line_op(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
    kind: OpKind,
    lines: usize,
) -> Result<Outcome, NormalError> {
    let first = engine.cursor.lnum;
    let last = (first + lines.max(1) - 1).min(cx.buffer.line_count());
    let mut op = PendingOp::armed(kind, Position::new(first, 0), cmd.reg, 0);
    op.end = Position::new(last, 0);
    op.shape = MotionShape::Line;
    let (dirty, enter_insert) = engine.finalize_op(cx, op)?;
    Ok(Outcome::Done {
        dirty,
        enter_insert,
    })
}

/// Advance `count` graphemes within the line, stopping at `limit`.
fn advance_cols(line: &str, from: usize, count: usize, limit: usize) -> usize {
    let mut col = from;
    for _ in 0..count {
        if col >= limit {
            break;
        }
        col = next_grapheme_start(line, col).min(limit);
    }
    col
}

fn retreat_cols(line: &str, from: usize, count: usize) -> usize {
    let mut col = from;
    for _ in 0..count {
        if col == 0 {
            break;
        }
        col = prev_grapheme_start(line, col);
    }
    col
}

/// Last position covered by an end-exclusive range.
fn before_exclusive(
    buffer: &dyn patina_text::LineStorage,
    end: Position,
) -> Result<Position, NormalError> {
    if end.col > 0 {
        let line = fetch_line(buffer, end.lnum)?;
        Ok(Position::new(end.lnum, prev_grapheme_start(&line, end.col)))
    } else if end.lnum > 1 {
        let line = fetch_line(buffer, end.lnum - 1)?;
        Ok(Position::new(end.lnum - 1, last_grapheme_start(&line)))
    } else {
        Ok(end)
    }
}

// Motion handlers.

pub(crate) fn cmd_left(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = retreat_cols(&line, pos.col, cmd.count1());
    if col == pos.col {
        return Err(NormalError::MotionFailed);
    }
    Ok(Outcome::Motion(MotionResult::exclusive(Position::new(
        pos.lnum, col,
    ))))
}

pub(crate) fn cmd_right(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    // As an operator motion the cursor may pass the last character so the
    // final one can be covered.
    let limit = if engine.is_operator_pending() || engine.visual.active {
        line.len()
    } else if line.is_empty() {
        0
    } else {
        last_grapheme_start(&line)
    };
    let col = advance_cols(&line, pos.col, cmd.count1(), limit);
    if col == pos.col {
        return Err(NormalError::MotionFailed);
    }
    Ok(Outcome::Motion(MotionResult::exclusive(Position::new(
        pos.lnum, col,
    ))))
}

pub(crate) fn cmd_updown(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let pos = engine.cursor;
    let delta = cmd.count1();
    let down = aux_of(cmd) > 0;
    let target_lnum = if down {
        let t = pos.lnum + delta;
        if t > cx.buffer.line_count() {
            return Err(NormalError::MotionFailed);
        }
        t
    } else {
        if pos.lnum <= delta {
            return Err(NormalError::MotionFailed);
        }
        pos.lnum - delta
    };
    let target_line = fetch_line(cx.buffer, target_lnum)?;
    let col = if cmd.key == K_ENTER {
        first_nonblank_col(&target_line)
    } else {
        let line = fetch_line(cx.buffer, pos.lnum)?;
        let wv = engine
            .want_vcol
            .unwrap_or_else(|| vcol_of(&line, pos.col, engine.options.tabstop));
        engine.want_vcol = Some(wv);
        col_at_vcol(&target_line, wv, engine.options.tabstop)
    };
    Ok(Outcome::Motion(MotionResult::linewise(Position::new(
        target_lnum,
        col,
    ))))
}

pub(crate) fn cmd_col0(
    engine: &mut Engine,
    _cx: &mut EditContext<'_>,
    _cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    Ok(Outcome::Motion(MotionResult::exclusive(Position::new(
        engine.cursor.lnum,
        0,
    ))))
}

pub(crate) fn cmd_first_nonblank(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    _cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let line = fetch_line(cx.buffer, engine.cursor.lnum)?;
    Ok(Outcome::Motion(MotionResult::exclusive(Position::new(
        engine.cursor.lnum,
        first_nonblank_col(&line),
    ))))
}

pub(crate) fn cmd_eol(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    // With a count the motion ends on the last character count-1 lines down.
    let lnum = (engine.cursor.lnum + cmd.count1() - 1).min(cx.buffer.line_count());
    let line = fetch_line(cx.buffer, lnum)?;
    let col = if line.is_empty() {
        0
    } else {
        last_grapheme_start(&line)
    };
    Ok(Outcome::Motion(MotionResult::inclusive(Position::new(
        lnum, col,
    ))))
}

pub(crate) fn cmd_word(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let big = aux_of(cmd) == cmdtable::AUX_BIG_WORD;
    let pos = engine.cursor;
    // "cw" on a non-blank behaves like "ce": the trailing whitespace is not
    // part of the changed text.
    if engine.op.kind == OpKind::Change {
        let line = fetch_line(cx.buffer, pos.lnum)?;
        let on_word = line
            .get(pos.col..)
            .and_then(|s| s.chars().next())
            .is_some_and(|c| !c.is_whitespace());
        if on_word {
            let target = motion::word_end(cx.buffer, pos, cmd.count1(), big)?;
            return Ok(Outcome::Motion(MotionResult::inclusive(target)));
        }
    }
    let target = motion::next_word_start(cx.buffer, pos, cmd.count1(), big)?;
    Ok(Outcome::Motion(MotionResult::exclusive(target)))
}

pub(crate) fn cmd_back_word(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let big = aux_of(cmd) == cmdtable::AUX_BIG_WORD;
    let target = motion::prev_word_start(cx.buffer, engine.cursor, cmd.count1(), big)?;
    Ok(Outcome::Motion(MotionResult::exclusive(target)))
}

pub(crate) fn cmd_word_end(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let big = aux_of(cmd) == cmdtable::AUX_BIG_WORD;
    let target = motion::word_end(cx.buffer, engine.cursor, cmd.count1(), big)?;
    Ok(Outcome::Motion(MotionResult::inclusive(target)))
}

pub(crate) fn cmd_goto_line(
    _engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let last = cx.buffer.line_count();
    let lnum = if cmd.count > 0 { cmd.count.min(last) } else { last };
    let line = fetch_line(cx.buffer, lnum)?;
    Ok(Outcome::Motion(
        MotionResult::linewise(Position::new(lnum, first_nonblank_col(&line))).with_jump(),
    ))
}

pub(crate) fn cmd_search_next(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let pattern = engine.registers.last_search.clone();
    if pattern.is_empty() {
        return Err(NormalError::InapplicableContext);
    }
    let service = cx
        .search
        .as_deref_mut()
        .ok_or(NormalError::InapplicableContext)?;
    let dir = if aux_of(cmd) > 0 {
        SearchDirection::Forward
    } else {
        SearchDirection::Backward
    };
    let mut from = engine.cursor;
    let mut target = None;
    for _ in 0..cmd.count1() {
        match service.search(&*cx.buffer, from, &pattern, dir) {
            Some(p) => {
                from = p;
                target = Some(p);
            }
            None => return Err(NormalError::MotionFailed),
        }
    }
    let target = target.ok_or(NormalError::MotionFailed)?;
    Ok(Outcome::Motion(MotionResult::exclusive(target).with_jump()))
}

fn find_motion(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    spec: FindSpec,
    count: usize,
) -> Result<Outcome, NormalError> {
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = motion::find_in_line(&line, pos.col, spec, count).ok_or(NormalError::MotionFailed)?;
    let target = Position::new(pos.lnum, col);
    Ok(Outcome::Motion(if spec.kind.inclusive() {
        MotionResult::inclusive(target)
    } else {
        MotionResult::exclusive(target)
    }))
}

pub(crate) fn cmd_find_char(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(ch) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    let kind = match cmd.key.as_char() {
        Some('f') => FindKind::Forward,
        Some('F') => FindKind::Backward,
        Some('t') => FindKind::TillForward,
        Some('T') => FindKind::TillBackward,
        _ => return Err(NormalError::UnknownCommand),
    };
    let spec = FindSpec { ch, kind };
    engine.last_find = Some(spec);
    find_motion(engine, cx, spec, cmd.count1())
}

pub(crate) fn cmd_find_repeat(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let mut spec = engine.last_find.ok_or(NormalError::MotionFailed)?;
    if aux_of(cmd) < 0 {
        spec.kind = spec.kind.reversed();
    }
    find_motion(engine, cx, spec, cmd.count1())
}

pub(crate) fn cmd_mark_jump(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(name) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    let slot = MarkSlot::resolve(name).ok_or(NormalError::UnknownCommand)?;
    let pos = match engine.marks.get(slot) {
        MarkLookup::Found(p) => p,
        MarkLookup::Unset => return Err(NormalError::MotionFailed),
        MarkLookup::InAnotherFile(_) => return Err(NormalError::InapplicableContext),
    };
    // Backtick goes to the exact position; apostrophe is line-wise and lands
    // on the first non-blank.
    Ok(Outcome::Motion(if aux_of(cmd) > 0 {
        let line = fetch_line(cx.buffer, pos.lnum)?;
        let target = Position::new(pos.lnum, first_nonblank_col(&line));
        MotionResult::linewise(target).with_jump()
    } else {
        MotionResult::exclusive(pos).with_jump()
    }))
}

// Prefix and operator handlers.

pub(crate) fn cmd_regname(
    engine: &mut Engine,
    _cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(name) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    RegisterId::resolve(name)?;
    engine.cycle.reg = Some(name);
    engine.cycle.mult = cmd.count;
    if !engine.replaying
        && let Some(rec) = engine.record.as_mut()
    {
        rec.reg = Some(name);
    }
    Ok(Outcome::Pending)
}

pub(crate) fn cmd_operator(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let kind = cmd
        .key
        .as_char()
        .and_then(OpKind::from_key)
        .ok_or(NormalError::UnknownCommand)?;
    arm_operator(engine, cx, cmd, kind)
}

pub(crate) fn cmd_g_prefix(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(c) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    if let Some(kind) = OpKind::from_g(c) {
        return arm_operator(engine, cx, cmd, kind);
    }
    match c {
        'g' => {
            let last = cx.buffer.line_count();
            let lnum = if cmd.count > 0 { cmd.count.min(last) } else { 1 };
            let line = fetch_line(cx.buffer, lnum)?;
            Ok(Outcome::Motion(
                MotionResult::linewise(Position::new(lnum, first_nonblank_col(&line))).with_jump(),
            ))
        }
        'v' => {
            let geom = engine.reselect.ok_or(NormalError::MotionFailed)?;
            let (MarkLookup::Found(start), MarkLookup::Found(end)) = (
                engine.marks.get(MarkSlot::VisualStart),
                engine.marks.get(MarkSlot::VisualEnd),
            ) else {
                return Err(NormalError::MotionFailed);
            };
            engine.visual.start(geom.shape, start);
            engine.cursor = engine.clamp_position(cx.buffer, end);
            Ok(Outcome::quiet())
        }
        'p' => engine.run_put(cx, None, false, true, cmd.count1(), cmd.reg),
        'P' => engine.run_put(cx, None, true, true, cmd.count1(), cmd.reg),
        'J' => join_command(engine, cx, cmd, OpKind::JoinNoSpace),
        _ => Err(NormalError::UnknownCommand),
    }
}

// Single-key edit handlers.

pub(crate) fn cmd_delete_char(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Delete, cmd, None, None);
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    if aux_of(cmd) > 0 {
        let col = advance_cols(&line, pos.col, cmd.count1(), line.len());
        if col == pos.col {
            return Err(NormalError::MotionFailed);
        }
        synth_char_op(engine, cx, cmd, OpKind::Delete, pos, Position::new(pos.lnum, col), None)
    } else {
        let col = retreat_cols(&line, pos.col, cmd.count1());
        if col == pos.col {
            return Err(NormalError::MotionFailed);
        }
        synth_char_op(engine, cx, cmd, OpKind::Delete, Position::new(pos.lnum, col), pos, None)
    }
}

fn to_eol_op(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
    kind: OpKind,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, kind, cmd, None, Some(MotionShape::Line));
    }
    let pos = engine.cursor;
    let last = (pos.lnum + cmd.count1() - 1).min(cx.buffer.line_count());
    let end_line = fetch_line(cx.buffer, last)?;
    synth_char_op(engine, cx, cmd, kind, pos, Position::new(last, end_line.len()), None)
}

pub(crate) fn cmd_delete_to_eol(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    to_eol_op(engine, cx, cmd, OpKind::Delete)
}

pub(crate) fn cmd_change_to_eol(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    to_eol_op(engine, cx, cmd, OpKind::Change)
}

pub(crate) fn cmd_yank_lines(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Yank, cmd, None, Some(MotionShape::Line));
    }
    synth_line_op(engine, cx, cmd, OpKind::Yank, cmd.count1())
}

pub(crate) fn cmd_substitute(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Change, cmd, None, None);
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = advance_cols(&line, pos.col, cmd.count1(), line.len());
    synth_char_op(engine, cx, cmd, OpKind::Change, pos, Position::new(pos.lnum, col), None)
}

pub(crate) fn cmd_substitute_lines(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Change, cmd, None, Some(MotionShape::Line));
    }
    synth_line_op(engine, cx, cmd, OpKind::Change, cmd.count1())
}

pub(crate) fn cmd_tilde(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::ToggleCase, cmd, None, None);
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = advance_cols(&line, pos.col, cmd.count1(), line.len());
    if col == pos.col {
        return Err(NormalError::MotionFailed);
    }
    let outcome = synth_char_op(
        engine,
        cx,
        cmd,
        OpKind::ToggleCase,
        pos,
        Position::new(pos.lnum, col),
        None,
    )?;
    // The cursor advances past the toggled characters.
    engine.cursor = engine.clamp_position(cx.buffer, Position::new(pos.lnum, col));
    Ok(outcome)
}

pub(crate) fn cmd_replace_char(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(ch) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Replace, cmd, Some(ch), None);
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let mut col = pos.col;
    for _ in 0..cmd.count1() {
        if col >= line.len() {
            // Not enough characters on the line to replace.
            return Err(NormalError::MotionFailed);
        }
        col = next_grapheme_start(&line, col);
    }
    synth_char_op(engine, cx, cmd, OpKind::Replace, pos, Position::new(pos.lnum, col), Some(ch))
}

fn join_command(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
    kind: OpKind,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        let (start, end) = engine.leave_visual(cx)?;
        let mut op = PendingOp::armed(kind, Position::new(start.lnum, 0), cmd.reg, 0);
        // A one-line selection still joins with the following line.
        op.end = Position::new(end.lnum.max(start.lnum + 1), 0);
        op.shape = MotionShape::Line;
        let (dirty, enter_insert) = engine.finalize_op(cx, op)?;
        return Ok(Outcome::Done {
            dirty,
            enter_insert,
        });
    }
    synth_line_op(engine, cx, cmd, kind, cmd.count1().max(2))
}

pub(crate) fn cmd_join(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    join_command(engine, cx, cmd, OpKind::Join)
}

pub(crate) fn cmd_put(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let after = aux_of(cmd) == AUX_PUT_AFTER;
    if engine.visual.active {
        // The selection is replaced: capture the register first, since the
        // delete overwrites the unnamed register.
        let content = engine
            .registers
            .for_put(cmd.reg, None)?
            .ok_or(NormalError::NothingToPut)?;
        let shape = engine.visual.shape;
        let mut range = Range::new(engine.visual.anchor, engine.cursor);
        range.normalize();
        let quiet = Cmd::new(cmd.key, 0, None);
        engine.visual_operator(cx, OpKind::Delete, &quiet, None, None)?;
        if shape == MotionShape::Char {
            // The splice point may sit one past the shortened line's end,
            // where the normal-mode clamp cannot hold the cursor.
            engine.cursor = range.start;
        }
        return engine.run_put(cx, Some(content), true, false, cmd.count1(), None);
    }
    engine.run_put(cx, None, !after, false, cmd.count1(), cmd.reg)
}

pub(crate) fn cmd_undo(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        return engine.visual_operator(cx, OpKind::Lower, cmd, None, None);
    }
    let mut any = false;
    for _ in 0..cmd.count1() {
        if cx.undo.undo(&mut *cx.buffer).map_err(NormalError::from)? {
            any = true;
        } else {
            cx.ui.message("Already at oldest change");
            break;
        }
    }
    engine.cursor = engine.clamp_position(cx.buffer, engine.cursor);
    if any {
        cx.ui.request_redraw(1, cx.buffer.line_count());
        Ok(Outcome::dirty())
    } else {
        Ok(Outcome::quiet())
    }
}

pub(crate) fn cmd_repeat_change(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    engine.repeat_last_change(cx, cmd.count, cmd.reg)
}

pub(crate) fn cmd_set_mark(
    engine: &mut Engine,
    _cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let Some(name) = cmd.arg_char(0) else {
        return Err(NormalError::UnknownCommand);
    };
    let slot = MarkSlot::resolve(name).ok_or(NormalError::UnknownCommand)?;
    if !slot.user_settable() {
        return Err(NormalError::InapplicableContext);
    }
    engine.marks.set(slot, engine.cursor);
    Ok(Outcome::quiet())
}

// Visual-mode handlers.

pub(crate) fn cmd_visual(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let shape = if cmd.key == K_CTRL_V {
        MotionShape::Block
    } else {
        match cmd.key.as_char() {
            Some('v') => MotionShape::Char,
            Some('V') => MotionShape::Line,
            _ => return Err(NormalError::UnknownCommand),
        }
    };
    // After an operator the key forces the range's shape instead.
    if engine.is_operator_pending() {
        engine.op.shape_force = Some(shape);
        return Ok(Outcome::Pending);
    }
    if engine.visual.active {
        if engine.visual.shape == shape {
            engine.leave_visual(cx)?;
        } else {
            engine.visual.switch_shape(shape);
        }
        return Ok(Outcome::quiet());
    }
    // A count reselects an area of the last selection's size.
    if cmd.count > 0
        && let Some(geom) = engine.reselect
    {
        let (anchor, lines, width) = geom.apply_at(engine.cursor, cmd.count);
        engine.visual.start(geom.shape, anchor);
        let last = (anchor.lnum + lines - 1).min(cx.buffer.line_count());
        let col = match geom.shape {
            MotionShape::Line => anchor.col,
            _ => {
                let aline = fetch_line(cx.buffer, anchor.lnum)?;
                let base = vcol_of(&aline, anchor.col, engine.options.tabstop);
                let lline = fetch_line(cx.buffer, last)?;
                col_at_vcol(
                    &lline,
                    base + width.saturating_sub(1),
                    engine.options.tabstop,
                )
            }
        };
        engine.cursor = engine.clamp_position(cx.buffer, Position::new(last, col));
        return Ok(Outcome::quiet());
    }
    engine.visual.start(shape, engine.cursor);
    Ok(Outcome::quiet())
}

pub(crate) fn cmd_shift_arrow(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if !engine.visual.active {
        engine.visual.start(MotionShape::Char, engine.cursor);
        engine.visual.select_mode = true;
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = if aux_of(cmd) > 0 {
        let limit = if line.is_empty() {
            0
        } else {
            last_grapheme_start(&line)
        };
        advance_cols(&line, pos.col, cmd.count1(), limit)
    } else {
        retreat_cols(&line, pos.col, cmd.count1())
    };
    engine.cursor = Position::new(pos.lnum, col);
    Ok(Outcome::quiet())
}

// Insert entry points and text objects.

pub(crate) fn cmd_insert_or_object(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let around = aux_of(cmd) == AUX_FORWARD;
    if engine.is_operator_pending() || engine.visual.active {
        let Some(object) = cmd.arg_char(0) else {
            return Err(NormalError::UnknownCommand);
        };
        let (start, end, inclusive) =
            textobject::object_range(cx.buffer, engine.cursor, object, around, cmd.count1())?;
        if engine.is_operator_pending() {
            engine.op.start = start;
            return Ok(Outcome::Motion(MotionResult {
                target: end,
                shape: MotionShape::Char,
                inclusive,
                jump: false,
            }));
        }
        engine.visual.anchor = start;
        let cursor = if inclusive {
            end
        } else {
            before_exclusive(cx.buffer, end)?
        };
        engine.cursor = engine.clamp_position(cx.buffer, cursor);
        return Ok(Outcome::quiet());
    }
    let pos = engine.cursor;
    let at = if around {
        let line = fetch_line(cx.buffer, pos.lnum)?;
        Position::new(pos.lnum, pos.col + grapheme_len_at(&line, pos.col))
    } else {
        pos
    };
    Ok(Outcome::Done {
        dirty: false,
        enter_insert: Some(InsertRequest {
            at,
            block_replay: false,
        }),
    })
}

pub(crate) fn cmd_insert_line_edge(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let append = aux_of(cmd) == AUX_FORWARD;
    if engine.visual.active {
        if engine.visual.shape != MotionShape::Block {
            return Err(NormalError::InapplicableContext);
        }
        let kind = if append {
            OpKind::AppendBlock
        } else {
            OpKind::InsertBlock
        };
        return engine.visual_operator(cx, kind, cmd, None, None);
    }
    let pos = engine.cursor;
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let col = if append {
        line.len()
    } else {
        first_nonblank_col(&line)
    };
    Ok(Outcome::Done {
        dirty: false,
        enter_insert: Some(InsertRequest {
            at: Position::new(pos.lnum, col),
            block_replay: false,
        }),
    })
}

pub(crate) fn cmd_open_or_swap(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if engine.visual.active {
        let mut cursor = engine.cursor;
        engine.visual.swap_anchor(&mut cursor);
        engine.cursor = cursor;
        return Ok(Outcome::quiet());
    }
    let below = aux_of(cmd) > 0;
    let pos = engine.cursor;
    let indent = if engine.options.autoindent {
        let line = fetch_line(cx.buffer, pos.lnum)?;
        line[..first_nonblank_col(&line)].to_string()
    } else {
        String::new()
    };
    let after = if below { pos.lnum } else { pos.lnum - 1 };
    {
        let EditContext { buffer, undo, .. } = cx;
        let _scope = ChangeScope::begin(&mut **undo, &**buffer, Range::new(pos, pos))
            .map_err(NormalError::from)?;
        buffer
            .insert_line(after, &indent)
            .map_err(NormalError::from)?;
    }
    engine.note_lines_inserted(after, 1);
    let at = Position::new(after + 1, indent.len());
    engine.cursor = engine.clamp_position(cx.buffer, at);
    cx.ui.request_redraw(at.lnum, cx.buffer.line_count());
    Ok(Outcome::Done {
        dirty: true,
        enter_insert: Some(InsertRequest {
            at,
            block_replay: false,
        }),
    })
}

// Jumps and delegation.

pub(crate) fn cmd_jump_walk(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    let delta = aux_of(cmd) as isize * cmd.count1() as isize;
    let pos = engine
        .jumps
        .navigate(delta, engine.cursor)
        .ok_or(NormalError::MotionFailed)?;
    engine.cursor = engine.clamp_position(cx.buffer, pos);
    Ok(Outcome::quiet())
}

pub(crate) fn cmd_colon_range(
    engine: &mut Engine,
    cx: &mut EditContext<'_>,
    cmd: &Cmd,
) -> Result<Outcome, NormalError> {
    if !engine.visual.active {
        return Err(NormalError::InapplicableContext);
    }
    let (start, end) = engine.leave_visual(cx)?;
    let mut op = PendingOp::armed(OpKind::Colon, Position::new(start.lnum, 0), cmd.reg, 0);
    op.end = Position::new(end.lnum, 0);
    op.shape = MotionShape::Line;
    let (dirty, enter_insert) = engine.finalize_op(cx, op)?;
    Ok(Outcome::Done {
        dirty,
        enter_insert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patina_text::RopeBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn grapheme_stepping_respects_limits() {
        assert_eq!(advance_cols("abcde", 0, 3, 5), 3);
        assert_eq!(advance_cols("abcde", 3, 9, 5), 5);
        assert_eq!(advance_cols("", 0, 2, 0), 0);
        assert_eq!(retreat_cols("abcde", 4, 2), 2);
        assert_eq!(retreat_cols("abcde", 1, 9), 0);
    }

    #[test]
    fn exclusive_end_steps_back_across_lines() {
        let b = RopeBuffer::from_str("one\ntwo\n");
        let p = before_exclusive(&b, Position::new(2, 0)).unwrap();
        assert_eq!(p, Position::new(1, 2));
        let p = before_exclusive(&b, Position::new(2, 2)).unwrap();
        assert_eq!(p, Position::new(2, 1));
    }

    #[test]
    fn only_case_and_format_operators_double_under_g() {
        assert_eq!(g_double_char(OpKind::Lower), Some('u'));
        assert_eq!(g_double_char(OpKind::Upper), Some('U'));
        assert_eq!(g_double_char(OpKind::ToggleCase), Some('~'));
        assert_eq!(g_double_char(OpKind::Format), Some('q'));
        assert_eq!(g_double_char(OpKind::Delete), None);
        assert_eq!(g_double_char(OpKind::CallFunction), None);
    }
}

//! Modal command interpretation.
//!
//! The engine owns the normal-mode command cycle: count and register
//! prefixes, pending operators, motions and text objects, visual selections,
//! marks, the jumplist, and the operator executors. It edits through the
//! `LineStorage` trait and reports through `UiSink`; it never renders, never
//! reads keys itself, and never implements insert mode. The embedder feeds
//! decoded keys in and honors the insert-mode requests that come back.
//!
//! ```no_run
//! use patina_config::Options;
//! use patina_engine::{EditContext, Engine};
//! use patina_keys::Key;
//! use patina_state::SnapshotUndo;
//! use patina_text::RopeBuffer;
//!
//! struct Quiet;
//! impl patina_engine::UiSink for Quiet {
//!     fn bell(&mut self) {}
//!     fn message(&mut self, _: &str) {}
//!     fn error(&mut self, _: &str) {}
//! }
//!
//! let mut buffer = RopeBuffer::from_str("alpha beta\n");
//! let mut undo = SnapshotUndo::new();
//! let mut ui = Quiet;
//! let mut engine = Engine::new(Options::default());
//! let mut cx = EditContext {
//!     buffer: &mut buffer,
//!     undo: &mut undo,
//!     ui: &mut ui,
//!     search: None,
//!     clipboard: None,
//!     delegate: None,
//!     in_cmdline_window: false,
//! };
//! for c in "dw".chars() {
//!     engine.dispatch(Key::from_char(c), &mut cx);
//! }
//! ```

use patina_config::Options;
use patina_keys::Key;
use patina_state::{
    Clipboard, JumpList, MarkFile, MarkSlot, RegisterContent, RegisterFile, RegisterId, UndoLog,
    VisualState,
};
use patina_text::{LineStorage, MotionShape, Position, line_vcol_width, vcol::col_at_vcol};
use smallvec::SmallVec;

pub mod error;

mod cmdtable;
mod dispatch;
mod motion;
mod ops;
mod pending;
mod textobject;

pub use cmdtable::{Cmd, CommandFlags};
pub use error::NormalError;
pub use pending::OpKind;

use dispatch::{CountCycle, InputState};
use motion::{FindSpec, last_grapheme_start};
use patina_state::ReselectGeometry;

/// Everything a dispatched key may touch, borrowed for the duration of one
/// `dispatch` call. Optional collaborators degrade the commands that need
/// them rather than the whole engine.
pub struct EditContext<'a> {
    pub buffer: &'a mut dyn LineStorage,
    pub undo: &'a mut dyn UndoLog,
    pub ui: &'a mut dyn UiSink,
    pub search: Option<&'a mut dyn SearchService>,
    pub clipboard: Option<&'a mut dyn Clipboard>,
    pub delegate: Option<&'a mut dyn RangeDelegate>,
    /// The command-line window restricts window-leaving commands.
    pub in_cmdline_window: bool,
}

/// Feedback surface. The engine never prints; it hands text and redraw
/// hints to the embedder.
pub trait UiSink {
    fn bell(&mut self);
    fn message(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn request_redraw(&mut self, _first_lnum: usize, _last_lnum: usize) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Pattern search provider backing `n`/`N`.
pub trait SearchService {
    fn search(
        &mut self,
        buffer: &dyn LineStorage,
        from: Position,
        pattern: &str,
        dir: SearchDirection,
    ) -> Option<Position>;
}

/// Line-range services the engine delegates rather than implements: filter
/// through an external command, reindent, reformat, ranged command lines,
/// and the operator-function hook. Each range method returns the new line
/// count of the operated range so positions can re-map.
pub trait RangeDelegate {
    fn filter(
        &mut self,
        buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize>;
    fn indent(
        &mut self,
        buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize>;
    fn format(
        &mut self,
        buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize>;
    fn call_function(
        &mut self,
        buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize>;
    fn colon(&mut self, first: usize, last: usize) -> anyhow::Result<()>;
}

/// What one dispatched key did.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchResult {
    /// The key was recognized and consumed (possibly by failing cleanly).
    pub consumed: bool,
    /// The buffer changed.
    pub dirty: bool,
    /// More keys are needed to finish the current command.
    pub pending: bool,
    /// The embedder should enter insert mode.
    pub enter_insert: Option<InsertRequest>,
}

/// Request to enter insert mode at a position. `block_replay` asks the
/// embedder to report the typed text back through `apply_block_insert` when
/// the insert ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertRequest {
    pub at: Position,
    pub block_replay: bool,
}

/// Armed block insert/append, waiting for the insert text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockInsert {
    pub first: usize,
    pub last: usize,
    pub vcol: usize,
    pub append: bool,
}

/// A completed change, replayable by the repeat command. The leading count
/// and register prefix are held apart so a new prefix can override them.
#[derive(Debug, Clone, Default)]
pub struct ChangeTemplate {
    pub count: usize,
    pub reg: Option<char>,
    pub keys: SmallVec<[Key; 8]>,
}

pub(crate) fn fetch_line(buffer: &dyn LineStorage, lnum: usize) -> Result<String, NormalError> {
    buffer.line(lnum).map_err(NormalError::from)
}

/// The command interpreter. Owns all cross-key state; borrows the buffer
/// and collaborators per key through [`EditContext`].
pub struct Engine {
    pub options: Options,
    pub registers: RegisterFile,
    pub marks: MarkFile,
    pub jumps: JumpList,
    pub(crate) visual: VisualState,
    pub(crate) cursor: Position,
    pub(crate) input: InputState,
    pub(crate) cycle: CountCycle,
    pub(crate) op: pending::PendingOp,
    pub(crate) reselect: Option<ReselectGeometry>,
    pub(crate) last_find: Option<FindSpec>,
    pub(crate) want_vcol: Option<usize>,
    pub(crate) block_insert: Option<BlockInsert>,
    pub(crate) last_change: Option<ChangeTemplate>,
    pub(crate) record: Option<ChangeTemplate>,
    pub(crate) replaying: bool,
}

impl Engine {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            registers: RegisterFile::new(),
            marks: MarkFile::new(0),
            jumps: JumpList::new(),
            visual: VisualState::default(),
            cursor: Position::new(1, 0),
            input: InputState::Idle,
            cycle: CountCycle::default(),
            op: pending::PendingOp::default(),
            reselect: None,
            last_find: None,
            want_vcol: None,
            block_insert: None,
            last_change: None,
            record: None,
            replaying: false,
        }
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn set_cursor(&mut self, buffer: &dyn LineStorage, pos: Position) {
        self.cursor = self.clamp_position(buffer, pos);
    }

    pub fn is_operator_pending(&self) -> bool {
        self.op.kind != OpKind::None
    }

    pub fn visual_active(&self) -> bool {
        self.visual.active
    }

    pub fn visual_shape(&self) -> MotionShape {
        self.visual.shape
    }

    pub fn visual_anchor(&self) -> Position {
        self.visual.anchor
    }

    /// Current contents of a register by name, without clipboard access.
    pub fn register_contents(
        &self,
        name: char,
    ) -> Result<Option<RegisterContent>, NormalError> {
        let id = RegisterId::resolve(name)?;
        Ok(self.registers.read(id, None))
    }

    pub fn last_change_template(&self) -> Option<&ChangeTemplate> {
        self.last_change.as_ref()
    }

    /// Pull a cursor back onto a valid normal-mode position.
    pub(crate) fn clamp_position(&self, buffer: &dyn LineStorage, mut pos: Position) -> Position {
        pos.lnum = pos.lnum.clamp(1, buffer.line_count().max(1));
        let line = buffer.line(pos.lnum).unwrap_or_default();
        pos.col = if line.is_empty() {
            0
        } else {
            pos.col.min(last_grapheme_start(&line))
        };
        if !self.options.virtual_edit {
            pos.coladd = 0;
        }
        pos
    }

    pub(crate) fn arm_block_insert(&mut self, bi: BlockInsert) {
        self.block_insert = Some(bi);
    }

    /// Lines `first..=last` were removed; re-map everything positional.
    pub(crate) fn note_lines_deleted(&mut self, first: usize, last: usize) {
        self.marks.adjust_delete(first, last);
        self.jumps.adjust_delete(first, last);
    }

    /// `count` lines appeared after line `after`.
    pub(crate) fn note_lines_inserted(&mut self, after: usize, count: usize) {
        self.marks.adjust_insert(after, count);
        self.jumps.adjust_insert(after, count);
    }

    /// Replay the text typed during a block insert/append onto the remaining
    /// block lines. Called by the embedder when the insert that a
    /// `block_replay` request started has ended; `typed` is the inserted
    /// text of the first line.
    pub fn apply_block_insert(
        &mut self,
        buffer: &mut dyn LineStorage,
        typed: &str,
    ) -> Result<(), NormalError> {
        let Some(bi) = self.block_insert.take() else {
            return Ok(());
        };
        if typed.is_empty() || typed.contains('\n') {
            return Ok(());
        }
        let ts = self.options.tabstop;
        for lnum in bi.first + 1..=bi.last.min(buffer.line_count()) {
            let line = fetch_line(buffer, lnum)?;
            let width = line_vcol_width(&line, ts);
            let col = if width < bi.vcol {
                // Insert skips short lines; append pads them out.
                if !bi.append {
                    continue;
                }
                let mut padded = line.clone();
                padded.push_str(&" ".repeat(bi.vcol - width));
                buffer.set_line(lnum, &padded).map_err(NormalError::from)?;
                padded.len()
            } else {
                col_at_vcol(&line, bi.vcol, ts)
            };
            let line = fetch_line(buffer, lnum)?;
            let mut new = line[..col].to_string();
            new.push_str(typed);
            new.push_str(&line[col..]);
            buffer.set_line(lnum, &new).map_err(NormalError::from)?;
        }
        self.marks.set(MarkSlot::LastInsert, Position::new(bi.first, 0));
        Ok(())
    }
}

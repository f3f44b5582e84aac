//! The normal-mode command table.
//!
//! One descriptor per trigger key, built once and shared. Lookup is a direct
//! array index for keys whose absolute code fits the printable range and a
//! binary search over the sorted tail for special keys, mirroring how the
//! two key families share one by-absolute-value ordering.

use std::sync::OnceLock;

use bitflags::bitflags;
use patina_keys::{
    K_BS, K_CTRL_O, K_CTRL_V, K_DEL, K_DOWN, K_END, K_ENTER, K_HOME, K_LEFT, K_RIGHT, K_S_LEFT,
    K_S_RIGHT, K_TAB, K_UP, Key,
};
use smallvec::SmallVec;

use crate::dispatch;
use crate::error::NormalError;
use crate::motion::MotionResult;
use crate::{EditContext, Engine, InsertRequest};

bitflags! {
    /// Capability flags carried by each command descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u16 {
        /// The command consumes one supplementary key before executing.
        const NEEDS_ARG = 1 << 0;
        /// The supplementary key is required even when the command is
        /// aborted mid-way (it must be swallowed, never re-dispatched).
        const ALWAYS_ARG = 1 << 1;
        /// Invalid while an operator is pending.
        const NO_OP_PENDING = 1 << 2;
        /// The supplementary key is taken in the input language (literal,
        /// exempt from remapping layers).
        const LANG_ARG = 1 << 3;
        /// May start a selection (visual/select entry points).
        const MAY_START_SEL = 1 << 4;
        /// Shifted movement: starts select-mode selection before moving.
        const SHIFT_SEL_START = 1 << 5;
        /// Leaves any active selection before executing.
        const STOP_SEL = 1 << 6;
        /// Affected by right-to-left display (direction-symmetric motions).
        const RL_SENSITIVE = 1 << 7;
        /// Keeps the typed register prefix alive for the next command.
        const KEEP_REG = 1 << 8;
        /// Not allowed while the command-line window is open.
        const NOT_IN_CMDWIN = 1 << 9;
    }
}

/// A parsed command ready to execute: trigger key, supplementary keys, and
/// the count/register state captured from the prefix parser.
#[derive(Debug, Clone)]
pub struct Cmd {
    pub key: Key,
    pub args: SmallVec<[Key; 2]>,
    /// Effective count; 0 means none was typed.
    pub count: usize,
    pub reg: Option<char>,
}

impl Cmd {
    pub fn new(key: Key, count: usize, reg: Option<char>) -> Self {
        Self {
            key,
            args: SmallVec::new(),
            count,
            reg,
        }
    }

    pub fn count1(&self) -> usize {
        self.count.max(1)
    }

    pub fn arg_char(&self, idx: usize) -> Option<char> {
        self.args.get(idx).and_then(|k| k.as_char())
    }
}

/// What a handler produced.
pub(crate) enum Outcome {
    /// Command finished; `dirty` says whether the buffer changed.
    Done {
        dirty: bool,
        enter_insert: Option<InsertRequest>,
    },
    /// A motion result, to move the cursor or close a pending operator.
    Motion(MotionResult),
    /// An operator was armed and now waits for its motion.
    Pending,
}

impl Outcome {
    pub(crate) fn quiet() -> Self {
        Outcome::Done {
            dirty: false,
            enter_insert: None,
        }
    }

    pub(crate) fn dirty() -> Self {
        Outcome::Done {
            dirty: true,
            enter_insert: None,
        }
    }
}

pub(crate) type Handler =
    fn(&mut Engine, &mut EditContext<'_>, &Cmd) -> Result<Outcome, NormalError>;

pub struct CommandDescriptor {
    pub key: Key,
    pub(crate) handler: Handler,
    pub flags: CommandFlags,
    /// Handler-specific argument (direction, word class, put variant).
    pub aux: i32,
}

// aux conventions shared with the handlers.
pub(crate) const AUX_FORWARD: i32 = 1;
pub(crate) const AUX_BACKWARD: i32 = -1;
pub(crate) const AUX_BIG_WORD: i32 = 2;
pub(crate) const AUX_PUT_AFTER: i32 = 1;
pub(crate) const AUX_PUT_CURSOR_AFTER: i32 = 2;

const DIRECT_LIMIT: usize = 256;

pub(crate) struct CommandTable {
    direct: [Option<u16>; DIRECT_LIMIT],
    /// Indices of special-key entries, sorted by absolute code.
    tail: Vec<u16>,
    entries: Vec<CommandDescriptor>,
}

fn entry(key: impl Into<Key>, handler: Handler, flags: CommandFlags, aux: i32) -> CommandDescriptor {
    CommandDescriptor {
        key: key.into(),
        handler,
        flags,
        aux,
    }
}

fn build() -> CommandTable {
    use CommandFlags as F;
    let none = F::empty();
    let entries = vec![
        // Left/right motions.
        entry('h', dispatch::cmd_left, F::RL_SENSITIVE, AUX_BACKWARD),
        entry(K_LEFT, dispatch::cmd_left, F::RL_SENSITIVE, AUX_BACKWARD),
        entry(K_BS, dispatch::cmd_left, none, AUX_BACKWARD),
        entry(Key(8), dispatch::cmd_left, none, AUX_BACKWARD),
        entry('l', dispatch::cmd_right, F::RL_SENSITIVE, AUX_FORWARD),
        entry(K_RIGHT, dispatch::cmd_right, F::RL_SENSITIVE, AUX_FORWARD),
        entry(' ', dispatch::cmd_right, none, AUX_FORWARD),
        // Up/down motions.
        entry('j', dispatch::cmd_updown, none, AUX_FORWARD),
        entry(K_DOWN, dispatch::cmd_updown, none, AUX_FORWARD),
        entry('k', dispatch::cmd_updown, none, AUX_BACKWARD),
        entry(K_UP, dispatch::cmd_updown, none, AUX_BACKWARD),
        entry(K_ENTER, dispatch::cmd_updown, none, AUX_FORWARD),
        // Line-position motions. '0' is reachable only when no count is
        // being typed; digits are consumed by the prefix parser first.
        entry('0', dispatch::cmd_col0, none, 0),
        entry(K_HOME, dispatch::cmd_col0, none, 0),
        entry('^', dispatch::cmd_first_nonblank, none, 0),
        entry('$', dispatch::cmd_eol, none, 0),
        entry(K_END, dispatch::cmd_eol, none, 0),
        // Word motions.
        entry('w', dispatch::cmd_word, none, 0),
        entry('W', dispatch::cmd_word, none, AUX_BIG_WORD),
        entry('b', dispatch::cmd_back_word, none, 0),
        entry('B', dispatch::cmd_back_word, none, AUX_BIG_WORD),
        entry('e', dispatch::cmd_word_end, none, 0),
        entry('E', dispatch::cmd_word_end, none, AUX_BIG_WORD),
        // Line jumps and searches.
        entry('G', dispatch::cmd_goto_line, none, 0),
        entry('n', dispatch::cmd_search_next, none, AUX_FORWARD),
        entry('N', dispatch::cmd_search_next, none, AUX_BACKWARD),
        // Character finds and their repeats.
        entry('f', dispatch::cmd_find_char, F::NEEDS_ARG | F::LANG_ARG, 0),
        entry('F', dispatch::cmd_find_char, F::NEEDS_ARG | F::LANG_ARG, 0),
        entry('t', dispatch::cmd_find_char, F::NEEDS_ARG | F::LANG_ARG, 0),
        entry('T', dispatch::cmd_find_char, F::NEEDS_ARG | F::LANG_ARG, 0),
        entry(';', dispatch::cmd_find_repeat, none, AUX_FORWARD),
        entry(',', dispatch::cmd_find_repeat, none, AUX_BACKWARD),
        // Mark jumps.
        entry('`', dispatch::cmd_mark_jump, F::NEEDS_ARG, 0),
        entry('\'', dispatch::cmd_mark_jump, F::NEEDS_ARG, AUX_FORWARD),
        // Register prefix.
        entry('"', dispatch::cmd_regname, F::NEEDS_ARG | F::KEEP_REG, 0),
        // Operators.
        entry('d', dispatch::cmd_operator, none, 0),
        entry('y', dispatch::cmd_operator, none, 0),
        entry('c', dispatch::cmd_operator, none, 0),
        entry('<', dispatch::cmd_operator, none, 0),
        entry('>', dispatch::cmd_operator, none, 0),
        entry('=', dispatch::cmd_operator, none, 0),
        entry('!', dispatch::cmd_operator, none, 0),
        // Two-key commands behind the 'g' prefix.
        entry('g', dispatch::cmd_g_prefix, F::NEEDS_ARG | F::ALWAYS_ARG, 0),
        // Single-key edits.
        entry('x', dispatch::cmd_delete_char, F::STOP_SEL, AUX_FORWARD),
        entry(K_DEL, dispatch::cmd_delete_char, F::STOP_SEL, AUX_FORWARD),
        entry('X', dispatch::cmd_delete_char, none, AUX_BACKWARD),
        entry('D', dispatch::cmd_delete_to_eol, none, 0),
        entry('C', dispatch::cmd_change_to_eol, none, 0),
        entry('Y', dispatch::cmd_yank_lines, none, 0),
        entry('s', dispatch::cmd_substitute, none, 0),
        entry('S', dispatch::cmd_substitute_lines, none, 0),
        entry('~', dispatch::cmd_tilde, none, 0),
        entry('r', dispatch::cmd_replace_char, F::NEEDS_ARG | F::ALWAYS_ARG | F::LANG_ARG, 0),
        entry('J', dispatch::cmd_join, none, 0),
        // Puts.
        entry('p', dispatch::cmd_put, none, AUX_PUT_AFTER),
        entry('P', dispatch::cmd_put, none, 0),
        // Undo and repeat.
        entry('u', dispatch::cmd_undo, F::NO_OP_PENDING, 0),
        entry('.', dispatch::cmd_repeat_change, F::NO_OP_PENDING, 0),
        // Marks.
        entry('m', dispatch::cmd_set_mark, F::NEEDS_ARG, 0),
        // Visual mode.
        entry('v', dispatch::cmd_visual, F::MAY_START_SEL | F::NOT_IN_CMDWIN, 0),
        entry('V', dispatch::cmd_visual, F::MAY_START_SEL | F::NOT_IN_CMDWIN, 0),
        entry(K_CTRL_V, dispatch::cmd_visual, F::MAY_START_SEL | F::NOT_IN_CMDWIN, 0),
        entry(K_S_LEFT, dispatch::cmd_shift_arrow, F::SHIFT_SEL_START | F::MAY_START_SEL, AUX_BACKWARD),
        entry(K_S_RIGHT, dispatch::cmd_shift_arrow, F::SHIFT_SEL_START | F::MAY_START_SEL, AUX_FORWARD),
        // Insert entry points; 'i'/'a' double as text-object prefixes when
        // an operator is pending or a selection is active.
        entry('i', dispatch::cmd_insert_or_object, F::STOP_SEL, 0),
        entry('a', dispatch::cmd_insert_or_object, F::STOP_SEL, AUX_FORWARD),
        entry('I', dispatch::cmd_insert_line_edge, F::STOP_SEL, 0),
        entry('A', dispatch::cmd_insert_line_edge, F::STOP_SEL, AUX_FORWARD),
        entry('o', dispatch::cmd_open_or_swap, none, AUX_FORWARD),
        entry('O', dispatch::cmd_open_or_swap, none, AUX_BACKWARD),
        // Jump-list walks.
        entry(K_CTRL_O, dispatch::cmd_jump_walk, F::NO_OP_PENDING | F::NOT_IN_CMDWIN, AUX_BACKWARD),
        entry(K_TAB, dispatch::cmd_jump_walk, F::NO_OP_PENDING | F::NOT_IN_CMDWIN, AUX_FORWARD),
        // Ranged command-line delegation (selection only).
        entry(':', dispatch::cmd_colon_range, F::NOT_IN_CMDWIN, 0),
    ];

    let mut direct = [None; DIRECT_LIMIT];
    let mut tail: Vec<u16> = Vec::new();
    for (i, desc) in entries.iter().enumerate() {
        let abs = desc.key.abs_code() as usize;
        if abs < DIRECT_LIMIT {
            debug_assert!(direct[abs].is_none(), "duplicate key {:?}", desc.key);
            direct[abs] = Some(i as u16);
        } else {
            tail.push(i as u16);
        }
    }
    tail.sort_by_key(|&i| entries[i as usize].key.abs_code());
    debug_assert!(
        tail.windows(2)
            .all(|w| entries[w[0] as usize].key.abs_code() != entries[w[1] as usize].key.abs_code()),
        "duplicate special key"
    );
    CommandTable {
        direct,
        tail,
        entries,
    }
}

fn table() -> &'static CommandTable {
    static TABLE: OnceLock<CommandTable> = OnceLock::new();
    TABLE.get_or_init(build)
}

pub(crate) fn lookup(key: Key) -> Option<&'static CommandDescriptor> {
    let t = table();
    let abs = key.abs_code();
    if (abs as usize) < DIRECT_LIMIT {
        t.direct[abs as usize].map(|i| &t.entries[i as usize])
    } else {
        t.tail
            .binary_search_by_key(&abs, |&i| t.entries[i as usize].key.abs_code())
            .ok()
            .map(|pos| &t.entries[t.tail[pos] as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_and_special_keys_resolve() {
        assert_eq!(lookup(Key::from_char('d')).unwrap().key, Key::from_char('d'));
        assert_eq!(lookup(K_DEL).unwrap().key, K_DEL);
        assert!(lookup(Key::from_char('\u{1f600}')).is_none());
    }

    #[test]
    fn find_commands_demand_an_argument() {
        let f = lookup(Key::from_char('f')).unwrap();
        assert!(f.flags.contains(CommandFlags::NEEDS_ARG));
        assert!(f.flags.contains(CommandFlags::LANG_ARG));
    }

    #[test]
    fn undo_is_rejected_while_operator_pending() {
        let u = lookup(Key::from_char('u')).unwrap();
        assert!(u.flags.contains(CommandFlags::NO_OP_PENDING));
    }

    #[test]
    fn count1_defaults_to_one() {
        let cmd = Cmd::new(Key::from_char('w'), 0, None);
        assert_eq!(cmd.count1(), 1);
        let cmd = Cmd::new(Key::from_char('w'), 4, None);
        assert_eq!(cmd.count1(), 4);
    }
}

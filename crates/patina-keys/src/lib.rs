//! Decoded key codes and key sources.
//!
//! Printable keys carry their Unicode scalar value as a positive code;
//! special (non-printable) keys are negative constants. The command table
//! compares keys by absolute value so both families share one ordering.

use std::fmt;

/// A single decoded key. Positive codes are printable characters; negative
/// codes are the special keys enumerated below.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub i32);

pub const K_ESC: Key = Key(0x1b);
/// Interrupt (Ctrl-C). Aborts a partially typed command wherever the
/// dispatcher would otherwise wait for more input.
pub const K_INTERRUPT: Key = Key(3);
/// Ctrl-H; erases one count digit while a count is being typed.
pub const K_CTRL_H: Key = Key(8);
pub const K_TAB: Key = Key(9);
pub const K_ENTER: Key = Key(13);
pub const K_CTRL_O: Key = Key(15);
pub const K_CTRL_R: Key = Key(18);
pub const K_CTRL_V: Key = Key(22);

// Special keys sit above the printable range in absolute value so the
// shared by-absolute-value ordering never collides with a character code.
pub const K_UP: Key = Key(-1001);
pub const K_DOWN: Key = Key(-1002);
pub const K_LEFT: Key = Key(-1003);
pub const K_RIGHT: Key = Key(-1004);
pub const K_HOME: Key = Key(-1005);
pub const K_END: Key = Key(-1006);
pub const K_DEL: Key = Key(-1007);
pub const K_BS: Key = Key(-1008);
pub const K_S_LEFT: Key = Key(-1009);
pub const K_S_RIGHT: Key = Key(-1010);

impl Key {
    pub fn from_char(c: char) -> Self {
        Key(c as i32)
    }

    /// The printable character for positive codes, `None` for special keys.
    pub fn as_char(self) -> Option<char> {
        if self.0 > 0 {
            char::from_u32(self.0 as u32)
        } else {
            None
        }
    }

    /// Absolute code used for table ordering and lookup.
    pub fn abs_code(self) -> i32 {
        self.0.abs()
    }

    pub fn is_special(self) -> bool {
        self.0 < 0
    }

    pub fn is_digit(self) -> bool {
        matches!(self.as_char(), Some(c) if c.is_ascii_digit())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) if !c.is_control() => write!(f, "Key({c:?})"),
            _ => write!(f, "Key({})", self.0),
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::from_char(c)
    }
}

/// One unit pulled from a key source. `Idle` is the timeout-driven
/// cursor-hold signal; it arrives instead of a key at a suspension point and
/// is handled as an ordinary, cancellable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Key(Key),
    Idle,
    Eof,
}

/// Blocking pull source of decoded keys. The dispatch loop owns exactly one
/// of these; `next_key` is the only suspension point.
pub trait KeySource {
    fn next_key(&mut self) -> KeyInput;
}

/// Replays a fixed sequence of keys, then reports `Eof`. Test harnesses and
/// scripted replay both use this.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    queue: std::collections::VecDeque<KeyInput>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        let mut sk = Self::new();
        sk.push_str(s);
        sk
    }

    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.queue.push_back(KeyInput::Key(Key::from_char(c)));
        }
    }

    pub fn push(&mut self, input: KeyInput) {
        self.queue.push_back(input);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> KeyInput {
        let input = self.queue.pop_front().unwrap_or(KeyInput::Eof);
        tracing::trace!(target: "keys.source", ?input, "scripted_next_key");
        input
    }
}

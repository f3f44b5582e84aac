//! Register store.
//!
//! One `RegisterId` sum type covers the whole name space — unnamed, the
//! numbered delete ring, named letters (uppercase appends to the lowercase
//! slot), the small-delete register, clipboard mirrors, the black hole, and
//! the read-only computed views — with a single resolution function instead
//! of ad hoc character arithmetic.

use patina_text::MotionShape;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register name '{0}'")]
    Invalid(char),
    #[error("register '{0}' is read-only")]
    ReadOnly(char),
}

/// Resolved register identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterId {
    Unnamed,
    /// Delete ring slot "1".."9", most recent first.
    Numbered(u8),
    /// Register "0": most recent yank.
    YankZero,
    /// "a".."z" replace, "A".."Z" append into the same slot.
    Named { slot: u8, append: bool },
    /// "-": most recent within-line delete.
    SmallDelete,
    /// "*": system selection mirror.
    Selection,
    /// "+": system clipboard mirror.
    ClipboardPlus,
    /// "_": never stores anything.
    BlackHole,
    /// "%": current file name (computed).
    FileName,
    /// "#": alternate file name (computed).
    AlternateFile,
    /// ":": last command line (computed).
    LastCommand,
    /// ".": last inserted text (computed).
    LastInserted,
    /// "/": last search pattern (computed).
    LastSearch,
    /// "=": expression register (computed).
    Expression,
}

impl RegisterId {
    pub fn resolve(name: char) -> Result<Self, RegisterError> {
        Ok(match name {
            '"' => RegisterId::Unnamed,
            '0' => RegisterId::YankZero,
            '1'..='9' => RegisterId::Numbered(name as u8 - b'0'),
            'a'..='z' => RegisterId::Named {
                slot: name as u8 - b'a',
                append: false,
            },
            'A'..='Z' => RegisterId::Named {
                slot: name as u8 - b'A',
                append: true,
            },
            '-' => RegisterId::SmallDelete,
            '*' => RegisterId::Selection,
            '+' => RegisterId::ClipboardPlus,
            '_' => RegisterId::BlackHole,
            '%' => RegisterId::FileName,
            '#' => RegisterId::AlternateFile,
            ':' => RegisterId::LastCommand,
            '.' => RegisterId::LastInserted,
            '/' => RegisterId::LastSearch,
            '=' => RegisterId::Expression,
            other => return Err(RegisterError::Invalid(other)),
        })
    }

    /// Whether an explicit write may target this register.
    pub fn is_writable(self) -> bool {
        !matches!(
            self,
            RegisterId::FileName
                | RegisterId::AlternateFile
                | RegisterId::LastCommand
                | RegisterId::LastInserted
                | RegisterId::Expression
        )
    }

    pub fn display_char(self) -> char {
        match self {
            RegisterId::Unnamed => '"',
            RegisterId::Numbered(n) => (b'0' + n) as char,
            RegisterId::YankZero => '0',
            RegisterId::Named { slot, append } => {
                if append {
                    (b'A' + slot) as char
                } else {
                    (b'a' + slot) as char
                }
            }
            RegisterId::SmallDelete => '-',
            RegisterId::Selection => '*',
            RegisterId::ClipboardPlus => '+',
            RegisterId::BlackHole => '_',
            RegisterId::FileName => '%',
            RegisterId::AlternateFile => '#',
            RegisterId::LastCommand => ':',
            RegisterId::LastInserted => '.',
            RegisterId::LastSearch => '/',
            RegisterId::Expression => '=',
        }
    }
}

/// Stored register payload: ordered lines plus the shape they were taken
/// with. `block_width` is meaningful only for block-shaped content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterContent {
    pub lines: Vec<String>,
    pub shape: MotionShape,
    pub block_width: usize,
}

impl RegisterContent {
    pub fn charwise(lines: Vec<String>) -> Self {
        Self {
            lines,
            shape: MotionShape::Char,
            block_width: 0,
        }
    }

    pub fn linewise(lines: Vec<String>) -> Self {
        Self {
            lines,
            shape: MotionShape::Line,
            block_width: 0,
        }
    }

    pub fn blockwise(lines: Vec<String>, width: usize) -> Self {
        Self {
            lines,
            shape: MotionShape::Block,
            block_width: width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || (self.lines.len() == 1 && self.lines[0].is_empty())
    }

    /// Append `other`, joining the last stored line with the incoming first
    /// line when both payloads are character-wise.
    fn append(&mut self, other: &RegisterContent) {
        if self.lines.is_empty() {
            *self = other.clone();
            return;
        }
        let mut incoming = other.lines.iter();
        if self.shape == MotionShape::Char && other.shape == MotionShape::Char {
            if let (Some(last), Some(first)) = (self.lines.last_mut(), incoming.next()) {
                last.push_str(first);
            }
        } else if other.shape == MotionShape::Line {
            self.shape = MotionShape::Line;
        }
        self.lines.extend(incoming.cloned());
        if other.shape == MotionShape::Block {
            self.shape = MotionShape::Block;
            self.block_width = self.block_width.max(other.block_width);
        }
    }
}

/// Which external clipboard slot a mirror register maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardTarget {
    Selection,
    Clipboard,
}

/// External clipboard service. Synchronization happens at yank/delete/put
/// boundaries; an unavailable service makes '*'/'+' fall back to the
/// unnamed register.
pub trait Clipboard {
    fn available(&self) -> bool {
        true
    }
    fn read(&mut self, target: ClipboardTarget) -> Option<RegisterContent>;
    fn write(&mut self, target: ClipboardTarget, content: &RegisterContent);
}

/// The full register file.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    unnamed: RegisterContent,
    yank0: RegisterContent,
    small_delete: RegisterContent,
    /// Index 0 is register "1" (most recent multi-line delete).
    numbered: [RegisterContent; 9],
    named: [RegisterContent; 26],
    pub last_search: String,
    pub last_command: String,
    pub last_inserted: String,
    pub file_name: String,
    pub alternate_file: String,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register. Computed views synthesize a char-wise payload; the
    /// black hole reads empty; clipboard mirrors pull from the service or
    /// fall back to the unnamed register.
    pub fn read(
        &self,
        id: RegisterId,
        clipboard: Option<&mut (dyn Clipboard + '_)>,
    ) -> Option<RegisterContent> {
        let stored = match id {
            RegisterId::Unnamed => Some(self.unnamed.clone()),
            RegisterId::YankZero => Some(self.yank0.clone()),
            RegisterId::Numbered(n) => Some(self.numbered[(n - 1) as usize].clone()),
            RegisterId::Named { slot, .. } => Some(self.named[slot as usize].clone()),
            RegisterId::SmallDelete => Some(self.small_delete.clone()),
            RegisterId::BlackHole => Some(RegisterContent::default()),
            RegisterId::Selection | RegisterId::ClipboardPlus => {
                let target = if id == RegisterId::Selection {
                    ClipboardTarget::Selection
                } else {
                    ClipboardTarget::Clipboard
                };
                match clipboard {
                    Some(clip) if clip.available() => clip.read(target),
                    _ => Some(self.unnamed.clone()),
                }
            }
            RegisterId::FileName => Some(RegisterContent::charwise(vec![self.file_name.clone()])),
            RegisterId::AlternateFile => Some(RegisterContent::charwise(vec![
                self.alternate_file.clone(),
            ])),
            RegisterId::LastCommand => {
                Some(RegisterContent::charwise(vec![self.last_command.clone()]))
            }
            RegisterId::LastInserted => {
                Some(RegisterContent::charwise(vec![self.last_inserted.clone()]))
            }
            RegisterId::LastSearch => {
                Some(RegisterContent::charwise(vec![self.last_search.clone()]))
            }
            RegisterId::Expression => Some(RegisterContent::default()),
        };
        stored.filter(|c| !c.is_empty())
    }

    /// Shift the numbered delete ring: "9" is discarded, "8" moves to "9",
    /// …, "1" moves to "2". Slot "1" is then free for the new delete.
    pub fn shift_ring(&mut self) {
        for i in (1..9).rev() {
            self.numbered[i] = std::mem::take(&mut self.numbered[i - 1]);
        }
        debug!(target: "state.registers", "numbered_ring_shifted");
    }

    fn write_named(&mut self, slot: u8, append: bool, content: &RegisterContent) {
        let dest = &mut self.named[slot as usize];
        if append {
            dest.append(content);
        } else {
            *dest = content.clone();
        }
    }

    fn mirror_clipboard(
        &mut self,
        id: RegisterId,
        content: &RegisterContent,
        clipboard: Option<&mut (dyn Clipboard + '_)>,
    ) {
        let target = match id {
            RegisterId::Selection => ClipboardTarget::Selection,
            RegisterId::ClipboardPlus => ClipboardTarget::Clipboard,
            _ => return,
        };
        if let Some(clip) = clipboard
            && clip.available()
        {
            clip.write(target, content);
        }
    }

    /// Record a yank. Lands in the explicitly named register (if any), in
    /// "0", and in the unnamed register; the numbered ring is untouched.
    pub fn record_yank(
        &mut self,
        id: Option<RegisterId>,
        content: RegisterContent,
        clipboard: Option<&mut (dyn Clipboard + '_)>,
    ) -> Result<(), RegisterError> {
        match id {
            Some(RegisterId::BlackHole) => return Ok(()),
            Some(reg) if !reg.is_writable() => {
                return Err(RegisterError::ReadOnly(reg.display_char()));
            }
            Some(RegisterId::Named { slot, append }) => {
                self.write_named(slot, append, &content);
            }
            Some(RegisterId::Numbered(n)) => {
                self.numbered[(n - 1) as usize] = content.clone();
            }
            Some(RegisterId::SmallDelete) => {
                self.small_delete = content.clone();
            }
            Some(RegisterId::LastSearch) => {
                self.last_search = content.lines.join("\n");
            }
            Some(reg @ (RegisterId::Selection | RegisterId::ClipboardPlus)) => {
                self.mirror_clipboard(reg, &content, clipboard);
            }
            _ => {}
        }
        debug!(target: "state.registers", reg = ?id, lines = content.lines.len(), "yank_recorded");
        self.yank0 = content.clone();
        self.unnamed = content;
        Ok(())
    }

    /// Record a delete. Any delete spanning more than one line, or carrying
    /// an explicit register name, shifts the numbered ring before occupying
    /// "1"; single-line non-block deletes land in "-" as well. The unnamed
    /// register always receives the text.
    pub fn record_delete(
        &mut self,
        id: Option<RegisterId>,
        content: RegisterContent,
        within_line: bool,
        clipboard: Option<&mut (dyn Clipboard + '_)>,
    ) -> Result<(), RegisterError> {
        match id {
            Some(RegisterId::BlackHole) => return Ok(()),
            Some(reg) if !reg.is_writable() => {
                return Err(RegisterError::ReadOnly(reg.display_char()));
            }
            Some(RegisterId::Named { slot, append }) => {
                self.write_named(slot, append, &content);
            }
            Some(reg @ (RegisterId::Selection | RegisterId::ClipboardPlus)) => {
                self.mirror_clipboard(reg, &content, clipboard);
            }
            _ => {}
        }
        if !within_line || id.is_some() {
            self.shift_ring();
            self.numbered[0] = content.clone();
        }
        if within_line && content.shape != MotionShape::Block {
            self.small_delete = content.clone();
        }
        debug!(target: "state.registers", reg = ?id, lines = content.lines.len(), within_line, "delete_recorded");
        self.unnamed = content;
        Ok(())
    }

    /// Contents for a put, by register name character (unnamed when `None`).
    pub fn for_put(
        &self,
        name: Option<char>,
        clipboard: Option<&mut (dyn Clipboard + '_)>,
    ) -> Result<Option<RegisterContent>, RegisterError> {
        let id = match name {
            Some(c) => RegisterId::resolve(c)?,
            None => RegisterId::Unnamed,
        };
        Ok(self.read(id, clipboard))
    }
}

//! Motion resolution.
//!
//! Every motion resolves to a target position plus the shape and inclusivity
//! the operator path needs. Motions never mutate; a motion that cannot move
//! at all fails, and a pending operator is cancelled by that failure.

use patina_text::{LineStorage, MotionShape, Position};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::NormalError;
use crate::fetch_line;

/// Where a motion landed and how an operator should interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MotionResult {
    pub target: Position,
    pub shape: MotionShape,
    pub inclusive: bool,
    /// Push the origin onto the jump list before moving.
    pub jump: bool,
}

impl MotionResult {
    pub(crate) fn exclusive(target: Position) -> Self {
        Self {
            target,
            shape: MotionShape::Char,
            inclusive: false,
            jump: false,
        }
    }

    pub(crate) fn inclusive(target: Position) -> Self {
        Self {
            target,
            shape: MotionShape::Char,
            inclusive: true,
            jump: false,
        }
    }

    pub(crate) fn linewise(target: Position) -> Self {
        Self {
            target,
            shape: MotionShape::Line,
            inclusive: false,
            jump: false,
        }
    }

    pub(crate) fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }
}

// Grapheme helpers shared across the crate.

pub(crate) fn prev_grapheme_start(line: &str, col: usize) -> usize {
    let mut prev = 0;
    for (i, _) in line.grapheme_indices(true) {
        if i >= col {
            break;
        }
        prev = i;
    }
    prev
}

/// Start of the grapheme after the one containing `col`.
pub(crate) fn next_grapheme_start(line: &str, col: usize) -> usize {
    for (i, g) in line.grapheme_indices(true) {
        if i + g.len() > col {
            return i + g.len();
        }
    }
    line.len()
}

pub(crate) fn grapheme_len_at(line: &str, col: usize) -> usize {
    line.get(col..)
        .and_then(|s| s.graphemes(true).next())
        .map_or(0, str::len)
}

pub(crate) fn last_grapheme_start(line: &str) -> usize {
    line.grapheme_indices(true).last().map_or(0, |(i, _)| i)
}

pub(crate) fn first_nonblank_col(line: &str) -> usize {
    line.char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(0, |(i, _)| i)
}

// Word classification: 0 whitespace, 1 punctuation, 2 word, 3 empty line.
// An empty line is its own word; runs never form across one.

fn class_of(c: char, big: bool) -> u8 {
    if c.is_whitespace() {
        0
    } else if big || c.is_alphanumeric() || c == '_' {
        2
    } else {
        1
    }
}

/// Char-granular walker over the buffer. End-of-line is a visitable
/// pseudo-position that classifies as whitespace.
#[derive(Clone)]
struct Walker<'a> {
    buf: &'a dyn LineStorage,
    lnum: usize,
    col: usize,
    line: String,
}

impl<'a> Walker<'a> {
    fn new(buf: &'a dyn LineStorage, pos: Position) -> Result<Self, NormalError> {
        let line = fetch_line(buf, pos.lnum)?;
        Ok(Self {
            buf,
            lnum: pos.lnum,
            col: pos.col.min(line.len()),
            line,
        })
    }

    fn pos(&self) -> Position {
        Position::new(self.lnum, self.col)
    }

    fn on_empty_line(&self) -> bool {
        self.line.is_empty()
    }

    fn class(&self, big: bool) -> u8 {
        if self.on_empty_line() {
            3
        } else {
            match self.line.get(self.col..).and_then(|s| s.chars().next()) {
                Some(c) => class_of(c, big),
                None => 0,
            }
        }
    }

    fn advance(&mut self) -> Result<bool, NormalError> {
        if self.col < self.line.len() {
            self.col = next_grapheme_start(&self.line, self.col);
            // Landing on the end-of-line pseudo-position still counts as a
            // step; the next advance crosses into the following line.
            return Ok(true);
        }
        if self.lnum < self.buf.line_count() {
            self.lnum += 1;
            self.line = fetch_line(self.buf, self.lnum)?;
            self.col = 0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn retreat(&mut self) -> Result<bool, NormalError> {
        if self.col > 0 {
            self.col = prev_grapheme_start(&self.line, self.col);
            Ok(true)
        } else if self.lnum > 1 {
            self.lnum -= 1;
            self.line = fetch_line(self.buf, self.lnum)?;
            self.col = self.line.len();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn ensure_moved(from: Position, to: Position) -> Result<Position, NormalError> {
    if from == to {
        Err(NormalError::MotionFailed)
    } else {
        Ok(to)
    }
}

/// `w`/`W`: start of the count-th next word.
pub(crate) fn next_word_start(
    buf: &dyn LineStorage,
    pos: Position,
    count: usize,
    big: bool,
) -> Result<Position, NormalError> {
    let mut w = Walker::new(buf, pos)?;
    for _ in 0..count {
        let start_class = w.class(big);
        if !w.advance()? {
            break;
        }
        if start_class == 1 || start_class == 2 {
            while w.class(big) == start_class {
                if !w.advance()? {
                    break;
                }
            }
        }
        while w.class(big) == 0 {
            if !w.advance()? {
                break;
            }
        }
    }
    ensure_moved(pos, w.pos())
}

/// `e`/`E`: end of the count-th next word.
pub(crate) fn word_end(
    buf: &dyn LineStorage,
    pos: Position,
    count: usize,
    big: bool,
) -> Result<Position, NormalError> {
    let mut w = Walker::new(buf, pos)?;
    for _ in 0..count {
        if !w.advance()? {
            break;
        }
        while matches!(w.class(big), 0 | 3) {
            if !w.advance()? {
                break;
            }
        }
        loop {
            let mut peek = w.clone();
            if !peek.advance()? {
                break;
            }
            if peek.class(big) == w.class(big) && peek.class(big) != 3 {
                w = peek;
            } else {
                break;
            }
        }
    }
    ensure_moved(pos, w.pos())
}

/// `b`/`B`: start of the count-th previous word.
pub(crate) fn prev_word_start(
    buf: &dyn LineStorage,
    pos: Position,
    count: usize,
    big: bool,
) -> Result<Position, NormalError> {
    let mut w = Walker::new(buf, pos)?;
    for _ in 0..count {
        if !w.retreat()? {
            break;
        }
        while w.class(big) == 0 {
            if !w.retreat()? {
                break;
            }
        }
        if w.class(big) == 3 {
            continue;
        }
        loop {
            let mut peek = w.clone();
            if !peek.retreat()? {
                break;
            }
            if peek.class(big) == w.class(big) && peek.class(big) != 3 {
                w = peek;
            } else {
                break;
            }
        }
    }
    ensure_moved(pos, w.pos())
}

/// In-line character find (`f`/`F`/`t`/`T` and their repeats).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindKind {
    Forward,
    Backward,
    TillForward,
    TillBackward,
}

impl FindKind {
    pub(crate) fn reversed(self) -> Self {
        match self {
            FindKind::Forward => FindKind::Backward,
            FindKind::Backward => FindKind::Forward,
            FindKind::TillForward => FindKind::TillBackward,
            FindKind::TillBackward => FindKind::TillForward,
        }
    }

    pub(crate) fn inclusive(self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FindSpec {
    pub ch: char,
    pub kind: FindKind,
}

/// Byte column of the count-th match, or `None` when it does not exist or
/// the till-adjustment would not move the cursor.
pub(crate) fn find_in_line(line: &str, col: usize, spec: FindSpec, count: usize) -> Option<usize> {
    let mut remaining = count.max(1);
    match spec.kind {
        FindKind::Forward | FindKind::TillForward => {
            let mut found = None;
            for (i, g) in line.grapheme_indices(true) {
                if i <= col {
                    continue;
                }
                if g.chars().next() == Some(spec.ch) {
                    remaining -= 1;
                    if remaining == 0 {
                        found = Some(i);
                        break;
                    }
                }
            }
            let hit = found?;
            if spec.kind == FindKind::TillForward {
                let t = prev_grapheme_start(line, hit);
                (t > col).then_some(t)
            } else {
                Some(hit)
            }
        }
        FindKind::Backward | FindKind::TillBackward => {
            let mut found = None;
            for (i, g) in line.grapheme_indices(true).rev() {
                if i >= col {
                    continue;
                }
                if g.chars().next() == Some(spec.ch) {
                    remaining -= 1;
                    if remaining == 0 {
                        found = Some((i, g.len()));
                        break;
                    }
                }
            }
            let (hit, len) = found?;
            if spec.kind == FindKind::TillBackward {
                let t = hit + len;
                (t < col).then_some(t)
            } else {
                Some(hit)
            }
        }
    }
}

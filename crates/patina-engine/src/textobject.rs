//! Text objects (`iw`, `aw`, quoted strings, bracket pairs).
//!
//! An object resolves to a char-wise range independent of any motion: the
//! start can sit before the cursor. Inner bracket objects come back
//! end-exclusive so an empty pair yields an empty range instead of going
//! backwards.

use patina_text::{LineStorage, Position};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::NormalError;
use crate::fetch_line;
use crate::motion::{last_grapheme_start, next_grapheme_start, prev_grapheme_start};

/// Resolved object span: start, end, and whether `end` is inclusive.
pub(crate) type ObjectRange = (Position, Position, bool);

pub(crate) fn object_range(
    buf: &dyn LineStorage,
    pos: Position,
    object: char,
    around: bool,
    count: usize,
) -> Result<ObjectRange, NormalError> {
    match object {
        'w' => word_object(buf, pos, around, count, false),
        'W' => word_object(buf, pos, around, count, true),
        '"' | '\'' | '`' => quote_object(buf, pos, object, around),
        '(' | ')' | 'b' => bracket_object(buf, pos, '(', ')', around, count),
        '{' | '}' | 'B' => bracket_object(buf, pos, '{', '}', around, count),
        '[' | ']' => bracket_object(buf, pos, '[', ']', around, count),
        '<' | '>' => bracket_object(buf, pos, '<', '>', around, count),
        _ => Err(NormalError::UnknownCommand),
    }
}

fn class_of(c: char, big: bool) -> u8 {
    if c.is_whitespace() {
        0
    } else if big || c.is_alphanumeric() || c == '_' {
        2
    } else {
        1
    }
}

fn char_at(line: &str, col: usize) -> Option<char> {
    line.get(col..).and_then(|s| s.chars().next())
}

/// Extent of the same-class run around `col`, within one line.
fn run_around(line: &str, col: usize, big: bool) -> (usize, usize) {
    let class = char_at(line, col).map(|c| class_of(c, big));
    let mut start = col;
    loop {
        if start == 0 {
            break;
        }
        let p = prev_grapheme_start(line, start);
        if char_at(line, p).map(|c| class_of(c, big)) == class {
            start = p;
        } else {
            break;
        }
    }
    let mut end = col;
    loop {
        let n = next_grapheme_start(line, end);
        if n >= line.len() {
            break;
        }
        if char_at(line, n).map(|c| class_of(c, big)) == class {
            end = n;
        } else {
            break;
        }
    }
    (start, end)
}

fn word_object(
    buf: &dyn LineStorage,
    pos: Position,
    around: bool,
    count: usize,
    big: bool,
) -> Result<ObjectRange, NormalError> {
    let line = fetch_line(buf, pos.lnum)?;
    if line.is_empty() {
        return Ok((pos, pos, false));
    }
    let col = pos.col.min(last_grapheme_start(&line));
    let (mut start, mut end) = run_around(&line, col, big);
    // Each extra count extends over the following run.
    for _ in 1..count.max(1) {
        let n = next_grapheme_start(&line, end);
        if n >= line.len() {
            break;
        }
        let (_, run_end) = run_around(&line, n, big);
        end = run_end;
    }
    if around {
        // Trailing whitespace belongs to the object; failing that, leading.
        let n = next_grapheme_start(&line, end);
        if char_at(&line, n).is_some_and(char::is_whitespace) {
            let (_, ws_end) = run_around(&line, n, big);
            end = ws_end;
        } else if start > 0 {
            let p = prev_grapheme_start(&line, start);
            if char_at(&line, p).is_some_and(char::is_whitespace) {
                let (ws_start, _) = run_around(&line, p, big);
                start = ws_start;
            }
        }
    }
    Ok((
        Position::new(pos.lnum, start),
        Position::new(pos.lnum, end),
        true,
    ))
}

fn quote_object(
    buf: &dyn LineStorage,
    pos: Position,
    quote: char,
    around: bool,
) -> Result<ObjectRange, NormalError> {
    let line = fetch_line(buf, pos.lnum)?;
    // Unescaped quote positions, paired in order of appearance.
    let mut quotes = Vec::new();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            quotes.push(i);
        }
    }
    let pair = quotes
        .chunks_exact(2)
        .map(|p| (p[0], p[1]))
        .find(|&(open, close)| pos.col <= close || pos.col < open)
        .ok_or(NormalError::MotionFailed)?;
    let (open, close) = pair;
    let lnum = pos.lnum;
    if around {
        let mut start = open;
        let mut end = close;
        // Trailing whitespace after the closing quote, else leading.
        let mut n = next_grapheme_start(&line, end);
        if char_at(&line, n).is_some_and(char::is_whitespace) {
            while char_at(&line, n).is_some_and(char::is_whitespace) {
                end = n;
                n = next_grapheme_start(&line, end);
            }
        } else {
            while start > 0 {
                let p = prev_grapheme_start(&line, start);
                if char_at(&line, p).is_some_and(char::is_whitespace) {
                    start = p;
                } else {
                    break;
                }
            }
        }
        return Ok((Position::new(lnum, start), Position::new(lnum, end), true));
    }
    let inner_start = next_grapheme_start(&line, open);
    // End-exclusive at the closing quote; empty for adjacent quotes.
    Ok((
        Position::new(lnum, inner_start),
        Position::new(lnum, close),
        false,
    ))
}

/// Scan backward from `pos` for the unmatched `open` enclosing it.
fn find_open(
    buf: &dyn LineStorage,
    pos: Position,
    open: char,
    close: char,
) -> Result<Option<Position>, NormalError> {
    let mut lnum = pos.lnum;
    let mut line = fetch_line(buf, lnum)?;
    let mut depth = 0usize;
    if char_at(&line, pos.col) == Some(open) {
        return Ok(Some(pos));
    }
    if char_at(&line, pos.col) == Some(close) {
        depth = 1;
    }
    let mut col = pos.col;
    loop {
        if col == 0 {
            if lnum == 1 {
                return Ok(None);
            }
            lnum -= 1;
            line = fetch_line(buf, lnum)?;
            col = line.len();
            if col == 0 {
                continue;
            }
        }
        col = prev_grapheme_start(&line, col);
        match char_at(&line, col) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                if depth == 0 {
                    return Ok(Some(Position::new(lnum, col)));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

/// Scan forward from the opening bracket for its match.
fn find_close(
    buf: &dyn LineStorage,
    open_pos: Position,
    open: char,
    close: char,
) -> Result<Option<Position>, NormalError> {
    let mut lnum = open_pos.lnum;
    let mut line = fetch_line(buf, lnum)?;
    let mut col = next_grapheme_start(&line, open_pos.col);
    let mut depth = 1usize;
    loop {
        if col >= line.len() {
            if lnum == buf.line_count() {
                return Ok(None);
            }
            lnum += 1;
            line = fetch_line(buf, lnum)?;
            col = 0;
            if line.is_empty() {
                continue;
            }
        }
        match char_at(&line, col) {
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(Position::new(lnum, col)));
                }
            }
            _ => {}
        }
        col = next_grapheme_start(&line, col);
    }
}

fn bracket_object(
    buf: &dyn LineStorage,
    pos: Position,
    open: char,
    close: char,
    around: bool,
    count: usize,
) -> Result<ObjectRange, NormalError> {
    let mut open_pos = find_open(buf, pos, open, close).transpose().ok_or(NormalError::MotionFailed)??;
    for _ in 1..count.max(1) {
        let mut outer = open_pos;
        if outer.col == 0 && outer.lnum == 1 {
            return Err(NormalError::MotionFailed);
        }
        // Step just before the current open and search again.
        if outer.col > 0 {
            let line = fetch_line(buf, outer.lnum)?;
            outer.col = prev_grapheme_start(&line, outer.col);
        } else {
            outer.lnum -= 1;
            let line = fetch_line(buf, outer.lnum)?;
            outer.col = last_grapheme_start(&line);
        }
        open_pos = find_open(buf, outer, open, close)
            .transpose()
            .ok_or(NormalError::MotionFailed)??;
    }
    let close_pos = find_close(buf, open_pos, open, close)
        .transpose()
        .ok_or(NormalError::MotionFailed)??;
    if around {
        return Ok((open_pos, close_pos, true));
    }
    let open_line = fetch_line(buf, open_pos.lnum)?;
    let inner_start = if open_pos.col >= last_grapheme_start(&open_line)
        && open_pos.lnum < close_pos.lnum
    {
        Position::new(open_pos.lnum + 1, 0)
    } else {
        Position::new(open_pos.lnum, next_grapheme_start(&open_line, open_pos.col))
    };
    // End-exclusive at the closing bracket.
    Ok((inner_start, close_pos, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patina_text::RopeBuffer;
    use pretty_assertions::assert_eq;

    fn buf(s: &str) -> RopeBuffer {
        RopeBuffer::from_str(s)
    }

    #[test]
    fn inner_word_from_middle() {
        let b = buf("foo bar baz\n");
        let (s, e, inc) = object_range(&b, Position::new(1, 5), 'w', false, 1).unwrap();
        assert_eq!((s.col, e.col, inc), (4, 6, true));
    }

    #[test]
    fn around_word_takes_trailing_space() {
        let b = buf("foo bar baz\n");
        let (s, e, _) = object_range(&b, Position::new(1, 5), 'w', true, 1).unwrap();
        assert_eq!((s.col, e.col), (4, 7));
    }

    #[test]
    fn around_word_takes_leading_space_at_line_end() {
        let b = buf("foo bar\n");
        let (s, e, _) = object_range(&b, Position::new(1, 5), 'w', true, 1).unwrap();
        assert_eq!((s.col, e.col), (3, 6));
    }

    #[test]
    fn inner_quote_and_empty_quote() {
        let b = buf("say \"hi there\" end\n");
        let (s, e, inc) = object_range(&b, Position::new(1, 7), '"', false, 1).unwrap();
        assert_eq!((s.col, e.col, inc), (5, 13, false));

        let b = buf("x \"\" y\n");
        let (s, e, inc) = object_range(&b, Position::new(1, 3), '"', false, 1).unwrap();
        assert_eq!((s.col, e.col, inc), (3, 3, false));
    }

    #[test]
    fn quote_ahead_of_cursor_is_found() {
        let b = buf("ab \"cd\"\n");
        let (s, e, _) = object_range(&b, Position::new(1, 0), '"', false, 1).unwrap();
        assert_eq!((s.col, e.col), (4, 6));
    }

    #[test]
    fn inner_parens_single_line() {
        let b = buf("f(a, b)\n");
        let (s, e, inc) = object_range(&b, Position::new(1, 3), '(', false, 1).unwrap();
        assert_eq!((s, e, inc), (Position::new(1, 2), Position::new(1, 6), false));
    }

    #[test]
    fn around_braces_multi_line() {
        let b = buf("fn x {\n  body\n}\n");
        let (s, e, inc) = object_range(&b, Position::new(2, 3), '{', true, 1).unwrap();
        assert_eq!((s, e, inc), (Position::new(1, 5), Position::new(3, 0), true));
    }

    #[test]
    fn inner_braces_skip_open_line_tail() {
        let b = buf("fn x {\n  body\n}\n");
        let (s, e, inc) = object_range(&b, Position::new(2, 3), '{', false, 1).unwrap();
        assert_eq!((s, e, inc), (Position::new(2, 0), Position::new(3, 0), false));
    }

    #[test]
    fn nested_count_selects_outer_pair() {
        let b = buf("a(b(c)d)e\n");
        let (s, e, _) = object_range(&b, Position::new(1, 4), '(', true, 2).unwrap();
        assert_eq!((s.col, e.col), (1, 7));
    }

    #[test]
    fn no_enclosing_pair_fails() {
        let b = buf("plain text\n");
        assert_eq!(
            object_range(&b, Position::new(1, 2), '(', false, 1),
            Err(NormalError::MotionFailed)
        );
    }
}

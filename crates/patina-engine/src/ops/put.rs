//! Register puts (`p`, `P`, `gp`, `gP`).
//!
//! The register's shape decides the geometry: char-wise text splices into
//! the current line, line-wise text opens whole lines, block-wise text
//! lands column-aligned on the lines below the cursor.

use patina_state::RegisterContent;
use patina_text::{MotionShape, Position, vcol::cell_at_vcol, vcol::vcol_of};
use tracing::debug;

use super::{OpCtx, OpOutcome, slice, spaces};
use crate::error::NormalError;
use crate::motion::{first_nonblank_col, grapheme_len_at, last_grapheme_start};
use crate::{Engine, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    before: bool,
    cursor_after: bool,
    count: usize,
    reg: Option<char>,
) -> Result<OpOutcome, NormalError> {
    let content = engine
        .registers
        .for_put(reg, cx.clipboard.as_deref_mut())?
        .ok_or(NormalError::NothingToPut)?;
    place(engine, cx, &content, before, cursor_after, count)
}

/// Put already-fetched register content. The visual-mode put captures the
/// register before the selection delete overwrites it.
pub(crate) fn place(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    content: &RegisterContent,
    before: bool,
    cursor_after: bool,
    count: usize,
) -> Result<OpOutcome, NormalError> {
    let count = count.max(1);
    debug!(
        target: "engine.op",
        shape = ?content.shape, lines = content.lines.len(), count, before,
        "put"
    );
    match content.shape {
        MotionShape::Char => charwise(engine, cx, content, before, cursor_after, count),
        MotionShape::Line => linewise(engine, cx, content, before, cursor_after, count),
        MotionShape::Block => blockwise(engine, cx, content, before, count),
    }
}

fn charwise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    content: &RegisterContent,
    before: bool,
    cursor_after: bool,
    count: usize,
) -> Result<OpOutcome, NormalError> {
    let pos = engine.cursor();
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let at = if before {
        pos.col
    } else {
        pos.col + grapheme_len_at(&line, pos.col)
    };

    if content.lines.len() == 1 {
        let text = content.lines[0].repeat(count);
        let mut new = slice(&line, 0, at);
        new.push_str(&text);
        new.push_str(&slice(&line, at, line.len()));
        cx.buffer
            .set_line(pos.lnum, &new)
            .map_err(NormalError::from)?;
        engine.marks.adjust_cols(pos.lnum, at, text.len() as isize);
        let col = if cursor_after {
            at + text.len()
        } else {
            at + last_grapheme_start(&text)
        };
        return Ok(OpOutcome::at(Position::new(pos.lnum, col)));
    }

    // Multi-line char-wise: repeat the payload end-to-start, then splice the
    // cursor line around it.
    let mut segs: Vec<String> = Vec::new();
    for _ in 0..count {
        let mut it = content.lines.iter();
        if let Some(last) = segs.last_mut()
            && let Some(first) = it.next()
        {
            last.push_str(first);
        }
        segs.extend(it.cloned());
    }

    let head = slice(&line, 0, at);
    let tail = slice(&line, at, line.len());
    let added = segs.len() - 1;
    let last_len = segs[added].len();
    cx.buffer
        .set_line(pos.lnum, &format!("{head}{}", segs[0]))
        .map_err(NormalError::from)?;
    for (i, seg) in segs.iter().enumerate().skip(1) {
        let text = if i == added {
            format!("{seg}{tail}")
        } else {
            seg.clone()
        };
        cx.buffer
            .insert_line(pos.lnum + i - 1, &text)
            .map_err(NormalError::from)?;
    }
    engine.note_lines_inserted(pos.lnum, added);

    let cursor = if cursor_after {
        Position::new(pos.lnum + added, last_len)
    } else {
        Position::new(pos.lnum, at)
    };
    Ok(OpOutcome::at(cursor).reporting(added))
}

fn linewise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    content: &RegisterContent,
    before: bool,
    cursor_after: bool,
    count: usize,
) -> Result<OpOutcome, NormalError> {
    let pos = engine.cursor();
    let base = if before { pos.lnum - 1 } else { pos.lnum };
    let mut n = 0usize;
    for _ in 0..count {
        for text in &content.lines {
            cx.buffer
                .insert_line(base + n, text)
                .map_err(NormalError::from)?;
            n += 1;
        }
    }
    engine.note_lines_inserted(base, n);

    let lnum = if cursor_after {
        (base + n + 1).min(cx.buffer.line_count())
    } else {
        base + 1
    };
    let col = first_nonblank_col(&fetch_line(cx.buffer, lnum)?);
    Ok(OpOutcome::at(Position::new(lnum, col)).reporting(n))
}

fn blockwise(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    content: &RegisterContent,
    before: bool,
    count: usize,
) -> Result<OpOutcome, NormalError> {
    let ts = engine.options.tabstop;
    let pos = engine.cursor();
    let line = fetch_line(cx.buffer, pos.lnum)?;
    let cv = vcol_of(&line, pos.col, ts);
    let insert_v = if before {
        cv
    } else {
        match cell_at_vcol(&line, cv, ts) {
            Some(hit) => hit.start_vcol + hit.width,
            None => cv,
        }
    };
    let width = content.block_width;

    let mut first_col = None;
    for (i, text) in content.lines.iter().enumerate() {
        let lnum = pos.lnum + i;
        if lnum > cx.buffer.line_count() {
            cx.buffer
                .insert_line(cx.buffer.line_count(), "")
                .map_err(NormalError::from)?;
        }
        let target = fetch_line(cx.buffer, lnum)?;
        let (head, tail) = split_at_vcol(&target, insert_v, ts);
        let mut piece = pad_to(text, width, ts).repeat(count);
        if tail.is_empty() {
            piece.truncate(piece.trim_end_matches(' ').len());
        }
        if first_col.is_none() {
            first_col = Some(head.len());
        }
        cx.buffer
            .set_line(lnum, &format!("{head}{piece}{tail}"))
            .map_err(NormalError::from)?;
    }

    let col = first_col.unwrap_or(pos.col);
    Ok(OpOutcome::at(Position::new(pos.lnum, col)).reporting(content.lines.len()))
}

fn pad_to(text: &str, width: usize, tabstop: usize) -> String {
    let mut s = text.to_string();
    let have = patina_text::line_vcol_width(text, tabstop);
    if have < width {
        s.push_str(&spaces(width - have));
    }
    s
}

/// Split a line at a virtual column. A short line gains space padding; a tab
/// spanning the split point is expanded into spaces on both sides.
fn split_at_vcol(line: &str, vcol: usize, tabstop: usize) -> (String, String) {
    match cell_at_vcol(line, vcol, tabstop) {
        Some(hit) if hit.start_vcol == vcol => {
            (slice(line, 0, hit.col), slice(line, hit.col, line.len()))
        }
        Some(hit) => {
            let mut head = slice(line, 0, hit.col);
            head.push_str(&spaces(vcol - hit.start_vcol));
            let mut tail = spaces(hit.start_vcol + hit.width - vcol);
            tail.push_str(&slice(line, hit.col + hit.bytes, line.len()));
            (head, tail)
        }
        None => {
            let have = patina_text::line_vcol_width(line, tabstop);
            let mut head = line.to_string();
            head.push_str(&spaces(vcol.saturating_sub(have)));
            (head, String::new())
        }
    }
}

//! Case operators (`gu`, `gU`, `g~`, `g?`).

use patina_text::{BlockMode, LineStorage, MotionShape, block_slice};

use super::{OpCtx, OpOutcome, exclusive_end, slice};
use crate::error::NormalError;
use crate::pending::{OpKind, PendingOp};
use crate::{Engine, fetch_line};

fn transform(kind: OpKind, s: &str) -> String {
    match kind {
        OpKind::Upper => s.to_uppercase(),
        OpKind::Lower => s.to_lowercase(),
        OpKind::Rot13 => s
            .chars()
            .map(|c| match c {
                'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
                'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
                other => other,
            })
            .collect(),
        OpKind::ToggleCase => s
            .chars()
            .flat_map(|c| {
                // Toggling can grow text (a sharp s uppercases to "SS").
                let out: Vec<char> = if c.is_lowercase() {
                    c.to_uppercase().collect()
                } else if c.is_uppercase() {
                    c.to_lowercase().collect()
                } else {
                    vec![c]
                };
                out
            })
            .collect(),
        _ => s.to_string(),
    }
}

/// Transform one span in place; reports whether the line changed.
fn edit(
    buffer: &mut (dyn LineStorage + '_),
    kind: OpKind,
    lnum: usize,
    from: usize,
    to: usize,
) -> Result<bool, NormalError> {
    let line = fetch_line(buffer, lnum)?;
    let seg = slice(&line, from, to);
    let new_seg = transform(kind, &seg);
    if new_seg == seg {
        return Ok(false);
    }
    let mut new = slice(&line, 0, from);
    new.push_str(&new_seg);
    new.push_str(&slice(&line, to, line.len()));
    buffer.set_line(lnum, &new).map_err(NormalError::from)?;
    Ok(true)
}

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let mut changed = false;

    match op.shape {
        MotionShape::Char => {
            let end = exclusive_end(cx.buffer, op)?;
            if op.start.lnum == end.lnum {
                changed |= edit(cx.buffer, op.kind, op.start.lnum, op.start.col, end.col)?;
            } else {
                let first = fetch_line(cx.buffer, op.start.lnum)?;
                changed |= edit(cx.buffer, op.kind, op.start.lnum, op.start.col, first.len())?;
                for lnum in op.start.lnum + 1..end.lnum {
                    let len = fetch_line(cx.buffer, lnum)?.len();
                    changed |= edit(cx.buffer, op.kind, lnum, 0, len)?;
                }
                changed |= edit(cx.buffer, op.kind, end.lnum, 0, end.col)?;
            }
        }
        MotionShape::Line => {
            for lnum in op.start.lnum..=op.end.lnum {
                let len = fetch_line(cx.buffer, lnum)?.len();
                changed |= edit(cx.buffer, op.kind, lnum, 0, len)?;
            }
        }
        MotionShape::Block => {
            let ts = engine.options.tabstop;
            for lnum in op.start.lnum..=op.end.lnum {
                let line = fetch_line(cx.buffer, lnum)?;
                let fill = block_slice(
                    &line,
                    op.block_start_vcol,
                    op.block_end_vcol,
                    ts,
                    BlockMode::Fill,
                );
                if fill.text_len > 0 {
                    changed |=
                        edit(cx.buffer, op.kind, lnum, fill.text_start, fill.text_start + fill.text_len)?;
                }
            }
        }
    }

    let reported = if op.shape == MotionShape::Line && changed {
        op.line_count
    } else {
        0
    };
    Ok(OpOutcome {
        cursor: op.start,
        changed,
        lines_reported: reported,
        enter_insert: None,
    })
}

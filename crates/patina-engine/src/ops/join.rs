//! Line joining (`J` and `gJ`).

use patina_text::Position;

use super::{OpCtx, OpOutcome};
use crate::error::NormalError;
use crate::pending::{OpKind, PendingOp};
use crate::{Engine, fetch_line};

pub(crate) fn run(
    engine: &mut Engine,
    cx: &mut OpCtx<'_, '_>,
    op: &PendingOp,
) -> Result<OpOutcome, NormalError> {
    let first = op.start.lnum;
    let last = op.end.lnum.min(cx.buffer.line_count());
    if last <= first {
        return Err(NormalError::MotionFailed);
    }
    let spaced = op.kind == OpKind::Join;

    let first_line = fetch_line(cx.buffer, first)?;
    let leader = if spaced {
        comment_leader(&engine.options.comment_leaders, &first_line)
    } else {
        None
    };

    let mut joined = first_line;
    let mut seam_col = None;
    for lnum in first + 1..=last {
        let mut next = fetch_line(cx.buffer, lnum)?;
        if spaced {
            // Vim trims at the seam and picks the separator from context.
            while joined.ends_with(' ') || joined.ends_with('\t') {
                joined.pop();
            }
            next = next.trim_start().to_string();
            if let Some(lead) = leader
                && next.starts_with(lead)
            {
                next = next[lead.len()..].trim_start().to_string();
            }
            let sep = if next.is_empty() || next.starts_with(')') {
                ""
            } else if engine.options.join_sentence_space && ends_sentence(&joined) {
                "  "
            } else {
                " "
            };
            if seam_col.is_none() {
                seam_col = Some(joined.len());
            }
            joined.push_str(sep);
        } else if seam_col.is_none() {
            seam_col = Some(joined.len());
        }
        joined.push_str(&next);
    }

    cx.buffer
        .set_line(first, &joined)
        .map_err(NormalError::from)?;
    cx.buffer
        .delete_lines(first + 1, last - first)
        .map_err(NormalError::from)?;
    engine.note_lines_deleted(first + 1, last);

    let col = seam_col.unwrap_or(0).min(joined.len());
    Ok(OpOutcome::at(Position::new(first, col)).reporting(last - first + 1))
}

fn comment_leader<'a>(leaders: &'a [String], line: &str) -> Option<&'a str> {
    let trimmed = line.trim_start();
    leaders
        .iter()
        .map(String::as_str)
        .find(|l| trimmed.starts_with(l))
}

fn ends_sentence(s: &str) -> bool {
    matches!(s.chars().last(), Some('.' | '!' | '?'))
}

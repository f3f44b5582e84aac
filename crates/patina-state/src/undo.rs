//! Undo-scope contract.
//!
//! The undo log itself is an external collaborator; this core only opens a
//! change scope before an executor mutates the buffer and guarantees the
//! scope commits on every exit path, including early failure returns.

use anyhow::Result;
use patina_text::{LineStorage, Range};
use tracing::trace;

/// Checkpoint/restore surface of the external undo log.
pub trait UndoLog {
    /// Open a change scope covering `range`. Exactly one scope per executed
    /// operator.
    fn begin_change(&mut self, buffer: &dyn LineStorage, range: Range) -> Result<()>;
    /// Close the current scope.
    fn commit_change(&mut self);
    /// Restore the most recent committed scope. Returns false when there is
    /// nothing to undo.
    fn undo(&mut self, buffer: &mut dyn LineStorage) -> Result<bool>;
}

/// RAII wrapper: commits the open scope when dropped, so no failure path in
/// an executor can leave a half-open undo frame.
pub struct ChangeScope<'a> {
    log: &'a mut dyn UndoLog,
}

impl<'a> ChangeScope<'a> {
    pub fn begin(
        log: &'a mut dyn UndoLog,
        buffer: &dyn LineStorage,
        range: Range,
    ) -> Result<Self> {
        log.begin_change(buffer, range)?;
        trace!(target: "state.undo", start = range.start.lnum, end = range.end.lnum, "change_scope_open");
        Ok(Self { log })
    }
}

impl Drop for ChangeScope<'_> {
    fn drop(&mut self) {
        self.log.commit_change();
        trace!(target: "state.undo", "change_scope_commit");
    }
}

/// Reference undo log: whole-buffer snapshots, one per scope. Suits tests
/// and small embedders; a real editor supplies its own log.
#[derive(Debug, Default)]
pub struct SnapshotUndo {
    snapshots: Vec<Vec<String>>,
    open: bool,
    pub begin_calls: usize,
}

impl SnapshotUndo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }
}

impl UndoLog for SnapshotUndo {
    fn begin_change(&mut self, buffer: &dyn LineStorage, _range: Range) -> Result<()> {
        let lines = (1..=buffer.line_count())
            .map(|n| buffer.line(n))
            .collect::<Result<Vec<_>>>()?;
        self.snapshots.push(lines);
        self.open = true;
        self.begin_calls += 1;
        Ok(())
    }

    fn commit_change(&mut self) {
        self.open = false;
    }

    fn undo(&mut self, buffer: &mut dyn LineStorage) -> Result<bool> {
        let Some(snapshot) = self.snapshots.pop() else {
            return Ok(false);
        };
        // Replace the whole buffer with the snapshot.
        let existing = buffer.line_count();
        for (i, line) in snapshot.iter().enumerate() {
            let lnum = i + 1;
            if lnum <= existing {
                buffer.set_line(lnum, line)?;
            } else {
                buffer.insert_line(lnum - 1, line)?;
            }
        }
        if existing > snapshot.len() {
            buffer.delete_lines(snapshot.len() + 1, existing - snapshot.len())?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patina_text::{Position, RopeBuffer};
    use pretty_assertions::assert_eq;

    fn whole(buf: &RopeBuffer) -> Range {
        Range::new(Position::new(1, 0), Position::new(buf.line_count(), 0))
    }

    #[test]
    fn scope_commits_on_drop() {
        let mut log = SnapshotUndo::new();
        let buf = RopeBuffer::from_str("a\nb\n");
        {
            let _scope = ChangeScope::begin(&mut log, &buf, whole(&buf)).unwrap();
        }
        assert!(!log.open);
        assert_eq!(log.begin_calls, 1);
    }

    #[test]
    fn scope_commits_on_early_return() {
        fn failing(log: &mut SnapshotUndo, buf: &RopeBuffer) -> Result<()> {
            let _scope = ChangeScope::begin(log, buf, whole(buf))?;
            anyhow::bail!("executor failed mid-way");
        }
        let mut log = SnapshotUndo::new();
        let buf = RopeBuffer::from_str("x\n");
        assert!(failing(&mut log, &buf).is_err());
        assert!(!log.open);
    }

    #[test]
    fn undo_restores_snapshot() {
        let mut log = SnapshotUndo::new();
        let mut buf = RopeBuffer::from_str("one\ntwo\nthree\n");
        {
            let _scope = ChangeScope::begin(&mut log, &buf, whole(&buf)).unwrap();
        }
        buf.delete_lines(2, 2).unwrap();
        assert_eq!(buf.line_count(), 1);
        assert!(log.undo(&mut buf).unwrap());
        assert_eq!(buf.lines_vec(), vec!["one", "two", "three"]);
        assert!(!log.undo(&mut buf).unwrap());
    }
}

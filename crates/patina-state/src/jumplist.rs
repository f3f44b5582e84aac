//! Bounded jump history.
//!
//! Pushes always append (evicting the oldest once full); duplicate
//! compaction runs lazily right before navigation, never on push.

use patina_text::Position;
use tracing::debug;

pub const JUMPLIST_MAX: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct JumpList {
    entries: Vec<Position>,
    /// Current walk position; `entries.len()` means "at the live end".
    index: usize,
}

impl JumpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Position] {
        &self.entries
    }

    /// Record a jump origin. Never truncates forward history.
    pub fn push(&mut self, pos: Position) {
        if self.entries.len() == JUMPLIST_MAX {
            self.entries.remove(0);
            self.index = self.index.saturating_sub(1);
        }
        self.entries.push(pos);
        self.index = self.entries.len();
        debug!(target: "state.jumps", lnum = pos.lnum, depth = self.entries.len(), "jump_pushed");
    }

    /// Drop adjacent same-line duplicates, keeping the newest of each run.
    fn compact(&mut self) {
        let mut i = 0;
        while i + 1 < self.entries.len() {
            if self.entries[i].lnum == self.entries[i + 1].lnum {
                self.entries.remove(i);
                if self.index > i {
                    self.index -= 1;
                }
            } else {
                i += 1;
            }
        }
    }

    /// Walk `delta` entries (negative = older). Fails with `None` and no
    /// state change when the walk would leave the list. Walking back from
    /// the live end first records `current` so the walk can return.
    pub fn navigate(&mut self, delta: isize, current: Position) -> Option<Position> {
        if delta == 0 {
            return None;
        }
        self.compact();
        let at_end = self.index == self.entries.len();
        let mut index = self.index as isize;
        let mut entries_len = self.entries.len() as isize;
        if delta < 0 && at_end {
            // Reserve a slot for the current position; committed below.
            entries_len += 1;
        }
        let target = index + delta;
        if target < 0 || target >= entries_len {
            return None;
        }
        if delta < 0 && at_end {
            self.entries.push(current);
            index = self.entries.len() as isize - 1;
        }
        let target = (index + delta).clamp(0, self.entries.len() as isize - 1) as usize;
        self.index = target;
        Some(self.entries[target])
    }

    /// `count` lines inserted after `after`.
    pub fn adjust_insert(&mut self, after: usize, count: usize) {
        for pos in &mut self.entries {
            if pos.lnum > after {
                pos.lnum += count;
            }
        }
    }

    /// Lines `first..=last` deleted.
    pub fn adjust_delete(&mut self, first: usize, last: usize) {
        let removed = last - first + 1;
        for pos in &mut self.entries {
            if pos.lnum >= first && pos.lnum <= last {
                pos.lnum = first;
                pos.col = 0;
            } else if pos.lnum > last {
                pos.lnum -= removed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(lnum: usize) -> Position {
        Position::new(lnum, 0)
    }

    #[test]
    fn navigate_back_and_forward() {
        let mut jl = JumpList::new();
        jl.push(p(1));
        jl.push(p(5));
        let cur = p(9);
        assert_eq!(jl.navigate(-1, cur), Some(p(5)));
        assert_eq!(jl.navigate(-1, p(5)), Some(p(1)));
        assert_eq!(jl.navigate(1, p(1)), Some(p(5)));
        assert_eq!(jl.navigate(1, p(5)), Some(p(9)));
    }

    #[test]
    fn out_of_bounds_walk_changes_nothing() {
        let mut jl = JumpList::new();
        jl.push(p(1));
        assert_eq!(jl.navigate(-5, p(2)), None);
        // A failed walk must not have pushed the current position.
        assert_eq!(jl.len(), 1);
        assert_eq!(jl.navigate(1, p(2)), None);
    }

    #[test]
    fn push_evicts_oldest_at_capacity() {
        let mut jl = JumpList::new();
        for i in 1..=JUMPLIST_MAX + 5 {
            jl.push(p(i));
        }
        assert_eq!(jl.len(), JUMPLIST_MAX);
        assert_eq!(jl.entries()[0], p(6));
    }

    #[test]
    fn duplicates_compact_before_navigation() {
        let mut jl = JumpList::new();
        jl.push(p(3));
        jl.push(p(3));
        jl.push(p(7));
        assert_eq!(jl.navigate(-2, p(9)), Some(p(3)));
        assert_eq!(jl.len(), 3); // 3, 7, 9(current)
    }

    #[test]
    fn deletion_remaps_entries() {
        let mut jl = JumpList::new();
        jl.push(p(2));
        jl.push(p(6));
        jl.adjust_delete(3, 4);
        assert_eq!(jl.entries()[0], p(2));
        assert_eq!(jl.entries()[1], p(4));
    }
}

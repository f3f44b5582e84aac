//! The optional collaborators: pattern search and the range delegate.

mod common;

use common::RecordingUi;
use patina_config::Options;
use patina_engine::{
    EditContext, Engine, RangeDelegate, SearchDirection, SearchService,
};
use patina_keys::Key;
use patina_state::SnapshotUndo;
use patina_text::{LineStorage, Position, RopeBuffer};
use pretty_assertions::assert_eq;

/// Plain substring search over the buffer lines.
struct SubstringSearch;

impl SearchService for SubstringSearch {
    fn search(
        &mut self,
        buffer: &dyn LineStorage,
        from: Position,
        pattern: &str,
        dir: SearchDirection,
    ) -> Option<Position> {
        if pattern.is_empty() {
            return None;
        }
        let mut hits = Vec::new();
        for lnum in 1..=buffer.line_count() {
            let line = buffer.line(lnum).ok()?;
            for (col, _) in line.match_indices(pattern) {
                hits.push(Position::new(lnum, col));
            }
        }
        match dir {
            SearchDirection::Forward => hits
                .into_iter()
                .find(|p| (p.lnum, p.col) > (from.lnum, from.col)),
            SearchDirection::Backward => hits
                .into_iter()
                .rev()
                .find(|p| (p.lnum, p.col) < (from.lnum, from.col)),
        }
    }
}

/// Delegate that records every range call and leaves the buffer alone.
#[derive(Default)]
struct RecordingDelegate {
    calls: Vec<(&'static str, usize, usize)>,
}

impl RangeDelegate for RecordingDelegate {
    fn filter(
        &mut self,
        _buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize> {
        self.calls.push(("filter", first, last));
        Ok(last - first + 1)
    }

    fn indent(
        &mut self,
        _buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize> {
        self.calls.push(("indent", first, last));
        Ok(last - first + 1)
    }

    fn format(
        &mut self,
        _buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize> {
        self.calls.push(("format", first, last));
        Ok(last - first + 1)
    }

    fn call_function(
        &mut self,
        _buffer: &mut dyn LineStorage,
        first: usize,
        last: usize,
    ) -> anyhow::Result<usize> {
        self.calls.push(("call_function", first, last));
        Ok(last - first + 1)
    }

    fn colon(&mut self, first: usize, last: usize) -> anyhow::Result<()> {
        self.calls.push(("colon", first, last));
        Ok(())
    }
}

struct ServiceFixture {
    engine: Engine,
    buffer: RopeBuffer,
    undo: SnapshotUndo,
    ui: RecordingUi,
    search: SubstringSearch,
    delegate: RecordingDelegate,
}

impl ServiceFixture {
    fn new(text: &str) -> Self {
        Self {
            engine: Engine::new(Options::default()),
            buffer: RopeBuffer::from_str(text),
            undo: SnapshotUndo::new(),
            ui: RecordingUi::default(),
            search: SubstringSearch,
            delegate: RecordingDelegate::default(),
        }
    }

    fn key(&mut self, key: Key) {
        let mut cx = EditContext {
            buffer: &mut self.buffer,
            undo: &mut self.undo,
            ui: &mut self.ui,
            search: Some(&mut self.search),
            clipboard: None,
            delegate: Some(&mut self.delegate),
            in_cmdline_window: false,
        };
        self.engine.dispatch(key, &mut cx);
    }

    fn feed(&mut self, keys: &str) {
        for c in keys.chars() {
            self.key(Key::from_char(c));
        }
    }

    fn cursor(&self) -> (usize, usize) {
        let p = self.engine.cursor();
        (p.lnum, p.col)
    }
}

#[test]
fn n_finds_the_next_match() {
    let mut fx = ServiceFixture::new("ab\ncdab\n");
    fx.engine.registers.last_search = "ab".to_string();
    fx.feed("n");
    assert_eq!(fx.cursor(), (2, 2));
}

#[test]
fn big_n_searches_backward() {
    let mut fx = ServiceFixture::new("ab\ncdab\n");
    fx.engine.registers.last_search = "ab".to_string();
    fx.feed("n");
    fx.feed("N");
    assert_eq!(fx.cursor(), (1, 0));
}

#[test]
fn counted_n_skips_matches() {
    let mut fx = ServiceFixture::new("x ab ab ab\n");
    fx.engine.registers.last_search = "ab".to_string();
    fx.feed("2n");
    assert_eq!(fx.cursor(), (1, 5));
}

#[test]
fn n_with_no_pattern_fails() {
    let mut fx = ServiceFixture::new("abc\n");
    fx.feed("n");
    assert_eq!(fx.ui.bells, 1);
}

#[test]
fn delete_to_a_search_match_is_exclusive() {
    let mut fx = ServiceFixture::new("xxabyy\n");
    fx.engine.registers.last_search = "ab".to_string();
    fx.feed("dn");
    assert_eq!(fx.buffer.lines_vec(), vec!["abyy"]);
}

#[test]
fn search_jump_is_walkable() {
    let mut fx = ServiceFixture::new("ab\n\n\nab\n");
    fx.engine.registers.last_search = "ab".to_string();
    fx.feed("n");
    assert_eq!(fx.cursor(), (4, 0));
    fx.key(patina_keys::K_CTRL_O);
    assert_eq!(fx.cursor(), (1, 0));
}

#[test]
fn equals_motion_delegates_indenting() {
    let mut fx = ServiceFixture::new("a\nb\nc\n");
    fx.feed("=j");
    assert_eq!(fx.delegate.calls, vec![("indent", 1, 2)]);
}

#[test]
fn doubled_equals_indents_the_current_line() {
    let mut fx = ServiceFixture::new("a\nb\n");
    fx.feed("==");
    assert_eq!(fx.delegate.calls, vec![("indent", 1, 1)]);
}

#[test]
fn bang_motion_delegates_filtering() {
    let mut fx = ServiceFixture::new("a\nb\nc\n");
    fx.feed("!j");
    assert_eq!(fx.delegate.calls, vec![("filter", 1, 2)]);
}

#[test]
fn gq_motion_delegates_formatting() {
    let mut fx = ServiceFixture::new("a\nb\nc\n");
    fx.feed("gqj");
    assert_eq!(fx.delegate.calls, vec![("format", 1, 2)]);
}

#[test]
fn g_at_motion_delegates_the_operator_function() {
    let mut fx = ServiceFixture::new("a\nb\nc\n");
    fx.feed("g@j");
    assert_eq!(fx.delegate.calls, vec![("call_function", 1, 2)]);
}

#[test]
fn visual_colon_hands_over_the_line_range() {
    let mut fx = ServiceFixture::new("a\nb\nc\n");
    fx.feed("Vj:");
    assert_eq!(fx.delegate.calls, vec![("colon", 1, 2)]);
    assert!(!fx.engine.visual_active());
}

#[test]
fn indent_without_a_delegate_fails() {
    let mut fx = common::Fixture::new("a\nb\n");
    fx.feed("=j");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.lines(), vec!["a", "b"]);
}

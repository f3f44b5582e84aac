#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use patina_config::Options;
use patina_engine::{DispatchResult, EditContext, Engine, InsertRequest, UiSink};
use patina_keys::Key;
use patina_state::SnapshotUndo;
use patina_text::{LineStorage, Position, RopeBuffer};

/// Route engine traces to the test output. `RUST_LOG=engine.dispatch=trace`
/// shows the per-key decisions when a test fails.
pub fn init_tracing() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// UI sink that records everything the engine reports.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub bells: usize,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    pub redraws: usize,
}

impl UiSink for RecordingUi {
    fn bell(&mut self) {
        self.bells += 1;
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }

    fn request_redraw(&mut self, _first: usize, _last: usize) {
        self.redraws += 1;
    }
}

/// Engine plus collaborators, wired the way an embedder would wire them.
pub struct Fixture {
    pub engine: Engine,
    pub buffer: RopeBuffer,
    pub undo: SnapshotUndo,
    pub ui: RecordingUi,
    pub cmdwin: bool,
    /// Every insert-mode request the engine produced, in order.
    pub inserts: Vec<InsertRequest>,
}

impl Fixture {
    pub fn new(text: &str) -> Self {
        Self::with_options(text, Options::default())
    }

    pub fn with_options(text: &str, options: Options) -> Self {
        init_tracing();
        Self {
            engine: Engine::new(options),
            buffer: RopeBuffer::from_str(text),
            undo: SnapshotUndo::new(),
            ui: RecordingUi::default(),
            cmdwin: false,
            inserts: Vec::new(),
        }
    }

    pub fn at(mut self, lnum: usize, col: usize) -> Self {
        let pos = Position::new(lnum, col);
        self.engine.set_cursor(&self.buffer, pos);
        self
    }

    pub fn feed(&mut self, keys: &str) {
        for c in keys.chars() {
            self.key(Key::from_char(c));
        }
    }

    pub fn key(&mut self, key: Key) -> DispatchResult {
        let mut cx = EditContext {
            buffer: &mut self.buffer,
            undo: &mut self.undo,
            ui: &mut self.ui,
            search: None,
            clipboard: None,
            delegate: None,
            in_cmdline_window: self.cmdwin,
        };
        let result = self.engine.dispatch(key, &mut cx);
        if let Some(req) = result.enter_insert {
            self.inserts.push(req);
        }
        result
    }

    pub fn esc(&mut self) {
        self.key(patina_keys::K_ESC);
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.lines_vec()
    }

    pub fn cursor(&self) -> (usize, usize) {
        let p = self.engine.cursor();
        (p.lnum, p.col)
    }

    /// Register contents joined with newlines, `None` when empty.
    pub fn reg(&self, name: char) -> Option<String> {
        self.engine
            .register_contents(name)
            .ok()
            .flatten()
            .map(|c| c.lines.join("\n"))
    }

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }
}

pub fn lines_of(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

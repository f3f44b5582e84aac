//! Register routing through whole commands: yanks, the delete ring, the
//! small-delete register, named slots, and the read-only views.

mod common;

use common::{Fixture, RecordingUi};
use patina_config::Options;
use patina_engine::{EditContext, Engine};
use patina_keys::Key;
use patina_state::{Clipboard, ClipboardTarget, RegisterContent, SnapshotUndo};
use patina_text::RopeBuffer;
use pretty_assertions::assert_eq;

#[test]
fn yank_lands_in_zero_and_unnamed_but_not_the_ring() {
    let mut fx = Fixture::new("one two\n");
    fx.feed("yw");
    assert_eq!(fx.reg('0').as_deref(), Some("one "));
    assert_eq!(fx.reg('"').as_deref(), Some("one "));
    assert_eq!(fx.reg('1'), None);
}

#[test]
fn line_delete_enters_the_ring_and_yank_leaves_it_alone() {
    let mut fx = Fixture::new("l1\nl2\nl3\n");
    fx.feed("dd");
    assert_eq!(fx.reg('1').as_deref(), Some("l1"));
    fx.feed("yy");
    assert_eq!(fx.reg('0').as_deref(), Some("l2"));
    assert_eq!(fx.reg('"').as_deref(), Some("l2"));
    assert_eq!(fx.reg('1').as_deref(), Some("l1"));
}

#[test]
fn successive_deletes_shift_the_ring() {
    let mut fx = Fixture::new("a\nb\nc\n");
    fx.feed("dd");
    fx.feed("dd");
    assert_eq!(fx.reg('1').as_deref(), Some("b"));
    assert_eq!(fx.reg('2').as_deref(), Some("a"));
}

#[test]
fn quote_two_p_puts_the_older_delete() {
    let mut fx = Fixture::new("a\nb\nc\n");
    fx.feed("dd");
    fx.feed("dd");
    fx.feed("\"2p");
    assert_eq!(fx.lines(), vec!["c", "a"]);
}

#[test]
fn small_deletes_go_to_the_dash_register() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("x");
    assert_eq!(fx.reg('-').as_deref(), Some("a"));
    assert_eq!(fx.reg('"').as_deref(), Some("a"));
    assert_eq!(fx.reg('1'), None);
}

#[test]
fn multi_line_delete_leaves_the_dash_register_alone() {
    let mut fx = Fixture::new("abc\ndef\nghi\n");
    fx.feed("x");
    fx.feed("dj");
    assert_eq!(fx.reg('-').as_deref(), Some("a"));
    assert_eq!(fx.reg('1').as_deref(), Some("bc\ndef"));
}

#[test]
fn named_register_delete_and_put() {
    let mut fx = Fixture::new("x\ny\n");
    fx.feed("\"add");
    assert_eq!(fx.reg('a').as_deref(), Some("x"));
    fx.feed("\"ap");
    assert_eq!(fx.lines(), vec!["y", "x"]);
}

#[test]
fn uppercase_append_joins_charwise_pieces() {
    let mut fx = Fixture::new("foo bar\n");
    fx.feed("\"ayw");
    fx.feed("w");
    fx.feed("\"Ayw");
    assert_eq!(fx.reg('a').as_deref(), Some("foo bar"));
}

#[test]
fn uppercase_append_stacks_lines() {
    let mut fx = Fixture::new("one\ntwo\nthree\n");
    fx.feed("\"bdd");
    fx.feed("\"Bdd");
    assert_eq!(fx.reg('b').as_deref(), Some("one\ntwo"));
}

#[test]
fn black_hole_discards_without_touching_other_registers() {
    let mut fx = Fixture::new("keep\ngone\nrest\n");
    fx.feed("yw");
    fx.feed("j");
    fx.feed("\"_dd");
    assert_eq!(fx.lines(), vec!["keep", "rest"]);
    assert_eq!(fx.reg('"').as_deref(), Some("keep"));
    assert_eq!(fx.reg('1'), None);
}

#[test]
fn read_only_register_rejects_a_yank() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("\"%yy");
    assert_eq!(fx.lines(), vec!["abc"]);
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.ui.errors.len(), 1);
    assert_eq!(fx.reg('"'), None);
}

#[test]
fn invalid_register_name_rings_the_bell() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("\"!");
    assert_eq!(fx.ui.bells, 1);
    // The failed prefix leaves no residue.
    fx.feed("x");
    assert_eq!(fx.lines(), vec!["bc"]);
}

#[test]
fn named_register_delete_still_fills_the_unnamed_register() {
    let mut fx = Fixture::new("one\ntwo\n");
    fx.feed("\"cdd");
    assert_eq!(fx.reg('"').as_deref(), Some("one"));
    fx.feed("p");
    assert_eq!(fx.lines(), vec!["two", "one"]);
}

/// Two-slot in-memory clipboard service.
#[derive(Default)]
struct MemClipboard {
    selection: Option<RegisterContent>,
    clipboard: Option<RegisterContent>,
}

impl Clipboard for MemClipboard {
    fn read(&mut self, target: ClipboardTarget) -> Option<RegisterContent> {
        match target {
            ClipboardTarget::Selection => self.selection.clone(),
            ClipboardTarget::Clipboard => self.clipboard.clone(),
        }
    }

    fn write(&mut self, target: ClipboardTarget, content: &RegisterContent) {
        match target {
            ClipboardTarget::Selection => self.selection = Some(content.clone()),
            ClipboardTarget::Clipboard => self.clipboard = Some(content.clone()),
        }
    }
}

struct ClipFixture {
    engine: Engine,
    buffer: RopeBuffer,
    undo: SnapshotUndo,
    ui: RecordingUi,
    clip: MemClipboard,
}

impl ClipFixture {
    fn new(text: &str) -> Self {
        let options = Options {
            clipboard: true,
            ..Options::default()
        };
        Self {
            engine: Engine::new(options),
            buffer: RopeBuffer::from_str(text),
            undo: SnapshotUndo::new(),
            ui: RecordingUi::default(),
            clip: MemClipboard::default(),
        }
    }

    fn feed(&mut self, keys: &str) {
        for c in keys.chars() {
            let mut cx = EditContext {
                buffer: &mut self.buffer,
                undo: &mut self.undo,
                ui: &mut self.ui,
                search: None,
                clipboard: Some(&mut self.clip),
                delegate: None,
                in_cmdline_window: false,
            };
            self.engine.dispatch(Key::from_char(c), &mut cx);
        }
    }
}

#[test]
fn plus_register_yank_mirrors_through_the_service() {
    let mut fx = ClipFixture::new("sys line\nrest\n");
    fx.feed("\"+yy");
    let mirrored = fx.clip.clipboard.expect("yank reached the clipboard");
    assert_eq!(mirrored.lines, vec!["sys line"]);
}

#[test]
fn plus_register_put_reads_through_the_service() {
    let mut fx = ClipFixture::new("ab\n");
    fx.clip.clipboard = Some(RegisterContent::charwise(vec!["XY".to_string()]));
    fx.feed("\"+p");
    assert_eq!(fx.buffer.lines_vec(), vec!["aXYb"]);
}

#[test]
fn star_register_delete_mirrors_the_selection_slot() {
    let mut fx = ClipFixture::new("one\ntwo\n");
    fx.feed("\"*dd");
    let mirrored = fx.clip.selection.expect("delete reached the clipboard");
    assert_eq!(mirrored.lines, vec!["one"]);
    assert_eq!(fx.buffer.lines_vec(), vec!["two"]);
}

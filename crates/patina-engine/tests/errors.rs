//! Failure paths: the bell, pending-state cleanup, and gating flags.

mod common;

use common::Fixture;
use patina_keys::{K_CTRL_O, K_ESC, K_INTERRUPT, Key};
use pretty_assertions::assert_eq;

#[test]
fn unknown_key_rings_and_leaves_no_residue() {
    let mut fx = Fixture::new("abc\n");
    let result = fx.key(Key::from_char('q'));
    assert!(result.consumed);
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.lines(), vec!["abc"]);
    fx.feed("x");
    assert_eq!(fx.lines(), vec!["bc"]);
}

#[test]
fn unknown_key_cancels_a_pending_operator() {
    let mut fx = Fixture::new("one two\n");
    fx.feed("dq");
    assert_eq!(fx.ui.bells, 1);
    fx.feed("x");
    // Only the plain delete ran; the operator was dropped.
    assert_eq!(fx.lines(), vec!["ne two"]);
}

#[test]
fn failed_vertical_motion_under_an_operator() {
    let mut fx = Fixture::new("only\n");
    fx.feed("dk");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.lines(), vec!["only"]);
}

#[test]
fn x_on_an_empty_line_fails() {
    let mut fx = Fixture::new("\nabc\n");
    fx.feed("x");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.line_count(), 2);
}

#[test]
fn find_with_a_missing_target_fails_in_place() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("fz");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.cursor(), (1, 0));
}

#[test]
fn escape_aborts_a_pending_argument_silently() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("f");
    fx.key(K_ESC);
    assert_eq!(fx.ui.bells, 0);
    fx.feed("x");
    assert_eq!(fx.lines(), vec!["bc"]);
}

#[test]
fn undo_is_rejected_while_an_operator_is_pending() {
    let mut fx = Fixture::new("a\nb\n");
    fx.feed("du");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.line_count(), 2);
}

#[test]
fn colon_range_requires_a_selection() {
    let mut fx = Fixture::new("abc\n");
    fx.feed(":");
    assert_eq!(fx.ui.bells, 1);
}

#[test]
fn cmdline_window_blocks_visual_mode() {
    let mut fx = Fixture::new("abc\n");
    fx.cmdwin = true;
    fx.feed("v");
    assert_eq!(fx.ui.bells, 1);
    assert!(!fx.engine.visual_active());
}

#[test]
fn cmdline_window_blocks_jump_walks() {
    let mut fx = Fixture::new("a\nb\n");
    fx.feed("G");
    fx.cmdwin = true;
    fx.key(K_CTRL_O);
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.cursor(), (2, 0));
}

#[test]
fn interrupt_clears_a_pending_operator() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("d");
    fx.key(K_INTERRUPT);
    fx.feed("x");
    assert_eq!(fx.lines(), vec!["bc"]);
}

#[test]
fn search_without_a_service_fails() {
    let mut fx = Fixture::new("abc\n");
    fx.engine.registers.last_search = "b".to_string();
    fx.feed("n");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.cursor(), (1, 0));
}

#[test]
fn right_motion_stops_at_the_last_grapheme() {
    let mut fx = Fixture::new("ab\n").at(1, 1);
    fx.feed("l");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.cursor(), (1, 1));
}

#[test]
fn failure_does_not_poison_the_next_command() {
    let mut fx = Fixture::new("one two\n");
    fx.feed("3dk");
    assert_eq!(fx.ui.bells, 1);
    fx.feed("dw");
    assert_eq!(fx.lines(), vec!["two"]);
}

#[test]
fn errors_with_text_reach_the_error_channel() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("\"=dd");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.ui.errors.len(), 1);
    assert_eq!(fx.line_count(), 1);
}

//! Marks, mark motions, and jumplist navigation.

mod common;

use common::Fixture;
use patina_keys::{K_CTRL_O, K_TAB};
use pretty_assertions::assert_eq;

#[test]
fn backtick_jumps_to_the_exact_position() {
    let mut fx = Fixture::new("  foo bar\n").at(1, 6);
    fx.feed("ma");
    fx.feed("0");
    assert_eq!(fx.cursor(), (1, 0));
    fx.feed("`a");
    assert_eq!(fx.cursor(), (1, 6));
}

#[test]
fn apostrophe_jumps_to_the_first_nonblank() {
    let mut fx = Fixture::new("  foo\nbar\n").at(1, 4);
    fx.feed("ma");
    fx.feed("j");
    fx.feed("'a");
    assert_eq!(fx.cursor(), (1, 2));
}

#[test]
fn unset_mark_rings_the_bell() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("`q");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.cursor(), (1, 0));
}

#[test]
fn non_settable_mark_name_is_rejected() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("m!");
    assert_eq!(fx.ui.bells, 1);
}

#[test]
fn delete_as_operator_with_a_mark_motion() {
    let mut fx = Fixture::new("abcdef\n").at(1, 3);
    fx.feed("ma");
    fx.feed("0");
    fx.feed("d`a");
    assert_eq!(fx.lines(), vec!["def"]);
}

#[test]
fn line_deletes_remap_marks() {
    let mut fx = Fixture::new("one\ntwo\nthree\n").at(3, 0);
    fx.feed("mb");
    fx.feed("gg");
    fx.feed("dd");
    fx.feed("`b");
    assert_eq!(fx.cursor(), (2, 0));
}

#[test]
fn mark_on_a_deleted_line_collapses_to_the_deletion_point() {
    let mut fx = Fixture::new("one\ntwo\nthree\n").at(2, 2);
    fx.feed("mc");
    fx.feed("dd");
    fx.feed("gg");
    fx.feed("`c");
    assert_eq!(fx.cursor(), (2, 0));
}

#[test]
fn within_line_deletes_shift_mark_columns() {
    let mut fx = Fixture::new("abcd\n").at(1, 3);
    fx.feed("md");
    fx.feed("0");
    fx.feed("x");
    fx.feed("`d");
    assert_eq!(fx.cursor(), (1, 2));
}

#[test]
fn goto_line_pushes_a_jump() {
    let mut fx = Fixture::new("l1\nl2\nl3\nl4\nl5\n");
    fx.feed("G");
    assert_eq!(fx.cursor(), (5, 0));
    fx.key(K_CTRL_O);
    assert_eq!(fx.cursor(), (1, 0));
    fx.key(K_TAB);
    assert_eq!(fx.cursor(), (5, 0));
}

#[test]
fn count_g_goes_to_that_line() {
    let mut fx = Fixture::new("a\nb\n  c\nd\n");
    fx.feed("3G");
    assert_eq!(fx.cursor(), (3, 2));
}

#[test]
fn gg_goes_to_the_top() {
    let mut fx = Fixture::new("  a\nb\nc\n").at(3, 0);
    fx.feed("gg");
    assert_eq!(fx.cursor(), (1, 2));
}

#[test]
fn jump_walk_with_nothing_stored_rings_the_bell() {
    let mut fx = Fixture::new("a\nb\n");
    fx.key(K_CTRL_O);
    assert_eq!(fx.ui.bells, 1);
}

#[test]
fn unset_mark_under_an_operator_cancels_it_cleanly() {
    let mut fx = Fixture::new("a\nb\nc\n").at(3, 0);
    fx.feed("d'a");
    assert_eq!(fx.ui.bells, 1);
    assert_eq!(fx.line_count(), 3);
    fx.feed("dd");
    assert_eq!(fx.lines(), vec!["a", "b"]);
}

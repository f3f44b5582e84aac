//! Count prefixes, count multiplication, and the repeat command.

mod common;

use common::Fixture;
use patina_keys::K_CTRL_H;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn twenty_words() -> String {
    let words: Vec<String> = (0..20).map(|i| format!("w{i:02}")).collect();
    let mut line = words.join(" ");
    line.push('\n');
    line
}

#[test]
fn operator_count_multiplies_motion_count() {
    let text = twenty_words();
    let mut a = Fixture::new(&text);
    a.feed("2d3w");
    let mut b = Fixture::new(&text);
    b.feed("d6w");
    assert_eq!(a.lines(), b.lines());
}

proptest! {
    #[test]
    fn count_products_agree(m in 1usize..=3, n in 1usize..=3) {
        let text = twenty_words();
        let mut split = Fixture::new(&text);
        split.feed(&format!("{m}d{n}w"));
        let mut folded = Fixture::new(&text);
        folded.feed(&format!("d{}w", m * n));
        prop_assert_eq!(split.lines(), folded.lines());
    }
}

#[test]
fn register_prefix_count_multiplies_too() {
    let text: String = (1..=8).map(|i| format!("line{i}\n")).collect();
    let mut fx = Fixture::new(&text);
    fx.feed("2\"a3yy");
    assert_eq!(
        fx.reg('a').as_deref(),
        Some("line1\nline2\nline3\nline4\nline5\nline6")
    );
}

#[test]
fn ctrl_h_erases_a_typed_digit() {
    let mut fx = Fixture::new("a\nb\nc\n");
    fx.feed("3");
    fx.key(K_CTRL_H);
    fx.feed("dd");
    assert_eq!(fx.lines(), vec!["b", "c"]);
}

#[test]
fn zero_is_a_motion_not_a_count_digit() {
    let mut fx = Fixture::new("  abc\n").at(1, 4);
    fx.feed("0");
    assert_eq!(fx.cursor(), (1, 0));
    // But after a nonzero digit it extends the count.
    let mut fx = Fixture::new("aaaaaaaaaaaa\n");
    fx.feed("10x");
    assert_eq!(fx.lines(), vec!["aa"]);
}

#[test]
fn dot_repeats_the_last_change() {
    let mut fx = Fixture::new("one two three four\n");
    fx.feed("dw");
    assert_eq!(fx.lines(), vec!["two three four"]);
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["three four"]);
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["four"]);
}

#[test]
fn dot_repeats_the_recorded_count() {
    let mut fx = Fixture::new("abcdefgh\n");
    fx.feed("2x");
    assert_eq!(fx.lines(), vec!["cdefgh"]);
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["efgh"]);
}

#[test]
fn dot_count_overrides_the_recorded_count() {
    let mut fx = Fixture::new("abcdefgh\n");
    fx.feed("2x");
    fx.feed("3.");
    assert_eq!(fx.lines(), vec!["fgh"]);
}

#[test]
fn undo_is_not_recorded_for_repeat() {
    let mut fx = Fixture::new("one two three\n");
    fx.feed("dw");
    fx.feed("u");
    assert_eq!(fx.lines(), vec!["one two three"]);
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["two three"]);
}

#[test]
fn motions_are_not_recorded_for_repeat() {
    let mut fx = Fixture::new("ab cd ef\n");
    fx.feed("x");
    fx.feed("ww");
    fx.feed(".");
    // The repeat replays the delete at the new position, not the motion.
    assert_eq!(fx.lines(), vec!["b cd f"]);
}

#[test]
fn dot_repeats_an_operator_with_its_argument() {
    let mut fx = Fixture::new("axbxcxd\n");
    fx.feed("dfx");
    assert_eq!(fx.lines(), vec!["bxcxd"]);
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["cxd"]);
}

#[test]
fn dot_repeats_replace() {
    let mut fx = Fixture::new("aaa\nbbb\n");
    fx.feed("rz");
    fx.feed("j");
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["zaa", "zbb"]);
}

#[test]
fn dot_with_a_register_prefix_overrides_the_register() {
    let mut fx = Fixture::new("one\ntwo\nthree\n");
    fx.feed("dd");
    fx.feed("\"b.");
    assert_eq!(fx.reg('b').as_deref(), Some("two"));
    assert_eq!(fx.lines(), vec!["three"]);
}

#[test]
fn dot_with_nothing_recorded_fails_quietly() {
    let mut fx = Fixture::new("abc\n");
    fx.feed(".");
    assert_eq!(fx.lines(), vec!["abc"]);
    assert_eq!(fx.ui.bells, 1);
}

#[test]
fn esc_clears_a_pending_count_and_register() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("3\"a2");
    fx.esc();
    fx.feed("x");
    assert_eq!(fx.lines(), vec!["bc"]);
}

#[test]
fn count_is_clamped_rather_than_overflowing() {
    let mut fx = Fixture::new("abc\n");
    fx.feed("99999999999999999999x");
    assert_eq!(fx.lines(), vec![""]);
}

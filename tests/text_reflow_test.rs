use mdwrap_lib::{LineWords, SourceLine, WordRange, reflow_line};
use pretty_assertions::assert_eq;

fn wrap(text: &str, wrap_column: usize) -> Option<Vec<String>> {
    let words = LineWords::new(text, 0);
    reflow_line(SourceLine::new(text), wrap_column, &words).map(|r| r.lines())
}

fn lines(expected: &[&str]) -> Option<Vec<String>> {
    Some(expected.iter().map(|s| s.to_string()).collect())
}

#[test]
fn test_plain_prose() {
    assert_eq!(
        wrap("This is a very long line of text that needs wrapping", 20),
        lines(&["This is a very long", "line of text that", "needs wrapping"])
    );
}

#[test]
fn test_bullet_list_pads_continuation() {
    assert_eq!(
        wrap("- word1 word2 word3 word4", 15),
        lines(&["- word1 word2", "  word3 word4"])
    );
}

#[test]
fn test_ordered_list_pads_continuation() {
    assert_eq!(
        wrap("12. alpha beta gamma delta", 16),
        lines(&["12. alpha beta", "    gamma delta"])
    );
}

#[test]
fn test_blockquote_repeats_marker() {
    assert_eq!(
        wrap("> quoted text that is long enough", 16),
        lines(&["> quoted text", "> that is long", "> enough"])
    );
}

#[test]
fn test_nested_quote_with_task_item() {
    assert_eq!(
        wrap("> - [x] finish the wrapping engine", 22),
        lines(&["> - [x] finish the", ">       wrapping", ">       engine"])
    );
}

#[test]
fn test_indented_list_keeps_leading_whitespace() {
    assert_eq!(
        wrap("    * nested item with several words", 20),
        lines(&["    * nested item", "      with several", "      words"])
    );
}

#[test]
fn test_giant_word_is_untouched() {
    assert_eq!(wrap("supercalifragilistic", 5), None);
}

#[test]
fn test_giant_word_stops_breaking() {
    // Breaking stops at the long word and the rest stays on one line
    assert_eq!(
        wrap("short words then averyveryverylongword and more", 12),
        lines(&["short words", "then", "averyveryverylongword and more"])
    );
}

#[test]
fn test_line_that_fits_is_untouched() {
    assert_eq!(wrap("fits fine", 9), None);
    assert_eq!(wrap("", 10), None);
    assert_eq!(wrap("- [ ] ", 3), None);
}

#[test]
fn test_trailing_whitespace_kept_in_last_fragment() {
    assert_eq!(wrap("aaa bbb ccc  ", 7), lines(&["aaa bbb", "ccc  "]));
}

#[test]
fn test_multibyte_columns() {
    assert_eq!(
        wrap("héllo wörld ünïcode", 12),
        lines(&["héllo wörld", "ünïcode"])
    );
}

#[test]
fn test_closure_resolver_and_fragments() {
    let text = "one two three";
    let words = LineWords::new(text, 0);
    let resolver = |column: usize| -> Option<WordRange> { words.words().iter().copied().find(|w| w.end > column) };
    let result = reflow_line(SourceLine::new(text), 8, &resolver).unwrap();
    assert_eq!(result.fragments, vec!["one two", "three"]);
    assert_eq!(result.join("\r\n"), "one two\r\nthree");
}

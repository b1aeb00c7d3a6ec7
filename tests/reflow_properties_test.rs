use mdwrap_lib::{WrapOptions, wrap_content};
use proptest::prelude::*;

/// Lines of short alphanumeric words, so no single word outgrows the usable width
fn prose() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..40).prop_map(|words| words.join(" "))
}

fn prefix() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "- ", "> ", "1. ", "  ", "> - [ ] "])
}

proptest! {
    #[test]
    fn every_line_fits_the_wrap_column(text in prose(), marker in prefix(), wrap_column in 16usize..60) {
        let line = format!("{marker}{text}");
        let (wrapped, _) = wrap_content(&line, wrap_column, WrapOptions::default()).unwrap();
        for out in wrapped.lines() {
            prop_assert!(
                out.chars().count() <= wrap_column,
                "{out:?} is wider than {wrap_column}"
            );
        }
    }

    #[test]
    fn words_are_never_split(text in prose(), wrap_column in 8usize..60) {
        let (wrapped, _) = wrap_content(&text, wrap_column, WrapOptions::default()).unwrap();
        let before: Vec<&str> = text.split_whitespace().collect();
        let after: Vec<&str> = wrapped.split_whitespace().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn wrapping_is_idempotent(text in prose(), marker in prefix(), wrap_column in 16usize..60) {
        let line = format!("{marker}{text}\n");
        let (once, _) = wrap_content(&line, wrap_column, WrapOptions::default()).unwrap();
        let (twice, summary) = wrap_content(&once, wrap_column, WrapOptions::default()).unwrap();
        prop_assert!(summary.is_unchanged());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn short_lines_are_untouched(text in "[a-z ]{0,20}", wrap_column in 20usize..80) {
        let (wrapped, summary) = wrap_content(&text, wrap_column, WrapOptions::default()).unwrap();
        prop_assert!(summary.is_unchanged());
        prop_assert_eq!(wrapped, text);
    }
}

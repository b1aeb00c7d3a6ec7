//! Word boundary lookup for the reflow engine
//!
//! A "word" is a maximal run of non-whitespace characters. Columns are counted
//! in `char`s and are absolute within the document line, so a resolver built
//! for a line that starts at column 4 reports its first word at column 4 or
//! later.

use regex::Regex;
use std::sync::LazyLock;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// Column range of a single word, `start` inclusive and `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordRange {
    pub start: usize,
    pub end: usize,
}

impl WordRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, column: usize) -> bool {
        self.start <= column && column < self.end
    }
}

/// Locates the word overlapping or following a column
pub trait WordBoundaryResolver {
    /// Returns the word containing `column`, or the first word starting after
    /// it. `None` when no word exists between `column` and the end of the line.
    fn word_range_at(&self, column: usize) -> Option<WordRange>;
}

impl<F> WordBoundaryResolver for F
where
    F: Fn(usize) -> Option<WordRange>,
{
    fn word_range_at(&self, column: usize) -> Option<WordRange> {
        self(column)
    }
}

/// Precomputed word ranges of one line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineWords {
    words: Vec<WordRange>,
}

impl LineWords {
    /// Index every word of `text`, whose first character sits at `start_column`
    pub fn new(text: &str, start_column: usize) -> Self {
        let mut words = Vec::new();
        // Byte offsets from the regex are converted to char columns incrementally
        let mut column = start_column;
        let mut byte_pos = 0;
        for m in WORD_REGEX.find_iter(text) {
            column += text[byte_pos..m.start()].chars().count();
            let start = column;
            column += m.as_str().chars().count();
            byte_pos = m.end();
            words.push(WordRange::new(start, column));
        }
        Self { words }
    }

    pub fn words(&self) -> &[WordRange] {
        &self.words
    }
}

impl WordBoundaryResolver for LineWords {
    fn word_range_at(&self, column: usize) -> Option<WordRange> {
        // Words are sorted and disjoint: the first one ending past `column`
        // either contains it or is the next word after it.
        let idx = self.words.partition_point(|word| word.end <= column);
        self.words.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_words_indexes_by_char_column() {
        let words = LineWords::new("héllo  wörld", 0);
        assert_eq!(words.words(), &[WordRange::new(0, 5), WordRange::new(7, 12)]);
    }

    #[test]
    fn test_line_words_respects_start_column() {
        let words = LineWords::new("ab cd", 10);
        assert_eq!(words.words(), &[WordRange::new(10, 12), WordRange::new(13, 15)]);
    }

    #[test]
    fn test_word_range_at_contains_or_follows() {
        let words = LineWords::new("one two  three", 0);
        // Inside a word
        assert_eq!(words.word_range_at(1), Some(WordRange::new(0, 3)));
        // Whitespace resolves to the following word
        assert_eq!(words.word_range_at(3), Some(WordRange::new(4, 7)));
        assert_eq!(words.word_range_at(8), Some(WordRange::new(9, 14)));
        // Past the last word
        assert_eq!(words.word_range_at(14), None);
        assert_eq!(words.word_range_at(100), None);
    }

    #[test]
    fn test_trailing_whitespace_has_no_word() {
        let words = LineWords::new("end   ", 0);
        assert_eq!(words.word_range_at(4), None);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |column: usize| (column < 5).then(|| WordRange::new(column, 5));
        assert_eq!(resolver.word_range_at(2), Some(WordRange::new(2, 5)));
        assert_eq!(resolver.word_range_at(7), None);
    }
}

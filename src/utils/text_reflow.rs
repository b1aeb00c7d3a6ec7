//! Line reflow engine
//!
//! Breaks one line of markdown prose at word boundaries so that every fragment
//! fits the wrap column, and works out the indentation each fragment carries.
//! Block quote markers are repeated on continuation lines; list markers are
//! replaced by padding of the same width.
//!
//! The engine never splits a word. When the first word left on a line is wider
//! than the usable width, breaking stops and the rest of the line is kept as a
//! single trailing fragment.

use crate::utils::markdown_prefix::PREFIX_RULES;
use crate::utils::word_boundary::WordBoundaryResolver;

/// One line handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// Raw text of the line, without its line terminator
    pub text: &'a str,
    /// Zero-based column at which the line starts in its document
    pub start_column: usize,
    /// Column just past the last character of the line
    pub end_column: usize,
}

impl<'a> SourceLine<'a> {
    /// A line starting at column 0
    pub fn new(text: &'a str) -> Self {
        Self::at_column(text, 0)
    }

    pub fn at_column(text: &'a str, start_column: usize) -> Self {
        Self {
            text,
            start_column,
            end_column: start_column + text.chars().count(),
        }
    }

    /// Number of columns the line occupies
    pub fn width(&self) -> usize {
        self.end_column.saturating_sub(self.start_column)
    }
}

/// Indentation derived from leading whitespace and markdown markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indentation {
    /// Repeated in front of every continuation fragment
    pub base: String,
    /// `base` with the literal markers, used for the first fragment only
    pub first_line: String,
}

impl Indentation {
    /// Detect the indentation of `text`, returning it with the remaining content.
    ///
    /// Leading whitespace seeds both strings. Prefix rules are then applied in
    /// table order until a whole pass over the table matches nothing.
    pub fn detect(text: &str) -> (Self, &str) {
        let content = text.trim_start();
        let leading = &text[..text.len() - content.len()];

        let mut indentation = Self {
            base: leading.to_string(),
            first_line: leading.to_string(),
        };
        let mut rest = content;

        loop {
            let mut matched = false;
            for rule in PREFIX_RULES.iter() {
                let Some(marker) = rule.match_marker(rest) else {
                    continue;
                };
                indentation.first_line.push_str(marker);
                if rule.applies_to_all_lines() {
                    indentation.base.push_str(marker);
                } else {
                    indentation
                        .base
                        .extend(std::iter::repeat_n(' ', marker.chars().count()));
                }
                rest = &rest[marker.len()..];
                matched = true;
            }
            if !matched {
                break;
            }
        }

        (indentation, rest)
    }

    /// Width in columns of the continuation indentation
    pub fn width(&self) -> usize {
        self.base.chars().count()
    }
}

/// Result of breaking a line that did not fit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReflow {
    pub indentation: Indentation,
    /// Fragment texts without indentation. All but the last are trimmed of
    /// trailing whitespace.
    pub fragments: Vec<String>,
}

impl LineReflow {
    /// Fragments with their indentation applied, one entry per output line
    pub fn lines(&self) -> Vec<String> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| {
                let indent = if i == 0 {
                    &self.indentation.first_line
                } else {
                    &self.indentation.base
                };
                format!("{indent}{fragment}")
            })
            .collect()
    }

    /// Join the indented fragments with `line_separator`
    pub fn join(&self, line_separator: &str) -> String {
        self.lines().join(line_separator)
    }
}

/// Byte index of the `n`th char of `s`, or `s.len()` when `s` is shorter
fn byte_index(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Break `line` so that its fragments fit within `wrap_column`.
///
/// Returns `None` when the line is left untouched: it already fits, its
/// indentation leaves no room for text, or its first word alone is wider than
/// the usable width.
pub fn reflow_line<R>(line: SourceLine<'_>, wrap_column: usize, resolver: &R) -> Option<LineReflow>
where
    R: WordBoundaryResolver + ?Sized,
{
    let (indentation, content) = Indentation::detect(line.text);
    let indent_width = indentation.width();

    let Some(usable_width) = wrap_column.checked_sub(indent_width).filter(|w| *w >= 1) else {
        log::trace!("indentation of {indent_width} columns leaves no room within column {wrap_column}");
        return None;
    };

    let mut fragments = Vec::new();
    let mut rest = content;
    let mut offset = line.start_column + indent_width;

    while line.end_column.saturating_sub(offset) > usable_width {
        // Probe one column past the break point so a word ending exactly at
        // the boundary is not mistaken for an overflowing one.
        let probe = offset + usable_width;
        let break_column = match resolver.word_range_at(probe) {
            Some(word) => word.start.saturating_sub(offset),
            None => usable_width,
        };

        if break_column == 0 {
            log::trace!("word at column {offset} is wider than {usable_width} columns, not breaking further");
            break;
        }

        let (head, tail) = rest.split_at(byte_index(rest, break_column));
        fragments.push(head.trim_end().to_string());
        rest = tail;
        offset += break_column;
    }

    if fragments.is_empty() {
        return None;
    }

    fragments.push(rest.to_string());
    Some(LineReflow { indentation, fragments })
}

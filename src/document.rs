//! Document adapter
//!
//! The reflow commands read lines and word boundaries through [`Document`] and
//! hand back a batch of [`ChangedLine`]s, which the document applies as one
//! transaction. [`TextDocument`] is the in-memory implementation used by the
//! command-line front end and the tests.

use crate::utils::text_reflow::SourceLine;
use crate::utils::word_boundary::{LineWords, WordBoundaryResolver, WordRange};
use std::collections::HashSet;
use std::fmt;

/// Column span within a single line, `start` inclusive and `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    /// Span covering the whole of `line`
    pub fn of_line(index: usize, line: &SourceLine<'_>) -> Self {
        Self::new(index, line.start_column, line.end_column)
    }
}

/// A line whose span is to be replaced by (possibly multi-line) text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedLine {
    pub span: LineSpan,
    pub replacement: String,
}

/// Errors raised when a batch of edits cannot be applied
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("Span {start}..{end} is outside line {line} of length {length}")]
    InvalidSpan {
        line: usize,
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Line {line} is edited more than once in the same batch")]
    DuplicateLine { line: usize },
}

/// Read and write access to a line-oriented document.
///
/// Reads must reflect one consistent snapshot for the duration of a reflow;
/// `apply_edits` must apply the whole batch or nothing.
pub trait Document {
    fn line_count(&self) -> usize;

    /// Text and column span of line `index`
    fn line(&self, index: usize) -> Option<SourceLine<'_>>;

    /// Word containing or following `column` on line `line`
    fn word_range_at(&self, line: usize, column: usize) -> Option<WordRange>;

    /// Separator inserted between wrapped fragments
    fn line_separator(&self) -> &str {
        "\n"
    }

    fn apply_edits(&mut self, edits: &[ChangedLine]) -> Result<(), DocumentError>;
}

/// Line terminator style of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect from the first line terminator in `content`
    pub fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(pos) if content[..pos].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Lf => write!(f, "lf"),
            LineEnding::CrLf => write!(f, "crlf"),
        }
    }
}

/// In-memory document backed by a vector of lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    lines: Vec<String>,
    line_ending: LineEnding,
    final_newline: bool,
}

impl TextDocument {
    /// Split `content` into lines. Every line ending is normalised to the style
    /// of the first one.
    pub fn from_content(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
            line_ending: LineEnding::detect(content),
            final_newline: content.ends_with('\n'),
        }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Reassemble the document text
    pub fn content(&self) -> String {
        let separator = self.line_ending.as_str();
        let mut content = self.lines.join(separator);
        if self.final_newline && !self.lines.is_empty() {
            content.push_str(separator);
        }
        content
    }

    fn validate(&self, edits: &[ChangedLine]) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for edit in edits {
            let span = edit.span;
            let Some(text) = self.lines.get(span.line) else {
                return Err(DocumentError::LineOutOfRange {
                    line: span.line,
                    line_count: self.lines.len(),
                });
            };
            let length = text.chars().count();
            if span.start > span.end || span.end > length {
                return Err(DocumentError::InvalidSpan {
                    line: span.line,
                    start: span.start,
                    end: span.end,
                    length,
                });
            }
            if !seen.insert(span.line) {
                return Err(DocumentError::DuplicateLine { line: span.line });
            }
        }
        Ok(())
    }
}

fn byte_index(s: &str, column: usize) -> usize {
    s.char_indices().nth(column).map_or(s.len(), |(i, _)| i)
}

impl Document for TextDocument {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<SourceLine<'_>> {
        self.lines.get(index).map(|text| SourceLine::new(text))
    }

    fn word_range_at(&self, line: usize, column: usize) -> Option<WordRange> {
        let text = self.lines.get(line)?;
        LineWords::new(text, 0).word_range_at(column)
    }

    fn line_separator(&self) -> &str {
        self.line_ending.as_str()
    }

    fn apply_edits(&mut self, edits: &[ChangedLine]) -> Result<(), DocumentError> {
        self.validate(edits)?;

        // Bottom-up so earlier line indices stay valid while splicing
        let mut ordered: Vec<&ChangedLine> = edits.iter().collect();
        ordered.sort_by(|a, b| b.span.line.cmp(&a.span.line));

        for edit in ordered {
            let span = edit.span;
            let old = &self.lines[span.line];
            let start = byte_index(old, span.start);
            let end = byte_index(old, span.end);
            let new_text = format!("{}{}{}", &old[..start], edit.replacement, &old[end..]);
            let new_lines: Vec<String> = new_text
                .split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .collect();
            self.lines.splice(span.line..=span.line, new_lines);
        }

        Ok(())
    }
}

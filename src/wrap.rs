//! Wrap commands
//!
//! Runs the line reflow engine over a range of document lines, collects one
//! [`ChangedLine`] per line that needs breaking and applies the batch in a
//! single call to [`Document::apply_edits`].

use crate::config::WrapColumnSource;
use crate::document::{ChangedLine, Document, DocumentError, LineSpan};
use crate::inline_config::InlineConfig;
use crate::utils::text_reflow::reflow_line;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WrapError {
    #[error("No wrap column is configured (set `rulers` or `wrap-column`)")]
    MissingWrapColumn,

    #[error("Document rejected the edits: {0}")]
    Document(#[from] DocumentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOptions {
    /// Skip lines protected by `<!-- mdwrap-... -->` comments
    pub respect_inline_directives: bool,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            respect_inline_directives: true,
        }
    }
}

/// What a wrap command did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapSummary {
    /// Number of lines inside the range that were looked at
    pub lines_examined: usize,
    /// Zero-based original indices of the lines that were broken
    pub changed_lines: Vec<usize>,
}

impl WrapSummary {
    pub fn is_unchanged(&self) -> bool {
        self.changed_lines.is_empty()
    }
}

/// Inclusive, zero-based range of lines to wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub first_line: usize,
    pub last_line: usize,
}

impl Selection {
    pub fn new(first_line: usize, last_line: usize) -> Self {
        Self { first_line, last_line }
    }

    /// A selection covering one line
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }
}

/// Clamp `first..=last` to the document, swapping reversed bounds
fn clamp_range<D: Document + ?Sized>(doc: &D, first_line: usize, last_line: usize) -> Option<(usize, usize)> {
    let line_count = doc.line_count();
    if line_count == 0 {
        return None;
    }
    let (first, last) = if first_line <= last_line {
        (first_line, last_line)
    } else {
        (last_line, first_line)
    };
    if first >= line_count {
        return None;
    }
    Some((first, last.min(line_count - 1)))
}

fn inline_config<D: Document + ?Sized>(doc: &D) -> InlineConfig {
    InlineConfig::from_lines((0..doc.line_count()).map(move |i| doc.line(i).map_or("", |line| line.text)))
}

/// Compute the replacements for lines `first_line..=last_line` without
/// touching the document. Lines that already fit are not included.
pub fn line_changes<D: Document + ?Sized>(
    doc: &D,
    first_line: usize,
    last_line: usize,
    wrap_column: usize,
    options: WrapOptions,
) -> Vec<ChangedLine> {
    let Some((first, last)) = clamp_range(doc, first_line, last_line) else {
        return Vec::new();
    };

    let directives = options.respect_inline_directives.then(|| inline_config(doc));
    let separator = doc.line_separator();
    let mut changes = Vec::new();

    for index in first..=last {
        if directives.as_ref().is_some_and(|d| d.is_disabled(index)) {
            log::trace!("line {index} is protected by an inline directive");
            continue;
        }
        let Some(line) = doc.line(index) else {
            continue;
        };
        let resolver = |column: usize| doc.word_range_at(index, column);
        if let Some(reflow) = reflow_line(line, wrap_column, &resolver) {
            changes.push(ChangedLine {
                span: LineSpan::of_line(index, &line),
                replacement: reflow.join(separator),
            });
        }
    }

    changes
}

/// Wrap lines `first_line..=last_line` of `doc` to `wrap_column`.
///
/// Every replacement is computed from the unmodified document and then
/// applied as one batch.
pub fn reflow<D: Document + ?Sized>(
    doc: &mut D,
    first_line: usize,
    last_line: usize,
    wrap_column: usize,
    options: WrapOptions,
) -> Result<WrapSummary, WrapError> {
    if wrap_column == 0 {
        return Err(WrapError::MissingWrapColumn);
    }

    let lines_examined = clamp_range(doc, first_line, last_line).map_or(0, |(first, last)| last - first + 1);
    let changes = line_changes(doc, first_line, last_line, wrap_column, options);
    let changed_lines = changes.iter().map(|c| c.span.line).collect();

    if !changes.is_empty() {
        doc.apply_edits(&changes)?;
    }

    log::debug!("wrapped {} of {lines_examined} lines at column {wrap_column}", changes.len());
    Ok(WrapSummary {
        lines_examined,
        changed_lines,
    })
}

/// Wrap the selected lines of the active document, if there is one
pub fn wrap_selected_lines<D, C>(target: Option<(&mut D, Selection)>, config: &C) -> Result<WrapSummary, WrapError>
where
    D: Document + ?Sized,
    C: WrapColumnSource + ?Sized,
{
    let wrap_column = config.wrap_column().ok_or(WrapError::MissingWrapColumn)?;
    let Some((doc, selection)) = target else {
        return Ok(WrapSummary::default());
    };
    reflow(
        doc,
        selection.first_line,
        selection.last_line,
        wrap_column,
        WrapOptions::default(),
    )
}

/// Wrap every line of the active document, if there is one
pub fn wrap_file<D, C>(target: Option<&mut D>, config: &C) -> Result<WrapSummary, WrapError>
where
    D: Document + ?Sized,
    C: WrapColumnSource + ?Sized,
{
    let wrap_column = config.wrap_column().ok_or(WrapError::MissingWrapColumn)?;
    let Some(doc) = target else {
        return Ok(WrapSummary::default());
    };
    let last_line = doc.line_count().saturating_sub(1);
    reflow(doc, 0, last_line, wrap_column, WrapOptions::default())
}

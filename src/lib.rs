pub mod config;
pub mod document;
pub mod exit_codes;
pub mod inline_config;
pub mod utils;
pub mod wrap;

pub use crate::config::{Config, WrapColumnSource};
pub use crate::document::{ChangedLine, Document, DocumentError, LineEnding, LineSpan, TextDocument};
pub use crate::inline_config::InlineConfig;
pub use crate::utils::text_reflow::{Indentation, LineReflow, SourceLine, reflow_line};
pub use crate::utils::word_boundary::{LineWords, WordBoundaryResolver, WordRange};
pub use crate::wrap::{Selection, WrapError, WrapOptions, WrapSummary, wrap_file, wrap_selected_lines};

/// Wrap column for one file: a `mdwrap-configure-file` comment overrides the
/// configured value when inline directives are honoured.
pub fn effective_wrap_column<C>(content: &str, config: &C, options: WrapOptions) -> Option<usize>
where
    C: WrapColumnSource + ?Sized,
{
    if options.respect_inline_directives
        && let Some(column) = InlineConfig::from_content(content).wrap_column()
    {
        log::debug!("using wrap column {column} from mdwrap-configure-file comment");
        return Some(column);
    }
    config.wrap_column()
}

/// Wrap every line of `content`, returning the new text and what changed.
///
/// Line endings and the presence of a final newline are preserved.
pub fn wrap_content(
    content: &str,
    wrap_column: usize,
    options: WrapOptions,
) -> Result<(String, WrapSummary), WrapError> {
    let mut doc = TextDocument::from_content(content);
    let last_line = doc.line_count().saturating_sub(1);
    let summary = wrap::reflow(&mut doc, 0, last_line, wrap_column, options)?;
    if summary.is_unchanged() {
        return Ok((content.to_string(), summary));
    }
    Ok((doc.content(), summary))
}

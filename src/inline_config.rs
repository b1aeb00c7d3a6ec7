//! Inline directive comments that keep regions of a file from being wrapped
//!
//! Supports:
//! - `<!-- mdwrap-disable -->` - Stop wrapping from this point
//! - `<!-- mdwrap-enable -->` - Resume wrapping from this point
//! - `<!-- mdwrap-disable-line -->` - Leave the current line alone
//! - `<!-- mdwrap-disable-next-line -->` - Leave the next line alone
//! - `<!-- mdwrap-capture -->` - Capture the current enabled/disabled state
//! - `<!-- mdwrap-restore -->` - Restore the captured state
//! - `<!-- mdwrap-disable-file -->` - Leave the entire file alone
//! - `<!-- mdwrap-configure-file { "wrap-column": 100 } -->` - Override the wrap column for this file
//! - `<!-- prettier-ignore -->` - Leave the next line alone (compatibility with prettier)
//!
//! Line numbers are zero-based, matching [`crate::document::Document`].
//! A line that carries a directive is itself never wrapped.

use serde_json::Value as JsonValue;
use std::collections::HashSet;

const DIRECTIVE_PREFIX: &str = "<!-- mdwrap-";

#[derive(Debug, Clone, Default)]
pub struct InlineConfig {
    /// Wrapping state of each line (true = disabled)
    disabled_at_line: Vec<bool>,
    /// Lines disabled via disable-line, disable-next-line or prettier-ignore
    line_disabled: HashSet<usize>,
    /// Set by disable-file
    file_disabled: bool,
    /// Merged JSON objects from configure-file comments
    file_config: serde_json::Map<String, JsonValue>,
}

impl InlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process all directive comments in the content
    pub fn from_content(content: &str) -> Self {
        Self::from_lines(content.lines())
    }

    /// Process all directive comments in a sequence of lines
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut config = Self::new();
        let mut currently_disabled = false;
        let mut capture_stack: Vec<bool> = Vec::new();

        for (line_idx, line) in lines.into_iter().enumerate() {
            // State is recorded before the line's own comments are processed,
            // so a disable comment takes effect from the following line
            config.disabled_at_line.push(currently_disabled);

            if !line.contains("<!--") {
                continue;
            }

            if line.contains(DIRECTIVE_PREFIX) {
                config.line_disabled.insert(line_idx);
            }

            if is_disable_file_comment(line) {
                config.file_disabled = true;
            }

            if let Some(JsonValue::Object(map)) = parse_configure_file_comment(line) {
                config.file_config.extend(map);
            }

            if is_disable_next_line_comment(line) || line.contains("<!-- prettier-ignore -->") {
                config.line_disabled.insert(line_idx + 1);
            }

            if is_disable_line_comment(line) {
                config.line_disabled.insert(line_idx);
            }

            // State-changing comments are applied in the order they appear
            let mut comment_positions = Vec::new();
            if let Some(pos) = find_directive(line, "disable") {
                comment_positions.push((pos, "disable"));
            }
            if let Some(pos) = find_directive(line, "enable") {
                comment_positions.push((pos, "enable"));
            }
            if let Some(pos) = find_directive(line, "capture") {
                comment_positions.push((pos, "capture"));
            }
            if let Some(pos) = find_directive(line, "restore") {
                comment_positions.push((pos, "restore"));
            }
            comment_positions.sort_by_key(|&(pos, _)| pos);

            for (_, comment_type) in comment_positions {
                match comment_type {
                    "disable" => currently_disabled = true,
                    "enable" => currently_disabled = false,
                    "capture" => capture_stack.push(currently_disabled),
                    "restore" => {
                        if let Some(captured) = capture_stack.pop() {
                            currently_disabled = captured;
                        }
                    }
                    _ => {}
                }
            }
        }

        config
    }

    /// Whether wrapping is disabled at zero-based `line`
    pub fn is_disabled(&self, line: usize) -> bool {
        self.file_disabled
            || self.line_disabled.contains(&line)
            || self.disabled_at_line.get(line).copied().unwrap_or(false)
    }

    pub fn is_file_disabled(&self) -> bool {
        self.file_disabled
    }

    /// Wrap column set through a configure-file comment
    pub fn wrap_column(&self) -> Option<usize> {
        ["wrap-column", "wrap_column"]
            .iter()
            .find_map(|key| self.file_config.get(*key))
            .and_then(JsonValue::as_u64)
            .and_then(|column| usize::try_from(column).ok())
            .filter(|column| *column > 0)
    }

    pub fn file_config(&self) -> &serde_json::Map<String, JsonValue> {
        &self.file_config
    }
}

/// Position of a bare `<!-- mdwrap-{name} -->` comment (no suffix such as `-line`)
fn find_directive(line: &str, name: &str) -> Option<usize> {
    let needle = format!("{DIRECTIVE_PREFIX}{name}");
    line.match_indices(&needle).find_map(|(pos, _)| {
        let after = &line[pos + needle.len()..];
        after.trim_start().starts_with("-->").then_some(pos)
    })
}

/// Check if line contains a disable-line comment
pub fn is_disable_line_comment(line: &str) -> bool {
    find_directive(line, "disable-line").is_some()
}

/// Check if line contains a disable-next-line comment
pub fn is_disable_next_line_comment(line: &str) -> bool {
    find_directive(line, "disable-next-line").is_some()
}

/// Check if line contains a disable-file comment
pub fn is_disable_file_comment(line: &str) -> bool {
    find_directive(line, "disable-file").is_some()
}

/// Parse a configure-file comment and return the JSON configuration
pub fn parse_configure_file_comment(line: &str) -> Option<JsonValue> {
    let prefix = "<!-- mdwrap-configure-file";
    let start = line.find(prefix)?;
    let after_prefix = &line[start + prefix.len()..];
    let end = after_prefix.find("-->")?;
    let json_str = after_prefix[..end].trim();
    if json_str.is_empty() {
        return None;
    }
    match serde_json::from_str(json_str) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed mdwrap-configure-file comment: {e}");
            None
        }
    }
}

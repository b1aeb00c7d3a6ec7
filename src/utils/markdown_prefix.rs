//! Line-leading markdown markers that govern continuation indentation
//!
//! The table is tried in order against the text that remains after leading
//! whitespace and previously matched markers, pass after pass, until a pass
//! matches nothing. That lets markers stack, e.g. `> - [ ] item`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Classification of a line-leading marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixKind {
    /// `> ` block quote
    Blockquote,
    /// `1. ` or `1) ` ordered list item
    OrderedList,
    /// `- `, `* ` or `+ ` bullet list item
    BulletList,
    /// `[ ] ` or `[x] ` task list checkbox
    TaskCheckbox,
}

impl PrefixKind {
    /// Whether continuation lines repeat the literal marker.
    ///
    /// Quotes must be re-marked on every line or the continuation falls out of
    /// the quote. List markers are replaced by padding so wrapped text lines up
    /// under the item content instead of starting a new item.
    pub fn applies_to_all_lines(self) -> bool {
        matches!(self, PrefixKind::Blockquote)
    }
}

impl fmt::Display for PrefixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixKind::Blockquote => write!(f, "blockquote"),
            PrefixKind::OrderedList => write!(f, "ordered-list"),
            PrefixKind::BulletList => write!(f, "bullet-list"),
            PrefixKind::TaskCheckbox => write!(f, "task-checkbox"),
        }
    }
}

/// A marker pattern anchored at the start of the remaining text
pub struct PrefixRule {
    pub kind: PrefixKind,
    pattern: Regex,
}

impl PrefixRule {
    fn new(kind: PrefixKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    pub fn applies_to_all_lines(&self) -> bool {
        self.kind.applies_to_all_lines()
    }

    /// Returns the marker text if `text` starts with it
    pub fn match_marker<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern
            .find(text)
            .filter(|m| m.start() == 0 && !m.is_empty())
            .map(|m| m.as_str())
    }
}

impl fmt::Debug for PrefixRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixRule")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Prefix rules in matching priority order
pub static PREFIX_RULES: LazyLock<Vec<PrefixRule>> = LazyLock::new(|| {
    vec![
        PrefixRule::new(PrefixKind::Blockquote, r"^> ?"),
        PrefixRule::new(PrefixKind::OrderedList, r"^\d{1,9}[.)] +"),
        PrefixRule::new(PrefixKind::BulletList, r"^[-*+] +"),
        PrefixRule::new(PrefixKind::TaskCheckbox, r"^\[[ xX]\] +"),
    ]
});

//!
//! Line-level building blocks of the reflow engine.

pub mod markdown_prefix;
pub mod text_reflow;
pub mod word_boundary;

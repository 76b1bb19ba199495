#![deny(missing_docs)]

//! # Brace-Region Locator
//!
//! Finds the span of a named block such as `service ApiService { ... }`.

use crate::error::{AppError, AppResult};
use crate::scanner::{matching_brace, mode_at, LexMode};
use regex::Regex;

/// The braces delimiting a named block.
///
/// `open < close`, and the brace depth between them returns to zero at `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRegion {
    /// Offset of the opening `{`.
    pub open: usize,
    /// Offset of the matching `}`.
    pub close: usize,
}

impl BlockRegion {
    /// Text strictly between the braces.
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.open + 1..self.close]
    }
}

fn block_pattern(keyword: &str, name: &str) -> AppResult<Regex> {
    let pattern = format!(
        r"\b{}\s+{}\s*\{{",
        regex::escape(keyword),
        regex::escape(name)
    );
    Regex::new(&pattern).map_err(|e| AppError::General(format!("Invalid block pattern: {}", e)))
}

/// Locates the first `keyword name {` block that appears in code.
///
/// Occurrences inside comments or strings are ignored. When the same block is
/// declared more than once the first one wins.
pub fn locate_block(text: &str, keyword: &str, name: &str) -> AppResult<BlockRegion> {
    let pattern = block_pattern(keyword, name)?;

    let mut matches = pattern
        .find_iter(text)
        .filter(|m| mode_at(text, m.start()) == LexMode::Normal)
        .map(|m| m.end() - 1);

    let open = matches.next().ok_or_else(|| {
        AppError::NotFound(format!("{} '{}' not found", keyword, name))
    })?;

    if matches.next().is_some() {
        tracing::warn!(
            keyword,
            name,
            "multiple blocks share this name; editing the first one"
        );
    }

    let close = matching_brace(text, open)?;
    Ok(BlockRegion { open, close })
}

//! Goods/service description extraction.

use super::FieldExtractor;
use super::patterns::{
    CONTENT_GOODS_LABEL, CONTENT_ITEM_LABEL, CONTENT_STARRED, CONTENT_STARRED_FULL, HEADER_WORDS,
};

/// Invoice-content field extractor.
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ContentExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        // Starred category+item form first, starred category alone next,
        // then the column-label fallbacks. A candidate containing a
        // table-header word matched the header row, so it is rejected
        // and the cascade continues.
        for pattern in [
            &*CONTENT_STARRED_FULL,
            &*CONTENT_STARRED,
            &*CONTENT_GOODS_LABEL,
            &*CONTENT_ITEM_LABEL,
        ] {
            if let Some(caps) = pattern.captures(text) {
                let candidate = caps[1].trim().to_string();
                if is_table_header(&candidate) {
                    continue;
                }
                return Some(candidate);
            }
        }
        None
    }
}

fn is_table_header(candidate: &str) -> bool {
    HEADER_WORDS.iter().any(|w| candidate.contains(w))
}

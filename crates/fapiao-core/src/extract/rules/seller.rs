//! Seller name extraction.

use super::FieldExtractor;
use super::patterns::{SELLER_ANY, SELLER_COMPANY, SELLER_STOP_WORDS};

/// Seller-name field extractor.
pub struct SellerExtractor;

impl SellerExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SellerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SellerExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let candidate = if let Some(caps) = SELLER_COMPANY.captures(text) {
            caps[1].to_string()
        } else if let Some(caps) = SELLER_ANY.captures(text) {
            truncate_at_stop_word(&caps[1]).to_string()
        } else {
            return None;
        };

        // OCR noise often prefixes the name with stray latin or
        // punctuation; a cleaned name of 4 chars or fewer is more likely
        // a fragment than a company name.
        let cleaned = strip_leading_non_cjk(&candidate);
        if cleaned.chars().count() > 4 {
            Some(cleaned.to_string())
        } else {
            None
        }
    }
}

/// Cut the capture at the first label that belongs to the next field.
fn truncate_at_stop_word(s: &str) -> &str {
    let mut end = s.len();
    for word in SELLER_STOP_WORDS {
        if let Some(pos) = s.find(word) {
            end = end.min(pos);
        }
    }
    &s[..end]
}

fn strip_leading_non_cjk(s: &str) -> &str {
    match s
        .char_indices()
        .find(|(_, c)| ('\u{4e00}'..='\u{9fa5}').contains(c))
    {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}

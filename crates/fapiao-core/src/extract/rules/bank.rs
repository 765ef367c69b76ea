//! Bank name and bank account extraction.

use super::FieldExtractor;
use super::patterns::{BANK_ACCOUNT, BANK_NAME};

/// Account-opening-bank field extractor.
pub struct BankNameExtractor;

impl BankNameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BankNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for BankNameExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = BANK_NAME.captures(text)?;
        // The run ends at the 账号 label when both share one line.
        let captured = &caps[1];
        let cut = captured.find("账号").map(|p| &captured[..p]).unwrap_or(captured);
        let cleaned = cut.trim_end_matches(['、', '，', ',', '.', '。', ':', '：']);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }
}

/// Bank-account field extractor.
pub struct BankAccountExtractor;

impl BankAccountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BankAccountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for BankAccountExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        BANK_ACCOUNT
            .captures(text)
            .map(|caps| caps[1].to_string())
    }
}

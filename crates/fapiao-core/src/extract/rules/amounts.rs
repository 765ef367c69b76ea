//! Tax-inclusive total extraction.
//!
//! The captured amount stays a decimal string. Parsing it into a float
//! here would risk losing precision; numeric interpretation happens
//! only in the query engine.

use super::FieldExtractor;
use super::patterns::{
    GRAND_TOTAL_WITH_CURRENCY, SUBTOTAL_WITH_CURRENCY, TOTAL_PLAIN, TOTAL_WITH_CURRENCY,
};

/// Total-amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        // Labeled total with currency glyph first, bare label next, then
        // the generic 合计/总金额 labels with glyph.
        for pattern in [
            &*TOTAL_WITH_CURRENCY,
            &*TOTAL_PLAIN,
            &*SUBTOTAL_WITH_CURRENCY,
            &*GRAND_TOTAL_WITH_CURRENCY,
        ] {
            if let Some(caps) = pattern.captures(text) {
                return Some(caps[1].replace(',', ""));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_currency_strips_commas() {
        let extractor = AmountExtractor::new();
        let result = extractor.extract("价税合计 ¥1,234.56");
        assert_eq!(result, Some("1234.56".to_string()));
    }

    #[test]
    fn test_extract_without_currency_glyph() {
        let extractor = AmountExtractor::new();
        let result = extractor.extract("价税合计(大写)壹仟元整 1000.00");
        assert_eq!(result, Some("1000.00".to_string()));
    }

    #[test]
    fn test_extract_generic_total() {
        let extractor = AmountExtractor::new();
        let result = extractor.extract("合计 ¥886.79");
        assert_eq!(result, Some("886.79".to_string()));
    }

    #[test]
    fn test_extract_grand_total() {
        let extractor = AmountExtractor::new();
        let result = extractor.extract("总金额 ¥12,000.00");
        assert_eq!(result, Some("12000.00".to_string()));
    }

    #[test]
    fn test_no_amount() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.extract("发票号码 12345678"), None);
    }
}

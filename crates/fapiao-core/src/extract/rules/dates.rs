//! Issue-date extraction and YYYYMMDD normalization.

use super::FieldExtractor;
use super::patterns::{DATE_CJK, DATE_COMPACT, ISSUE_DATE_CJK, ISSUE_DATE_COMPACT};

/// Issue-date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        // Fully-qualified CJK date, then a bare 8-digit run, then either
        // form anchored on the 开票日期 label.
        for pattern in [&*DATE_CJK, &*DATE_COMPACT, &*ISSUE_DATE_CJK, &*ISSUE_DATE_COMPACT] {
            if let Some(caps) = pattern.captures(text) {
                return Some(normalize_date(&caps[1]));
            }
        }
        None
    }
}

/// Normalize a captured date to canonical YYYYMMDD.
///
/// CJK marker glyphs are stripped; a 7-digit remainder means a
/// single-digit month or day lost its separator, so the three numeric
/// components are re-split from the original match and zero-padded.
pub fn normalize_date(raw: &str) -> String {
    if !raw.contains('年') {
        return raw.to_string();
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 8 {
        return digits;
    }

    let parts: Vec<&str> = raw
        .split(['年', '月', '日'])
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() == 3 {
        format!("{}{:0>2}{:0>2}", parts[0], parts[1], parts[2])
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cjk_date_with_padding() {
        assert_eq!(normalize_date("2024年3月5日"), "20240305");
        assert_eq!(normalize_date("2024年12月5日"), "20241205");
        assert_eq!(normalize_date("2024年3月15日"), "20240315");
    }

    #[test]
    fn test_normalize_full_width_date() {
        assert_eq!(normalize_date("2024年12月25日"), "20241225");
    }

    #[test]
    fn test_normalize_compact_passthrough() {
        assert_eq!(normalize_date("20240305"), "20240305");
    }

    #[test]
    fn test_extract_cjk_date_first() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("开票日期: 2024年3月5日");
        assert_eq!(result, Some("20240305".to_string()));
    }

    #[test]
    fn test_extract_compact_date() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("开票日期 20240305 其他");
        assert_eq!(result, Some("20240305".to_string()));
    }

    #[test]
    fn test_extract_no_date() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("没有日期信息"), None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = DateExtractor::new();
        let text = "开票日期: 2024年3月5日 金额 100";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}

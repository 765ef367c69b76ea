//! OCR line normalization.
//!
//! The OCR collaborator emits positioned line fragments; the extraction
//! cascades run over one flat search string, so fragments are joined
//! with single spaces in reading order. Table structure is already lost
//! at this point, which is why every extraction rule is label-anchored.

use crate::ocr::RecognizedLine;

/// Join recognized line fragments into one search string.
pub fn normalize_lines(lines: &[RecognizedLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

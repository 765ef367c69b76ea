//! External OCR collaborator contract.
//!
//! The recognition engine itself lives outside this crate (typically a
//! PaddleOCR serving endpoint). The core consumes it behind a trait so
//! tests can substitute a scripted fake, and so the process holds a
//! single shared handle rather than a hidden singleton.

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A recognized text fragment with its position on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedLine {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Axis-aligned bounding box (x1, y1, x2, y2) in page pixels.
    pub bbox: [f32; 4],
}

/// Contract the core requires from a recognition engine.
///
/// May return an empty sequence for a valid image; never errors just
/// because nothing was recognized.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedLine>, OcrError>;
}

/// Process-wide shared engine handle, constructed once and injected.
pub type SharedOcr = Arc<dyn OcrEngine + Send + Sync>;

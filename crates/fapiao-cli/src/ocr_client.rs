//! HTTP client for a PaddleOCR serving endpoint.
//!
//! The archive does not run OCR in-process; it posts the page image to
//! a PaddleOCR `ocr_system` service and maps the response onto
//! [`RecognizedLine`].

use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fapiao_core::{OcrEngine, OcrError, RecognizedLine};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct OcrRequest {
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OcrResponse {
    #[serde(default)]
    results: Vec<Vec<OcrResult>>,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct OcrResult {
    text: String,
    confidence: f32,
    /// Four corner points, clockwise from top-left.
    text_region: Vec<[f32; 2]>,
}

pub struct RemoteOcr {
    client: reqwest::blocking::Client,
    endpoint: String,
    min_confidence: f32,
}

impl RemoteOcr {
    pub fn new(endpoint: &str, min_confidence: f32) -> Result<Self, OcrError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OcrError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            min_confidence,
        })
    }

    /// Probe the service with an empty request so a dead endpoint
    /// fails fast instead of at the first upload.
    pub fn probe(&self) -> Result<(), OcrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&OcrRequest { images: vec![] })
            .send()
            .map_err(|e| OcrError::Unavailable(e.to_string()))?;
        debug!(status = %response.status(), "OCR endpoint probe");
        Ok(())
    }

    fn encode_image(image: &DynamicImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        Ok(BASE64.encode(&png))
    }
}

impl OcrEngine for RemoteOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedLine>, OcrError> {
        let request = OcrRequest {
            images: vec![Self::encode_image(image)?],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| OcrError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        let body: OcrResponse = response
            .json()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        if !body.status.is_empty() && body.status != "000" {
            return Err(OcrError::Recognition(format!(
                "OCR service returned status {}",
                body.status
            )));
        }

        let results = body.results.into_iter().next().unwrap_or_default();
        let mut lines = Vec::with_capacity(results.len());
        for result in results {
            if result.confidence < self.min_confidence {
                warn!(
                    text = %result.text,
                    confidence = result.confidence,
                    "Dropping low-confidence OCR line"
                );
                continue;
            }
            lines.push(RecognizedLine {
                text: result.text,
                confidence: result.confidence,
                bbox: bbox_from_region(&result.text_region),
            });
        }
        debug!(lines = lines.len(), "OCR service response mapped");
        Ok(lines)
    }
}

/// Convert a four-corner polygon into an axis-aligned [x0, y0, x1, y1]
/// box.
fn bbox_from_region(region: &[[f32; 2]]) -> [f32; 4] {
    let mut bbox = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    for &[x, y] in region {
        bbox[0] = bbox[0].min(x);
        bbox[1] = bbox[1].min(y);
        bbox[2] = bbox[2].max(x);
        bbox[3] = bbox[3].max(y);
    }
    if region.is_empty() {
        return [0.0; 4];
    }
    bbox
}

//! First-page image extraction using lopdf.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::PdfError;

/// Turns uploaded PDF bytes into an image suitable for OCR.
pub trait PageRasterizer {
    fn rasterize_first_page(&self, data: &[u8]) -> Result<DynamicImage, PdfError>;
}

/// Rasterizer for scanned invoices: finds the embedded page image
/// rather than rendering the page.
#[derive(Debug, Default)]
pub struct ScanRasterizer;

impl ScanRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, data: &[u8]) -> Result<Document, PdfError> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Some issuers protect invoices with an empty owner password.
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(doc)
    }

    fn first_page_images(&self, doc: &Document) -> Vec<DynamicImage> {
        let pages = doc.get_pages();
        let Some(page_id) = pages.get(&1) else {
            return Vec::new();
        };

        let mut images = Vec::new();
        if let Some(resources) = page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = image_from_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        // Malformed scans sometimes detach the image from the page
        // resources; fall back to scanning every object.
        if images.is_empty() {
            debug!("No XObject images on first page, scanning all objects");
            for (_id, object) in doc.objects.iter() {
                if let Some(img) = image_from_object(doc, object) {
                    images.push(img);
                }
            }
        }

        images
    }
}

impl PageRasterizer for ScanRasterizer {
    fn rasterize_first_page(&self, data: &[u8]) -> Result<DynamicImage, PdfError> {
        let doc = self.load(data)?;
        let images = self.first_page_images(&doc);
        debug!(count = images.len(), "Extracted candidate page images");

        // The invoice scan is the largest image; smaller ones are
        // seals or logos.
        images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or(PdfError::NoPageImage)
    }
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<lopdf::Dictionary> {
    let mut node_id = page_id;
    loop {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }
        // Resources may be inherited from the page tree.
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }
}

fn image_from_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) if !arr.is_empty() => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG data, keep the compressed stream as-is.
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter");
                return None;
            }
            _ => {}
        }
    }

    let data = match stream.decompressed_content() {
        Ok(d) => d,
        Err(_) => stream.content.clone(),
    };

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8) as u8;

    image_from_raw(&data, width, height, color_space, bits)
}

fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let expected_rgb = (width * height * 3) as usize;
    let expected_gray = (width * height) as usize;

    if (color_space == b"DeviceRGB" || color_space == b"RGB") && data.len() >= expected_rgb {
        let mut rgba_data = Vec::with_capacity((width * height * 4) as usize);
        for chunk in data[..expected_rgb].chunks(3) {
            if chunk.len() == 3 {
                rgba_data.push(chunk[0]);
                rgba_data.push(chunk[1]);
                rgba_data.push(chunk[2]);
                rgba_data.push(255);
            }
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba_data)
            .map(DynamicImage::ImageRgba8);
    }

    if (color_space == b"DeviceGray" || color_space == b"G") && data.len() >= expected_gray {
        let mut rgba_data = Vec::with_capacity((width * height * 4) as usize);
        for &gray in data[..expected_gray].iter() {
            rgba_data.push(gray);
            rgba_data.push(gray);
            rgba_data.push(gray);
            rgba_data.push(255);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba_data)
            .map(DynamicImage::ImageRgba8);
    }

    trace!(
        "Could not decode image: data_len={}, expected_rgb={}, expected_gray={}",
        data.len(),
        expected_rgb,
        expected_gray
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_rejects_non_pdf_bytes() {
        let rasterizer = ScanRasterizer::new();
        let err = rasterizer.rasterize_first_page(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_raw_rgb_decode() {
        // 2x2 solid red, DeviceRGB.
        let data = [255u8, 0, 0].repeat(4);
        let img = image_from_raw(&data, 2, 2, b"DeviceRGB", 8).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn test_raw_gray_decode() {
        let data = [128u8; 9];
        let img = image_from_raw(&data, 3, 3, b"DeviceGray", 8).unwrap();
        assert_eq!((img.width(), img.height()), (3, 3));
    }

    #[test]
    fn test_raw_decode_rejects_short_buffer() {
        assert!(image_from_raw(&[0u8; 3], 2, 2, b"DeviceRGB", 8).is_none());
    }

    #[test]
    fn test_raw_decode_rejects_unusual_bit_depth() {
        assert!(image_from_raw(&[0u8; 64], 2, 2, b"DeviceRGB", 1).is_none());
    }
}

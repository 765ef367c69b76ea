//! PDF handling for scanned invoices.
//!
//! Uploaded invoices are single-page scans whose page content is one
//! embedded raster image. The rasterizer pulls that image out for OCR;
//! it does not render vector content.

mod raster;

pub use raster::{PageRasterizer, ScanRasterizer};

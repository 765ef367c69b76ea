//! Invoice field extraction.
//!
//! Stateless, label-anchored pattern cascades over normalized OCR text.
//! Safe to call from any number of concurrent callers.

mod normalize;
mod parser;
pub mod rules;

pub use normalize::normalize_lines;
pub use parser::extract_fields;
pub use rules::FieldExtractor;

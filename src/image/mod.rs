//! Raster output: one PNG per printed sheet.

mod paint;

pub use paint::{PngRenderer, page_file_name, write_pages};

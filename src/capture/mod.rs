//! Still capture: rasterize the live frame, burn in the watermark, encode.

pub mod encoder;
pub mod pipeline;
pub mod watermark;

pub use pipeline::capture;
pub use watermark::{band_height, watermark_lines};

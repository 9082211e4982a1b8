//! Frame normalization: high-pass filtering, reflection suppression,
//! circular region-of-interest masking and automatic contrast.

pub mod box_blur;
pub mod config;
pub mod contrast;
pub mod morphology;
mod preprocessor;
pub mod roi;

pub use config::{PreprocessConfig, RoiConfig};
pub use preprocessor::Preprocessor;

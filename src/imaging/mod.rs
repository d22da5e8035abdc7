//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | fit-inside calculation + Lanczos3 |
//! | **Crop** | fill-resize + anchored `crop_imm` |
//! | **Sharpen** | `unsharpen` |
//! | **Encode** | AVIF (rav1e), WebP (lossless), PNG, JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and anchor math (unit testable)
//! - **Parameters**: Data structures describing a thumbnail operation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining naming + calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_crop_origin, calculate_fill_dimensions, calculate_fit_dimensions};
pub use operations::{ThumbnailConfig, get_dimensions, plan_thumbnail};
pub use params::{OutputFormat, Quality, Sharpening, ThumbnailParams};
pub use rust_backend::RustBackend;

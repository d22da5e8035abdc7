//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | [`calculate_fit_dimensions`] + `resize_exact` with `Lanczos3` |
//! | Crop | [`calculate_fill_dimensions`] + [`calculate_crop_origin`] + `crop_imm` |
//! | Sharpening | `DynamicImage::unsharpen` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → PNG / JPEG | `image::codecs::{png, jpeg}` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    calculate_crop_origin, calculate_fill_dimensions, calculate_fit_dimensions,
};
use super::params::{OutputFormat, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
///
/// AVIF is output-only: the `image` crate's `"avif"` feature enables the
/// rav1e encoder but no decoder.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Apply the transformation of `params` to a decoded image.
///
/// Resize fits the image inside the box; crop fills the box and keeps the
/// window selected by the anchors.
fn render(img: &DynamicImage, params: &ThumbnailParams) -> DynamicImage {
    let source = (img.width(), img.height());
    let target = (params.width, params.height);
    let transform = &params.transform;

    let rendered = if transform.is_crop() {
        let (fill_w, fill_h) = calculate_fill_dimensions(source, target);
        let filled = if (fill_w, fill_h) == source {
            img.clone()
        } else {
            img.resize_exact(fill_w, fill_h, FilterType::Lanczos3)
        };
        let (x, y) = calculate_crop_origin(
            (fill_w, fill_h),
            target,
            transform.horizontal_anchor(),
            transform.vertical_anchor(),
        );
        filled.crop_imm(x, y, params.width, params.height)
    } else {
        let (w, h) = calculate_fit_dimensions(source, target);
        if (w, h) == source {
            img.clone()
        } else {
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
    };

    match params.sharpening {
        Some(sharpening) => rendered.unsharpen(sharpening.sigma, sharpening.threshold),
        None => rendered,
    }
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = OutputFormat::from_extension(ext).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", ext))
    })?;

    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = BufWriter::new(file);
    let encoded = match format {
        // speed=6 for reasonable throughput
        OutputFormat::Avif => img.write_with_encoder(
            image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality as u8),
        ),
        OutputFormat::Webp => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(writer)),
        OutputFormat::Png => {
            img.write_with_encoder(image::codecs::png::PngEncoder::new(writer))
        }
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(
            image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8),
        ),
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", format, e))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let rendered = render(&img, params);
        save_image(&rendered, &params.output, params.quality.value())?;
        Ok(Dimensions {
            width: rendered.width(),
            height: rendered.height(),
        })
    }
}

//! High-level image operations.
//!
//! These functions combine naming with backend execution. They take a
//! rendition config and compute the parameters a backend consumes.

use super::backend::{BackendError, ImageBackend};
use super::params::{OutputFormat, Quality, Sharpening, ThumbnailParams};
use crate::naming::ThumbnailName;
use crate::transform::TransformDescriptor;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for one thumbnail rendition.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub transform: TransformDescriptor,
    pub format: OutputFormat,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 500,
            transform: TransformDescriptor::crop(),
            format: OutputFormat::default(),
            quality: Quality::default(),
            sharpening: Some(Sharpening::light()),
        }
    }
}

impl ThumbnailConfig {
    /// File name of this rendition for a source stem.
    pub fn file_name(&self, stem: &str) -> String {
        ThumbnailName::new(
            stem,
            (self.width, self.height),
            self.transform,
            self.format.extension(),
        )
        .file_name()
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_thumbnail(
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_dir.join(config.file_name(filename_stem)),
        width: config.width,
        height: config.height,
        transform: config.transform,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::Dimensions;
    use crate::transform::{HorizontalAnchor, VerticalAnchor};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_thumbnail_names_output_with_token() {
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/out"),
            "001-dawn",
            &ThumbnailConfig::default(),
        );

        assert_eq!(params.width, 400);
        assert_eq!(params.height, 500);
        assert_eq!(
            params.output,
            Path::new("/out/001-dawn-400x500-crop.webp")
        );
    }

    #[test]
    fn plan_thumbnail_resize_has_no_token() {
        let config = ThumbnailConfig {
            width: 1200,
            height: 1200,
            transform: TransformDescriptor::resize(),
            format: OutputFormat::Avif,
            ..ThumbnailConfig::default()
        };
        let params = plan_thumbnail(Path::new("/source.jpg"), Path::new("/out"), "dawn", &config);

        assert_eq!(params.output, Path::new("/out/dawn-1200x1200.avif"));
        assert!(params.transform.is_resize());
    }

    #[test]
    fn plan_thumbnail_carries_anchors() {
        let config = ThumbnailConfig {
            transform: TransformDescriptor::crop()
                .with_horizontal_anchor(HorizontalAnchor::Left)
                .unwrap()
                .with_vertical_anchor(VerticalAnchor::Top)
                .unwrap(),
            sharpening: None,
            ..ThumbnailConfig::default()
        };
        let params = plan_thumbnail(Path::new("/source.jpg"), Path::new("/out"), "001-test", &config);

        assert_eq!(
            params.output,
            Path::new("/out/001-test-400x500-crop-left-top.webp")
        );
        assert_eq!(params.transform.horizontal_anchor(), HorizontalAnchor::Left);
        assert!(params.sharpening.is_none());
    }
}

//! Batch thumbnail generation.
//!
//! Walks a source directory and renders every configured preset for every
//! image it finds.
//!
//! ## Output Structure
//!
//! The source tree is mirrored under the output directory; each preset adds
//! one file named by [`naming`](crate::naming):
//!
//! ```text
//! thumbnails/
//! ├── .thumbsmith-cache.json
//! ├── dawn-400x500-crop.webp          # grid: crop, center / middle
//! ├── dawn-200x200-crop-top.webp      # square: crop, center / top
//! ├── dawn-1200x1200.webp             # preview: resize
//! └── travel/
//!     └── rome-400x500-crop.webp
//! ```
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon). The
//! cache manifest is only read during the parallel phase; new entries are
//! recorded afterwards in source order.

use crate::cache::{self, CacheEntry, CacheManifest, CacheOutcome, CacheStats};
use crate::config::{Config, ConfigError};
use crate::imaging::rust_backend::supported_input_extensions;
use crate::imaging::{
    BackendError, ImageBackend, RustBackend, ThumbnailConfig, get_dimensions, plan_thumbnail,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("{first} and {second} would write the same thumbnails (same directory and stem)")]
    StemCollision { first: String, second: String },
}

/// Written as `manifest.json` in the output directory by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessManifest {
    pub images: Vec<ProcessedImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedImage {
    /// Path relative to the source directory, `/`-separated.
    pub source: String,
    /// Original dimensions (width, height).
    pub dimensions: (u32, u32),
    pub thumbnails: Vec<GeneratedThumbnail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedThumbnail {
    pub preset: String,
    /// Path relative to the output directory, `/`-separated.
    pub path: String,
    /// Transformation token embedded in the file name.
    pub token: String,
    pub width: u32,
    pub height: u32,
}

/// Progress notification, sent once per finished image.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    ImageProcessed {
        /// 1-based position in source order.
        index: usize,
        total: usize,
        source: String,
        dimensions: (u32, u32),
        thumbnails: Vec<(GeneratedThumbnail, CacheOutcome)>,
    },
}

#[derive(Debug)]
pub struct ProcessResult {
    pub manifest: ProcessManifest,
    pub cache_stats: CacheStats,
}

/// Process a source directory with the production backend.
pub fn process(
    source_dir: &Path,
    output_dir: &Path,
    config: &Config,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, source_dir, output_dir, config, use_cache, events)
}

/// Process using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    source_dir: &Path,
    output_dir: &Path,
    config: &Config,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    if !source_dir.is_dir() {
        return Err(ProcessError::SourceNotFound(source_dir.to_path_buf()));
    }
    let images = discover_images(source_dir, output_dir)?;
    process_images(
        backend, source_dir, &images, output_dir, config, use_cache, events,
    )
}

/// Find every decodable image below `source_dir`, relative and sorted.
///
/// Hidden entries and anything inside `output_dir` are skipped. Both
/// directories are resolved first, so `.`-relative or `..` spellings of the
/// same output directory are still recognised.
pub fn discover_images(source_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    let extensions = supported_input_extensions();
    let source_root = source_dir.canonicalize()?;
    let output_root = resolve_dir(output_dir)?;
    let mut images = Vec::new();

    let walker = WalkDir::new(&source_root).into_iter().filter_entry(|e| {
        let hidden = e.depth() > 0
            && e.file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'));
        !hidden && e.path() != output_root.as_path()
    });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let supported = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()));
        if !supported {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(&source_root) {
            images.push(relative.to_path_buf());
        }
    }

    images.sort();
    Ok(images)
}

/// Canonical form of a directory that may not exist yet.
fn resolve_dir(dir: &Path) -> std::io::Result<PathBuf> {
    match dir.canonicalize() {
        Ok(path) => Ok(path),
        Err(_) => std::path::absolute(dir),
    }
}

/// Outputs are named by directory and stem, so `dawn.jpg` and `dawn.png`
/// side by side would overwrite each other's thumbnails.
fn check_stem_collisions(images: &[PathBuf]) -> Result<(), ProcessError> {
    let mut seen: HashMap<(PathBuf, OsString), &Path> = HashMap::new();
    for image in images {
        let key = (
            image.parent().map(Path::to_path_buf).unwrap_or_default(),
            image.file_stem().map(OsString::from).unwrap_or_default(),
        );
        if let Some(first) = seen.insert(key, image.as_path()) {
            return Err(ProcessError::StemCollision {
                first: slash_path(first),
                second: slash_path(image),
            });
        }
    }
    Ok(())
}

/// Render every preset for the given images (paths relative to `source_root`).
pub fn process_images(
    backend: &impl ImageBackend,
    source_root: &Path,
    images: &[PathBuf],
    output_dir: &Path,
    config: &Config,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let presets = config.thumbnail_configs()?;
    check_stem_collisions(images)?;
    std::fs::create_dir_all(output_dir)?;

    let mut cache_manifest = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };

    if images.is_empty() {
        tracing::warn!(source = %source_root.display(), "no images found");
    }
    tracing::info!(
        images = images.len(),
        presets = presets.len(),
        output = %output_dir.display(),
        "processing thumbnails"
    );

    let total = images.len();
    let results: Vec<(ProcessedImage, Vec<Rendition>)> = images
        .par_iter()
        .enumerate()
        .map(|(i, relative)| -> Result<_, ProcessError> {
            let (image, renditions) = process_image(
                backend,
                source_root,
                relative,
                output_dir,
                &presets,
                &cache_manifest,
            )?;
            if let Some(tx) = &events {
                tx.send(ProcessEvent::ImageProcessed {
                    index: i + 1,
                    total,
                    source: image.source.clone(),
                    dimensions: image.dimensions,
                    thumbnails: image
                        .thumbnails
                        .iter()
                        .cloned()
                        .zip(renditions.iter().map(|r| r.outcome))
                        .collect(),
                })
                .ok();
            }
            Ok((image, renditions))
        })
        .collect::<Result<_, ProcessError>>()?;

    let mut cache_stats = CacheStats::default();
    let mut manifest = ProcessManifest::default();
    let mut produced = HashSet::new();
    for (image, renditions) in results {
        for rendition in renditions {
            cache_stats.record(rendition.outcome);
            produced.insert(rendition.path.clone());
            cache_manifest.insert(rendition.path, rendition.entry);
        }
        manifest.images.push(image);
    }
    cache_manifest.retain_outputs(&produced);

    cache_manifest.save(output_dir)?;
    tracing::info!(%cache_stats, "processing finished");

    Ok(ProcessResult {
        manifest,
        cache_stats,
    })
}

/// Cache bookkeeping for one written thumbnail.
struct Rendition {
    path: String,
    entry: CacheEntry,
    outcome: CacheOutcome,
}

fn process_image(
    backend: &impl ImageBackend,
    source_root: &Path,
    relative: &Path,
    output_dir: &Path,
    presets: &[(String, ThumbnailConfig)],
    cache_manifest: &CacheManifest,
) -> Result<(ProcessedImage, Vec<Rendition>), ProcessError> {
    let source_path = source_root.join(relative);
    if !source_path.exists() {
        return Err(ProcessError::SourceNotFound(source_path));
    }

    let dimensions = get_dimensions(backend, &source_path)?;
    let source_hash = cache::hash_file(&source_path)?;

    let relative_dir = relative.parent().unwrap_or(Path::new(""));
    let image_output_dir = output_dir.join(relative_dir);
    std::fs::create_dir_all(&image_output_dir)?;

    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut thumbnails = Vec::with_capacity(presets.len());
    let mut renditions = Vec::with_capacity(presets.len());

    for (preset, thumb_config) in presets {
        let file_name = thumb_config.file_name(&stem);
        let output_key = slash_path(&relative_dir.join(&file_name));
        let params_hash = cache::hash_thumbnail_params(thumb_config);

        let (outcome, (width, height)) =
            match cache_manifest.find_cached(&source_hash, &params_hash, &output_key, output_dir) {
                Some((stored, dims)) if stored == output_key => (CacheOutcome::Cached, dims),
                Some((stored, dims)) => {
                    std::fs::copy(output_dir.join(&stored), output_dir.join(&output_key))?;
                    tracing::debug!(from = %stored, to = %output_key, "copied cached thumbnail");
                    (CacheOutcome::Copied, dims)
                }
                None => {
                    let params =
                        plan_thumbnail(&source_path, &image_output_dir, &stem, thumb_config);
                    let dims = backend.thumbnail(&params)?;
                    tracing::debug!(output = %output_key, preset = %preset, "encoded thumbnail");
                    (CacheOutcome::Encoded, (dims.width, dims.height))
                }
            };

        thumbnails.push(GeneratedThumbnail {
            preset: preset.clone(),
            path: output_key.clone(),
            token: thumb_config.transform.encode(),
            width,
            height,
        });
        renditions.push(Rendition {
            path: output_key,
            entry: CacheEntry {
                source_hash: source_hash.clone(),
                params_hash,
                width,
                height,
            },
            outcome,
        });
    }

    Ok((
        ProcessedImage {
            source: slash_path(relative),
            dimensions,
            thumbnails,
        },
        renditions,
    ))
}

/// Join path components with `/` regardless of platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! Method:     crop
//! Horizontal: left
//! Vertical:   top
//! Token:      -crop-left-top
//! ```
//!
//! ## Process
//!
//! ```text
//! 001/003 travel/rome.jpg (4032x3024)
//!     grid: travel/rome-400x500-crop.webp 400x500 encoded
//!     square: travel/rome-200x200-crop-top.webp 200x200 cached
//! ```
//!
//! ## Check
//!
//! ```text
//! Presets
//! 001 grid 400x500 crop (center, middle)
//!     File: {stem}-400x500-crop.webp
//! 002 preview 1200x1200 resize
//!     File: {stem}-1200x1200.webp
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::cache::{CacheOutcome, CacheStats};
use crate::imaging::ThumbnailConfig;
use crate::naming::ThumbnailName;
use crate::process::{ProcessEvent, ProcessManifest};
use crate::transform::TransformDescriptor;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// The token, or a marker for the all-default descriptor whose token is empty.
fn token_label(transform: &TransformDescriptor) -> String {
    if transform.is_default() {
        "(none)".to_string()
    } else {
        transform.encode()
    }
}

/// Short description of a transformation: method, plus anchors for crops.
fn transform_summary(transform: &TransformDescriptor) -> String {
    if transform.is_crop() {
        format!(
            "{} ({}, {})",
            transform.method(),
            transform.horizontal_anchor(),
            transform.vertical_anchor()
        )
    } else {
        transform.method().to_string()
    }
}

// ============================================================================
// Descriptor output
// ============================================================================

/// Field-by-field view of a descriptor, for `inspect` and `encode`.
pub fn format_descriptor(transform: &TransformDescriptor) -> Vec<String> {
    vec![
        format!("Method:     {}", transform.method()),
        format!("Horizontal: {}", transform.horizontal_anchor()),
        format!("Vertical:   {}", transform.vertical_anchor()),
        format!("Token:      {}", token_label(transform)),
    ]
}

pub fn print_descriptor(transform: &TransformDescriptor) {
    for line in format_descriptor(transform) {
        println!("{}", line);
    }
}

/// A decoded thumbnail file name: its parts, then the descriptor fields.
pub fn format_thumbnail_name(name: &ThumbnailName) -> Vec<String> {
    let mut lines = vec![
        format!("Stem:       {}", name.stem),
        format!("Size:       {}x{}", name.width, name.height),
        format!("Extension:  {}", name.extension),
    ];
    lines.extend(format_descriptor(&name.transform));
    lines
}

pub fn print_thumbnail_name(name: &ThumbnailName) {
    for line in format_thumbnail_name(name) {
        println!("{}", line);
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ImageProcessed {
            index,
            total,
            source,
            dimensions,
            thumbnails,
        } => {
            let mut lines = vec![format!(
                "{}/{} {} ({}x{})",
                format_index(*index),
                format_index(*total),
                source,
                dimensions.0,
                dimensions.1
            )];
            for (thumb, outcome) in thumbnails {
                let status = match outcome {
                    CacheOutcome::Cached => "cached",
                    CacheOutcome::Copied => "copied",
                    CacheOutcome::Encoded => "encoded",
                };
                lines.push(format!(
                    "{}{}: {} {}x{} {}",
                    indent(1),
                    thumb.preset,
                    thumb.path,
                    thumb.width,
                    thumb.height,
                    status
                ));
            }
            lines
        }
    }
}

/// Closing summary of a batch run.
pub fn format_process_summary(manifest: &ProcessManifest, stats: &CacheStats) -> Vec<String> {
    let images = manifest.images.len();
    let thumbnails: usize = manifest.images.iter().map(|i| i.thumbnails.len()).sum();
    vec![
        format!(
            "Processed {} {}, {} {}",
            images,
            if images == 1 { "image" } else { "images" },
            thumbnails,
            if thumbnails == 1 { "thumbnail" } else { "thumbnails" }
        ),
        format!("Cache: {}", stats),
    ]
}

pub fn print_process_summary(manifest: &ProcessManifest, stats: &CacheStats) {
    for line in format_process_summary(manifest, stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// List resolved presets with the file name pattern each one produces.
pub fn format_presets(presets: &[(String, ThumbnailConfig)]) -> Vec<String> {
    let mut lines = vec!["Presets".to_string()];
    for (i, (name, config)) in presets.iter().enumerate() {
        lines.push(format!(
            "{} {} {}x{} {}",
            format_index(i + 1),
            name,
            config.width,
            config.height,
            transform_summary(&config.transform)
        ));
        lines.push(format!("{}File: {}", indent(1), config.file_name("{stem}")));
    }
    lines
}

pub fn print_presets(presets: &[(String, ThumbnailConfig)]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}

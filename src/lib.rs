//! # Thumbsmith
//!
//! Thumbnail generation driven by a compact transformation descriptor.
//!
//! A thumbnail is produced by one of two methods. **Resize** scales the source
//! to fit inside a box. **Crop** fills the box and cuts the overflow at a
//! horizontal and vertical anchor. The descriptor capturing that choice has a
//! textual encoding (the *token*) that lists only its non-default parts:
//!
//! ```text
//! ""                    resize, center, middle
//! "-crop"               crop,   center, middle
//! "-crop-left-top"      crop,   left,   top
//! ```
//!
//! Tokens are embedded in generated file names, so a thumbnail's file name
//! alone says how it was made:
//!
//! ```text
//! dawn.jpg  →  dawn-400x500-crop-top.webp
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | The descriptor: factories, fluent anchor setters, token parse/encode |
//! | [`naming`] | `{stem}-{W}x{H}{token}.{ext}` file names, both directions |
//! | [`imaging`] | Pure-Rust resize/crop/encode behind the [`imaging::ImageBackend`] trait |
//! | [`config`] | `thumbsmith.toml` presets merged over stock defaults and validated |
//! | [`cache`] | Content-addressed cache so unchanged renditions are skipped |
//! | [`process`] | Parallel batch run over a source directory |
//! | [`output`] | CLI output formatting |
//!
//! # Lenient Parsing
//!
//! [`transform::TransformDescriptor::parse`] never fails. Each field is found
//! by substring search in a fixed order, and fields that are not found keep
//! their defaults. Anything that *builds* a descriptor from user words (the
//! fluent setters, config presets) is strict and reports
//! [`transform::TransformError`].

pub mod cache;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod transform;

//! Thumbnail file-name convention.
//!
//! Every generated thumbnail is named after its source image, the box it was
//! rendered into, and the transformation token:
//!
//! ```text
//! {stem}-{width}x{height}{token}.{ext}
//!
//! dawn-400x500.webp                 resize into 400x500
//! dawn-400x500-crop.webp            crop, center / middle
//! dawn-400x500-crop-left-top.webp   crop, left / top
//! ```
//!
//! The size segment separates the stem from the token, so a stem such as
//! `cropped-photo` never leaks into the parsed transformation.

use crate::transform::TransformDescriptor;

/// The parts of a thumbnail file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailName {
    /// Source file stem, dashes preserved.
    pub stem: String,
    pub width: u32,
    pub height: u32,
    pub transform: TransformDescriptor,
    /// Extension without the dot.
    pub extension: String,
}

impl ThumbnailName {
    pub fn new(
        stem: impl Into<String>,
        (width, height): (u32, u32),
        transform: TransformDescriptor,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            stem: stem.into(),
            width,
            height,
            transform,
            extension: extension.into(),
        }
    }

    /// Render as `{stem}-{width}x{height}{token}.{ext}`.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}",
            append_token(
                &format!("{}-{}x{}", self.stem, self.width, self.height),
                &self.transform
            ),
            self.extension
        )
    }
}

/// Append a descriptor's token to a base name (`"a"` + crop → `"a-crop"`).
pub fn append_token(base: &str, transform: &TransformDescriptor) -> String {
    format!("{base}{transform}")
}

/// Parse a thumbnail file name produced by [`ThumbnailName::file_name`].
///
/// The **last** dash-separated `{W}x{H}` segment is taken as the size; what
/// precedes it is the stem and what follows it is the token. Returns `None`
/// when there is no extension or no size segment.
///
/// - `"dawn-400x500-crop-left-top.webp"` → stem `dawn`, 400x500, crop left/top
/// - `"my-cropped-photo-200x200.png"` → stem `my-cropped-photo`, 200x200, resize
/// - `"dawn.webp"` → `None`
pub fn parse_thumbnail_name(file_name: &str) -> Option<ThumbnailName> {
    let (base, extension) = file_name.rsplit_once('.')?;
    let segments: Vec<&str> = base.split('-').collect();
    let size_pos = (1..segments.len())
        .rev()
        .find(|&i| parse_size(segments[i]).is_some())?;
    let (width, height) = parse_size(segments[size_pos])?;

    let token: String = segments[size_pos + 1..]
        .iter()
        .map(|s| format!("-{s}"))
        .collect();

    Some(ThumbnailName {
        stem: segments[..size_pos].join("-"),
        width,
        height,
        transform: TransformDescriptor::parse(&token),
        extension: extension.to_string(),
    })
}

/// `"400x500"` → `(400, 500)`. Both sides must be plain non-zero integers.
fn parse_size(segment: &str) -> Option<(u32, u32)> {
    let (w, h) = segment.split_once('x')?;
    let dim = |s: &str| -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().filter(|&n| n > 0)
    };
    Some((dim(w)?, dim(h)?))
}

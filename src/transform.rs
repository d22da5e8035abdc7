//! Thumbnail transformation descriptors and their file-name token.
//!
//! A [`TransformDescriptor`] says how a source image becomes a thumbnail:
//! either **resize** it to fit the requested box, or **crop** it to fill the box
//! exactly, keeping the part of the image selected by a horizontal and a
//! vertical anchor.
//!
//! ## Token Format
//!
//! Descriptors persist only as a short suffix embedded in thumbnail file names:
//!
//! ```text
//! [-{method}][-{horizontal}][-{vertical}]
//!
//! ""                 resize (all defaults)
//! "-crop"            crop, center / middle
//! "-crop-left-top"   crop, left / top
//! "-crop-bottom"     crop, center / bottom
//! ```
//!
//! A segment is written only when its field differs from the default
//! (`resize`, `center`, `middle`), always in the order above.
//!
//! ## Parsing
//!
//! [`TransformDescriptor::parse`] never fails. For each of the three
//! vocabularies it picks the first word, in [`Vocabulary::scan_order`], that
//! appears *anywhere* in the input as a plain substring. Unknown input yields
//! the defaults. Matching is not segment-aware, so `"my-cropped-photo"` parses
//! as a crop; callers that only want to read the token should cut it out of
//! the file name first (see [`naming::parse_thumbnail_name`](crate::naming::parse_thumbnail_name)).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A crop-only field was set on a descriptor whose method is not crop.
    #[error("the {field} only applies to crop transforms, but the method is \"{method}\"")]
    InvalidState {
        field: &'static str,
        method: TransformMethod,
    },
    /// A word outside the field's fixed vocabulary.
    #[error("\"{value}\" is not a valid {field} (expected one of: {expected})")]
    InvalidArgument {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// A closed set of words that can appear in a token.
///
/// The scan order is part of the token contract: when an input happens to
/// contain several words of the same vocabulary, the earliest one in
/// [`scan_order`](Self::scan_order) wins.
pub trait Vocabulary: Copy + PartialEq + 'static {
    /// Field name used in error messages.
    const FIELD: &'static str;
    /// Accepted words, comma-separated, for error messages.
    const EXPECTED: &'static str;

    fn scan_order() -> &'static [Self];

    fn as_str(self) -> &'static str;

    /// Strict lookup of an exact vocabulary word.
    fn from_word(word: &str) -> Result<Self, TransformError> {
        Self::scan_order()
            .iter()
            .copied()
            .find(|v| v.as_str() == word)
            .ok_or_else(|| TransformError::InvalidArgument {
                field: Self::FIELD,
                value: word.to_string(),
                expected: Self::EXPECTED,
            })
    }

    /// First word (in scan order) contained anywhere in `input`, or `default`.
    fn scan(input: &str, default: Self) -> Self {
        Self::scan_order()
            .iter()
            .copied()
            .find(|v| input.contains(v.as_str()))
            .unwrap_or(default)
    }
}

/// How the source image is fitted to the thumbnail box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMethod {
    /// Scale down to fit inside the box, keeping the aspect ratio.
    Resize,
    /// Scale to cover the box, then cut away the overflow.
    Crop,
}

impl TransformMethod {
    pub const SCAN_ORDER: [Self; 2] = [Self::Crop, Self::Resize];
}

impl Vocabulary for TransformMethod {
    const FIELD: &'static str = "method";
    const EXPECTED: &'static str = "crop, resize";

    fn scan_order() -> &'static [Self] {
        &Self::SCAN_ORDER
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
        }
    }
}

/// Which columns survive a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

impl HorizontalAnchor {
    pub const SCAN_ORDER: [Self; 3] = [Self::Left, Self::Center, Self::Right];
}

impl Vocabulary for HorizontalAnchor {
    const FIELD: &'static str = "horizontal anchor";
    const EXPECTED: &'static str = "left, center, right";

    fn scan_order() -> &'static [Self] {
        &Self::SCAN_ORDER
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Which rows survive a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

impl VerticalAnchor {
    pub const SCAN_ORDER: [Self; 3] = [Self::Top, Self::Middle, Self::Bottom];
}

impl Vocabulary for VerticalAnchor {
    const FIELD: &'static str = "vertical anchor";
    const EXPECTED: &'static str = "top, middle, bottom";

    fn scan_order() -> &'static [Self] {
        &Self::SCAN_ORDER
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

macro_rules! vocabulary_text_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TransformError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_word(s)
            }
        }
    )*};
}

vocabulary_text_impls!(TransformMethod, HorizontalAnchor, VerticalAnchor);

pub const DEFAULT_METHOD: TransformMethod = TransformMethod::Resize;
pub const DEFAULT_HORIZONTAL_ANCHOR: HorizontalAnchor = HorizontalAnchor::Center;
pub const DEFAULT_VERTICAL_ANCHOR: VerticalAnchor = VerticalAnchor::Middle;

/// Method plus crop anchors for one thumbnail.
///
/// Built with [`resize`](Self::resize) / [`crop`](Self::crop) and refined with
/// the `with_*` methods, or decoded from a token with [`parse`](Self::parse).
/// Serializes (serde) as its token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformDescriptor {
    method: TransformMethod,
    horizontal_anchor: HorizontalAnchor,
    vertical_anchor: VerticalAnchor,
}

impl TransformDescriptor {
    const fn with_method(method: TransformMethod) -> Self {
        Self {
            method,
            horizontal_anchor: DEFAULT_HORIZONTAL_ANCHOR,
            vertical_anchor: DEFAULT_VERTICAL_ANCHOR,
        }
    }

    /// Resize with default anchors; encodes to the empty token.
    pub const fn create_default() -> Self {
        Self::with_method(DEFAULT_METHOD)
    }

    pub const fn resize() -> Self {
        Self::with_method(TransformMethod::Resize)
    }

    /// Crop anchored at center / middle.
    pub const fn crop() -> Self {
        Self::with_method(TransformMethod::Crop)
    }

    /// Decode a token (or any text containing one). Never fails.
    pub fn parse(token: &str) -> Self {
        Self {
            method: TransformMethod::scan(token, DEFAULT_METHOD),
            horizontal_anchor: HorizontalAnchor::scan(token, DEFAULT_HORIZONTAL_ANCHOR),
            vertical_anchor: VerticalAnchor::scan(token, DEFAULT_VERTICAL_ANCHOR),
        }
    }

    /// Minimal token reconstructing this descriptor; `""` when all fields are default.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn with_horizontal_anchor(self, anchor: HorizontalAnchor) -> Result<Self, TransformError> {
        self.require_crop(HorizontalAnchor::FIELD)?;
        Ok(Self {
            horizontal_anchor: anchor,
            ..self
        })
    }

    pub fn with_vertical_anchor(self, anchor: VerticalAnchor) -> Result<Self, TransformError> {
        self.require_crop(VerticalAnchor::FIELD)?;
        Ok(Self {
            vertical_anchor: anchor,
            ..self
        })
    }

    /// Like [`with_horizontal_anchor`](Self::with_horizontal_anchor), taking the
    /// vocabulary word. The method is checked before the word.
    pub fn with_horizontal_anchor_named(self, anchor: &str) -> Result<Self, TransformError> {
        self.require_crop(HorizontalAnchor::FIELD)?;
        self.with_horizontal_anchor(anchor.parse()?)
    }

    /// Like [`with_vertical_anchor`](Self::with_vertical_anchor), taking the
    /// vocabulary word. The method is checked before the word.
    pub fn with_vertical_anchor_named(self, anchor: &str) -> Result<Self, TransformError> {
        self.require_crop(VerticalAnchor::FIELD)?;
        self.with_vertical_anchor(anchor.parse()?)
    }

    fn require_crop(&self, field: &'static str) -> Result<(), TransformError> {
        if self.is_crop() {
            Ok(())
        } else {
            Err(TransformError::InvalidState {
                field,
                method: self.method,
            })
        }
    }

    pub fn method(&self) -> TransformMethod {
        self.method
    }

    pub fn horizontal_anchor(&self) -> HorizontalAnchor {
        self.horizontal_anchor
    }

    pub fn vertical_anchor(&self) -> VerticalAnchor {
        self.vertical_anchor
    }

    pub fn is_crop(&self) -> bool {
        self.method == TransformMethod::Crop
    }

    pub fn is_resize(&self) -> bool {
        self.method == TransformMethod::Resize
    }

    /// True when the token is empty.
    pub fn is_default(&self) -> bool {
        *self == Self::create_default()
    }
}

impl Default for TransformDescriptor {
    fn default() -> Self {
        Self::create_default()
    }
}

/// Writes the token.
impl fmt::Display for TransformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.method != DEFAULT_METHOD {
            write!(f, "-{}", self.method)?;
        }
        if self.horizontal_anchor != DEFAULT_HORIZONTAL_ANCHOR {
            write!(f, "-{}", self.horizontal_anchor)?;
        }
        if self.vertical_anchor != DEFAULT_VERTICAL_ANCHOR {
            write!(f, "-{}", self.vertical_anchor)?;
        }
        Ok(())
    }
}

impl FromStr for TransformDescriptor {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for TransformDescriptor {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl Serialize for TransformDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransformDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::parse(&token))
    }
}

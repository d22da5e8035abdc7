//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::transform::{HorizontalAnchor, VerticalAnchor};

/// Calculate the size of a resize thumbnail.
///
/// Returns the largest dimensions that fit inside `bounds` while keeping the
/// source aspect ratio. Sources already inside the bounds keep their size;
/// neither side is ever rounded down to zero.
///
/// # Examples
/// ```
/// # use thumbsmith::imaging::calculate_fit_dimensions;
/// // 4:3 landscape into a 400x400 box → 400x300
/// assert_eq!(calculate_fit_dimensions((800, 600), (400, 400)), (400, 300));
///
/// // Smaller than the box: untouched
/// assert_eq!(calculate_fit_dimensions((300, 200), (400, 400)), (300, 200));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    let scale = (max_w as f64 / src_w as f64)
        .min(max_h as f64 / src_h as f64)
        .min(1.0);

    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Top-left corner of the crop window inside a filled image.
///
/// Left/Top keep the start of the axis, Right/Bottom keep the end, and
/// Center/Middle split the overflow (odd remainders go to the far side).
pub fn calculate_crop_origin(
    filled: (u32, u32),
    target: (u32, u32),
    horizontal: HorizontalAnchor,
    vertical: VerticalAnchor,
) -> (u32, u32) {
    let overflow_x = filled.0.saturating_sub(target.0);
    let overflow_y = filled.1.saturating_sub(target.1);

    let x = match horizontal {
        HorizontalAnchor::Left => 0,
        HorizontalAnchor::Center => overflow_x / 2,
        HorizontalAnchor::Right => overflow_x,
    };
    let y = match vertical {
        VerticalAnchor::Top => 0,
        VerticalAnchor::Middle => overflow_y / 2,
        VerticalAnchor::Bottom => overflow_y,
    };
    (x, y)
}

//! Pointer hit-testing against a box collection.

use crate::model::BoxCollection;

/// Find the box under a pointer position.
///
/// `point` is in canvas pixel space (already translated to the canvas
/// origin); box rectangles are compared after scaling by `im_scale`. When
/// several boxes contain the point, the box whose unscaled top-left corner
/// is nearest to the pointer wins; equal distances resolve to the earliest
/// box in collection order. Empty slots never match.
///
/// Returns the index of the winning slot.
pub fn hit_test(boxes: &BoxCollection, point: (f32, f32), im_scale: f32) -> Option<usize> {
    let (px, py) = point;
    let mut best: Option<(usize, f32)> = None;

    for (i, slot) in boxes.iter().enumerate() {
        let Some(b) = slot else { continue };
        if !b.rect.scaled(im_scale).contains(px, py) {
            continue;
        }
        let dist = b.rect.corner_distance(px, py);
        // Strict comparison keeps the first box on ties.
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }

    best.map(|(i, _)| i)
}

//! Hover/active selection transitions.
//!
//! The selection state machine owns two slots: `hover` follows the pointer,
//! `active` is confirmed by click. Both hold copies of boxes from the
//! collection and are compared structurally, so a stale value that no
//! longer matches any box simply stops matching until the next pointer
//! interaction replaces it.

use crate::hit::hit_test;
use crate::model::{BoxAnnotation, BoxCollection};

/// Result of a pointer-move transition: the new hover value.
///
/// The caller writes this to the host model unconditionally; the model
/// layer suppresses notifications when the value did not actually change.
pub fn hover_after_move(
    boxes: &BoxCollection,
    point: (f32, f32),
    im_scale: f32,
) -> Option<BoxAnnotation> {
    hit_test(boxes, point, im_scale).and_then(|i| boxes[i].clone())
}

/// Result of a pointer-click transition: the new active value, or `None`
/// for "leave active unchanged".
///
/// A click commits only through the hover gate: the hit-test is restricted
/// to boxes structurally equal to the current hover, so a click never acts
/// on an occluded box underneath a higher hovered one. Consequences:
/// - clicking the hovered box toggles it active / inactive,
/// - clicking empty canvas clears the active selection,
/// - clicking a box that is not the current hover changes nothing (which
///   also means a click with no preceding pointer move, as on touch input,
///   never commits).
pub fn active_after_click(
    boxes: &BoxCollection,
    hover: Option<&BoxAnnotation>,
    active: Option<&BoxAnnotation>,
    point: (f32, f32),
    im_scale: f32,
) -> ClickOutcome {
    // Hit-test restricted to the hovered box.
    if let Some(h) = hover {
        let hovered_hit = boxes
            .iter()
            .flatten()
            .any(|b| b == h && b.rect.scaled(im_scale).contains(point.0, point.1));
        if hovered_hit {
            return if active == Some(h) {
                ClickOutcome::SetActive(None)
            } else {
                ClickOutcome::SetActive(Some(h.clone()))
            };
        }
    }

    if hit_test(boxes, point, im_scale).is_none() {
        // Nothing under the pointer at all: clear the selection.
        ClickOutcome::SetActive(None)
    } else {
        // Something was hit, but the hover gate swallows it.
        ClickOutcome::Unchanged
    }
}

/// What a click does to the active selection.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Write this value as the new active selection
    SetActive(Option<BoxAnnotation>),
    /// Do not touch the active selection
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> BoxAnnotation {
        BoxAnnotation::new(Rect::new(x, y, w, h))
    }

    #[test]
    fn test_move_sets_hover_inside_box() {
        let boxes = vec![Some(boxed(10.0, 10.0, 20.0, 20.0))];
        let hover = hover_after_move(&boxes, (15.0, 15.0), 1.0);
        assert_eq!(hover, Some(boxed(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn test_move_clears_hover_outside() {
        let boxes = vec![Some(boxed(10.0, 10.0, 20.0, 20.0))];
        assert_eq!(hover_after_move(&boxes, (100.0, 100.0), 1.0), None);
    }

    #[test]
    fn test_move_overlap_prefers_nearest_corner() {
        let a = boxed(0.0, 50.0, 100.0, 100.0);
        let b = boxed(50.0, 0.0, 100.0, 100.0);
        let boxes = vec![Some(a.clone()), Some(b.clone())];
        // (50, 60) is in the overlap; A's corner is nearer.
        assert_eq!(hover_after_move(&boxes, (50.0, 60.0), 1.0), Some(a));
        // (60, 50) flips it to B.
        assert_eq!(hover_after_move(&boxes, (60.0, 50.0), 1.0), Some(b));
    }

    #[test]
    fn test_click_hovered_box_becomes_active() {
        let b = boxed(10.0, 10.0, 20.0, 20.0);
        let boxes = vec![Some(b.clone())];
        let outcome = active_after_click(&boxes, Some(&b), None, (15.0, 15.0), 1.0);
        assert_eq!(outcome, ClickOutcome::SetActive(Some(b)));
    }

    #[test]
    fn test_click_active_hovered_box_toggles_off() {
        let b = boxed(10.0, 10.0, 20.0, 20.0);
        let boxes = vec![Some(b.clone())];
        let outcome = active_after_click(&boxes, Some(&b), Some(&b), (15.0, 15.0), 1.0);
        assert_eq!(outcome, ClickOutcome::SetActive(None));
    }

    #[test]
    fn test_click_unhovered_box_is_swallowed() {
        let a = boxed(0.0, 0.0, 20.0, 20.0);
        let b = boxed(100.0, 100.0, 20.0, 20.0);
        let boxes = vec![Some(a.clone()), Some(b.clone())];
        // Hover is on b, but the click lands inside a.
        let outcome = active_after_click(&boxes, Some(&b), Some(&b), (5.0, 5.0), 1.0);
        assert_eq!(outcome, ClickOutcome::Unchanged);
    }

    #[test]
    fn test_click_without_hover_is_swallowed_over_box() {
        let a = boxed(0.0, 0.0, 20.0, 20.0);
        let boxes = vec![Some(a.clone())];
        // No preceding move: hover is unset, click inside a box commits nothing.
        let outcome = active_after_click(&boxes, None, None, (5.0, 5.0), 1.0);
        assert_eq!(outcome, ClickOutcome::Unchanged);
    }

    #[test]
    fn test_click_empty_canvas_clears_active() {
        let a = boxed(0.0, 0.0, 20.0, 20.0);
        let boxes = vec![Some(a.clone())];
        let outcome = active_after_click(&boxes, None, Some(&a), (50.0, 50.0), 1.0);
        assert_eq!(outcome, ClickOutcome::SetActive(None));
    }

    #[test]
    fn test_click_stale_hover_not_in_collection() {
        // The collection changed since the hover was computed: the stale
        // hover matches nothing, so the click over a box is swallowed.
        let stale = boxed(0.0, 0.0, 20.0, 20.0);
        let boxes = vec![Some(boxed(2.0, 2.0, 20.0, 20.0))];
        let outcome = active_after_click(&boxes, Some(&stale), None, (5.0, 5.0), 1.0);
        assert_eq!(outcome, ClickOutcome::Unchanged);
    }

    #[test]
    fn test_click_respects_scale() {
        let b = boxed(100.0, 100.0, 50.0, 50.0);
        let boxes = vec![Some(b.clone())];
        // Canvas point (60, 60) is inside the box at scale 0.5.
        let outcome = active_after_click(&boxes, Some(&b), None, (60.0, 60.0), 0.5);
        assert_eq!(outcome, ClickOutcome::SetActive(Some(b)));
    }
}

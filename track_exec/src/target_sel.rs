//! # Target selection
//!
//! Reduces the detections made on a frame to the single face the vehicle should track. The
//! target is the detection with the largest bounding box, on the basis that the largest face is
//! the nearest one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::Detection;
use log::trace;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The selected target.
///
/// A frame with no valid detections produces [`Target::NONE`], which has its centre at the
/// origin and zero area.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Centre of the target's bounding box in pixels
    pub center: (i64, i64),

    /// Area of the target's bounding box in square pixels
    pub area: i64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Target {
    /// No target on this frame.
    pub const NONE: Target = Target {
        center: (0, 0),
        area: 0,
    };

    /// Build the target described by a detection.
    pub fn from_detection(det: &Detection) -> Self {
        Self {
            center: det.bbox.center(),
            area: det.bbox.area(),
        }
    }

    /// True if there was no valid detection to select.
    pub fn is_none(&self) -> bool {
        self.area == 0
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Select the target from a frame's detections.
///
/// Degenerate boxes are discarded. Among the rest the largest area wins, with the earliest
/// detection winning an exact tie.
pub fn select(detections: &[Detection]) -> Target {
    select_largest(detections.iter().filter(|d| !d.bbox.is_degenerate()))
}

/// Select the target, additionally discarding boxes which are not fully inside a
/// `width` x `height` frame or whose confidence is below `min_confidence`.
pub fn select_in_frame(
    detections: &[Detection],
    width: u32,
    height: u32,
    min_confidence: f32,
) -> Target {
    let valid = detections.iter().filter(|d| {
        !d.bbox.is_degenerate()
            && d.bbox.is_within(width, height)
            && d.confidence >= min_confidence
    });

    let target = select_largest(valid.clone());

    let num_dropped = detections.len() - valid.count();
    if num_dropped > 0 {
        trace!(
            "Dropped {} of {} detections as invalid",
            num_dropped,
            detections.len()
        );
    }

    target
}

/// Stable maximum by area: a later detection only replaces the current best if strictly larger.
fn select_largest<'a, I>(detections: I) -> Target
where
    I: Iterator<Item = &'a Detection>,
{
    detections
        .map(Target::from_detection)
        .fold(None, |best: Option<Target>, t| match best {
            Some(b) if b.area >= t.area => Some(b),
            _ => Some(t),
        })
        .unwrap_or(Target::NONE)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::BoundingBox;

    fn det(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Detection {
        Detection::new(BoundingBox::new(x_min, y_min, x_max, y_max), 0.9)
    }

    #[test]
    fn test_largest_wins() {
        let dets = vec![det(0, 0, 10, 10), det(100, 100, 200, 200), det(50, 50, 60, 70)];

        assert_eq!(
            select(&dets),
            Target {
                center: (150, 150),
                area: 10_000
            }
        );
    }

    #[test]
    fn test_tie_takes_first() {
        // Equal areas, A must win because it came first
        let a = det(0, 0, 10, 10);
        let b = det(5, 5, 15, 15);

        assert_eq!(select(&[a, b]).center, (5, 5));
        assert_eq!(select(&[b, a]).center, (10, 10));

        // Tie after a smaller one
        assert_eq!(select(&[det(0, 0, 1, 1), a, b]).center, (5, 5));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(select(&[]), Target::NONE);
        assert!(select(&[]).is_none());
    }

    #[test]
    fn test_degenerate_only_is_none() {
        let dets = vec![det(10, 10, 10, 50), det(10, 10, 50, 10), det(50, 50, 10, 10)];

        assert_eq!(select(&dets), Target::NONE);
    }

    #[test]
    fn test_degenerate_skipped() {
        let dets = vec![det(10, 10, 10, 5000), det(0, 0, 4, 4)];

        assert_eq!(
            select(&dets),
            Target {
                center: (2, 2),
                area: 16
            }
        );
    }

    #[test]
    fn test_none_differs_from_midpoint() {
        let t = select(&[det(350, 230, 370, 250)]);

        assert_eq!(t.center, (360, 240));
        assert_ne!(t, Target::NONE);
        assert!(!t.is_none());
    }

    #[test]
    fn test_in_frame_filters_out_of_bounds() {
        // The large box pokes outside the frame so the small one is chosen
        let dets = vec![det(-10, 0, 400, 400), det(0, 0, 20, 20)];

        assert_eq!(select_in_frame(&dets, 720, 480, 0.0).area, 400);
        assert_eq!(select(&dets).area, 410 * 400);
    }

    #[test]
    fn test_in_frame_filters_confidence() {
        let mut weak = det(0, 0, 100, 100);
        weak.confidence = 0.2;
        let strong = det(0, 0, 10, 10);

        assert_eq!(select_in_frame(&[weak, strong], 720, 480, 0.5).area, 100);
        assert_eq!(select_in_frame(&[weak, strong], 720, 480, 0.0).area, 10_000);
        assert_eq!(select_in_frame(&[weak], 720, 480, 0.5), Target::NONE);
    }
}

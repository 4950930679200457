//! # Detector data
//!
//! The face detector publishes one [`DetFrame`] per processed video frame. Boxes arrive exactly
//! as the detector produced them, which means they may be degenerate or partially outside the
//! frame. Consumers are expected to filter them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Axis-aligned rectangle in pixel coordinates.
///
/// Pixel coordinates have their origin at the top left of the frame, with x increasing to the
/// right and y increasing downwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

/// A single face detection.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box of the face
    #[serde(rename = "box")]
    pub bbox: BoundingBox,

    /// Detector confidence in the range [0, 1]
    pub confidence: f32,
}

/// All detections made on a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetFrame {
    /// Monotonic frame counter from the detector
    pub frame_id: u64,

    /// Time at which the frame was captured
    pub timestamp: DateTime<Utc>,

    /// Width of the frame in pixels
    pub width: u32,

    /// Height of the frame in pixels
    pub height: u32,

    /// Detections in the order the detector reported them
    #[serde(default)]
    pub detections: Vec<Detection>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i64 {
        self.x_max as i64 - self.x_min as i64
    }

    pub fn height(&self) -> i64 {
        self.y_max as i64 - self.y_min as i64
    }

    /// Area of the box in square pixels, zero for degenerate boxes.
    pub fn area(&self) -> i64 {
        if self.is_degenerate() {
            0
        } else {
            self.width() * self.height()
        }
    }

    /// Geometric centre of the box, using floor division of the width and height.
    pub fn center(&self) -> (i64, i64) {
        (
            self.x_min as i64 + self.width().div_euclid(2),
            self.y_min as i64 + self.height().div_euclid(2),
        )
    }

    /// A box is degenerate if it has zero or negative width or height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Returns true if the box lies entirely within `[0, width] x [0, height]`.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as i64, height as i64);

        self.x_min >= 0
            && self.y_min >= 0
            && self.x_max as i64 <= w
            && self.y_max as i64 <= h
    }
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

impl DetFrame {
    /// Create a frame stamped with the current time.
    pub fn now(frame_id: u64, width: u32, height: u32, detections: Vec<Detection>) -> Self {
        Self {
            frame_id,
            timestamp: Utc::now(),
            width,
            height,
            detections,
        }
    }

    /// Parse a frame from its JSON representation.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

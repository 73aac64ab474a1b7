//! Collision detection between falling drops and the bucket
//!
//! Everything is axis-aligned in drop-zone coordinates (y grows downward).
//! The bucket only moves horizontally; its vertical extent is the fixed
//! catch region.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from its top-left corner and size
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(left, top),
            max: Vec2::new(left + width, top + height),
        }
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.max.x
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    /// Closed intersection test: touching edges count as overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.bottom() >= other.top()
            && self.top() <= other.bottom()
            && self.right() >= other.left()
            && self.left() <= other.right()
    }
}

/// Horizontal extent of the bucket, as reported by the drag layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketBounds {
    pub left: f32,
    pub right: f32,
}

impl BucketBounds {
    pub fn new(left: f32, right: f32) -> Self {
        // Tolerate swapped edges from the DOM
        Self {
            left: left.min(right),
            right: left.max(right),
        }
    }

    /// Bucket of `width` centered at `center`
    pub fn centered(center: f32, width: f32) -> Self {
        Self::new(center - width / 2.0, center + width / 2.0)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// The bucket opening that drops are tested against
    pub fn catch_rect(&self) -> Rect {
        Rect::new(self.left, CATCH_TOP, self.width(), CATCH_BOTTOM - CATCH_TOP)
    }
}

impl Default for BucketBounds {
    fn default() -> Self {
        Self::centered(DEFAULT_DROP_ZONE_WIDTH / 2.0, BUCKET_WIDTH)
    }
}

/// Bounding box of a drop whose top-left corner is at (`left`, `top`)
pub fn drop_rect(left: f32, top: f32) -> Rect {
    Rect::new(left, top, DROP_WIDTH, DROP_HEIGHT)
}

/// Constrain a dragged bucket's left edge inside its area
///
/// Narrow areas pin the bucket to the minimum; this never panics the way
/// `f32::clamp` would with an inverted range.
pub fn clamp_bucket_left(left: f32, area_width: f32) -> f32 {
    left.min(area_width - BUCKET_RIGHT_MARGIN).max(BUCKET_MIN_LEFT)
}

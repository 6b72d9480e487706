//! Coordinate transformation and shape math for the overlay
//!
//! Overlay pixel space has its origin at the top-left corner with y growing
//! downward. Target (PDF content) space has its origin at the bottom-left with y
//! growing upward.

use serde::{Deserialize, Serialize};

/// A position in overlay pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// On-screen bounding rectangle of the overlay element (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Logical pixel dimensions of the overlay drawing buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Map a raw pointer position to logical overlay pixels.
///
/// Each axis is scaled independently by `logical / on_screen`. The bounding
/// rectangle must be the one measured for this event; a cached rectangle goes
/// stale on scroll. Returns `None` when the element has no on-screen extent.
pub fn map_pointer(client: Point, rect: ClientRect, logical: LogicalSize) -> Option<Point> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }

    Some(Point {
        x: (client.x - rect.left) * (logical.width / rect.width),
        y: (client.y - rect.top) * (logical.height / rect.height),
    })
}

/// Signed bounding box produced by a drag gesture.
///
/// `width`/`height` keep their sign: a negative value means the shape was drawn
/// up or left of its anchor. Nothing here normalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ShapeBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds of a drag from `start` to `end`
    pub fn from_drag(start: Point, end: Point) -> Self {
        Self {
            x: start.x,
            y: start.y,
            width: end.x - start.x,
            height: end.y - start.y,
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Ellipse radii; always non-negative regardless of drag direction
    pub fn radii(&self) -> (f64, f64) {
        ((self.width / 2.0).abs(), (self.height / 2.0).abs())
    }
}

/// Convert an overlay y coordinate into target space.
///
/// `extent` is the type-specific amount the primitive reaches below its overlay
/// anchor (font size for baseline text, shape height for boxes, 0 for points).
pub fn flip_y(page_height: f64, overlay_y: f64, extent: f64) -> f64 {
    page_height - overlay_y - extent
}

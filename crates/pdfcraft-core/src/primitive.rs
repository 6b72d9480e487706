//! Drawing primitives per annotation kind
//!
//! Both the overlay renderer and the PDF exporter draw from the same
//! [`Primitive`], so each kind's geometry is decided in exactly one place.

use crate::annotation::{Annotation, AnnotationKind, TextAlign};
use crate::geometry::{Point, ShapeBounds};

/// Width used for a highlight created without a drag extent
pub const HIGHLIGHT_DEFAULT_WIDTH: f64 = 100.0;
/// Height used for a highlight created without a drag extent
pub const HIGHLIGHT_DEFAULT_HEIGHT: f64 = 15.0;
/// Fill opacity for highlights, on screen and in the exported file
pub const HIGHLIGHT_OPACITY: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive<'a> {
    /// Connected stroke through every point
    Polyline(&'a [Point]),
    Segment(Point, Point),
    StrokeRect(ShapeBounds),
    /// Ellipse inscribed in the (signed) bounds
    StrokeEllipse(ShapeBounds),
    FillRect { bounds: ShapeBounds, opacity: f64 },
    Text {
        anchor: Point,
        content: &'a str,
        font_size: f64,
        font_family: &'a str,
        alignment: TextAlign,
    },
}

impl AnnotationKind {
    /// The primitive this payload draws when anchored at `anchor`
    pub fn primitive(&self, anchor: Point) -> Primitive<'_> {
        match self {
            AnnotationKind::Draw { points } => Primitive::Polyline(points),
            AnnotationKind::Line { start, end } => Primitive::Segment(*start, *end),
            AnnotationKind::Rectangle { width, height } => {
                Primitive::StrokeRect(ShapeBounds::new(anchor.x, anchor.y, *width, *height))
            }
            AnnotationKind::Ellipse { width, height } => {
                Primitive::StrokeEllipse(ShapeBounds::new(anchor.x, anchor.y, *width, *height))
            }
            AnnotationKind::Highlight { width, height } => Primitive::FillRect {
                bounds: highlight_bounds(anchor, *width, *height),
                opacity: HIGHLIGHT_OPACITY,
            },
            AnnotationKind::Text {
                content,
                font_size,
                font_family,
                alignment,
            } => Primitive::Text {
                anchor,
                content,
                font_size: *font_size,
                font_family,
                alignment: *alignment,
            },
        }
    }
}

impl Annotation {
    pub fn primitive(&self) -> Primitive<'_> {
        self.kind.primitive(self.anchor())
    }
}

fn highlight_bounds(anchor: Point, width: f64, height: f64) -> ShapeBounds {
    let width = if width == 0.0 {
        HIGHLIGHT_DEFAULT_WIDTH
    } else {
        width
    };
    let height = if height == 0.0 {
        HIGHLIGHT_DEFAULT_HEIGHT
    } else {
        height
    };
    ShapeBounds::new(anchor.x, anchor.y, width, height)
}

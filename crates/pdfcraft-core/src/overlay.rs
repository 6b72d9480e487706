//! Interactive overlay rendering
//!
//! The overlay is redrawn from scratch on every change: clear, then every
//! committed annotation of the current page in creation order, then the
//! in-progress gesture preview on top.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, Color, StrokeStyle, TextAlign};
use crate::geometry::{Point, ShapeBounds};
use crate::primitive::Primitive;

pub const SELECTION_SHADOW_BLUR: f64 = 10.0;
pub const SELECTION_SHADOW_COLOR: &str = "rgba(0,0,0,0.2)";

/// Stroke and fill paint for the next draw calls. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub line_width: f64,
}

impl From<StrokeStyle> for Paint {
    fn from(style: StrokeStyle) -> Self {
        Self {
            color: style.color,
            line_width: style.thickness as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f64,
    pub color: &'static str,
}

pub const SELECTION_SHADOW: Shadow = Shadow {
    blur: SELECTION_SHADOW_BLUR,
    color: SELECTION_SHADOW_COLOR,
};

/// Immediate-mode 2D drawing target for the overlay
pub trait OverlaySurface {
    fn clear(&mut self);
    fn set_paint(&mut self, paint: Paint);
    /// `None` disables the shadow
    fn set_shadow(&mut self, shadow: Option<Shadow>);
    fn stroke_polyline(&mut self, points: &[Point]);
    fn stroke_rect(&mut self, bounds: ShapeBounds);
    fn stroke_ellipse(&mut self, center: Point, radius_x: f64, radius_y: f64);
    fn fill_rect(&mut self, bounds: ShapeBounds, opacity: f64);
    /// `font` is a CSS font shorthand, e.g. `16px Inter`
    fn fill_text(&mut self, text: &str, anchor: Point, font: &str, alignment: TextAlign);
}

/// CSS font shorthand for a text annotation
pub fn css_font(font_size: f64, font_family: &str) -> String {
    format!("{}px {}", font_size, font_family)
}

/// Gesture in progress, drawn with the active style
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewShape {
    pub kind: AnnotationKind,
    pub anchor: Point,
    pub style: StrokeStyle,
}

/// Everything the overlay needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct OverlayScene<'a> {
    pub annotations: &'a [Annotation],
    pub page_index: u32,
    pub selected: Option<AnnotationId>,
    pub preview: Option<&'a PreviewShape>,
}

pub fn render_overlay(surface: &mut dyn OverlaySurface, scene: &OverlayScene<'_>) {
    surface.clear();

    for annotation in scene
        .annotations
        .iter()
        .filter(|a| a.page_index() == scene.page_index)
    {
        surface.set_paint(annotation.stroke_style().into());
        if scene.selected == Some(annotation.id()) {
            surface.set_shadow(Some(SELECTION_SHADOW));
        } else {
            surface.set_shadow(None);
        }
        draw_primitive(surface, &annotation.primitive());
    }

    if let Some(preview) = scene.preview {
        surface.set_paint(preview.style.into());
        surface.set_shadow(None);
        draw_primitive(surface, &preview.kind.primitive(preview.anchor));
    }
}

pub fn draw_primitive(surface: &mut dyn OverlaySurface, primitive: &Primitive<'_>) {
    match primitive {
        Primitive::Polyline(points) => surface.stroke_polyline(points),
        Primitive::Segment(start, end) => surface.stroke_polyline(&[*start, *end]),
        Primitive::StrokeRect(bounds) => surface.stroke_rect(*bounds),
        Primitive::StrokeEllipse(bounds) => {
            let (rx, ry) = bounds.radii();
            surface.stroke_ellipse(bounds.center(), rx, ry);
        }
        Primitive::FillRect { bounds, opacity } => surface.fill_rect(*bounds, *opacity),
        Primitive::Text {
            anchor,
            content,
            font_size,
            font_family,
            alignment,
        } => surface.fill_text(content, *anchor, &css_font(*font_size, font_family), *alignment),
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{Call, RecordingSurface};
    use super::*;
    use pretty_assertions::assert_eq;

    fn style() -> StrokeStyle {
        StrokeStyle {
            color: Color::rgb(0, 0, 0),
            thickness: 3,
        }
    }

    fn shape(page: u32, kind: AnnotationKind) -> Annotation {
        Annotation::new(page, Point::new(10.0, 10.0), style(), kind).unwrap()
    }

    #[test]
    fn test_clears_first_and_filters_page() {
        let annotations = vec![
            shape(
                0,
                AnnotationKind::Rectangle {
                    width: 5.0,
                    height: 5.0,
                },
            ),
            shape(
                1,
                AnnotationKind::Rectangle {
                    width: 7.0,
                    height: 7.0,
                },
            ),
        ];
        let mut surface = RecordingSurface::default();
        render_overlay(
            &mut surface,
            &OverlayScene {
                annotations: &annotations,
                page_index: 1,
                selected: None,
                preview: None,
            },
        );

        assert_eq!(surface.calls[0], Call::Clear);
        assert_eq!(
            surface.shapes(),
            vec![&Call::Rect(ShapeBounds::new(10.0, 10.0, 7.0, 7.0))]
        );
    }

    #[test]
    fn test_ellipse_uses_center_and_absolute_radii() {
        let annotations = vec![shape(
            0,
            AnnotationKind::Ellipse {
                width: -5.0,
                height: 20.0,
            },
        )];
        let mut surface = RecordingSurface::default();
        render_overlay(
            &mut surface,
            &OverlayScene {
                annotations: &annotations,
                page_index: 0,
                selected: None,
                preview: None,
            },
        );
        assert_eq!(
            surface.shapes(),
            vec![&Call::Ellipse(Point::new(7.5, 20.0), 2.5, 10.0)]
        );
    }

    #[test]
    fn test_selected_gets_shadow_others_do_not() {
        let annotations = vec![
            shape(
                0,
                AnnotationKind::Line {
                    start: Point::new(0.0, 0.0),
                    end: Point::new(5.0, 5.0),
                },
            ),
            shape(
                0,
                AnnotationKind::Highlight {
                    width: 0.0,
                    height: 0.0,
                },
            ),
        ];
        let selected = annotations[1].id();
        let mut surface = RecordingSurface::default();
        render_overlay(
            &mut surface,
            &OverlayScene {
                annotations: &annotations,
                page_index: 0,
                selected: Some(selected),
                preview: None,
            },
        );

        let shadows: Vec<_> = surface
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Shadow(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(shadows, vec![None, Some(SELECTION_SHADOW)]);
        assert!(surface
            .calls
            .contains(&Call::Fill(ShapeBounds::new(10.0, 10.0, 100.0, 15.0), 0.4)));
    }

    #[test]
    fn test_text_uses_css_font_and_alignment() {
        let annotations = vec![shape(
            0,
            AnnotationKind::Text {
                content: "Hi".into(),
                font_size: 16.0,
                font_family: "Inter".into(),
                alignment: TextAlign::Right,
            },
        )];
        let mut surface = RecordingSurface::default();
        render_overlay(
            &mut surface,
            &OverlayScene {
                annotations: &annotations,
                page_index: 0,
                selected: None,
                preview: None,
            },
        );
        assert_eq!(
            surface.shapes(),
            vec![&Call::Text(
                "Hi".into(),
                Point::new(10.0, 10.0),
                "16px Inter".into(),
                TextAlign::Right
            )]
        );
    }

    #[test]
    fn test_preview_drawn_last_with_active_style() {
        let annotations = vec![shape(
            0,
            AnnotationKind::Rectangle {
                width: 1.0,
                height: 1.0,
            },
        )];
        let active = StrokeStyle {
            color: Color::rgb(0xef, 0x44, 0x44),
            thickness: 8,
        };
        let preview = PreviewShape {
            kind: AnnotationKind::Draw {
                points: vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            },
            anchor: Point::new(1.0, 1.0),
            style: active,
        };
        let mut surface = RecordingSurface::default();
        render_overlay(
            &mut surface,
            &OverlayScene {
                annotations: &annotations,
                page_index: 0,
                selected: Some(annotations[0].id()),
                preview: Some(&preview),
            },
        );

        let n = surface.calls.len();
        assert_eq!(surface.calls[n - 3], Call::Paint(active.into()));
        assert_eq!(surface.calls[n - 2], Call::Shadow(None));
        assert_eq!(
            surface.calls[n - 1],
            Call::Polyline(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)])
        );
    }
}

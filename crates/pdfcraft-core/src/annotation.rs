//! Annotation records and the in-memory annotation store
//!
//! An annotation is a value: edits go through [`Annotation::with_updates`], which
//! returns a new record and leaves the original untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PdfCraftError;
use crate::geometry::Point;

/// Opaque, session-unique annotation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AnnotationId {
    type Err = PdfCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| PdfCraftError::InvalidAnnotation(format!("bad id '{}': {}", s, e)))
    }
}

/// 24-bit RGB color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(color: &str) -> Result<Self, PdfCraftError> {
        let hex = color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PdfCraftError::InvalidAnnotation(format!(
                "color must be #rrggbb, got '{}'",
                color
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| {
                PdfCraftError::InvalidAnnotation(format!("color must be #rrggbb, got '{}'", color))
            })
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components in the 0-1 range used by PDF color operators
    pub fn to_unit_rgb(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = PdfCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = PdfCraftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Horizontal text alignment relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Value for the canvas `textAlign` property
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

impl FromStr for TextAlign {
    type Err = PdfCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            other => Err(PdfCraftError::InvalidAnnotation(format!(
                "unknown alignment '{}'",
                other
            ))),
        }
    }
}

/// The active tool. `Pointer` selects; every other tool creates its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pointer,
    Text,
    Highlight,
    Draw,
    Line,
    Rectangle,
    Ellipse,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Pointer => "pointer",
            Tool::Text => "text",
            Tool::Highlight => "highlight",
            Tool::Draw => "draw",
            Tool::Line => "line",
            Tool::Rectangle => "rectangle",
            Tool::Ellipse => "ellipse",
        }
    }

    /// Tools that create an annotation from a press-move-release gesture
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Tool::Highlight | Tool::Draw | Tool::Line | Tool::Rectangle | Tool::Ellipse
        )
    }
}

impl FromStr for Tool {
    type Err = PdfCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pointer" | "select" => Ok(Tool::Pointer),
            "text" => Ok(Tool::Text),
            "highlight" => Ok(Tool::Highlight),
            "draw" | "freehand" => Ok(Tool::Draw),
            "line" => Ok(Tool::Line),
            "rectangle" | "rect" => Ok(Tool::Rectangle),
            "ellipse" | "circle" => Ok(Tool::Ellipse),
            other => Err(PdfCraftError::InvalidAnnotation(format!(
                "unknown tool '{}'",
                other
            ))),
        }
    }
}

/// Type-specific payload of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    Text {
        content: String,
        font_size: f64,
        font_family: String,
        #[serde(default)]
        alignment: TextAlign,
    },
    Highlight {
        width: f64,
        height: f64,
    },
    Draw {
        points: Vec<Point>,
    },
    Line {
        start: Point,
        end: Point,
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
    },
}

impl AnnotationKind {
    pub fn tool(&self) -> Tool {
        match self {
            AnnotationKind::Text { .. } => Tool::Text,
            AnnotationKind::Highlight { .. } => Tool::Highlight,
            AnnotationKind::Draw { .. } => Tool::Draw,
            AnnotationKind::Line { .. } => Tool::Line,
            AnnotationKind::Rectangle { .. } => Tool::Rectangle,
            AnnotationKind::Ellipse { .. } => Tool::Ellipse,
        }
    }

    /// Anchor implied by the payload itself (first point of a stroke or line)
    fn implied_anchor(&self) -> Option<Point> {
        match self {
            AnnotationKind::Draw { points } => points.first().copied(),
            AnnotationKind::Line { start, .. } => Some(*start),
            _ => None,
        }
    }
}

/// Stroke paint shared by every annotation kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub thickness: u32,
}

/// A single mark on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    page_index: u32,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub thickness: u32,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl Annotation {
    /// Create an annotation with a fresh id.
    ///
    /// For freehand strokes and lines the anchor is taken from the first point.
    pub fn new(
        page_index: u32,
        anchor: Point,
        style: StrokeStyle,
        kind: AnnotationKind,
    ) -> Result<Self, PdfCraftError> {
        let anchor = kind.implied_anchor().unwrap_or(anchor);
        let annotation = Self {
            id: AnnotationId::new(),
            page_index,
            x: anchor.x,
            y: anchor.y,
            color: style.color,
            thickness: style.thickness,
            kind,
        };
        annotation.validate()?;
        Ok(annotation)
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn tool(&self) -> Tool {
        self.kind.tool()
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color,
            thickness: self.thickness,
        }
    }

    /// Check record invariants (used on creation and on deserialization)
    pub fn validate(&self) -> Result<(), PdfCraftError> {
        if !self.anchor().is_finite() {
            return Err(PdfCraftError::InvalidAnnotation(
                "anchor must be finite".into(),
            ));
        }
        if self.thickness == 0 {
            return Err(PdfCraftError::InvalidAnnotation(
                "thickness must be positive".into(),
            ));
        }

        match &self.kind {
            AnnotationKind::Text { font_size, .. } => {
                if !(font_size.is_finite() && *font_size > 0.0) {
                    return Err(PdfCraftError::InvalidAnnotation(
                        "font size must be positive".into(),
                    ));
                }
            }
            AnnotationKind::Draw { points } => {
                if points.len() < 2 {
                    return Err(PdfCraftError::InvalidAnnotation(format!(
                        "freehand stroke needs at least 2 points, got {}",
                        points.len()
                    )));
                }
                if !points.iter().all(Point::is_finite) {
                    return Err(PdfCraftError::InvalidAnnotation(
                        "stroke points must be finite".into(),
                    ));
                }
            }
            AnnotationKind::Line { start, end } => {
                if !(start.is_finite() && end.is_finite()) {
                    return Err(PdfCraftError::InvalidAnnotation(
                        "line endpoints must be finite".into(),
                    ));
                }
            }
            AnnotationKind::Highlight { width, height }
            | AnnotationKind::Rectangle { width, height }
            | AnnotationKind::Ellipse { width, height } => {
                if !(width.is_finite() && height.is_finite()) {
                    return Err(PdfCraftError::InvalidAnnotation(
                        "shape extent must be finite".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Return a copy with `patch` applied.
    ///
    /// Id, page and kind never change. Text fields are ignored for other kinds,
    /// and values that would break a record invariant (zero thickness,
    /// non-positive font size) are ignored.
    pub fn with_updates(&self, patch: &AnnotationPatch) -> Annotation {
        let mut updated = self.clone();

        if let Some(color) = patch.color {
            updated.color = color;
        }
        if let Some(thickness) = patch.thickness.filter(|t| *t > 0) {
            updated.thickness = thickness;
        }

        if let AnnotationKind::Text {
            content,
            font_size,
            font_family,
            alignment,
        } = &mut updated.kind
        {
            if let Some(new_content) = &patch.content {
                content.clone_from(new_content);
            }
            if let Some(size) = patch
                .font_size
                .filter(|s| s.is_finite() && *s > 0.0)
            {
                *font_size = size;
            }
            if let Some(family) = &patch.font_family {
                font_family.clone_from(family);
            }
            if let Some(align) = patch.alignment {
                *alignment = align;
            }
        }

        updated
    }
}

/// Partial update for [`Annotation::with_updates`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub thickness: Option<u32>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub alignment: Option<TextAlign>,
}

impl AnnotationPatch {
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn thickness(thickness: u32) -> Self {
        Self {
            thickness: Some(thickness),
            ..Self::default()
        }
    }
}

/// Creation-ordered collection of annotations for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.id();
        self.annotations.push(annotation);
        id
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id() == id)?;
        Some(self.annotations.remove(pos))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    /// Replace the record with `id` by its patched copy; position is kept
    pub fn update(&mut self, id: AnnotationId, patch: &AnnotationPatch) -> Option<&Annotation> {
        let slot = self.annotations.iter_mut().find(|a| a.id() == id)?;
        *slot = slot.with_updates(patch);
        Some(slot)
    }

    pub fn on_page(&self, page_index: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.page_index() == page_index)
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn to_json(&self) -> Result<String, PdfCraftError> {
        serde_json::to_string_pretty(self).map_err(|e| PdfCraftError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PdfCraftError> {
        let store: Self =
            serde_json::from_str(json).map_err(|e| PdfCraftError::Serialization(e.to_string()))?;
        for annotation in &store.annotations {
            annotation.validate()?;
        }
        Ok(store)
    }
}

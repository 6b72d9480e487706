//! Bake annotations into page content
//!
//! Every annotation becomes ordinary drawing operators appended to its page, so
//! the marks survive in any viewer. Overlay pixels are written 1:1 as points; y is
//! flipped against the page height because PDF space grows upward.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::annotation::{Annotation, AnnotationKind, TextAlign};
use crate::error::PdfCraftError;
use crate::geometry::{flip_y, Point, ShapeBounds};
use crate::page_info::{inherited_attribute, resolve, PageGeometry};
use crate::primitive::{Primitive, HIGHLIGHT_OPACITY};
use crate::validation::strip_to_signature;

/// Control-point factor for approximating a quarter ellipse with one cubic Bézier
const KAPPA: f64 = 0.552_284_749_8;

/// Base-14 fonts used for exported text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    Courier,
}

impl StandardFont {
    /// Courier families map to Courier, everything else to Helvetica
    pub fn for_family(family: &str) -> Self {
        if family.to_ascii_lowercase().contains("courier") {
            StandardFont::Courier
        } else {
            StandardFont::Helvetica
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::Courier => "Courier",
        }
    }

    fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "PCHelv",
            StandardFont::Courier => "PCCour",
        }
    }
}

const HIGHLIGHT_GSTATE_NAME: &str = "PCHighlight";

/// Horizontal shift applied to exported text so center/right alignment roughly
/// matches the overlay. Text width is not measured.
pub fn alignment_nudge(alignment: TextAlign) -> f64 {
    match alignment {
        TextAlign::Left => 0.0,
        TextAlign::Center => -50.0,
        TextAlign::Right => -100.0,
    }
}

/// Produce a new PDF with `annotations` drawn into their pages.
///
/// The input is never modified. Annotations whose page does not exist are
/// skipped. The same inputs always give byte-identical output.
pub fn export_annotated(
    pdf_bytes: &[u8],
    annotations: &[Annotation],
) -> Result<Vec<u8>, PdfCraftError> {
    let pdf = strip_to_signature(pdf_bytes)?;
    let mut doc = Document::load_mem(pdf)
        .map_err(|e| PdfCraftError::Export(format!("failed to load document: {}", e)))?;

    let pages = doc.get_pages();
    let mut by_page: BTreeMap<u32, Vec<&Annotation>> = BTreeMap::new();
    for annotation in annotations {
        if pages.contains_key(&(annotation.page_index() + 1)) {
            by_page
                .entry(annotation.page_index())
                .or_default()
                .push(annotation);
        } else {
            tracing::debug!(
                id = %annotation.id(),
                page = annotation.page_index(),
                "skipping annotation on missing page"
            );
        }
    }

    let mut shared = SharedResources::default();
    for (page_index, page_annotations) in &by_page {
        let page_id = pages[&(page_index + 1)];
        stamp_page(&mut doc, &mut shared, *page_index, page_id, page_annotations)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| PdfCraftError::Export(e.to_string()))?;

    tracing::info!(
        annotations = annotations.len(),
        pages = by_page.len(),
        bytes = output.len(),
        "exported annotated PDF"
    );
    Ok(output)
}

/// Font and graphics-state objects, created once per document
#[derive(Default)]
struct SharedResources {
    fonts: BTreeMap<StandardFont, ObjectId>,
    highlight: Option<ObjectId>,
}

impl SharedResources {
    fn font(&mut self, doc: &mut Document, font: StandardFont) -> ObjectId {
        *self.fonts.entry(font).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            })
        })
    }

    fn highlight(&mut self, doc: &mut Document) -> ObjectId {
        *self.highlight.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(HIGHLIGHT_OPACITY as f32),
                "CA" => Object::Real(HIGHLIGHT_OPACITY as f32),
            })
        })
    }
}

/// Resource names chosen for one page
#[derive(Debug, Default)]
struct ResourceNames {
    fonts: BTreeMap<StandardFont, Vec<u8>>,
    highlight: Vec<u8>,
}

/// Maps overlay coordinates onto one page
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    origin_x: f64,
    origin_y: f64,
    height: f64,
}

impl PageFrame {
    fn from_geometry(geometry: &PageGeometry) -> Self {
        let [x1, y1, x2, y2] = geometry.media_box;
        Self {
            origin_x: x1.min(x2),
            origin_y: y1.min(y2),
            height: geometry.height,
        }
    }

    fn point(&self, p: Point) -> (f64, f64) {
        (
            self.origin_x + p.x,
            self.origin_y + flip_y(self.height, p.y, 0.0),
        )
    }

    /// Lower-left corner of a box that hangs below its overlay anchor
    fn box_origin(&self, bounds: &ShapeBounds) -> (f64, f64) {
        (
            self.origin_x + bounds.x,
            self.origin_y + flip_y(self.height, bounds.y, bounds.height),
        )
    }
}

fn stamp_page(
    doc: &mut Document,
    shared: &mut SharedResources,
    page_index: u32,
    page_id: ObjectId,
    annotations: &[&Annotation],
) -> Result<(), PdfCraftError> {
    let geometry = PageGeometry::from_page_id(doc, page_index, page_id)
        .map_err(|e| PdfCraftError::Export(e.to_string()))?;
    let frame = PageFrame::from_geometry(&geometry);

    let fonts_needed: BTreeSet<StandardFont> = annotations
        .iter()
        .filter_map(|a| match &a.kind {
            AnnotationKind::Text { font_family, .. } => Some(StandardFont::for_family(font_family)),
            _ => None,
        })
        .collect();
    let needs_highlight = annotations
        .iter()
        .any(|a| matches!(a.kind, AnnotationKind::Highlight { .. }));

    let mut resources = page_resources(doc, page_id);
    let mut names = ResourceNames::default();

    if !fonts_needed.is_empty() {
        let mut font_dict = sub_dictionary(doc, &resources, b"Font");
        for font in fonts_needed {
            let id = shared.font(doc, font);
            let name = unique_name(&font_dict, font.resource_name());
            font_dict.set(name.clone(), Object::Reference(id));
            names.fonts.insert(font, name);
        }
        resources.set("Font", Object::Dictionary(font_dict));
    }

    if needs_highlight {
        let mut gs_dict = sub_dictionary(doc, &resources, b"ExtGState");
        let id = shared.highlight(doc);
        let name = unique_name(&gs_dict, HIGHLIGHT_GSTATE_NAME);
        gs_dict.set(name.clone(), Object::Reference(id));
        names.highlight = name;
        resources.set("ExtGState", Object::Dictionary(gs_dict));
    }

    let operations: Vec<Operation> = annotations
        .iter()
        .flat_map(|a| annotation_operations(a, &frame, &names))
        .collect();
    let encoded = Content { operations }
        .encode()
        .map_err(|e| PdfCraftError::Export(e.to_string()))?;

    // Existing content runs inside q/Q so its leftover graphics state
    // (CTM, colors) cannot leak into the appended marks
    let existing = existing_content(doc, page_id);
    let mut contents = Vec::with_capacity(existing.len() + 2);
    let mut body = Vec::with_capacity(encoded.len() + 2);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing.into_iter().map(Object::Reference));
        body.extend_from_slice(b"Q\n");
    }
    body.extend_from_slice(&encoded);
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), body));
    contents.push(Object::Reference(stream_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfCraftError::Export(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));

    tracing::debug!(
        page = page_index,
        annotations = annotations.len(),
        "stamped page"
    );
    Ok(())
}

/// The page's effective resource dictionary, copied so it can be set inline
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

fn unique_name(dict: &Dictionary, base: &str) -> Vec<u8> {
    let mut name = base.as_bytes().to_vec();
    let mut suffix = 1;
    while dict.has(&name) {
        name = format!("{}{}", base, suffix).into_bytes();
        suffix += 1;
    }
    name
}

fn existing_content(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    fn references(items: &[Object]) -> Vec<ObjectId> {
        items.iter().filter_map(|o| o.as_reference().ok()).collect()
    }

    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => references(items),
            Ok(_) => vec![*id],
            Err(_) => Vec::new(),
        },
        Ok(Object::Array(items)) => references(items),
        _ => Vec::new(),
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn name(value: &[u8]) -> Object {
    Object::Name(value.to_vec())
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn stroke_paint(annotation: &Annotation) -> Vec<Operation> {
    let (r, g, b) = annotation.color.to_unit_rgb();
    vec![
        op("RG", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        op("w", vec![Object::Integer(annotation.thickness as i64)]),
        op("J", vec![Object::Integer(1)]),
        op("j", vec![Object::Integer(1)]),
    ]
}

fn fill_color(annotation: &Annotation) -> Operation {
    let (r, g, b) = annotation.color.to_unit_rgb();
    op("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)])
}

fn segment(ops: &mut Vec<Operation>, frame: &PageFrame, from: Point, to: Point) {
    let (x1, y1) = frame.point(from);
    let (x2, y2) = frame.point(to);
    ops.push(op("m", vec![real(x1), real(y1)]));
    ops.push(op("l", vec![real(x2), real(y2)]));
    ops.push(op("S", vec![]));
}

fn ellipse_path(ops: &mut Vec<Operation>, cx: f64, cy: f64, rx: f64, ry: f64) {
    let (kx, ky) = (KAPPA * rx, KAPPA * ry);
    let curve = |pts: [f64; 6]| op("c", pts.iter().copied().map(real).collect());

    ops.push(op("m", vec![real(cx + rx), real(cy)]));
    ops.push(curve([cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry]));
    ops.push(curve([cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy]));
    ops.push(curve([cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry]));
    ops.push(curve([cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy]));
    ops.push(op("h", vec![]));
}

/// Content operators for one annotation, wrapped in q/Q
fn annotation_operations(
    annotation: &Annotation,
    frame: &PageFrame,
    names: &ResourceNames,
) -> Vec<Operation> {
    let mut ops = vec![op("q", vec![])];

    match annotation.primitive() {
        Primitive::Polyline(points) => {
            ops.extend(stroke_paint(annotation));
            for pair in points.windows(2) {
                segment(&mut ops, frame, pair[0], pair[1]);
            }
        }
        Primitive::Segment(start, end) => {
            ops.extend(stroke_paint(annotation));
            segment(&mut ops, frame, start, end);
        }
        Primitive::StrokeRect(bounds) => {
            ops.extend(stroke_paint(annotation));
            let (x, y) = frame.box_origin(&bounds);
            ops.push(op(
                "re",
                vec![real(x), real(y), real(bounds.width), real(bounds.height)],
            ));
            ops.push(op("S", vec![]));
        }
        Primitive::StrokeEllipse(bounds) => {
            ops.extend(stroke_paint(annotation));
            let (cx, cy) = frame.point(bounds.center());
            let (rx, ry) = bounds.radii();
            ellipse_path(&mut ops, cx, cy, rx, ry);
            ops.push(op("S", vec![]));
        }
        Primitive::FillRect { bounds, .. } => {
            ops.push(op("gs", vec![name(&names.highlight)]));
            ops.push(fill_color(annotation));
            let (x, y) = frame.box_origin(&bounds);
            ops.push(op(
                "re",
                vec![real(x), real(y), real(bounds.width), real(bounds.height)],
            ));
            ops.push(op("f", vec![]));
        }
        Primitive::Text {
            anchor,
            content,
            font_size,
            font_family,
            alignment,
        } => {
            let font = StandardFont::for_family(font_family);
            let resource = names
                .fonts
                .get(&font)
                .map(Vec::as_slice)
                .unwrap_or(font.resource_name().as_bytes());
            let x = frame.origin_x + anchor.x + alignment_nudge(alignment);
            let y = frame.origin_y + flip_y(frame.height, anchor.y, font_size);

            ops.push(fill_color(annotation));
            ops.push(op("BT", vec![]));
            ops.push(op("Tf", vec![name(resource), real(font_size)]));
            ops.push(op("Td", vec![real(x), real(y)]));
            ops.push(op(
                "Tj",
                vec![Object::String(encode_win_ansi(content), StringFormat::Literal)],
            ));
            ops.push(op("ET", vec![]));
        }
    }

    ops.push(op("Q", vec![]));
    ops
}

/// Encode text for a WinAnsi base-14 font. Characters outside Latin-1 become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ if c.is_whitespace() => b' ',
            _ => b'?',
        })
        .collect()
}

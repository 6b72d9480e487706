//! Page dimensions read from the document tree

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use crate::error::PdfCraftError;

/// US Letter, used when no MediaBox is found anywhere in the page tree
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Parent chains deeper than this are treated as broken
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGeometry {
    /// Zero-based page index
    pub page_index: u32,
    /// MediaBox as [x1, y1, x2, y2]
    pub media_box: [f64; 4],
    /// Unrotated width in points
    pub width: f64,
    /// Unrotated height in points
    pub height: f64,
    /// Rotation in degrees, one of 0, 90, 180, 270
    pub rotation: u16,
}

impl PageGeometry {
    pub fn from_document(doc: &Document, page_index: u32) -> Result<Self, PdfCraftError> {
        let pages = doc.get_pages();
        let page_count = pages.len() as u32;
        let page_id = pages
            .get(&(page_index + 1))
            .copied()
            .ok_or(PdfCraftError::PageOutOfRange {
                page: page_index,
                page_count,
            })?;

        Self::from_page_id(doc, page_index, page_id)
    }

    pub(crate) fn from_page_id(
        doc: &Document,
        page_index: u32,
        page_id: ObjectId,
    ) -> Result<Self, PdfCraftError> {
        let media_box = match inherited_attribute(doc, page_id, b"MediaBox") {
            Some(obj) => parse_rect(doc, obj)?,
            None => DEFAULT_MEDIA_BOX,
        };

        let rotation = inherited_attribute(doc, page_id, b"Rotate")
            .and_then(|obj| resolve(doc, obj).as_i64().ok())
            .map(normalize_rotation)
            .unwrap_or(0);

        Ok(Self {
            page_index,
            media_box,
            width: (media_box[2] - media_box[0]).abs(),
            height: (media_box[3] - media_box[1]).abs(),
            rotation,
        })
    }

    /// Orientation as displayed, after rotation
    pub fn orientation(&self) -> Orientation {
        let (w, h) = if self.rotation % 180 == 0 {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        if w > h {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Geometry of every page, in page order
pub fn page_geometries(doc: &Document) -> Result<Vec<PageGeometry>, PdfCraftError> {
    doc.get_pages()
        .into_iter()
        .enumerate()
        .map(|(index, (_, page_id))| PageGeometry::from_page_id(doc, index as u32, page_id))
        .collect()
}

/// Look up `key` on the page, falling back through its `Parent` chain
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict: &Dictionary = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent_id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        dict = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Follow a reference to its target; other objects are returned unchanged
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn parse_rect(doc: &Document, obj: &Object) -> Result<[f64; 4], PdfCraftError> {
    let arr = resolve(doc, obj)
        .as_array()
        .map_err(|_| PdfCraftError::Load("MediaBox is not an array".into()))?;

    if arr.len() != 4 {
        return Err(PdfCraftError::Load(format!(
            "MediaBox has {} elements, expected 4",
            arr.len()
        )));
    }

    let mut values = [0.0f64; 4];
    for (slot, item) in values.iter_mut().zip(arr) {
        *slot = match resolve(doc, item) {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            _ => {
                return Err(PdfCraftError::Load(
                    "Expected number in MediaBox".into(),
                ))
            }
        };
    }
    Ok(values)
}

fn normalize_rotation(degrees: i64) -> u16 {
    let normalized = degrees.rem_euclid(360);
    if normalized % 90 == 0 {
        normalized as u16
    } else {
        0
    }
}

//! PDF annotation editing
//!
//! This crate holds everything about the editor that does not need a browser:
//! - `annotation`: the annotation records and their store
//! - `overlay` / `hit_test`: drawing to and selecting on the interactive overlay
//! - `export`: baking annotations into page content with lopdf
//! - `session`: the controller that owns editor state
//! - `summarize`: request/response handling for document summaries

pub mod annotation;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod overlay;
pub mod page_info;
pub mod primitive;
pub mod session;
pub mod summarize;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationStore, Color,
    StrokeStyle, TextAlign, Tool,
};
pub use config::{ActiveStyle, EditorConfig, SummaryConfig};
pub use error::{ErrorCategory, PdfCraftError};
pub use export::export_annotated;
pub use geometry::{map_pointer, ClientRect, LogicalSize, Point, ShapeBounds};
pub use hit_test::hit_test;
pub use overlay::{render_overlay, OverlayScene, OverlaySurface, Paint, Shadow};
pub use page_info::{page_geometries, PageGeometry};
pub use session::{EditorSession, ExportJob, ExportedFile, PdfFile, PointerOutcome};
pub use summarize::{summarize, SummaryBackend, SummaryRequest};
pub use validation::{strip_to_signature, validate_pdf, PdfInfo};

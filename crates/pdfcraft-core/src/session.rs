//! Editor session: the single owner of mutable editor state
//!
//! Shells forward pointer events and toolbar actions here and redraw whenever
//! [`EditorSession::revision`] changes. Export and summary requests are guarded
//! so a second trigger while one is in flight is rejected.

use std::rc::Rc;

use crate::annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationStore, Color, TextAlign,
    Tool,
};
use crate::config::{ActiveStyle, EditorConfig};
use crate::error::PdfCraftError;
use crate::export::export_annotated;
use crate::geometry::{Point, ShapeBounds};
use crate::hit_test::hit_test;
use crate::overlay::{render_overlay, OverlayScene, OverlaySurface, PreviewShape};
use crate::page_info::{page_geometries, PageGeometry};
use crate::validation::{load_document, strip_to_signature};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A user-selected file, as received from the host page
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// What a pointer press did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// Pointer tool: the annotation now selected, if any
    Selected(Option<AnnotationId>),
    /// A drag or stroke has started
    GestureStarted,
    /// Text tool: the shell should ask for content, then call `place_text`
    TextRequested(Point),
}

#[derive(Debug, Clone)]
enum Gesture {
    Stroke(Vec<Point>),
    Drag {
        tool: Tool,
        start: Point,
        current: Point,
    },
}

impl Gesture {
    fn kind(&self) -> Option<(Point, AnnotationKind)> {
        match self {
            Gesture::Stroke(points) => Some((
                *points.first()?,
                AnnotationKind::Draw {
                    points: points.clone(),
                },
            )),
            Gesture::Drag {
                tool,
                start,
                current,
            } => {
                let bounds = ShapeBounds::from_drag(*start, *current);
                let kind = match tool {
                    Tool::Line => AnnotationKind::Line {
                        start: *start,
                        end: *current,
                    },
                    Tool::Rectangle => AnnotationKind::Rectangle {
                        width: bounds.width,
                        height: bounds.height,
                    },
                    Tool::Ellipse => AnnotationKind::Ellipse {
                        width: bounds.width,
                        height: bounds.height,
                    },
                    Tool::Highlight => AnnotationKind::Highlight {
                        width: bounds.width,
                        height: bounds.height,
                    },
                    Tool::Pointer | Tool::Text | Tool::Draw => return None,
                };
                Some((*start, kind))
            }
        }
    }
}

/// The exported document, ready for download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Snapshot of what an export needs. Running it does not touch the session, so
/// the annotations stay editable (and intact on failure) while it runs.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pdf: Rc<[u8]>,
    annotations: Vec<Annotation>,
    file_name: String,
}

impl ExportJob {
    pub fn run(&self) -> Result<ExportedFile, PdfCraftError> {
        let bytes = export_annotated(&self.pdf, &self.annotations)?;
        Ok(ExportedFile {
            file_name: self.file_name.clone(),
            mime_type: PDF_MIME_TYPE,
            bytes,
        })
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }
}

pub struct EditorSession {
    config: EditorConfig,
    file_name: String,
    pdf: Rc<[u8]>,
    pages: Vec<PageGeometry>,
    current_page: u32,
    tool: Tool,
    style: ActiveStyle,
    store: AnnotationStore,
    selected: Option<AnnotationId>,
    gesture: Option<Gesture>,
    pending_text: Option<Point>,
    exporting: bool,
    summarizing: bool,
    summary: Option<String>,
    revision: u64,
}

impl EditorSession {
    /// Validate and parse `file`. The session starts on the first page with the
    /// pointer tool and the configured default style.
    pub fn open(file: PdfFile, config: EditorConfig) -> Result<Self, PdfCraftError> {
        config.validate()?;
        let pdf = strip_to_signature(&file.bytes)?;
        let doc = load_document(pdf)?;
        let pages = page_geometries(&doc)?;
        if pages.is_empty() {
            return Err(PdfCraftError::Load("PDF has no pages".to_string()));
        }

        tracing::info!(
            file = %file.name,
            pages = pages.len(),
            bytes = pdf.len(),
            "opened document"
        );

        Ok(Self {
            style: config.defaults.clone(),
            config,
            file_name: file.name,
            pdf: Rc::from(pdf),
            pages,
            current_page: 0,
            tool: Tool::Pointer,
            store: AnnotationStore::new(),
            selected: None,
            gesture: None,
            pending_text: None,
            exporting: false,
            summarizing: false,
            summary: None,
            revision: 0,
        })
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Bumped after every state change that affects what is drawn
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Document bytes with anything before the signature stripped
    pub fn pdf_bytes(&self) -> &[u8] {
        &self.pdf
    }


    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Switch pages. Drops any gesture, pending text, and the selection.
    pub fn go_to_page(&mut self, page_index: u32) -> Result<(), PdfCraftError> {
        if page_index >= self.page_count() {
            return Err(PdfCraftError::PageOutOfRange {
                page: page_index,
                page_count: self.page_count(),
            });
        }
        if page_index != self.current_page {
            self.current_page = page_index;
            self.gesture = None;
            self.pending_text = None;
            self.selected = None;
            self.touch();
        }
        Ok(())
    }

    pub fn next_page(&mut self) -> bool {
        let next = self.current_page + 1;
        next < self.page_count() && self.go_to_page(next).is_ok()
    }

    pub fn previous_page(&mut self) -> bool {
        self.current_page > 0 && self.go_to_page(self.current_page - 1).is_ok()
    }


    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            self.tool = tool;
            self.gesture = None;
            self.pending_text = None;
            self.touch();
        }
    }

    pub fn active_style(&self) -> &ActiveStyle {
        &self.style
    }

    fn patch_selected(&mut self, patch: AnnotationPatch) {
        if let Some(id) = self.selected {
            self.store.update(id, &patch);
        }
        self.touch();
    }

    pub fn set_color(&mut self, color: Color) {
        self.style.color = color;
        self.patch_selected(AnnotationPatch::color(color));
    }

    /// Clamped to `1..=max_thickness`
    pub fn set_thickness(&mut self, thickness: u32) {
        let thickness = thickness.clamp(1, self.config.max_thickness);
        self.style.thickness = thickness;
        self.patch_selected(AnnotationPatch::thickness(thickness));
    }

    pub fn set_font_size(&mut self, font_size: f64) -> Result<(), PdfCraftError> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(PdfCraftError::InvalidAnnotation(format!(
                "font size must be positive, got {}",
                font_size
            )));
        }
        self.style.font_size = font_size;
        self.patch_selected(AnnotationPatch {
            font_size: Some(font_size),
            ..AnnotationPatch::default()
        });
        Ok(())
    }

    pub fn set_font_family(&mut self, font_family: impl Into<String>) {
        let font_family = font_family.into();
        self.style.font_family.clone_from(&font_family);
        self.patch_selected(AnnotationPatch {
            font_family: Some(font_family),
            ..AnnotationPatch::default()
        });
    }

    pub fn set_alignment(&mut self, alignment: TextAlign) {
        self.style.alignment = alignment;
        self.patch_selected(AnnotationPatch {
            alignment: Some(alignment),
            ..AnnotationPatch::default()
        });
    }

    /// Replace the content of the selected text annotation
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.patch_selected(AnnotationPatch {
            content: Some(content.into()),
            ..AnnotationPatch::default()
        });
    }


    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.store.get(id))
    }

    /// Select an annotation (or clear with `None`). Selecting copies the
    /// annotation's style into the active style.
    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected = id.filter(|id| self.store.get(*id).is_some());

        if let Some(annotation) = self.selected_annotation() {
            let mut style = self.style.clone();
            style.color = annotation.color;
            style.thickness = annotation.thickness;
            if let AnnotationKind::Text {
                font_size,
                font_family,
                alignment,
                ..
            } = &annotation.kind
            {
                style.font_size = *font_size;
                style.font_family.clone_from(font_family);
                style.alignment = *alignment;
            }
            self.style = style;
        }
        self.touch();
    }

    /// Remove the selected annotation; every other record keeps its id and order
    pub fn delete_selected(&mut self) -> Option<Annotation> {
        let id = self.selected.take()?;
        let removed = self.store.remove(id);
        self.touch();
        removed
    }


    pub fn annotations(&self) -> &[Annotation] {
        self.store.as_slice()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.store.get(id)
    }

    /// Add a prepared annotation (e.g. loaded from JSON)
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<AnnotationId, PdfCraftError> {
        annotation.validate()?;
        if annotation.page_index() >= self.page_count() {
            return Err(PdfCraftError::PageOutOfRange {
                page: annotation.page_index(),
                page_count: self.page_count(),
            });
        }
        let id = self.store.push(annotation);
        self.touch();
        Ok(id)
    }

    fn create(&mut self, anchor: Point, kind: AnnotationKind) -> Option<AnnotationId> {
        match Annotation::new(self.current_page, anchor, self.style.stroke(), kind) {
            Ok(annotation) => {
                tracing::debug!(id = %annotation.id(), tool = ?annotation.tool(), "annotation created");
                Some(self.store.push(annotation))
            }
            Err(e) => {
                tracing::debug!(error = %e, "discarding gesture");
                None
            }
        }
    }


    pub fn pointer_down(&mut self, pos: Point) -> PointerOutcome {
        self.pending_text = None;
        let outcome = match self.tool {
            Tool::Pointer => {
                let hit = hit_test(
                    self.store.as_slice(),
                    self.current_page,
                    pos,
                    self.config.hit_tolerance,
                );
                self.select(hit);
                PointerOutcome::Selected(hit)
            }
            Tool::Text => {
                self.pending_text = Some(pos);
                PointerOutcome::TextRequested(pos)
            }
            Tool::Draw => {
                self.gesture = Some(Gesture::Stroke(vec![pos]));
                PointerOutcome::GestureStarted
            }
            tool => {
                self.gesture = Some(Gesture::Drag {
                    tool,
                    start: pos,
                    current: pos,
                });
                PointerOutcome::GestureStarted
            }
        };
        self.touch();
        outcome
    }

    /// Returns whether a gesture is in progress (and so the overlay changed)
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        match &mut self.gesture {
            Some(Gesture::Stroke(points)) => points.push(pos),
            Some(Gesture::Drag { current, .. }) => *current = pos,
            None => return false,
        }
        self.touch();
        true
    }

    /// Finish the gesture. The new annotation becomes the selection and is
    /// returned; `None` when nothing was in progress or the gesture was
    /// degenerate (a stroke of one point).
    pub fn pointer_up(&mut self) -> Option<AnnotationId> {
        let gesture = self.gesture.take()?;
        let created = gesture
            .kind()
            .and_then(|(anchor, kind)| self.create(anchor, kind));
        if created.is_some() {
            self.selected = created;
        }
        self.touch();
        created
    }

    /// Position awaiting text content, if the text tool was clicked
    pub fn pending_text(&self) -> Option<Point> {
        self.pending_text
    }

    /// Complete a pending text placement and select the result. Blank content
    /// cancels it.
    pub fn place_text(&mut self, content: &str) -> Option<AnnotationId> {
        let anchor = self.pending_text.take()?;
        let created = if content.trim().is_empty() {
            None
        } else {
            let kind = AnnotationKind::Text {
                content: content.to_string(),
                font_size: self.style.font_size,
                font_family: self.style.font_family.clone(),
                alignment: self.style.alignment,
            };
            self.create(anchor, kind)
        };
        if created.is_some() {
            self.selected = created;
        }
        self.touch();
        created
    }

    pub fn cancel_text(&mut self) {
        if self.pending_text.take().is_some() {
            self.touch();
        }
    }


    /// The in-progress gesture, drawn with the active style
    pub fn preview(&self) -> Option<PreviewShape> {
        let (anchor, kind) = self.gesture.as_ref()?.kind()?;
        Some(PreviewShape {
            kind,
            anchor,
            style: self.style.stroke(),
        })
    }

    pub fn render(&self, surface: &mut dyn OverlaySurface) {
        let preview = self.preview();
        render_overlay(
            surface,
            &OverlayScene {
                annotations: self.store.as_slice(),
                page_index: self.current_page,
                selected: self.selected,
                preview: preview.as_ref(),
            },
        );
    }


    pub fn export_file_name(&self) -> String {
        format!("{}_{}", self.config.export_prefix, self.file_name)
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Snapshot the document and annotations for export. Rejected while an
    /// earlier export has not been finished.
    pub fn begin_export(&mut self) -> Result<ExportJob, PdfCraftError> {
        if self.exporting {
            return Err(PdfCraftError::Busy("Export"));
        }
        self.exporting = true;
        self.touch();
        Ok(ExportJob {
            pdf: Rc::clone(&self.pdf),
            annotations: self.store.as_slice().to_vec(),
            file_name: self.export_file_name(),
        })
    }

    pub fn finish_export(&mut self) {
        self.exporting = false;
        self.touch();
    }

    /// Begin, run and finish an export in one call
    pub fn export(&mut self) -> Result<ExportedFile, PdfCraftError> {
        let job = self.begin_export()?;
        let result = job.run();
        self.finish_export();
        if let Err(e) = &result {
            tracing::warn!(error = %e, "export failed, annotations kept");
        }
        result
    }


    /// Number of leading pages whose text goes into a summary request
    pub fn summary_page_count(&self) -> u32 {
        self.config.summary.max_pages.min(self.page_count())
    }

    pub fn is_summarizing(&self) -> bool {
        self.summarizing
    }

    pub fn begin_summary(&mut self) -> Result<(), PdfCraftError> {
        if self.summarizing {
            return Err(PdfCraftError::Busy("Summary"));
        }
        self.summarizing = true;
        self.touch();
        Ok(())
    }

    pub fn finish_summary(&mut self, summary: String) {
        self.summarizing = false;
        self.summary = Some(summary);
        self.touch();
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn clear_summary(&mut self) {
        self.summary = None;
        self.touch();
    }

    /// End the session; all annotations are discarded
    pub fn close(self) {
        tracing::info!(
            file = %self.file_name,
            annotations = self.store.len(),
            "closed document"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::create_test_pdf;
    use crate::overlay::recording::{Call, RecordingSurface};
    use pretty_assertions::assert_eq;

    fn open(pages: u32) -> EditorSession {
        EditorSession::open(
            PdfFile::new("report.pdf", create_test_pdf(pages)),
            EditorConfig::default(),
        )
        .unwrap()
    }

    fn drag(session: &mut EditorSession, from: (f64, f64), to: (f64, f64)) -> Option<AnnotationId> {
        session.pointer_down(Point::new(from.0, from.1));
        session.pointer_move(Point::new(to.0, to.1));
        session.pointer_up()
    }

    #[test]
    fn test_open_rejects_non_pdf() {
        let err = EditorSession::open(
            PdfFile::new("notes.txt", b"hello world".to_vec()),
            EditorConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PdfCraftError::InvalidInput(_)));
    }

    #[test]
    fn test_open_reports_load_failure() {
        let err = EditorSession::open(
            PdfFile::new("broken.pdf", b"%PDF-1.7\nnot really".to_vec()),
            EditorConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PdfCraftError::Load(_)));
    }

    #[test]
    fn test_open_strips_leading_bytes() {
        let mut bytes = b"\xef\xbb\xbfjunk".to_vec();
        let pdf = create_test_pdf(2);
        bytes.extend_from_slice(&pdf);
        let session =
            EditorSession::open(PdfFile::new("a.pdf", bytes), EditorConfig::default()).unwrap();
        assert_eq!(session.pdf_bytes(), &pdf[..]);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.tool(), Tool::Pointer);
    }

    #[test]
    fn test_rectangle_drag_keeps_signed_extent() {
        let mut session = open(1);
        session.set_tool(Tool::Rectangle);
        let id = drag(&mut session, (10.0, 10.0), (5.0, 30.0)).unwrap();

        let a = session.annotation(id).unwrap();
        assert_eq!(a.anchor(), Point::new(10.0, 10.0));
        assert_eq!(
            a.kind,
            AnnotationKind::Rectangle {
                width: -5.0,
                height: 20.0
            }
        );
        assert_eq!(a.color, Color::rgb(0x25, 0x63, 0xeb));
        assert_eq!(a.thickness, 2);
    }

    #[test]
    fn test_freehand_collects_points() {
        let mut session = open(1);
        session.set_tool(Tool::Draw);
        session.pointer_down(Point::new(0.0, 0.0));
        session.pointer_move(Point::new(1.0, 1.0));
        session.pointer_move(Point::new(2.0, 4.0));
        let id = session.pointer_up().unwrap();

        match &session.annotation(id).unwrap().kind {
            AnnotationKind::Draw { points } => assert_eq!(points.len(), 3),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_single_point_stroke_discarded() {
        let mut session = open(1);
        session.set_tool(Tool::Draw);
        session.pointer_down(Point::new(3.0, 3.0));
        assert_eq!(session.pointer_up(), None);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_pointer_up_without_gesture() {
        let mut session = open(1);
        assert_eq!(session.pointer_up(), None);
        assert!(!session.pointer_move(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_highlight_click_uses_default_extent() {
        let mut session = open(1);
        session.set_tool(Tool::Highlight);
        session.pointer_down(Point::new(40.0, 40.0));
        let id = session.pointer_up().unwrap();
        assert_eq!(
            session.annotation(id).unwrap().kind,
            AnnotationKind::Highlight {
                width: 0.0,
                height: 0.0
            }
        );
    }

    #[test]
    fn test_text_placement_flow() {
        let mut session = open(1);
        session.set_tool(Tool::Text);
        session.set_alignment(TextAlign::Right);
        let outcome = session.pointer_down(Point::new(50.0, 60.0));
        assert_eq!(outcome, PointerOutcome::TextRequested(Point::new(50.0, 60.0)));
        assert_eq!(session.pending_text(), Some(Point::new(50.0, 60.0)));

        let id = session.place_text("Signed").unwrap();
        assert_eq!(session.pending_text(), None);
        match &session.annotation(id).unwrap().kind {
            AnnotationKind::Text {
                content,
                font_size,
                font_family,
                alignment,
            } => {
                assert_eq!(content, "Signed");
                assert_eq!(*font_size, 16.0);
                assert_eq!(font_family, "Inter");
                assert_eq!(*alignment, TextAlign::Right);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_blank_text_cancels() {
        let mut session = open(1);
        session.set_tool(Tool::Text);
        session.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(session.place_text("   "), None);
        assert!(session.annotations().is_empty());
        assert_eq!(session.place_text("late"), None, "nothing pending");
    }

    #[test]
    fn test_pointer_selects_and_syncs_style() {
        let mut session = open(1);
        session.set_tool(Tool::Text);
        session.set_font_size(24.0).unwrap();
        session.set_color(Color::rgb(0xef, 0x44, 0x44));
        session.pointer_down(Point::new(100.0, 100.0));
        let id = session.place_text("Hi").unwrap();
        assert_eq!(session.selected(), Some(id));

        session.select(None);
        session.set_font_size(10.0).unwrap();
        session.set_color(Color::rgb(0, 0, 0));

        session.set_tool(Tool::Pointer);
        let outcome = session.pointer_down(Point::new(110.0, 90.0));
        assert_eq!(outcome, PointerOutcome::Selected(Some(id)));
        assert_eq!(session.active_style().font_size, 24.0);
        assert_eq!(session.active_style().color, Color::rgb(0xef, 0x44, 0x44));

        let outcome = session.pointer_down(Point::new(300.0, 300.0));
        assert_eq!(outcome, PointerOutcome::Selected(None));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_style_change_patches_selection_only() {
        let mut session = open(1);
        session.set_tool(Tool::Rectangle);
        let first = drag(&mut session, (10.0, 10.0), (20.0, 20.0)).unwrap();
        let second = drag(&mut session, (200.0, 200.0), (220.0, 220.0)).unwrap();

        session.select(Some(first));
        session.set_thickness(99);

        assert_eq!(session.annotation(first).unwrap().thickness, 20);
        assert_eq!(session.annotation(second).unwrap().thickness, 2);
        assert_eq!(session.active_style().thickness, 20);

        session.set_thickness(0);
        assert_eq!(session.annotation(first).unwrap().thickness, 1);
    }

    #[test]
    fn test_delete_selected_removes_exactly_one() {
        let mut session = open(1);
        session.set_tool(Tool::Ellipse);
        let a = drag(&mut session, (10.0, 10.0), (20.0, 20.0)).unwrap();
        let b = drag(&mut session, (100.0, 10.0), (120.0, 20.0)).unwrap();
        let c = drag(&mut session, (200.0, 10.0), (220.0, 20.0)).unwrap();

        session.select(Some(b));
        let removed = session.delete_selected().unwrap();
        assert_eq!(removed.id(), b);
        assert_eq!(session.selected(), None);

        let ids: Vec<_> = session.annotations().iter().map(Annotation::id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(session.delete_selected().is_none());
    }

    #[test]
    fn test_select_unknown_id_clears() {
        let mut session = open(1);
        session.select(Some(AnnotationId::new()));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_page_navigation() {
        let mut session = open(3);
        assert!(!session.previous_page());
        assert!(session.next_page());
        assert!(session.next_page());
        assert!(!session.next_page());
        assert_eq!(session.current_page(), 2);

        let err = session.go_to_page(3).unwrap_err();
        assert_eq!(
            err,
            PdfCraftError::PageOutOfRange {
                page: 3,
                page_count: 3
            }
        );
    }

    #[test]
    fn test_annotations_land_on_current_page_and_hit_only_there() {
        let mut session = open(2);
        session.go_to_page(1).unwrap();
        session.set_tool(Tool::Line);
        let id = drag(&mut session, (50.0, 50.0), (80.0, 80.0)).unwrap();
        assert_eq!(session.annotation(id).unwrap().page_index(), 1);

        session.set_tool(Tool::Pointer);
        session.go_to_page(0).unwrap();
        assert_eq!(
            session.pointer_down(Point::new(50.0, 50.0)),
            PointerOutcome::Selected(None)
        );
    }

    #[test]
    fn test_page_change_drops_gesture() {
        let mut session = open(2);
        session.set_tool(Tool::Rectangle);
        session.pointer_down(Point::new(1.0, 1.0));
        session.go_to_page(1).unwrap();
        assert_eq!(session.pointer_up(), None);
    }

    #[test]
    fn test_page_change_clears_selection_and_pending_text() {
        let mut session = open(2);
        session.set_tool(Tool::Rectangle);
        let id = drag(&mut session, (10.0, 10.0), (40.0, 40.0)).unwrap();
        assert_eq!(session.selected(), Some(id));

        session.set_tool(Tool::Text);
        session.pointer_down(Point::new(60.0, 60.0));
        assert!(session.pending_text().is_some());

        session.go_to_page(1).unwrap();
        assert_eq!(session.selected(), None);
        assert_eq!(session.pending_text(), None);
        assert_eq!(session.place_text("late"), None);
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_new_annotation_is_selected_for_styling() {
        let mut session = open(1);
        session.set_tool(Tool::Rectangle);
        let id = drag(&mut session, (10.0, 10.0), (50.0, 50.0)).unwrap();
        assert_eq!(session.selected(), Some(id));

        session.set_thickness(9);
        assert_eq!(session.annotation(id).unwrap().thickness, 9);

        session.set_tool(Tool::Text);
        session.pointer_down(Point::new(80.0, 80.0));
        let text = session.place_text("Note").unwrap();
        assert_eq!(session.selected(), Some(text));

        session.set_color(Color::rgb(0x10, 0xb9, 0x81));
        assert_eq!(session.annotation(text).unwrap().color, Color::rgb(0x10, 0xb9, 0x81));
        assert_eq!(session.annotation(id).unwrap().thickness, 9);
        assert_eq!(session.annotation(id).unwrap().color, Color::rgb(0x25, 0x63, 0xeb));
    }

    #[test]
    fn test_discarded_gesture_keeps_selection() {
        let mut session = open(1);
        session.set_tool(Tool::Ellipse);
        let id = drag(&mut session, (10.0, 10.0), (30.0, 30.0)).unwrap();

        session.set_tool(Tool::Draw);
        session.pointer_down(Point::new(3.0, 3.0));
        assert_eq!(session.pointer_up(), None);
        assert_eq!(session.selected(), Some(id));
    }

    #[test]
    fn test_revision_bumps_on_change() {
        let mut session = open(1);
        let before = session.revision();
        session.set_tool(Tool::Draw);
        assert!(session.revision() > before);
        let before = session.revision();
        session.pointer_down(Point::new(1.0, 1.0));
        session.pointer_move(Point::new(2.0, 2.0));
        assert!(session.revision() >= before + 2);
    }

    #[test]
    fn test_render_includes_preview() {
        let mut session = open(1);
        session.set_tool(Tool::Rectangle);
        drag(&mut session, (10.0, 10.0), (20.0, 20.0));
        session.pointer_down(Point::new(30.0, 30.0));
        session.pointer_move(Point::new(40.0, 50.0));

        let mut surface = RecordingSurface::default();
        session.render(&mut surface);
        assert_eq!(
            surface.shapes(),
            vec![
                &Call::Rect(ShapeBounds::new(10.0, 10.0, 10.0, 10.0)),
                &Call::Rect(ShapeBounds::new(30.0, 30.0, 10.0, 20.0)),
            ]
        );
    }

    #[test]
    fn test_export_names_file_and_keeps_annotations() {
        let mut session = open(1);
        session.set_tool(Tool::Rectangle);
        drag(&mut session, (10.0, 10.0), (20.0, 20.0));

        let exported = session.export().unwrap();
        assert_eq!(exported.file_name, "pdfcraft_report.pdf");
        assert_eq!(exported.mime_type, "application/pdf");
        assert!(exported.bytes.starts_with(b"%PDF-"));
        assert_eq!(session.annotations().len(), 1);
        assert!(!session.is_exporting());
    }

    #[test]
    fn test_export_guard_rejects_reentry() {
        let mut session = open(1);
        let job = session.begin_export().unwrap();
        assert_eq!(
            session.begin_export().err(),
            Some(PdfCraftError::Busy("Export"))
        );
        assert!(job.run().is_ok());
        session.finish_export();
        assert!(session.begin_export().is_ok());
    }

    #[test]
    fn test_export_twice_is_identical() {
        let mut session = open(2);
        session.set_tool(Tool::Highlight);
        drag(&mut session, (10.0, 10.0), (110.0, 25.0));
        let first = session.export().unwrap();
        let second = session.export().unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_add_annotation_checks_page() {
        let mut session = open(1);
        let annotation = Annotation::new(
            4,
            Point::new(1.0, 1.0),
            session.active_style().stroke(),
            AnnotationKind::Rectangle {
                width: 1.0,
                height: 1.0,
            },
        )
        .unwrap();
        assert!(matches!(
            session.add_annotation(annotation),
            Err(PdfCraftError::PageOutOfRange { .. })
        ));
    }

    #[test]
    fn test_summary_guard() {
        let mut session = open(8);
        assert_eq!(session.summary_page_count(), 5);
        session.begin_summary().unwrap();
        assert!(session.is_summarizing());
        assert_eq!(session.begin_summary(), Err(PdfCraftError::Busy("Summary")));
        session.finish_summary("Short".into());
        assert!(!session.is_summarizing());
        assert_eq!(session.summary(), Some("Short"));
        session.clear_summary();
        assert_eq!(session.summary(), None);
    }
}

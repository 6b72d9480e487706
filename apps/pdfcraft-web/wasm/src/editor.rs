//! Browser editor: wires DOM events, pdf.js and the overlay canvas to an
//! `EditorSession`.
//!
//! The session lives in an `Rc<RefCell<_>>` shared with in-flight promises.
//! Borrows are only taken for synchronous state changes, never across an
//! `.await`.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use pdfcraft_core::annotation::{Color, TextAlign, Tool};
use pdfcraft_core::config::EditorConfig;
use pdfcraft_core::error::PdfCraftError;
use pdfcraft_core::geometry::{map_pointer, ClientRect, LogicalSize, Point};
use pdfcraft_core::session::{EditorSession, PdfFile, PointerOutcome};
use pdfcraft_core::summarize::{collect_document_text, summarize, SummaryRequest};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::HtmlCanvasElement;

use crate::canvas::CanvasSurface;
use crate::download::download_bytes;
use crate::gemini::GeminiBackend;
use crate::pdf_viewer::{ensure_pdf_js, PdfViewer};

/// `{"category": ..., "message": ...}` so the page can tell a rejected file
/// from a failed export without parsing messages
fn error_payload(e: &PdfCraftError) -> serde_json::Value {
    json!({
        "category": e.category(),
        "message": e.to_string(),
    })
}

pub(crate) fn js_err(e: PdfCraftError) -> JsValue {
    JsValue::from_str(&error_payload(&e).to_string())
}

struct EditorState {
    session: RefCell<EditorSession>,
    viewer: PdfViewer,
    page_canvas: HtmlCanvasElement,
    overlay: HtmlCanvasElement,
}

impl EditorState {
    /// Pointer position in overlay pixels; the element is measured on every
    /// event since layout can change between events.
    fn overlay_point(&self, client_x: f64, client_y: f64) -> Option<Point> {
        let rect = self.overlay.get_bounding_client_rect();
        map_pointer(
            Point::new(client_x, client_y),
            ClientRect::new(rect.left(), rect.top(), rect.width(), rect.height()),
            LogicalSize::new(self.overlay.width() as f64, self.overlay.height() as f64),
        )
    }

    fn redraw(&self) -> Result<(), JsValue> {
        let mut surface = CanvasSurface::from_canvas(&self.overlay)?;
        self.session.borrow().render(&mut surface);
        Ok(())
    }
}

/// Rasterize the current page, then match the overlay to it and redraw
async fn render_current_page(state: Rc<EditorState>) -> Result<(), JsValue> {
    let (page, scale) = {
        let session = state.session.borrow();
        (session.current_page(), session.config().render_scale)
    };
    state
        .viewer
        .render_page(page, &state.page_canvas, scale)
        .await?;
    state.overlay.set_width(state.page_canvas.width());
    state.overlay.set_height(state.page_canvas.height());
    state.redraw()
}

async fn run_summary(state: Rc<EditorState>, api_key: String) -> Result<String, JsValue> {
    let (page_count, config) = {
        let mut session = state.session.borrow_mut();
        session.begin_summary().map_err(js_err)?;
        (session.summary_page_count(), session.config().summary.clone())
    };

    let mut page_texts = Vec::with_capacity(page_count as usize);
    for page in 0..page_count {
        match state.viewer.page_text(page).await {
            Ok(text) => page_texts.push(text),
            Err(e) => {
                web_sys::console::error_1(&e);
                let text = config.error_placeholder.clone();
                state.session.borrow_mut().finish_summary(text.clone());
                return Ok(text);
            }
        }
    }

    let request = SummaryRequest::new(&collect_document_text(&page_texts), &config);
    let backend = GeminiBackend::new(config.endpoint.clone(), api_key);
    let text = summarize(&backend, &request, &config).await;
    state.session.borrow_mut().finish_summary(text.clone());
    Ok(text)
}

/// `{"kind": ...}` description of a pointer press for the page script
fn outcome_json(outcome: &PointerOutcome) -> serde_json::Value {
    match outcome {
        PointerOutcome::Selected(id) => json!({
            "kind": "selected",
            "id": id.map(|id| id.to_string()),
        }),
        PointerOutcome::GestureStarted => json!({ "kind": "gesture_started" }),
        PointerOutcome::TextRequested(pos) => json!({
            "kind": "text_requested",
            "x": pos.x,
            "y": pos.y,
        }),
    }
}

fn parse_editor_config(config_json: Option<&str>) -> Result<EditorConfig, PdfCraftError> {
    match config_json {
        Some(json) if !json.trim().is_empty() => EditorConfig::from_json(json),
        _ => Ok(EditorConfig::default()),
    }
}

/// Annotation editor bound to a page canvas and an overlay canvas
#[wasm_bindgen]
pub struct PdfCraftEditor {
    state: Rc<EditorState>,
}

impl PdfCraftEditor {
    fn rerender_if(&self, moved: bool) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            if moved {
                render_current_page(state).await?;
            }
            Ok(JsValue::from_bool(moved))
        })
    }
}

#[wasm_bindgen]
impl PdfCraftEditor {
    /// Validate the file, load it into pdf.js and render the first page.
    /// `config_json` is an optional `EditorConfig` document.
    pub async fn open(
        name: String,
        bytes: Vec<u8>,
        page_canvas: HtmlCanvasElement,
        overlay: HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<PdfCraftEditor, JsValue> {
        let config = parse_editor_config(config_json.as_deref()).map_err(js_err)?;
        let worker_src = config.pdfjs_worker_src.clone();
        let session = EditorSession::open(PdfFile::new(name, bytes), config).map_err(js_err)?;

        ensure_pdf_js(&worker_src).await?;
        let viewer = PdfViewer::load(session.pdf_bytes()).await?;
        if viewer.page_count() != session.page_count() {
            web_sys::console::warn_1(
                &format!(
                    "page count mismatch: pdf.js {} vs parser {}",
                    viewer.page_count(),
                    session.page_count()
                )
                .into(),
            );
        }

        let state = Rc::new(EditorState {
            session: RefCell::new(session),
            viewer,
            page_canvas,
            overlay,
        });
        render_current_page(Rc::clone(&state)).await?;
        web_sys::console::log_1(&"PDFCraft editor ready".into());
        Ok(PdfCraftEditor { state })
    }

    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.state.session.borrow().file_name().to_string()
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.state.session.borrow().page_count()
    }

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.state.session.borrow().current_page()
    }

    /// Bumped after every state change
    #[wasm_bindgen(getter)]
    pub fn revision(&self) -> f64 {
        self.state.session.borrow().revision() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.state.session.borrow().tool().as_str().to_string()
    }

    /// The editor configuration, for building the palette and font pickers
    #[wasm_bindgen(js_name = configJson)]
    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.state.session.borrow().config())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }


    /// Resolves once the page has been rendered
    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&self, page_index: u32) -> Result<Promise, JsValue> {
        self.state
            .session
            .borrow_mut()
            .go_to_page(page_index)
            .map_err(js_err)?;
        let state = Rc::clone(&self.state);
        Ok(future_to_promise(async move {
            render_current_page(state).await?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Resolves to whether the page changed
    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&self) -> Promise {
        let moved = self.state.session.borrow_mut().next_page();
        self.rerender_if(moved)
    }

    #[wasm_bindgen(js_name = previousPage)]
    pub fn previous_page(&self) -> Promise {
        let moved = self.state.session.borrow_mut().previous_page();
        self.rerender_if(moved)
    }


    /// Returns a JSON outcome, or `None` when the overlay has no size yet
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, client_x: f64, client_y: f64) -> Result<Option<String>, JsValue> {
        let Some(pos) = self.state.overlay_point(client_x, client_y) else {
            return Ok(None);
        };
        let outcome = self.state.session.borrow_mut().pointer_down(pos);
        self.state.redraw()?;
        Ok(Some(outcome_json(&outcome).to_string()))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, client_x: f64, client_y: f64) -> Result<bool, JsValue> {
        let Some(pos) = self.state.overlay_point(client_x, client_y) else {
            return Ok(false);
        };
        let changed = self.state.session.borrow_mut().pointer_move(pos);
        if changed {
            self.state.redraw()?;
        }
        Ok(changed)
    }

    /// Returns the id of the created annotation, if any
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self) -> Result<Option<String>, JsValue> {
        let created = self.state.session.borrow_mut().pointer_up();
        self.state.redraw()?;
        Ok(created.map(|id| id.to_string()))
    }

    /// Complete a text placement requested by `pointerDown`
    #[wasm_bindgen(js_name = placeText)]
    pub fn place_text(&self, content: &str) -> Result<Option<String>, JsValue> {
        let created = self.state.session.borrow_mut().place_text(content);
        self.state.redraw()?;
        Ok(created.map(|id| id.to_string()))
    }

    #[wasm_bindgen(js_name = cancelText)]
    pub fn cancel_text(&self) {
        self.state.session.borrow_mut().cancel_text();
    }


    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&self, name: &str) -> Result<(), JsValue> {
        let tool: Tool = name.parse().map_err(js_err)?;
        self.state.session.borrow_mut().set_tool(tool);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&self, hex: &str) -> Result<(), JsValue> {
        let color = Color::from_hex(hex).map_err(js_err)?;
        self.state.session.borrow_mut().set_color(color);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = setThickness)]
    pub fn set_thickness(&self, thickness: u32) -> Result<(), JsValue> {
        self.state.session.borrow_mut().set_thickness(thickness);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&self, font_size: f64) -> Result<(), JsValue> {
        self.state
            .session
            .borrow_mut()
            .set_font_size(font_size)
            .map_err(js_err)?;
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = setFontFamily)]
    pub fn set_font_family(&self, family: &str) -> Result<(), JsValue> {
        self.state.session.borrow_mut().set_font_family(family);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = setAlignment)]
    pub fn set_alignment(&self, alignment: &str) -> Result<(), JsValue> {
        let alignment: TextAlign = alignment.parse().map_err(js_err)?;
        self.state.session.borrow_mut().set_alignment(alignment);
        self.state.redraw()
    }

    /// Replace the content of the selected text annotation
    #[wasm_bindgen(js_name = setContent)]
    pub fn set_content(&self, content: &str) -> Result<(), JsValue> {
        self.state.session.borrow_mut().set_content(content);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = activeStyleJson)]
    pub fn active_style_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.state.session.borrow().active_style())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }


    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&self) -> Result<bool, JsValue> {
        let removed = self.state.session.borrow_mut().delete_selected().is_some();
        self.state.redraw()?;
        Ok(removed)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) -> Result<(), JsValue> {
        self.state.session.borrow_mut().select(None);
        self.state.redraw()
    }

    #[wasm_bindgen(js_name = selectedJson)]
    pub fn selected_json(&self) -> Result<Option<String>, JsValue> {
        self.state
            .session
            .borrow()
            .selected_annotation()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = annotationsJson)]
    pub fn annotations_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.state.session.borrow().annotations())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }


    #[wasm_bindgen(getter, js_name = isExporting)]
    pub fn is_exporting(&self) -> bool {
        self.state.session.borrow().is_exporting()
    }

    /// Stamp the annotations into the document and download the result.
    /// `isExporting` stays true until the returned promise settles; a second
    /// call in that window is rejected. On failure the annotations are left
    /// as they were.
    #[wasm_bindgen(js_name = exportAndDownload)]
    pub fn export_and_download(&self) -> Result<Promise, JsValue> {
        let job = self.state.session.borrow_mut().begin_export().map_err(js_err)?;
        let state = Rc::clone(&self.state);
        Ok(future_to_promise(async move {
            // Yield once so the page sees the pending export before the run
            let _ = JsFuture::from(Promise::resolve(&JsValue::UNDEFINED)).await;
            let result = job.run();
            state.session.borrow_mut().finish_export();

            let file = result.map_err(js_err)?;
            download_bytes(&file.bytes, &file.file_name, file.mime_type)?;
            web_sys::console::log_1(
                &format!(
                    "exported {} annotations to {}",
                    job.annotation_count(),
                    file.file_name
                )
                .into(),
            );
            Ok(JsValue::UNDEFINED)
        }))
    }


    #[wasm_bindgen(getter, js_name = isSummarizing)]
    pub fn is_summarizing(&self) -> bool {
        self.state.session.borrow().is_summarizing()
    }

    #[wasm_bindgen(getter)]
    pub fn summary(&self) -> Option<String> {
        self.state.session.borrow().summary().map(str::to_string)
    }

    #[wasm_bindgen(js_name = clearSummary)]
    pub fn clear_summary(&self) {
        self.state.session.borrow_mut().clear_summary();
    }

    /// Resolves to the summary text (or a placeholder); rejects only when a
    /// summary is already in flight or no key was given.
    pub fn summarize(&self, api_key: String) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            if api_key.trim().is_empty() {
                return Err(JsValue::from_str("An API key is required for summaries"));
            }
            run_summary(state, api_key).await.map(JsValue::from)
        })
    }

    /// Discard the session and its annotations
    pub fn close(self) {
        match Rc::try_unwrap(self.state) {
            Ok(state) => state.session.into_inner().close(),
            Err(_) => web_sys::console::warn_1(&"closing editor with work in flight".into()),
        }
    }
}

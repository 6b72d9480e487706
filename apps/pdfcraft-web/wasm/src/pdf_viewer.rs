//! pdf.js integration: page rasterization and text extraction

use std::sync::OnceLock;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

// External JavaScript functions from pdf-bridge.js
#[wasm_bindgen(module = "/www/js/pdf-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = initPdfJs)]
    async fn init_pdf_js_internal(worker_src: &str) -> JsValue;

    #[wasm_bindgen(js_name = loadDocument)]
    async fn load_document_internal(data: Uint8Array) -> JsValue;

    #[wasm_bindgen(js_name = renderPage)]
    async fn render_page_internal(page_num: u32, canvas: &HtmlCanvasElement, scale: f64) -> JsValue;

    #[wasm_bindgen(js_name = getPageText)]
    async fn get_page_text_internal(page_num: u32) -> JsValue;
}

/// pdf.js worker location; set once per page load
static WORKER_SRC: OnceLock<String> = OnceLock::new();

/// Record `src` as the worker location.
///
/// Returns `Ok(true)` on the first call, `Ok(false)` when the same location was
/// already set, and an error if a different location was set before.
fn claim_worker_src(cell: &OnceLock<String>, src: &str) -> Result<bool, String> {
    let mut first = false;
    let current = cell.get_or_init(|| {
        first = true;
        src.to_string()
    });
    if current == src {
        Ok(first)
    } else {
        Err(format!(
            "pdf.js worker already initialized with {}, refusing {}",
            current, src
        ))
    }
}

/// Point pdf.js at its worker. Must run before the first document load;
/// repeated calls with the same location are no-ops.
pub async fn ensure_pdf_js(worker_src: &str) -> Result<(), JsValue> {
    if claim_worker_src(&WORKER_SRC, worker_src).map_err(|e| JsValue::from_str(&e))? {
        init_pdf_js_internal(worker_src).await;
        web_sys::console::log_1(&format!("pdf.js worker: {}", worker_src).into());
    }
    Ok(())
}

/// The document as seen by pdf.js. Pages are addressed zero-based here and
/// translated to pdf.js numbering at the bridge.
#[derive(Debug, Default)]
pub struct PdfViewer {
    page_count: u32,
}

impl PdfViewer {
    pub async fn load(bytes: &[u8]) -> Result<Self, JsValue> {
        let data = Uint8Array::new_with_length(bytes.len() as u32);
        data.copy_from(bytes);

        let doc = load_document_internal(data).await;
        if doc.is_undefined() || doc.is_null() {
            return Err(JsValue::from_str("Failed to load PDF document"));
        }

        let page_count = Reflect::get(&doc, &JsValue::from_str("numPages"))
            .ok()
            .and_then(|n| n.as_f64())
            .map(|n| n as u32)
            .unwrap_or(0);

        Ok(Self { page_count })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    fn check_page(&self, page_index: u32) -> Result<(), JsValue> {
        if page_index >= self.page_count {
            return Err(JsValue::from_str(&format!(
                "Invalid page index: {} (document has {} pages)",
                page_index, self.page_count
            )));
        }
        Ok(())
    }

    /// Rasterize a page; the canvas is resized to the scaled viewport
    pub async fn render_page(
        &self,
        page_index: u32,
        canvas: &HtmlCanvasElement,
        scale: f64,
    ) -> Result<(), JsValue> {
        self.check_page(page_index)?;
        let result = render_page_internal(page_index + 1, canvas, scale).await;
        if result.is_null() || result.is_undefined() {
            return Err(JsValue::from_str("Failed to render page"));
        }
        Ok(())
    }

    pub async fn page_text(&self, page_index: u32) -> Result<String, JsValue> {
        self.check_page(page_index)?;
        Ok(get_page_text_internal(page_index + 1)
            .await
            .as_string()
            .unwrap_or_default())
    }
}

//! WASM bindings for the PDFCraft annotation editor
//!
//! All editor state lives in Rust (`PdfCraftEditor` wrapping an
//! `EditorSession`). JavaScript forwards DOM events, supplies the two canvases
//! and prompts the user for text content.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfCraftEditor } from './pkg/pdfcraft_wasm.js';
//!
//! await init();
//! const editor = await PdfCraftEditor.open(file.name, bytes, pageCanvas, overlay);
//! overlay.onpointerdown = (e) => {
//!     const outcome = JSON.parse(editor.pointerDown(e.clientX, e.clientY));
//!     if (outcome.kind === 'text_requested') {
//!         const text = prompt('Text');
//!         text ? editor.placeText(text) : editor.cancelText();
//!     }
//! };
//! overlay.onpointermove = (e) => editor.pointerMove(e.clientX, e.clientY);
//! overlay.onpointerup = () => editor.pointerUp();
//! editor.setTool('rectangle');
//! await editor.exportAndDownload();
//! ```

pub mod canvas;
pub mod download;
pub mod editor;
pub mod gemini;
pub mod pdf_viewer;

use wasm_bindgen::prelude::*;

pub use editor::PdfCraftEditor;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"PDFCraft WASM initialized".into());
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get PDF info without opening an editor
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pdfcraft_core::validate_pdf(bytes).map_err(editor::js_err)?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}

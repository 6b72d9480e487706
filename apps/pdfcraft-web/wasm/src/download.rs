//! Browser download of generated bytes

use js_sys::{Array, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Offer `bytes` to the user as a file download via a temporary object URL
pub fn download_bytes(bytes: &[u8], file_name: &str, mime_type: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;

    let data = Uint8Array::new_with_length(bytes.len() as u32);
    data.copy_from(bytes);
    let parts = Array::new();
    parts.push(&data.buffer());

    let props = BlobPropertyBag::new();
    props.set_type(mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &props)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    Url::revoke_object_url(&url)
}

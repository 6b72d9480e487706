//! Summary backend over the Gemini REST API

use async_trait::async_trait;
use pdfcraft_core::error::PdfCraftError;
use pdfcraft_core::summarize::{parse_generate_content_response, SummaryBackend, SummaryRequest};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

pub struct GeminiBackend {
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, model: &str) -> String {
        generate_content_url(&self.endpoint, model, &self.api_key)
    }

    async fn post(&self, request: &SummaryRequest) -> Result<String, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(
            &request.to_generate_content_body().to_string(),
        ));

        let req = Request::new_with_str_and_init(&self.url(&request.model), &opts)?;
        req.headers().set("Content-Type", "application/json")?;

        let response = JsFuture::from(window.fetch_with_request(&req)).await?;
        let response: Response = response.dyn_into()?;
        let status = response.status();
        let body = JsFuture::from(response.text()?).await?;
        let body = body.as_string().unwrap_or_default();

        if !response.ok() && body.is_empty() {
            return Err(JsValue::from_str(&format!(
                "Summary request failed: {}",
                status
            )));
        }
        Ok(body)
    }
}

/// `{endpoint}/models/{model}:generateContent?key={api_key}`
pub fn generate_content_url(endpoint: &str, model: &str, api_key: &str) -> String {
    format!(
        "{}/models/{}:generateContent?key={}",
        endpoint.trim_end_matches('/'),
        model,
        api_key
    )
}

#[async_trait(?Send)]
impl SummaryBackend for GeminiBackend {
    async fn generate(&self, request: &SummaryRequest) -> Result<Option<String>, PdfCraftError> {
        let body = self.post(request).await.map_err(|e| {
            PdfCraftError::Summary(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
        })?;
        parse_generate_content_response(&body)
    }
}

//! Document summary via a generative-text service
//!
//! Request building and response parsing are plain functions so they can be
//! tested without a network. The transport lives behind [`SummaryBackend`].

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SummaryConfig;
use crate::error::PdfCraftError;

/// Join per-page text runs into one document string
pub fn collect_document_text<I, S>(page_texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    page_texts
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
    /// Characters of document text included in the prompt
    pub document_chars: usize,
}

impl SummaryRequest {
    pub fn new(document_text: &str, config: &SummaryConfig) -> Self {
        let excerpt = truncate_chars(document_text.trim(), config.char_budget);
        Self {
            model: config.model.clone(),
            prompt: format!("{}{}", config.prompt_prefix, excerpt),
            system_instruction: config.system_instruction.clone(),
            document_chars: excerpt.chars().count(),
        }
    }

    /// JSON body for `models/{model}:generateContent`
    pub fn to_generate_content_body(&self) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": self.prompt }]
            }]
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Text of the first candidate, or `None` when the service returned nothing usable
pub fn parse_generate_content_response(body: &str) -> Result<Option<String>, PdfCraftError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| PdfCraftError::Summary(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(PdfCraftError::Summary(error.message));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Transport to the summary service. One attempt per call, no retries.
#[async_trait(?Send)]
pub trait SummaryBackend {
    async fn generate(&self, request: &SummaryRequest) -> Result<Option<String>, PdfCraftError>;
}

/// Ask the backend for a summary. Never fails: an empty answer or an error
/// degrades to the configured placeholder text.
pub async fn summarize(
    backend: &dyn SummaryBackend,
    request: &SummaryRequest,
    config: &SummaryConfig,
) -> String {
    if request.document_chars == 0 {
        tracing::debug!("document has no extractable text, skipping summary request");
        return config.empty_placeholder.clone();
    }

    match backend.generate(request).await {
        Ok(Some(text)) => {
            tracing::info!(chars = text.len(), model = %request.model, "summary generated");
            text
        }
        Ok(None) => config.empty_placeholder.clone(),
        Err(e) => {
            tracing::warn!(error = %e, "summary request failed");
            config.error_placeholder.clone()
        }
    }
}

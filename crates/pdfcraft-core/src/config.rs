//! Editor configuration
//!
//! Every field has a default, so `{}` is a valid configuration and callers only
//! spell out what they change.

use serde::{Deserialize, Serialize};

use crate::annotation::{Color, StrokeStyle, TextAlign};
use crate::error::PdfCraftError;
use crate::hit_test::DEFAULT_HIT_TOLERANCE;

pub const DEFAULT_PDFJS_WORKER_SRC: &str =
    "https://esm.sh/pdfjs-dist@4.0.379/build/pdf.worker.mjs";

/// Style applied to newly created annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveStyle {
    pub color: Color,
    pub thickness: u32,
    pub font_size: f64,
    pub font_family: String,
    pub alignment: TextAlign,
}

impl Default for ActiveStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x25, 0x63, 0xeb),
            thickness: 2,
            font_size: 16.0,
            font_family: "Inter".to_string(),
            alignment: TextAlign::Left,
        }
    }
}

impl ActiveStyle {
    pub fn stroke(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color,
            thickness: self.thickness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub model: String,
    /// Base URL of the generative language REST API
    pub endpoint: String,
    /// Maximum characters of document text sent to the model
    pub char_budget: usize,
    /// Text is collected from at most this many leading pages
    pub max_pages: u32,
    pub prompt_prefix: String,
    pub system_instruction: String,
    pub empty_placeholder: String,
    pub error_placeholder: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            char_budget: 10_000,
            max_pages: 5,
            prompt_prefix: "Please provide a concise and professional summary of the following document text:\n\n".to_string(),
            system_instruction: "You are a professional document assistant. Summarize content accurately and briefly.".to_string(),
            empty_placeholder: "No summary could be generated.".to_string(),
            error_placeholder: "Error generating summary. Please ensure your API key is active.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Page rasterization scale; overlay pixels per page point
    pub render_scale: f64,
    /// Per-axis selection distance in overlay pixels
    pub hit_tolerance: f64,
    pub defaults: ActiveStyle,
    pub palette: Vec<Color>,
    pub font_families: Vec<String>,
    pub max_thickness: u32,
    /// Exported files are named `<prefix>_<original name>`
    pub export_prefix: String,
    pub pdfjs_worker_src: String,
    pub summary: SummaryConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            defaults: ActiveStyle::default(),
            palette: vec![
                Color::rgb(0x25, 0x63, 0xeb),
                Color::rgb(0xef, 0x44, 0x44),
                Color::rgb(0x10, 0xb9, 0x81),
                Color::rgb(0x00, 0x00, 0x00),
            ],
            font_families: vec!["Inter".into(), "Courier".into(), "Serif".into()],
            max_thickness: 20,
            export_prefix: "pdfcraft".to_string(),
            pdfjs_worker_src: DEFAULT_PDFJS_WORKER_SRC.to_string(),
            summary: SummaryConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, PdfCraftError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PdfCraftError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PdfCraftError> {
        let fail = |msg: &str| Err(PdfCraftError::Config(msg.to_string()));

        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return fail("render_scale must be positive");
        }
        if !(self.hit_tolerance.is_finite() && self.hit_tolerance > 0.0) {
            return fail("hit_tolerance must be positive");
        }
        if self.max_thickness == 0 {
            return fail("max_thickness must be at least 1");
        }
        if self.defaults.thickness == 0 || self.defaults.thickness > self.max_thickness {
            return fail("default thickness must be between 1 and max_thickness");
        }
        if !(self.defaults.font_size.is_finite() && self.defaults.font_size > 0.0) {
            return fail("default font_size must be positive");
        }
        if self.palette.is_empty() {
            return fail("palette must not be empty");
        }
        if self.export_prefix.trim().is_empty() {
            return fail("export_prefix must not be empty");
        }
        if self.summary.char_budget == 0 || self.summary.max_pages == 0 {
            return fail("summary char_budget and max_pages must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.defaults.color.to_hex(), "#2563eb");
        assert_eq!(config.hit_tolerance, 20.0);
        assert_eq!(config.summary.char_budget, 10_000);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EditorConfig::from_json(
            r##"{"render_scale": 2.0, "defaults": {"color": "#ef4444"}, "summary": {"max_pages": 3}}"##,
        )
        .unwrap();
        assert_eq!(config.render_scale, 2.0);
        assert_eq!(config.defaults.color, Color::rgb(0xef, 0x44, 0x44));
        assert_eq!(config.defaults.thickness, 2);
        assert_eq!(config.summary.max_pages, 3);
        assert_eq!(config.summary.char_budget, 10_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EditorConfig::from_json(r#"{"render_scale": 0}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"max_thickness": 1, "defaults": {"thickness": 2}}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"palette": []}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"defaults": {"color": "blue"}}"#).is_err());
    }
}

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfCraftError {
    #[error("Invalid PDF: {0}")]
    InvalidInput(String),

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Failed to export PDF: {0}")]
    Export(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("Summary service failed: {0}")]
    Summary(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Where a failure sits in the editor's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Wrong file type or missing signature; nothing changed.
    InputRejected,
    /// Document could not be parsed; the editor does not open.
    LoadFailed,
    /// Export failed; annotations are preserved and the user may retry.
    ExportFailed,
    /// External service failed; degrades to a placeholder.
    ServiceFailed,
    /// Caller misuse (bad page, guarded action, invalid record).
    Usage,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InputRejected => "input_rejected",
            ErrorCategory::LoadFailed => "load_failed",
            ErrorCategory::ExportFailed => "export_failed",
            ErrorCategory::ServiceFailed => "service_failed",
            ErrorCategory::Usage => "usage",
        }
    }
}

impl PdfCraftError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PdfCraftError::InvalidInput(_) => ErrorCategory::InputRejected,
            PdfCraftError::Load(_) => ErrorCategory::LoadFailed,
            PdfCraftError::Export(_) => ErrorCategory::ExportFailed,
            PdfCraftError::Summary(_) => ErrorCategory::ServiceFailed,
            PdfCraftError::InvalidAnnotation(_)
            | PdfCraftError::PageOutOfRange { .. }
            | PdfCraftError::Busy(_)
            | PdfCraftError::Serialization(_)
            | PdfCraftError::Config(_) => ErrorCategory::Usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            PdfCraftError::InvalidInput("x".into()).category(),
            ErrorCategory::InputRejected
        );
        assert_eq!(
            PdfCraftError::Load("x".into()).category(),
            ErrorCategory::LoadFailed
        );
        assert_eq!(
            PdfCraftError::Export("x".into()).category(),
            ErrorCategory::ExportFailed
        );
        assert_eq!(
            PdfCraftError::Busy("Export").category(),
            ErrorCategory::Usage
        );
    }

    #[test]
    fn test_category_names_match_serde() {
        for category in [
            ErrorCategory::InputRejected,
            ErrorCategory::LoadFailed,
            ErrorCategory::ExportFailed,
            ErrorCategory::ServiceFailed,
            ErrorCategory::Usage,
        ] {
            assert_eq!(
                serde_json::to_value(category).unwrap(),
                serde_json::Value::String(category.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_display_messages() {
        let err = PdfCraftError::PageOutOfRange {
            page: 4,
            page_count: 3,
        };
        assert_eq!(err.to_string(), "Page 4 does not exist (document has 3 pages)");
        assert_eq!(
            PdfCraftError::Busy("Export").to_string(),
            "Export is already in progress"
        );
    }
}

//! File boundary checks and document info
//!
//! Uploaded bytes are accepted only if a `%PDF-` signature starts within the
//! first kilobyte. Anything in front of it (mail headers, BOMs, download junk) is
//! stripped before the bytes reach the parser.

use lopdf::Document;
use serde::Serialize;

use crate::error::PdfCraftError;

pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// How far into the file the signature may start
pub const SIGNATURE_SEARCH_WINDOW: usize = 1024;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// Whether the document is encrypted
    pub encrypted: bool,
    /// Size in bytes after stripping anything before the signature
    pub size_bytes: usize,
    /// Bytes dropped in front of the signature
    pub leading_bytes: usize,
    /// Document title from metadata (if available)
    pub title: Option<String>,
    /// Document author from metadata (if available)
    pub author: Option<String>,
}

/// Offset of the first `%PDF-` that starts within the search window
pub fn find_signature(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(PDF_SIGNATURE.len())
        .take(SIGNATURE_SEARCH_WINDOW)
        .position(|w| w == PDF_SIGNATURE)
}

/// Drop everything before the signature, or reject the input
pub fn strip_to_signature(bytes: &[u8]) -> Result<&[u8], PdfCraftError> {
    let offset = find_signature(bytes).ok_or_else(|| {
        PdfCraftError::InvalidInput(format!(
            "no %PDF- signature in the first {} bytes",
            SIGNATURE_SEARCH_WINDOW
        ))
    })?;
    Ok(&bytes[offset..])
}

/// Parse already-stripped bytes
pub fn load_document(bytes: &[u8]) -> Result<Document, PdfCraftError> {
    Document::load_mem(bytes).map_err(|e| PdfCraftError::Load(e.to_string()))
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, PdfCraftError> {
    let pdf = strip_to_signature(bytes)?;
    let version = extract_version(pdf);
    let document = load_document(pdf)?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(PdfCraftError::Load("PDF has no pages".to_string()));
    }

    let (title, author) = extract_metadata(&document);

    Ok(PdfInfo {
        page_count,
        version,
        encrypted: document.is_encrypted(),
        size_bytes: pdf.len(),
        leading_bytes: bytes.len() - pdf.len(),
        title,
        author,
    })
}

/// Extract PDF version from header
fn extract_version(bytes: &[u8]) -> String {
    // Header format: %PDF-1.7
    if bytes.len() >= 8 && bytes.starts_with(PDF_SIGNATURE) {
        if let Ok(version) = std::str::from_utf8(&bytes[5..8]) {
            return version.trim().to_string();
        }
    }
    "1.4".to_string()
}

fn extract_metadata(document: &Document) -> (Option<String>, Option<String>) {
    let info_dict = document
        .trailer
        .get(b"Info")
        .and_then(|info| info.as_reference())
        .and_then(|id| document.get_dictionary(id));

    let Ok(info_dict) = info_dict else {
        return (None, None);
    };

    let text_field = |key: &[u8]| {
        info_dict
            .get(key)
            .and_then(|obj| obj.as_str())
            .ok()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .filter(|s| !s.is_empty())
    };

    (text_field(b"Title"), text_field(b"Author"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::create_test_pdf;
    use lopdf::{dictionary, Object, StringFormat};

    #[test]
    fn test_signature_at_start() {
        let pdf = create_test_pdf(1);
        assert_eq!(find_signature(&pdf), Some(0));
        assert_eq!(strip_to_signature(&pdf).unwrap().len(), pdf.len());
    }

    #[test]
    fn test_leading_junk_is_stripped_exactly() {
        let pdf = create_test_pdf(2);
        let mut bytes = vec![b'x'; 10];
        bytes.extend_from_slice(&pdf);

        let stripped = strip_to_signature(&bytes).unwrap();
        assert_eq!(stripped, &pdf[..]);

        let info = validate_pdf(&bytes).unwrap();
        assert_eq!(info.page_count, 2);
        assert_eq!(info.leading_bytes, 10);
    }

    #[test]
    fn test_signature_past_window_rejected() {
        let mut bytes = vec![b' '; 2000];
        bytes.extend_from_slice(b"%PDF-1.7\n");
        let err = strip_to_signature(&bytes).unwrap_err();
        assert!(matches!(err, PdfCraftError::InvalidInput(_)));
    }

    #[test]
    fn test_signature_starting_at_last_window_offset() {
        let mut bytes = vec![b' '; SIGNATURE_SEARCH_WINDOW - 1];
        bytes.extend_from_slice(b"%PDF-1.7\n");
        assert_eq!(find_signature(&bytes), Some(SIGNATURE_SEARCH_WINDOW - 1));

        let mut late = vec![b' '; SIGNATURE_SEARCH_WINDOW];
        late.extend_from_slice(b"%PDF-1.7\n");
        assert_eq!(find_signature(&late), None);
    }

    #[test]
    fn test_empty_and_tiny_inputs_rejected() {
        assert!(strip_to_signature(b"").is_err());
        assert!(strip_to_signature(b"%PDF").is_err());
    }

    #[test]
    fn test_signature_but_garbage_is_load_error() {
        let err = validate_pdf(b"%PDF-1.7\nthis is not a pdf body").unwrap_err();
        assert!(matches!(err, PdfCraftError::Load(_)));
    }

    #[test]
    fn test_validate_pdf_single_page() {
        let pdf = create_test_pdf(1);
        let info = validate_pdf(&pdf).unwrap();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.version, "1.7");
        assert!(!info.encrypted);
        assert_eq!(info.title, None);
    }

    #[test]
    fn test_metadata_extracted() {
        let pdf = create_test_pdf(1);
        let mut doc = Document::load_mem(&pdf).unwrap();
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly Report".to_vec(), StringFormat::Literal),
            "Author" => Object::String(b"Finance".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", Object::Reference(info_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let info = validate_pdf(&bytes).unwrap();
        assert_eq!(info.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(info.author.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version(b"%PDF-1.7\n"), "1.7");
        assert_eq!(extract_version(b"%PDF-2.0\n"), "2.0");
        assert_eq!(extract_version(b"%PDF"), "1.4");
    }
}

//! Source validation and info extraction
//!
//! Every input is checked here before a merge is allowed to touch history.

use crate::error::MergeError;
use lopdf::Document;
use serde::Serialize;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string from the header (e.g. "1.7")
    pub version: String,
    /// File size in bytes
    pub size_bytes: usize,
    /// Document title from metadata (if available)
    pub title: Option<String>,
    /// Document author from metadata (if available)
    pub author: Option<String>,
}

/// Validate one named source and extract basic info
///
/// Rejects files without a `%PDF-` header, files lopdf cannot parse,
/// encrypted files and files with an empty page tree.
pub fn validate_pdf(name: &str, bytes: &[u8]) -> Result<PdfInfo, MergeError> {
    let invalid = |reason: String| MergeError::InvalidSource {
        name: name.to_string(),
        reason,
    };

    if bytes.len() < 8 {
        return Err(invalid("file too small to be a PDF".into()));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(invalid("missing %PDF- header".into()));
    }

    let document =
        Document::load_mem(bytes).map_err(|e| invalid(format!("failed to parse: {}", e)))?;

    if document.is_encrypted() {
        return Err(invalid("encrypted PDFs are not supported".into()));
    }

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(invalid("PDF has no pages".into()));
    }

    let title = info_string(&document, b"Title");
    let author = info_string(&document, b"Author");

    Ok(PdfInfo {
        page_count,
        version: extract_version(bytes),
        size_bytes: bytes.len(),
        title,
        author,
    })
}

/// Header format: %PDF-1.7
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "1.4".to_string())
}

/// A non-empty text entry from the trailer's `Info` dictionary
fn info_string(document: &Document, key: &[u8]) -> Option<String> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let value = document.get_dictionary(info_id).ok()?.get(key).ok()?;
    let decoded = String::from_utf8_lossy(value.as_str().ok()?).into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::test_support::create_test_pdf;
    use lopdf::{Dictionary, Object, StringFormat};
    use pretty_assertions::assert_eq;

    fn with_info(bytes: &[u8], title: &str) -> Vec<u8> {
        let mut doc = Document::load_mem(bytes).unwrap();
        let mut info = Dictionary::new();
        info.set(
            "Title",
            Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
        );
        info.set(
            "Author",
            Object::String(b"Leasing Office".to_vec(), StringFormat::Literal),
        );
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_valid_pdf_reports_info() {
        let pdf = create_test_pdf(3, "Info");
        let info = validate_pdf("lease.pdf", &pdf).unwrap();

        assert_eq!(info.page_count, 3);
        assert_eq!(info.version, "1.5");
        assert_eq!(info.size_bytes, pdf.len());
        assert_eq!(info.title, None);
    }

    #[test]
    fn test_metadata_is_extracted() {
        let pdf = with_info(&create_test_pdf(1, "Meta"), "Residential Lease");
        let info = validate_pdf("lease.pdf", &pdf).unwrap();

        assert_eq!(info.title.as_deref(), Some("Residential Lease"));
        assert_eq!(info.author.as_deref(), Some("Leasing Office"));
    }

    #[test]
    fn test_rejects_short_input() {
        let err = validate_pdf("tiny.pdf", b"%PDF").unwrap_err();
        assert_eq!(
            err,
            MergeError::InvalidSource {
                name: "tiny.pdf".into(),
                reason: "file too small to be a PDF".into(),
            }
        );
    }

    #[test]
    fn test_rejects_missing_header() {
        let err = validate_pdf("photo.png", b"\x89PNG\r\n\x1a\n0000").unwrap_err();
        assert!(err.to_string().contains("missing %PDF- header"));
        assert!(err.to_string().contains("photo.png"));
    }

    #[test]
    fn test_rejects_unparsable_body() {
        let err = validate_pdf("broken.pdf", b"%PDF-1.7\nthis is not a pdf body").unwrap_err();
        assert!(matches!(
            err,
            MergeError::InvalidSource { ref reason, .. } if reason.starts_with("failed to parse")
        ));
    }

    #[test]
    fn test_version_falls_back_when_header_is_odd() {
        assert_eq!(extract_version(b"%PDF-2.0\n"), "2.0");
        assert_eq!(extract_version(b"%PDF-"), "1.4");
    }
}

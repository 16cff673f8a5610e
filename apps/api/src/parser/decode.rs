//! Document decoding: uploaded PDF / DOCX bytes to plain text.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use zip::ZipArchive;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const DOCX_BODY_PART: &str = "word/document.xml";

static XML_PARAGRAPH_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("paragraph pattern is valid"));
static XML_TAB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:tab\s*/>").expect("tab pattern is valid"));
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static XML_CHAR_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:[xX]([0-9A-Fa-f]{1,6})|([0-9]{1,7}));").expect("char ref pattern is valid")
});

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported file type: {0}. Only PDF and DOCX files are allowed.")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to extract text from DOCX: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a declared MIME type. Parameters such as `; charset=...` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, DecodeError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            MIME_PDF => Ok(DocumentFormat::Pdf),
            MIME_DOCX => Ok(DocumentFormat::Docx),
            _ => Err(DecodeError::UnsupportedFormat(mime.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::Docx => MIME_DOCX,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// Decodes document bytes to plain text. CPU bound; call from `spawn_blocking`.
pub fn decode_document(bytes: &[u8], format: DocumentFormat) -> Result<String, DecodeError> {
    match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DecodeError::Pdf(e.to_string())),
        DocumentFormat::Docx => extract_docx(bytes),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| DecodeError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| DecodeError::Docx(format!("{DOCX_BODY_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| DecodeError::Docx(e.to_string()))?;
    Ok(docx_xml_to_text(&xml))
}

fn docx_xml_to_text(xml: &str) -> String {
    let text = XML_PARAGRAPH_END.replace_all(xml, "\n");
    let text = XML_TAB.replace_all(&text, "\t");
    let text = XML_TAG.replace_all(&text, "");
    let text = XML_CHAR_REF.replace_all(&text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            (None, None) => None,
        };
        // unrepresentable references stay as written
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

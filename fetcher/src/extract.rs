use crate::error::FetchError;
use unicode_normalization::UnicodeNormalization;

pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Turns downloaded bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, FetchError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, FetchError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(FetchError::NotPdf("missing %PDF header".into()));
        }
        let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| FetchError::Extract(e.to_string()))?;
        let text = clean_text(&raw);
        if text.trim().is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(text)
    }
}

/// NFKC folds ligatures such as "ﬁ" that PDF text layers are full of;
/// control characters other than line breaks and tabs become spaces.
pub fn clean_text(raw: &str) -> String {
    raw.nfkc()
        .map(|c| if c.is_control() && c != '\n' && c != '\t' { ' ' } else { c })
        .collect()
}

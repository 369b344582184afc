//! Document stage: base64 → bytes → validated [`PdfDocument`].
//!
//! The checks here are deliberately shallow. The model parses the PDF; we
//! only refuse input that is obviously not a PDF (so no inference call is
//! wasted on it) and gather a few facts for the logs and prompt choice.

use crate::prompts::PromptVariant;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Every PDF starts with these five bytes.
pub const PDF_SIGNATURE: &[u8; 5] = b"%PDF-";

/// Number of header bytes shown as the version string (`%PDF-1.7`).
const VERSION_HEADER_LEN: usize = 8;

static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%PDF-(\d+)\.(\d+)").unwrap());

/// Decode base64 PDF content. ASCII whitespace (MIME line wrapping,
/// trailing newlines) is ignored.
pub fn decode_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}

/// Declared PDF version from the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion {
    pub major: u32,
    pub minor: u32,
}

impl PdfVersion {
    /// Versions before 1.5 predate object streams and cross-reference
    /// streams.
    pub fn is_legacy(self) -> bool {
        self < PdfVersion { major: 1, minor: 5 }
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Facts about a document, for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub size_bytes: usize,
    /// First bytes of the header, e.g. `%PDF-1.4`.
    pub header: String,
    pub has_stream: bool,
    pub has_endstream: bool,
}

impl Diagnostics {
    /// Structural problems worth a warning. The document is still sent to
    /// the model either way.
    pub fn structure_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if !self.has_stream {
            warnings.push("PDF may be missing stream objects");
        }
        if !self.has_endstream {
            warnings.push("PDF may be missing endstream markers");
        }
        warnings
    }
}

/// Bytes that carry the PDF signature.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
}

impl PdfDocument {
    /// Accept `bytes` if they start with [`PDF_SIGNATURE`], else `None`.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        bytes
            .starts_with(PDF_SIGNATURE)
            .then_some(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parsed `%PDF-M.m` header, if well-formed.
    pub fn version(&self) -> Option<PdfVersion> {
        let caps = RE_VERSION.captures(&self.bytes)?;
        let major = std::str::from_utf8(&caps[1]).ok()?.parse().ok()?;
        let minor = std::str::from_utf8(&caps[2]).ok()?.parse().ok()?;
        Some(PdfVersion { major, minor })
    }

    /// Pick the primary prompt. Unreadable versions are treated as modern.
    pub fn prompt_variant(&self) -> PromptVariant {
        match self.version() {
            Some(v) if v.is_legacy() => PromptVariant::Simplified,
            _ => PromptVariant::Standard,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let end = self.bytes.len().min(VERSION_HEADER_LEN);
        Diagnostics {
            size_bytes: self.bytes.len(),
            header: String::from_utf8_lossy(&self.bytes[..end]).into_owned(),
            has_stream: contains(&self.bytes, b"stream"),
            has_endstream: contains(&self.bytes, b"endstream"),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(bytes: &[u8]) -> PdfDocument {
        PdfDocument::from_bytes(bytes.to_vec()).expect("valid header")
    }

    #[test]
    fn rejects_missing_signature() {
        assert!(PdfDocument::from_bytes(b"hello world".to_vec()).is_none());
        assert!(PdfDocument::from_bytes(b"%PDF".to_vec()).is_none());
        assert!(PdfDocument::from_bytes(Vec::new()).is_none());
    }

    #[test]
    fn decode_ignores_line_wrapping() {
        let b64 = STANDARD.encode(b"%PDF-1.7 body");
        let (a, b) = b64.split_at(6);
        let wrapped = format!("{a}\r\n{b}\n");
        assert_eq!(decode_base64(&wrapped).unwrap(), b"%PDF-1.7 body");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_base64("not base64!!").is_err());
    }

    #[test]
    fn parses_version() {
        assert_eq!(
            doc(b"%PDF-1.7\n%\xe2\xe3").version(),
            Some(PdfVersion { major: 1, minor: 7 })
        );
        assert_eq!(doc(b"%PDF-2.0").version().unwrap().to_string(), "2.0");
        assert_eq!(doc(b"%PDF-x.y").version(), None);
    }

    #[test]
    fn legacy_versions_get_simplified_prompt() {
        assert_eq!(doc(b"%PDF-1.3").prompt_variant(), PromptVariant::Simplified);
        assert_eq!(doc(b"%PDF-1.4").prompt_variant(), PromptVariant::Simplified);
        assert_eq!(doc(b"%PDF-1.5").prompt_variant(), PromptVariant::Standard);
        assert_eq!(doc(b"%PDF-2.0").prompt_variant(), PromptVariant::Standard);
        assert_eq!(doc(b"%PDF-").prompt_variant(), PromptVariant::Standard);
    }

    #[test]
    fn diagnostics_report_stream_markers() {
        let d = doc(b"%PDF-1.6\n1 0 obj\nstream\nxyz\nendstream\n").diagnostics();
        assert_eq!(d.header, "%PDF-1.6");
        assert!(d.has_stream);
        assert!(d.has_endstream);

        let d = doc(b"%PDF-1.6\n").diagnostics();
        assert!(!d.has_stream);
        assert!(!d.has_endstream);
        assert_eq!(d.size_bytes, 9);
    }

    #[test]
    fn missing_markers_are_warned_separately() {
        let complete = doc(b"%PDF-1.6\nstream\nxyz\nendstream\n").diagnostics();
        assert!(complete.structure_warnings().is_empty());

        let unterminated = doc(b"%PDF-1.6\nstream\nxyz\n").diagnostics();
        assert_eq!(
            unterminated.structure_warnings(),
            vec!["PDF may be missing endstream markers"]
        );

        let bare = doc(b"%PDF-1.6\n").diagnostics();
        assert_eq!(
            bare.structure_warnings(),
            vec![
                "PDF may be missing stream objects",
                "PDF may be missing endstream markers"
            ]
        );
    }

    #[test]
    fn short_header_does_not_panic() {
        assert_eq!(doc(b"%PDF-").diagnostics().header, "%PDF-");
    }
}

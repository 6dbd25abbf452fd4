//! MIME types, file extensions and detection confidence.
//!
//! This module provides the vocabulary the content-type layer works with: a
//! [`MimeType`] newtype, a lower-cased [`FileExtension`], the totally-ordered
//! [`Confidence`] scale, and the static extension-to-MIME table with a
//! `mime_guess` fallback.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const HTML_MIME_TYPE: &str = "text/html";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_TEXT_MIME_TYPE: &str = "text/xml";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const RTF_MIME_TYPE: &str = "application/rtf";

pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PPTX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const LEGACY_EXCEL_MIME_TYPE: &str = "application/vnd.ms-excel";
pub const LEGACY_POWERPOINT_MIME_TYPE: &str = "application/vnd.ms-powerpoint";
pub const XLSB_MIME_TYPE: &str = "application/vnd.ms-excel.sheet.binary.macroenabled.12";

pub const ODT_MIME_TYPE: &str = "application/vnd.oasis.opendocument.text";
pub const ODS_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
pub const ODP_MIME_TYPE: &str = "application/vnd.oasis.opendocument.presentation";

pub const PAGES_MIME_TYPE: &str = "application/vnd.apple.pages";
pub const NUMBERS_MIME_TYPE: &str = "application/vnd.apple.numbers";
pub const KEYNOTE_MIME_TYPE: &str = "application/vnd.apple.keynote";

pub const EML_MIME_TYPE: &str = "message/rfc822";
pub const MSG_MIME_TYPE: &str = "application/vnd.ms-outlook";
pub const PST_MIME_TYPE: &str = "application/vnd.ms-outlook-pst";

pub const ZIP_MIME_TYPE: &str = "application/zip";
pub const TAR_MIME_TYPE: &str = "application/x-tar";
pub const GZIP_MIME_TYPE: &str = "application/gzip";
pub const BZIP2_MIME_TYPE: &str = "application/x-bzip2";
pub const XZ_MIME_TYPE: &str = "application/x-xz";
pub const RAR_MIME_TYPE: &str = "application/vnd.rar";
pub const SEVENZ_MIME_TYPE: &str = "application/x-7z-compressed";

/// MIME evidence recorded for encrypted inputs.
pub const ENCRYPTED_MIME_TYPE: &str = "application/encrypted";

/// A MIME type string such as `application/pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MimeType(String);

impl MimeType {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type family before the slash (`application`, `text`, `image`, ...).
    pub fn family(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    pub fn is_text(&self) -> bool {
        self.family() == "text"
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MimeType {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for MimeType {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl PartialEq<&str> for MimeType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A lower-cased filename extension without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    /// Normalizes the input: strips an optional leading dot, lower-cases.
    pub fn new(v: impl AsRef<str>) -> Self {
        let v = v.as_ref();
        let v = v.strip_prefix('.').unwrap_or(v);
        Self(v.to_ascii_lowercase())
    }

    /// Extension of the final path component, if it has one.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{}", self.0)
    }
}

impl From<&str> for FileExtension {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// Graded confidence of a MIME candidate.
///
/// Totally ordered: `None < Low < Medium < High < VeryHigh < Highest`.
/// Extension evidence is `High`, byte-signature evidence is `VeryHigh`, and
/// format refiners that looked inside the container record `Highest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
    VeryHigh,
    Highest,
}

/// Extension to MIME type candidates.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();

    m.insert("txt", &[PLAIN_TEXT_MIME_TYPE]);
    m.insert("text", &[PLAIN_TEXT_MIME_TYPE]);
    m.insert("log", &[PLAIN_TEXT_MIME_TYPE]);
    m.insert("md", &[MARKDOWN_MIME_TYPE]);
    m.insert("csv", &[CSV_MIME_TYPE]);

    m.insert("html", &[HTML_MIME_TYPE]);
    m.insert("htm", &[HTML_MIME_TYPE]);
    m.insert("xml", &[XML_MIME_TYPE, XML_TEXT_MIME_TYPE]);

    m.insert("pdf", &[PDF_MIME_TYPE]);
    m.insert("rtf", &[RTF_MIME_TYPE]);

    m.insert("doc", &[LEGACY_WORD_MIME_TYPE]);
    m.insert("dot", &[LEGACY_WORD_MIME_TYPE]);
    m.insert("docx", &[DOCX_MIME_TYPE]);
    m.insert("xls", &[LEGACY_EXCEL_MIME_TYPE]);
    m.insert("xlsx", &[XLSX_MIME_TYPE]);
    m.insert("xlsb", &[XLSB_MIME_TYPE]);
    m.insert("ppt", &[LEGACY_POWERPOINT_MIME_TYPE]);
    m.insert("pptx", &[PPTX_MIME_TYPE]);

    m.insert("odt", &[ODT_MIME_TYPE]);
    m.insert("ods", &[ODS_MIME_TYPE]);
    m.insert("odp", &[ODP_MIME_TYPE]);

    m.insert("pages", &[PAGES_MIME_TYPE, ZIP_MIME_TYPE]);
    m.insert("numbers", &[NUMBERS_MIME_TYPE, ZIP_MIME_TYPE]);
    m.insert("key", &[KEYNOTE_MIME_TYPE, ZIP_MIME_TYPE]);

    m.insert("eml", &[EML_MIME_TYPE]);
    m.insert("msg", &[MSG_MIME_TYPE]);
    m.insert("pst", &[PST_MIME_TYPE]);
    m.insert("ost", &[PST_MIME_TYPE]);

    m.insert("zip", &[ZIP_MIME_TYPE]);
    m.insert("tar", &[TAR_MIME_TYPE]);
    m.insert("gz", &[GZIP_MIME_TYPE]);
    m.insert("tgz", &[GZIP_MIME_TYPE]);
    m.insert("bz2", &[BZIP2_MIME_TYPE]);
    m.insert("xz", &[XZ_MIME_TYPE]);
    m.insert("rar", &[RAR_MIME_TYPE]);
    m.insert("7z", &[SEVENZ_MIME_TYPE]);

    m.insert("png", &["image/png"]);
    m.insert("jpg", &["image/jpeg"]);
    m.insert("jpeg", &["image/jpeg"]);
    m.insert("gif", &["image/gif"]);
    m.insert("bmp", &["image/bmp"]);
    m.insert("tiff", &["image/tiff"]);
    m.insert("tif", &["image/tiff"]);
    m.insert("webp", &["image/webp"]);

    m.insert("json", &["application/json"]);

    m
});

/// MIME candidates for a file extension.
///
/// The static table is consulted first; unknown extensions fall back to the
/// `mime_guess` database. Returns an empty vector when neither knows the
/// extension.
pub fn mime_types_for_extension(ext: &FileExtension) -> Vec<MimeType> {
    if let Some(mimes) = EXT_TO_MIME.get(ext.as_str()) {
        return mimes.iter().map(|m| MimeType::new(*m)).collect();
    }
    mime_guess::from_ext(ext.as_str())
        .iter()
        .map(|m| MimeType::new(m.essence_str()))
        .collect()
}

/// Whether the MIME type names an archive container the pipeline can enter.
pub fn is_archive_mime_type(mime: &MimeType) -> bool {
    matches!(
        mime.as_str(),
        ZIP_MIME_TYPE | TAR_MIME_TYPE | GZIP_MIME_TYPE | "application/x-gzip" | "application/x-zip-compressed"
    )
}

/// Whether the extension names an archive container the pipeline can enter.
pub fn is_archive_extension(ext: &FileExtension) -> bool {
    matches!(ext.as_str(), "zip" | "tar" | "gz" | "tgz")
}

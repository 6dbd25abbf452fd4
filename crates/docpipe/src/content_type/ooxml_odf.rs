//! OOXML / OpenDocument refiner: identifies office documents inside ZIP
//! containers.
//!
//! OpenDocument archives declare their type in a `mimetype` member; OOXML
//! archives are told apart by their well-known part names.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{
    Confidence, DOCX_MIME_TYPE, MimeType, PPTX_MIME_TYPE, XLSB_MIME_TYPE, XLSX_MIME_TYPE,
    ZIP_MIME_TYPE,
};
use std::io::Read;

const OOXML_PARTS: &[(&str, &str)] = &[
    ("word/document.xml", DOCX_MIME_TYPE),
    ("xl/workbook.xml", XLSX_MIME_TYPE),
    ("xl/workbook.bin", XLSB_MIME_TYPE),
    ("ppt/presentation.xml", PPTX_MIME_TYPE),
];

/// Refine ZIP evidence into a concrete office document type.
pub fn detect(data: &mut DataSource) -> Result<()> {
    let zip_confidence = data.mime_type_confidence(&MimeType::new(ZIP_MIME_TYPE));
    if zip_confidence < Confidence::Medium {
        return Ok(());
    }
    if data.highest_confidence() >= Confidence::Highest {
        return Ok(());
    }

    let reader = data.istream()?;
    let mut archive = match zip::ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(_) => {
            data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::Low);
            return Ok(());
        }
    };

    // OpenDocument: the uncompressed `mimetype` member holds the exact type.
    if let Ok(mut member) = archive.by_name("mimetype") {
        let mut declared = String::new();
        if member.read_to_string(&mut declared).is_ok() {
            let declared = declared.trim();
            if !declared.is_empty() {
                data.add_mime_type(MimeType::new(declared), Confidence::Highest);
                return Ok(());
            }
        }
    }

    for (part, mime) in OOXML_PARTS {
        if archive.by_name(part).is_ok() {
            data.add_mime_type(MimeType::new(*mime), Confidence::Highest);
            return Ok(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::ODT_MIME_TYPE;
    use std::io::{Cursor, Write};
    use zip::write::{FileOptions, ZipWriter};

    fn zip_with(name: &str, body: &[u8]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::<'_, ()>::default();
            zip.start_file(name, options).unwrap();
            zip.write_all(body).unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_odf_mimetype_member_wins() {
        let bytes = zip_with("mimetype", ODT_MIME_TYPE.as_bytes());
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            ODT_MIME_TYPE
        );
        assert_eq!(data.highest_confidence(), Confidence::Highest);
    }

    #[test]
    fn test_docx_part_name() {
        let bytes = zip_with("word/document.xml", b"<w:document/>");
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            DOCX_MIME_TYPE
        );
    }

    #[test]
    fn test_plain_zip_unrefined() {
        let bytes = zip_with("notes.txt", b"just a file");
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            ZIP_MIME_TYPE
        );
    }
}

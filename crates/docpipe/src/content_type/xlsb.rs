//! XLSB refiner: spots binary workbooks hiding behind the XLSX container
//! type.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{Confidence, MimeType, XLSB_MIME_TYPE, XLSX_MIME_TYPE};

/// Refine XLSX evidence into the binary-workbook type when the container
/// holds `xl/workbook.bin`.
pub fn detect(data: &mut DataSource) -> Result<()> {
    let xlsx_confidence = data.mime_type_confidence(&MimeType::new(XLSX_MIME_TYPE));
    if xlsx_confidence < Confidence::Medium {
        return Ok(());
    }
    if data.highest_confidence() >= Confidence::Highest {
        return Ok(());
    }

    let reader = data.istream()?;
    let mut archive = match zip::ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(_) => {
            data.add_mime_type(MimeType::new(XLSX_MIME_TYPE), Confidence::Low);
            return Ok(());
        }
    };
    if archive.by_name("xl/workbook.bin").is_ok() {
        data.add_mime_type(MimeType::new(XLSB_MIME_TYPE), Confidence::Highest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{FileOptions, ZipWriter};

    #[test]
    fn test_binary_workbook_refined() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::<'_, ()>::default();
            zip.start_file("xl/workbook.bin", options).unwrap();
            zip.write_all(&[0u8; 16]).unwrap();
            zip.finish().unwrap();
        }
        let mut data = DataSource::from_vec(cursor.into_inner());
        data.add_mime_type(MimeType::new(XLSX_MIME_TYPE), Confidence::High);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            XLSB_MIME_TYPE
        );
    }

    #[test]
    fn test_xml_workbook_untouched() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::<'_, ()>::default();
            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(b"<workbook/>").unwrap();
            zip.finish().unwrap();
        }
        let mut data = DataSource::from_vec(cursor.into_inner());
        data.add_mime_type(MimeType::new(XLSX_MIME_TYPE), Confidence::High);
        detect(&mut data).unwrap();
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(XLSB_MIME_TYPE)),
            Confidence::None
        );
    }
}

//! iWork refiner: tells Pages / Numbers / Keynote bundles apart from plain
//! ZIP archives.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{
    Confidence, KEYNOTE_MIME_TYPE, MimeType, NUMBERS_MIME_TYPE, PAGES_MIME_TYPE, ZIP_MIME_TYPE,
};
use std::io::Read;

/// Refine ZIP evidence into an iWork type.
///
/// Guards: ZIP evidence at `medium` or better, and no `highest` evidence yet.
/// A bundle that cannot be opened as a ZIP downgrades nothing; it only adds
/// `low` ZIP evidence, matching the archive's uncertain state.
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

    if archive.by_name("presentation.apxl").is_ok() {
        data.add_mime_type(MimeType::new(KEYNOTE_MIME_TYPE), Confidence::Highest);
        return Ok(());
    }

    let index_name = ["index.xml", "index.apxl"]
        .into_iter()
        .find(|name| archive.by_name(name).is_ok());
    let Some(index_name) = index_name else {
        return Ok(());
    };

    let mut contents = String::new();
    match archive.by_name(index_name) {
        Ok(mut file) => {
            if file.read_to_string(&mut contents).is_err() {
                data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::Low);
                return Ok(());
            }
        }
        Err(_) => return Ok(()),
    }

    if contents.contains("<sl:document") {
        data.add_mime_type(MimeType::new(PAGES_MIME_TYPE), Confidence::Highest);
    } else if contents.contains("<ls:document") {
        data.add_mime_type(MimeType::new(NUMBERS_MIME_TYPE), Confidence::Highest);
    } else if contents.contains("<key:presentation") {
        data.add_mime_type(MimeType::new(KEYNOTE_MIME_TYPE), Confidence::Highest);
    } else {
        data.add_mime_type(MimeType::new(PAGES_MIME_TYPE), Confidence::Low);
        data.add_mime_type(MimeType::new(NUMBERS_MIME_TYPE), Confidence::Low);
        data.add_mime_type(MimeType::new(KEYNOTE_MIME_TYPE), Confidence::Low);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_pages_bundle_refined_to_highest() {
        let bytes = zip_with("index.xml", b"<?xml version=\"1.0\"?><sl:document/>");
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        detect(&mut data).unwrap();
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(PAGES_MIME_TYPE)),
            Confidence::Highest
        );
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            PAGES_MIME_TYPE
        );
    }

    #[test]
    fn test_keynote_by_presentation_member() {
        let bytes = zip_with("presentation.apxl", b"<key:presentation/>");
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        detect(&mut data).unwrap();
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(KEYNOTE_MIME_TYPE)),
            Confidence::Highest
        );
    }

    #[test]
    fn test_guard_requires_zip_evidence() {
        let bytes = zip_with("index.xml", b"<sl:document/>");
        let mut data = DataSource::from_vec(bytes);
        detect(&mut data).unwrap();
        assert!(data.highest_confidence_mime_type().is_none());
    }

    #[test]
    fn test_broken_zip_adds_low_zip_evidence() {
        let mut data = DataSource::from_vec(b"not a zip at all".to_vec());
        data.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::Medium);
        detect(&mut data).unwrap();
        // Evidence was only kept, never downgraded.
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(ZIP_MIME_TYPE)),
            Confidence::Medium
        );
    }
}

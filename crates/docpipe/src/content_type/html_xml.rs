//! HTML vs XML refiner: settles sources whose extension evidence is
//! ambiguous between markup types.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{Confidence, HTML_MIME_TYPE, MimeType, XML_MIME_TYPE, XML_TEXT_MIME_TYPE};

const SNIFF_LIMIT: usize = 1024;

/// Refine markup evidence by sniffing the leading bytes.
///
/// An `<?xml` declaration settles on XML unless an `<html` root follows; a
/// document-type declaration or `<html` root settles on HTML.
pub fn detect(data: &mut DataSource) -> Result<()> {
    let html = MimeType::new(HTML_MIME_TYPE);
    let xml = MimeType::new(XML_MIME_TYPE);
    let xml_text = MimeType::new(XML_TEXT_MIME_TYPE);

    let markup_confidence = data
        .mime_type_confidence(&html)
        .max(data.mime_type_confidence(&xml))
        .max(data.mime_type_confidence(&xml_text));
    if markup_confidence < Confidence::Medium {
        return Ok(());
    }
    if data.highest_confidence() >= Confidence::Highest {
        return Ok(());
    }

    let prefix = data.string(Some(SNIFF_LIMIT))?.to_ascii_lowercase();
    let trimmed = prefix.trim_start();
    let looks_html = trimmed.contains("<!doctype html") || trimmed.contains("<html");
    if looks_html {
        data.add_mime_type(html, Confidence::Highest);
    } else if trimmed.starts_with("<?xml") {
        data.add_mime_type(xml, Confidence::Highest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_doctype_wins() {
        let mut data = DataSource::from_string("<!DOCTYPE html><html><body>x</body></html>");
        data.add_mime_type(MimeType::new(HTML_MIME_TYPE), Confidence::High);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            HTML_MIME_TYPE
        );
        assert_eq!(data.highest_confidence(), Confidence::Highest);
    }

    #[test]
    fn test_xml_declaration() {
        let mut data = DataSource::from_string("<?xml version=\"1.0\"?><note/>");
        data.add_mime_type(MimeType::new(XML_MIME_TYPE), Confidence::High);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            XML_MIME_TYPE
        );
    }

    #[test]
    fn test_xhtml_settles_on_html() {
        let mut data =
            DataSource::from_string("<?xml version=\"1.0\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"/>");
        data.add_mime_type(MimeType::new(XML_MIME_TYPE), Confidence::High);
        detect(&mut data).unwrap();
        assert_eq!(
            data.highest_confidence_mime_type().unwrap().as_str(),
            HTML_MIME_TYPE
        );
    }

    #[test]
    fn test_weak_evidence_ignored() {
        let mut data = DataSource::from_string("<html></html>");
        detect(&mut data).unwrap();
        assert!(data.highest_confidence_mime_type().is_none());
    }
}

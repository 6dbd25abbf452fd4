//! Signature-based detection: byte signatures over a bounded prefix at
//! `very_high` confidence.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{Confidence, MimeType};

/// How much of the source the signature matcher may look at.
const SIGNATURE_PREFIX_LIMIT: usize = 8192;

/// Match the source's leading bytes against the signature database and record
/// every candidate at `very_high` confidence.
///
/// Short-circuits when existing evidence already reached `high`: signatures
/// cannot beat a refiner's `highest`, and extension evidence plus a refiner
/// pass is cheaper than reading bytes for sources that already have a strong
/// answer.
pub fn detect(data: &mut DataSource) -> Result<()> {
    if data.highest_confidence() >= Confidence::High {
        return Ok(());
    }
    let mime = {
        let prefix = data.span(Some(SIGNATURE_PREFIX_LIMIT))?;
        infer::get(&prefix).map(|kind| MimeType::new(kind.mime_type()))
    };
    if let Some(mime) = mime {
        tracing::trace!(mime = mime.as_str(), "signature evidence");
        data.add_mime_type(mime, Confidence::VeryHigh);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::ZIP_MIME_TYPE;

    #[test]
    fn test_zip_signature() {
        // Empty ZIP: end-of-central-directory record only.
        let mut bytes = vec![0x50, 0x4b, 0x05, 0x06];
        bytes.extend_from_slice(&[0u8; 18]);
        let mut data = DataSource::from_vec(bytes);
        detect(&mut data).unwrap();
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(ZIP_MIME_TYPE)),
            Confidence::VeryHigh
        );
    }

    #[test]
    fn test_short_circuit_on_strong_evidence() {
        let mut bytes = vec![0x50, 0x4b, 0x05, 0x06];
        bytes.extend_from_slice(&[0u8; 18]);
        let mut data = DataSource::from_vec(bytes);
        data.add_mime_type(MimeType::new("application/x-custom"), Confidence::High);
        detect(&mut data).unwrap();
        // The signature pass was skipped; no zip evidence recorded.
        assert_eq!(
            data.mime_type_confidence(&MimeType::new(ZIP_MIME_TYPE)),
            Confidence::None
        );
    }

    #[test]
    fn test_unrecognized_prefix_records_nothing() {
        let mut data = DataSource::from_vec(vec![0x00; 1024]);
        detect(&mut data).unwrap();
        assert!(data.highest_confidence_mime_type().is_none());
    }
}

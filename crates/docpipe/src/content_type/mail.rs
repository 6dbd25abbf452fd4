//! Mail refiner: confirms RFC 822 message sources by their header block.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::mime::{Confidence, EML_MIME_TYPE, MimeType};

const HEADER_PREFIX_LIMIT: usize = 4096;

/// Header names whose presence at a line start confirms a mail message.
const MAIL_HEADERS: &[&str] = &[
    "from:",
    "return-path:",
    "received:",
    "delivered-to:",
    "subject:",
    "message-id:",
];

/// Refine `message/rfc822` evidence to `highest` when the leading bytes hold
/// a recognizable header block.
pub fn detect(data: &mut DataSource) -> Result<()> {
    let eml_confidence = data.mime_type_confidence(&MimeType::new(EML_MIME_TYPE));
    if eml_confidence < Confidence::Medium {
        return Ok(());
    }
    if data.highest_confidence() >= Confidence::Highest {
        return Ok(());
    }

    let prefix = data.string(Some(HEADER_PREFIX_LIMIT))?;
    let confirmed = prefix.lines().take(32).any(|line| {
        let lower = line.to_ascii_lowercase();
        MAIL_HEADERS.iter().any(|header| lower.starts_with(header))
    });
    if confirmed {
        data.add_mime_type(MimeType::new(EML_MIME_TYPE), Confidence::Highest);
    }
    Ok(())
}

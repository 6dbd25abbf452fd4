//! Extension-based detection: filename extension to MIME candidates at `high`
//! confidence.

use crate::data_source::DataSource;
use crate::mime::{Confidence, mime_types_for_extension};

/// Record `high` evidence for every MIME candidate of the source's file
/// extension. Sources without an extension are left untouched.
pub fn detect(data: &mut DataSource) {
    let Some(extension) = data.file_extension() else {
        return;
    };
    for mime in mime_types_for_extension(&extension) {
        tracing::trace!(mime = mime.as_str(), extension = extension.as_str(), "extension evidence");
        data.add_mime_type(mime, Confidence::High);
    }
}

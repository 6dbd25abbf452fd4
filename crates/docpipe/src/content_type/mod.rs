//! Content-type detection: graded-confidence MIME tagging.
//!
//! A detector is a function `&mut DataSource -> Result<()>` that records
//! evidence into the data source's store. Detectors compose: each only ever
//! upgrades evidence, never removes it, and never touches anything but the
//! evidence store. Running the bundle twice yields the same
//! highest-confidence result.
//!
//! The standard bundle, in order:
//!
//! 1. [`by_file_extension`] — extension table lookup, `high` confidence.
//! 2. [`by_signature`] — byte-signature match over a bounded prefix,
//!    `very_high` confidence. Skipped once any evidence reached `high`.
//! 3. Refiners ([`ooxml_odf`], [`iwork`], [`xlsb`], [`mail`], [`html_xml`]) —
//!    each guards on a prerequisite MIME at `medium` or better and an absent
//!    `highest`, then looks inside the bytes and records a more specific type
//!    at `highest`.

pub mod by_file_extension;
pub mod by_signature;
pub mod html_xml;
pub mod iwork;
pub mod mail;
pub mod ooxml_odf;
pub mod xlsb;

use crate::chain::{ChainElement, Continuation, Emit};
use crate::data_source::DataSource;
use crate::error::Result;
use crate::message::Message;

/// Run the standard detector bundle over a data source.
pub fn detect(data: &mut DataSource) -> Result<()> {
    by_file_extension::detect(data);
    by_signature::detect(data)?;
    ooxml_odf::detect(data)?;
    iwork::detect(data)?;
    xlsb::detect(data)?;
    mail::detect(data)?;
    html_xml::detect(data)?;
    tracing::debug!(
        mime = ?data.highest_confidence_mime_type().map(|m| m.as_str().to_string()),
        confidence = ?data.highest_confidence(),
        "content type detection complete"
    );
    Ok(())
}

/// The aggregated dispatcher stage: runs the bundle and forwards the
/// annotated data source. Every other message passes through unchanged.
pub fn detector() -> Detector {
    Detector { _private: () }
}

pub struct Detector {
    _private: (),
}

impl ChainElement for Detector {
    fn name(&self) -> &'static str {
        "content-type-detector"
    }

    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
        match message {
            Message::DataSource(mut data) => {
                detect(&mut data)?;
                emit.send(Message::DataSource(data))
            }
            other => emit.send(other),
        }
    }
}

crate::chain::impl_stage_bitor!(Detector);

//! Metadata writer: renders the six-line metadata block.

use super::Writer;
use crate::error::Result;
use crate::message::Message;
use crate::metadata::{CivilDateTime, Metadata};

fn field_line(out: &mut String, label: &str, value: Option<String>) {
    out.push_str(label);
    out.push_str(": ");
    match value {
        Some(value) => out.push_str(&value),
        None => out.push_str("unidentified"),
    }
    out.push('\n');
}

fn write_metadata_block(metadata: &Metadata, out: &mut String) {
    field_line(out, "Author", metadata.author.clone());
    field_line(
        out,
        "Creation time",
        metadata.creation_date.as_ref().map(CivilDateTime::to_string),
    );
    field_line(out, "Last modified by", metadata.last_modified_by.clone());
    field_line(
        out,
        "Last modification time",
        metadata
            .last_modification_date
            .as_ref()
            .map(CivilDateTime::to_string),
    );
    field_line(out, "Page count", metadata.page_count.map(|c| c.to_string()));
    field_line(out, "Word count", metadata.word_count.map(|c| c.to_string()));
}

/// Renders document metadata, either from the `Document` thunk or from a
/// standalone `Metadata` event. Missing fields render as `unidentified`.
#[derive(Default)]
pub struct MetaDataWriter {
    _private: (),
}

impl MetaDataWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Writer for MetaDataWriter {
    fn write_to(&mut self, message: &Message, out: &mut String) -> Result<()> {
        match message {
            Message::Document(document) => {
                let metadata = (document.metadata)();
                write_metadata_block(&metadata, out);
            }
            Message::Metadata(metadata) => write_metadata_block(metadata, out),
            _ => {}
        }
        Ok(())
    }
}

//! Writers: fold a structural event stream into output text.
//!
//! A writer is the stateful half of an exporter stage: it receives every
//! event between a `Document` and its `CloseDocument` and appends the
//! rendered form to an output buffer. The exporter stages in
//! [`crate::exporters`] own the buffer lifecycle and emit the final
//! `data_source`.

mod csv;
mod html;
mod meta_data;
mod plain_text;

pub use csv::CsvWriter;
pub use html::HtmlWriter;
pub use meta_data::MetaDataWriter;
pub use plain_text::{LinkFormatter, PlainTextWriter};

use crate::error::Result;
use crate::message::Message;

/// Fold events into an output buffer.
pub trait Writer: Send {
    fn write_to(&mut self, message: &Message, out: &mut String) -> Result<()>;
}

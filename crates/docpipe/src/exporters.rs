//! Exporter stages: fold an event stream into a single terminal
//! `data_source`.
//!
//! Between a `Document` and its matching `CloseDocument` an exporter feeds
//! every event to its writer; on the outermost close it emits exactly one
//! `data_source` carrying the accumulated bytes and the output extension.
//! Nested documents increment a depth counter and are coalesced into the
//! outermost emission. A stream that ends without closing its document is
//! flushed silently at end of input.
//!
//! The four exporters are one mechanism parameterised by a writer; they only
//! differ in the writer they instantiate and the extension they stamp.

use crate::chain::{ChainElement, Continuation, Emit, impl_stage_bitor};
use crate::data_source::DataSource;
use crate::error::Result;
use crate::message::Message;
use crate::mime::FileExtension;
use crate::writers::{CsvWriter, HtmlWriter, LinkFormatter, MetaDataWriter, PlainTextWriter, Writer};

struct ExporterCore<W: Writer> {
    writer: W,
    extension: &'static str,
    buffer: Option<String>,
    nested_level: usize,
}

impl<W: Writer> ExporterCore<W> {
    fn new(writer: W, extension: &'static str) -> Self {
        Self {
            writer,
            extension,
            buffer: None,
            nested_level: 0,
        }
    }

    fn emit_accumulated(&mut self, emit: &mut Emit<'_>) -> Result<Continuation> {
        let Some(text) = self.buffer.take() else {
            return Ok(Continuation::Proceed);
        };
        self.nested_level = 0;
        emit.send(Message::DataSource(
            DataSource::from_vec(text.into_bytes())
                .with_file_extension(FileExtension::new(self.extension)),
        ))
    }

    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
        match message {
            Message::ExceptionCarrier(_) | Message::StartProcessing => emit.send(message),
            message => {
                if matches!(message, Message::Document(_)) || self.buffer.is_none() {
                    self.nested_level += 1;
                    if self.nested_level == 1 {
                        self.buffer = Some(String::new());
                    }
                }
                let Some(buffer) = self.buffer.as_mut() else {
                    return Ok(Continuation::Proceed);
                };
                self.writer.write_to(&message, buffer)?;
                if matches!(message, Message::CloseDocument) {
                    self.nested_level = self.nested_level.saturating_sub(1);
                    if self.nested_level == 0 {
                        return self.emit_accumulated(emit);
                    }
                }
                Ok(Continuation::Proceed)
            }
        }
    }

    fn finish(&mut self, emit: &mut Emit<'_>) -> Result<Continuation> {
        // Missing CloseDocument at end of stream: flush silently. A buffer
        // that never accumulated anything (stray non-document messages) is
        // discarded instead of producing an empty output.
        if self.buffer.as_ref().is_some_and(|b| b.is_empty()) {
            self.buffer = None;
            self.nested_level = 0;
            return Ok(Continuation::Proceed);
        }
        self.emit_accumulated(emit)
    }
}

macro_rules! exporter_stage {
    ($(#[$doc:meta])* $name:ident, $writer:ty, $extension:literal, $stage_name:literal) => {
        $(#[$doc])*
        pub struct $name {
            core: ExporterCore<$writer>,
        }

        impl ChainElement for $name {
            fn name(&self) -> &'static str {
                $stage_name
            }

            fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
                self.core.process(message, emit)
            }

            fn finish(&mut self, emit: &mut Emit<'_>) -> Result<Continuation> {
                self.core.finish(emit)
            }
        }

        impl_stage_bitor!($name);
    };
}

exporter_stage!(
    /// Exports the event stream as plain text (`.txt`).
    PlainTextExporter,
    PlainTextWriter,
    "txt",
    "plain-text-exporter"
);

impl PlainTextExporter {
    /// Exporter with `\n` line endings and default link formatting.
    pub fn new() -> Self {
        Self::with_eol("\n")
    }

    /// Exporter with a custom end-of-line sequence.
    pub fn with_eol(eol: impl Into<String>) -> Self {
        Self {
            core: ExporterCore::new(PlainTextWriter::new(eol), "txt"),
        }
    }

    /// Exporter with custom link formatting callbacks.
    pub fn with_link_formatter(eol: impl Into<String>, link_formatter: LinkFormatter) -> Self {
        Self {
            core: ExporterCore::new(PlainTextWriter::with_link_formatter(eol, link_formatter), "txt"),
        }
    }
}

impl Default for PlainTextExporter {
    fn default() -> Self {
        Self::new()
    }
}

exporter_stage!(
    /// Exports the event stream as an HTML document (`.html`).
    HtmlExporter,
    HtmlWriter,
    "html",
    "html-exporter"
);

impl HtmlExporter {
    pub fn new() -> Self {
        Self {
            core: ExporterCore::new(HtmlWriter::new(), "html"),
        }
    }
}

impl Default for HtmlExporter {
    fn default() -> Self {
        Self::new()
    }
}

exporter_stage!(
    /// Exports table content as CSV (`.csv`).
    CsvExporter,
    CsvWriter,
    "csv",
    "csv-exporter"
);

impl CsvExporter {
    pub fn new() -> Self {
        Self {
            core: ExporterCore::new(CsvWriter::new(), "csv"),
        }
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

exporter_stage!(
    /// Exports the document metadata block (`.txt`).
    MetaDataExporter,
    MetaDataWriter,
    "txt",
    "meta-data-exporter"
);

impl MetaDataExporter {
    pub fn new() -> Self {
        Self {
            core: ExporterCore::new(MetaDataWriter::new(), "txt"),
        }
    }
}

impl Default for MetaDataExporter {
    fn default() -> Self {
        Self::new()
    }
}

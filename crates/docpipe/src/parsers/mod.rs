//! Parser contract, registry and the dispatch stage.
//!
//! A parser is a leaf module whose only contract is: accept a `data_source`,
//! emit the structural event stream framed by `Document` / `CloseDocument`.
//! The library ships one built-in parser (plain text); format parsers for
//! office documents, mail stores, PDFs and the like plug into the process-wide
//! registry and are routed to by [`ParseBySignature`] based on the MIME
//! evidence a data source carries.

mod plain_text;

pub use plain_text::PlainTextParser;

use crate::chain::{ChainElement, Continuation, Emit, impl_stage_bitor};
use crate::content_type;
use crate::data_source::DataSource;
use crate::error::{PipelineError, Result};
use crate::message::Message;
use crate::mime::{Confidence, MimeType};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

/// A format parser: turns one data source into a structural event stream.
pub trait Parser: Send + Sync {
    /// Parser name for diagnostics and registry listings.
    fn name(&self) -> &'static str;

    /// MIME types this parser accepts.
    fn supported_mime_types(&self) -> &'static [&'static str];

    /// Emit the event stream for `data`. The emission must be framed by a
    /// `Document` / `CloseDocument` pair and nest as a balanced forest.
    fn parse(&self, data: &DataSource, emit: &mut Emit<'_>) -> Result<Continuation>;
}

/// Process-wide parser registry.
///
/// Registration order matters: the most recently registered parser for a MIME
/// type wins, so applications can override the built-ins.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn Parser>>,
}

impl ParserRegistry {
    pub fn register(&mut self, parser: Arc<dyn Parser>) {
        tracing::debug!(parser = parser.name(), "registering parser");
        self.parsers.push(parser);
    }

    /// The parser handling `mime`, if any.
    pub fn find_for_mime(&self, mime: &MimeType) -> Option<Arc<dyn Parser>> {
        self.parsers
            .iter()
            .rev()
            .find(|p| p.supported_mime_types().contains(&mime.as_str()))
            .cloned()
    }

    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }
}

static PARSER_REGISTRY: Lazy<RwLock<ParserRegistry>> = Lazy::new(|| {
    let mut registry = ParserRegistry::default();
    registry.register(Arc::new(PlainTextParser::new()));
    RwLock::new(registry)
});

/// Access the process-wide parser registry.
pub fn get_parser_registry() -> &'static RwLock<ParserRegistry> {
    &PARSER_REGISTRY
}

/// Dispatch stage: routes each `data_source` to the registered parser for its
/// highest-confidence MIME type.
///
/// Sources arriving without usable evidence (for example archive entries that
/// skipped the top-level detector) are run through the detection bundle
/// first. Encrypted sources fail fast with the `file_encrypted` tag. A source
/// no registered parser understands produces an `uninterpretable_data`
/// exception carrier rather than failing this stage; what becomes of the
/// carrier is up to the terminal adapter (collectors accumulate it, a byte
/// sink fails the run).
pub struct ParseBySignature {
    _private: (),
}

impl ParseBySignature {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for ParseBySignature {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainElement for ParseBySignature {
    fn name(&self) -> &'static str {
        "parse-by-signature"
    }

    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
        let Message::DataSource(mut data) = message else {
            return emit.send(message);
        };
        if data.highest_confidence() < Confidence::Medium {
            content_type::detect(&mut data)?;
        }
        data.assert_not_encrypted()?;

        let parser = {
            let registry = PARSER_REGISTRY.read();
            match data.highest_confidence_mime_type() {
                Some(mime) => registry.find_for_mime(mime).or_else(|| {
                    // Any textual type degrades gracefully to the plain-text
                    // parser.
                    mime.is_text()
                        .then(|| registry.find_for_mime(&MimeType::new(crate::mime::PLAIN_TEXT_MIME_TYPE)))
                        .flatten()
                }),
                None => None,
            }
        };

        let Some(parser) = parser else {
            let mime = data
                .highest_confidence_mime_type()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return emit.send(Message::carrier(PipelineError::uninterpretable_data(format!(
                "no parser available for {mime}"
            ))));
        };
        tracing::debug!(parser = parser.name(), "dispatching data source");
        parser.parse(&data, emit)
    }
}

impl_stage_bitor!(ParseBySignature);

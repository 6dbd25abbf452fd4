//! Built-in plain-text parser.

use super::Parser;
use crate::chain::{Continuation, Emit};
use crate::data_source::DataSource;
use crate::error::Result;
use crate::message::{Document, Message, Text};
use crate::mime::{CSV_MIME_TYPE, MARKDOWN_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};

/// Promotes a textual data source into a document with one text run per line.
///
/// Line endings are normalized: both `\n` and `\r\n` become `BreakLine`
/// events, so the writer's configured end-of-line sequence decides the
/// output form.
pub struct PlainTextParser {
    _private: (),
}

impl PlainTextParser {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PlainTextParser {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn supported_mime_types(&self) -> &'static [&'static str] {
        &[PLAIN_TEXT_MIME_TYPE, MARKDOWN_MIME_TYPE, CSV_MIME_TYPE, "text/x-log"]
    }

    fn parse(&self, data: &DataSource, emit: &mut Emit<'_>) -> Result<Continuation> {
        let content = data.string(None)?;
        if emit.send(Message::Document(Document::without_metadata()))? == Continuation::Stop {
            return Ok(Continuation::Proceed);
        }
        let mut pieces = content.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            let line = piece.strip_suffix('\r').unwrap_or(piece);
            let last = pieces.peek().is_none();
            if !line.is_empty()
                && emit.send(Message::Text(Text::new(line)))? == Continuation::Stop
            {
                return Ok(Continuation::Proceed);
            }
            if !last && emit.send(Message::BreakLine)? == Continuation::Stop {
                return Ok(Continuation::Proceed);
            }
        }
        emit.send(Message::CloseDocument)?;
        Ok(Continuation::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainElement, Pipeline};
    use crate::input::Input;
    use crate::output::CollectorOutput;
    use crate::parsers::ParseBySignature;

    fn events_for(text: &str) -> Vec<String> {
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = ParseBySignature::new() | collector;
        pipeline
            .process(Input::data_source(
                crate::data_source::DataSource::from_string(text).with_file_extension("txt".into()),
            ))
            .unwrap();
        let out = messages
            .lock()
            .iter()
            .map(|m| m.variant_name().to_string())
            .collect();
        out
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(
            events_for("a\r\nb"),
            vec!["StartProcessing", "Document", "Text", "BreakLine", "Text", "CloseDocument"]
        );
    }

    #[test]
    fn test_blank_lines_keep_breaks() {
        assert_eq!(
            events_for("a\n\nb"),
            vec![
                "StartProcessing",
                "Document",
                "Text",
                "BreakLine",
                "BreakLine",
                "Text",
                "CloseDocument"
            ]
        );
    }

    #[test]
    fn test_is_not_a_leaf() {
        assert!(!ParseBySignature::new().is_leaf());
        let _ = Pipeline::from_element(ParseBySignature::new());
    }
}

//! Input adapters: promote paths, streams, strings and buffers into the
//! initial pipeline message.

use crate::chain::Pipeline;
use crate::data_source::DataSource;
use crate::error::Result;
use crate::message::Message;
use std::io::{Read, Seek};
use std::ops::BitOr;
use std::path::{Path, PathBuf};

/// The left end of a pipeline: whatever the caller has in hand.
pub enum Input {
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
    SeekableReader(Box<dyn ReadSeekSend>),
    DataSource(DataSource),
}

/// Object-safe `Read + Seek + Send` bound for seekable inputs.
pub trait ReadSeekSend: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeekSend for T {}

impl Input {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }

    /// Forward-only stream input.
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Random-access stream input.
    pub fn seekable<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Input::SeekableReader(Box::new(reader))
    }

    pub fn data_source(data: DataSource) -> Self {
        Input::DataSource(data)
    }

    /// The message sequence the driver injects: the start-processing control
    /// signal followed by the initial data source.
    pub(crate) fn into_messages(self) -> [Message; 2] {
        let data = match self {
            Input::Path(path) => DataSource::from_path(path),
            Input::Text(text) => DataSource::from_string(text),
            Input::Bytes(bytes) => DataSource::from_vec(bytes),
            Input::Reader(reader) => DataSource::from_unseekable(reader),
            Input::SeekableReader(reader) => DataSource::from_seekable(reader),
            Input::DataSource(data) => data,
        };
        [Message::StartProcessing, Message::DataSource(data)]
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl From<DataSource> for Input {
    fn from(data: DataSource) -> Self {
        Input::DataSource(data)
    }
}

/// Connecting an input to a chain runs it immediately when the chain ends in
/// a terminal stage; otherwise the input is consumed and the (still lazy)
/// chain is handed back unchanged.
///
/// ```rust
/// use docpipe::DataSource;
/// use docpipe::exporters::PlainTextExporter;
/// use docpipe::input::Input;
/// use docpipe::output::StreamOutput;
/// use docpipe::parsers::ParseBySignature;
///
/// # fn main() -> docpipe::Result<()> {
/// let chain = ParseBySignature::new() | PlainTextExporter::new() | StreamOutput::new(std::io::sink());
/// let note = DataSource::from_string("hello world").with_file_extension("txt".into());
/// let _chain = (Input::data_source(note) | chain)?;
/// # Ok(())
/// # }
/// ```
impl BitOr<Pipeline> for Input {
    type Output = Result<Pipeline>;

    fn bitor(self, mut rhs: Pipeline) -> Result<Pipeline> {
        if rhs.is_runnable() {
            rhs.process(self)?;
        }
        Ok(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_input_keeps_extension() {
        let [start, data] = Input::path("mail/archive.pst").into_messages();
        assert!(matches!(start, Message::StartProcessing));
        let Message::DataSource(ds) = data else {
            panic!("expected data source");
        };
        assert_eq!(ds.file_extension().unwrap().as_str(), "pst");
    }

    #[test]
    fn test_text_input_carries_bytes() {
        let [_, data] = Input::text("plain body").into_messages();
        let Message::DataSource(ds) = data else {
            panic!("expected data source");
        };
        assert_eq!(ds.string(None).unwrap(), "plain body");
        assert!(ds.file_extension().is_none());
    }

    #[test]
    fn test_connecting_input_runs_terminal_chain() {
        let (collector, messages) = crate::output::CollectorOutput::new();
        let chain = Pipeline::from_element(collector);
        let _chain = (Input::text("go") | chain).unwrap();
        // StartProcessing plus the data source reached the collector.
        assert_eq!(messages.lock().len(), 2);
    }

    #[test]
    fn test_connecting_input_to_lazy_chain_is_a_no_op() {
        let chain = Pipeline::from_element(crate::chain::transform(
            "noop",
            |m, emit: &mut crate::chain::Emit<'_>| emit.send(m),
        ));
        let chain = (Input::text("nothing runs") | chain).unwrap();
        assert!(!chain.is_runnable());
        assert_eq!(chain.len(), 1);
    }
}

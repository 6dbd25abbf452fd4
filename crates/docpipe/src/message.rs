//! The typed message envelope flowing between pipeline stages.
//!
//! Every in-flight value is a [`Message`]: a data source, a document bracket,
//! a structural event, a control signal, or an error carrier. Stages match on
//! the variants they understand and forward the rest unchanged.
//!
//! Structural events nest as a balanced forest between a [`Message::Document`]
//! and its [`Message::CloseDocument`]: every `X` has a matching `CloseX`,
//! tables contain only rows, rows only cells, and cells may contain any
//! content including nested tables.

use crate::data_source::DataSource;
use crate::error::PipelineError;
use crate::metadata::Metadata;
use crate::mime::FileExtension;
use std::sync::Arc;

/// Thunk producing document metadata on demand.
///
/// Parsers often can compute metadata cheaply only while their internal state
/// is alive, but consumers rarely want it; the thunk defers the work until a
/// metadata consumer asks.
pub type MetadataThunk = Arc<dyn Fn() -> Metadata + Send + Sync>;

/// Opening bracket of a logical document.
#[derive(Clone)]
pub struct Document {
    pub metadata: MetadataThunk,
}

impl Document {
    pub fn new(metadata: MetadataThunk) -> Self {
        Self { metadata }
    }

    /// Document with empty metadata.
    pub fn without_metadata() -> Self {
        Self {
            metadata: Arc::new(Metadata::new),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Document")
    }
}

/// A run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// List opening event. `list_type` is `"decimal"`, `"disc"`, `"none"`, or a
/// custom marker string rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub list_type: String,
}

impl Default for List {
    fn default() -> Self {
        Self {
            list_type: "disc".to_string(),
        }
    }
}

impl List {
    pub fn decimal() -> Self {
        Self {
            list_type: "decimal".to_string(),
        }
    }

    pub fn disc() -> Self {
        Self::default()
    }

    pub fn custom(marker: impl Into<String>) -> Self {
        Self {
            list_type: marker.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub alt: Option<String>,
    pub src: Option<String>,
}

/// Mail opening event. `date` is a unix timestamp in seconds; `level` is the
/// nesting depth inside a mailbox tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mail {
    pub subject: Option<String>,
    pub date: Option<i64>,
    pub level: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub extension: Option<FileExtension>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    pub name: Option<String>,
    pub level: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub author: Option<String>,
    pub time: Option<String>,
    pub body: Option<String>,
}

/// The tagged sum of everything that can flow through a pipeline.
#[derive(Debug, Clone)]
pub enum Message {
    /// Pipeline start control signal, delivered before the first data source.
    StartProcessing,
    /// An opaque byte source with MIME evidence.
    DataSource(DataSource),
    /// An error escaping a stage, carried as a value so the pipeline keeps
    /// flowing. Downstream stages forward it by default.
    ExceptionCarrier(Arc<PipelineError>),
    /// An embedding vector produced by an AI stage.
    Embedding(Vec<f64>),

    Document(Document),
    CloseDocument,

    Text(Text),
    BreakLine,
    Paragraph,
    CloseParagraph,
    Section,
    CloseSection,
    Header,
    CloseHeader,
    Footer,
    CloseFooter,

    List(List),
    ListItem,
    CloseListItem,
    CloseList,

    Table,
    TableRow,
    TableCell,
    CloseTableCell,
    CloseTableRow,
    CloseTable,

    Link(Link),
    CloseLink,
    Image(Image),

    Bold,
    CloseBold,
    Italic,
    CloseItalic,
    Underline,
    CloseUnderline,

    Mail(Mail),
    MailBody,
    CloseMailBody,
    CloseMail,
    Attachment(Attachment),
    CloseAttachment,
    Folder(Folder),
    CloseFolder,

    Comment(Comment),
    Page,
    ClosePage,

    Metadata(Metadata),
}

impl Message {
    /// Wrap an error into a carrier message.
    pub fn carrier(error: PipelineError) -> Self {
        Message::ExceptionCarrier(Arc::new(error))
    }

    /// Whether this message opens a container frame (`Document`, `Mail`,
    /// `Folder`, `Attachment`). Container frames are the resynchronisation
    /// points for the `skip` continuation.
    pub fn opens_container_frame(&self) -> bool {
        matches!(
            self,
            Message::Document(_) | Message::Mail(_) | Message::Folder(_) | Message::Attachment(_)
        )
    }

    /// Whether this message closes a container frame.
    pub fn closes_container_frame(&self) -> bool {
        matches!(
            self,
            Message::CloseDocument | Message::CloseMail | Message::CloseFolder | Message::CloseAttachment
        )
    }

    /// Short variant name for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Message::StartProcessing => "StartProcessing",
            Message::DataSource(_) => "DataSource",
            Message::ExceptionCarrier(_) => "ExceptionCarrier",
            Message::Embedding(_) => "Embedding",
            Message::Document(_) => "Document",
            Message::CloseDocument => "CloseDocument",
            Message::Text(_) => "Text",
            Message::BreakLine => "BreakLine",
            Message::Paragraph => "Paragraph",
            Message::CloseParagraph => "CloseParagraph",
            Message::Section => "Section",
            Message::CloseSection => "CloseSection",
            Message::Header => "Header",
            Message::CloseHeader => "CloseHeader",
            Message::Footer => "Footer",
            Message::CloseFooter => "CloseFooter",
            Message::List(_) => "List",
            Message::ListItem => "ListItem",
            Message::CloseListItem => "CloseListItem",
            Message::CloseList => "CloseList",
            Message::Table => "Table",
            Message::TableRow => "TableRow",
            Message::TableCell => "TableCell",
            Message::CloseTableCell => "CloseTableCell",
            Message::CloseTableRow => "CloseTableRow",
            Message::CloseTable => "CloseTable",
            Message::Link(_) => "Link",
            Message::CloseLink => "CloseLink",
            Message::Image(_) => "Image",
            Message::Bold => "Bold",
            Message::CloseBold => "CloseBold",
            Message::Italic => "Italic",
            Message::CloseItalic => "CloseItalic",
            Message::Underline => "Underline",
            Message::CloseUnderline => "CloseUnderline",
            Message::Mail(_) => "Mail",
            Message::MailBody => "MailBody",
            Message::CloseMailBody => "CloseMailBody",
            Message::CloseMail => "CloseMail",
            Message::Attachment(_) => "Attachment",
            Message::CloseAttachment => "CloseAttachment",
            Message::Folder(_) => "Folder",
            Message::CloseFolder => "CloseFolder",
            Message::Comment(_) => "Comment",
            Message::Page => "Page",
            Message::ClosePage => "ClosePage",
            Message::Metadata(_) => "Metadata",
        }
    }
}

//! docpipe - Document-Ingestion Pipeline Toolkit
//!
//! docpipe takes opaque byte streams that may be office documents, emails,
//! archives or arbitrary files, identifies what they are, decomposes them into
//! a uniform stream of semantic structural events, and reassembles those
//! events into requested output forms (plain text, HTML, CSV, metadata
//! dumps).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docpipe::chain::Pipeline;
//! use docpipe::container::DecompressArchives;
//! use docpipe::content_type;
//! use docpipe::exporters::PlainTextExporter;
//! use docpipe::input::Input;
//! use docpipe::output::StreamOutput;
//! use docpipe::parsers::ParseBySignature;
//!
//! # fn main() -> docpipe::Result<()> {
//! let mut pipeline = content_type::detector()
//!     | DecompressArchives::new()
//!     | ParseBySignature::new()
//!     | PlainTextExporter::new()
//!     | StreamOutput::new(std::io::stdout());
//! pipeline.process(Input::path("report.zip"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Message envelope** ([`message`]): the typed sum of everything flowing
//!   between stages - data sources, structural events, control signals and
//!   exception carriers.
//! - **Data source** ([`data_source`]): lazy, cacheable byte source carrying
//!   layered MIME-type evidence.
//! - **Content typing** ([`content_type`]): pluggable detectors accumulating
//!   evidence with graded confidence.
//! - **Chains** ([`chain`]): the stage contract, `|` composition, and the
//!   cooperative driver with skip/stop/error propagation.
//! - **Containers** ([`container`]): archives re-entering the pipeline.
//! - **Writers** ([`writers`], [`exporters`]): folding event streams into
//!   terminal data sources.
//!
//! Format parsers beyond plain text are external: they implement
//! [`parsers::Parser`] and register with the process-wide registry.

#![deny(unsafe_code)]

pub mod chain;
pub mod container;
pub mod content_type;
pub mod data_source;
pub mod error;
pub mod exporters;
pub mod filters;
pub mod input;
pub mod message;
pub mod metadata;
pub mod mime;
pub mod output;
pub mod parsers;
pub mod support;
pub mod writers;

pub use chain::{ChainElement, Continuation, Emit, Pipeline};
pub use data_source::DataSource;
pub use error::{ErrorTag, PipelineError, Result};
pub use input::Input;
pub use message::Message;
pub use metadata::{CivilDateTime, Metadata, Variant};
pub use mime::{Confidence, FileExtension, MimeType};

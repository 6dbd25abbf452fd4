//! The chain element contract and pipeline composition.
//!
//! A pipeline is an ordered chain of stages. Each stage implements
//! [`ChainElement::process`]: it receives one message, may emit zero or more
//! messages to the next stage through [`Emit`], and answers the driver with a
//! [`Continuation`].
//!
//! Composition uses `|` and `|=`:
//!
//! ```rust
//! use docpipe::DataSource;
//! use docpipe::content_type;
//! use docpipe::exporters::PlainTextExporter;
//! use docpipe::input::Input;
//! use docpipe::output::StreamOutput;
//! use docpipe::parsers::ParseBySignature;
//!
//! # fn main() -> docpipe::Result<()> {
//! let mut pipeline = content_type::detector()
//!     | ParseBySignature::new()
//!     | PlainTextExporter::new()
//!     | StreamOutput::new(std::io::sink());
//! let note = DataSource::from_string("hello").with_file_extension("txt".into());
//! pipeline.process(Input::data_source(note))?;
//! # Ok(())
//! # }
//! ```
//!
//! Execution is single-threaded and cooperative: the driver hands each message
//! to the first stage and every emission is forwarded depth-first, eagerly, in
//! emission order. There is no buffering or reordering, which is what lets
//! writers rely on structural balance.

mod pipeline;
mod transform;

pub use pipeline::Pipeline;
pub use transform::{Transform, transform};

use crate::error::Result;
use crate::message::Message;

/// A stage's answer to the driver after processing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Normal flow; the driver keeps delivering messages.
    Proceed,
    /// Abandon the current container frame (document, mail, folder,
    /// attachment): the driver drops further messages for this stage until
    /// the frame's matching close.
    Skip,
    /// Terminate the whole pipeline; no further messages flow anywhere.
    Stop,
}

/// Sink through which a stage emits messages to the next stage.
///
/// The returned [`Continuation`] is the downstream verdict: a well-behaved
/// stage stops emitting the current sub-tree on [`Continuation::Skip`] and
/// stops emitting entirely on [`Continuation::Stop`]. The driver enforces both
/// regardless, so ignoring the verdict affects efficiency, not correctness.
pub struct Emit<'a> {
    sink: &'a mut dyn FnMut(Message) -> Result<Continuation>,
}

impl<'a> Emit<'a> {
    pub(crate) fn new(sink: &'a mut dyn FnMut(Message) -> Result<Continuation>) -> Self {
        Self { sink }
    }

    /// Deliver one message to the next stage.
    pub fn send(&mut self, message: Message) -> Result<Continuation> {
        (self.sink)(message)
    }
}

/// One unit of pipeline processing.
///
/// Stages may carry private mutable state; a pipeline is entered by exactly
/// one thread at a time, so no internal synchronisation is needed for it.
pub trait ChainElement: Send {
    /// Stage name for diagnostics.
    fn name(&self) -> &'static str;

    /// Consume one message, emitting zero or more messages downstream.
    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation>;

    /// End-of-stream notification, delivered once after the input is
    /// exhausted. Stages holding buffered state (writers with an unclosed
    /// document) flush it here.
    fn finish(&mut self, emit: &mut Emit<'_>) -> Result<Continuation> {
        let _ = emit;
        Ok(Continuation::Proceed)
    }

    /// Terminal stages cannot be composed further; a pipeline only runs when
    /// its last stage is a leaf.
    fn is_leaf(&self) -> bool {
        false
    }
}

/// Implements `stage | stage` composition for concrete stage types.
macro_rules! impl_stage_bitor {
    ($($ty:ty),+ $(,)?) => {$(
        impl<Rhs: $crate::chain::ChainElement + 'static> std::ops::BitOr<Rhs> for $ty {
            type Output = $crate::chain::Pipeline;

            fn bitor(self, rhs: Rhs) -> $crate::chain::Pipeline {
                $crate::chain::Pipeline::from_element(self) | rhs
            }
        }
    )+};
}
pub(crate) use impl_stage_bitor;

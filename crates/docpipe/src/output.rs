//! Output adapters: terminal stages draining the pipeline.

use crate::chain::{ChainElement, Continuation, Emit, impl_stage_bitor};
use crate::error::{PipelineError, Result};
use crate::message::Message;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Per-message error handler installed on a [`StreamOutput`].
pub type WarningHandler = Box<dyn FnMut(&PipelineError) + Send>;

/// Terminal stage copying the byte payload of every received `data_source`
/// into an [`io::Write`](std::io::Write) sink.
///
/// Control signals are ignored. An exception carrier is reported to the
/// warning handler (or logged) and then fails the run: only `data_source`
/// payloads can be written to a byte sink, so an error value arriving here
/// has nowhere left to go. A structural event reaching this stage means the
/// pipeline is missing an exporter, which is a `program_logic` error.
pub struct StreamOutput<W: Write + Send> {
    sink: W,
    on_warning: Option<WarningHandler>,
}

/// Keeps a still-shared carried error intact as a cause, so tag queries keep
/// walking into the original chain.
#[derive(Debug)]
struct SharedCarrier(Arc<PipelineError>);

impl std::fmt::Display for SharedCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedCarrier {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

impl<W: Write + Send> StreamOutput<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            on_warning: None,
        }
    }

    /// Install a handler invoked for every exception carrier that reaches the
    /// output.
    pub fn with_warning_handler(mut self, handler: impl FnMut(&PipelineError) + Send + 'static) -> Self {
        self.on_warning = Some(Box::new(handler));
        self
    }
}

impl<W: Write + Send> ChainElement for StreamOutput<W> {
    fn name(&self) -> &'static str {
        "stream-output"
    }

    fn process(&mut self, message: Message, _emit: &mut Emit<'_>) -> Result<Continuation> {
        match message {
            Message::DataSource(data) => {
                let span = data.span(None)?;
                self.sink.write_all(&span)?;
                Ok(Continuation::Proceed)
            }
            Message::StartProcessing => Ok(Continuation::Proceed),
            Message::ExceptionCarrier(error) => {
                match &mut self.on_warning {
                    Some(handler) => handler(&error),
                    None => tracing::warn!(error = %error, "exception carrier reached output"),
                }
                Err(match Arc::try_unwrap(error) {
                    Ok(error) => error,
                    Err(shared) => PipelineError::with_source(
                        "exception carrier reached the stream output",
                        SharedCarrier(shared),
                    ),
                })
            }
            other => Err(PipelineError::program_logic(format!(
                "{} message reached the stream output; an exporter stage is missing",
                other.variant_name()
            ))),
        }
    }

    fn finish(&mut self, _emit: &mut Emit<'_>) -> Result<Continuation> {
        self.sink.flush()?;
        Ok(Continuation::Proceed)
    }

    fn is_leaf(&self) -> bool {
        true
    }
}

/// Terminal stage accumulating every received message into a shared vector.
pub struct CollectorOutput {
    sink: Arc<Mutex<Vec<Message>>>,
}

impl CollectorOutput {
    /// Create a collector and the handle the caller reads after the run.
    pub fn new() -> (Self, Arc<Mutex<Vec<Message>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Self { sink: sink.clone() }, sink)
    }

    /// Collector over a caller-provided sink.
    pub fn into_sink(sink: Arc<Mutex<Vec<Message>>>) -> Self {
        Self { sink }
    }
}

impl ChainElement for CollectorOutput {
    fn name(&self) -> &'static str {
        "collector-output"
    }

    fn process(&mut self, message: Message, _emit: &mut Emit<'_>) -> Result<Continuation> {
        self.sink.lock().push(message);
        Ok(Continuation::Proceed)
    }

    fn is_leaf(&self) -> bool {
        true
    }
}

impl_stage_bitor!(CollectorOutput);

impl<W: Write + Send + 'static, Rhs: ChainElement + 'static> std::ops::BitOr<Rhs> for StreamOutput<W> {
    type Output = crate::chain::Pipeline;

    fn bitor(self, rhs: Rhs) -> crate::chain::Pipeline {
        crate::chain::Pipeline::from_element(self) | rhs
    }
}

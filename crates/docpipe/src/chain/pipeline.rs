//! Pipeline composition and the cooperative driver.

use super::{ChainElement, Continuation, Emit};
use crate::error::{PipelineError, Result};
use crate::input::Input;
use crate::message::Message;
use std::ops::{BitOr, BitOrAssign};

struct Link {
    element: Box<dyn ChainElement>,
    /// Container-frame depth of the messages delivered into this link.
    depth: usize,
    /// When set, messages are dropped until the frame at this depth closes.
    skip_to: Option<usize>,
}

impl Link {
    fn new(element: Box<dyn ChainElement>) -> Self {
        Self {
            element,
            depth: 0,
            skip_to: None,
        }
    }
}

/// An ordered composition of chain elements.
///
/// Built with `|` / `|=` (composition is associative and lazy) and driven to
/// completion with [`Pipeline::process`]. The same pipeline can process
/// several inputs in sequence; stage state carries over only where a stage
/// chooses to keep it.
#[derive(Default)]
pub struct Pipeline {
    links: Vec<Link>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline containing a single stage.
    pub fn from_element(element: impl ChainElement + 'static) -> Self {
        let mut pipeline = Self::new();
        pipeline.push(element);
        pipeline
    }

    /// Append a stage at the end.
    pub fn push(&mut self, element: impl ChainElement + 'static) {
        self.links.push(Link::new(Box::new(element)));
    }

    /// Append all stages of another pipeline.
    pub fn append(&mut self, mut other: Pipeline) {
        self.links.append(&mut other.links);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Whether the pipeline ends in a terminal stage and can be driven.
    pub fn is_runnable(&self) -> bool {
        self.links.last().is_some_and(|l| l.element.is_leaf())
    }

    /// Drive the pipeline to completion over one input.
    ///
    /// The driver synthesises a [`Message::StartProcessing`] control signal
    /// followed by the input's initial `data_source` message, then delivers
    /// every emission depth-first in strict emission order. After the input is
    /// exhausted each stage's [`ChainElement::finish`] runs in chain order, so
    /// buffered state is flushed even when the event stream ended without a
    /// closing bracket.
    ///
    /// # Errors
    ///
    /// Fails with a `program_logic` error when the last stage is not a leaf.
    /// Errors raised by intermediate stages are wrapped into
    /// [`Message::ExceptionCarrier`] messages and keep flowing; an error from
    /// the terminal stage (or an error raised while a carrier was being
    /// delivered) is fatal and is returned to the caller.
    pub fn process(&mut self, input: impl Into<Input>) -> Result<()> {
        if !self.is_runnable() {
            return Err(PipelineError::program_logic(
                "pipeline cannot run: the last stage is not a terminal (leaf) stage",
            ));
        }
        for link in &mut self.links {
            link.depth = 0;
            link.skip_to = None;
        }
        let mut stopped = false;
        let mut fatal = false;
        let input = input.into();
        tracing::debug!(stages = self.links.len(), "pipeline start");
        for message in input.into_messages() {
            match deliver(&mut self.links, &mut stopped, &mut fatal, message)? {
                Continuation::Stop => break,
                Continuation::Proceed | Continuation::Skip => {}
            }
        }
        if !stopped {
            finish(&mut self.links, &mut stopped, &mut fatal)?;
        }
        tracing::debug!(stopped, "pipeline end");
        Ok(())
    }
}

/// Deliver one message into the chain suffix, depth-first.
fn deliver(
    links: &mut [Link],
    stopped: &mut bool,
    fatal: &mut bool,
    message: Message,
) -> Result<Continuation> {
    if *stopped {
        return Ok(Continuation::Stop);
    }
    let Some((link, rest)) = links.split_first_mut() else {
        return Ok(Continuation::Proceed);
    };

    let opens = message.opens_container_frame();
    let closes = message.closes_container_frame();
    let is_carrier = matches!(message, Message::ExceptionCarrier(_));

    if let Some(resume_depth) = link.skip_to {
        if opens {
            link.depth += 1;
        }
        if closes {
            link.depth = link.depth.saturating_sub(1);
            if link.depth <= resume_depth {
                link.skip_to = None;
            }
        }
        tracing::trace!(
            stage = link.element.name(),
            variant = message.variant_name(),
            "dropped: inside skipped frame"
        );
        return Ok(Continuation::Skip);
    }

    if opens {
        link.depth += 1;
    }
    if closes {
        link.depth = link.depth.saturating_sub(1);
    }

    let outcome = link
        .element
        .process(message, &mut Emit::new(&mut |m| deliver(rest, stopped, fatal, m)));
    match outcome {
        Ok(Continuation::Proceed) => Ok(Continuation::Proceed),
        Ok(Continuation::Skip) => {
            // Unwind to the most recent enclosing container frame. The frame's
            // close is dropped too: its open never reached downstream.
            if link.depth > 0 {
                link.skip_to = Some(link.depth - 1);
            }
            Ok(Continuation::Skip)
        }
        Ok(Continuation::Stop) => {
            tracing::debug!(stage = link.element.name(), "stage requested stop");
            *stopped = true;
            Ok(Continuation::Stop)
        }
        Err(error) => {
            // Fatal cases: the terminal stage failed, the stage was already
            // handling a carrier, or a fatal error is unwinding through this
            // link's emission. Re-wrapping any of these would loop the same
            // failure through the chain again.
            if rest.is_empty() || is_carrier || *fatal {
                *fatal = true;
                return Err(error);
            }
            tracing::warn!(
                stage = link.element.name(),
                error = %error,
                "stage failed; injecting exception carrier"
            );
            deliver(rest, stopped, fatal, Message::carrier(error))
        }
    }
}

/// Cascade end-of-stream notifications in chain order.
fn finish(links: &mut [Link], stopped: &mut bool, fatal: &mut bool) -> Result<()> {
    if *stopped {
        return Ok(());
    }
    let Some((link, rest)) = links.split_first_mut() else {
        return Ok(());
    };
    let outcome = link
        .element
        .finish(&mut Emit::new(&mut |m| deliver(rest, stopped, fatal, m)));
    match outcome {
        Ok(Continuation::Stop) => {
            *stopped = true;
            return Ok(());
        }
        Ok(_) => {}
        Err(error) => {
            if rest.is_empty() || *fatal {
                *fatal = true;
                return Err(error);
            }
            deliver(rest, stopped, fatal, Message::carrier(error))?;
        }
    }
    finish(rest, stopped, fatal)
}

impl<E: ChainElement + 'static> BitOr<E> for Pipeline {
    type Output = Pipeline;

    fn bitor(mut self, rhs: E) -> Pipeline {
        self.push(rhs);
        self
    }
}

impl<E: ChainElement + 'static> BitOrAssign<E> for Pipeline {
    fn bitor_assign(&mut self, rhs: E) {
        self.push(rhs);
    }
}

impl BitOr<Pipeline> for Pipeline {
    type Output = Pipeline;

    fn bitor(mut self, rhs: Pipeline) -> Pipeline {
        self.append(rhs);
        self
    }
}

impl BitOrAssign<Pipeline> for Pipeline {
    fn bitor_assign(&mut self, rhs: Pipeline) {
        self.append(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::transform;
    use crate::message::{Folder, Text};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Terminal stage recording the variant names it receives.
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ChainElement for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn process(&mut self, message: Message, _emit: &mut Emit<'_>) -> Result<Continuation> {
            self.seen.lock().push(message.variant_name().to_string());
            Ok(Continuation::Proceed)
        }

        fn is_leaf(&self) -> bool {
            true
        }
    }

    fn recorder() -> (Recorder, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Recorder { seen: seen.clone() }, seen)
    }

    fn folder(name: &str) -> Message {
        Message::Folder(Folder {
            name: Some(name.to_string()),
            level: None,
        })
    }

    #[test]
    fn test_refuses_to_run_without_leaf() {
        let mut pipeline = Pipeline::from_element(transform("noop", |m, emit: &mut Emit<'_>| emit.send(m)));
        let err = pipeline.process(Input::text("x")).unwrap_err();
        assert!(err.contains_tag(crate::error::ErrorTag::ProgramLogic));
    }

    #[test]
    fn test_messages_flow_in_order() {
        let (rec, seen) = recorder();
        let replay = transform("replay", |m: Message, emit: &mut Emit<'_>| {
            if matches!(m, Message::DataSource(_)) {
                emit.send(Message::Text(Text::new("a")))?;
                emit.send(Message::BreakLine)?;
                emit.send(Message::Text(Text::new("b")))?;
                Ok(Continuation::Proceed)
            } else {
                emit.send(m)
            }
        });
        let mut pipeline = Pipeline::from_element(replay) | rec;
        pipeline.process(Input::text("ignored")).unwrap();
        assert_eq!(
            *seen.lock(),
            vec!["StartProcessing", "Text", "BreakLine", "Text"]
        );
    }

    #[test]
    fn test_skip_drops_until_matching_close() {
        let (rec, seen) = recorder();
        // Emits two folders, the first of which the filter skips.
        let emitter = transform("emitter", |m: Message, emit: &mut Emit<'_>| {
            if matches!(m, Message::DataSource(_)) {
                emit.send(folder("Spam"))?;
                emit.send(Message::Text(Text::new("unwanted")))?;
                emit.send(folder("Nested"))?;
                emit.send(Message::CloseFolder)?;
                emit.send(Message::CloseFolder)?;
                emit.send(folder("Inbox"))?;
                emit.send(Message::Text(Text::new("wanted")))?;
                emit.send(Message::CloseFolder)?;
            }
            Ok(Continuation::Proceed)
        });
        let filter = transform("skip-spam", |m: Message, emit: &mut Emit<'_>| {
            if let Message::Folder(f) = &m
                && f.name.as_deref() == Some("Spam")
            {
                return Ok(Continuation::Skip);
            }
            emit.send(m)
        });
        let mut pipeline = Pipeline::from_element(emitter) | filter | rec;
        pipeline.process(Input::text("x")).unwrap();
        // Nothing between the skipped folder open and its matching close got
        // through, including the nested folder pair.
        assert_eq!(*seen.lock(), vec!["Folder", "Text", "CloseFolder"]);
    }

    #[test]
    fn test_stop_halts_everything() {
        let (rec, seen) = recorder();
        let emitter = transform("emitter", |m: Message, emit: &mut Emit<'_>| {
            if matches!(m, Message::DataSource(_)) {
                for i in 0..10 {
                    let c = emit.send(Message::Text(Text::new(format!("t{i}"))))?;
                    if c == Continuation::Stop {
                        break;
                    }
                }
            }
            Ok(Continuation::Proceed)
        });
        let mut count = 0usize;
        let limiter = transform("limiter", move |m: Message, emit: &mut Emit<'_>| {
            if matches!(m, Message::Text(_)) {
                count += 1;
                if count > 3 {
                    return Ok(Continuation::Stop);
                }
            }
            emit.send(m)
        });
        let mut pipeline = Pipeline::from_element(emitter) | limiter | rec;
        pipeline.process(Input::text("x")).unwrap();
        assert_eq!(*seen.lock(), vec!["Text", "Text", "Text"]);
    }

    #[test]
    fn test_stage_error_becomes_carrier() {
        let (rec, seen) = recorder();
        let failing = transform("failing", |m: Message, emit: &mut Emit<'_>| {
            if matches!(m, Message::DataSource(_)) {
                return Err(PipelineError::uninterpretable_data("bad input"));
            }
            emit.send(m)
        });
        let mut pipeline = Pipeline::from_element(failing) | rec;
        pipeline.process(Input::text("x")).unwrap();
        assert_eq!(*seen.lock(), vec!["StartProcessing", "ExceptionCarrier"]);
    }

    #[test]
    fn test_terminal_stage_error_is_fatal() {
        struct Failing;
        impl ChainElement for Failing {
            fn name(&self) -> &'static str {
                "failing-terminal"
            }
            fn process(&mut self, _m: Message, _e: &mut Emit<'_>) -> Result<Continuation> {
                Err(PipelineError::program_corrupted("sink unavailable"))
            }
            fn is_leaf(&self) -> bool {
                true
            }
        }
        let mut pipeline = Pipeline::from_element(Failing);
        let err = pipeline.process(Input::text("x")).unwrap_err();
        assert!(err.contains_tag(crate::error::ErrorTag::ProgramCorrupted));
    }

    #[test]
    fn test_compose_pipelines() {
        let (rec, seen) = recorder();
        let front = Pipeline::from_element(transform("a", |m, emit: &mut Emit<'_>| emit.send(m)));
        let back = Pipeline::from_element(transform("b", |m, emit: &mut Emit<'_>| emit.send(m)));
        let mut pipeline = front | back;
        pipeline |= rec;
        assert_eq!(pipeline.len(), 3);
        assert!(pipeline.is_runnable());
        pipeline.process(Input::text("x")).unwrap();
        assert_eq!(*seen.lock(), vec!["StartProcessing", "DataSource"]);
    }
}

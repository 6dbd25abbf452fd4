//! Closure-backed chain elements.
//!
//! Most filters are tiny: inspect one variant, forward or skip. [`transform`]
//! turns a closure into a full [`ChainElement`] so such stages do not need a
//! struct each.

use super::{ChainElement, Continuation, Emit};
use crate::chain::Pipeline;
use crate::error::Result;
use crate::message::Message;
use std::ops::BitOr;

/// A chain element backed by a closure.
///
/// Created with [`transform`].
pub struct Transform<F> {
    name: &'static str,
    f: F,
}

/// Build a stage from a closure.
///
/// The closure receives each message and the emission sink, and returns the
/// continuation for the driver:
///
/// ```rust
/// use docpipe::chain::{Continuation, Emit, transform};
/// use docpipe::message::Message;
///
/// let drop_images = transform("drop-images", |message: Message, emit: &mut Emit<'_>| {
///     if matches!(message, Message::Image(_)) {
///         return Ok(Continuation::Proceed);
///     }
///     emit.send(message)
/// });
/// ```
pub fn transform<F>(name: &'static str, f: F) -> Transform<F>
where
    F: FnMut(Message, &mut Emit<'_>) -> Result<Continuation> + Send,
{
    Transform { name, f }
}

impl<F> ChainElement for Transform<F>
where
    F: FnMut(Message, &mut Emit<'_>) -> Result<Continuation> + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
        (self.f)(message, emit)
    }
}

impl<F, Rhs> BitOr<Rhs> for Transform<F>
where
    F: FnMut(Message, &mut Emit<'_>) -> Result<Continuation> + Send + 'static,
    Rhs: ChainElement + 'static,
{
    type Output = Pipeline;

    fn bitor(self, rhs: Rhs) -> Pipeline {
        Pipeline::from_element(self) | rhs
    }
}

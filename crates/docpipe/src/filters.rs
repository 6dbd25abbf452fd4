//! The standard filter set.
//!
//! Each filter is a stage that forwards or skips messages per predicate:
//! folder whitelists, attachment-extension whitelists, mail creation-time
//! bounds, and a total-event budget. Non-matching variants always pass
//! through untouched.
//!
//! ```rust
//! use docpipe::filters;
//!
//! let keep_inbox = filters::by_folder_name(["Inbox", "Sent"]);
//! let recent = filters::by_mail_min_creation_time(1_644_216_799);
//! ```

use crate::chain::{Continuation, Emit, Transform, transform};
use crate::error::Result;
use crate::message::Message;
use crate::mime::FileExtension;

type FilterFn = dyn FnMut(Message, &mut Emit<'_>) -> Result<Continuation> + Send;

/// Keep only folders whose name is in the whitelist.
///
/// Applies to `Folder` events: a folder with a name outside the list is
/// skipped together with its whole sub-tree. Folders without a name pass.
pub fn by_folder_name<I, S>(names: I) -> Transform<Box<FilterFn>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    transform(
        "filter-by-folder-name",
        Box::new(move |message: Message, emit: &mut Emit<'_>| {
            if let Message::Folder(folder) = &message
                && let Some(name) = &folder.name
                && !names.iter().any(|n| n == name)
            {
                return Ok(Continuation::Skip);
            }
            emit.send(message)
        }),
    )
}

/// Keep only attachments whose extension is in the whitelist.
pub fn by_attachment_extension<I, E>(extensions: I) -> Transform<Box<FilterFn>>
where
    I: IntoIterator<Item = E>,
    E: Into<FileExtension>,
{
    let extensions: Vec<FileExtension> = extensions.into_iter().map(Into::into).collect();
    transform(
        "filter-by-attachment-extension",
        Box::new(move |message: Message, emit: &mut Emit<'_>| {
            if let Message::Attachment(attachment) = &message
                && let Some(extension) = &attachment.extension
                && !extensions.contains(extension)
            {
                return Ok(Continuation::Skip);
            }
            emit.send(message)
        }),
    )
}

/// Keep only mails created at or after `min_time` (unix seconds).
pub fn by_mail_min_creation_time(min_time: i64) -> Transform<Box<FilterFn>> {
    transform(
        "filter-by-mail-min-creation-time",
        Box::new(move |message: Message, emit: &mut Emit<'_>| {
            if let Message::Mail(mail) = &message
                && let Some(date) = mail.date
                && date < min_time
            {
                return Ok(Continuation::Skip);
            }
            emit.send(message)
        }),
    )
}

/// Keep only mails created at or before `max_time` (unix seconds).
pub fn by_mail_max_creation_time(max_time: i64) -> Transform<Box<FilterFn>> {
    transform(
        "filter-by-mail-max-creation-time",
        Box::new(move |message: Message, emit: &mut Emit<'_>| {
            if let Message::Mail(mail) = &message
                && let Some(date) = mail.date
                && date > max_time
            {
                return Ok(Continuation::Skip);
            }
            emit.send(message)
        }),
    )
}

/// Stop the whole pipeline once `max_events` messages have passed through.
pub fn by_max_event_count(max_events: usize) -> Transform<Box<FilterFn>> {
    let mut seen = 0usize;
    transform(
        "filter-by-max-event-count",
        Box::new(move |message: Message, emit: &mut Emit<'_>| {
            if seen == max_events {
                return Ok(Continuation::Stop);
            }
            seen += 1;
            emit.send(message)
        }),
    )
}

//! Error types for docpipe.
//!
//! Every failure in the library is a [`PipelineError`]: a message, an optional
//! tag from a closed set, the source location where the error was raised, and
//! an optional nested cause. Causes chain, so a low-level I/O failure inside
//! an archive entry inside a detector keeps its full history.
//!
//! Two queries operate on the chain:
//!
//! - [`PipelineError::contains_tag`] walks the cause chain looking for a tag,
//!   so callers can ask "was this ultimately an encrypted file?" without
//!   caring how deeply the failure was wrapped.
//! - [`PipelineError::diagnostic_message`] renders the chain newest-cause-first
//!   as a multi-line string for logs and CLI output.
//!
//! # Example
//!
//! ```rust
//! use docpipe::error::{ErrorTag, PipelineError, Result};
//!
//! fn parse_header(bytes: &[u8]) -> Result<()> {
//!     if bytes.len() < 4 {
//!         return Err(PipelineError::uninterpretable_data("truncated header"));
//!     }
//!     Ok(())
//! }
//!
//! let err = parse_header(b"ab").unwrap_err();
//! assert!(err.contains_tag(ErrorTag::UninterpretableData));
//! ```

use std::panic::Location;
use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Closed set of failure categories.
///
/// Tags classify an error for policy decisions; the human-readable detail
/// lives in the error message and cause chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorTag {
    /// An invariant was violated inside the library, or a caller used an API
    /// incorrectly.
    ProgramLogic,
    /// A required resource is missing or broken (bad installation).
    ProgramCorrupted,
    /// Input data does not conform to its declared or detected format.
    UninterpretableData,
    /// An external transport failed.
    NetworkFailure,
    /// The input is encrypted and cannot be processed without credentials.
    FileEncrypted,
}

impl ErrorTag {
    fn as_str(self) -> &'static str {
        match self {
            ErrorTag::ProgramLogic => "program logic error",
            ErrorTag::ProgramCorrupted => "program corrupted",
            ErrorTag::UninterpretableData => "uninterpretable data",
            ErrorTag::NetworkFailure => "network failure",
            ErrorTag::FileEncrypted => "file encrypted",
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nestable error value flowing through the pipeline.
///
/// Constructed through the tag-named constructors ([`PipelineError::program_logic`],
/// [`PipelineError::uninterpretable_data`], ...) or the untagged
/// [`PipelineError::new`]. All constructors are `#[track_caller]`, so the
/// recorded location is the call site that raised the error, not this module.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PipelineError {
    message: String,
    tag: Option<ErrorTag>,
    location: &'static Location<'static>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

macro_rules! tagged_constructor {
    ($name:ident, $name_with_source:ident, $tag:ident) => {
        #[doc = concat!("Create an error tagged `", stringify!($tag), "`.")]
        #[track_caller]
        pub fn $name<S: Into<String>>(message: S) -> Self {
            Self {
                message: message.into(),
                tag: Some(ErrorTag::$tag),
                location: Location::caller(),
                source: None,
            }
        }

        #[doc = concat!("Create an error tagged `", stringify!($tag), "` with a nested cause.")]
        #[track_caller]
        pub fn $name_with_source<S, E>(message: S, source: E) -> Self
        where
            S: Into<String>,
            E: std::error::Error + Send + Sync + 'static,
        {
            Self {
                message: message.into(),
                tag: Some(ErrorTag::$tag),
                location: Location::caller(),
                source: Some(Box::new(source)),
            }
        }
    };
}

impl PipelineError {
    /// Create an untagged error carrying context only.
    #[track_caller]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            tag: None,
            location: Location::caller(),
            source: None,
        }
    }

    /// Create an untagged error with a nested cause.
    #[track_caller]
    pub fn with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            tag: None,
            location: Location::caller(),
            source: Some(Box::new(source)),
        }
    }

    tagged_constructor!(program_logic, program_logic_with_source, ProgramLogic);
    tagged_constructor!(program_corrupted, program_corrupted_with_source, ProgramCorrupted);
    tagged_constructor!(
        uninterpretable_data,
        uninterpretable_data_with_source,
        UninterpretableData
    );
    tagged_constructor!(network_failure, network_failure_with_source, NetworkFailure);
    tagged_constructor!(file_encrypted, file_encrypted_with_source, FileEncrypted);

    /// Wrap this error as the cause of a new, outer error.
    #[track_caller]
    pub fn wrap<S: Into<String>>(self, message: S) -> Self {
        Self {
            message: message.into(),
            tag: None,
            location: Location::caller(),
            source: Some(Box::new(self)),
        }
    }

    /// The context message of the outermost error, without its causes.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The tag attached at this level, if any.
    pub fn tag(&self) -> Option<ErrorTag> {
        self.tag
    }

    /// Source location where this error (outermost level) was raised.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Walk the cause chain looking for `tag`.
    ///
    /// Returns true if this error or any nested [`PipelineError`] cause
    /// carries the tag.
    pub fn contains_tag(&self, tag: ErrorTag) -> bool {
        if self.tag == Some(tag) {
            return true;
        }
        let mut cause = self.source_err();
        while let Some(err) = cause {
            if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
                if pipeline_err.tag == Some(tag) {
                    return true;
                }
            }
            cause = err.source();
        }
        false
    }

    /// Render the full chain newest-cause-first as a multi-line string.
    ///
    /// Each line holds one level: the message, the tag in brackets when
    /// present, and the source location when known.
    pub fn diagnostic_message(&self) -> String {
        let mut out = String::new();
        self.render_level(&mut out);
        let mut cause = self.source_err();
        while let Some(err) = cause {
            out.push('\n');
            if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
                out.push_str("caused by: ");
                pipeline_err.render_level(&mut out);
            } else {
                out.push_str("caused by: ");
                out.push_str(&err.to_string());
            }
            cause = err.source();
        }
        out
    }

    fn render_level(&self, out: &mut String) {
        out.push_str(&self.message);
        if let Some(tag) = self.tag {
            out.push_str(" [");
            out.push_str(tag.as_str());
            out.push(']');
        }
        out.push_str(&format!(
            " at {}:{}",
            self.location.file(),
            self.location.line()
        ));
    }

    fn source_err(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for PipelineError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        PipelineError::with_source("I/O error", err)
    }
}

impl From<serde_json::Error> for PipelineError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        PipelineError::with_source("serialization error", err)
    }
}

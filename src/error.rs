//! Error types for rendering

use thiserror::Error;

use crate::template::FilterError;

/// Errors that abort a render call
///
/// Everything else (missing paths, unknown tags, unterminated blocks) is
/// absorbed into the output as empty or literal text.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A marker names a filter that is not registered
    #[error("unknown filter \"{filter}\"")]
    UnknownFilter { filter: String },

    /// A loop source resolved to nothing while debug mode is on
    #[error("undefined list \"{list}\"")]
    UndefinedList { list: String },

    /// A filter argument list could not be split, e.g. an unterminated quote
    #[error("malformed filter arguments: {args}")]
    MalformedArguments { args: String },

    /// A registered filter rejected its input
    #[error("filter \"{name}\" failed: {source}")]
    Filter { name: String, source: FilterError },
}

use thiserror::Error;

use crate::font::FontError;

/// Errors surfaced by the text model accessors.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("index {index} is out of range (length {length})")]
    OutOfRange { index: usize, length: usize },

    #[error("{kind} runs do not cover the text: {reason}")]
    InvalidRunCoverage { kind: &'static str, reason: String },

    #[error(transparent)]
    Font(#[from] FontError),
}

impl TextError {
    pub(crate) fn out_of_range(index: usize, length: usize) -> Self {
        TextError::OutOfRange { index, length }
    }
}

pub type Result<T> = std::result::Result<T, TextError>;

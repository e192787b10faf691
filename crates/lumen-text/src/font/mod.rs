//! Font faces, the font registry and the font-metrics collaborator.

pub mod client;
pub mod face;
pub mod metrics;
pub mod registry;

pub use client::{BitmapFormat, FontClient, GlyphBitmap, SwashFontClient};
pub use face::FontFace;
pub use metrics::{FontMetrics, ScaledFontMetrics};
pub use registry::{FontKey, FontRegistry, RegisteredFont};

use thiserror::Error;

use crate::model::FontId;

/// Errors that can occur while working with fonts.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("font I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid font data")]
    InvalidFont,

    #[error("unknown font id {0}")]
    UnknownFont(FontId),
}

/// Convenient result alias for font-related operations.
pub type Result<T> = std::result::Result<T, FontError>;

//! lumen-text: incremental text layout core.
//!
//! Text flows through a fixed pipeline:
//! - UTF-8 input is decoded into the [`model::LogicalModel`] ([`charset`]),
//! - break opportunities, scripts, fonts and bidirectional info annotate it
//!   ([`segmentation`], [`multi_language`], [`bidi`]),
//! - shaping fills the glyph tables of the [`model::VisualModel`]
//!   ([`shaping`], [`font`]),
//! - layout and reordering position the glyphs ([`layout`]),
//! - the [`typesetter`] renders them into pixel buffers.
//!
//! [`updater::TextModel`] drives the pipeline and limits the work of an edit
//! to the paragraphs it touches, using [`clearer`] to drop stale data.

pub mod bidi;
pub mod charset;
pub mod clearer;
pub mod color;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod multi_language;
pub mod segmentation;
pub mod shaping;
pub mod typesetter;
pub mod updater;

#[cfg(test)]
mod testing;

pub use bidi::LayoutDirection;
pub use clearer::OperationsMask;
pub use error::{Result, TextError};
pub use font::{FontClient, FontError, FontFace, FontKey, FontRegistry, SwashFontClient};
pub use layout::{LayoutEngine, WrapMode};
pub use model::{
    Character, CharacterIndex, Color, FontId, GlyphIndex, GlyphInfo, HorizontalAlignment, Length,
    LogicalModel, Size, UnderlineType, Vector2, VerticalAlignment, VisualModel,
};
pub use shaping::{HarfrustShaper, Shaping};
pub use typesetter::{PixelData, PixelFormat, RenderBehaviour, Typesetter};
pub use updater::{TextModel, TextUpdateInfo};

//! Character to glyph conversion.
//!
//! [`shape_text`] walks the font and script runs of the logical model and
//! hands each chunk to a [`Shaping`] collaborator. [`HarfrustShaper`] is the
//! collaborator backed by harfrust.

pub mod harfrust_shaper;
pub mod shape_text;

pub use harfrust_shaper::HarfrustShaper;
pub use shape_text::shape_text;

use crate::model::{Character, CharacterIndex, FontId, GlyphInfo, Length, Script};

/// The shaping collaborator.
///
/// Shaping is deterministic: the same characters, font and script always
/// produce the same glyphs.
pub trait Shaping {
    /// Shape `text` and return the number of glyphs produced.
    /// A failure produces zero glyphs.
    fn shape(&mut self, text: &[Character], font_id: FontId, script: Script) -> Length;

    /// Copy the glyphs of the last [`Shaping::shape`] call, in logical order.
    ///
    /// `glyph_to_character` receives, per glyph, the index of the first
    /// character of its cluster relative to the shaped text.
    fn glyphs(&self, glyphs: &mut [GlyphInfo], glyph_to_character: &mut [CharacterIndex]);
}

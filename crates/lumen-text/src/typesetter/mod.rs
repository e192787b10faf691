//! Rendering of a laid-out visual model into pixel buffers.
//!
//! Every style (outline, shadow, background, underline, strikethrough) is
//! drawn into its own buffer and the buffers are composited in a fixed
//! order by [`Typesetter::render`].

pub mod compose;
pub mod decorations;
pub mod glyph;
pub mod pixel;
#[allow(clippy::module_inception)]
pub mod typesetter;

pub use compose::{combine_image_buffer, multiply_and_normalize_color, set_mask_for_image_buffer};
pub use pixel::{PixelData, PixelFormat};
pub use typesetter::{RenderBehaviour, Typesetter};

/// What a single image buffer pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// The glyphs in their own colors.
    #[default]
    None,
    /// The glyphs as a coverage mask; color glyphs are cut out.
    Mask,
    Shadow,
    Underline,
    Outline,
    Background,
    Strikethrough,
}

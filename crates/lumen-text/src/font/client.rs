use swash::scale::ScaleContext;
use swash::scale::image::Content;

use crate::font::face::RasterOptions;
use crate::font::{FontRegistry, ScaledFontMetrics};
use crate::model::{Character, FontId, GlyphInfo, to_char};

/// Pixel layout of a glyph bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// One coverage byte per pixel.
    Alpha,
    Rgba,
    Bgra,
}

impl BitmapFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            BitmapFormat::Alpha => 1,
            BitmapFormat::Rgba | BitmapFormat::Bgra => 4,
        }
    }
}

/// A rasterized glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: BitmapFormat,
    /// Color glyph (emoji) rather than a coverage mask.
    pub is_color_bitmap: bool,
    /// Extra shift of an outline bitmap relative to the plain glyph.
    pub outline_offset_x: i32,
    pub outline_offset_y: i32,
}

/// The font-metrics collaborator.
///
/// Resolves glyph metrics, font metrics and glyph bitmaps. Any of them may
/// fail to resolve; callers skip what they cannot get.
pub trait FontClient {
    /// Fill the metrics of every glyph in place.
    ///
    /// Width, height and bearings come from the font; an advance already set
    /// by shaping is kept.
    fn glyph_metrics(&mut self, glyphs: &mut [GlyphInfo]);

    /// Line metrics of a font, zero for unknown fonts.
    fn font_metrics(&mut self, font_id: FontId) -> ScaledFontMetrics;

    fn create_bitmap(
        &mut self,
        font_id: FontId,
        glyph_index: u32,
        is_italic_required: bool,
        is_bold_required: bool,
        outline_width: u16,
    ) -> Option<GlyphBitmap>;

    fn is_character_supported(&mut self, font_id: FontId, character: Character) -> bool;

    /// A font able to render `character`, starting with `preferred`.
    /// Returns `preferred` when none is found.
    fn find_fallback_font(&mut self, preferred: FontId, character: Character) -> FontId;
}

/// [`FontClient`] over the fonts of a [`FontRegistry`], rasterizing with swash.
pub struct SwashFontClient<'a> {
    registry: &'a FontRegistry,
    context: ScaleContext,
}

impl<'a> SwashFontClient<'a> {
    pub fn new(registry: &'a FontRegistry) -> Self {
        Self {
            registry,
            context: ScaleContext::new(),
        }
    }
}

impl FontClient for SwashFontClient<'_> {
    fn glyph_metrics(&mut self, glyphs: &mut [GlyphInfo]) {
        for glyph in glyphs.iter_mut() {
            let Ok(font) = self.registry.get(glyph.font_id) else {
                tracing::warn!(font_id = glyph.font_id, "glyph metrics requested for an unknown font");
                continue;
            };
            let glyph_id = glyph.index as u16;
            let options = RasterOptions {
                size: font.size,
                synthetic_bold: glyph.is_bold_required,
                synthetic_italic: glyph.is_italic_required,
                outline_width: 0,
            };
            if let Some(image) = font.face.render(&mut self.context, glyph_id, options) {
                let placement = image.placement;
                glyph.width = placement.width as f32;
                glyph.height = placement.height as f32;
                glyph.x_bearing += placement.left as f32;
                glyph.y_bearing += placement.top as f32;
            }
            if glyph.advance == 0.0 {
                glyph.advance = font.face.advance(glyph_id, font.size);
            }
            glyph.scale_factor = 1.0;
        }
    }

    fn font_metrics(&mut self, font_id: FontId) -> ScaledFontMetrics {
        self.registry
            .get(font_id)
            .map(|font| font.face.metrics().scale_to_pixels(font.size))
            .unwrap_or_default()
    }

    fn create_bitmap(
        &mut self,
        font_id: FontId,
        glyph_index: u32,
        is_italic_required: bool,
        is_bold_required: bool,
        outline_width: u16,
    ) -> Option<GlyphBitmap> {
        let font = self.registry.get(font_id).ok()?;
        let options = RasterOptions {
            size: font.size,
            synthetic_bold: is_bold_required,
            synthetic_italic: is_italic_required,
            outline_width,
        };
        let image = font.face.render(&mut self.context, glyph_index as u16, options)?;
        let (format, is_color_bitmap) = match image.content {
            Content::Color => (BitmapFormat::Rgba, true),
            Content::Mask | Content::SubpixelMask => (BitmapFormat::Alpha, false),
        };

        let width = image.placement.width;
        let height = image.placement.height;
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if image.data.len() < expected {
            tracing::warn!(font_id, glyph_index, "glyph bitmap is smaller than its placement");
            return None;
        }

        Some(GlyphBitmap {
            buffer: image.data,
            width,
            height,
            format,
            is_color_bitmap,
            outline_offset_x: 0,
            outline_offset_y: 0,
        })
    }

    fn is_character_supported(&mut self, font_id: FontId, character: Character) -> bool {
        self.registry
            .get(font_id)
            .is_ok_and(|font| font.face.has_glyph(to_char(character)))
    }

    fn find_fallback_font(&mut self, preferred: FontId, character: Character) -> FontId {
        if self.is_character_supported(preferred, character) {
            return preferred;
        }
        let ch = to_char(character);
        self.registry
            .ids()
            .find(|&id| self.registry.get(id).is_ok_and(|font| font.face.has_glyph(ch)))
            .unwrap_or(preferred)
    }
}

use std::sync::Arc;

use swash::scale::image::Image;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Angle, Format, Stroke, Transform};
use swash::{FontRef, GlyphId, Metrics};

use crate::font::{FontError, FontMetrics, Result};

/// Slant applied to glyphs that require italic from a face without one.
const SYNTHETIC_ITALIC_DEGREES: f32 = 14.0;

/// Loaded font face backed by a font file (TTF/OTF).
///
/// Thin wrapper around `swash::FontRef` that owns the underlying font data.
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<[u8]>,
    /// Face index within the file (for collections).
    index: usize,
    offset: u32,
    key: swash::CacheKey,
    metrics: FontMetrics,
}

/// How a glyph should be rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RasterOptions {
    pub size: f32,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
    /// Stroke width in pixels; zero fills the glyph.
    pub outline_width: u16,
}

impl FontFace {
    /// Create a font face from raw bytes and a font index within the file.
    pub fn from_bytes(data: Arc<[u8]>, index: usize) -> Result<Self> {
        let font = FontRef::from_index(&data, index).ok_or(FontError::InvalidFont)?;
        let metrics = Self::metrics_from_swash(&font);
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            data,
            index,
            offset,
            key,
            metrics,
        })
    }

    pub fn from_vec(data: Vec<u8>, index: usize) -> Result<Self> {
        Self::from_bytes(Arc::from(data), index)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>, index: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_vec(data, index)
    }

    /// Raw font bytes, for the shaper.
    pub fn as_bytes(&self) -> Arc<[u8]> {
        self.data.clone()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn as_swash_ref(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    fn metrics_from_swash(font: &FontRef<'_>) -> FontMetrics {
        let Metrics {
            units_per_em,
            ascent,
            descent,
            leading,
            underline_offset,
            stroke_size,
            ..
        } = font.metrics(&[]);

        FontMetrics {
            ascent,
            descent,
            line_gap: leading,
            units_per_em,
            underline_position: underline_offset,
            underline_thickness: stroke_size,
        }
    }

    /// Font metrics in font units.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Nominal glyph for `ch`; zero when the face has none.
    pub fn glyph_id(&self, ch: char) -> GlyphId {
        self.as_swash_ref().charmap().map(ch)
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyph_id(ch) != 0
    }

    pub fn advance(&self, glyph_id: GlyphId, size: f32) -> f32 {
        self.as_swash_ref().glyph_metrics(&[]).scale(size).advance_width(glyph_id)
    }

    /// Rasterize a glyph, preferring color sources over the plain outline.
    pub fn render(&self, context: &mut ScaleContext, glyph_id: GlyphId, options: RasterOptions) -> Option<Image> {
        let font = self.as_swash_ref();
        let mut scaler = context.builder(font).size(options.size).hint(false).build();

        let sources = [
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ];
        let mut render = Render::new(&sources);
        render.format(Format::Alpha);
        if options.synthetic_bold {
            render.embolden(options.size / 24.0);
        }
        if options.synthetic_italic {
            render.transform(Some(Transform::skew(
                Angle::from_degrees(SYNTHETIC_ITALIC_DEGREES),
                Angle::from_degrees(0.0),
            )));
        }
        if options.outline_width > 0 {
            render.style(Stroke::new(f32::from(options.outline_width)));
        }
        render.render(&mut scaler, glyph_id)
    }
}

//! Deterministic collaborators for unit tests.

use crate::font::{BitmapFormat, FontClient, GlyphBitmap, ScaledFontMetrics};
use crate::model::{Character, CharacterIndex, FontId, GlyphInfo, Length, Script};
use crate::shaping::Shaping;

/// Glyph produced for the "fi" ligature.
pub const LIGATURE_FI: u32 = 0xFB01;
/// Glyph index for which no bitmap can be produced.
pub const UNRESOLVED_GLYPH: u32 = 0x2753;
/// First code point rendered as a color glyph.
pub const FIRST_COLOR_GLYPH: u32 = 0x1F300;
/// Font the mock client falls back to for Arabic and Hebrew.
pub const RTL_FONT: FontId = 2;

pub const GLYPH_WIDTH: f32 = 8.0;
pub const GLYPH_HEIGHT: f32 = 10.0;
pub const GLYPH_ADVANCE: f32 = 10.0;
pub const ASCENDER: f32 = 12.0;
pub const DESCENDER: f32 = -4.0;

/// Shapes one glyph per character except:
/// - "fi" becomes a single ligature glyph,
/// - '%' becomes two glyphs of the same cluster,
/// - font 0 fails and yields nothing.
#[derive(Debug, Default)]
pub struct MockShaper {
    glyphs: Vec<GlyphInfo>,
    clusters: Vec<CharacterIndex>,
    pub calls: Vec<(FontId, Script, Vec<Character>)>,
}

impl MockShaper {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Shaping for MockShaper {
    fn shape(&mut self, text: &[Character], font_id: FontId, script: Script) -> Length {
        self.calls.push((font_id, script, text.to_vec()));
        self.glyphs.clear();
        self.clusters.clear();
        if font_id == 0 {
            return 0;
        }

        let glyph = |index: u32| GlyphInfo {
            font_id,
            index,
            ..Default::default()
        };
        let mut position = 0;
        while position < text.len() {
            let character = text[position];
            if character == 'f' as u32 && text.get(position + 1) == Some(&('i' as u32)) {
                self.glyphs.push(glyph(LIGATURE_FI));
                self.clusters.push(position);
                position += 2;
                continue;
            }
            if character == '%' as u32 {
                self.glyphs.push(glyph(character));
                self.clusters.push(position);
            }
            self.glyphs.push(glyph(character));
            self.clusters.push(position);
            position += 1;
        }
        self.glyphs.len()
    }

    fn glyphs(&self, glyphs: &mut [GlyphInfo], glyph_to_character: &mut [CharacterIndex]) {
        for (out, glyph) in glyphs.iter_mut().zip(&self.glyphs) {
            *out = *glyph;
        }
        for (out, cluster) in glyph_to_character.iter_mut().zip(&self.clusters) {
            *out = *cluster;
        }
    }
}

fn is_rtl_character(character: Character) -> bool {
    (0x0590..=0x06FF).contains(&character)
}

/// Fixed metrics, full-coverage alpha bitmaps and blue color glyphs.
#[derive(Debug, Default)]
pub struct MockFontClient;

impl FontClient for MockFontClient {
    fn glyph_metrics(&mut self, glyphs: &mut [GlyphInfo]) {
        for glyph in glyphs {
            glyph.width = GLYPH_WIDTH;
            glyph.height = GLYPH_HEIGHT;
            glyph.x_bearing += 1.0;
            glyph.y_bearing += GLYPH_HEIGHT;
            if glyph.advance == 0.0 {
                glyph.advance = GLYPH_ADVANCE;
            }
            glyph.scale_factor = 1.0;
        }
    }

    fn font_metrics(&mut self, _font_id: FontId) -> ScaledFontMetrics {
        ScaledFontMetrics {
            ascender: ASCENDER,
            descender: DESCENDER,
            line_gap: 0.0,
            underline_position: -2.0,
            underline_thickness: 1.0,
            font_size: 16.0,
        }
    }

    fn create_bitmap(
        &mut self,
        _font_id: FontId,
        glyph_index: u32,
        _is_italic_required: bool,
        _is_bold_required: bool,
        outline_width: u16,
    ) -> Option<GlyphBitmap> {
        if glyph_index == UNRESOLVED_GLYPH {
            return None;
        }
        let grow = 2 * u32::from(outline_width);
        let width = GLYPH_WIDTH as u32 + grow;
        let height = GLYPH_HEIGHT as u32 + grow;
        let pixels = (width * height) as usize;
        if glyph_index >= FIRST_COLOR_GLYPH {
            // Blue in BGRA order.
            let buffer = [255, 0, 0, 255].repeat(pixels);
            return Some(GlyphBitmap {
                buffer,
                width,
                height,
                format: BitmapFormat::Bgra,
                is_color_bitmap: true,
                outline_offset_x: 0,
                outline_offset_y: 0,
            });
        }
        Some(GlyphBitmap {
            buffer: vec![255; pixels],
            width,
            height,
            format: BitmapFormat::Alpha,
            is_color_bitmap: false,
            outline_offset_x: 0,
            outline_offset_y: 0,
        })
    }

    fn is_character_supported(&mut self, font_id: FontId, character: Character) -> bool {
        font_id != 0 && (font_id == RTL_FONT || !is_rtl_character(character))
    }

    fn find_fallback_font(&mut self, preferred: FontId, character: Character) -> FontId {
        if self.is_character_supported(preferred, character) {
            preferred
        } else if is_rtl_character(character) {
            RTL_FONT
        } else {
            preferred
        }
    }
}

pub fn utf32(text: &str) -> Vec<Character> {
    text.chars().map(u32::from).collect()
}

use harfrust::{
    FontRef as HbFontRef,
    Script as HbScript,
    ShaperData,
    ShaperInstance,
    Tag as HbTag,
    UnicodeBuffer as HbUnicodeBuffer,
};

use crate::font::FontRegistry;
use crate::model::{Character, CharacterIndex, FontId, GlyphInfo, Length, Script, to_char};
use crate::multi_language::is_right_to_left_script;

use super::Shaping;

/// [`Shaping`] collaborator built on harfrust (pure-Rust HarfBuzz port).
///
/// Glyph advances and offsets are scaled to the registered pixel size of the
/// font. Right-to-left output is put back in logical order.
pub struct HarfrustShaper<'a> {
    registry: &'a FontRegistry,
    glyphs: Vec<GlyphInfo>,
    clusters: Vec<CharacterIndex>,
}

impl<'a> HarfrustShaper<'a> {
    pub fn new(registry: &'a FontRegistry) -> Self {
        Self {
            registry,
            glyphs: Vec::new(),
            clusters: Vec::new(),
        }
    }

    fn shape_run(&mut self, text: &[Character], font_id: FontId, script: Script) -> Option<()> {
        let font = self.registry.get(font_id).ok()?;
        let font_data = font.face.as_bytes();
        let font_ref = HbFontRef::from_index(&font_data, font.face.index() as u32).ok()?;

        let data = ShaperData::new(&font_ref);
        let instance = ShaperInstance::from_variations(&font_ref, core::iter::empty::<harfrust::Variation>());
        let shaper = data
            .shaper(&font_ref)
            .instance(Some(&instance))
            .point_size(None)
            .build();

        // Byte offset each character starts at, to turn clusters into indices.
        let mut utf8 = String::with_capacity(text.len());
        let mut starts = Vec::with_capacity(text.len());
        for &character in text {
            starts.push(utf8.len());
            utf8.push(to_char(character));
        }

        let mut buffer = HbUnicodeBuffer::new();
        buffer.push_str(&utf8);
        if let Some(script) = harfrust_script(script) {
            buffer.set_script(script);
        }
        buffer.guess_segment_properties();

        let glyph_buffer = shaper.shape(buffer, &[]);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        let units_per_em = font.face.metrics().units_per_em;
        let scale = if units_per_em != 0 {
            font.size / f32::from(units_per_em)
        } else {
            1.0
        };

        for (info, position) in infos.iter().zip(positions) {
            let cluster = info.cluster as usize;
            let character = starts.partition_point(|&start| start <= cluster).saturating_sub(1);
            self.glyphs.push(GlyphInfo {
                font_id,
                index: info.glyph_id,
                x_bearing: position.x_offset as f32 * scale,
                y_bearing: position.y_offset as f32 * scale,
                advance: position.x_advance as f32 * scale,
                scale_factor: 1.0,
                ..Default::default()
            });
            self.clusters.push(character);
        }

        if is_right_to_left_script(script) {
            self.glyphs.reverse();
            self.clusters.reverse();
        }
        Some(())
    }
}

impl Shaping for HarfrustShaper<'_> {
    fn shape(&mut self, text: &[Character], font_id: FontId, script: Script) -> Length {
        self.glyphs.clear();
        self.clusters.clear();
        if self.shape_run(text, font_id, script).is_none() {
            tracing::warn!(font_id, "font could not be shaped");
            self.glyphs.clear();
            self.clusters.clear();
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

fn harfrust_script(script: Script) -> Option<HbScript> {
    let tag: [u8; 4] = script.short_name().as_bytes().try_into().ok()?;
    HbScript::from_iso15924_tag(HbTag::new(&tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fonts_shape_to_nothing() {
        let registry = FontRegistry::new();
        let mut shaper = HarfrustShaper::new(&registry);
        let text: Vec<Character> = "abc".chars().map(u32::from).collect();
        assert_eq!(shaper.shape(&text, 1, Script::Latin), 0);
    }

    #[test]
    fn scripts_map_to_iso_tags() {
        assert!(harfrust_script(Script::Latin).is_some());
        assert!(harfrust_script(Script::Arabic).is_some());
    }
}

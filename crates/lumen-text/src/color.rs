//! Per-glyph color indices from markup color runs.

use crate::model::{
    CharacterIndex, Color, ColorIndex, ColorRun, GlyphIndex, Length,
};

/// Position of `color` in `palette`, added when missing, as a glyph color
/// index (palette position + 1).
fn palette_index(palette: &mut Vec<Color>, color: Color) -> ColorIndex {
    let position = palette
        .iter()
        .position(|&entry| entry == color)
        .unwrap_or_else(|| {
            palette.push(color);
            palette.len() - 1
        });
    ColorIndex::try_from(position + 1).unwrap_or(ColorIndex::MAX)
}

/// Insert color indices for the glyphs of
/// `[start_index, start_index + number_of_characters)`.
///
/// Glyphs not covered by any run get index 0, the default color. Run colors
/// are deduplicated into `colors`. Nothing is written when there are no runs.
#[allow(clippy::too_many_arguments)]
pub fn set_color_segmentation_info(
    color_runs: &[ColorRun],
    characters_to_glyph: &[GlyphIndex],
    glyphs_per_character: &[Length],
    start_index: CharacterIndex,
    start_glyph_index: GlyphIndex,
    number_of_characters: Length,
    colors: &mut Vec<Color>,
    color_indices: &mut Vec<ColorIndex>,
) {
    if color_runs.is_empty() || number_of_characters == 0 {
        return;
    }

    let last_character = start_index + number_of_characters;
    let last_glyph = match (
        characters_to_glyph.get(last_character - 1),
        glyphs_per_character.get(last_character - 1),
    ) {
        (Some(&glyph), Some(&count)) => glyph + count,
        _ => return,
    };
    let number_of_new_glyphs = last_glyph.saturating_sub(start_glyph_index);

    let position = start_glyph_index.min(color_indices.len());
    color_indices.splice(position..position, core::iter::repeat_n(0, number_of_new_glyphs));

    for run in color_runs {
        let first = run.character_run.character_index.max(start_index);
        let last = run.character_run.end().min(last_character);
        if first >= last {
            continue;
        }

        let index = palette_index(colors, run.color);
        let first_glyph = characters_to_glyph[first];
        let end_glyph = characters_to_glyph[last - 1] + glyphs_per_character[last - 1];
        for entry in &mut color_indices[first_glyph.min(last_glyph)..end_glyph.min(last_glyph)] {
            *entry = index;
        }
    }
}

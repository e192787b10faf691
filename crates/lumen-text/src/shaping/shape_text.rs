use crate::model::{
    CharacterIndex, GlyphIndex, GlyphInfo, Length, LineBreakInfo, LogicalModel, VisualModel,
    Character, is_new_paragraph,
};
use crate::shaping::Shaping;

/// Shape `[start_character_index, start_character_index + number_of_characters)`
/// and insert the glyphs into `visual` at `start_glyph_index`.
///
/// `text` is the text handed to the shaper; it is the logical text or its
/// mirrored copy. Runs and line breaks are read from `logical`.
///
/// Each chunk ends where the font run or the script run ends, or right after
/// the first mandatory break. Fills the glyphs, the glyph to character map
/// and the characters per glyph table. Returns the index of every glyph
/// produced for a paragraph separator.
pub fn shape_text(
    shaping: &mut dyn Shaping,
    logical: &LogicalModel,
    text: &[Character],
    start_character_index: CharacterIndex,
    start_glyph_index: GlyphIndex,
    number_of_characters: Length,
    visual: &mut VisualModel,
) -> Vec<GlyphIndex> {
    let mut new_paragraph_glyphs = Vec::new();
    if number_of_characters == 0 {
        return new_paragraph_glyphs;
    }

    let fonts = logical.all_font_runs();
    let scripts = logical.all_script_runs();
    let line_breaks = logical.line_break_info();
    let last_character = (start_character_index + number_of_characters).min(text.len());

    let mut font_index = fonts.iter().position(|run| start_character_index < run.character_run.end());
    let mut script_index = scripts.iter().position(|run| start_character_index < run.character_run.end());

    let mut new_glyphs: Vec<GlyphInfo> = Vec::new();
    let mut new_glyph_to_character: Vec<CharacterIndex> = Vec::new();

    let mut previous = start_character_index;
    while previous < last_character {
        let (Some(font_run), Some(script_run)) = (
            font_index.and_then(|index| fonts.get(index)),
            script_index.and_then(|index| scripts.get(index)),
        ) else {
            tracing::warn!(character = previous, "no font or script run covers the text to shape");
            break;
        };

        let font_end = font_run.character_run.end();
        let script_end = script_run.character_run.end();
        let mut current = font_end.min(script_end).min(last_character);

        let mut is_paragraph_end = false;
        if let Some(offset) = line_breaks
            .get(previous..current)
            .and_then(|breaks| breaks.iter().position(|&info| info == LineBreakInfo::MustBreak))
        {
            let index = previous + offset;
            is_paragraph_end = is_new_paragraph(text[index]);
            current = index + 1;
        }

        let chunk = &text[previous..current];
        let number_of_glyphs = shaping.shape(chunk, font_run.font_id, script_run.script);
        if number_of_glyphs == 0 {
            tracing::warn!(font_id = font_run.font_id, start = previous, end = current, "shaping produced no glyphs");
        }
        tracing::trace!(start = previous, end = current, glyphs = number_of_glyphs, "shaped chunk");

        let mut glyphs = vec![GlyphInfo::default(); number_of_glyphs];
        let mut clusters = vec![0; number_of_glyphs];
        shaping.glyphs(&mut glyphs, &mut clusters);

        for (mut glyph, cluster) in glyphs.into_iter().zip(clusters) {
            glyph.is_italic_required = font_run.is_italic_required;
            glyph.is_bold_required = font_run.is_bold_required;
            new_glyphs.push(glyph);
            new_glyph_to_character.push(previous + cluster);
        }

        if is_paragraph_end && number_of_glyphs > 0 {
            new_paragraph_glyphs.push(start_glyph_index + new_glyphs.len() - 1);
        }

        // Both runs may end on the same character.
        if current == font_end {
            font_index = font_index.map(|index| index + 1);
        }
        if current == script_end {
            script_index = script_index.map(|index| index + 1);
        }
        previous = current;
    }

    let number_of_new_glyphs = new_glyphs.len();
    tracing::debug!(
        start = start_character_index,
        characters = number_of_characters,
        glyphs = number_of_new_glyphs,
        "shaped text"
    );

    let characters_per_glyph = characters_per_glyph(
        &new_glyph_to_character,
        start_character_index + number_of_characters,
    );

    let position = start_glyph_index.min(visual.glyphs.len());
    visual.glyphs.splice(position..position, new_glyphs);

    let position = start_glyph_index.min(visual.glyphs_to_characters.len());
    for index in &mut visual.glyphs_to_characters[position..] {
        *index += number_of_characters;
    }
    visual.glyphs_to_characters.splice(position..position, new_glyph_to_character);

    let position = start_glyph_index.min(visual.characters_per_glyph.len());
    visual.characters_per_glyph.splice(position..position, characters_per_glyph);

    new_paragraph_glyphs
}

/// Successive differences of the glyph to character map. The last glyph
/// takes every character up to `end_character`.
fn characters_per_glyph(glyph_to_character: &[CharacterIndex], end_character: CharacterIndex) -> Vec<Length> {
    let mut result: Vec<Length> = glyph_to_character
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect();
    if let Some(&last) = glyph_to_character.last() {
        result.push(end_character.saturating_sub(last));
    }
    result
}

//! Removal of the model data of a character range before it is rebuilt.
//!
//! A full clear empties every table selected by the operations mask. A
//! partial clear erases the per-character data of the range first and then
//! the glyph data derived from it, re-biasing every index after the range so
//! the new data can be spliced in.

use bitflags::bitflags;

use crate::model::runs::erase_character_runs;
use crate::model::{
    CharacterIndex, LogicalModel, VisualModel, clear_character_runs, clear_glyph_runs,
};
use crate::updater::TextUpdateInfo;

bitflags! {
    /// Pipeline steps to run (or whose data to clear) for an update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OperationsMask: u32 {
        const NO_OPERATION = 0x0000;
        const CONVERT_TO_UTF32 = 0x0001;
        const GET_SCRIPTS = 0x0002;
        const VALIDATE_FONTS = 0x0004;
        const GET_LINE_BREAKS = 0x0008;
        const BIDI_INFO = 0x0010;
        const SHAPE_TEXT = 0x0020;
        const GET_GLYPH_METRICS = 0x0040;
        const LAYOUT = 0x0080;
        const UPDATE_LAYOUT_SIZE = 0x0100;
        const REORDER = 0x0200;
        const ALIGN = 0x0400;
        const COLOR = 0x0800;
        const UPDATE_DIRECTION = 0x1000;
        const ALL_OPERATIONS = 0xFFFF;
    }
}

/// Clear every table selected by `operations`.
pub fn clear_full_model_data(
    logical: &mut LogicalModel,
    visual: &mut VisualModel,
    operations: OperationsMask,
) {
    if operations.contains(OperationsMask::GET_LINE_BREAKS) {
        logical.line_break_info_mut().clear();
        logical.word_break_info_mut().clear();
        logical.paragraph_info_mut().clear();
    }

    if operations.contains(OperationsMask::GET_SCRIPTS) {
        logical.script_runs_mut().clear();
    }

    if operations.contains(OperationsMask::VALIDATE_FONTS) {
        logical.font_runs_mut().clear();
    }

    if operations.contains(OperationsMask::BIDI_INFO) {
        logical.bidirectional_paragraph_info_mut().clear();
        logical.character_directions_mut().clear();
    }

    if operations.contains(OperationsMask::REORDER) {
        logical.bidirectional_line_info_mut().clear();
        logical.clear_visual_to_logical_map();
    }

    if operations.contains(OperationsMask::SHAPE_TEXT) {
        visual.glyphs.clear();
        visual.glyphs_to_characters.clear();
        visual.characters_to_glyph.clear();
        visual.characters_per_glyph.clear();
        visual.glyphs_per_character.clear();
        visual.glyph_positions.clear();
    }

    if operations.contains(OperationsMask::LAYOUT) {
        visual.lines.clear();
    }

    if operations.contains(OperationsMask::COLOR) {
        visual.color_indices.clear();
        visual.background_color_indices.clear();
    }
}

/// Erase the per-character data of `[start_index, end_index]`.
///
/// Runs after the range are moved down by the number of removed characters.
pub fn clear_character_model_data(
    logical: &mut LogicalModel,
    start_index: CharacterIndex,
    end_index: CharacterIndex,
    operations: OperationsMask,
) {
    let end_index_plus_one = end_index + 1;

    if operations.contains(OperationsMask::GET_LINE_BREAKS) {
        erase_range(logical.line_break_info_mut(), start_index, end_index_plus_one);
        erase_range(logical.word_break_info_mut(), start_index, end_index_plus_one);
        erase_character_runs(start_index, end_index, logical.paragraph_info_mut());
    }

    if operations.contains(OperationsMask::GET_SCRIPTS) {
        erase_character_runs(start_index, end_index, logical.script_runs_mut());
    }

    if operations.contains(OperationsMask::VALIDATE_FONTS) {
        erase_character_runs(start_index, end_index, logical.font_runs_mut());
    }

    if logical.bidirectional_paragraph_info().is_empty() {
        return;
    }

    if operations.contains(OperationsMask::BIDI_INFO) {
        erase_character_runs(start_index, end_index, logical.bidirectional_paragraph_info_mut());
        erase_range(logical.character_directions_mut(), start_index, end_index_plus_one);
    }

    if operations.contains(OperationsMask::REORDER) {
        erase_character_runs(start_index, end_index, logical.bidirectional_line_info_mut());
        // Rebuilt from the line runs after the next layout.
        logical.clear_visual_to_logical_map();
    }
}

/// Erase the glyph data produced for `[start_index, end_index]`.
///
/// The removed glyphs start at `update_info.start_glyph_index`. The first
/// removed line is stored in `update_info.start_line_index`.
pub fn clear_glyph_model_data(
    visual: &mut VisualModel,
    update_info: &mut TextUpdateInfo,
    start_index: CharacterIndex,
    end_index: CharacterIndex,
    operations: OperationsMask,
) {
    let end_index_plus_one = end_index + 1;
    let number_of_characters_removed = end_index_plus_one - start_index;
    let start_glyph_index = update_info.start_glyph_index;

    let end_glyph_index_plus_one = match (
        visual.characters_to_glyph.get(end_index),
        visual.glyphs_per_character.get(end_index),
    ) {
        (Some(&glyph), Some(&count)) => glyph + count,
        _ => {
            tracing::warn!(start_index, end_index, "no glyphs recorded for the cleared range");
            start_glyph_index
        }
    };
    let number_of_glyphs_removed = end_glyph_index_plus_one.saturating_sub(start_glyph_index);

    if operations.contains(OperationsMask::SHAPE_TEXT) {
        if let Some(following) = visual.characters_to_glyph.get_mut(end_index_plus_one..) {
            for index in following {
                *index -= number_of_glyphs_removed;
            }
        }
        erase_range(&mut visual.characters_to_glyph, start_index, end_index_plus_one);
        erase_range(&mut visual.glyphs_per_character, start_index, end_index_plus_one);

        erase_range(&mut visual.glyphs, start_glyph_index, end_glyph_index_plus_one);

        if let Some(following) = visual.glyphs_to_characters.get_mut(end_glyph_index_plus_one..) {
            for index in following {
                *index -= number_of_characters_removed;
            }
        }
        erase_range(&mut visual.glyphs_to_characters, start_glyph_index, end_glyph_index_plus_one);
        erase_range(&mut visual.characters_per_glyph, start_glyph_index, end_glyph_index_plus_one);

        // Positions may already be gone after a relayout.
        if !visual.glyph_positions.is_empty() {
            erase_range(&mut visual.glyph_positions, start_glyph_index, end_glyph_index_plus_one);
        }
    }

    if operations.contains(OperationsMask::LAYOUT) {
        let by_character = clear_character_runs(start_index, end_index, &mut visual.lines);
        let remove = if end_glyph_index_plus_one > start_glyph_index {
            clear_glyph_runs(start_glyph_index, end_glyph_index_plus_one - 1, &mut visual.lines)
        } else {
            by_character
        };
        update_info.start_line_index = remove.start;
        visual.lines.drain(remove);
    }

    if operations.contains(OperationsMask::COLOR) {
        if !visual.color_indices.is_empty() {
            erase_range(&mut visual.color_indices, start_glyph_index, end_glyph_index_plus_one);
        }
        if !visual.background_color_indices.is_empty() {
            erase_range(&mut visual.background_color_indices, start_glyph_index, end_glyph_index_plus_one);
        }
    }
}

/// Clear the model data of `[start_index, end_index]`, the whole model when
/// the range covers all of the previous text or `clear_all` is set.
pub fn clear_model_data(
    logical: &mut LogicalModel,
    visual: &mut VisualModel,
    update_info: &mut TextUpdateInfo,
    start_index: CharacterIndex,
    end_index: CharacterIndex,
    operations: OperationsMask,
) {
    let is_full_clear = update_info.clear_all
        || (start_index == 0 && update_info.previous_number_of_characters == end_index + 1);
    tracing::debug!(start_index, end_index, full = is_full_clear, ?operations, "clearing model data");

    if is_full_clear {
        clear_full_model_data(logical, visual, operations);
    } else {
        clear_character_model_data(logical, start_index, end_index, operations);
        clear_glyph_model_data(visual, update_info, start_index, end_index, operations);
    }

    // Used to avoid reallocations when laying out.
    update_info.estimated_number_of_lines = visual.lines.len().max(logical.paragraph_info().len());

    visual.clear_caches();
}

/// Remove `[start, end)` from `values`, clamped to its length.
fn erase_range<T>(values: &mut Vec<T>, start: usize, end: usize) {
    let end = end.min(values.len());
    let start = start.min(end);
    values.drain(start..end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BidirectionalLineInfoRun, BidirectionalParagraphInfoRun, CharacterRun, GlyphInfo, GlyphRun,
        LineBreakInfo, LineRun, ParagraphRun, Script, ScriptRun,
    };

    fn line(glyph_index: usize, number_of_glyphs: usize, character_index: usize, number_of_characters: usize) -> LineRun {
        LineRun {
            glyph_run: GlyphRun::new(glyph_index, number_of_glyphs),
            character_run: CharacterRun::new(character_index, number_of_characters),
            ..Default::default()
        }
    }

    /// Two paragraphs of three characters; character 1 is shaped to two glyphs.
    fn two_paragraph_visual() -> VisualModel {
        let mut visual = VisualModel::new();
        visual.glyphs = vec![GlyphInfo::default(); 7];
        visual.characters_to_glyph = vec![0, 1, 3, 4, 5, 6];
        visual.glyphs_per_character = vec![1, 2, 1, 1, 1, 1];
        visual.glyphs_to_characters = vec![0, 1, 1, 2, 3, 4, 5];
        visual.characters_per_glyph = vec![1, 0, 1, 1, 1, 1, 1];
        visual.lines = vec![line(0, 4, 0, 3), line(4, 3, 3, 3)];
        visual.color_indices = vec![1, 1, 1, 1, 2, 2, 2];
        visual
    }

    fn two_paragraph_logical() -> LogicalModel {
        let mut logical = LogicalModel::new();
        logical.set_text(&[0x61, 0x62, 0x0A, 0x63, 0x64, 0x65]);
        let mut breaks = vec![LineBreakInfo::NoBreak; 6];
        breaks[2] = LineBreakInfo::MustBreak;
        breaks[5] = LineBreakInfo::MustBreak;
        logical.set_line_break_info(breaks);
        *logical.paragraph_info_mut() = vec![
            ParagraphRun { character_run: CharacterRun::new(0, 3) },
            ParagraphRun { character_run: CharacterRun::new(3, 3) },
        ];
        *logical.script_runs_mut() = vec![
            ScriptRun { character_run: CharacterRun::new(0, 3), script: Script::Latin, is_right_to_left: false },
            ScriptRun { character_run: CharacterRun::new(3, 3), script: Script::Latin, is_right_to_left: false },
        ];
        logical
    }

    #[test]
    fn full_clear_only_touches_masked_tables() {
        let mut logical = two_paragraph_logical();
        let mut visual = two_paragraph_visual();
        clear_full_model_data(
            &mut logical,
            &mut visual,
            OperationsMask::GET_LINE_BREAKS | OperationsMask::SHAPE_TEXT,
        );

        assert!(logical.line_break_info().is_empty());
        assert!(logical.paragraph_info().is_empty());
        assert_eq!(logical.all_script_runs().len(), 2);
        assert!(visual.glyphs.is_empty());
        assert!(visual.characters_to_glyph.is_empty());
        assert_eq!(visual.lines.len(), 2);
        assert_eq!(visual.color_indices.len(), 7);
    }

    #[test]
    fn glyph_phase_erases_and_rebiases_the_tables() {
        let mut visual = two_paragraph_visual();
        let mut info = TextUpdateInfo::default();
        clear_glyph_model_data(&mut visual, &mut info, 0, 2, OperationsMask::ALL_OPERATIONS);

        assert_eq!(visual.glyphs.len(), 3);
        assert_eq!(visual.characters_to_glyph, [0, 1, 2]);
        assert_eq!(visual.glyphs_per_character, [1, 1, 1]);
        assert_eq!(visual.glyphs_to_characters, [0, 1, 2]);
        assert_eq!(visual.characters_per_glyph, [1, 1, 1]);
        assert_eq!(visual.color_indices, [2, 2, 2]);
        assert_eq!(visual.lines, [line(0, 3, 0, 3)]);
        assert_eq!(info.start_line_index, 0);
    }

    #[test]
    fn clearing_the_last_paragraph_keeps_the_first() {
        let mut visual = two_paragraph_visual();
        let mut info = TextUpdateInfo {
            start_glyph_index: 4,
            ..Default::default()
        };
        clear_glyph_model_data(&mut visual, &mut info, 3, 5, OperationsMask::ALL_OPERATIONS);

        assert_eq!(visual.glyphs.len(), 4);
        assert_eq!(visual.characters_to_glyph, [0, 1, 3]);
        assert_eq!(visual.glyphs_to_characters, [0, 1, 1, 2]);
        assert_eq!(visual.lines, [line(0, 4, 0, 3)]);
        assert_eq!(info.start_line_index, 1);
    }

    #[test]
    fn character_phase_erases_and_shifts_runs() {
        let mut logical = two_paragraph_logical();
        clear_character_model_data(&mut logical, 0, 2, OperationsMask::ALL_OPERATIONS);

        assert_eq!(logical.line_break_info().len(), 3);
        assert_eq!(logical.paragraph_info(), [ParagraphRun { character_run: CharacterRun::new(0, 3) }]);
        assert_eq!(logical.all_script_runs().len(), 1);
        assert_eq!(logical.all_script_runs()[0].character_run, CharacterRun::new(0, 3));
    }

    #[test]
    fn bidi_data_is_cleared_only_when_present() {
        let mut logical = two_paragraph_logical();
        *logical.character_directions_mut() = vec![false; 6];
        clear_character_model_data(&mut logical, 0, 2, OperationsMask::ALL_OPERATIONS);
        assert_eq!(logical.character_directions().len(), 6);

        let mut logical = two_paragraph_logical();
        *logical.character_directions_mut() = vec![false, false, false, true, true, true];
        *logical.bidirectional_paragraph_info_mut() = vec![BidirectionalParagraphInfoRun {
            character_run: CharacterRun::new(3, 3),
            direction: true,
            levels: vec![1, 1, 1],
        }];
        *logical.bidirectional_line_info_mut() = vec![BidirectionalLineInfoRun {
            character_run: CharacterRun::new(3, 3),
            visual_to_logical_map: vec![2, 1, 0],
            character_run_for_second_half_line: CharacterRun::default(),
            visual_to_logical_map_second_half: Vec::new(),
            direction: true,
            is_identity: false,
        }];
        logical.set_visual_to_logical_map();

        clear_character_model_data(&mut logical, 3, 5, OperationsMask::ALL_OPERATIONS);
        assert!(logical.bidirectional_paragraph_info().is_empty());
        assert!(logical.bidirectional_line_info().is_empty());
        assert_eq!(logical.character_directions(), [false, false, false]);
        assert_eq!(logical.logical_character_index(1), 1);
    }

    #[test]
    fn whole_text_range_takes_the_full_path() {
        let mut logical = two_paragraph_logical();
        let mut visual = two_paragraph_visual();
        let mut info = TextUpdateInfo {
            previous_number_of_characters: 6,
            ..Default::default()
        };
        clear_model_data(&mut logical, &mut visual, &mut info, 0, 5, OperationsMask::ALL_OPERATIONS);

        assert!(visual.glyphs.is_empty());
        assert!(visual.lines.is_empty());
        assert!(logical.all_script_runs().is_empty());
        assert_eq!(info.estimated_number_of_lines, 0);
    }

    #[test]
    fn estimated_lines_follow_the_larger_table() {
        let mut logical = two_paragraph_logical();
        let mut visual = two_paragraph_visual();
        let mut info = TextUpdateInfo {
            previous_number_of_characters: 6,
            ..Default::default()
        };
        clear_model_data(&mut logical, &mut visual, &mut info, 0, 2, OperationsMask::GET_SCRIPTS);
        assert_eq!(info.estimated_number_of_lines, 2);
    }
}

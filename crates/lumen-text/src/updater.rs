//! Incremental model updates.
//!
//! [`TextModel`] owns a logical and a visual model plus the bookkeeping of
//! the pending edit. An edit only marks what changed; [`TextModel::update`]
//! then clears the affected paragraphs and runs the pipeline over them:
//! line breaks, scripts, fonts, bidirectional info, shaping, glyph metrics
//! and colors. [`TextModel::relayout`] lays the glyphs out afterwards.

use crate::bidi::{LayoutDirection, get_characters_direction, get_mirrored_text, set_bidirectional_info};
use crate::charset::utf8_to_utf32_vec;
use crate::clearer::{OperationsMask, clear_model_data};
use crate::color::set_color_segmentation_info;
use crate::error::{Result, TextError};
use crate::font::FontClient;
use crate::layout::LayoutEngine;
use crate::model::{
    Character, CharacterIndex, FontId, GlyphIndex, Length, LineIndex, LogicalModel, Size,
    VisualModel, is_new_paragraph,
};
use crate::multi_language::{set_scripts, validate_fonts};
use crate::segmentation::{set_line_break_info, set_word_break_info};
use crate::shaping::{Shaping, shape_text};

/// Steps run by [`TextModel::update`].
const MODEL_OPERATIONS: OperationsMask = OperationsMask::CONVERT_TO_UTF32
    .union(OperationsMask::GET_SCRIPTS)
    .union(OperationsMask::VALIDATE_FONTS)
    .union(OperationsMask::GET_LINE_BREAKS)
    .union(OperationsMask::BIDI_INFO)
    .union(OperationsMask::SHAPE_TEXT)
    .union(OperationsMask::GET_GLYPH_METRICS)
    .union(OperationsMask::COLOR);

/// What the pending edit changed and where its data is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextUpdateInfo {
    /// First character touched by the edit.
    pub character_index: CharacterIndex,
    pub number_of_characters_to_remove: Length,
    pub number_of_characters_to_add: Length,
    /// Number of characters before the edit.
    pub previous_number_of_characters: Length,
    /// First character of the first paragraph to rebuild.
    pub paragraph_character_index: CharacterIndex,
    /// Number of characters to rebuild after the edit.
    pub requested_number_of_characters: Length,
    pub start_glyph_index: GlyphIndex,
    pub start_line_index: LineIndex,
    pub estimated_number_of_lines: Length,
    /// Rebuild everything regardless of the edit range.
    pub clear_all: bool,
    pub full_relayout_needed: bool,
    /// Whether the text ended with a paragraph separator before the edit.
    pub is_last_character_new_paragraph: bool,
}

impl TextUpdateInfo {
    /// Forget the edit. The previous number of characters is kept.
    pub fn clear(&mut self) {
        *self = TextUpdateInfo {
            previous_number_of_characters: self.previous_number_of_characters,
            ..Default::default()
        };
    }
}

/// A text with its logical and visual models, updated incrementally.
#[derive(Debug)]
pub struct TextModel {
    pub logical: LogicalModel,
    pub visual: VisualModel,
    update_info: TextUpdateInfo,
    operations_pending: OperationsMask,
    default_font: FontId,
    layout_direction: LayoutDirection,
    match_layout_direction: bool,
}

impl TextModel {
    pub fn new(default_font: FontId) -> Self {
        Self {
            logical: LogicalModel::new(),
            visual: VisualModel::new(),
            update_info: TextUpdateInfo::default(),
            operations_pending: OperationsMask::NO_OPERATION,
            default_font,
            layout_direction: LayoutDirection::LeftToRight,
            match_layout_direction: false,
        }
    }

    pub fn default_font(&self) -> FontId {
        self.default_font
    }

    /// Change the default font. Fonts are validated again on the next update.
    pub fn set_default_font(&mut self, font_id: FontId) {
        if font_id != self.default_font {
            self.default_font = font_id;
            self.request_full_update();
        }
    }

    /// Direction of the control. With `match_layout_direction` it forces the
    /// direction of every bidirectional paragraph.
    pub fn set_layout_direction(&mut self, direction: LayoutDirection, match_layout_direction: bool) {
        self.layout_direction = direction;
        self.match_layout_direction = match_layout_direction;
        self.request_full_update();
    }

    pub fn update_info(&self) -> &TextUpdateInfo {
        &self.update_info
    }

    pub fn operations_pending(&self) -> OperationsMask {
        self.operations_pending
    }

    /// Mark extra operations to run on the next update or relayout.
    pub fn request_operations(&mut self, operations: OperationsMask) {
        self.operations_pending |= operations;
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: &[Character]) {
        self.update_info.character_index = 0;
        self.update_info.number_of_characters_to_remove = self.update_info.previous_number_of_characters;
        self.update_info.number_of_characters_to_add = text.len();
        self.update_info.clear_all = true;
        self.logical.set_text(text);
        self.operations_pending = OperationsMask::ALL_OPERATIONS;
    }

    /// Replace the whole text with UTF-8 bytes. Malformed sequences decode to
    /// a fallback character.
    pub fn set_text_utf8(&mut self, utf8: &[u8]) {
        self.set_text(&utf8_to_utf32_vec(utf8));
    }

    /// Replace `number_of_characters_to_remove` characters at `character_index`
    /// with `text`.
    ///
    /// The paragraphs touched by the edit are rebuilt on the next update.
    pub fn replace_paragraphs(
        &mut self,
        character_index: CharacterIndex,
        number_of_characters_to_remove: Length,
        text: &[Character],
    ) -> Result<()> {
        let length = self.logical.number_of_characters();
        let end = character_index + number_of_characters_to_remove;
        if end > length {
            return Err(TextError::out_of_range(end, length));
        }

        self.update_info.is_last_character_new_paragraph = self
            .logical
            .text()
            .last()
            .is_some_and(|&character| is_new_paragraph(character));
        self.update_info.character_index = character_index;
        self.update_info.number_of_characters_to_remove = number_of_characters_to_remove;
        self.update_info.number_of_characters_to_add = text.len();

        self.logical
            .text_mut()
            .splice(character_index..end, text.iter().copied());
        self.operations_pending = OperationsMask::ALL_OPERATIONS;
        Ok(())
    }

    fn request_full_update(&mut self) {
        self.update_info.character_index = 0;
        self.update_info.number_of_characters_to_remove = self.update_info.previous_number_of_characters;
        self.update_info.number_of_characters_to_add = self.logical.number_of_characters();
        self.update_info.clear_all = true;
        self.operations_pending = OperationsMask::ALL_OPERATIONS;
    }

    /// Paragraph aligned range to rebuild for the pending edit.
    ///
    /// Sets the paragraph index, requested count and start glyph of the update
    /// info and returns the number of characters to clear.
    fn calculate_text_update_indices(&mut self) -> Length {
        let info = &mut self.update_info;
        info.paragraph_character_index = 0;
        info.start_glyph_index = 0;
        info.start_line_index = 0;

        let paragraphs = self.logical.paragraph_info();
        if paragraphs.is_empty() {
            info.requested_number_of_characters =
                info.number_of_characters_to_add.saturating_sub(info.number_of_characters_to_remove);
            return 0;
        }

        let to_update = if info.character_index >= info.previous_number_of_characters {
            if info.is_last_character_new_paragraph {
                // New paragraph after the end of the text: nothing to clear.
                info.paragraph_character_index = info.previous_number_of_characters;
                info.requested_number_of_characters =
                    info.number_of_characters_to_add.saturating_sub(info.number_of_characters_to_remove);
                info.start_glyph_index = self.visual.glyphs.len();
                info.start_line_index = self.visual.lines.len().saturating_sub(1);
                return 0;
            }
            vec![paragraphs.len() - 1]
        } else {
            let number_of_characters = if info.full_relayout_needed {
                info.previous_number_of_characters
            } else {
                info.number_of_characters_to_remove.max(1)
            };
            self.logical.paragraphs_of_range(info.character_index, number_of_characters)
        };

        let mut number_of_characters = 0;
        if let (Some(&first), Some(&last)) = (to_update.first(), to_update.last()) {
            info.paragraph_character_index = paragraphs[first].character_run.character_index;

            // Removing the separator of the last paragraph merges it with the next one.
            let merges_next = info.number_of_characters_to_remove > 0
                && last + 1 < paragraphs.len()
                && paragraphs[last].character_run.end()
                    == info.character_index + info.number_of_characters_to_remove;
            let last = if merges_next { last + 1 } else { last };
            number_of_characters = paragraphs[last].character_run.end() - info.paragraph_character_index;
        }

        info.requested_number_of_characters = (number_of_characters + info.number_of_characters_to_add)
            .saturating_sub(info.number_of_characters_to_remove);
        info.start_glyph_index = self
            .visual
            .characters_to_glyph
            .get(info.paragraph_character_index)
            .copied()
            .unwrap_or(self.visual.glyphs.len());
        number_of_characters
    }

    /// Run the pending model operations selected by `operations_required`.
    ///
    /// Returns whether anything was updated.
    pub fn update(
        &mut self,
        operations_required: OperationsMask,
        shaping: &mut dyn Shaping,
        font_client: &mut dyn FontClient,
    ) -> bool {
        let operations = self.operations_pending & operations_required & MODEL_OPERATIONS;
        if operations.is_empty() {
            return false;
        }

        let number_of_characters = self.logical.number_of_characters();
        let paragraph_characters = self.calculate_text_update_indices();

        if self.update_info.paragraph_character_index > number_of_characters
            || self.update_info.requested_number_of_characters > number_of_characters
        {
            if number_of_characters != 0 {
                tracing::warn!(
                    update_info = ?self.update_info,
                    number_of_characters,
                    "invalid update indices, model left untouched"
                );
                return false;
            }
            self.update_info.clear();
            self.update_info.clear_all = true;
        }

        let start_index = self.update_info.paragraph_character_index;
        if self.update_info.clear_all || paragraph_characters != 0 {
            // Lines and bidi line info of the edited paragraphs stay stale until the next relayout.
            let clear_operations =
                operations | (self.operations_pending & (OperationsMask::LAYOUT | OperationsMask::REORDER));
            clear_model_data(
                &mut self.logical,
                &mut self.visual,
                &mut self.update_info,
                start_index,
                start_index + paragraph_characters.saturating_sub(1),
                clear_operations,
            );
        }
        self.update_info.clear_all = false;

        let requested = self.update_info.requested_number_of_characters;
        let start_glyph_index = self.update_info.start_glyph_index;
        tracing::debug!(
            start_index,
            requested,
            start_glyph_index,
            ?operations,
            "updating model"
        );

        if operations.contains(OperationsMask::GET_LINE_BREAKS) {
            let mut line_breaks = core::mem::take(self.logical.line_break_info_mut());
            set_line_break_info(self.logical.text(), start_index, requested, &mut line_breaks);
            self.logical.set_line_break_info(line_breaks);

            let mut word_breaks = core::mem::take(self.logical.word_break_info_mut());
            set_word_break_info(self.logical.text(), start_index, requested, &mut word_breaks);
            self.logical.set_word_break_info(word_breaks);

            self.logical.create_paragraph_info(start_index, requested);
        }

        if operations.contains(OperationsMask::GET_SCRIPTS) {
            let mut scripts = core::mem::take(self.logical.script_runs_mut());
            set_scripts(self.logical.text(), start_index, requested, &mut scripts);
            *self.logical.script_runs_mut() = scripts;
        }

        if operations.contains(OperationsMask::VALIDATE_FONTS) {
            let mut fonts = core::mem::take(self.logical.font_runs_mut());
            validate_fonts(
                font_client,
                self.logical.text(),
                self.logical.all_script_runs(),
                &self.logical.font_description_runs,
                self.default_font,
                start_index,
                requested,
                &mut fonts,
            );
            *self.logical.font_runs_mut() = fonts;
        }

        let mut mirrored_text = Vec::new();
        let mut is_text_mirrored = false;
        if operations.contains(OperationsMask::BIDI_INFO) {
            let mut bidirectional_info = core::mem::take(self.logical.bidirectional_paragraph_info_mut());
            set_bidirectional_info(
                self.logical.text(),
                self.logical.all_script_runs(),
                self.logical.line_break_info(),
                start_index,
                requested,
                &mut bidirectional_info,
                self.match_layout_direction,
                self.layout_direction,
            );

            if bidirectional_info.is_empty() {
                self.logical.character_directions_mut().clear();
            } else {
                let mut directions = core::mem::take(self.logical.character_directions_mut());
                get_characters_direction(
                    &bidirectional_info,
                    number_of_characters,
                    start_index,
                    requested,
                    &mut directions,
                );
                is_text_mirrored = get_mirrored_text(
                    self.logical.text(),
                    &directions,
                    &bidirectional_info,
                    start_index,
                    requested,
                    &mut mirrored_text,
                );
                *self.logical.character_directions_mut() = directions;
            }
            self.logical.set_bidirectional_info(bidirectional_info);
        }

        let glyphs_before = self.visual.glyphs.len();
        let mut new_paragraph_glyphs = Vec::new();
        if operations.contains(OperationsMask::SHAPE_TEXT) {
            let text = if is_text_mirrored { &mirrored_text[..] } else { self.logical.text() };
            new_paragraph_glyphs = shape_text(
                shaping,
                &self.logical,
                text,
                start_index,
                start_glyph_index,
                requested,
                &mut self.visual,
            );
            self.visual.create_glyphs_per_character_table(start_index, start_glyph_index, requested);
            self.visual.create_character_to_glyph_table(start_index, start_glyph_index, requested);
        }

        if operations.contains(OperationsMask::GET_GLYPH_METRICS) {
            let number_of_new_glyphs = self.visual.glyphs.len().saturating_sub(glyphs_before);
            let end = (start_glyph_index + number_of_new_glyphs).min(self.visual.glyphs.len());
            if let Some(new_glyphs) = self.visual.glyphs.get_mut(start_glyph_index..end) {
                font_client.glyph_metrics(new_glyphs);
            }
            for index in new_paragraph_glyphs {
                if let Some(glyph) = self.visual.glyphs.get_mut(index) {
                    glyph.x_bearing = 0.0;
                    glyph.width = 0.0;
                    glyph.advance = 0.0;
                }
            }
        }

        if operations.contains(OperationsMask::COLOR) {
            let visual = &mut self.visual;
            set_color_segmentation_info(
                &self.logical.color_runs,
                &visual.characters_to_glyph,
                &visual.glyphs_per_character,
                start_index,
                start_glyph_index,
                requested,
                &mut visual.colors,
                &mut visual.color_indices,
            );
            set_color_segmentation_info(
                &self.logical.background_color_runs,
                &visual.characters_to_glyph,
                &visual.glyphs_per_character,
                start_index,
                start_glyph_index,
                requested,
                &mut visual.background_colors,
                &mut visual.background_color_indices,
            );
        }

        self.update_info.previous_number_of_characters = number_of_characters;
        self.update_info.clear();
        self.operations_pending.remove(operations);
        true
    }

    /// Lay the text out in a box of `size`, running the pending layout,
    /// reorder and alignment steps. Returns the layout size.
    pub fn relayout(&mut self, engine: &LayoutEngine, font_client: &mut dyn FontClient, size: Size) -> Size {
        let layout_operations = OperationsMask::LAYOUT
            | OperationsMask::UPDATE_LAYOUT_SIZE
            | OperationsMask::REORDER
            | OperationsMask::ALIGN;
        let operations = self.operations_pending & layout_operations;

        if self.visual.control_size() != size {
            self.visual.set_control_size(size);
        }

        if operations.contains(OperationsMask::LAYOUT) {
            engine.layout(&self.logical, &mut self.visual, font_client, size);
        }
        if operations.contains(OperationsMask::UPDATE_LAYOUT_SIZE) {
            let natural = engine.natural_size(&self.logical, &self.visual, font_client);
            self.visual.set_natural_size(natural);
        }
        if operations.contains(OperationsMask::REORDER) {
            engine.reorder(&mut self.logical, &mut self.visual);
        }
        if operations.contains(OperationsMask::ALIGN) {
            engine.align(&mut self.visual, size.width);
        }

        self.operations_pending.remove(operations);
        self.visual.layout_size()
    }
}

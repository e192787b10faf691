//! Greedy line layout over the shaped glyphs.
//!
//! Lines are built glyph by glyph. A line ends after a mandatory break, or,
//! when wrapping, at the last break opportunity before the box width is
//! exceeded. Glyph positions are relative to the pen of their line: `x` from
//! the line start and `y` from the baseline.

use crate::bidi::reorder_line;
use crate::font::FontClient;
use crate::model::{
    CharacterRun, GlyphIndex, GlyphRun, HorizontalAlignment, LineBreakInfo, LineRun, LogicalModel,
    Size, Vector2, VisualModel, is_white_space,
};

/// How lines wrap when they exceed the box width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Only mandatory breaks end a line.
    NoWrap,
    /// Wrap at line break opportunities, splitting a word only when it
    /// does not fit on a line of its own.
    #[default]
    BreakWord,
    /// Wrap after any glyph.
    BreakAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutEngine {
    wrap_mode: WrapMode,
    /// Extra space added below every line.
    line_spacing: f32,
}

impl LayoutEngine {
    pub fn new(wrap_mode: WrapMode) -> Self {
        Self {
            wrap_mode,
            line_spacing: 0.0,
        }
    }

    pub fn with_line_spacing(mut self, line_spacing: f32) -> Self {
        self.line_spacing = line_spacing;
        self
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    pub fn line_spacing(&self) -> f32 {
        self.line_spacing
    }

    /// Lay out every glyph of `visual` into lines no wider than
    /// `bounding_box.width` (unless a single glyph is wider).
    ///
    /// Replaces the lines and glyph positions and stores the layout size,
    /// which is also returned.
    pub fn layout(
        &self,
        logical: &LogicalModel,
        visual: &mut VisualModel,
        font_client: &mut dyn FontClient,
        bounding_box: Size,
    ) -> Size {
        let lines = self.compute_lines(logical, visual, font_client, bounding_box.width);

        let mut positions = vec![Vector2::ZERO; visual.glyphs.len()];
        for line in &lines {
            let mut pen_x = 0.0;
            let first = line.glyph_run.glyph_index;
            for (glyph, position) in visual.glyphs[first..line.glyph_run.end()]
                .iter()
                .zip(&mut positions[first..])
            {
                *position = Vector2::new(pen_x + glyph.x_bearing, -glyph.y_bearing);
                pen_x += glyph.advance;
            }
        }

        let size = layout_size(&lines);
        tracing::debug!(
            lines = lines.len(),
            glyphs = visual.glyphs.len(),
            width = size.width,
            height = size.height,
            "text laid out"
        );

        visual.glyph_positions = positions;
        visual.lines = lines;
        visual.clear_caches();
        visual.set_layout_size(size);
        size
    }

    /// Size of the text laid out without wrapping.
    pub fn natural_size(
        &self,
        logical: &LogicalModel,
        visual: &VisualModel,
        font_client: &mut dyn FontClient,
    ) -> Size {
        let unwrapped = LayoutEngine {
            wrap_mode: WrapMode::NoWrap,
            ..*self
        };
        layout_size(&unwrapped.compute_lines(logical, visual, font_client, f32::INFINITY))
    }

    /// Reorder the lines of bidirectional paragraphs into visual order.
    ///
    /// Rebuilds the bidirectional line info and the visual/logical maps of
    /// `logical`, and moves the glyphs of right-to-left lines to their
    /// visual positions.
    pub fn reorder(&self, logical: &mut LogicalModel, visual: &mut VisualModel) {
        logical.bidirectional_line_info_mut().clear();
        if logical.bidirectional_paragraph_info().is_empty() {
            logical.clear_visual_to_logical_map();
            return;
        }

        let mut line_infos = Vec::new();
        for line in &mut visual.lines {
            let run = line.character_run;
            let Some(paragraph) = logical
                .bidirectional_paragraph_info()
                .iter()
                .find(|paragraph| paragraph.character_run.contains(run.character_index))
            else {
                continue;
            };
            if run.number_of_characters == 0 {
                continue;
            }

            let info = reorder_line(paragraph, logical.text(), run.character_index, run.number_of_characters);
            line.direction = info.direction;

            // Trailing white space of a right-to-left line sits left of the text.
            let mut pen_x = if info.direction { -line.extra_length } else { 0.0 };
            for &offset in &info.visual_to_logical_map {
                let character = run.character_index + offset;
                let (Some(&first_glyph), Some(&count)) = (
                    visual.characters_to_glyph.get(character),
                    visual.glyphs_per_character.get(character),
                ) else {
                    continue;
                };
                for glyph_index in first_glyph..first_glyph + count {
                    let (Some(glyph), Some(position)) =
                        (visual.glyphs.get(glyph_index), visual.glyph_positions.get_mut(glyph_index))
                    else {
                        continue;
                    };
                    position.x = pen_x + glyph.x_bearing;
                    pen_x += glyph.advance;
                }
            }
            line_infos.push(info);
        }

        tracing::debug!(lines = line_infos.len(), "reordered bidirectional lines");
        *logical.bidirectional_line_info_mut() = line_infos;
        logical.set_visual_to_logical_map();
    }

    /// Set the alignment offset of every line within `box_width`.
    ///
    /// `Begin` and `End` follow the line direction: a right-to-left line
    /// begins at the right edge.
    pub fn align(&self, visual: &mut VisualModel, box_width: f32) {
        let alignment = visual.horizontal_alignment();
        for line in &mut visual.lines {
            line.alignment_offset = alignment_offset(alignment, line, box_width);
        }
    }

    fn compute_lines(
        &self,
        logical: &LogicalModel,
        visual: &VisualModel,
        font_client: &mut dyn FontClient,
        box_width: f32,
    ) -> Vec<LineRun> {
        let total_glyphs = visual.glyphs.len();
        let mut lines = Vec::new();
        let mut start = 0;
        while start < total_glyphs {
            let end = self.line_end(logical, visual, start, box_width);
            lines.push(self.line_run(logical, visual, font_client, start, end));
            start = end;
        }
        lines
    }

    /// One past the last glyph of the line starting at `start`.
    fn line_end(&self, logical: &LogicalModel, visual: &VisualModel, start: GlyphIndex, box_width: f32) -> GlyphIndex {
        let text = logical.text();
        let wraps = self.wrap_mode != WrapMode::NoWrap;
        let mut pen_x = 0.0;
        let mut last_break = None;

        for index in start..visual.glyphs.len() {
            let glyph = &visual.glyphs[index];
            let characters = visual.characters_per_glyph.get(index).copied().unwrap_or(1);
            let last_character = visual.glyphs_to_characters.get(index).copied().unwrap_or(0) + characters.saturating_sub(1);
            let is_space = characters > 0 && text.get(last_character).is_some_and(|&c| is_white_space(c));

            if wraps && !is_space && index > start && pen_x + glyph.advance > box_width {
                let end = match (self.wrap_mode, last_break) {
                    (WrapMode::BreakWord, Some(end)) => end,
                    _ => cluster_start(visual, start, index),
                };
                return end;
            }
            pen_x += glyph.advance;

            // Split glyphs of one character carry no break info of their own.
            if characters == 0 {
                continue;
            }
            match logical.line_break(last_character) {
                LineBreakInfo::MustBreak => return index + 1,
                LineBreakInfo::AllowBreak => last_break = Some(index + 1),
                LineBreakInfo::NoBreak if self.wrap_mode == WrapMode::BreakAll => last_break = Some(index + 1),
                LineBreakInfo::NoBreak => {}
            }
        }
        visual.glyphs.len()
    }

    fn line_run(
        &self,
        logical: &LogicalModel,
        visual: &VisualModel,
        font_client: &mut dyn FontClient,
        start: GlyphIndex,
        end: GlyphIndex,
    ) -> LineRun {
        let text = logical.text();
        let glyphs = &visual.glyphs[start..end];

        let mut trailing = 0.0;
        for index in (start..end).rev() {
            let character = visual.glyphs_to_characters.get(index).copied().unwrap_or(0);
            if !text.get(character).is_some_and(|&c| is_white_space(c)) {
                break;
            }
            trailing += visual.glyphs[index].advance;
        }
        let length: f32 = glyphs.iter().map(|glyph| glyph.advance).sum();

        let mut ascender: f32 = 0.0;
        let mut descender: f32 = 0.0;
        let mut last_font = None;
        for glyph in glyphs {
            if last_font == Some(glyph.font_id) {
                continue;
            }
            last_font = Some(glyph.font_id);
            let metrics = font_client.font_metrics(glyph.font_id);
            ascender = ascender.max(metrics.ascender);
            descender = descender.min(metrics.descender);
        }

        let first_character = visual.glyphs_to_characters.get(start).copied().unwrap_or(0);
        let end_character = visual.glyphs_to_characters.get(end).copied().unwrap_or(text.len());

        LineRun {
            glyph_run: GlyphRun::new(start, end - start),
            character_run: CharacterRun::new(first_character, end_character.saturating_sub(first_character)),
            width: length - trailing,
            ascender,
            descender,
            extra_length: trailing,
            alignment_offset: 0.0,
            direction: false,
            line_spacing: self.line_spacing,
            ellipsis: false,
        }
    }
}

/// Move a forced break at `index` back so the glyphs of one character stay
/// on the same line.
fn cluster_start(visual: &VisualModel, start: GlyphIndex, mut index: GlyphIndex) -> GlyphIndex {
    while index > start + 1 && visual.characters_per_glyph.get(index - 1) == Some(&0) {
        index -= 1;
    }
    index
}

fn layout_size(lines: &[LineRun]) -> Size {
    let width = lines.iter().map(|line| line.width).fold(0.0, f32::max);
    let height = lines.iter().map(line_height).sum();
    Size::new(width, height)
}

/// Distance from the top of `line` to the top of the next one.
pub fn line_height(line: &LineRun) -> f32 {
    line.ascender - line.descender + line.line_spacing
}

fn alignment_offset(alignment: HorizontalAlignment, line: &LineRun, box_width: f32) -> f32 {
    let space = box_width - line.width;
    match (alignment, line.direction) {
        (HorizontalAlignment::Begin, false) | (HorizontalAlignment::End, true) => 0.0,
        (HorizontalAlignment::Begin, true) | (HorizontalAlignment::End, false) => space,
        (HorizontalAlignment::Center, _) => (space / 2.0).floor(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::{LayoutDirection, get_characters_direction, set_bidirectional_info};
    use crate::model::{Character, GlyphInfo};
    use crate::multi_language::set_scripts;
    use crate::segmentation::set_line_break_info;
    use crate::testing::{ASCENDER, DESCENDER, GLYPH_ADVANCE, MockFontClient, utf32};

    /// One glyph per character with the mock metrics; new paragraphs get no advance.
    fn shaped(text: &[Character]) -> (LogicalModel, VisualModel) {
        let mut logical = LogicalModel::new();
        logical.set_text(text);
        let mut breaks = Vec::new();
        set_line_break_info(text, 0, text.len(), &mut breaks);
        logical.set_line_break_info(breaks);

        let mut visual = VisualModel::new();
        visual.glyphs = text
            .iter()
            .map(|&character| GlyphInfo {
                font_id: 1,
                index: character,
                width: 8.0,
                x_bearing: 1.0,
                y_bearing: 10.0,
                advance: if character == 0x0A { 0.0 } else { GLYPH_ADVANCE },
                ..Default::default()
            })
            .collect();
        visual.glyphs_to_characters = (0..text.len()).collect();
        visual.characters_to_glyph = (0..text.len()).collect();
        visual.characters_per_glyph = vec![1; text.len()];
        visual.glyphs_per_character = vec![1; text.len()];
        (logical, visual)
    }

    fn line_characters(visual: &VisualModel) -> Vec<(usize, usize)> {
        visual
            .lines
            .iter()
            .map(|line| (line.character_run.character_index, line.character_run.number_of_characters))
            .collect()
    }

    #[test]
    fn mandatory_breaks_end_lines() {
        let (logical, mut visual) = shaped(&utf32("ab\ncd"));
        let size = LayoutEngine::new(WrapMode::NoWrap).layout(&logical, &mut visual, &mut MockFontClient, Size::new(1000.0, 100.0));

        assert_eq!(line_characters(&visual), [(0, 3), (3, 2)]);
        assert_eq!(visual.lines[0].ascender, ASCENDER);
        assert_eq!(visual.lines[0].descender, DESCENDER);
        assert_eq!(size, Size::new(20.0, 2.0 * (ASCENDER - DESCENDER)));
    }

    #[test]
    fn words_wrap_at_break_opportunities() {
        let (logical, mut visual) = shaped(&utf32("ab cd ef"));
        LayoutEngine::new(WrapMode::BreakWord).layout(&logical, &mut visual, &mut MockFontClient, Size::new(55.0, 100.0));

        assert_eq!(line_characters(&visual), [(0, 6), (6, 2)]);
        // The space closing the first line is not part of its width.
        assert_eq!(visual.lines[0].width, 50.0);
        assert_eq!(visual.lines[0].extra_length, 10.0);
    }

    #[test]
    fn long_words_are_split_when_nothing_else_fits() {
        let (logical, mut visual) = shaped(&utf32("abcdef"));
        LayoutEngine::new(WrapMode::BreakWord).layout(&logical, &mut visual, &mut MockFontClient, Size::new(35.0, 100.0));
        assert_eq!(line_characters(&visual), [(0, 3), (3, 3)]);
    }

    #[test]
    fn positions_start_at_each_line_pen() {
        let (logical, mut visual) = shaped(&utf32("ab\ncd"));
        LayoutEngine::new(WrapMode::NoWrap).layout(&logical, &mut visual, &mut MockFontClient, Size::new(1000.0, 100.0));

        assert_eq!(visual.glyph_positions[0], Vector2::new(1.0, -10.0));
        assert_eq!(visual.glyph_positions[1], Vector2::new(11.0, -10.0));
        assert_eq!(visual.glyph_positions[3], Vector2::new(1.0, -10.0));
    }

    #[test]
    fn natural_size_ignores_the_box_width() {
        let (logical, visual) = shaped(&utf32("ab cd ef"));
        let size = LayoutEngine::new(WrapMode::BreakWord).natural_size(&logical, &visual, &mut MockFontClient);
        assert_eq!(size, Size::new(80.0, ASCENDER - DESCENDER));
    }

    #[test]
    fn alignment_follows_the_line_direction() {
        let (logical, mut visual) = shaped(&utf32("abcd"));
        let engine = LayoutEngine::new(WrapMode::NoWrap);
        engine.layout(&logical, &mut visual, &mut MockFontClient, Size::new(100.0, 100.0));

        visual.set_horizontal_alignment(HorizontalAlignment::Center);
        engine.align(&mut visual, 100.0);
        assert_eq!(visual.lines[0].alignment_offset, 30.0);

        visual.set_horizontal_alignment(HorizontalAlignment::End);
        engine.align(&mut visual, 100.0);
        assert_eq!(visual.lines[0].alignment_offset, 60.0);

        visual.lines[0].direction = true;
        visual.set_horizontal_alignment(HorizontalAlignment::Begin);
        engine.align(&mut visual, 100.0);
        assert_eq!(visual.lines[0].alignment_offset, 60.0);
    }

    #[test]
    fn right_to_left_lines_are_placed_in_visual_order() {
        let text = utf32("אבג");
        let (mut logical, mut visual) = shaped(&text);
        let mut scripts = Vec::new();
        set_scripts(&text, 0, text.len(), &mut scripts);
        let mut info = Vec::new();
        set_bidirectional_info(
            &text,
            &scripts,
            logical.line_break_info(),
            0,
            text.len(),
            &mut info,
            false,
            LayoutDirection::LeftToRight,
        );
        let mut directions = Vec::new();
        get_characters_direction(&info, text.len(), 0, text.len(), &mut directions);
        logical.set_bidirectional_info(info);
        *logical.character_directions_mut() = directions;

        let engine = LayoutEngine::new(WrapMode::NoWrap);
        engine.layout(&logical, &mut visual, &mut MockFontClient, Size::new(100.0, 100.0));
        engine.reorder(&mut logical, &mut visual);

        assert!(visual.lines[0].direction);
        assert_eq!(logical.bidirectional_line_info().len(), 1);
        // The first logical character is drawn last.
        assert_eq!(visual.glyph_positions[0].x, 21.0);
        assert_eq!(visual.glyph_positions[2].x, 1.0);
        assert_eq!(logical.logical_character_index(0), 2);
        assert_eq!(logical.visual_character_index(0), 2);
    }

    #[test]
    fn left_to_right_text_has_no_line_info() {
        let (mut logical, mut visual) = shaped(&utf32("abc"));
        let engine = LayoutEngine::new(WrapMode::NoWrap);
        engine.layout(&logical, &mut visual, &mut MockFontClient, Size::new(100.0, 100.0));
        engine.reorder(&mut logical, &mut visual);
        assert!(logical.bidirectional_line_info().is_empty());
        assert_eq!(logical.logical_character_index(1), 1);
    }
}

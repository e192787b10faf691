use core::cell::Cell;

use super::runs::{LineRun, StrikethroughGlyphRun, UnderlinedGlyphRun};
use super::{
    CharacterIndex, Color, ColorIndex, GlyphIndex, GlyphInfo, Length, LineIndex, Size, Vector2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    #[default]
    Begin,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderlineType {
    #[default]
    Solid,
    Dashed,
    Double,
}

/// Underline overrides carried by a markup underline run.
///
/// A property only applies when its `*_defined` flag is set; otherwise the
/// control-level value is used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnderlineStyleProperties {
    pub underline_type: UnderlineType,
    pub color: Color,
    pub height: f32,
    pub dash_gap: f32,
    pub dash_width: f32,
    pub type_defined: bool,
    pub color_defined: bool,
    pub height_defined: bool,
    pub dash_gap_defined: bool,
    pub dash_width_defined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LineQuery {
    glyph_index: GlyphIndex,
    number_of_glyphs: Length,
    first_line: LineIndex,
    number_of_lines: Length,
}

/// Per-glyph layout data plus the control-level text style.
///
/// The four conversion tables stay mutually consistent: summing
/// `glyphs_per_character` over a character range gives the glyphs of that
/// range, and `characters_per_glyph` is its glyph-side mirror.
#[derive(Debug)]
pub struct VisualModel {
    pub glyphs: Vec<GlyphInfo>,
    pub glyphs_to_characters: Vec<CharacterIndex>,
    pub characters_to_glyph: Vec<GlyphIndex>,
    pub characters_per_glyph: Vec<Length>,
    pub glyphs_per_character: Vec<Length>,
    pub glyph_positions: Vec<Vector2>,
    pub lines: Vec<LineRun>,
    pub underline_runs: Vec<UnderlinedGlyphRun>,
    pub strikethrough_runs: Vec<StrikethroughGlyphRun>,
    pub color_indices: Vec<ColorIndex>,
    pub background_color_indices: Vec<ColorIndex>,
    /// Palette referenced by `color_indices`; index `i` maps to `colors[i - 1]`.
    pub colors: Vec<Color>,
    pub background_colors: Vec<Color>,

    control_size: Size,
    natural_size: Size,
    layout_size: Size,

    text_color: Color,
    shadow_color: Color,
    shadow_offset: Vector2,
    shadow_blur_radius: f32,
    underline_color: Color,
    underline_enabled: bool,
    underline_height: f32,
    underline_type: UnderlineType,
    dashed_underline_width: f32,
    dashed_underline_gap: f32,
    outline_color: Color,
    outline_width: u16,
    outline_offset: Vector2,
    background_color: Color,
    background_enabled: bool,
    markup_background_color_set: bool,
    strikethrough_color: Color,
    strikethrough_enabled: bool,
    strikethrough_height: f32,
    cutout_enabled: bool,
    horizontal_alignment: HorizontalAlignment,
    vertical_alignment: VerticalAlignment,

    line_query: Cell<Option<LineQuery>>,
}

impl Default for VisualModel {
    fn default() -> Self {
        Self {
            glyphs: Vec::new(),
            glyphs_to_characters: Vec::new(),
            characters_to_glyph: Vec::new(),
            characters_per_glyph: Vec::new(),
            glyphs_per_character: Vec::new(),
            glyph_positions: Vec::new(),
            lines: Vec::new(),
            underline_runs: Vec::new(),
            strikethrough_runs: Vec::new(),
            color_indices: Vec::new(),
            background_color_indices: Vec::new(),
            colors: Vec::new(),
            background_colors: Vec::new(),
            control_size: Size::default(),
            natural_size: Size::default(),
            layout_size: Size::default(),
            text_color: Color::BLACK,
            shadow_color: Color::BLACK,
            shadow_offset: Vector2::ZERO,
            shadow_blur_radius: 0.0,
            underline_color: Color::BLACK,
            underline_enabled: false,
            underline_height: 0.0,
            underline_type: UnderlineType::Solid,
            dashed_underline_width: 2.0,
            dashed_underline_gap: 1.0,
            outline_color: Color::WHITE,
            outline_width: 0,
            outline_offset: Vector2::ZERO,
            background_color: Color::TRANSPARENT,
            background_enabled: false,
            markup_background_color_set: false,
            strikethrough_color: Color::BLACK,
            strikethrough_enabled: false,
            strikethrough_height: 0.0,
            cutout_enabled: false,
            horizontal_alignment: HorizontalAlignment::Begin,
            vertical_alignment: VerticalAlignment::Top,
            line_query: Cell::new(None),
        }
    }
}

impl VisualModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_glyphs(&self) -> Length {
        self.glyphs.len()
    }

    pub fn glyphs(&self, glyph_index: GlyphIndex, number_of_glyphs: Length) -> &[GlyphInfo] {
        slice_range(&self.glyphs, glyph_index, number_of_glyphs)
    }

    pub fn glyph_positions(&self, glyph_index: GlyphIndex, number_of_glyphs: Length) -> &[Vector2] {
        slice_range(&self.glyph_positions, glyph_index, number_of_glyphs)
    }

    /// Fill `glyphs_per_character` for `[start_index, start_index + number_of_characters)`
    /// from the characters-per-glyph table, walking glyphs from `start_glyph_index`.
    ///
    /// Glyphs folding zero characters are counted into the next character that
    /// owns a glyph.
    pub fn create_glyphs_per_character_table(
        &mut self,
        start_index: CharacterIndex,
        start_glyph_index: GlyphIndex,
        number_of_characters: Length,
    ) {
        if number_of_characters == 0 {
            return;
        }

        let mut new_entries = Vec::with_capacity(number_of_characters);
        let mut zeros: Length = 0;
        let mut glyph = start_glyph_index;
        while new_entries.len() < number_of_characters && glyph < self.characters_per_glyph.len() {
            let characters = self.characters_per_glyph[glyph];
            if characters == 0 {
                zeros += 1;
            } else {
                new_entries.push(1 + zeros);
                new_entries.extend(core::iter::repeat_n(0, characters - 1));
                zeros = 0;
            }
            glyph += 1;
        }
        new_entries.resize(number_of_characters, 0);

        let position = start_index.min(self.glyphs_per_character.len());
        self.glyphs_per_character.splice(position..position, new_entries);
    }

    /// Fill `characters_to_glyph` for the new characters and move the entries
    /// of the following characters past the new glyphs.
    ///
    /// Requires the glyphs-per-character entries of the range.
    pub fn create_character_to_glyph_table(
        &mut self,
        start_index: CharacterIndex,
        start_glyph_index: GlyphIndex,
        number_of_characters: Length,
    ) {
        if number_of_characters == 0 {
            return;
        }

        let end_index = start_index + number_of_characters;
        let mut new_entries = Vec::with_capacity(number_of_characters);
        let mut glyph_index = start_glyph_index;
        let mut character = start_index;
        let mut glyph = start_glyph_index;
        while character < end_index && glyph < self.characters_per_glyph.len() {
            let characters = self.characters_per_glyph[glyph];
            glyph += 1;
            if characters == 0 {
                continue;
            }
            let last = (character + characters).min(end_index);
            let mut glyphs_of_cluster = 0;
            for index in character..last {
                new_entries.push(glyph_index);
                glyphs_of_cluster += self.glyphs_per_character.get(index).copied().unwrap_or(0);
            }
            glyph_index += glyphs_of_cluster;
            character = last;
        }
        new_entries.resize(number_of_characters, glyph_index);

        let new_glyphs = glyph_index - start_glyph_index;
        let position = start_index.min(self.characters_to_glyph.len());
        for entry in &mut self.characters_to_glyph[position..] {
            *entry += new_glyphs;
        }
        self.characters_to_glyph.splice(position..position, new_entries);
    }

    /// Lines holding any of `[glyph_index, glyph_index + number_of_glyphs)`
    /// as `(first_line, number_of_lines)`.
    pub fn number_of_lines(&self, glyph_index: GlyphIndex, number_of_glyphs: Length) -> (LineIndex, Length) {
        if let Some(query) = self.line_query.get() {
            if query.glyph_index == glyph_index && query.number_of_glyphs == number_of_glyphs {
                return (query.first_line, query.number_of_lines);
            }
        }

        let last_glyph = glyph_index + number_of_glyphs;
        let first_line = self
            .lines
            .iter()
            .position(|line| line.glyph_run.end() > glyph_index)
            .unwrap_or(self.lines.len());
        let number_of_lines = self.lines[first_line..]
            .iter()
            .take_while(|line| line.glyph_run.glyph_index < last_glyph)
            .count();

        self.line_query.set(Some(LineQuery {
            glyph_index,
            number_of_glyphs,
            first_line,
            number_of_lines,
        }));
        (first_line, number_of_lines)
    }

    /// Line holding `character_index`; past the end, the last line.
    pub fn line_of_character(&self, character_index: CharacterIndex) -> LineIndex {
        self.lines
            .iter()
            .position(|line| character_index < line.character_run.end())
            .unwrap_or_else(|| self.lines.len().saturating_sub(1))
    }

    pub fn underline_runs(&self, index: usize, number_of_runs: Length) -> &[UnderlinedGlyphRun] {
        slice_range(&self.underline_runs, index, number_of_runs)
    }

    pub fn strikethrough_runs(&self, index: usize, number_of_runs: Length) -> &[StrikethroughGlyphRun] {
        slice_range(&self.strikethrough_runs, index, number_of_runs)
    }

    /// Drop every cached query.
    pub fn clear_caches(&self) {
        self.line_query.set(None);
    }

    // --- sizes -----------------------------------------------------------

    pub fn set_control_size(&mut self, size: Size) {
        self.control_size = size;
    }

    pub fn control_size(&self) -> Size {
        self.control_size
    }

    pub fn set_natural_size(&mut self, size: Size) {
        self.natural_size = size;
    }

    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    pub fn set_layout_size(&mut self, size: Size) {
        self.layout_size = size;
    }

    pub fn layout_size(&self) -> Size {
        self.layout_size
    }

    // --- style -----------------------------------------------------------

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn set_shadow_color(&mut self, color: Color) {
        self.shadow_color = color;
    }

    pub fn shadow_color(&self) -> Color {
        self.shadow_color
    }

    pub fn set_shadow_offset(&mut self, offset: Vector2) {
        self.shadow_offset = offset;
    }

    pub fn shadow_offset(&self) -> Vector2 {
        self.shadow_offset
    }

    pub fn set_shadow_blur_radius(&mut self, radius: f32) {
        self.shadow_blur_radius = radius;
    }

    pub fn shadow_blur_radius(&self) -> f32 {
        self.shadow_blur_radius
    }

    pub fn set_underline_color(&mut self, color: Color) {
        self.underline_color = color;
    }

    pub fn underline_color(&self) -> Color {
        self.underline_color
    }

    pub fn set_underline_enabled(&mut self, enabled: bool) {
        self.underline_enabled = enabled;
    }

    pub fn is_underline_enabled(&self) -> bool {
        self.underline_enabled
    }

    /// Underline thickness. Zero uses the font's own thickness.
    pub fn set_underline_height(&mut self, height: f32) {
        self.underline_height = height;
    }

    pub fn underline_height(&self) -> f32 {
        self.underline_height
    }

    pub fn set_underline_type(&mut self, underline_type: UnderlineType) {
        self.underline_type = underline_type;
    }

    pub fn underline_type(&self) -> UnderlineType {
        self.underline_type
    }

    pub fn set_dashed_underline_width(&mut self, width: f32) {
        self.dashed_underline_width = width;
    }

    pub fn dashed_underline_width(&self) -> f32 {
        self.dashed_underline_width
    }

    pub fn set_dashed_underline_gap(&mut self, gap: f32) {
        self.dashed_underline_gap = gap;
    }

    pub fn dashed_underline_gap(&self) -> f32 {
        self.dashed_underline_gap
    }

    pub fn set_outline_color(&mut self, color: Color) {
        self.outline_color = color;
    }

    pub fn outline_color(&self) -> Color {
        self.outline_color
    }

    pub fn set_outline_width(&mut self, width: u16) {
        self.outline_width = width;
    }

    pub fn outline_width(&self) -> u16 {
        self.outline_width
    }

    pub fn set_outline_offset(&mut self, offset: Vector2) {
        self.outline_offset = offset;
    }

    pub fn outline_offset(&self) -> Vector2 {
        self.outline_offset
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn set_background_enabled(&mut self, enabled: bool) {
        self.background_enabled = enabled;
    }

    pub fn is_background_enabled(&self) -> bool {
        self.background_enabled
    }

    pub fn set_markup_background_color_set(&mut self, set: bool) {
        self.markup_background_color_set = set;
    }

    pub fn is_markup_background_color_set(&self) -> bool {
        self.markup_background_color_set
    }

    pub fn set_strikethrough_color(&mut self, color: Color) {
        self.strikethrough_color = color;
    }

    pub fn strikethrough_color(&self) -> Color {
        self.strikethrough_color
    }

    pub fn set_strikethrough_enabled(&mut self, enabled: bool) {
        self.strikethrough_enabled = enabled;
    }

    pub fn is_strikethrough_enabled(&self) -> bool {
        self.strikethrough_enabled
    }

    pub fn set_strikethrough_height(&mut self, height: f32) {
        self.strikethrough_height = height;
    }

    pub fn strikethrough_height(&self) -> f32 {
        self.strikethrough_height
    }

    pub fn set_cutout_enabled(&mut self, enabled: bool) {
        self.cutout_enabled = enabled;
    }

    pub fn is_cutout_enabled(&self) -> bool {
        self.cutout_enabled
    }

    pub fn set_horizontal_alignment(&mut self, alignment: HorizontalAlignment) {
        self.horizontal_alignment = alignment;
    }

    pub fn horizontal_alignment(&self) -> HorizontalAlignment {
        self.horizontal_alignment
    }

    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) {
        self.vertical_alignment = alignment;
    }

    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.vertical_alignment
    }
}

fn slice_range<T>(items: &[T], index: usize, count: Length) -> &[T] {
    let start = index.min(items.len());
    let end = index.saturating_add(count).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CharacterRun, GlyphRun};

    #[test]
    fn tables_for_a_ligature() {
        // "fix": "fi" is one glyph.
        let mut model = VisualModel::new();
        model.characters_per_glyph = vec![2, 1];
        model.create_glyphs_per_character_table(0, 0, 3);
        model.create_character_to_glyph_table(0, 0, 3);
        assert_eq!(model.glyphs_per_character, [1, 0, 1]);
        assert_eq!(model.characters_to_glyph, [0, 0, 1]);
    }

    #[test]
    fn tables_for_a_character_split_in_several_glyphs() {
        // Three glyphs for the first two characters, one for the third.
        let mut model = VisualModel::new();
        model.characters_per_glyph = vec![0, 0, 2, 1];
        model.create_glyphs_per_character_table(0, 0, 3);
        model.create_character_to_glyph_table(0, 0, 3);
        assert_eq!(model.glyphs_per_character, [3, 0, 1]);
        assert_eq!(model.characters_to_glyph, [0, 0, 3]);
    }

    #[test]
    fn partial_tables_shift_the_following_entries() {
        let mut model = VisualModel::new();
        // Characters 0..2 and 4..6 already shaped, one glyph each; 2..4 inserted
        // as two new glyphs at glyph 2.
        model.characters_per_glyph = vec![1, 1, 1, 1, 1, 1];
        model.glyphs_per_character = vec![1, 1, 1, 1];
        model.characters_to_glyph = vec![0, 1, 2, 3];
        model.create_glyphs_per_character_table(2, 2, 2);
        model.create_character_to_glyph_table(2, 2, 2);
        assert_eq!(model.glyphs_per_character, [1, 1, 1, 1, 1, 1]);
        assert_eq!(model.characters_to_glyph, [0, 1, 2, 3, 4, 5]);
    }

    fn line(glyph_index: usize, glyphs: usize, character_index: usize, characters: usize) -> LineRun {
        LineRun {
            glyph_run: GlyphRun::new(glyph_index, glyphs),
            character_run: CharacterRun::new(character_index, characters),
            ..Default::default()
        }
    }

    #[test]
    fn line_queries() {
        let mut model = VisualModel::new();
        model.lines = vec![line(0, 5, 0, 5), line(5, 3, 5, 4), line(8, 4, 9, 4)];
        assert_eq!(model.number_of_lines(0, 12), (0, 3));
        assert_eq!(model.number_of_lines(6, 3), (1, 2));
        assert_eq!(model.number_of_lines(12, 2), (3, 0));
        assert_eq!(model.line_of_character(6), 1);
        assert_eq!(model.line_of_character(40), 2);

        model.lines.truncate(1);
        model.clear_caches();
        assert_eq!(model.number_of_lines(0, 12), (0, 1));
    }

    #[test]
    fn ranged_accessors_clamp() {
        let mut model = VisualModel::new();
        model.glyphs = vec![GlyphInfo::default(); 3];
        assert_eq!(model.glyphs(1, 10).len(), 2);
        assert!(model.glyph_positions(0, 2).is_empty());
        assert!(model.underline_runs(4, 1).is_empty());
    }
}

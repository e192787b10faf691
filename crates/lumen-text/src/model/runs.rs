use core::ops::Range;

use super::{CharacterDirection, CharacterIndex, Color, FontId, GlyphIndex, Length, Script};
use super::visual::UnderlineStyleProperties;

/// A contiguous range of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacterRun {
    pub character_index: CharacterIndex,
    pub number_of_characters: Length,
}

impl CharacterRun {
    pub const fn new(character_index: CharacterIndex, number_of_characters: Length) -> Self {
        Self {
            character_index,
            number_of_characters,
        }
    }

    /// Index one past the last character of the run.
    pub const fn end(&self) -> CharacterIndex {
        self.character_index + self.number_of_characters
    }

    pub const fn contains(&self, index: CharacterIndex) -> bool {
        index >= self.character_index && index < self.end()
    }
}

/// A contiguous range of glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphRun {
    pub glyph_index: GlyphIndex,
    pub number_of_glyphs: Length,
}

impl GlyphRun {
    pub const fn new(glyph_index: GlyphIndex, number_of_glyphs: Length) -> Self {
        Self {
            glyph_index,
            number_of_glyphs,
        }
    }

    pub const fn end(&self) -> GlyphIndex {
        self.glyph_index + self.number_of_glyphs
    }

    pub const fn contains(&self, index: GlyphIndex) -> bool {
        index >= self.glyph_index && index < self.end()
    }
}

/// Records spanning a range of characters.
pub trait HasCharacterRun {
    fn character_run(&self) -> &CharacterRun;
    fn character_run_mut(&mut self) -> &mut CharacterRun;
}

/// Records spanning a range of glyphs.
pub trait HasGlyphRun {
    fn glyph_run(&self) -> &GlyphRun;
    fn glyph_run_mut(&mut self) -> &mut GlyphRun;
}

macro_rules! impl_character_run {
    ($($ty:ty),* $(,)?) => {$(
        impl HasCharacterRun for $ty {
            fn character_run(&self) -> &CharacterRun {
                &self.character_run
            }
            fn character_run_mut(&mut self) -> &mut CharacterRun {
                &mut self.character_run
            }
        }
    )*};
}

macro_rules! impl_glyph_run {
    ($($ty:ty),* $(,)?) => {$(
        impl HasGlyphRun for $ty {
            fn glyph_run(&self) -> &GlyphRun {
                &self.glyph_run
            }
            fn glyph_run_mut(&mut self) -> &mut GlyphRun {
                &mut self.glyph_run
            }
        }
    )*};
}

impl HasCharacterRun for CharacterRun {
    fn character_run(&self) -> &CharacterRun {
        self
    }
    fn character_run_mut(&mut self) -> &mut CharacterRun {
        self
    }
}

impl HasGlyphRun for GlyphRun {
    fn glyph_run(&self) -> &GlyphRun {
        self
    }
    fn glyph_run_mut(&mut self) -> &mut GlyphRun {
        self
    }
}

/// Characters sharing one Unicode script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRun {
    pub character_run: CharacterRun,
    pub script: Script,
    pub is_right_to_left: bool,
}

/// Characters resolved to one font and style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontRun {
    pub character_run: CharacterRun,
    pub font_id: FontId,
    pub is_italic_required: bool,
    pub is_bold_required: bool,
}

/// Font requested for a range of characters, usually by markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontDescriptionRun {
    pub character_run: CharacterRun,
    pub font_id: FontId,
    pub is_italic_required: bool,
    pub is_bold_required: bool,
}

/// A paragraph, including its trailing separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphRun {
    pub character_run: CharacterRun,
}

/// Color applied to a range of characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRun {
    pub character_run: CharacterRun,
    pub color: Color,
}

/// Bidirectional data for a paragraph holding right-to-left text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BidirectionalParagraphInfoRun {
    pub character_run: CharacterRun,
    /// Paragraph base direction.
    pub direction: CharacterDirection,
    /// Resolved embedding level per character of the paragraph.
    pub levels: Vec<u8>,
}

/// Reordering data for one laid-out line of a bidirectional paragraph.
///
/// The maps are relative to the first character of their half line and are
/// released together with the run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BidirectionalLineInfoRun {
    pub character_run: CharacterRun,
    pub visual_to_logical_map: Vec<CharacterIndex>,
    pub character_run_for_second_half_line: CharacterRun,
    pub visual_to_logical_map_second_half: Vec<CharacterIndex>,
    pub direction: CharacterDirection,
    pub is_identity: bool,
}

/// A laid-out visual line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineRun {
    pub glyph_run: GlyphRun,
    pub character_run: CharacterRun,
    pub width: f32,
    /// Distance above the baseline (positive).
    pub ascender: f32,
    /// Distance below the baseline (negative).
    pub descender: f32,
    /// Width of the trailing white space not counted in `width`.
    pub extra_length: f32,
    pub alignment_offset: f32,
    pub direction: CharacterDirection,
    pub line_spacing: f32,
    pub ellipsis: bool,
}

/// Glyphs underlined through markup, with their own style overrides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnderlinedGlyphRun {
    pub glyph_run: GlyphRun,
    pub properties: UnderlineStyleProperties,
}

/// Glyphs struck through; without an explicit color the text color is used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrikethroughGlyphRun {
    pub glyph_run: GlyphRun,
    pub color: Color,
    pub is_color_set: bool,
}

impl_character_run!(
    ScriptRun,
    FontRun,
    FontDescriptionRun,
    ParagraphRun,
    ColorRun,
    BidirectionalParagraphInfoRun,
    BidirectionalLineInfoRun,
    LineRun,
);

impl_glyph_run!(LineRun, UnderlinedGlyphRun, StrikethroughGlyphRun);

/// Find the runs intersecting the characters `[start_index, end_index]` and
/// shift every run starting after `end_index` down by the number of removed
/// characters.
///
/// Returns the index range of the runs to erase. It is empty and positioned
/// at `runs.len()` when nothing intersects.
pub fn clear_character_runs<T: HasCharacterRun>(
    start_index: CharacterIndex,
    end_index: CharacterIndex,
    runs: &mut [T],
) -> Range<usize> {
    let intersects = |run: &CharacterRun| {
        run.character_index <= end_index && start_index < run.end()
    };

    let start_remove = runs
        .iter()
        .position(|run| intersects(run.character_run()))
        .unwrap_or(runs.len());
    let end_remove = runs[start_remove..]
        .iter()
        .position(|run| !intersects(run.character_run()))
        .map_or(runs.len(), |offset| start_remove + offset);

    let removed = 1 + end_index - start_index;
    for run in runs.iter_mut() {
        let run = run.character_run_mut();
        if run.character_index > end_index {
            run.character_index -= removed;
        }
    }

    start_remove..end_remove
}

/// Glyph counterpart of [`clear_character_runs`] over `[start_index, end_index]`.
pub fn clear_glyph_runs<T: HasGlyphRun>(
    start_index: GlyphIndex,
    end_index: GlyphIndex,
    runs: &mut [T],
) -> Range<usize> {
    let intersects = |run: &GlyphRun| run.glyph_index <= end_index && start_index < run.end();

    let start_remove = runs
        .iter()
        .position(|run| intersects(run.glyph_run()))
        .unwrap_or(runs.len());
    let end_remove = runs[start_remove..]
        .iter()
        .position(|run| !intersects(run.glyph_run()))
        .map_or(runs.len(), |offset| start_remove + offset);

    let removed = 1 + end_index - start_index;
    for run in runs.iter_mut() {
        let run = run.glyph_run_mut();
        if run.glyph_index > end_index {
            run.glyph_index -= removed;
        }
    }

    start_remove..end_remove
}

/// Clear and erase the character runs intersecting `[start_index, end_index]`.
pub fn erase_character_runs<T: HasCharacterRun>(
    start_index: CharacterIndex,
    end_index: CharacterIndex,
    runs: &mut Vec<T>,
) {
    let remove = clear_character_runs(start_index, end_index, runs);
    runs.drain(remove);
}

/// Insert `new_runs` at the position of the first run starting at or after
/// `start_index`, shifting the runs that follow by `number_of_characters`.
///
/// Used when a cleared range is filled again.
pub fn insert_character_runs<T: HasCharacterRun>(
    runs: &mut Vec<T>,
    new_runs: Vec<T>,
    start_index: CharacterIndex,
    number_of_characters: Length,
) {
    let position = runs
        .iter()
        .position(|run| run.character_run().character_index >= start_index)
        .unwrap_or(runs.len());
    for run in &mut runs[position..] {
        run.character_run_mut().character_index += number_of_characters;
    }
    runs.splice(position..position, new_runs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(lengths: &[usize]) -> Vec<ParagraphRun> {
        let mut index = 0;
        lengths
            .iter()
            .map(|&n| {
                let run = ParagraphRun {
                    character_run: CharacterRun::new(index, n),
                };
                index += n;
                run
            })
            .collect()
    }

    #[test]
    fn clearing_a_middle_range_removes_and_rebiases() {
        let mut runs = paragraphs(&[5, 4, 6]);
        let remove = clear_character_runs(5, 8, &mut runs);
        assert_eq!(remove, 1..2);
        runs.drain(remove);
        assert_eq!(runs[0].character_run, CharacterRun::new(0, 5));
        assert_eq!(runs[1].character_run, CharacterRun::new(5, 6));
    }

    #[test]
    fn clearing_a_range_spanning_runs_removes_all_of_them() {
        let mut runs = paragraphs(&[3, 3, 3, 3]);
        erase_character_runs(4, 7, &mut runs);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].character_run, CharacterRun::new(2, 3));
    }

    #[test]
    fn runs_starting_inside_the_range_are_not_rebiased() {
        // Script runs of "ab אב\ncd": [0,3) [3,6) [6,8).
        let mut runs = paragraphs(&[3, 3, 2]);
        let remove = clear_character_runs(0, 5, &mut runs);
        assert_eq!(remove, 0..2);
        runs.drain(remove);
        assert_eq!(runs, paragraphs(&[2]));
    }

    #[test]
    fn glyph_runs_starting_inside_the_range_are_not_rebiased() {
        let mut lines: Vec<LineRun> = [(0, 2), (2, 3), (5, 4)]
            .into_iter()
            .map(|(index, count)| LineRun {
                glyph_run: GlyphRun::new(index, count),
                ..Default::default()
            })
            .collect();
        let remove = clear_glyph_runs(1, 4, &mut lines);
        assert_eq!(remove, 0..2);
        assert_eq!(lines[2].glyph_run, GlyphRun::new(1, 4));
    }

    #[test]
    fn clearing_past_the_last_run_is_empty() {
        let mut runs = paragraphs(&[3, 3]);
        let remove = clear_character_runs(10, 12, &mut runs);
        assert_eq!(remove, 2..2);
        assert_eq!(runs[1].character_run, CharacterRun::new(3, 3));
    }

    #[test]
    fn glyph_runs_clear_like_character_runs() {
        let mut lines = vec![
            LineRun {
                glyph_run: GlyphRun::new(0, 4),
                ..Default::default()
            },
            LineRun {
                glyph_run: GlyphRun::new(4, 4),
                ..Default::default()
            },
            LineRun {
                glyph_run: GlyphRun::new(8, 2),
                ..Default::default()
            },
        ];
        let remove = clear_glyph_runs(4, 7, &mut lines);
        assert_eq!(remove, 1..2);
        assert_eq!(lines[2].glyph_run, GlyphRun::new(4, 2));
    }

    #[test]
    fn inserting_runs_shifts_the_following_ones() {
        let mut runs = paragraphs(&[3, 3]);
        erase_character_runs(3, 5, &mut runs);
        let new_runs = paragraphs(&[2, 2])
            .into_iter()
            .map(|mut run| {
                run.character_run.character_index += 3;
                run
            })
            .collect();
        insert_character_runs(&mut runs, new_runs, 3, 4);
        let ranges: Vec<_> = runs.iter().map(|r| r.character_run).collect();
        assert_eq!(
            ranges,
            [CharacterRun::new(0, 3), CharacterRun::new(3, 2), CharacterRun::new(5, 2)]
        );
    }
}

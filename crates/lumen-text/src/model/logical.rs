use core::cell::Cell;

use super::runs::{
    BidirectionalLineInfoRun, BidirectionalParagraphInfoRun, CharacterRun, ColorRun,
    FontDescriptionRun, FontRun, HasCharacterRun, ParagraphRun, ScriptRun, insert_character_runs,
};
use super::{
    Character, CharacterDirection, CharacterIndex, FontId, Length, LineBreakInfo, Script,
    WordBreakInfo,
};
use crate::error::{Result, TextError};

/// The last run query answered by [`LogicalModel::script_runs`] or
/// [`LogicalModel::font_runs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunQuery {
    pub character_index: CharacterIndex,
    pub number_of_characters: Length,
    pub first_run: usize,
    pub number_of_runs: Length,
}

/// Character buffer plus every per-character annotation of one text.
#[derive(Debug, Default)]
pub struct LogicalModel {
    text: Vec<Character>,
    script_runs: Vec<ScriptRun>,
    font_runs: Vec<FontRun>,
    pub font_description_runs: Vec<FontDescriptionRun>,
    pub color_runs: Vec<ColorRun>,
    pub background_color_runs: Vec<ColorRun>,
    line_break_info: Vec<LineBreakInfo>,
    word_break_info: Vec<WordBreakInfo>,
    paragraph_info: Vec<ParagraphRun>,
    bidirectional_paragraph_info: Vec<BidirectionalParagraphInfoRun>,
    character_directions: Vec<CharacterDirection>,
    bidirectional_line_info: Vec<BidirectionalLineInfoRun>,
    visual_to_logical_map: Vec<CharacterIndex>,
    logical_to_visual_map: Vec<CharacterIndex>,
    script_query: Cell<Option<RunQuery>>,
    font_query: Cell<Option<RunQuery>>,
}

impl LogicalModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the character buffer with a copy of `text`.
    pub fn set_text(&mut self, text: &[Character]) {
        self.text.clear();
        self.text.extend_from_slice(text);
    }

    pub fn text(&self) -> &[Character] {
        &self.text
    }

    /// Mutable access used by editors splicing characters in place.
    pub fn text_mut(&mut self) -> &mut Vec<Character> {
        &mut self.text
    }

    pub fn number_of_characters(&self) -> Length {
        self.text.len()
    }

    pub fn character(&self, index: CharacterIndex) -> Result<Character> {
        self.text
            .get(index)
            .copied()
            .ok_or_else(|| TextError::out_of_range(index, self.text.len()))
    }

    // --- scripts ---------------------------------------------------------

    /// Replace the script runs. They must cover the text exactly once.
    pub fn set_scripts(&mut self, runs: Vec<ScriptRun>) -> Result<()> {
        validate_coverage("script", &runs, self.text.len())?;
        self.script_runs = runs;
        self.script_query.set(None);
        Ok(())
    }

    /// Direct access for incremental updates. Drops the cached query.
    pub fn script_runs_mut(&mut self) -> &mut Vec<ScriptRun> {
        self.script_query.set(None);
        &mut self.script_runs
    }

    pub fn all_script_runs(&self) -> &[ScriptRun] {
        &self.script_runs
    }

    /// Script runs overlapping `[character_index, character_index + number_of_characters)`.
    pub fn script_runs(&self, character_index: CharacterIndex, number_of_characters: Length) -> &[ScriptRun] {
        let query = self.query_runs(&self.script_runs, &self.script_query, character_index, number_of_characters);
        &self.script_runs[query.first_run..query.first_run + query.number_of_runs]
    }

    pub fn number_of_script_runs(&self, character_index: CharacterIndex, number_of_characters: Length) -> Length {
        self.script_runs(character_index, number_of_characters).len()
    }

    pub fn last_script_query(&self) -> Option<RunQuery> {
        self.script_query.get()
    }

    /// Script of the character at `index`, `Script::Unknown` when no run covers it.
    pub fn script(&self, index: CharacterIndex) -> Result<Script> {
        self.check_index(index)?;
        Ok(self
            .script_runs
            .iter()
            .find(|run| run.character_run.contains(index))
            .map_or(Script::Unknown, |run| run.script))
    }

    // --- fonts -----------------------------------------------------------

    pub fn set_fonts(&mut self, runs: Vec<FontRun>) -> Result<()> {
        validate_coverage("font", &runs, self.text.len())?;
        self.font_runs = runs;
        self.font_query.set(None);
        Ok(())
    }

    pub fn font_runs_mut(&mut self) -> &mut Vec<FontRun> {
        self.font_query.set(None);
        &mut self.font_runs
    }

    pub fn all_font_runs(&self) -> &[FontRun] {
        &self.font_runs
    }

    pub fn font_runs(&self, character_index: CharacterIndex, number_of_characters: Length) -> &[FontRun] {
        let query = self.query_runs(&self.font_runs, &self.font_query, character_index, number_of_characters);
        &self.font_runs[query.first_run..query.first_run + query.number_of_runs]
    }

    pub fn number_of_font_runs(&self, character_index: CharacterIndex, number_of_characters: Length) -> Length {
        self.font_runs(character_index, number_of_characters).len()
    }

    pub fn last_font_query(&self) -> Option<RunQuery> {
        self.font_query.get()
    }

    /// Font of the character at `index`, 0 when no run covers it.
    pub fn font(&self, index: CharacterIndex) -> Result<FontId> {
        self.check_index(index)?;
        Ok(self
            .font_runs
            .iter()
            .find(|run| run.character_run.contains(index))
            .map_or(0, |run| run.font_id))
    }

    fn query_runs<T: HasCharacterRun>(
        &self,
        runs: &[T],
        cache: &Cell<Option<RunQuery>>,
        character_index: CharacterIndex,
        number_of_characters: Length,
    ) -> RunQuery {
        if let Some(query) = cache.get() {
            if query.character_index == character_index && query.number_of_characters == number_of_characters {
                return query;
            }
        }

        let query = if character_index == 0 && number_of_characters == self.text.len() {
            RunQuery {
                character_index,
                number_of_characters,
                first_run: 0,
                number_of_runs: runs.len(),
            }
        } else {
            let last = character_index + number_of_characters;
            let mut first_run = 0;
            let mut number_of_runs = 0;
            for run in runs {
                let run = run.character_run();
                if run.end() > character_index && last > run.character_index {
                    number_of_runs += 1;
                } else if last <= run.character_index {
                    break;
                } else if number_of_runs == 0 {
                    first_run += 1;
                }
            }
            RunQuery {
                character_index,
                number_of_characters,
                first_run,
                number_of_runs,
            }
        };

        cache.set(Some(query));
        query
    }

    fn check_index(&self, index: CharacterIndex) -> Result<()> {
        if index >= self.text.len() {
            return Err(TextError::out_of_range(index, self.text.len()));
        }
        Ok(())
    }

    // --- line and word breaks --------------------------------------------

    pub fn line_break_info(&self) -> &[LineBreakInfo] {
        &self.line_break_info
    }

    pub fn line_break_info_mut(&mut self) -> &mut Vec<LineBreakInfo> {
        &mut self.line_break_info
    }

    /// Line break after the character at `index`. Missing entries read as no break.
    pub fn line_break(&self, index: CharacterIndex) -> LineBreakInfo {
        self.line_break_info.get(index).copied().unwrap_or_default()
    }

    pub fn set_line_break_info(&mut self, info: Vec<LineBreakInfo>) {
        self.line_break_info = info;
    }

    pub fn word_break_info(&self) -> &[WordBreakInfo] {
        &self.word_break_info
    }

    pub fn word_break_info_mut(&mut self) -> &mut Vec<WordBreakInfo> {
        &mut self.word_break_info
    }

    pub fn word_break(&self, index: CharacterIndex) -> WordBreakInfo {
        self.word_break_info.get(index).copied().unwrap_or_default()
    }

    pub fn set_word_break_info(&mut self, info: Vec<WordBreakInfo>) {
        self.word_break_info = info;
    }

    // --- paragraphs ------------------------------------------------------

    pub fn paragraph_info(&self) -> &[ParagraphRun] {
        &self.paragraph_info
    }

    pub fn paragraph_info_mut(&mut self) -> &mut Vec<ParagraphRun> {
        &mut self.paragraph_info
    }

    /// Build the paragraphs of `[start_index, start_index + number_of_characters)`
    /// from the mandatory line breaks and splice them in.
    ///
    /// Paragraphs after the range are moved up by `number_of_characters`.
    pub fn create_paragraph_info(&mut self, start_index: CharacterIndex, number_of_characters: Length) {
        let end_index = (start_index + number_of_characters).min(self.line_break_info.len());

        let mut new_paragraphs = Vec::new();
        let mut paragraph_start = start_index;
        for index in start_index..end_index {
            if self.line_break_info[index] == LineBreakInfo::MustBreak {
                new_paragraphs.push(ParagraphRun {
                    character_run: CharacterRun::new(paragraph_start, index + 1 - paragraph_start),
                });
                paragraph_start = index + 1;
            }
        }
        if paragraph_start < end_index {
            new_paragraphs.push(ParagraphRun {
                character_run: CharacterRun::new(paragraph_start, end_index - paragraph_start),
            });
        }

        if start_index == 0 && self.paragraph_info.is_empty() {
            self.paragraph_info = new_paragraphs;
        } else {
            insert_character_runs(&mut self.paragraph_info, new_paragraphs, start_index, number_of_characters);
        }
    }

    /// Indices of the paragraphs touching `[index, index + number_of_characters)`.
    pub fn paragraphs_of_range(&self, index: CharacterIndex, number_of_characters: Length) -> Vec<usize> {
        let last = index + number_of_characters;
        self.paragraph_info
            .iter()
            .enumerate()
            .filter(|(_, paragraph)| {
                let run = paragraph.character_run;
                run.character_index < last && index < run.end()
            })
            .map(|(position, _)| position)
            .collect()
    }

    /// Index of the paragraph holding `index`. Past the end, the last paragraph.
    pub fn paragraph_of_character(&self, index: CharacterIndex) -> Option<usize> {
        self.paragraph_info
            .iter()
            .position(|paragraph| index < paragraph.character_run.end())
            .or_else(|| self.paragraph_info.len().checked_sub(1))
    }

    // --- bidirectional info ----------------------------------------------

    pub fn bidirectional_paragraph_info(&self) -> &[BidirectionalParagraphInfoRun] {
        &self.bidirectional_paragraph_info
    }

    pub fn bidirectional_paragraph_info_mut(&mut self) -> &mut Vec<BidirectionalParagraphInfoRun> {
        &mut self.bidirectional_paragraph_info
    }

    pub fn set_bidirectional_info(&mut self, runs: Vec<BidirectionalParagraphInfoRun>) {
        self.bidirectional_paragraph_info = runs;
    }

    pub fn number_of_bidirectional_info_runs(&self) -> Length {
        self.bidirectional_paragraph_info.len()
    }

    /// Paragraph direction of the bidirectional paragraph holding `index`,
    /// left to right when there is none.
    pub fn paragraph_direction(&self, index: CharacterIndex) -> CharacterDirection {
        self.bidirectional_paragraph_info
            .iter()
            .find(|run| run.character_run.contains(index))
            .is_some_and(|run| run.direction)
    }

    pub fn character_directions(&self) -> &[CharacterDirection] {
        &self.character_directions
    }

    pub fn character_directions_mut(&mut self) -> &mut Vec<CharacterDirection> {
        &mut self.character_directions
    }

    /// `true` when the character at `index` is right to left. Text without
    /// bidirectional info reads as left to right.
    pub fn character_direction(&self, index: CharacterIndex) -> CharacterDirection {
        self.character_directions.get(index).copied().unwrap_or(false)
    }

    pub fn bidirectional_line_info(&self) -> &[BidirectionalLineInfoRun] {
        &self.bidirectional_line_info
    }

    pub fn bidirectional_line_info_mut(&mut self) -> &mut Vec<BidirectionalLineInfoRun> {
        &mut self.bidirectional_line_info
    }

    /// Rebuild the full visual/logical conversion tables from the bidirectional
    /// line runs. Without line runs both tables are emptied and the lookups
    /// fall back to identity.
    pub fn set_visual_to_logical_map(&mut self) {
        if self.bidirectional_line_info.is_empty() {
            self.visual_to_logical_map.clear();
            self.logical_to_visual_map.clear();
            return;
        }

        let total = self.text.len();
        let mut visual_to_logical: Vec<CharacterIndex> = (0..total).collect();
        for line in &self.bidirectional_line_info {
            let first = line.character_run.character_index;
            for (offset, logical) in line.visual_to_logical_map.iter().enumerate() {
                if first + offset < total {
                    visual_to_logical[first + offset] = first + logical;
                }
            }
            let second = line.character_run_for_second_half_line.character_index;
            for (offset, logical) in line.visual_to_logical_map_second_half.iter().enumerate() {
                if second + offset < total {
                    visual_to_logical[second + offset] = second + logical;
                }
            }
        }

        let mut logical_to_visual = vec![0; total];
        for (visual, &logical) in visual_to_logical.iter().enumerate() {
            if let Some(slot) = logical_to_visual.get_mut(logical) {
                *slot = visual;
            }
        }

        self.visual_to_logical_map = visual_to_logical;
        self.logical_to_visual_map = logical_to_visual;
    }

    pub fn clear_visual_to_logical_map(&mut self) {
        self.visual_to_logical_map.clear();
        self.logical_to_visual_map.clear();
    }

    pub fn logical_character_index(&self, visual_index: CharacterIndex) -> CharacterIndex {
        self.visual_to_logical_map.get(visual_index).copied().unwrap_or(visual_index)
    }

    pub fn visual_character_index(&self, logical_index: CharacterIndex) -> CharacterIndex {
        self.logical_to_visual_map.get(logical_index).copied().unwrap_or(logical_index)
    }
}

/// Check that `runs` are contiguous, ordered and cover `[0, total)` exactly once.
pub fn validate_coverage<T: HasCharacterRun>(kind: &'static str, runs: &[T], total: Length) -> Result<()> {
    let mut expected = 0;
    for run in runs {
        let run = run.character_run();
        if run.character_index != expected {
            return Err(TextError::InvalidRunCoverage {
                kind,
                reason: format!("run starts at {} but {} was expected", run.character_index, expected),
            });
        }
        expected = run.end();
    }
    if expected != total {
        return Err(TextError::InvalidRunCoverage {
            kind,
            reason: format!("runs end at {expected} but the text has {total} characters"),
        });
    }
    Ok(())
}

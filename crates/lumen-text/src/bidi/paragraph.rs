use unicode_bidi::{BidiInfo, Level};

use crate::model::{
    BidirectionalParagraphInfoRun, Character, CharacterDirection, CharacterIndex, CharacterRun,
    Length, LineBreakInfo, ScriptRun, to_char,
};

/// Direction of the control laying out the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl LayoutDirection {
    fn to_level(self) -> Level {
        match self {
            LayoutDirection::LeftToRight => Level::ltr(),
            LayoutDirection::RightToLeft => Level::rtl(),
        }
    }
}

/// Resolved embedding level of every character in `text`, one paragraph.
///
/// `base` forces the paragraph level; `None` takes it from the first strong
/// character.
fn resolve_levels(text: &[Character], base: Option<Level>) -> (Vec<u8>, bool) {
    let mut utf8 = String::with_capacity(text.len());
    let mut starts = Vec::with_capacity(text.len());
    for &character in text {
        starts.push(utf8.len());
        utf8.push(to_char(character));
    }

    let info = BidiInfo::new(&utf8, base);
    let is_rtl = info
        .paragraphs
        .first()
        .map_or(base.is_some_and(|level| level.is_rtl()), |paragraph| paragraph.level.is_rtl());
    let levels = starts
        .iter()
        .map(|&start| info.levels.get(start).map_or(0, |level| level.number()))
        .collect();
    (levels, is_rtl)
}

/// Create a paragraph run for every paragraph of the range holding a
/// right-to-left script and splice them into `bidirectional_info`.
///
/// With `match_layout_direction` the paragraph level follows
/// `layout_direction`; otherwise it comes from the text. Runs after the
/// range are moved up by `number_of_characters`.
#[allow(clippy::too_many_arguments)]
pub fn set_bidirectional_info(
    text: &[Character],
    scripts: &[ScriptRun],
    line_break_info: &[LineBreakInfo],
    start_index: CharacterIndex,
    number_of_characters: Length,
    bidirectional_info: &mut Vec<BidirectionalParagraphInfoRun>,
    match_layout_direction: bool,
    layout_direction: LayoutDirection,
) {
    let mut insert_index = bidirectional_info
        .iter()
        .position(|run| start_index < run.character_run.end())
        .unwrap_or(bidirectional_info.len());

    let last_character = start_index + number_of_characters;
    let base = match_layout_direction.then(|| layout_direction.to_level());

    // Runs after the range move first so the new ones can be inserted as they come.
    for run in &mut bidirectional_info[insert_index..] {
        run.character_run.character_index += number_of_characters;
    }

    let mut paragraph_start = start_index;
    let mut has_right_to_left_script = false;
    for script in scripts {
        let run = script.character_run;
        if run.number_of_characters == 0 || start_index >= run.end() {
            continue;
        }
        if last_character <= run.character_index {
            break;
        }

        has_right_to_left_script |= script.is_right_to_left;

        let last_index = run.end() - 1;
        let ends_paragraph = line_break_info.get(last_index) == Some(&LineBreakInfo::MustBreak);
        if !ends_paragraph {
            continue;
        }

        if has_right_to_left_script {
            let characters = &text[paragraph_start..=last_index];
            let (levels, direction) = resolve_levels(characters, base);
            bidirectional_info.insert(
                insert_index,
                BidirectionalParagraphInfoRun {
                    character_run: CharacterRun::new(paragraph_start, characters.len()),
                    direction,
                    levels,
                },
            );
            insert_index += 1;
        }
        paragraph_start = last_index + 1;
        has_right_to_left_script = false;
    }
}

/// Per-character directions (`true` for right to left) of the range, spliced
/// into `directions`. Characters outside bidirectional paragraphs are left
/// to right.
pub fn get_characters_direction(
    bidirectional_info: &[BidirectionalParagraphInfoRun],
    total_number_of_characters: Length,
    start_index: CharacterIndex,
    number_of_characters: Length,
    directions: &mut Vec<CharacterDirection>,
) {
    let last_character = start_index + number_of_characters;
    let mut new_directions = vec![false; number_of_characters];
    for paragraph in bidirectional_info {
        let run = paragraph.character_run;
        if run.end() <= start_index {
            continue;
        }
        if last_character <= run.character_index {
            break;
        }
        for (offset, level) in paragraph.levels.iter().enumerate() {
            let index = run.character_index + offset;
            if (start_index..last_character).contains(&index) {
                new_directions[index - start_index] = level % 2 == 1;
            }
        }
    }

    directions.resize(total_number_of_characters.saturating_sub(number_of_characters), false);
    let position = start_index.min(directions.len());
    directions.splice(position..position, new_directions);
}

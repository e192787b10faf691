use unicode_bidi::{BidiInfo, Level};

use crate::model::{
    BidirectionalLineInfoRun, BidirectionalParagraphInfoRun, Character, CharacterIndex,
    CharacterRun, Length, is_white_space,
};

/// Reorder one line of a bidirectional paragraph into visual order.
///
/// The line covers `[line_start, line_start + number_of_characters)` of the
/// text and must lie within `paragraph`. Trailing white space takes the
/// paragraph level (rule L1) before reordering.
pub fn reorder_line(
    paragraph: &BidirectionalParagraphInfoRun,
    text: &[Character],
    line_start: CharacterIndex,
    number_of_characters: Length,
) -> BidirectionalLineInfoRun {
    let paragraph_level = u8::from(paragraph.direction);
    let first = paragraph.character_run.character_index;

    let mut levels: Vec<u8> = (line_start..line_start + number_of_characters)
        .map(|index| {
            index
                .checked_sub(first)
                .and_then(|offset| paragraph.levels.get(offset))
                .copied()
                .unwrap_or(paragraph_level)
        })
        .collect();

    for (offset, level) in levels.iter_mut().enumerate().rev() {
        let is_trailing_space = text
            .get(line_start + offset)
            .is_some_and(|&character| is_white_space(character));
        if !is_trailing_space {
            break;
        }
        *level = paragraph_level;
    }

    let levels: Vec<Level> = levels
        .into_iter()
        .map(|level| Level::new(level).unwrap_or_else(|_| Level::ltr()))
        .collect();
    let visual_to_logical_map = BidiInfo::reorder_visual(&levels);
    let is_identity = visual_to_logical_map
        .iter()
        .enumerate()
        .all(|(visual, &logical)| visual == logical);

    BidirectionalLineInfoRun {
        character_run: CharacterRun::new(line_start, number_of_characters),
        visual_to_logical_map,
        character_run_for_second_half_line: CharacterRun::default(),
        visual_to_logical_map_second_half: Vec::new(),
        direction: paragraph.direction,
        is_identity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::LayoutDirection;
    use crate::bidi::paragraph::set_bidirectional_info;
    use crate::multi_language::set_scripts;
    use crate::segmentation::set_line_break_info;
    use crate::testing::utf32;

    fn paragraph_of(text: &[Character], base: Option<LayoutDirection>) -> BidirectionalParagraphInfoRun {
        let mut breaks = Vec::new();
        set_line_break_info(text, 0, text.len(), &mut breaks);
        let mut scripts = Vec::new();
        set_scripts(text, 0, text.len(), &mut scripts);
        let mut info = Vec::new();
        set_bidirectional_info(
            text,
            &scripts,
            &breaks,
            0,
            text.len(),
            &mut info,
            base.is_some(),
            base.unwrap_or_default(),
        );
        info.remove(0)
    }

    #[test]
    fn mixed_line_in_ltr_paragraph() {
        let text = utf32("abc אבג");
        let paragraph = paragraph_of(&text, Some(LayoutDirection::LeftToRight));
        let line = reorder_line(&paragraph, &text, 0, text.len());
        assert_eq!(line.visual_to_logical_map, [0, 1, 2, 3, 6, 5, 4]);
        assert!(!line.is_identity);
        assert!(!line.direction);
    }

    #[test]
    fn rtl_paragraph_reverses_the_line() {
        let text = utf32("אבג abc");
        let paragraph = paragraph_of(&text, None);
        let line = reorder_line(&paragraph, &text, 0, text.len());
        assert_eq!(line.visual_to_logical_map, [4, 5, 6, 3, 2, 1, 0]);
        assert!(line.direction);
    }

    #[test]
    fn trailing_spaces_take_the_paragraph_level() {
        let text = utf32("אב ");
        let paragraph = paragraph_of(&text, None);
        let line = reorder_line(&paragraph, &text, 0, 3);
        assert_eq!(line.visual_to_logical_map, [2, 1, 0]);
    }

    #[test]
    fn a_line_inside_a_paragraph() {
        let text = utf32("אבג abc");
        let paragraph = paragraph_of(&text, None);
        let line = reorder_line(&paragraph, &text, 4, 3);
        assert_eq!(line.character_run, CharacterRun::new(4, 3));
        assert_eq!(line.visual_to_logical_map, [0, 1, 2]);
        assert!(line.is_identity);
    }
}

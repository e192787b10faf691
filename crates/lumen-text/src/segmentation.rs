//! Line and word break opportunities (UAX-14 and UAX-29).

use unicode_linebreak::{BreakOpportunity, linebreaks};
use unicode_segmentation::UnicodeSegmentation;

use crate::model::{Character, CharacterIndex, Length, LineBreakInfo, WordBreakInfo, to_char};

/// UTF-8 copy of a character range plus the byte offset each character ends at.
struct Utf8View {
    text: String,
    ends: Vec<usize>,
}

impl Utf8View {
    fn new(characters: &[Character]) -> Self {
        let mut text = String::with_capacity(characters.len());
        let mut ends = Vec::with_capacity(characters.len());
        for &character in characters {
            text.push(to_char(character));
            ends.push(text.len());
        }
        Self { text, ends }
    }

    /// Character whose last byte sits right before `offset`.
    fn character_ending_at(&self, offset: usize) -> Option<usize> {
        self.ends.binary_search(&offset).ok()
    }
}

fn range(text: &[Character], start_index: CharacterIndex, number_of_characters: Length) -> &[Character] {
    let start = start_index.min(text.len());
    let end = (start_index + number_of_characters).min(text.len());
    &text[start..end]
}

/// Compute the line break info of `[start_index, start_index + number_of_characters)`
/// and insert it into `info` at `start_index`.
///
/// A break after character `i` is stored at `i`. The end of the range is
/// always a mandatory break.
pub fn set_line_break_info(
    text: &[Character],
    start_index: CharacterIndex,
    number_of_characters: Length,
    info: &mut Vec<LineBreakInfo>,
) {
    let characters = range(text, start_index, number_of_characters);
    if characters.is_empty() {
        return;
    }

    let view = Utf8View::new(characters);
    let mut breaks = vec![LineBreakInfo::NoBreak; characters.len()];
    for (offset, opportunity) in linebreaks(&view.text) {
        if let Some(index) = view.character_ending_at(offset) {
            breaks[index] = match opportunity {
                BreakOpportunity::Mandatory => LineBreakInfo::MustBreak,
                BreakOpportunity::Allowed => LineBreakInfo::AllowBreak,
            };
        }
    }
    if let Some(last) = breaks.last_mut() {
        *last = LineBreakInfo::MustBreak;
    }

    let position = start_index.min(info.len());
    info.splice(position..position, breaks);
}

/// Compute the word break info of the range and insert it at `start_index`.
///
/// A character is marked when a word boundary follows it.
pub fn set_word_break_info(
    text: &[Character],
    start_index: CharacterIndex,
    number_of_characters: Length,
    info: &mut Vec<WordBreakInfo>,
) {
    let characters = range(text, start_index, number_of_characters);
    if characters.is_empty() {
        return;
    }

    let view = Utf8View::new(characters);
    let mut breaks = vec![WordBreakInfo::NoBreak; characters.len()];
    let mut offset = 0;
    for segment in view.text.split_word_bounds() {
        offset += segment.len();
        if let Some(index) = view.character_ending_at(offset) {
            breaks[index] = WordBreakInfo::Break;
        }
    }

    let position = start_index.min(info.len());
    info.splice(position..position, breaks);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf32(text: &str) -> Vec<Character> {
        text.chars().map(u32::from).collect()
    }

    #[test]
    fn line_breaks_with_newline() {
        let text = utf32("a b\nc");
        let mut info = Vec::new();
        set_line_break_info(&text, 0, text.len(), &mut info);
        assert_eq!(
            info,
            [
                LineBreakInfo::NoBreak,
                LineBreakInfo::AllowBreak,
                LineBreakInfo::NoBreak,
                LineBreakInfo::MustBreak,
                LineBreakInfo::MustBreak,
            ]
        );
    }

    #[test]
    fn partial_line_breaks_are_inserted() {
        let text = utf32("ab\ncd\n");
        let mut info = Vec::new();
        set_line_break_info(&text, 0, 3, &mut info);
        set_line_break_info(&text, 3, 3, &mut info);
        let mut full = Vec::new();
        set_line_break_info(&text, 0, text.len(), &mut full);
        assert_eq!(info, full);
    }

    #[test]
    fn word_breaks_follow_words() {
        let text = utf32("Hello, world");
        let mut info = Vec::new();
        set_word_break_info(&text, 0, text.len(), &mut info);
        assert_eq!(info[4], WordBreakInfo::Break);
        assert_eq!(info[3], WordBreakInfo::NoBreak);
        assert_eq!(info[5], WordBreakInfo::Break);
        assert_eq!(info[11], WordBreakInfo::Break);
    }

    #[test]
    fn empty_range_is_a_no_op() {
        let text = utf32("abc");
        let mut info = vec![LineBreakInfo::NoBreak];
        set_line_break_info(&text, 3, 4, &mut info);
        assert_eq!(info.len(), 1);
    }
}

//! Mirroring of paired characters inside right-to-left text.

use crate::model::{
    BidirectionalParagraphInfoRun, Character, CharacterDirection, CharacterIndex, Length,
};

/// Mirrored counterpart of `ch`, or `ch` itself when it has none.
pub fn mirrored_character(ch: Character) -> Character {
    let mirrored = match char::from_u32(ch) {
        Some(ch) => match ch {
            '(' => ')',
            ')' => '(',
            '<' => '>',
            '>' => '<',
            '[' => ']',
            ']' => '[',
            '{' => '}',
            '}' => '{',
            '«' => '»',
            '»' => '«',
            '‹' => '›',
            '›' => '‹',
            '⁅' => '⁆',
            '⁆' => '⁅',
            '⁽' => '⁾',
            '⁾' => '⁽',
            '₍' => '₎',
            '₎' => '₍',
            '∈' => '∋',
            '∋' => '∈',
            '≤' => '≥',
            '≥' => '≤',
            '≪' => '≫',
            '≫' => '≪',
            '⊂' => '⊃',
            '⊃' => '⊂',
            '⟨' => '⟩',
            '⟩' => '⟨',
            '⟦' => '⟧',
            '⟧' => '⟦',
            '〈' => '〉',
            '〉' => '〈',
            '《' => '》',
            '》' => '《',
            other => other,
        },
        None => return ch,
    };
    u32::from(mirrored)
}

/// Copy `text` into `mirrored_text`, mirroring the right-to-left characters
/// of every bidirectional paragraph touching the range.
///
/// Returns whether any character changed.
pub fn get_mirrored_text(
    text: &[Character],
    directions: &[CharacterDirection],
    bidirectional_info: &[BidirectionalParagraphInfoRun],
    start_index: CharacterIndex,
    number_of_characters: Length,
    mirrored_text: &mut Vec<Character>,
) -> bool {
    mirrored_text.clear();
    mirrored_text.extend_from_slice(text);

    let last_character = start_index + number_of_characters;
    let mut has_text_mirrored = false;
    for paragraph in bidirectional_info {
        let run = paragraph.character_run;
        if start_index >= run.end() {
            continue;
        }
        if last_character <= run.character_index {
            break;
        }
        for index in run.character_index..run.end().min(mirrored_text.len()) {
            if !directions.get(index).copied().unwrap_or(false) {
                continue;
            }
            let mirrored = mirrored_character(mirrored_text[index]);
            if mirrored != mirrored_text[index] {
                mirrored_text[index] = mirrored;
                has_text_mirrored = true;
            }
        }
    }
    has_text_mirrored
}

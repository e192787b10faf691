//! Script segmentation and font validation.

use unicode_script::UnicodeScript;

use crate::font::FontClient;
use crate::model::runs::insert_character_runs;
use crate::model::{
    Character, CharacterIndex, CharacterRun, FontDescriptionRun, FontId, FontRun, Length, Script,
    ScriptRun, is_new_paragraph, to_char,
};

pub fn is_right_to_left_script(script: Script) -> bool {
    matches!(
        script,
        Script::Arabic
            | Script::Hebrew
            | Script::Syriac
            | Script::Thaana
            | Script::Nko
            | Script::Samaritan
            | Script::Mandaic
            | Script::Adlam
    )
}

/// Script of a character; inherited and unassigned characters count as common.
fn character_script(character: Character) -> Script {
    match to_char(character).script() {
        Script::Inherited | Script::Unknown => Script::Common,
        script => script,
    }
}

/// Collects script runs for one range.
struct ScriptRunBuilder {
    runs: Vec<ScriptRun>,
    current: ScriptRun,
    /// Common characters seen since the last strong one.
    pending_common: Length,
    is_paragraph_rtl: Option<bool>,
}

impl ScriptRunBuilder {
    fn new(start_index: CharacterIndex) -> Self {
        Self {
            runs: Vec::new(),
            current: ScriptRun {
                character_run: CharacterRun::new(start_index, 0),
                script: Script::Unknown,
                is_right_to_left: false,
            },
            pending_common: 0,
            is_paragraph_rtl: None,
        }
    }

    fn push_current(&mut self) {
        self.current.character_run.number_of_characters += self.pending_common;
        self.pending_common = 0;
        if self.current.character_run.number_of_characters == 0 {
            return;
        }
        if self.current.script == Script::Unknown {
            self.current.script = Script::Latin;
        }
        self.current.is_right_to_left = is_right_to_left_script(self.current.script);
        self.runs.push(self.current);
        self.current = ScriptRun {
            character_run: CharacterRun::new(self.current.character_run.end(), 0),
            script: Script::Unknown,
            is_right_to_left: false,
        };
    }

    fn add_common(&mut self, character: Character) {
        self.pending_common += 1;
        if is_new_paragraph(character) {
            self.push_current();
            self.is_paragraph_rtl = None;
        }
    }

    fn add_strong(&mut self, script: Script) {
        let is_rtl = is_right_to_left_script(script);
        let is_paragraph_rtl = *self.is_paragraph_rtl.get_or_insert(is_rtl);

        if script == self.current.script {
            self.current.character_run.number_of_characters += self.pending_common + 1;
            self.pending_common = 0;
            return;
        }

        let mut carried = self.pending_common;
        if self.current.script != Script::Unknown {
            let current_rtl = is_right_to_left_script(self.current.script);
            // Common characters between two scripts stay with the previous run
            // when it follows the paragraph direction or shares the new direction.
            if current_rtl == is_paragraph_rtl || current_rtl == is_rtl {
                self.current.character_run.number_of_characters += carried;
                carried = 0;
            }
            self.pending_common = 0;
            self.push_current();
        } else {
            // Leading common characters take the first strong script.
            self.pending_common = 0;
        }

        self.current.script = script;
        self.current.character_run.number_of_characters += carried + 1;
    }
}

/// Segment `[start_index, start_index + number_of_characters)` into script
/// runs and splice them into `scripts`.
///
/// Common characters take the script of their neighbours, runs end after
/// paragraph separators and paragraphs without a strong script are Latin.
/// Runs after the range are moved up by `number_of_characters`.
pub fn set_scripts(
    text: &[Character],
    start_index: CharacterIndex,
    number_of_characters: Length,
    scripts: &mut Vec<ScriptRun>,
) {
    if number_of_characters == 0 {
        return;
    }

    let last = (start_index + number_of_characters).min(text.len());
    let mut builder = ScriptRunBuilder::new(start_index);
    for &character in &text[start_index.min(last)..last] {
        match character_script(character) {
            Script::Common => builder.add_common(character),
            script => builder.add_strong(script),
        }
    }
    builder.push_current();

    insert_character_runs(scripts, builder.runs, start_index, number_of_characters);
}

/// Resolve a font for every character of the range and splice the font runs
/// into `fonts`.
///
/// A character takes the font of the last description run covering it when
/// that font supports it, otherwise the default font or a fallback from the
/// font client. Common characters keep the current font when it supports
/// them. Runs end after paragraph separators and at script run boundaries;
/// within those, adjacent characters with the same font and style share a run.
#[allow(clippy::too_many_arguments)]
pub fn validate_fonts(
    font_client: &mut dyn FontClient,
    text: &[Character],
    scripts: &[ScriptRun],
    font_descriptions: &[FontDescriptionRun],
    default_font: FontId,
    start_index: CharacterIndex,
    number_of_characters: Length,
    fonts: &mut Vec<FontRun>,
) {
    if number_of_characters == 0 {
        return;
    }

    let last = (start_index + number_of_characters).min(text.len());
    let mut new_runs: Vec<FontRun> = Vec::new();
    let mut current: Option<FontRun> = None;

    for index in start_index..last {
        let character = text[index];
        let description = font_descriptions
            .iter()
            .rev()
            .find(|run| run.character_run.contains(index));
        let (requested, is_italic_required, is_bold_required) = description
            .map_or((0, false, false), |run| (run.font_id, run.is_italic_required, run.is_bold_required));

        // Font runs never cross script runs.
        if index != start_index && scripts.iter().any(|run| run.character_run.character_index == index) {
            new_runs.extend(current.take());
        }

        let is_common = character_script(character) == Script::Common;
        let keep_current = current.as_ref().is_some_and(|run| {
            is_common
                && run.is_italic_required == is_italic_required
                && run.is_bold_required == is_bold_required
                && font_client.is_character_supported(run.font_id, character)
        });

        let font_id = if keep_current {
            current.as_ref().map_or(default_font, |run| run.font_id)
        } else if requested != 0 && font_client.is_character_supported(requested, character) {
            requested
        } else {
            font_client.find_fallback_font(default_font, character)
        };

        match current.as_mut() {
            Some(run)
                if run.font_id == font_id
                    && run.is_italic_required == is_italic_required
                    && run.is_bold_required == is_bold_required =>
            {
                run.character_run.number_of_characters += 1;
            }
            _ => {
                new_runs.extend(current.take());
                current = Some(FontRun {
                    character_run: CharacterRun::new(index, 1),
                    font_id,
                    is_italic_required,
                    is_bold_required,
                });
            }
        }

        if is_new_paragraph(character) {
            new_runs.extend(current.take());
        }
    }
    new_runs.extend(current);

    insert_character_runs(fonts, new_runs, start_index, number_of_characters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::logical::validate_coverage;
    use crate::testing::{MockFontClient, RTL_FONT, utf32};

    fn scripts_of(text: &str) -> Vec<ScriptRun> {
        let text = utf32(text);
        let mut scripts = Vec::new();
        set_scripts(&text, 0, text.len(), &mut scripts);
        scripts
    }

    fn summary(runs: &[ScriptRun]) -> Vec<(usize, usize, Script)> {
        runs.iter()
            .map(|run| (run.character_run.character_index, run.character_run.number_of_characters, run.script))
            .collect()
    }

    #[test]
    fn single_script_text_is_one_run() {
        assert_eq!(summary(&scripts_of("Hello world")), [(0, 11, Script::Latin)]);
    }

    #[test]
    fn leading_common_characters_take_the_first_script() {
        assert_eq!(summary(&scripts_of("  αβγ")), [(0, 5, Script::Greek)]);
    }

    #[test]
    fn runs_end_after_paragraph_separators() {
        let runs = scripts_of("abc\ndef");
        assert_eq!(summary(&runs), [(0, 4, Script::Latin), (4, 3, Script::Latin)]);
        let runs = scripts_of("123\n");
        assert_eq!(summary(&runs), [(0, 4, Script::Latin)]);
    }

    #[test]
    fn spaces_between_scripts_follow_the_paragraph_direction() {
        let runs = scripts_of("abc אבג");
        assert_eq!(summary(&runs), [(0, 4, Script::Latin), (4, 3, Script::Hebrew)]);
        assert!(runs[1].is_right_to_left);
        assert!(!runs[0].is_right_to_left);

        let runs = scripts_of("אבג abc");
        assert_eq!(summary(&runs), [(0, 4, Script::Hebrew), (4, 3, Script::Latin)]);
    }

    #[test]
    fn partial_scripts_equal_a_full_rebuild() {
        let text = utf32("abc\nαβγ\nxyz");
        let mut full = Vec::new();
        set_scripts(&text, 0, text.len(), &mut full);

        let mut partial = full.clone();
        crate::model::runs::erase_character_runs(4, 7, &mut partial);
        set_scripts(&text, 4, 4, &mut partial);
        assert_eq!(partial, full);
        validate_coverage("script", &partial, text.len()).unwrap();
    }

    #[test]
    fn fonts_fall_back_for_unsupported_characters() {
        let text = utf32("ab שלום\ncd");
        let scripts = scripts_of("ab שלום\ncd");
        let mut fonts = Vec::new();
        let mut client = MockFontClient;
        validate_fonts(&mut client, &text, &scripts, &[], 1, 0, text.len(), &mut fonts);

        let summary: Vec<_> = fonts
            .iter()
            .map(|run| (run.character_run.character_index, run.character_run.number_of_characters, run.font_id))
            .collect();
        assert_eq!(summary, [(0, 3, 1), (3, 5, RTL_FONT), (8, 2, 1)]);
        validate_coverage("font", &fonts, text.len()).unwrap();
    }

    #[test]
    fn descriptions_select_fonts_and_styles() {
        let text = utf32("abcd");
        let scripts = scripts_of("abcd");
        let descriptions = [FontDescriptionRun {
            character_run: CharacterRun::new(1, 2),
            font_id: 3,
            is_italic_required: true,
            is_bold_required: false,
        }];
        let mut fonts = Vec::new();
        validate_fonts(&mut MockFontClient, &text, &scripts, &descriptions, 1, 0, 4, &mut fonts);

        assert_eq!(fonts.len(), 3);
        assert_eq!(fonts[1].font_id, 3);
        assert!(fonts[1].is_italic_required);
        assert_eq!(fonts[1].character_run, CharacterRun::new(1, 2));
    }
}

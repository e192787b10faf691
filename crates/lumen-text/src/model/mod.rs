//! Logical and visual text models plus the shared run types.
//!
//! The logical model owns the UTF-32 characters and every per-character
//! annotation. The visual model owns the glyph tables produced from them.

pub mod logical;
pub mod runs;
pub mod visual;

pub use logical::LogicalModel;
pub use runs::{
    BidirectionalLineInfoRun, BidirectionalParagraphInfoRun, CharacterRun, ColorRun,
    FontDescriptionRun, FontRun, GlyphRun, HasCharacterRun, HasGlyphRun, LineRun, ParagraphRun,
    ScriptRun, StrikethroughGlyphRun, UnderlinedGlyphRun, clear_character_runs, clear_glyph_runs,
};
pub use visual::{HorizontalAlignment, UnderlineStyleProperties, UnderlineType, VerticalAlignment, VisualModel};

pub use unicode_script::Script;

/// A single UTF-32 code point.
pub type Character = u32;
pub type CharacterIndex = usize;
pub type GlyphIndex = usize;
pub type LineIndex = usize;
pub type Length = usize;
/// Font identifier handed out by the font registry. Zero is never a valid font.
pub type FontId = u32;
/// Index into a color palette. Zero selects the default color.
pub type ColorIndex = u16;
/// `true` for right-to-left characters.
pub type CharacterDirection = bool;

/// Line breaking opportunity after a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreakInfo {
    #[default]
    NoBreak,
    AllowBreak,
    MustBreak,
}

/// Word boundary after a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordBreakInfo {
    #[default]
    NoBreak,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Straight (non premultiplied) RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A glyph produced by shaping, with the metrics filled in later by the font client.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphInfo {
    pub font_id: FontId,
    /// Glyph index within the font.
    pub index: u32,
    pub width: f32,
    pub height: f32,
    pub x_bearing: f32,
    pub y_bearing: f32,
    pub advance: f32,
    pub scale_factor: f32,
    pub is_italic_required: bool,
    pub is_bold_required: bool,
}

/// Whether `character` ends a paragraph.
pub fn is_new_paragraph(character: Character) -> bool {
    matches!(character, 0x0A | 0x0B | 0x0C | 0x0D | 0x85 | 0x2028 | 0x2029)
}

/// Whether `character` is a white space (paragraph separators included).
pub fn is_white_space(character: Character) -> bool {
    matches!(character, 0x09 | 0x20 | 0xA0 | 0x1680 | 0x2000..=0x200A | 0x202F | 0x205F | 0x3000)
        || is_new_paragraph(character)
}

/// Convert a code point to `char`, substituting U+FFFD for values outside
/// the Unicode scalar range.
pub fn to_char(character: Character) -> char {
    char::from_u32(character).unwrap_or(char::REPLACEMENT_CHARACTER)
}

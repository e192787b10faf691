//! Bidirectional (BiDi) text support built on `unicode-bidi`.
//!
//! - paragraph info and per-character directions (UAX-9)
//! - mirroring of paired characters in right-to-left runs
//! - per-line visual reordering

pub mod mirror;
pub mod paragraph;
pub mod reorder;

pub use mirror::{get_mirrored_text, mirrored_character};
pub use paragraph::{LayoutDirection, get_characters_direction, set_bidirectional_info};
pub use reorder::reorder_line;

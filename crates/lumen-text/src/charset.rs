//! UTF-8 ⇄ UTF-32 conversion.
//!
//! The decoder follows the legacy (pre RFC 3629) UTF-8 layout and accepts
//! 5 and 6 byte sequences. Carriage returns are normalized while decoding:
//! a bare CR and a CR+LF pair both become a single LF. Bytes that cannot
//! start a sequence decode to a space (U+0020), one per byte.

use crate::model::Character;

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;
const FALLBACK: Character = 0x20;

/// Length of a UTF-8 sequence keyed by its lead byte. Zero marks bytes that
/// never start a sequence.
///
/// Continuation bytes (0x80-0xBF) are deliberately listed as single-byte
/// leads and 0xC0/0xC1 stay in the two byte bucket.
const UTF8_LENGTH: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        table[byte] = match byte {
            0x00..=0xBF => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            0xF8..=0xFB => 5,
            0xFC..=0xFD => 6,
            _ => 0,
        };
        byte += 1;
    }
    table
};

/// Payload mask applied to the lead byte, indexed by sequence length.
const LEAD_MASK: [u8; 7] = [0x00, 0xFF, 0x1F, 0x0F, 0x07, 0x03, 0x01];

/// Number of bytes of the sequence started by `lead_byte` (0 if invalid).
pub fn utf8_length(lead_byte: u8) -> u8 {
    UTF8_LENGTH[lead_byte as usize]
}

/// Number of code points [`utf8_to_utf32`] produces for `utf8`.
///
/// Only lead bytes are counted; the continuation bytes they announce are
/// skipped without being validated.
pub fn number_of_utf8_characters(utf8: &[u8]) -> usize {
    let mut count = 0;
    let mut index = 0;
    while index < utf8.len() {
        index += step(utf8, index);
        count += 1;
    }
    count
}

/// Number of bytes needed to encode `utf32` with [`utf32_to_utf8`].
pub fn number_of_utf8_bytes(utf32: &[Character]) -> usize {
    utf32.iter().map(|&code| encoded_length(code)).sum()
}

/// Decode `utf8` into `utf32`, returning the number of code points written.
///
/// Decoding stops early once `utf32` is full, so the output is never
/// written out of bounds. Size it with [`number_of_utf8_characters`].
pub fn utf8_to_utf32(utf8: &[u8], utf32: &mut [Character]) -> usize {
    let mut written = 0;
    let mut index = 0;
    while index < utf8.len() && written < utf32.len() {
        let (code, consumed) = decode_one(utf8, index);
        utf32[written] = code;
        written += 1;
        index += consumed;
    }
    written
}

/// Convenience wrapper around [`utf8_to_utf32`] allocating the output.
pub fn utf8_to_utf32_vec(utf8: &[u8]) -> Vec<Character> {
    let mut utf32 = vec![0; number_of_utf8_characters(utf8)];
    let written = utf8_to_utf32(utf8, &mut utf32);
    utf32.truncate(written);
    utf32
}

/// Encode `utf32` into `utf8`, returning the number of bytes written.
///
/// `utf8` must hold at least [`number_of_utf8_bytes`] bytes; encoding stops
/// at the last code point that fits entirely.
pub fn utf32_to_utf8(utf32: &[Character], utf8: &mut [u8]) -> usize {
    let mut written = 0;
    let mut scratch = [0u8; 6];
    for &code in utf32 {
        let length = encode_one(code, &mut scratch);
        if written + length > utf8.len() {
            break;
        }
        utf8[written..written + length].copy_from_slice(&scratch[..length]);
        written += length;
    }
    written
}

/// Encode `utf32` and append it to `text`.
///
/// Code points a Rust `String` cannot hold (surrogates, anything above
/// U+10FFFF) are appended as U+FFFD.
pub fn utf32_to_utf8_string(utf32: &[Character], text: &mut String) {
    let mut buffer = vec![0u8; number_of_utf8_bytes(utf32)];
    let written = utf32_to_utf8(utf32, &mut buffer);
    buffer.truncate(written);
    match String::from_utf8(buffer) {
        Ok(valid) => text.push_str(&valid),
        Err(err) => text.push_str(&String::from_utf8_lossy(err.as_bytes())),
    }
}

/// Bytes consumed by the sequence starting at `index`.
fn step(utf8: &[u8], index: usize) -> usize {
    let lead = utf8[index];
    match UTF8_LENGTH[lead as usize] {
        0 => 1,
        1 if lead == CR && utf8.get(index + 1) == Some(&LF) => 2,
        length => {
            let length = length as usize;
            if index + length > utf8.len() { 1 } else { length }
        }
    }
}

fn decode_one(utf8: &[u8], index: usize) -> (Character, usize) {
    let lead = utf8[index];
    let length = UTF8_LENGTH[lead as usize] as usize;
    match length {
        0 => (FALLBACK, 1),
        1 if lead == CR => (LF as Character, step(utf8, index)),
        1 => (lead as Character, 1),
        // Truncated sequence at the end of the buffer.
        _ if index + length > utf8.len() => (FALLBACK, 1),
        _ => {
            let mut code = (lead & LEAD_MASK[length]) as Character;
            for &byte in &utf8[index + 1..index + length] {
                code = (code << 6) | (byte & 0x3F) as Character;
            }
            (code, length)
        }
    }
}

fn encoded_length(code: Character) -> usize {
    match code {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        _ => 6,
    }
}

fn encode_one(code: Character, out: &mut [u8; 6]) -> usize {
    let length = encoded_length(code);
    if length == 1 {
        out[0] = code as u8;
        return 1;
    }
    let lead_marker: u8 = match length {
        2 => 0xC0,
        3 => 0xE0,
        4 => 0xF0,
        5 => 0xF8,
        _ => 0xFC,
    };
    let mut remaining = code;
    for slot in out[1..length].iter_mut().rev() {
        *slot = 0x80 | (remaining & 0x3F) as u8;
        remaining >>= 6;
    }
    out[0] = lead_marker | (remaining as u8 & LEAD_MASK[length]);
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARABIC: &str = "مرحبا بالعالم";
    const DEVANAGARI: &str = "हैलो वर्ल्ड";
    const EMOJI: &str = "\u{1F601} \u{1F602} \u{1F603} \u{1F604}";

    const ARABIC_UTF32: [Character; 13] = [
        0x645, 0x631, 0x62D, 0x628, 0x627, 0x20, 0x628, 0x627, 0x644, 0x639, 0x627, 0x644, 0x645,
    ];
    const DEVANAGARI_UTF32: [Character; 11] = [
        0x939, 0x948, 0x932, 0x94B, 0x20, 0x935, 0x930, 0x94D, 0x932, 0x94D, 0x921,
    ];
    const EMOJI_UTF32: [Character; 7] = [0x1F601, 0x20, 0x1F602, 0x20, 0x1F603, 0x20, 0x1F604];

    #[test]
    fn length_table_matches_every_lead_byte() {
        for byte in 0u16..=255 {
            let expected = match byte {
                0x00..=0xBF => 1,
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                0xF8..=0xFB => 5,
                0xFC..=0xFD => 6,
                _ => 0,
            };
            assert_eq!(utf8_length(byte as u8), expected, "lead byte {byte:#04x}");
        }
    }

    #[test]
    fn counts_characters_across_scripts() {
        assert_eq!(number_of_utf8_characters(b"Hello World"), 11);
        assert_eq!(number_of_utf8_characters(ARABIC.as_bytes()), 13);
        assert_eq!(number_of_utf8_characters(DEVANAGARI.as_bytes()), 11);
        assert_eq!(number_of_utf8_characters(EMOJI.as_bytes()), 7);
        assert_eq!(number_of_utf8_characters(&[0xF8, 0xA0, 0x80, 0x80, 0x80]), 1);
        assert_eq!(number_of_utf8_characters(&[0xFC, 0x84, 0x80, 0x80, 0x80, 0x80]), 1);
    }

    #[test]
    fn counts_bytes_across_scripts() {
        let hello: Vec<Character> = "Hello World".chars().map(|c| c as Character).collect();
        assert_eq!(number_of_utf8_bytes(&hello), 11);
        assert_eq!(number_of_utf8_bytes(&ARABIC_UTF32), 25);
        assert_eq!(number_of_utf8_bytes(&DEVANAGARI_UTF32), 31);
        assert_eq!(number_of_utf8_bytes(&EMOJI_UTF32), 19);
        assert_eq!(number_of_utf8_bytes(&[0x80_0000]), 5);
        assert_eq!(number_of_utf8_bytes(&[0x400_0000]), 6);
    }

    #[test]
    fn decodes_scripts_to_expected_code_points() {
        assert_eq!(utf8_to_utf32_vec(ARABIC.as_bytes()), ARABIC_UTF32);
        assert_eq!(utf8_to_utf32_vec(DEVANAGARI.as_bytes()), DEVANAGARI_UTF32);
        assert_eq!(utf8_to_utf32_vec(EMOJI.as_bytes()), EMOJI_UTF32);
    }

    #[test]
    fn carriage_returns_collapse_to_line_feeds() {
        let decoded = utf8_to_utf32_vec(b"\r Hello\r\n World");
        assert_eq!(
            decoded,
            [0xA, 0x20, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0xA, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64]
        );
        assert_eq!(number_of_utf8_characters(b"\r Hello\r\n World"), decoded.len());
    }

    #[test]
    fn invalid_lead_bytes_decode_to_spaces() {
        assert_eq!(utf8_to_utf32_vec(&[0xFE, 0xFF]), [0x20, 0x20]);
    }

    #[test]
    fn decodes_legacy_five_and_six_byte_sequences() {
        assert_eq!(utf8_to_utf32_vec(&[0xF8, 0xA0, 0x80, 0x80, 0x80]), [0x80_0000]);
        assert_eq!(utf8_to_utf32_vec(&[0xFC, 0x84, 0x80, 0x80, 0x80, 0x80]), [0x400_0000]);
    }

    #[test]
    fn truncated_sequence_never_reads_past_the_end() {
        // Three byte lead with a single continuation byte.
        let decoded = utf8_to_utf32_vec(&[b'a', 0xE0, 0xA4]);
        assert_eq!(decoded.len(), number_of_utf8_characters(&[b'a', 0xE0, 0xA4]));
        assert_eq!(decoded[0], 'a' as Character);
        assert_eq!(decoded[1], 0x20);
    }

    #[test]
    fn output_buffer_bounds_are_respected() {
        let mut small = [0; 3];
        assert_eq!(utf8_to_utf32(b"Hello", &mut small), 3);
        assert_eq!(small, [0x48, 0x65, 0x6C]);

        let mut bytes = [0u8; 4];
        // Second code point needs three more bytes than remain.
        assert_eq!(utf32_to_utf8(&[0x41, 0x939], &mut bytes), 1);
    }

    #[test]
    fn encoding_round_trips_all_lengths() {
        for text in ["Hello World", ARABIC, DEVANAGARI, EMOJI] {
            let utf32 = utf8_to_utf32_vec(text.as_bytes());
            let mut encoded = String::new();
            utf32_to_utf8_string(&utf32, &mut encoded);
            assert_eq!(encoded, text);
        }

        let legacy: [Character; 2] = [0x80_0000, 0x400_0000];
        let mut bytes = vec![0u8; number_of_utf8_bytes(&legacy)];
        assert_eq!(utf32_to_utf8(&legacy, &mut bytes), 11);
        assert_eq!(&bytes[..5], &[0xF8, 0xA0, 0x80, 0x80, 0x80]);
        assert_eq!(&bytes[5..], &[0xFC, 0x84, 0x80, 0x80, 0x80, 0x80]);
        assert_eq!(utf8_to_utf32_vec(&bytes), legacy);
    }
}

//! Metafile string decoding
//!
//! WMF text records store 8-bit strings in the code page of the selected
//! font's charset. ANSI (WinAnsiEncoding / Windows-1252) covers the vast
//! majority of files; it is a superset of ISO 8859-1 with extra characters in
//! 0x80-0x9F.

/// SYMBOL_CHARSET
const SYMBOL_CHARSET: u8 = 2;

/// Decode metafile bytes as text for a font with the given charset.
///
/// Symbol fonts map into the U+F000 private-use block, the way Windows
/// exposes them to Unicode consumers. Every other charset is read as
/// Windows-1252.
pub fn decode_ansi(bytes: &[u8], charset: u8) -> String {
    if charset == SYMBOL_CHARSET {
        return bytes
            .iter()
            .map(|&b| char::from_u32(0xF000 + b as u32).unwrap_or('?'))
            .collect();
    }
    bytes.iter().map(|&b| winansi_to_char(b)).collect()
}

/// Map a WinAnsiEncoding byte to its Unicode character
pub fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        // Latin-1 for everything else, including the undefined 0x81/0x8D/0x8F/0x90/0x9D
        other => other as char,
    }
}

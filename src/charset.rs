// Copyright (c) 2026 rezky_nightky

use unicode_width::UnicodeWidthChar;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(u32);

impl Charset {
    pub const ENGLISH_LETTERS: Charset = Charset(0x1);
    pub const ENGLISH_DIGITS: Charset = Charset(0x2);
    pub const ENGLISH_PUNCTUATION: Charset = Charset(0x4);
    pub const KATAKANA: Charset = Charset(0x8);
    pub const BINARY: Charset = Charset(0x10);
    pub const HEX: Charset = Charset(0x20);

    pub const ASCII_SAFE: Charset = Charset(0x3);
    pub const MATRIX: Charset = Charset(0xA);

    pub fn contains(self, other: Charset) -> bool {
        (self.0 & other.0) != 0
    }
}

/// Whether the locale suggests the terminal can't show half-width katakana.
pub fn default_to_ascii() -> bool {
    let lang = std::env::var("LC_ALL")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var("LANG").ok())
        .unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

pub fn charset_from_str(name: &str, default_to_ascii: bool) -> Result<Charset, String> {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "auto" => Ok(if default_to_ascii {
            Charset::ASCII_SAFE
        } else {
            Charset::MATRIX
        }),
        "matrix" => Ok(Charset::MATRIX),
        "katakana" => Ok(Charset::KATAKANA),
        "digits" | "dec" | "decimal" => Ok(Charset::ENGLISH_DIGITS),
        "bin" | "binary" | "01" => Ok(Charset::BINARY),
        "hex" | "hexadecimal" => Ok(Charset::HEX),
        "ascii" => Ok(Charset(
            Charset::ENGLISH_LETTERS.0 | Charset::ENGLISH_DIGITS.0 | Charset::ENGLISH_PUNCTUATION.0,
        )),
        _ => Err(format!(
            "invalid charset: {} (allowed: auto, matrix, katakana, digits, binary, hex, ascii)",
            name
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

/// Glyphs from `s` that occupy exactly one terminal cell. Control
/// characters and wide (CJK, emoji) glyphs are dropped.
pub fn narrow_glyphs(s: &str) -> Vec<char> {
    s.chars()
        .filter(|&c| !c.is_control() && UnicodeWidthChar::width(c) == Some(1))
        .collect()
}

/// Expands a charset into the glyph table the renderer samples from.
/// A non-empty `custom` string replaces the preset entirely.
pub fn build_chars(charset: Charset, custom: Option<&str>) -> Vec<char> {
    if let Some(s) = custom {
        let out = narrow_glyphs(s);
        if !out.is_empty() {
            return out;
        }
    }

    let mut out: Vec<char> = Vec::new();

    if charset.contains(Charset::KATAKANA) {
        // ｦ..ｯ then ｱ..ﾝ; the prolonged sound mark ｰ is left out.
        push_range(&mut out, 0xFF66, 0xFF6F);
        push_range(&mut out, 0xFF71, 0xFF9D);
    }
    if charset.contains(Charset::BINARY) {
        push_range(&mut out, 0x30, 0x31);
    }
    if charset.contains(Charset::HEX) {
        push_range(&mut out, 0x30, 0x39);
        push_range(&mut out, 0x41, 0x46);
    }
    if charset.contains(Charset::ENGLISH_LETTERS) {
        push_range(&mut out, 0x41, 0x5A);
        push_range(&mut out, 0x61, 0x7A);
    }
    if charset.contains(Charset::ENGLISH_DIGITS) {
        push_range(&mut out, 0x30, 0x39);
    }
    if charset.contains(Charset::ENGLISH_PUNCTUATION) {
        push_range(&mut out, 0x21, 0x2F);
        push_range(&mut out, 0x3A, 0x40);
        push_range(&mut out, 0x5B, 0x60);
        push_range(&mut out, 0x7B, 0x7E);
    }

    if out.is_empty() {
        out.push('0');
        out.push('1');
    }

    out
}

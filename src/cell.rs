// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Intensity {
    #[default]
    Normal,
    Bold,
    Dim,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub intensity: Intensity,
}

impl Cell {
    pub fn blank() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            intensity: Intensity::Normal,
        }
    }

    pub fn glyph(ch: char, fg: Option<Color>, intensity: Intensity) -> Self {
        Self {
            ch,
            fg,
            bg: None,
            intensity,
        }
    }
}

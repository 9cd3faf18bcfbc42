// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

/// Resolved colors for the three rain styles. `None` leaves the terminal's
/// default foreground in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub trail: Option<Color>,
    pub head: Option<Color>,
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        r,
        g,
        b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = match gray_idx {
        16 => (0, 0, 0),
        231 => (255, 255, 255),
        _ => {
            let v = 8 + 10 * (gray_idx - 232);
            (v, v, v)
        }
    };

    if dist2(r, g, b, gr, gg, gb) < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn convert(mode: ColorMode, (r, g, b): (u8, u8, u8)) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
    }
}

pub fn build_palette(scheme: ColorScheme, mode: ColorMode) -> Palette {
    let (trail, head) = match scheme {
        ColorScheme::Green => ((0, 255, 0), (255, 255, 255)),
        ColorScheme::Amber => ((255, 176, 0), (255, 240, 200)),
        ColorScheme::Cyan => ((0, 255, 255), (255, 255, 255)),
        ColorScheme::Red => ((255, 0, 0), (255, 215, 215)),
        ColorScheme::Purple => ((175, 95, 255), (255, 215, 255)),
        ColorScheme::Gray => ((192, 192, 192), (255, 255, 255)),
    };
    Palette {
        trail: convert(mode, trail),
        head: convert(mode, head),
    }
}

pub fn parse_color_scheme(s: &str) -> Result<ColorScheme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "green" => Ok(ColorScheme::Green),
        "amber" | "orange" => Ok(ColorScheme::Amber),
        "cyan" => Ok(ColorScheme::Cyan),
        "red" => Ok(ColorScheme::Red),
        "purple" => Ok(ColorScheme::Purple),
        "gray" | "grey" => Ok(ColorScheme::Gray),
        _ => Err(format!(
            "invalid color: {} (allowed: green, amber, cyan, red, purple, gray)",
            s
        )),
    }
}

fn detect_color_mode_from(colorterm: &str, term: &str) -> ColorMode {
    let colorterm = colorterm.to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = term.to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color16
}

pub fn detect_color_mode_auto() -> ColorMode {
    detect_color_mode_from(
        &std::env::var("COLORTERM").unwrap_or_default(),
        &std::env::var("TERM").unwrap_or_default(),
    )
}

pub fn color_mode_from_bits(bits: u16) -> Result<ColorMode, String> {
    match bits {
        0 => Ok(ColorMode::Mono),
        16 => Ok(ColorMode::Color16),
        8 | 256 => Ok(ColorMode::Color256),
        24 | 32 => Ok(ColorMode::TrueColor),
        _ => Err(format!(
            "invalid --colormode: {} (allowed: 0,16,256,24)",
            bits
        )),
    }
}

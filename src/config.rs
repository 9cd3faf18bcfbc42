// Copyright (c) 2026 rezky_nightky

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::styling::{AnsiColor, Color, Effects, Style};
use clap::builder::Styles;
use clap::{CommandFactory, FromArgMatches, Parser};

use crate::charset::{build_chars, charset_from_str, default_to_ascii, narrow_glyphs};
use crate::column::RainParams;
use crate::palette::{
    build_palette, color_mode_from_bits, detect_color_mode_auto, parse_color_scheme, Palette,
};
use crate::runtime::ColorMode;

pub const MIN_FPS: i64 = 10;
pub const MAX_FPS: i64 = 240;

const RUNTIME_KEYS: &str = "\
RUNTIME KEYS:
  q, Esc, Ctrl+C   Quit
  p, P             Pause / resume";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn clap_styles() -> Styles {
    if !color_enabled_stdout() {
        return Styles::plain();
    }
    Styles::styled()
        .header(
            Style::new()
                .effects(Effects::BOLD)
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .usage(
            Style::new()
                .effects(Effects::BOLD)
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "katarain",
    version,
    about = "Katakana digital rain for the terminal",
    args_override_self = true
)]
pub struct Args {
    #[arg(
        long = "speed",
        value_name = "F",
        default_value_t = 1.0,
        allow_negative_numbers = true,
        help_heading = "RAIN",
        help = "Fall speed multiplier"
    )]
    pub speed: f64,

    #[arg(
        long = "density",
        value_name = "F",
        default_value_t = 0.25,
        allow_negative_numbers = true,
        help_heading = "RAIN",
        help = "Fraction of columns raining (clamped to 0..1)"
    )]
    pub density: f64,

    #[arg(
        long = "fps",
        value_name = "N",
        default_value_t = 60,
        allow_negative_numbers = true,
        help_heading = "RAIN",
        help = "Target frames per second (clamped to 10..240)"
    )]
    pub fps: i64,

    #[arg(
        long = "seed",
        value_name = "N",
        help_heading = "RAIN",
        help = "Seed the random generator for a repeatable rain"
    )]
    pub seed: Option<u64>,

    #[arg(long = "bold", help_heading = "APPEARANCE", help = "Draw heads in bold")]
    pub bold: bool,

    #[arg(
        long = "no-fade",
        help_heading = "APPEARANCE",
        help = "Clear each frame instead of overlaying a dim fade"
    )]
    pub no_fade: bool,

    #[arg(
        long = "color",
        value_name = "NAME",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme: green, amber, cyan, red, purple, gray"
    )]
    pub color: String,

    #[arg(
        long = "colormode",
        value_name = "BITS",
        help_heading = "APPEARANCE",
        help = "Force color depth (0, 16, 256, 24). Default: detected from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "charset",
        value_name = "NAME",
        default_value = "auto",
        help_heading = "CHARSET",
        help = "Glyph preset: auto, matrix, katakana, digits, binary, hex, ascii"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        value_name = "STRING",
        help_heading = "CHARSET",
        help = "Literal glyphs to rain instead of a preset"
    )]
    pub chars: Option<String>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "DIAGNOSTICS",
        help = "Write logs to PATH (filter with RUST_LOG)"
    )]
    pub log_file: Option<PathBuf>,
}

pub fn command() -> clap::Command {
    Args::command()
        .styles(clap_styles())
        .after_help(RUNTIME_KEYS)
}

/// Parses the full argv, program name included.
pub fn parse_args<I, T>(argv: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(argv)?;
    Args::from_arg_matches(&matches)
}

/// Everything the rain needs, with out-of-range inputs already clamped.
#[derive(Clone, Debug)]
pub struct Settings {
    pub params: RainParams,
    pub fps: u32,
    pub bold: bool,
    pub fade: bool,
    pub seed: Option<u64>,
    pub chars: Vec<char>,
    pub color_mode: ColorMode,
    pub palette: Palette,
    pub log_file: Option<PathBuf>,
}

pub fn clamp_density(d: f64) -> f64 {
    if d.is_nan() {
        0.0
    } else {
        d.clamp(0.0, 1.0)
    }
}

pub fn clamp_fps(fps: i64) -> u32 {
    fps.clamp(MIN_FPS, MAX_FPS) as u32
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, String> {
        Self::resolve(args, default_to_ascii(), detect_color_mode_auto)
    }

    fn resolve(
        args: &Args,
        default_to_ascii: bool,
        auto_color: impl FnOnce() -> ColorMode,
    ) -> Result<Self, String> {
        let color_mode = match args.colormode {
            Some(bits) => color_mode_from_bits(bits)?,
            None => auto_color(),
        };
        let scheme = parse_color_scheme(&args.color)?;
        let charset = charset_from_str(&args.charset, default_to_ascii)?;
        if let Some(custom) = args.chars.as_deref() {
            if narrow_glyphs(custom).is_empty() {
                return Err("--chars: expected at least one single-width glyph".to_string());
            }
        }

        Ok(Self {
            params: RainParams {
                speed_mul: args.speed,
                density: clamp_density(args.density),
            },
            fps: clamp_fps(args.fps),
            bold: args.bold,
            fade: !args.no_fade,
            seed: args.seed,
            chars: build_chars(charset, args.chars.as_deref()),
            color_mode,
            palette: build_palette(scheme, color_mode),
            log_file: args.log_file.clone(),
        })
    }

    /// Fixed sleep between frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

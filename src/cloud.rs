// Copyright (c) 2026 rezky_nightky

use std::collections::TryReserveError;

use rand::{rngs::StdRng, Rng};
use tracing::debug;

use crate::{
    cell::{Cell, Intensity},
    column::{Column, RainParams, Tick},
    frame::Frame,
    palette::Palette,
};

/// Trail rows this close to the far end are drawn dim.
const TAIL_DIM_ROWS: i32 = 2;

/// Columns that (re)started during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnStats {
    pub respawned: usize,
    pub woke: usize,
}

/// Borrowed view of everything the glyph pass needs besides the RNG.
pub struct DrawCtx<'a> {
    pub palette: &'a Palette,
    pub chars: &'a [char],
    pub bold_heads: bool,
}

impl DrawCtx<'_> {
    fn pick_char(&self, rng: &mut StdRng) -> char {
        if self.chars.is_empty() {
            return '0';
        }
        self.chars[rng.random_range(0..self.chars.len())]
    }

    /// Cell written over the whole screen before glyphs in fade mode.
    pub fn fade_cell(&self) -> Cell {
        Cell::glyph(' ', self.palette.trail, Intensity::Dim)
    }

    pub fn head_cell(&self, ch: char) -> Cell {
        let intensity = if self.bold_heads {
            Intensity::Bold
        } else {
            Intensity::Normal
        };
        Cell::glyph(ch, self.palette.head, intensity)
    }

    /// `dist` counts rows up from the head.
    pub fn trail_cell(&self, ch: char, dist: i32, trail_length: i32) -> Cell {
        let intensity = if dist > trail_length - TAIL_DIM_ROWS {
            Intensity::Dim
        } else {
            Intensity::Normal
        };
        Cell::glyph(ch, self.palette.trail, intensity)
    }

    pub fn draw_column(&self, frame: &mut Frame, x: u16, column: &Column, rng: &mut StdRng) {
        if !column.active || x >= frame.width {
            return;
        }
        let head = column.head_row;
        let top = head.saturating_sub(column.trail_length).max(0);
        let bottom = head.min(i32::from(frame.height) - 1);

        for y in top..=bottom {
            let ch = self.pick_char(rng);
            let cell = if y == head {
                self.head_cell(ch)
            } else {
                self.trail_cell(ch, head - y, column.trail_length)
            };
            frame.put(i32::from(x), y, cell);
        }
    }
}

/// The whole rain field: one column per terminal column plus the shared
/// parameters and RNG that drive them.
pub struct Cloud {
    pub width: u16,
    pub height: u16,

    pub params: RainParams,
    pub palette: Palette,
    pub bold_heads: bool,
    pub fade: bool,
    pub paused: bool,

    columns: Vec<Column>,
    chars: Vec<char>,
    mt: StdRng,
}

impl Cloud {
    pub fn new(params: RainParams, palette: Palette, chars: Vec<char>, mt: StdRng) -> Self {
        Self {
            width: 0,
            height: 0,
            params,
            palette,
            bold_heads: false,
            fade: true,
            paused: false,
            columns: Vec::new(),
            chars,
            mt,
        }
    }

    pub fn active_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.active).count()
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        debug!(paused = self.paused, "pause toggled");
    }

    /// Sizes the column array for a `width` x `height` grid. Columns that
    /// exist in both geometries keep their state; new ones are rolled fresh.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<(), TryReserveError> {
        let mut next: Vec<Column> = Vec::new();
        next.try_reserve_exact(width as usize)?;

        let kept = self.columns.len().min(width as usize);
        next.extend_from_slice(&self.columns[..kept]);
        while next.len() < width as usize {
            next.push(Column::spawn(&mut self.mt, &self.params, height));
        }

        debug!(
            old_width = self.width,
            old_height = self.height,
            width,
            height,
            kept,
            "rain grid resized"
        );
        self.columns = next;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Column Simulator: one tick for every column.
    pub fn advance(&mut self) -> SpawnStats {
        let mut stats = SpawnStats::default();
        for c in &mut self.columns {
            match c.advance(&mut self.mt, &self.params, self.height) {
                Tick::Respawned => stats.respawned += 1,
                Tick::Woke => stats.woke += 1,
                Tick::Idle | Tick::Fell => {}
            }
        }
        if stats != SpawnStats::default() {
            debug!(
                respawned = stats.respawned,
                woke = stats.woke,
                active = self.active_columns(),
                "columns spawned"
            );
        }
        stats
    }

    /// Renderer: background pass, then every active column.
    pub fn draw(&mut self, frame: &mut Frame) {
        let ctx = DrawCtx {
            palette: &self.palette,
            chars: &self.chars,
            bold_heads: self.bold_heads,
        };

        if self.fade {
            frame.fill(ctx.fade_cell());
        } else {
            frame.fill(Cell::blank());
        }

        for (x, column) in self.columns.iter().enumerate() {
            let Ok(x) = u16::try_from(x) else {
                break;
            };
            ctx.draw_column(frame, x, column, &mut self.mt);
        }
    }

    /// Advances and draws one frame unless paused.
    pub fn rain(&mut self, frame: &mut Frame) {
        if self.paused {
            return;
        }
        self.advance();
        self.draw(frame);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::style::Color;
    use rand::SeedableRng;

    use super::*;
    use crate::column::{BASE_SPEED, TRAIL_LENGTH};

    fn palette() -> Palette {
        Palette {
            trail: Some(Color::Green),
            head: Some(Color::White),
        }
    }

    fn make_cloud(density: f64, width: u16, height: u16) -> Cloud {
        let params = RainParams {
            speed_mul: 1.0,
            density,
        };
        let mut cloud = Cloud::new(
            params,
            palette(),
            vec!['a', 'b', 'c'],
            StdRng::seed_from_u64(0x1234567),
        );
        cloud.resize(width, height).unwrap();
        cloud
    }

    fn lit_rows(frame: &Frame, x: u16) -> Vec<u16> {
        (0..frame.height)
            .filter(|&y| frame.get(x, y).is_some_and(|c| c.ch != ' '))
            .collect()
    }

    #[test]
    fn initial_columns_respect_spawn_bounds() {
        let cloud = make_cloud(0.5, 200, 40);
        assert_eq!(cloud.columns.len(), 200);
        for c in &cloud.columns {
            assert!(TRAIL_LENGTH.contains(&c.trail_length));
            assert!(BASE_SPEED.contains(&c.fall_speed));
            assert!(c.head_row <= 0);
        }
    }

    #[test]
    fn zero_density_keeps_the_screen_empty() {
        let mut cloud = make_cloud(0.0, 80, 24);
        let mut frame = Frame::new(80, 24);
        assert_eq!(cloud.active_columns(), 0);

        for _ in 0..2_000 {
            cloud.rain(&mut frame);
        }
        assert_eq!(cloud.active_columns(), 0);
        for x in 0..80 {
            assert!(lit_rows(&frame, x).is_empty());
        }
    }

    #[test]
    fn full_density_starts_every_column() {
        let cloud = make_cloud(1.0, 120, 30);
        assert_eq!(cloud.active_columns(), 120);
    }

    #[test]
    fn resize_round_trip_preserves_overlap() {
        let mut cloud = make_cloud(0.5, 80, 24);
        let mut frame = Frame::new(80, 24);
        for _ in 0..50 {
            cloud.rain(&mut frame);
        }
        let before: Vec<Column> = cloud.columns.clone();

        cloud.resize(60, 24).unwrap();
        assert_eq!(&cloud.columns[..], &before[..60]);

        cloud.resize(80, 30).unwrap();
        assert_eq!(cloud.width, 80);
        assert_eq!(cloud.height, 30);
        assert_eq!(&cloud.columns[..60], &before[..60]);
        for c in &cloud.columns[60..] {
            assert!(TRAIL_LENGTH.contains(&c.trail_length));
            assert!(BASE_SPEED.contains(&c.fall_speed));
            assert!(c.head_row <= 0 && c.head_row > -30);
        }
    }

    #[test]
    fn resize_to_zero_width_empties_the_grid() {
        let mut cloud = make_cloud(1.0, 10, 10);
        cloud.resize(0, 10).unwrap();
        assert!(cloud.columns.is_empty());

        let mut frame = Frame::new(0, 10);
        cloud.rain(&mut frame);
    }

    #[test]
    fn paused_cloud_neither_moves_nor_draws() {
        let mut cloud = make_cloud(1.0, 40, 20);
        let mut frame = Frame::new(40, 20);
        cloud.rain(&mut frame);
        frame.clear_dirty();

        cloud.toggle_pause();
        let frozen: Vec<Column> = cloud.columns.clone();
        for _ in 0..100 {
            cloud.rain(&mut frame);
        }
        assert_eq!(&cloud.columns[..], &frozen[..]);
        assert!(!frame.has_changes());

        cloud.toggle_pause();
        assert!(!cloud.paused);
        for _ in 0..100 {
            cloud.rain(&mut frame);
        }
        assert_ne!(&cloud.columns[..], &frozen[..]);
    }

    #[test]
    fn advance_counts_respawns_and_wakes() {
        let mut cloud = make_cloud(0.0, 2, 10);
        cloud.params.density = 1.0;
        cloud.columns = vec![
            Column {
                head_row: 20,
                trail_length: 5,
                fall_speed: 1.0,
                active: true,
            },
            Column {
                head_row: 3,
                trail_length: 5,
                fall_speed: 1.0,
                active: true,
            },
        ];
        let stats = cloud.advance();
        assert_eq!(stats.respawned, 1);
        assert_eq!(stats.woke, 0);

        let mut cloud = make_cloud(0.0, 50, 10);
        let quiet = (0..1_000).map(|_| cloud.advance()).all(|s| s == SpawnStats::default());
        assert!(quiet);
    }

    #[test]
    fn glyph_pass_clips_to_the_visible_rows() {
        let mut cloud = make_cloud(0.0, 3, 10);
        cloud.columns = vec![
            Column {
                head_row: 3,
                trail_length: 5,
                fall_speed: 1.0,
                active: true,
            },
            Column {
                head_row: 12,
                trail_length: 5,
                fall_speed: 1.0,
                active: true,
            },
            Column {
                head_row: -1,
                trail_length: 20,
                fall_speed: 1.0,
                active: true,
            },
        ];
        let mut frame = Frame::new(3, 10);
        cloud.draw(&mut frame);

        assert_eq!(lit_rows(&frame, 0), vec![0, 1, 2, 3]);
        assert_eq!(lit_rows(&frame, 1), vec![7, 8, 9]);
        assert!(lit_rows(&frame, 2).is_empty());
    }

    #[test]
    fn columns_past_the_frame_edge_are_skipped() {
        let mut cloud = make_cloud(1.0, 10, 5);
        let mut frame = Frame::new(4, 5);
        cloud.draw(&mut frame);
        assert_eq!(frame.width, 4);
        assert_eq!(frame.get(4, 0), None);
    }

    #[test]
    fn head_and_trail_styling() {
        let mut cloud = make_cloud(0.0, 1, 20);
        cloud.bold_heads = true;
        cloud.columns = vec![Column {
            head_row: 10,
            trail_length: 5,
            fall_speed: 1.0,
            active: true,
        }];
        let mut frame = Frame::new(1, 20);
        cloud.draw(&mut frame);

        let head = frame.get(0, 10).unwrap();
        assert_eq!(head.fg, Some(Color::White));
        assert_eq!(head.intensity, Intensity::Bold);

        for y in [7, 8, 9] {
            let c = frame.get(0, y).unwrap();
            assert_eq!(c.fg, Some(Color::Green));
            assert_eq!(c.intensity, Intensity::Normal);
        }
        for y in [5, 6] {
            assert_eq!(frame.get(0, y).unwrap().intensity, Intensity::Dim);
        }

        cloud.bold_heads = false;
        cloud.draw(&mut frame);
        assert_eq!(frame.get(0, 10).unwrap().intensity, Intensity::Normal);
    }

    #[test]
    fn fade_mode_overlays_dim_blanks_and_no_fade_clears() {
        let mut cloud = make_cloud(0.0, 4, 4);
        let mut frame = Frame::new(4, 4);

        cloud.draw(&mut frame);
        let c = frame.get(2, 2).unwrap();
        assert_eq!(c.ch, ' ');
        assert_eq!(c.intensity, Intensity::Dim);
        assert_eq!(c.fg, Some(Color::Green));

        cloud.fade = false;
        cloud.draw(&mut frame);
        assert_eq!(frame.get(2, 2), Some(&Cell::blank()));
    }

    #[test]
    fn glyphs_come_from_the_charset() {
        let mut cloud = make_cloud(1.0, 30, 30);
        let mut frame = Frame::new(30, 30);
        for _ in 0..60 {
            cloud.rain(&mut frame);
        }
        for y in 0..30 {
            for x in 0..30 {
                let ch = frame.get(x, y).unwrap().ch;
                assert!(matches!(ch, ' ' | 'a' | 'b' | 'c'));
            }
        }
    }
}

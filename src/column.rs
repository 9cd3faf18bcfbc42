// Copyright (c) 2026 rezky_nightky

use std::ops::Range;

use rand::Rng;

pub const TRAIL_LENGTH: Range<i32> = 5..25;
pub const BASE_SPEED: Range<f64> = 0.4..1.6;

/// Knobs shared by every column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainParams {
    /// Multiplies every freshly rolled fall speed.
    pub speed_mul: f64,
    /// Chance a column is raining at (re)spawn, in [0, 1].
    pub density: f64,
}

impl RainParams {
    /// Per-frame chance an idle column starts raining again.
    pub fn trickle_chance(&self) -> f64 {
        self.density / 200.0
    }
}

/// What one tick did to a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Fell,
    Respawned,
    Woke,
}

/// Rain state of one terminal column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub head_row: i32,
    pub trail_length: i32,
    pub fall_speed: f64,
    pub active: bool,
}

impl Column {
    pub fn spawn<R: Rng>(rng: &mut R, params: &RainParams, height: u16) -> Self {
        let mut c = Self {
            head_row: 0,
            trail_length: TRAIL_LENGTH.start,
            fall_speed: BASE_SPEED.start,
            active: false,
        };
        c.respawn(rng, params, height);
        c
    }

    /// Re-rolls everything, the active flag included.
    pub fn respawn<R: Rng>(&mut self, rng: &mut R, params: &RainParams, height: u16) {
        self.active = rng.random::<f64>() < params.density;
        self.restart(rng, params, height);
    }

    /// Places a new stream somewhere above the top edge.
    pub fn restart<R: Rng>(&mut self, rng: &mut R, params: &RainParams, height: u16) {
        self.head_row = -rng.random_range(0..i32::from(height.max(1)));
        self.trail_length = rng.random_range(TRAIL_LENGTH);
        self.fall_speed = rng.random_range(BASE_SPEED) * params.speed_mul;
    }

    /// Rows the head moves this frame. Speeds under one row per frame move
    /// a whole row with probability equal to the speed.
    pub fn step<R: Rng>(&self, rng: &mut R) -> i32 {
        if self.fall_speed < 1.0 {
            i32::from(rng.random::<f64>() < self.fall_speed)
        } else {
            // `as` saturates, so huge multipliers stay finite.
            self.fall_speed.floor() as i32
        }
    }

    /// True once the last lit trail row is below the bottom edge.
    pub fn is_spent(&self, height: u16) -> bool {
        self.head_row.saturating_sub(self.trail_length) > i32::from(height)
    }

    /// One simulation tick for this column.
    pub fn advance<R: Rng>(&mut self, rng: &mut R, params: &RainParams, height: u16) -> Tick {
        if self.active {
            self.head_row = self.head_row.saturating_add(self.step(rng));
            if self.is_spent(height) {
                self.respawn(rng, params, height);
                return Tick::Respawned;
            }
            Tick::Fell
        } else if rng.random::<f64>() < params.trickle_chance() {
            self.active = true;
            self.restart(rng, params, height);
            Tick::Woke
        } else {
            Tick::Idle
        }
    }
}

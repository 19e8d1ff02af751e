//! Wave progression and the spawn director
//!
//! Enemy kind selection is a weighted discrete distribution keyed by wave
//! number (wave mode) or elapsed seconds (endless mode). Each bracket is a
//! static table row; one deterministic sampling routine draws from the run
//! RNG so a fixed seed reproduces the exact spawn sequence.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::consts::*;
use crate::vec_from_angle;

use EnemyKind::*;

/// Wave-mode brackets: rows apply up to and including `max_wave`
const WAVE_BRACKETS: &[(u32, &[(EnemyKind, u32)])] = &[
    (2, &[(Basic, 80), (Swarm, 20)]),
    (4, &[(Basic, 55), (Fast, 30), (Swarm, 15)]),
    (
        7,
        &[
            (Basic, 25),
            (Fast, 25),
            (Tank, 15),
            (Swarm, 15),
            (Sniper, 8),
            (Ranger, 7),
            (Lancer, 5),
        ],
    ),
    (
        12,
        &[
            (Basic, 15),
            (Fast, 20),
            (Tank, 15),
            (Sniper, 10),
            (Ghost, 10),
            (Swarm, 8),
            (Ranger, 8),
            (Mortar, 5),
            (Lancer, 5),
            (Healer, 4),
        ],
    ),
    (
        u32::MAX,
        &[
            (Basic, 6),
            (Fast, 9),
            (Tank, 10),
            (Sniper, 7),
            (Ghost, 7),
            (Bruiser, 9),
            (Leech, 5),
            (Bomber, 5),
            (Sentinel, 5),
            (Boss, 7),
            (Ranger, 5),
            (Mortar, 4),
            (Shielder, 7),
            (Lancer, 5),
            (Healer, 4),
            (Buffer, 5),
        ],
    ),
];

/// Endless-mode brackets: rows apply below `max_secs` of survival time
const ENDLESS_BRACKETS: &[(u32, &[(EnemyKind, u32)])] = &[
    (60, &[(Basic, 100)]),
    (120, &[(Basic, 55), (Fast, 30), (Swarm, 15)]),
    (
        180,
        &[
            (Basic, 25),
            (Fast, 25),
            (Tank, 15),
            (Swarm, 15),
            (Sniper, 8),
            (Ranger, 7),
            (Lancer, 5),
        ],
    ),
    (
        300,
        &[
            (Basic, 20),
            (Fast, 22),
            (Tank, 18),
            (Swarm, 12),
            (Sniper, 10),
            (Ghost, 8),
            (Ranger, 6),
            (Healer, 4),
        ],
    ),
    (
        480,
        &[
            (Basic, 12),
            (Fast, 18),
            (Tank, 18),
            (Swarm, 12),
            (Sniper, 10),
            (Ghost, 10),
            (Bruiser, 10),
            (Lancer, 6),
            (Buffer, 4),
        ],
    ),
    (
        u32::MAX,
        &[
            (Basic, 6),
            (Fast, 9),
            (Tank, 10),
            (Sniper, 7),
            (Ghost, 7),
            (Bruiser, 9),
            (Leech, 5),
            (Bomber, 5),
            (Sentinel, 5),
            (Boss, 6),
            (Ranger, 5),
            (Mortar, 4),
            (Shielder, 6),
            (Lancer, 5),
            (Healer, 4),
            (Buffer, 7),
        ],
    ),
];

/// Pick the bracket row for the current progression point
fn bracket(endless: bool, wave: u32, time_survived: f32) -> &'static [(EnemyKind, u32)] {
    if endless {
        let secs = time_survived.max(0.0) as u32;
        ENDLESS_BRACKETS
            .iter()
            .find(|(max_secs, _)| secs < *max_secs)
            .map(|(_, row)| *row)
            .unwrap_or(ENDLESS_BRACKETS[ENDLESS_BRACKETS.len() - 1].1)
    } else {
        WAVE_BRACKETS
            .iter()
            .find(|(max_wave, _)| wave <= *max_wave)
            .map(|(_, row)| *row)
            .unwrap_or(WAVE_BRACKETS[WAVE_BRACKETS.len() - 1].1)
    }
}

/// Weighted draw over a bracket row, preserving table order. `exclude` filters
/// kinds out of the pool (miniboss injection never promotes fast or swarm).
pub fn pick_enemy_kind<R: Rng>(
    rng: &mut R,
    endless: bool,
    wave: u32,
    time_survived: f32,
    exclude: &[EnemyKind],
) -> EnemyKind {
    let row = bracket(endless, wave, time_survived);
    let total: u32 = row
        .iter()
        .filter(|(kind, _)| !exclude.contains(kind))
        .map(|(_, w)| *w)
        .sum();
    if total == 0 {
        // Everything excluded; fall back to the row head so a spawn still
        // happens rather than stalling the wave quota
        return row[0].0;
    }

    let mut roll = rng.random_range(0..total);
    for (kind, weight) in row {
        if exclude.contains(kind) {
            continue;
        }
        if roll < *weight {
            return *kind;
        }
        roll -= *weight;
    }
    row[row.len() - 1].0
}

/// Off-screen spawn point on a ring around the player
pub fn spawn_position<R: Rng>(rng: &mut R, player_pos: Vec2) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let distance = rng.random_range(SPAWN_DIST_MIN..SPAWN_DIST_MAX);
    player_pos + vec_from_angle(angle) * distance
}

/// Wave/endless progression state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveSystem {
    /// 1-based wave counter
    pub current_wave: u32,
    pub enemies_in_wave: u32,
    pub enemies_spawned: u32,
    pub wave_active: bool,
    /// Seconds of break remaining between waves
    pub wave_break_time: f32,
    /// Fixed per run at construction
    pub break_duration: f32,
    pub endless_mode: bool,
}

impl WaveSystem {
    pub fn new(break_duration: f32, endless_mode: bool) -> Self {
        Self {
            current_wave: 1,
            enemies_in_wave: 0,
            enemies_spawned: 0,
            // Endless mode is active from the first tick
            wave_active: endless_mode,
            wave_break_time: 0.0,
            break_duration,
            endless_mode,
        }
    }

    /// Activate the current wave and reset its spawn quota
    pub fn start_wave(&mut self) {
        self.wave_active = true;
        if !self.endless_mode {
            self.enemies_in_wave = WAVE_BASE_ENEMIES + self.current_wave * WAVE_ENEMIES_PER_WAVE;
            self.enemies_spawned = 0;
        }
    }

    pub fn should_spawn_enemy(&self) -> bool {
        if self.endless_mode {
            return true;
        }
        self.wave_active && self.enemies_spawned < self.enemies_in_wave
    }

    pub fn enemy_spawned(&mut self) {
        if !self.endless_mode {
            self.enemies_spawned += 1;
        }
    }

    /// Stat multiplier for newly spawned enemies. Endless mode scales with
    /// survival time (one effective wave per minute) on a gentler slope.
    pub fn difficulty(&self, time_survived: f32) -> f32 {
        if self.endless_mode {
            let effective_wave = 1.0 + (time_survived.max(0.0) / ENDLESS_WAVE_SECS).floor();
            1.0 + (effective_wave - 1.0) * ENDLESS_DIFFICULTY_STEP
        } else {
            1.0 + (self.current_wave.saturating_sub(1)) as f32 * WAVE_DIFFICULTY_STEP
        }
    }

    /// Quota fully spawned and the field cleared: close the wave, start the
    /// break and advance the counter. No-op in endless mode.
    pub fn wave_complete(&mut self) {
        if self.endless_mode {
            return;
        }
        self.wave_active = false;
        self.wave_break_time = self.break_duration;
        self.current_wave += 1;
    }

    /// Count down the inter-wave break; returns true on the tick it elapses
    pub fn update_break(&mut self, dt: f32) -> bool {
        if self.wave_break_time > 0.0 {
            self.wave_break_time -= dt;
            if self.wave_break_time <= 0.0 {
                self.wave_break_time = 0.0;
                return true;
            }
        }
        false
    }

    /// True on waves that inject a miniboss (wave mode, every 5th wave)
    pub fn miniboss_wave(&self) -> bool {
        !self.endless_mode
            && self.current_wave > 0
            && self.current_wave.is_multiple_of(MINIBOSS_WAVE_PERIOD)
    }
}

//! Cyber Survivor - combat simulation core for a top-down survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, waves, collisions, damage)
//! - `perks`: Level-up perk catalog, stacking rules and application
//! - `abilities`: Active ability cooldowns and effects
//! - `achievements`: Achievement predicates and progress reporting
//! - `profile`: Persistent player records (modules, currency, lifetime stats)
//!
//! The crate owns no rendering, input polling, audio or file I/O. A host
//! calls [`sim::tick`] once per frame with the player's intent and reads the
//! updated state back for display; sound cues, unlocks and terminal
//! transitions are reported through the event queue on [`sim::RunState`].

pub mod abilities;
pub mod achievements;
pub mod perks;
pub mod profile;
pub mod sim;

pub use abilities::AbilityKind;
pub use achievements::AchievementId;
pub use perks::PerkId;
pub use profile::{Modules, Profile, RunConfig, SkinId};
pub use sim::{GameEvent, RunState, TickInput};

use glam::Vec2;

/// Game tuning constants
pub mod consts {
    /// Reference step rate the tuning values assume. Per-step speeds
    /// (player, enemies, bullets) are expressed in pixels per 1/60 s step and
    /// scaled by `dt * BASE_STEP_HZ` so any frame rate integrates the same.
    pub const BASE_STEP_HZ: f32 = 60.0;

    /// Player collision radius
    pub const PLAYER_SIZE: f32 = 30.0;
    /// Invulnerability window after taking a hit (ms)
    pub const PLAYER_HIT_INVULN_MS: f32 = 500.0;
    /// Impulse velocity damping applied every scaled step
    pub const VELOCITY_DAMPING: f32 = 0.85;

    /// Dash defaults (perks scale these per player)
    pub const DASH_COOLDOWN_MS: f32 = 2000.0;
    pub const DASH_INVULN_MS: f32 = 200.0;
    pub const DASH_SPEED: f32 = 20.0;
    /// Contact damage dealt while dash-striking (dash_boost ability)
    pub const DASH_STRIKE_DAMAGE: f32 = 30.0;

    /// Bullet hit radius is `enemy.size + bullet.size * BULLET_HIT_SCALE`
    pub const BULLET_HIT_SCALE: f32 = 4.0;
    /// Sideways spacing between parallel multishot bullets (px)
    pub const MULTISHOT_SPACING: f32 = 14.0;

    /// Chain lightning search radius around the struck enemy
    pub const CHAIN_RADIUS: f32 = 300.0;
    /// Chain damage as a fraction of the triggering bullet's damage
    pub const CHAIN_DAMAGE_FACTOR: f32 = 0.6;
    /// Lifetime of the chain mark on a secondary target (ms)
    pub const CHAIN_MARK_MS: f32 = 500.0;

    /// Explosive bullet blast radius around the struck enemy
    pub const EXPLOSION_RADIUS: f32 = 90.0;
    pub const EXPLOSION_DAMAGE_FACTOR: f32 = 0.6;
    pub const EXPLOSION_MIN_DAMAGE: f32 = 6.0;

    /// Orbital projectile ring radius around the player
    pub const ORBITAL_RADIUS: f32 = 55.0;
    /// Minimum gap between orbital hits on the same enemy (ms)
    pub const ORBITAL_HIT_INTERVAL_MS: f64 = 400.0;
    pub const ORBITAL_DAMAGE_FACTOR: f32 = 0.5;
    pub const ORBITAL_MIN_DAMAGE: f32 = 5.0;
    /// Hit test slack added to the enemy radius for orbit points
    pub const ORBITAL_HIT_SLACK: f32 = 10.0;

    /// Exp gem magnetism
    pub const GEM_MAGNET_RADIUS: f32 = 100.0;
    pub const GEM_CONSUME_RADIUS: f32 = 20.0;
    /// Base experience per gem, before the player's exp multiplier
    pub const GEM_EXP: f32 = 10.0;
    /// `exp_to_next` growth per level
    pub const EXP_CURVE_GROWTH: f32 = 1.2;

    /// Base delay between spawns; divided by the difficulty multiplier
    pub const SPAWN_INTERVAL_MS: f32 = 1000.0;
    /// Spawn ring around the player (always off-screen)
    pub const SPAWN_DIST_MIN: f32 = 800.0;
    pub const SPAWN_DIST_MAX: f32 = 1200.0;

    /// Wave quota: `10 + 5 * wave`
    pub const WAVE_BASE_ENEMIES: u32 = 10;
    pub const WAVE_ENEMIES_PER_WAVE: u32 = 5;
    /// Difficulty slope per wave (wave mode)
    pub const WAVE_DIFFICULTY_STEP: f32 = 0.15;
    /// Difficulty slope per effective wave (endless mode, gentler)
    pub const ENDLESS_DIFFICULTY_STEP: f32 = 0.08;
    /// Endless mode converts a minute survived into one effective wave
    pub const ENDLESS_WAVE_SECS: f32 = 60.0;

    /// A miniboss is injected on every Nth wave's first spawn
    pub const MINIBOSS_WAVE_PERIOD: u32 = 5;
    pub const MINIBOSS_HP_MULT: f32 = 5.0;
    pub const MINIBOSS_DMG_MULT: f32 = 2.5;
    pub const MINIBOSS_SIZE_MULT: f32 = 1.8;
    pub const MINIBOSS_EXP_MULT: f32 = 5.0;
    pub const MINIBOSS_SPEED_MULT: f32 = 0.8;
    pub const MINIBOSS_MIN_SPEED: f32 = 1.5;
    pub const MINIBOSS_ARMOR_BONUS: f32 = 0.15;

    /// Ally shield pool granted by shielder auras never exceeds this
    pub const SHIELD_BUFF_CAP: f32 = 100.0;
    /// Speed/damage multiplier while a buffer aura is active
    pub const BUFF_MULT: f32 = 1.4;

    /// Mortar shells detonate at their recorded target on lifetime expiry
    pub const MORTAR_BLAST_RADIUS: f32 = 120.0;

    /// Chance of an enemy-death sound cue
    pub const DEATH_CUE_CHANCE: f64 = 0.3;
    /// Seconds between achievement evaluation passes
    pub const ACHIEVEMENT_CHECK_SECS: f32 = 3.0;
}

/// Scale factor converting per-step speeds into this tick's displacement
#[inline]
pub fn frame_scale(dt: f32) -> f32 {
    dt * consts::BASE_STEP_HZ
}

/// Unit vector for an angle in radians
#[inline]
pub fn vec_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Normalize, treating zero-length vectors as "no direction"
#[inline]
pub fn dir_or_zero(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

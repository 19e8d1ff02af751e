//! Deterministic combat simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied `dt`, no wall clock
//! - Seeded RNG only; one stream per run
//! - Fixed subsystem order within a tick
//! - No rendering, audio or platform dependencies (cues leave as events)

pub mod combat;
pub mod enemy;
pub mod player;
pub mod projectile;
pub mod spawn;
pub mod state;
pub mod tick;

pub use enemy::{
    AuraEmitter, AuraKind, Berserk, Enemy, EnemyKind, Faction, PhaseCycle, RangedAttack,
    StatusEffects,
};
pub use player::Player;
pub use projectile::{Bullet, EnemyProjectile, EnemyShotKind, ExpGem};
pub use spawn::WaveSystem;
pub use state::{GameEvent, RunPhase, RunState, RunSummary, SoundCue, TickInput};
pub use tick::tick;

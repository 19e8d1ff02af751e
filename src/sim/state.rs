//! Run state: entity stores, phase machine, outbound events
//!
//! Everything a single play session mutates lives here. The host constructs
//! a `RunState` from the persistent profile, calls [`super::tick`] once per
//! frame and reads the stores back for rendering; sound cues, unlocks and
//! the terminal transition arrive through the drained event queue.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::enemy::Enemy;
use super::player::Player;
use super::projectile::{Bullet, EnemyProjectile, ExpGem};
use super::spawn::WaveSystem;
use crate::abilities::{AbilityKind, AbilityState};
use crate::achievements::{self, RunSnapshot};
use crate::consts::*;
use crate::perks::PerkId;
use crate::profile::{Profile, RunConfig, SkinId};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Active gameplay (including inter-wave breaks)
    Playing,
    /// Waiting for the player to pick one of the offered perks
    LevelUp,
    /// Run ended; the state is frozen for the final read-back
    GameOver,
}

/// Player intent for a single tick, captured by the host's input layer
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Raw movement vector (not necessarily normalized)
    pub move_dir: Vec2,
    /// World-space aim direction from the player (zero means no valid aim)
    pub aim: Vec2,
    /// Fire request (held trigger or latched auto-fire)
    pub fire: bool,
    /// Dash request
    pub dash: bool,
    /// Ability activation key edge
    pub ability: bool,
    /// Perk selection while the run is in the LevelUp phase
    pub perk_choice: Option<usize>,
}

/// Audio cues for the host's sound collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    EnemyHit,
    EnemyDeath,
    PlayerHit,
    LevelUp,
    Dash,
    Explosion,
    Powerup,
}

/// Final counters handed to the persistence collaborator at game over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub kills: u32,
    pub time_survived_secs: u32,
    pub score: u64,
    pub level: u32,
    pub wave: u32,
    pub currency_earned: u64,
}

/// Outbound notifications, drained by the host once per frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    LevelUp { level: u32 },
    WaveStarted { wave: u32 },
    WaveCompleted { wave: u32 },
    MinibossSpawned { wave: u32 },
    AchievementUnlocked { id: crate::AchievementId, reward: u32 },
    GameOver(RunSummary),
}

/// Complete state of one play session
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,

    /// Simulation clock in milliseconds (sum of all accepted `dt`s)
    pub time_ms: f64,
    /// Seconds survived
    pub time_survived: f32,
    pub phase: RunPhase,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub enemy_shots: Vec<EnemyProjectile>,
    pub gems: Vec<ExpGem>,

    pub waves: WaveSystem,
    pub score: u64,
    pub kills: u32,
    pub dash_count: u32,
    /// True until the player takes damage during the current wave
    pub no_damage_wave: bool,

    pub ability: AbilityState,
    /// The three perks offered at the pending level-up
    pub perk_offer: Vec<PerkId>,

    pub profile: Profile,

    pub(crate) last_spawn_ms: f64,
    pub(crate) miniboss_spawned_this_wave: bool,
    /// Last orbital hit per enemy id, for the 400 ms rate limit
    pub(crate) orbital_hits: HashMap<u32, f64>,
    pub(crate) achievement_timer: f32,

    events: Vec<GameEvent>,
    next_id: u32,
}

impl RunState {
    /// Start a run from the persistent profile. String ids from the save
    /// (skin, selected ability) are parsed here; unknown values degrade to
    /// defaults rather than failing.
    pub fn new(profile: Profile, config: RunConfig, seed: u64) -> Self {
        let skin = SkinId::from_id(&profile.skin);
        let player = Player::new(&profile.modules, skin);

        // The equipped ability must also be owned
        let selected = AbilityKind::from_id(&profile.active_ability)
            .filter(|kind| profile.owned_abilities.iter().any(|id| id == kind.id()));

        let mut waves = WaveSystem::new(config.wave_break_secs, config.endless);
        waves.start_wave();
        log::info!(
            "run started: seed={seed}, mode={}, wave quota={}",
            if config.endless { "endless" } else { "waves" },
            waves.enemies_in_wave
        );

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ms: 0.0,
            time_survived: 0.0,
            phase: RunPhase::Playing,
            player,
            enemies: Vec::new(),
            bullets: Vec::new(),
            enemy_shots: Vec::new(),
            gems: Vec::new(),
            waves,
            score: 0,
            kills: 0,
            dash_count: 0,
            no_damage_wave: true,
            ability: AbilityState::new(selected),
            perk_offer: Vec::new(),
            profile,
            last_spawn_ms: f64::MIN,
            miniboss_spawned_this_wave: false,
            orbital_hits: HashMap::new(),
            achievement_timer: 0.0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a stable entity id
    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand the accumulated events to the host, emptying the queue
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Kill bookkeeping shared by every damage source: drop a gem at the
    /// corpse, bump counters, occasionally cue the death sound.
    pub(crate) fn credit_kill(&mut self, enemy: &Enemy) {
        self.gems.push(ExpGem { pos: enemy.pos });
        self.kills += 1;
        self.score += u64::from(enemy.exp_value);
        self.orbital_hits.remove(&enemy.id);
        if self.rng.random_bool(DEATH_CUE_CHANCE) {
            self.push_event(GameEvent::Sound(SoundCue::EnemyDeath));
        }
    }

    /// Drop dead enemies from the store, crediting each kill. Secondary
    /// passes run against the swept store so nothing targets a corpse.
    pub(crate) fn sweep_dead_enemies(&mut self) {
        if self.enemies.iter().all(Enemy::alive) {
            return;
        }
        let mut survivors = Vec::with_capacity(self.enemies.len());
        for enemy in std::mem::take(&mut self.enemies) {
            if enemy.alive() {
                survivors.push(enemy);
            } else {
                self.credit_kill(&enemy);
            }
        }
        self.enemies = survivors;
    }

    /// Read-only counters for achievement evaluation
    pub fn snapshot(&self) -> RunSnapshot {
        let p = &self.player;
        RunSnapshot {
            kills: self.kills,
            time_survived: self.time_survived,
            waves_cleared: self.waves.current_wave.saturating_sub(1),
            level: p.level,
            score: self.score,
            currency: self.profile.currency,
            modules_invested: self.profile.modules.total_invested(),
            games_played: self.profile.stats.games_played,
            max_hp: p.max_hp,
            max_shield: p.max_shield,
            dmg: p.dmg,
            crit_chance: p.crit_chance,
            lifesteal: p.lifesteal,
            multishot: p.multishot,
            speed_stacks: p.stacks(PerkId::Speed) + 2 * p.stacks(PerkId::SpeedBig),
            dash_count: self.dash_count,
            no_damage_wave: self.no_damage_wave,
            has_poison: p.poison_bullets,
            has_chain: p.chain_lightning > 0,
            has_orbital: p.orbital_bullets > 0,
            has_freeze: p.freeze_bullets,
            has_explosion: p.explosive_bullets,
            has_reflect: p.reflect_damage > 0.0,
        }
    }

    /// Evaluate achievements against the current snapshot, emitting an event
    /// per fresh unlock
    pub(crate) fn run_achievement_pass(&mut self) {
        let snapshot = self.snapshot();
        let unlocked = achievements::evaluate(&snapshot, &mut self.profile);
        for (id, reward) in unlocked {
            log::info!("achievement unlocked: {id:?} (+{reward})");
            self.push_event(GameEvent::AchievementUnlocked { id, reward });
        }
    }

    /// Terminal transition: freeze the phase, fold the run into the profile,
    /// run one final achievement pass and publish the summary.
    pub(crate) fn game_over(&mut self) {
        if self.phase == RunPhase::GameOver {
            return;
        }
        self.phase = RunPhase::GameOver;
        self.player.hp = self.player.hp.max(0.0);

        let count_stats = !self.waves.endless_mode;
        let earned = self.profile.record_run(
            self.kills,
            self.time_survived as u32,
            self.score,
            self.player.level,
            self.waves.current_wave,
            self.player.gold_multiplier,
            count_stats,
        );
        self.run_achievement_pass();

        let summary = RunSummary {
            kills: self.kills,
            time_survived_secs: self.time_survived as u32,
            score: self.score,
            level: self.player.level,
            wave: self.waves.current_wave,
            currency_earned: earned,
        };
        log::info!(
            "game over: wave {}, {} kills, score {}, +{} currency",
            summary.wave,
            summary.kills,
            summary.score,
            summary.currency_earned
        );
        self.push_event(GameEvent::GameOver(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;

    fn state() -> RunState {
        RunState::new(Profile::default(), RunConfig::default(), 42)
    }

    #[test]
    fn test_sweep_credits_kills_and_drops_gems() {
        let mut st = state();
        let id = st.next_entity_id();
        let mut enemy = Enemy::new(id, Vec2::new(50.0, 0.0), EnemyKind::Basic, 1.0);
        enemy.hp = -1.0;
        st.enemies.push(enemy);
        let live_id = st.next_entity_id();
        st.enemies
            .push(Enemy::new(live_id, Vec2::ZERO, EnemyKind::Basic, 1.0));

        st.sweep_dead_enemies();
        assert_eq!(st.enemies.len(), 1);
        assert_eq!(st.kills, 1);
        assert_eq!(st.score, 10);
        assert_eq!(st.gems.len(), 1);
        assert_eq!(st.gems[0].pos, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_game_over_is_terminal_and_pays_once() {
        let mut st = state();
        st.kills = 5;
        st.player.level = 2;
        st.game_over();
        let balance = st.profile.currency;
        assert_eq!(st.phase, RunPhase::GameOver);

        st.game_over();
        assert_eq!(st.profile.currency, balance);
    }

    #[test]
    fn test_game_over_emits_summary_event() {
        let mut st = state();
        st.score = 123;
        st.game_over();
        let events = st.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver(RunSummary { score: 123, .. })))
        );
        // Queue drains
        assert!(st.drain_events().is_empty());
    }

    #[test]
    fn test_unowned_ability_is_not_equipped() {
        let mut profile = Profile::default();
        profile.active_ability = "nuke".into();
        let st = RunState::new(profile, RunConfig::default(), 1);
        assert_eq!(st.ability.selected, None);

        let mut profile = Profile::default();
        profile.active_ability = "nuke".into();
        profile.owned_abilities = vec!["nuke".into()];
        let st = RunState::new(profile, RunConfig::default(), 1);
        assert_eq!(st.ability.selected, Some(AbilityKind::Nuke));
    }

    #[test]
    fn test_snapshot_reflects_run_counters() {
        let mut st = state();
        st.kills = 7;
        st.waves.current_wave = 4;
        st.player.multishot = 3;
        let snap = st.snapshot();
        assert_eq!(snap.kills, 7);
        assert_eq!(snap.waves_cleared, 3);
        assert_eq!(snap.multishot, 3);
    }
}

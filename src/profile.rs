//! Persistent player records
//!
//! Plain data the host save system stores between runs. The core reads the
//! profile when a run starts (modules, skin, selected ability) and writes
//! kill/currency/achievement updates back through it; serializing the records
//! to disk is entirely the host's business.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::achievements::AchievementId;

/// Meta-progression module levels, bought with currency between runs.
/// Read once at player construction to derive starting stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modules {
    pub health: u32,
    pub damage: u32,
    pub speed: u32,
    pub fire_rate: u32,
    pub crit: u32,
}

impl Modules {
    /// Total levels invested across all modules (spender achievements)
    pub fn total_invested(&self) -> u32 {
        self.health + self.damage + self.speed + self.fire_rate + self.crit
    }
}

/// Cosmetic skins with small stat twists, applied at player construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkinId {
    #[default]
    Default,
    /// +10% damage
    Red,
    /// +15% movement speed
    Purple,
    /// +20% max hp
    Gold,
    /// -10% fire interval
    Green,
    /// +10% experience
    Cyan,
    /// +8% armor
    Orange,
    /// +5% to everything
    White,
    /// +20% dash speed
    Pink,
    /// +15% damage, -5% speed
    Dark,
}

impl SkinId {
    /// Parse a save-file skin id; unknown ids fall back to the default skin
    pub fn from_id(id: &str) -> Self {
        match id {
            "red" => SkinId::Red,
            "purple" => SkinId::Purple,
            "gold" => SkinId::Gold,
            "green" => SkinId::Green,
            "cyan" => SkinId::Cyan,
            "orange" => SkinId::Orange,
            "white" => SkinId::White,
            "pink" => SkinId::Pink,
            "dark" => SkinId::Dark,
            _ => SkinId::Default,
        }
    }
}

/// Lifetime statistics accumulated across runs (wave mode only)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub total_kills: u64,
    pub total_playtime_secs: u64,
    pub best_score: u64,
    pub best_time_secs: u64,
    pub max_level: u32,
    pub max_wave: u32,
    pub games_played: u32,
}

/// Per-run settings the host reads from its options screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seconds of breathing room between waves (host clamps to 3-30)
    pub wave_break_secs: f32,
    /// Continuous spawning with time-based difficulty instead of waves
    pub endless: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wave_break_secs: 10.0,
            endless: false,
        }
    }
}

/// Everything about a player that outlives a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub stats: LifetimeStats,
    pub modules: Modules,
    pub currency: u64,
    /// Purchased ability ids (string ids as the save file stores them)
    pub owned_abilities: Vec<String>,
    /// Selected ability id; empty or unknown means none equipped
    pub active_ability: String,
    /// Selected skin id; unknown ids resolve to the default skin
    pub skin: String,
    /// Achievements already unlocked (never re-evaluated, never re-rewarded)
    pub achievements: BTreeSet<AchievementId>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            stats: LifetimeStats::default(),
            modules: Modules::default(),
            currency: 0,
            owned_abilities: Vec::new(),
            active_ability: String::new(),
            skin: "default".to_string(),
            achievements: BTreeSet::new(),
        }
    }
}

impl Profile {
    /// Fold a finished run into the lifetime records and credit currency.
    /// Stats only count in wave mode; currency is always earned. Returns the
    /// currency credited.
    pub fn record_run(
        &mut self,
        kills: u32,
        playtime_secs: u32,
        score: u64,
        level: u32,
        wave: u32,
        gold_multiplier: f32,
        count_stats: bool,
    ) -> u64 {
        if count_stats {
            self.stats.total_kills += u64::from(kills);
            self.stats.total_playtime_secs += u64::from(playtime_secs);
            self.stats.best_score = self.stats.best_score.max(score);
            self.stats.best_time_secs = self.stats.best_time_secs.max(u64::from(playtime_secs));
            self.stats.max_level = self.stats.max_level.max(level);
            self.stats.max_wave = self.stats.max_wave.max(wave);
            self.stats.games_played += 1;
        }

        let base = u64::from(kills) + u64::from(level) * 10 + u64::from(wave) * 20;
        let earned = (base as f32 * gold_multiplier.max(0.0)) as u64;
        self.currency += earned;
        earned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_skin_falls_back_to_default() {
        assert_eq!(SkinId::from_id("neon_tiger"), SkinId::Default);
        assert_eq!(SkinId::from_id("gold"), SkinId::Gold);
    }

    #[test]
    fn test_record_run_wave_mode_counts_stats() {
        let mut profile = Profile::default();
        let earned = profile.record_run(30, 120, 900, 4, 3, 1.0, true);
        // 30 kills + 4*10 level + 3*20 wave
        assert_eq!(earned, 130);
        assert_eq!(profile.currency, 130);
        assert_eq!(profile.stats.games_played, 1);
        assert_eq!(profile.stats.best_score, 900);
        assert_eq!(profile.stats.max_wave, 3);
    }

    #[test]
    fn test_record_run_endless_skips_stats_but_pays() {
        let mut profile = Profile::default();
        let earned = profile.record_run(10, 60, 100, 2, 1, 1.5, false);
        assert_eq!(earned, 75); // (10 + 20 + 20) * 1.5
        assert_eq!(profile.stats.games_played, 0);
        assert_eq!(profile.stats.total_kills, 0);
        assert_eq!(profile.currency, 75);
    }
}

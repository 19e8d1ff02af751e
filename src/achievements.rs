//! Achievement catalog, evaluation and progress reporting
//!
//! A fixed registry of predicates over a read-only run snapshot. Evaluation
//! is side-effect-free except for the one-time unlock write: the first
//! success marks the profile, credits the currency reward and never
//! re-evaluates that id again. Targets are explicit fields on the records,
//! never derived from id strings.

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Stable achievement identity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AchievementId {
    FirstBlood,
    Kills10,
    Kills50,
    Kills100,
    Kills250,
    Kills500,
    Kills1000,
    Kills2000,
    Survive1Min,
    Survive5Min,
    Survive10Min,
    Survive20Min,
    Survive30Min,
    Survive60Min,
    Waves3,
    Waves5,
    Waves10,
    Waves15,
    Waves20,
    Waves30,
    Level5,
    Level10,
    Level20,
    Level30,
    Currency1000,
    Currency5000,
    Currency10000,
    Modules10,
    Modules25,
    Perfectionist,
    SpeedStacks5,
    SpeedStacks10,
    Tank200,
    Tank500,
    GlassCannon,
    Shield200,
    Shield500,
    Dashes25,
    Dashes50,
    Dashes200,
    Multishot3,
    Multishot6,
    PoisonPerk,
    ChainPerk,
    OrbitalPerk,
    FreezePerk,
    ExplosionPerk,
    ReflectPerk,
    Vampire,
    Sharpshooter,
    Games10,
    Games50,
    Games100,
    Score1000,
    Score5000,
    Score20000,
}

/// Everything a predicate may look at, sampled once per evaluation pass.
/// Counters only; no references back into live state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub kills: u32,
    pub time_survived: f32,
    /// Waves fully cleared this run
    pub waves_cleared: u32,
    pub level: u32,
    pub score: u64,
    /// Lifetime currency balance, including this run's unlock rewards
    pub currency: u64,
    pub modules_invested: u32,
    pub games_played: u32,
    pub max_hp: f32,
    pub max_shield: f32,
    pub dmg: f32,
    pub crit_chance: f32,
    pub lifesteal: f32,
    pub multishot: u32,
    pub speed_stacks: u32,
    pub dash_count: u32,
    pub no_damage_wave: bool,
    pub has_poison: bool,
    pub has_chain: bool,
    pub has_orbital: bool,
    pub has_freeze: bool,
    pub has_explosion: bool,
    pub has_reflect: bool,
}

/// Numeric quantity a threshold condition measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Kills,
    SurvivedSecs,
    WavesCleared,
    Level,
    Currency,
    ModulesInvested,
    Score,
    GamesPlayed,
    MaxHp,
    MaxShield,
    SpeedStacks,
    Multishot,
    DashCount,
    Lifesteal,
    CritChance,
}

fn metric_value(snapshot: &RunSnapshot, metric: Metric) -> f32 {
    match metric {
        Metric::Kills => snapshot.kills as f32,
        Metric::SurvivedSecs => snapshot.time_survived,
        Metric::WavesCleared => snapshot.waves_cleared as f32,
        Metric::Level => snapshot.level as f32,
        Metric::Currency => snapshot.currency as f32,
        Metric::ModulesInvested => snapshot.modules_invested as f32,
        Metric::Score => snapshot.score as f32,
        Metric::GamesPlayed => snapshot.games_played as f32,
        Metric::MaxHp => snapshot.max_hp,
        Metric::MaxShield => snapshot.max_shield,
        Metric::SpeedStacks => snapshot.speed_stacks as f32,
        Metric::Multishot => snapshot.multishot as f32,
        Metric::DashCount => snapshot.dash_count as f32,
        Metric::Lifesteal => snapshot.lifesteal,
        Metric::CritChance => snapshot.crit_chance,
    }
}

/// One-shot boolean conditions without a meaningful ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    NoDamageWave,
    PoisonPerk,
    ChainPerk,
    OrbitalPerk,
    FreezePerk,
    ExplosionPerk,
    ReflectPerk,
}

#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// `metric >= target`; progress is `value / target`
    AtLeast { metric: Metric, target: f32 },
    /// 50+ damage while below 100 max hp; progress tracks the damage half
    GlassCannon,
    /// Boolean conditions; progress is 0 or 1
    Has(Flag),
}

/// A catalog row
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: Condition,
    /// Currency credited on unlock
    pub reward: u32,
}

const fn at_least(
    id: AchievementId,
    name: &'static str,
    description: &'static str,
    metric: Metric,
    target: f32,
    reward: u32,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        condition: Condition::AtLeast { metric, target },
        reward,
    }
}

const fn has(
    id: AchievementId,
    name: &'static str,
    description: &'static str,
    flag: Flag,
    reward: u32,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        condition: Condition::Has(flag),
        reward,
    }
}

use AchievementId::*;
use Metric::*;

/// The full achievement catalog
pub static CATALOG: &[AchievementDef] = &[
    // Kills
    at_least(FirstBlood, "First Blood", "Kill your first enemy", Kills, 1.0, 25),
    at_least(Kills10, "Hunter I", "Kill 10 enemies in one run", Kills, 10.0, 30),
    at_least(Kills50, "Hunter II", "Kill 50 enemies in one run", Kills, 50.0, 60),
    at_least(Kills100, "Slayer I", "Kill 100 enemies in one run", Kills, 100.0, 100),
    at_least(Kills250, "Slayer II", "Kill 250 enemies in one run", Kills, 250.0, 175),
    at_least(Kills500, "Serial Slayer", "Kill 500 enemies in one run", Kills, 500.0, 250),
    at_least(Kills1000, "Genocide", "Kill 1000 enemies in one run", Kills, 1000.0, 500),
    at_least(Kills2000, "Exterminator", "Kill 2000 enemies in one run", Kills, 2000.0, 800),
    // Survival
    at_least(Survive1Min, "First Minutes", "Survive for 1 minute", SurvivedSecs, 60.0, 25),
    at_least(Survive5Min, "Seasoned", "Survive for 5 minutes", SurvivedSecs, 300.0, 75),
    at_least(Survive10Min, "Survivor I", "Survive for 10 minutes", SurvivedSecs, 600.0, 100),
    at_least(Survive20Min, "Survivor II", "Survive for 20 minutes", SurvivedSecs, 1200.0, 200),
    at_least(Survive30Min, "Survivor III", "Survive for 30 minutes", SurvivedSecs, 1800.0, 350),
    at_least(Survive60Min, "Survival Master", "Survive for 60 minutes", SurvivedSecs, 3600.0, 700),
    // Waves
    at_least(Waves3, "Recruit", "Clear 3 waves", WavesCleared, 3.0, 50),
    at_least(Waves5, "Wave Warrior I", "Clear 5 waves", WavesCleared, 5.0, 100),
    at_least(Waves10, "Wave Warrior II", "Clear 10 waves", WavesCleared, 10.0, 200),
    at_least(Waves15, "Wave Master I", "Clear 15 waves", WavesCleared, 15.0, 300),
    at_least(Waves20, "Wave Master II", "Clear 20 waves", WavesCleared, 20.0, 500),
    at_least(Waves30, "Wave Legend", "Clear 30 waves", WavesCleared, 30.0, 800),
    // Player level
    at_least(Level5, "Apprentice", "Reach level 5", Level, 5.0, 75),
    at_least(Level10, "Expert I", "Reach level 10", Level, 10.0, 150),
    at_least(Level20, "Expert II", "Reach level 20", Level, 20.0, 300),
    at_least(Level30, "Level Legend", "Reach level 30", Level, 30.0, 500),
    // Economy
    at_least(Currency1000, "Collector I", "Hold 1000 currency", Currency, 1000.0, 200),
    at_least(Currency5000, "Collector II", "Hold 5000 currency", Currency, 5000.0, 400),
    at_least(Currency10000, "Magnate", "Hold 10000 currency", Currency, 10000.0, 700),
    at_least(Modules10, "Big Spender I", "Invest 10+ module levels", ModulesInvested, 10.0, 150),
    at_least(Modules25, "Big Spender II", "Invest 25+ module levels", ModulesInvested, 25.0, 300),
    // Combat styles
    has(Perfectionist, "Perfectionist", "Clear a wave without taking damage", Flag::NoDamageWave, 300),
    at_least(SpeedStacks5, "Speed Demon I", "Stack 5+ speed perks", SpeedStacks, 5.0, 150),
    at_least(SpeedStacks10, "Speed Demon II", "Stack 10+ speed perks", SpeedStacks, 10.0, 250),
    at_least(Tank200, "Tank I", "Reach 200+ max HP", MaxHp, 200.0, 150),
    at_least(Tank500, "Tank II", "Reach 500+ max HP", MaxHp, 500.0, 300),
    AchievementDef {
        id: GlassCannon,
        name: "Glass Cannon",
        description: "50+ damage while below 100 max HP",
        condition: Condition::GlassCannon,
        reward: 250,
    },
    at_least(Shield200, "Shieldbearer I", "Reach 200+ max shield", MaxShield, 200.0, 150),
    at_least(Shield500, "Shieldbearer II", "Reach 500+ max shield", MaxShield, 500.0, 300),
    // Skills
    at_least(Dashes25, "Dash Master I", "Dash 25 times in one run", DashCount, 25.0, 75),
    at_least(Dashes50, "Dash Master II", "Dash 50 times in one run", DashCount, 50.0, 150),
    at_least(Dashes200, "Dash Master III", "Dash 200 times in one run", DashCount, 200.0, 300),
    at_least(Multishot3, "Multigunner I", "Fire 3+ parallel bullets", Multishot, 3.0, 150),
    at_least(Multishot6, "Multigunner II", "Fire 6 parallel bullets", Multishot, 6.0, 300),
    // Special perks
    has(PoisonPerk, "Toxicologist", "Take the poison perk", Flag::PoisonPerk, 100),
    has(ChainPerk, "Thunderlord", "Take the chain lightning perk", Flag::ChainPerk, 100),
    has(OrbitalPerk, "Orbital Operator", "Take the orbital guard perk", Flag::OrbitalPerk, 100),
    has(FreezePerk, "Cryomancer", "Take the freeze perk", Flag::FreezePerk, 100),
    has(ExplosionPerk, "Demolitionist", "Take the explosive rounds perk", Flag::ExplosionPerk, 100),
    has(ReflectPerk, "Mirror", "Take the reflection perk", Flag::ReflectPerk, 100),
    // Specials
    at_least(Vampire, "Vampire", "Reach 50%+ lifesteal", Lifesteal, 0.5, 200),
    at_least(Sharpshooter, "Sharpshooter", "Reach 50%+ crit chance", CritChance, 0.5, 200),
    at_least(Games10, "Veteran I", "Play 10 games", GamesPlayed, 10.0, 100),
    at_least(Games50, "Veteran II", "Play 50 games", GamesPlayed, 50.0, 300),
    at_least(Games100, "Veteran III", "Play 100 games", GamesPlayed, 100.0, 600),
    at_least(Score1000, "Scorekeeper I", "Score 1000 points in one run", Score, 1000.0, 75),
    at_least(Score5000, "Scorekeeper II", "Score 5000 points in one run", Score, 5000.0, 150),
    at_least(Score20000, "Scorekeeper III", "Score 20000 points in one run", Score, 20000.0, 400),
];

pub fn def(id: AchievementId) -> &'static AchievementDef {
    CATALOG
        .iter()
        .find(|d| d.id == id)
        .expect("every AchievementId has a catalog row")
}

fn flag_value(snapshot: &RunSnapshot, flag: Flag) -> bool {
    match flag {
        Flag::NoDamageWave => snapshot.no_damage_wave,
        Flag::PoisonPerk => snapshot.has_poison,
        Flag::ChainPerk => snapshot.has_chain,
        Flag::OrbitalPerk => snapshot.has_orbital,
        Flag::FreezePerk => snapshot.has_freeze,
        Flag::ExplosionPerk => snapshot.has_explosion,
        Flag::ReflectPerk => snapshot.has_reflect,
    }
}

fn met(snapshot: &RunSnapshot, condition: Condition) -> bool {
    match condition {
        Condition::AtLeast { metric, target } => metric_value(snapshot, metric) >= target,
        Condition::GlassCannon => snapshot.dmg >= 50.0 && snapshot.max_hp < 100.0,
        Condition::Has(flag) => flag_value(snapshot, flag),
    }
}

/// Evaluate every still-locked achievement against the snapshot. The first
/// success per id marks the profile, credits the reward and is reported back;
/// already-unlocked ids are never revisited, so re-evaluation can never grant
/// a second reward.
pub fn evaluate(snapshot: &RunSnapshot, profile: &mut Profile) -> Vec<(AchievementId, u32)> {
    let mut unlocked = Vec::new();
    for d in CATALOG {
        if profile.achievements.contains(&d.id) {
            continue;
        }
        if met(snapshot, d.condition) {
            profile.achievements.insert(d.id);
            profile.currency += u64::from(d.reward);
            unlocked.push((d.id, d.reward));
        }
    }
    unlocked
}

/// Normalized `[0, 1]` progress toward a locked achievement, for HUD lists.
/// Flag-style conditions report 0 until met; degenerate targets report 0
/// rather than dividing by zero.
pub fn progress(id: AchievementId, snapshot: &RunSnapshot) -> f32 {
    let d = def(id);
    match d.condition {
        Condition::AtLeast { metric, target } => {
            if target <= 0.0 {
                return 0.0;
            }
            (metric_value(snapshot, metric) / target).clamp(0.0, 1.0)
        }
        Condition::GlassCannon => {
            if snapshot.dmg >= 50.0 && snapshot.max_hp < 100.0 {
                1.0
            } else {
                (snapshot.dmg / 50.0).clamp(0.0, 1.0)
            }
        }
        Condition::Has(flag) => {
            if flag_value(snapshot, flag) {
                1.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_credits_reward_once() {
        let mut profile = Profile::default();
        let snapshot = RunSnapshot {
            kills: 12,
            ..Default::default()
        };

        let unlocked = evaluate(&snapshot, &mut profile);
        assert!(unlocked.contains(&(AchievementId::FirstBlood, 25)));
        assert!(unlocked.contains(&(AchievementId::Kills10, 30)));
        let balance = profile.currency;

        // Re-evaluating the same snapshot must grant nothing
        let again = evaluate(&snapshot, &mut profile);
        assert!(again.is_empty());
        assert_eq!(profile.currency, balance);
    }

    #[test]
    fn test_progress_ratio() {
        let snapshot = RunSnapshot {
            kills: 50,
            ..Default::default()
        };
        assert!((progress(AchievementId::Kills100, &snapshot) - 0.5).abs() < 1e-6);
        assert_eq!(progress(AchievementId::Kills2000, &snapshot), 0.025);
    }

    #[test]
    fn test_progress_clamps_to_one() {
        let snapshot = RunSnapshot {
            kills: 5000,
            ..Default::default()
        };
        assert_eq!(progress(AchievementId::Kills100, &snapshot), 1.0);
    }

    #[test]
    fn test_glass_cannon_requires_both_halves() {
        let mut snapshot = RunSnapshot {
            dmg: 60.0,
            max_hp: 150.0,
            ..Default::default()
        };
        let mut profile = Profile::default();
        assert!(evaluate(&snapshot, &mut profile)
            .iter()
            .all(|(id, _)| *id != AchievementId::GlassCannon));

        snapshot.max_hp = 90.0;
        let unlocked = evaluate(&snapshot, &mut profile);
        assert!(unlocked.iter().any(|(id, _)| *id == AchievementId::GlassCannon));
    }

    #[test]
    fn test_flag_progress_is_binary() {
        let mut snapshot = RunSnapshot::default();
        assert_eq!(progress(AchievementId::OrbitalPerk, &snapshot), 0.0);
        snapshot.has_orbital = true;
        assert_eq!(progress(AchievementId::OrbitalPerk, &snapshot), 1.0);
    }

    #[test]
    fn test_wave_clear_tiers() {
        let snapshot = RunSnapshot {
            waves_cleared: 5,
            ..Default::default()
        };
        let mut profile = Profile::default();
        let unlocked = evaluate(&snapshot, &mut profile);
        assert!(unlocked.iter().any(|(id, _)| *id == AchievementId::Waves3));
        assert!(unlocked.iter().any(|(id, _)| *id == AchievementId::Waves5));
        assert!(unlocked.iter().all(|(id, _)| *id != AchievementId::Waves10));
    }

    #[test]
    fn test_every_id_has_a_row() {
        // `def` panics if a row is missing; walk the catalog's own ids
        for d in CATALOG {
            assert_eq!(def(d.id).id, d.id);
        }
        assert_eq!(CATALOG.len(), 56);
    }
}

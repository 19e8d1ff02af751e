//! Enemy kinds, capability state and status effects
//!
//! Seventeen enemy kinds share one struct. Behaviour that only some kinds
//! have (ranged attacks, auras, phasing, berserk) lives in optional
//! capability structs attached at construction, never checked by string.
//! Timed status effects are attached by combat, not inherited.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{dir_or_zero, frame_scale};

/// Enemy type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Swarm,
    Fast,
    Sniper,
    Ghost,
    Leech,
    Tank,
    Bruiser,
    Ranger,
    Lancer,
    Bomber,
    Sentinel,
    Boss,
    Mortar,
    Shielder,
    Healer,
    Buffer,
}

/// Cosmetic grouping used by the HUD bestiary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Swarm,
    Shadow,
    Elite,
    Command,
    Support,
}

impl EnemyKind {
    pub fn display_name(self) -> &'static str {
        match self {
            EnemyKind::Basic => "Drone",
            EnemyKind::Swarm => "Larva",
            EnemyKind::Fast => "Striker",
            EnemyKind::Sniper => "Hunter",
            EnemyKind::Ghost => "Phantom",
            EnemyKind::Leech => "Parasite",
            EnemyKind::Tank => "Juggernaut",
            EnemyKind::Bruiser => "Berserker",
            EnemyKind::Ranger => "Ranger",
            EnemyKind::Lancer => "Lancer",
            EnemyKind::Bomber => "Kamikaze",
            EnemyKind::Sentinel => "Sentinel",
            EnemyKind::Boss => "Overlord",
            EnemyKind::Mortar => "Mortarman",
            EnemyKind::Shielder => "Shieldbearer",
            EnemyKind::Healer => "Regenerator",
            EnemyKind::Buffer => "Amplifier",
        }
    }

    pub fn faction(self) -> Faction {
        match self {
            EnemyKind::Basic | EnemyKind::Swarm | EnemyKind::Fast | EnemyKind::Bomber => {
                Faction::Swarm
            }
            EnemyKind::Sniper | EnemyKind::Ghost | EnemyKind::Leech => Faction::Shadow,
            EnemyKind::Tank | EnemyKind::Bruiser | EnemyKind::Ranger | EnemyKind::Lancer => {
                Faction::Elite
            }
            EnemyKind::Sentinel | EnemyKind::Boss | EnemyKind::Mortar | EnemyKind::Shielder => {
                Faction::Command
            }
            EnemyKind::Healer | EnemyKind::Buffer => Faction::Support,
        }
    }

    pub fn tier(self) -> u8 {
        match self {
            EnemyKind::Basic | EnemyKind::Swarm | EnemyKind::Fast => 1,
            EnemyKind::Sniper
            | EnemyKind::Ghost
            | EnemyKind::Leech
            | EnemyKind::Ranger
            | EnemyKind::Lancer => 2,
            EnemyKind::Tank
            | EnemyKind::Bruiser
            | EnemyKind::Bomber
            | EnemyKind::Mortar
            | EnemyKind::Shielder
            | EnemyKind::Healer
            | EnemyKind::Buffer => 3,
            EnemyKind::Sentinel => 4,
            EnemyKind::Boss => 5,
        }
    }
}

/// Ranged attack capability (ranger / sniper / lancer / mortar)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangedAttack {
    pub cooldown_ms: f32,
    pub interval_ms: f32,
    /// Distance the enemy tries to hold (with a +/-40 deadband)
    pub preferred_range: f32,
    /// Maximum distance at which a shot is actually released
    pub fire_range: f32,
    /// Shot speed in px per 1/60 s step
    pub shot_speed: f32,
    /// Fraction of full lead prediction applied to the aim point
    pub lead_factor: f32,
    /// Bullets per volley (ranger triple shot at high difficulty)
    pub volley: u32,
    pub shot_size: f32,
    pub shot_lifetime_ms: f32,
    /// Shots ignore the player's invulnerability window
    pub armor_pierce: bool,
    /// Shots survive player contact
    pub piercing: bool,
}

/// What an aura emitter grants to nearby allies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraKind {
    /// Grants a stacking absorbed-before-hp shield pool (capped)
    Shield,
    /// Heals allies by `power`
    Heal,
    /// Grants a timed speed+damage buff
    Buff,
}

/// Periodic ally aura capability (shielder / healer / buffer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuraEmitter {
    pub kind: AuraKind,
    pub radius: f32,
    pub interval_ms: f32,
    pub timer_ms: f32,
    pub power: f32,
}

/// Ghost invulnerability cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseCycle {
    pub timer_ms: f32,
    pub interval_ms: f32,
    pub duration_ms: f32,
    pub phasing: bool,
}

/// Bruiser rage state, triggered once below 40% hp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Berserk {
    pub base_speed: f32,
    pub triggered: bool,
}

/// Timed modifiers attached to an enemy by combat. All countdowns are in
/// milliseconds and decay every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Poison damage per second while `poison_ms` runs
    pub poison_dps: f32,
    pub poison_ms: f32,
    /// Freeze blocks movement and behaviour entirely
    pub frozen_ms: f32,
    /// Movement speed multiplier while `slow_ms` runs
    pub slow_factor: f32,
    pub slow_ms: f32,
    /// Chain lightning visual mark / re-target flag
    pub chain_mark_ms: f32,
    /// Ally shield pool absorbed before hp (shielder aura, capped)
    pub shield_buff: f32,
    /// Speed+damage buff window (buffer aura)
    pub buff_ms: f32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            poison_dps: 0.0,
            poison_ms: 0.0,
            frozen_ms: 0.0,
            slow_factor: 1.0,
            slow_ms: 0.0,
            chain_mark_ms: 0.0,
            shield_buff: 0.0,
            buff_ms: 0.0,
        }
    }
}

impl StatusEffects {
    pub fn frozen(&self) -> bool {
        self.frozen_ms > 0.0
    }

    /// Apply or refresh a slow; the strongest factor and longest timer win
    pub fn apply_slow(&mut self, factor: f32, duration_ms: f32) {
        self.slow_ms = self.slow_ms.max(duration_ms);
        self.slow_factor = if self.slow_ms > 0.0 {
            self.slow_factor.min(factor)
        } else {
            factor
        };
    }

    /// Decay all countdowns, clearing the associated flag when one expires
    fn decay(&mut self, ms: f32) {
        if self.poison_ms > 0.0 {
            self.poison_ms -= ms;
        }
        if self.slow_ms > 0.0 {
            self.slow_ms -= ms;
            if self.slow_ms <= 0.0 {
                self.slow_ms = 0.0;
                self.slow_factor = 1.0;
            }
        }
        if self.chain_mark_ms > 0.0 {
            self.chain_mark_ms = (self.chain_mark_ms - ms).max(0.0);
        }
        if self.buff_ms > 0.0 {
            self.buff_ms = (self.buff_ms - ms).max(0.0);
        }
        // frozen_ms is decremented in Enemy::update so the movement gate and
        // the countdown stay in one place
    }
}

/// An enemy instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Movement speed in px per 1/60 s step
    pub speed: f32,
    pub dmg: f32,
    pub size: f32,
    pub exp_value: u32,
    pub color: [u8; 3],
    pub is_miniboss: bool,

    /// Flat fraction of incoming damage shrugged off (tank armor)
    pub damage_reduction: f32,
    /// Shielder-only pool absorbed before everything else
    pub personal_shield: f32,
    pub max_personal_shield: f32,
    /// Self-heal on melee contact with the player (leech)
    pub leech_heal: f32,

    pub ranged: Option<RangedAttack>,
    pub aura: Option<AuraEmitter>,
    pub phase: Option<PhaseCycle>,
    pub berserk: Option<Berserk>,

    pub status: StatusEffects,
    /// Cosmetic white flash after a hit (ms)
    pub hit_flash_ms: f32,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, kind: EnemyKind, difficulty: f32) -> Self {
        let d = difficulty;
        let mut e = Self {
            id,
            kind,
            pos,
            hp: 0.0,
            max_hp: 0.0,
            speed: 0.0,
            dmg: 0.0,
            size: 20.0,
            exp_value: 10,
            color: [255, 46, 99],
            is_miniboss: false,
            damage_reduction: 0.0,
            personal_shield: 0.0,
            max_personal_shield: 0.0,
            leech_heal: 0.0,
            ranged: None,
            aura: None,
            phase: None,
            berserk: None,
            status: StatusEffects::default(),
            hit_flash_ms: 0.0,
        };

        match kind {
            EnemyKind::Basic => {
                e.max_hp = 30.0 * d;
                e.speed = 2.5 + d * 0.3;
                e.dmg = 8.0 + d * 1.5;
                e.exp_value = 10;
                e.size = 20.0;
                e.color = [255, 46, 99];
            }
            EnemyKind::Swarm => {
                e.max_hp = 12.0 * d;
                e.speed = 6.5 + d * 0.6;
                e.dmg = 3.0 + d * 0.5;
                e.exp_value = 8;
                e.size = 11.0;
                e.color = [255, 120, 30];
            }
            EnemyKind::Fast => {
                e.max_hp = 20.0 * d;
                e.speed = 5.0 + d * 0.5;
                e.dmg = 5.0 + d;
                e.exp_value = 15;
                e.size = 15.0;
                e.color = [255, 200, 40];
            }
            EnemyKind::Sniper => {
                e.max_hp = 45.0 * d;
                e.speed = 1.2 + d * 0.15;
                e.dmg = 18.0 + d * 3.0;
                e.exp_value = 25;
                e.size = 18.0;
                e.color = [180, 40, 220];
                e.ranged = Some(RangedAttack {
                    cooldown_ms: 0.0,
                    interval_ms: 2500.0,
                    preferred_range: 500.0,
                    fire_range: 700.0,
                    shot_speed: 8.0,
                    lead_factor: 0.6,
                    volley: 1,
                    shot_size: 8.0,
                    shot_lifetime_ms: 2000.0,
                    armor_pierce: d >= 2.0,
                    piercing: false,
                });
            }
            EnemyKind::Ghost => {
                e.max_hp = 35.0 * d;
                e.speed = 3.5 + d * 0.4;
                e.dmg = 12.0 + d * 2.0;
                e.exp_value = 20;
                e.size = 22.0;
                e.color = [140, 50, 200];
                e.phase = Some(PhaseCycle {
                    timer_ms: 0.0,
                    interval_ms: 3000.0,
                    duration_ms: 800.0,
                    phasing: false,
                });
            }
            EnemyKind::Leech => {
                e.max_hp = 55.0 * d;
                e.speed = 3.0 + d * 0.3;
                e.dmg = 7.0 + d * 1.5;
                e.exp_value = 20;
                e.size = 18.0;
                e.color = [220, 50, 200];
                e.leech_heal = 8.0 + d * 2.0;
            }
            EnemyKind::Tank => {
                e.max_hp = 100.0 * d;
                e.speed = 1.5 + d * 0.2;
                e.dmg = 10.0 + d * 2.0;
                e.exp_value = 30;
                e.size = 30.0;
                e.color = [40, 140, 255];
                e.damage_reduction = 0.20;
            }
            EnemyKind::Bruiser => {
                let base_speed = 2.2 + d * 0.25;
                e.max_hp = 160.0 * d;
                e.speed = base_speed;
                e.dmg = 15.0 + d * 3.0;
                e.exp_value = 45;
                e.size = 35.0;
                e.color = [60, 160, 240];
                e.berserk = Some(Berserk {
                    base_speed,
                    triggered: false,
                });
            }
            EnemyKind::Ranger => {
                e.max_hp = 50.0 * d;
                e.speed = 1.5 + d * 0.15;
                e.dmg = 16.0 + d * 2.5;
                e.exp_value = 30;
                e.size = 20.0;
                e.color = [60, 200, 220];
                e.ranged = Some(RangedAttack {
                    cooldown_ms: 0.0,
                    interval_ms: 2000.0,
                    preferred_range: 350.0,
                    fire_range: 600.0,
                    shot_speed: 5.0,
                    lead_factor: 0.35,
                    volley: if d >= 3.0 { 3 } else { 1 },
                    shot_size: 7.0,
                    shot_lifetime_ms: 2500.0,
                    armor_pierce: false,
                    piercing: false,
                });
            }
            EnemyKind::Lancer => {
                e.max_hp = 40.0 * d;
                e.speed = 2.0 + d * 0.2;
                e.dmg = 12.0 + d * 2.0;
                e.exp_value = 28;
                e.size = 16.0;
                e.color = [80, 220, 180];
                e.ranged = Some(RangedAttack {
                    cooldown_ms: 0.0,
                    interval_ms: 3000.0,
                    preferred_range: 400.0,
                    fire_range: 600.0,
                    shot_speed: 6.0,
                    lead_factor: 0.0,
                    volley: 1,
                    shot_size: 6.0,
                    shot_lifetime_ms: 2000.0,
                    armor_pierce: false,
                    piercing: true,
                });
            }
            EnemyKind::Bomber => {
                e.max_hp = 50.0 * d;
                e.speed = 1.8 + d * 0.2;
                e.dmg = 25.0 + d * 4.0;
                e.exp_value = 35;
                e.size = 27.0;
                e.color = [255, 80, 20];
            }
            EnemyKind::Sentinel => {
                e.max_hp = 280.0 * d;
                e.speed = 0.7 + d * 0.1;
                e.dmg = 20.0 + d * 4.0;
                e.exp_value = 80;
                e.size = 40.0;
                e.color = [100, 50, 255];
            }
            EnemyKind::Boss => {
                e.max_hp = 500.0 * d;
                e.speed = 2.0 + d * 0.3;
                e.dmg = 18.0 + d * 4.0;
                e.exp_value = 200;
                e.size = 50.0;
                e.color = [150, 0, 255];
            }
            EnemyKind::Mortar => {
                e.max_hp = 70.0 * d;
                e.speed = 0.6 + d * 0.05;
                e.dmg = 22.0 + d * 3.0;
                e.exp_value = 40;
                e.size = 28.0;
                e.color = [120, 80, 200];
                e.ranged = Some(RangedAttack {
                    cooldown_ms: 0.0,
                    interval_ms: 3500.0,
                    preferred_range: 500.0,
                    fire_range: 700.0,
                    shot_speed: 3.5,
                    lead_factor: 0.0,
                    volley: 1,
                    shot_size: 12.0,
                    shot_lifetime_ms: 2000.0,
                    armor_pierce: false,
                    piercing: false,
                });
            }
            EnemyKind::Shielder => {
                e.max_hp = 200.0 * d;
                e.speed = 1.0 + d * 0.1;
                e.dmg = 8.0 + d * 1.5;
                e.exp_value = 60;
                e.size = 35.0;
                e.color = [80, 200, 255];
                e.personal_shield = 100.0 * d;
                e.max_personal_shield = e.personal_shield;
                e.aura = Some(AuraEmitter {
                    kind: AuraKind::Shield,
                    radius: 220.0,
                    interval_ms: 1500.0,
                    timer_ms: 0.0,
                    power: 25.0,
                });
            }
            EnemyKind::Healer => {
                e.max_hp = 65.0 * d;
                e.speed = 1.8 + d * 0.15;
                e.dmg = 6.0 + d;
                e.exp_value = 50;
                e.size = 22.0;
                e.color = [50, 220, 100];
                e.aura = Some(AuraEmitter {
                    kind: AuraKind::Heal,
                    radius: 200.0,
                    interval_ms: 2000.0,
                    timer_ms: 0.0,
                    power: 8.0 * d,
                });
            }
            EnemyKind::Buffer => {
                e.max_hp = 55.0 * d;
                e.speed = 1.5 + d * 0.1;
                e.dmg = 5.0 + d * 0.8;
                e.exp_value = 55;
                e.size = 20.0;
                e.color = [220, 200, 50];
                e.aura = Some(AuraEmitter {
                    kind: AuraKind::Buff,
                    radius: 180.0,
                    interval_ms: 3000.0,
                    timer_ms: 0.0,
                    power: 0.0,
                });
            }
        }

        e.hp = e.max_hp;
        e
    }

    /// Promote this enemy into a wave miniboss: multiplied stats, extra
    /// armor, gold tint.
    pub fn promote_to_miniboss(&mut self) {
        self.is_miniboss = true;
        self.max_hp *= MINIBOSS_HP_MULT;
        self.hp = self.max_hp;
        self.dmg *= MINIBOSS_DMG_MULT;
        self.speed = (self.speed * MINIBOSS_SPEED_MULT).max(MINIBOSS_MIN_SPEED);
        self.size *= MINIBOSS_SIZE_MULT;
        self.exp_value = (self.exp_value as f32 * MINIBOSS_EXP_MULT) as u32;
        self.damage_reduction += MINIBOSS_ARMOR_BONUS;
        if let Some(b) = self.berserk.as_mut() {
            b.base_speed = self.speed;
        }
        // Blend toward gold
        let [r, g, b] = self.color;
        self.color = [
            ((r as f32 * 0.5 + 255.0 * 0.5) as u8).min(255),
            ((g as f32 * 0.5 + 215.0 * 0.5) as u8).min(255),
            (b as f32 * 0.2) as u8,
        ];
    }

    pub fn alive(&self) -> bool {
        self.hp > 0.0
    }

    /// True while a ghost's invulnerability window is open
    pub fn phasing(&self) -> bool {
        self.phase.as_ref().is_some_and(|p| p.phasing)
    }

    /// Movement speed after slow and buff modifiers
    pub fn effective_speed(&self) -> f32 {
        let mut speed = self.speed * self.status.slow_factor;
        if self.status.buff_ms > 0.0 {
            speed *= BUFF_MULT;
        }
        speed
    }

    /// Contact damage after buff modifiers
    pub fn effective_damage(&self) -> f32 {
        if self.status.buff_ms > 0.0 {
            self.dmg * BUFF_MULT
        } else {
            self.dmg
        }
    }

    /// Apply a hit. Absorption order: personal shield, then the ally
    /// shield-buff pool, then damage reduction (a connecting hit always costs
    /// at least 1 hp). Returns true if the enemy died.
    pub fn take_damage(&mut self, damage: f32) -> bool {
        let mut dmg = damage;
        self.hit_flash_ms = 100.0;

        if self.personal_shield > 0.0 {
            let absorbed = self.personal_shield.min(dmg);
            self.personal_shield -= absorbed;
            dmg -= absorbed;
            if dmg <= 0.0 {
                return false;
            }
        }
        if self.status.shield_buff > 0.0 {
            let absorbed = self.status.shield_buff.min(dmg);
            self.status.shield_buff -= absorbed;
            dmg -= absorbed;
        }
        if self.damage_reduction > 0.0 && dmg > 0.0 {
            dmg = (dmg * (1.0 - self.damage_reduction)).max(1.0);
        }

        self.hp -= dmg;
        self.hp <= 0.0
    }

    /// Per-tick update: status decay, poison damage, berserk/phase cycles and
    /// movement toward (or around) the player. Poison can kill here, outside
    /// any collision pass; the caller must sweep `!alive()` enemies afterward.
    pub fn update(&mut self, dt: f32, player_pos: Vec2) {
        let ms = dt * 1000.0;

        if self.status.poison_ms > 0.0 {
            self.hp -= self.status.poison_dps * dt;
        }
        self.status.decay(ms);
        if self.hit_flash_ms > 0.0 {
            self.hit_flash_ms = (self.hit_flash_ms - ms).max(0.0);
        }
        // Attack and aura timers keep running while frozen
        if let Some(ranged) = self.ranged.as_mut()
            && ranged.cooldown_ms > 0.0
        {
            ranged.cooldown_ms = (ranged.cooldown_ms - ms).max(0.0);
        }
        if let Some(aura) = self.aura.as_mut()
            && aura.timer_ms > 0.0
        {
            aura.timer_ms = (aura.timer_ms - ms).max(0.0);
        }

        if !self.alive() {
            return;
        }

        if self.status.frozen_ms > 0.0 {
            self.status.frozen_ms -= ms;
            return;
        }

        if let Some(b) = self.berserk.as_mut()
            && !b.triggered
            && self.hp < self.max_hp * 0.4
        {
            b.triggered = true;
            self.speed = b.base_speed * 1.8;
            self.dmg *= 1.5;
            self.color = [240, 60, 40];
        }

        if let Some(phase) = self.phase.as_mut() {
            phase.timer_ms += ms;
            if !phase.phasing && phase.timer_ms >= phase.interval_ms {
                phase.phasing = true;
                phase.timer_ms = 0.0;
            } else if phase.phasing && phase.timer_ms >= phase.duration_ms {
                phase.phasing = false;
                phase.timer_ms = 0.0;
            }
        }

        let step = self.effective_speed() * frame_scale(dt);
        let to_player = player_pos - self.pos;
        let dist = to_player.length();
        if let Some(ranged) = self.ranged.as_ref() {
            // Hold position inside a deadband around the preferred range
            if dist > ranged.preferred_range + 40.0 {
                self.pos += dir_or_zero(to_player) * step;
            } else if dist < ranged.preferred_range - 40.0 {
                self.pos -= dir_or_zero(to_player) * step;
            }
        } else if dist > 0.0 {
            self.pos += dir_or_zero(to_player) * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn enemy(kind: EnemyKind) -> Enemy {
        Enemy::new(1, Vec2::ZERO, kind, 1.0)
    }

    #[test]
    fn test_poison_kills_without_collisions() {
        // hp 20, 15 dps for 3000 ms: 5 hp left after one second, dead after two
        let mut e = enemy(EnemyKind::Basic);
        e.hp = 20.0;
        e.status.poison_dps = 15.0;
        e.status.poison_ms = 3000.0;

        e.update(1.0, Vec2::new(1000.0, 0.0));
        assert!(e.alive());
        assert!((e.hp - 5.0).abs() < 1e-3);

        e.update(1.0, Vec2::new(1000.0, 0.0));
        assert!(!e.alive());
    }

    #[test]
    fn test_freeze_blocks_movement() {
        let mut e = enemy(EnemyKind::Basic);
        e.status.frozen_ms = 2000.0;
        let start = e.pos;
        e.update(DT, Vec2::new(500.0, 0.0));
        assert_eq!(e.pos, start);

        e.status.frozen_ms = 0.0;
        e.update(DT, Vec2::new(500.0, 0.0));
        assert!(e.pos.x > start.x);
    }

    #[test]
    fn test_slow_scales_speed_and_expires() {
        let mut e = enemy(EnemyKind::Basic);
        e.status.apply_slow(0.4, 100.0);
        assert!((e.effective_speed() - e.speed * 0.4).abs() < 1e-6);
        e.update(0.2, Vec2::new(500.0, 0.0)); // 200 ms > 100 ms
        assert_eq!(e.status.slow_factor, 1.0);
    }

    #[test]
    fn test_berserk_triggers_once_below_threshold() {
        let mut e = enemy(EnemyKind::Bruiser);
        let base_speed = e.speed;
        let base_dmg = e.dmg;
        e.hp = e.max_hp * 0.3;
        e.update(DT, Vec2::new(500.0, 0.0));
        assert!((e.speed - base_speed * 1.8).abs() < 1e-4);
        assert!((e.dmg - base_dmg * 1.5).abs() < 1e-4);

        // A second pass must not compound
        let raged_dmg = e.dmg;
        e.update(DT, Vec2::new(500.0, 0.0));
        assert_eq!(e.dmg, raged_dmg);
    }

    #[test]
    fn test_ghost_phase_cycles() {
        let mut e = enemy(EnemyKind::Ghost);
        assert!(!e.phasing());
        // 3 s interval elapses -> phasing starts
        for _ in 0..181 {
            e.update(DT, e.pos + Vec2::X);
        }
        assert!(e.phasing());
        // 800 ms duration elapses -> phasing ends
        for _ in 0..49 {
            e.update(DT, e.pos + Vec2::X);
        }
        assert!(!e.phasing());
    }

    #[test]
    fn test_damage_absorption_order() {
        let mut e = enemy(EnemyKind::Shielder); // personal shield 100
        e.status.shield_buff = 50.0;
        // 120 damage: 100 eaten by personal shield, 20 by the buff pool
        assert!(!e.take_damage(120.0));
        assert_eq!(e.personal_shield, 0.0);
        assert_eq!(e.status.shield_buff, 30.0);
        assert_eq!(e.hp, e.max_hp);
    }

    #[test]
    fn test_tank_damage_reduction_floors_at_one() {
        let mut e = enemy(EnemyKind::Tank);
        let hp = e.hp;
        e.take_damage(10.0);
        assert!((hp - e.hp - 8.0).abs() < 1e-4); // 20% shrugged off
        e.take_damage(1.0);
        assert!((hp - 8.0 - e.hp - 1.0).abs() < 1e-4); // still at least 1
    }

    #[test]
    fn test_ranged_holds_preferred_range() {
        let mut e = Enemy::new(1, Vec2::new(350.0, 0.0), EnemyKind::Ranger, 1.0);
        let player = Vec2::ZERO;
        // Inside the deadband: stays put
        let before = e.pos;
        e.update(DT, player);
        assert_eq!(e.pos, before);
        // Too close: retreats
        e.pos = Vec2::new(200.0, 0.0);
        e.update(DT, player);
        assert!(e.pos.x > 200.0);
        // Too far: approaches
        e.pos = Vec2::new(500.0, 0.0);
        e.update(DT, player);
        assert!(e.pos.x < 500.0);
    }

    #[test]
    fn test_miniboss_promotion_multipliers() {
        let mut e = enemy(EnemyKind::Tank);
        let (hp, dmg, size, exp) = (e.max_hp, e.dmg, e.size, e.exp_value);
        e.promote_to_miniboss();
        assert!(e.is_miniboss);
        assert_eq!(e.max_hp, hp * 5.0);
        assert_eq!(e.dmg, dmg * 2.5);
        assert_eq!(e.size, size * 1.8);
        assert_eq!(e.exp_value, (exp as f32 * 5.0) as u32);
        assert!((e.damage_reduction - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_ranger_rank_abilities_scale_with_difficulty() {
        let low = Enemy::new(1, Vec2::ZERO, EnemyKind::Ranger, 1.0);
        let high = Enemy::new(2, Vec2::ZERO, EnemyKind::Ranger, 3.0);
        assert_eq!(low.ranged.as_ref().unwrap().volley, 1);
        assert_eq!(high.ranged.as_ref().unwrap().volley, 3);

        let sniper = Enemy::new(3, Vec2::ZERO, EnemyKind::Sniper, 2.5);
        assert!(sniper.ranged.as_ref().unwrap().armor_pierce);
    }
}

//! Player state and per-run stats
//!
//! The player is created once per run from the profile's module levels and
//! skin, then mutated only by perk application and combat resolution.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::consts::*;
use crate::perks::PerkId;
use crate::profile::{Modules, SkinId};
use crate::{dir_or_zero, frame_scale};

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Impulse velocity (dash knockback), decays every step
    pub vel: Vec2,
    /// Actual displacement last tick in px per 1/60 s step (input + impulse);
    /// ranged enemies read this for lead prediction
    pub motion: Vec2,

    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,

    /// Movement speed in px per 1/60 s step
    pub speed: f32,
    pub dmg: f32,
    /// Milliseconds between shots
    pub fire_rate_ms: f32,
    pub last_shot_ms: f64,
    pub bullet_speed: f32,
    pub bullet_lifetime_ms: f32,
    pub bullet_size: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,

    /// Bullets fired side by side per trigger pull
    pub multishot: u32,
    /// Extra trailing bullets (twin_shot perk, capped at 3)
    pub twin_shot: u32,
    /// Enemies a bullet may pass through after its first hit
    pub piercing: u32,

    pub lifesteal: f32,
    /// Fraction of incoming hp damage absorbed
    pub armor: f32,
    /// Hp per second restored over time
    pub regen: f32,
    regen_accumulator: f32,
    pub thorns_damage: f32,
    pub reflect_damage: f32,

    pub exp_magnet_radius: f32,
    pub exp_multiplier: f32,
    pub gold_multiplier: f32,

    pub level: u32,
    pub exp: f32,
    pub exp_to_next: f32,

    pub dash_ready: bool,
    pub dash_cooldown_ms: f32,
    pub dash_cooldown_mult: f32,
    pub dash_speed: f32,
    pub dash_invuln_ms: f32,
    /// Remaining dash window; dash strikes only land while this runs
    pub dash_active_ms: f32,
    /// Remaining post-hit invulnerability
    pub invulnerable_ms: f32,

    pub size: f32,
    pub skin: SkinId,

    // Global bullet-effect flags granted by perks; they modify every hit the
    // player lands, not individual bullets.
    pub poison_bullets: bool,
    pub freeze_bullets: bool,
    pub slow_bullets: bool,
    pub explosive_bullets: bool,
    pub chain_lightning: u32,
    pub orbital_bullets: u32,
    pub dash_deals_damage: bool,

    /// One-time perks already taken this run (excluded from future offers)
    pub acquired_perks: BTreeSet<PerkId>,
    /// Times each stackable perk has been taken
    pub perk_stacks: BTreeMap<PerkId, u32>,
}

impl Player {
    pub fn new(modules: &Modules, skin: SkinId) -> Self {
        let max_hp = 100.0 + modules.health as f32 * 10.0;
        let mut player = Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            motion: Vec2::ZERO,
            hp: max_hp,
            max_hp,
            shield: 0.0,
            max_shield: 0.0,
            speed: 6.5 + modules.speed as f32 * 0.5,
            dmg: 10.0 + modules.damage as f32 * 2.0,
            fire_rate_ms: (250.0 - modules.fire_rate as f32 * 5.0).max(100.0),
            last_shot_ms: f64::MIN,
            bullet_speed: 15.0,
            bullet_lifetime_ms: 1000.0,
            bullet_size: 1.0,
            crit_chance: 0.1 + modules.crit as f32 * 0.02,
            crit_multiplier: 2.0,
            multishot: 1,
            twin_shot: 0,
            piercing: 0,
            lifesteal: 0.0,
            armor: 0.0,
            regen: 0.0,
            regen_accumulator: 0.0,
            thorns_damage: 0.0,
            reflect_damage: 0.0,
            exp_magnet_radius: GEM_MAGNET_RADIUS,
            exp_multiplier: 1.0,
            gold_multiplier: 1.0,
            level: 1,
            exp: 0.0,
            exp_to_next: 100.0,
            dash_ready: true,
            dash_cooldown_ms: 0.0,
            dash_cooldown_mult: 1.0,
            dash_speed: DASH_SPEED,
            dash_invuln_ms: DASH_INVULN_MS,
            dash_active_ms: 0.0,
            invulnerable_ms: 0.0,
            size: PLAYER_SIZE,
            skin,
            poison_bullets: false,
            freeze_bullets: false,
            slow_bullets: false,
            explosive_bullets: false,
            chain_lightning: 0,
            orbital_bullets: 0,
            dash_deals_damage: false,
            acquired_perks: BTreeSet::new(),
            perk_stacks: BTreeMap::new(),
        };
        player.apply_skin_bonus();
        player
    }

    fn apply_skin_bonus(&mut self) {
        match self.skin {
            SkinId::Default => {}
            SkinId::Red => self.dmg *= 1.10,
            SkinId::Purple => self.speed *= 1.15,
            SkinId::Gold => {
                self.max_hp *= 1.20;
                self.hp = self.max_hp;
            }
            SkinId::Green => self.fire_rate_ms *= 0.90,
            SkinId::Cyan => self.exp_multiplier = 1.10,
            SkinId::Orange => self.armor += 0.08,
            SkinId::White => {
                self.dmg *= 1.05;
                self.speed *= 1.05;
                self.max_hp *= 1.05;
                self.hp = self.max_hp;
                self.fire_rate_ms *= 0.95;
            }
            SkinId::Pink => self.dash_speed *= 1.20,
            SkinId::Dark => {
                self.dmg *= 1.15;
                self.speed *= 0.95;
            }
        }
    }

    /// Apply an incoming hit. Shield absorbs first and spills into hp; armor
    /// reduces the hp portion (a connecting hit always costs at least 1 hp).
    /// Returns true if the hit was lethal. No-op while invulnerable.
    pub fn take_damage(&mut self, damage: f32) -> bool {
        if self.invulnerable_ms > 0.0 || damage <= 0.0 {
            return false;
        }

        let mut remaining = damage;
        if self.shield > 0.0 {
            let absorbed = self.shield.min(remaining);
            self.shield -= absorbed;
            remaining -= absorbed;
        }
        if remaining > 0.0 {
            let reduced = (remaining * (1.0 - self.armor)).max(1.0);
            self.hp -= reduced;
        }

        self.invulnerable_ms = PLAYER_HIT_INVULN_MS;
        self.hp <= 0.0
    }

    /// Damage that ignores the invulnerability window (sniper armor-pierce
    /// shots). Shield and armor still apply.
    pub fn take_piercing_damage(&mut self, damage: f32) -> bool {
        let saved = self.invulnerable_ms;
        self.invulnerable_ms = 0.0;
        let lethal = self.take_damage(damage);
        // Keep whichever window is longer; the hit granted a fresh one.
        self.invulnerable_ms = self.invulnerable_ms.max(saved);
        lethal
    }

    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
    }

    /// Raise both the shield pool and its cap
    pub fn add_shield(&mut self, amount: f32) {
        self.max_shield += amount;
        self.shield = (self.shield + amount).min(self.max_shield);
    }

    /// Tick player-local timers: invulnerability, dash cooldown, regen,
    /// impulse decay.
    pub fn update(&mut self, dt: f32) {
        let ms = dt * 1000.0;
        if self.invulnerable_ms > 0.0 {
            self.invulnerable_ms = (self.invulnerable_ms - ms).max(0.0);
        }
        if self.dash_active_ms > 0.0 {
            self.dash_active_ms = (self.dash_active_ms - ms).max(0.0);
        }
        if self.dash_cooldown_ms > 0.0 {
            self.dash_cooldown_ms -= ms;
            if self.dash_cooldown_ms <= 0.0 {
                self.dash_cooldown_ms = 0.0;
                self.dash_ready = true;
            }
        }

        if self.regen > 0.0 && self.hp < self.max_hp {
            self.regen_accumulator += self.regen * dt;
            if self.regen_accumulator >= 1.0 {
                let whole = self.regen_accumulator.floor();
                self.heal(whole);
                self.regen_accumulator -= whole;
            }
        }

        self.vel *= VELOCITY_DAMPING.powf(frame_scale(dt));
        if self.vel.length_squared() < 0.01 {
            self.vel = Vec2::ZERO;
        }
    }

    /// Start a dash in `direction`. Fails (returns false) if the dash is on
    /// cooldown or the direction has no length.
    pub fn dash(&mut self, direction: Vec2) -> bool {
        if !self.dash_ready || direction.length_squared() == 0.0 {
            return false;
        }
        self.vel = dir_or_zero(direction) * self.dash_speed;
        self.dash_cooldown_ms = DASH_COOLDOWN_MS * self.dash_cooldown_mult;
        self.dash_ready = false;
        self.invulnerable_ms = self.invulnerable_ms.max(self.dash_invuln_ms);
        self.dash_active_ms = self.dash_invuln_ms;
        true
    }

    /// True when the fire-rate gate has elapsed
    pub fn can_fire(&self, time_ms: f64) -> bool {
        time_ms - self.last_shot_ms >= f64::from(self.fire_rate_ms)
    }

    /// True while a dash window is open and the dash-strike ability is owned
    pub fn dash_striking(&self) -> bool {
        self.dash_deals_damage && self.dash_active_ms > 0.0
    }

    /// Stack count for a perk (0 if never taken)
    pub fn stacks(&self, perk: PerkId) -> u32 {
        self.perk_stacks.get(&perk).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&Modules::default(), SkinId::Default)
    }

    #[test]
    fn test_shield_absorbs_then_spills() {
        let mut p = player();
        p.add_shield(30.0);
        assert!(!p.take_damage(50.0));
        assert_eq!(p.shield, 0.0);
        assert_eq!(p.hp, 80.0);
    }

    #[test]
    fn test_invulnerability_blocks_damage() {
        let mut p = player();
        p.take_damage(10.0);
        let hp_after_first = p.hp;
        assert!(!p.take_damage(999.0));
        assert_eq!(p.hp, hp_after_first);
    }

    #[test]
    fn test_armor_reduces_but_never_below_one() {
        let mut p = player();
        p.armor = 0.5;
        p.take_damage(20.0);
        assert_eq!(p.hp, 90.0);

        let mut p = player();
        p.armor = 0.75;
        p.take_damage(1.0);
        assert_eq!(p.hp, 99.0);
    }

    #[test]
    fn test_armor_pierce_ignores_invulnerability() {
        let mut p = player();
        p.take_damage(10.0);
        assert!(p.invulnerable_ms > 0.0);
        p.take_piercing_damage(10.0);
        assert_eq!(p.hp, 80.0);
    }

    #[test]
    fn test_dash_requires_ready_and_direction() {
        let mut p = player();
        assert!(!p.dash(Vec2::ZERO));
        assert!(p.dash(Vec2::new(1.0, 0.0)));
        assert!(!p.dash_ready);
        assert!(!p.dash(Vec2::new(0.0, 1.0)));
        assert!(p.vel.x > 0.0);
    }

    #[test]
    fn test_dash_cooldown_restores_ready() {
        let mut p = player();
        p.dash(Vec2::X);
        for _ in 0..125 {
            p.update(1.0 / 60.0); // > 2000 ms total
        }
        assert!(p.dash_ready);
    }

    #[test]
    fn test_regen_accumulates_fractions() {
        let mut p = player();
        p.hp = 50.0;
        p.regen = 1.0;
        p.update(0.4);
        assert_eq!(p.hp, 50.0);
        p.update(0.7); // accumulator crosses 1.0
        assert_eq!(p.hp, 51.0);
    }

    #[test]
    fn test_gold_skin_raises_hp() {
        let p = Player::new(&Modules::default(), SkinId::Gold);
        assert_eq!(p.max_hp, 120.0);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn test_modules_scale_base_stats() {
        let modules = Modules {
            health: 3,
            damage: 2,
            speed: 1,
            fire_rate: 10,
            crit: 5,
        };
        let p = Player::new(&modules, SkinId::Default);
        assert_eq!(p.max_hp, 130.0);
        assert_eq!(p.dmg, 14.0);
        assert_eq!(p.speed, 7.0);
        assert_eq!(p.fire_rate_ms, 200.0);
        assert!((p.crit_chance - 0.2).abs() < 1e-6);
    }
}

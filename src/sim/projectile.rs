//! Player bullets, enemy projectiles and experience gems

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::frame_scale;
use crate::vec_from_angle;

/// A player bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    /// Velocity in px per 1/60 s step
    pub vel: Vec2,
    pub dmg: f32,
    /// Enemies this bullet may pass through after its first hit
    pub piercing: u32,
    /// Enemies hit so far
    pub hits: u32,
    /// Size multiplier; hit radius scales with it
    pub size: f32,
    pub spawn_ms: f64,
    pub lifetime_ms: f32,
    pub is_crit: bool,
}

impl Bullet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: Vec2,
        angle: f32,
        speed: f32,
        dmg: f32,
        piercing: u32,
        size: f32,
        lifetime_ms: f32,
        is_crit: bool,
        spawn_ms: f64,
    ) -> Self {
        Self {
            pos,
            vel: vec_from_angle(angle) * speed,
            dmg,
            piercing,
            hits: 0,
            size,
            spawn_ms,
            lifetime_ms,
            is_crit,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * frame_scale(dt);
    }

    pub fn expired(&self, time_ms: f64) -> bool {
        time_ms - self.spawn_ms > f64::from(self.lifetime_ms)
    }

    /// Register a hit; returns true when the piercing budget is exhausted and
    /// the bullet must be removed.
    pub fn register_hit(&mut self) -> bool {
        self.hits += 1;
        self.hits > self.piercing
    }
}

/// Terminal behaviour tag for enemy projectiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyShotKind {
    Ranger,
    Sniper,
    Lancer,
    /// Detonates at its recorded target point when its lifetime expires,
    /// never on contact
    Mortar,
}

/// A projectile fired by a ranged enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub kind: EnemyShotKind,
    pub pos: Vec2,
    /// Velocity in px per 1/60 s step
    pub vel: Vec2,
    pub dmg: f32,
    pub size: f32,
    pub color: [u8; 3],
    pub spawn_ms: f64,
    pub lifetime_ms: f32,
    /// Ignores the player's invulnerability window (sniper rank ability)
    pub armor_pierce: bool,
    /// Survives player contact (lancer bolts)
    pub piercing: bool,
    /// Frozen detonation point for mortar shells
    pub target: Option<Vec2>,
}

impl EnemyProjectile {
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * frame_scale(dt);
    }

    pub fn expired(&self, time_ms: f64) -> bool {
        time_ms - self.spawn_ms > f64::from(self.lifetime_ms)
    }
}

/// An experience crystal dropped on an enemy death. Position only; it is
/// magnetised toward the player and converts to exp on contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExpGem {
    pub pos: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_travels_along_angle() {
        let mut b = Bullet::new(Vec2::ZERO, 0.0, 15.0, 10.0, 0, 1.0, 1000.0, false, 0.0);
        b.advance(1.0 / 60.0);
        assert!((b.pos.x - 15.0).abs() < 1e-4);
        assert!(b.pos.y.abs() < 1e-4);
    }

    #[test]
    fn test_bullet_lifetime() {
        let b = Bullet::new(Vec2::ZERO, 0.0, 15.0, 10.0, 0, 1.0, 1000.0, false, 500.0);
        assert!(!b.expired(1400.0));
        assert!(b.expired(1501.0));
    }

    #[test]
    fn test_piercing_budget() {
        // piercing = 0: first hit exhausts the bullet
        let mut b = Bullet::new(Vec2::ZERO, 0.0, 15.0, 10.0, 0, 1.0, 1000.0, false, 0.0);
        assert!(b.register_hit());

        // piercing = 2: damages three enemies, removed on the third
        let mut b = Bullet::new(Vec2::ZERO, 0.0, 15.0, 10.0, 2, 1.0, 1000.0, false, 0.0);
        assert!(!b.register_hit());
        assert!(!b.register_hit());
        assert!(b.register_hit());
    }
}

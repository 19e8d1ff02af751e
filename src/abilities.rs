//! Active abilities: registry, cooldown state machine, timed effect windows
//!
//! Exactly one ability can be equipped per run. Firing is legal only with the
//! cooldown at zero; windowed effects (overdrive) snapshot what they change
//! and restore it exactly once when the window closes. The instantaneous
//! world effects (nuke damage, pulse pushback) are applied by the tick
//! pipeline in `sim`; this module owns identity, legality and timing.

use serde::{Deserialize, Serialize};

use crate::sim::Player;

/// The seven purchasable actives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Passive: dashes strike enemies on the path for 30 damage
    DashBoost,
    /// Push every enemy within 250 px away from the player
    ShieldPulse,
    /// Slow all enemies to 40% speed for 4 s
    TimeSlow,
    /// Double fire rate for 5 s, reverted exactly once on expiry
    Overdrive,
    /// 150 damage to everything within 400 px
    Nuke,
    /// Heal 40% of max hp and grant 80 shield
    HealPulse,
    /// 24 bullets in a full circle
    BulletStorm,
}

impl AbilityKind {
    /// Parse a save-file ability id; unknown or empty ids mean "none"
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "dash_boost" => Some(AbilityKind::DashBoost),
            "shield_pulse" => Some(AbilityKind::ShieldPulse),
            "time_slow" => Some(AbilityKind::TimeSlow),
            "overdrive" => Some(AbilityKind::Overdrive),
            "nuke" => Some(AbilityKind::Nuke),
            "heal_pulse" => Some(AbilityKind::HealPulse),
            "bullet_storm" => Some(AbilityKind::BulletStorm),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            AbilityKind::DashBoost => "dash_boost",
            AbilityKind::ShieldPulse => "shield_pulse",
            AbilityKind::TimeSlow => "time_slow",
            AbilityKind::Overdrive => "overdrive",
            AbilityKind::Nuke => "nuke",
            AbilityKind::HealPulse => "heal_pulse",
            AbilityKind::BulletStorm => "bullet_storm",
        }
    }

    /// Cooldown started when the ability fires
    pub fn cooldown_ms(self) -> f32 {
        match self {
            AbilityKind::DashBoost => 0.0,
            AbilityKind::ShieldPulse => 6000.0,
            AbilityKind::TimeSlow => 12000.0,
            AbilityKind::Overdrive => 15000.0,
            AbilityKind::Nuke => 20000.0,
            AbilityKind::HealPulse => 18000.0,
            AbilityKind::BulletStorm => 10000.0,
        }
    }

    /// Duration of the timed effect window, zero for instantaneous abilities
    pub fn active_window_ms(self) -> f32 {
        match self {
            AbilityKind::ShieldPulse => 300.0,
            AbilityKind::TimeSlow => 4000.0,
            AbilityKind::Overdrive => 5000.0,
            AbilityKind::HealPulse => 3000.0,
            _ => 0.0,
        }
    }

    /// Shop price in currency
    pub fn cost(self) -> u64 {
        match self {
            AbilityKind::DashBoost => 100,
            AbilityKind::ShieldPulse => 250,
            AbilityKind::TimeSlow => 350,
            AbilityKind::Overdrive => 300,
            AbilityKind::Nuke => 500,
            AbilityKind::HealPulse => 400,
            AbilityKind::BulletStorm => 450,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AbilityKind::DashBoost => "DASH STRIKE",
            AbilityKind::ShieldPulse => "SHIELD PULSE",
            AbilityKind::TimeSlow => "TIME SLOW",
            AbilityKind::Overdrive => "OVERDRIVE",
            AbilityKind::Nuke => "NUCLEAR CHARGE",
            AbilityKind::HealPulse => "HEALING PULSE",
            AbilityKind::BulletStorm => "BULLET STORM",
        }
    }
}

/// Per-run ability cooldown/effect-window state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityState {
    /// The equipped ability, if any (mutually exclusive by construction)
    pub selected: Option<AbilityKind>,
    pub cooldown_ms: f32,
    pub active_ms: f32,
    /// Fire rate snapshotted by overdrive, restored once when it expires
    saved_fire_rate: Option<f32>,
}

impl AbilityState {
    pub fn new(selected: Option<AbilityKind>) -> Self {
        Self {
            selected,
            cooldown_ms: 0.0,
            active_ms: 0.0,
            saved_fire_rate: None,
        }
    }

    /// True when firing the equipped ability is legal
    pub fn ready(&self) -> bool {
        self.selected.is_some() && self.cooldown_ms <= 0.0
    }

    /// Start the cooldown and effect window for a fired ability
    pub fn begin(&mut self, kind: AbilityKind) {
        self.cooldown_ms = kind.cooldown_ms();
        self.active_ms = kind.active_window_ms();
    }

    /// Record the fire rate overdrive is about to halve
    pub fn snapshot_fire_rate(&mut self, fire_rate_ms: f32) {
        self.saved_fire_rate = Some(fire_rate_ms);
    }

    /// Count down the cooldown and the effect window. When the window closes
    /// a pending overdrive snapshot is restored exactly once.
    pub fn tick(&mut self, dt: f32, player: &mut Player) {
        let ms = dt * 1000.0;
        if self.cooldown_ms > 0.0 {
            self.cooldown_ms = (self.cooldown_ms - ms).max(0.0);
        }
        if self.active_ms > 0.0 {
            self.active_ms -= ms;
            if self.active_ms <= 0.0 {
                self.active_ms = 0.0;
                if let Some(original) = self.saved_fire_rate.take() {
                    player.fire_rate_ms = original;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Modules, SkinId};

    #[test]
    fn test_unknown_id_parses_to_none() {
        assert_eq!(AbilityKind::from_id("orbital_laser"), None);
        assert_eq!(AbilityKind::from_id(""), None);
        assert_eq!(AbilityKind::from_id("nuke"), Some(AbilityKind::Nuke));
    }

    #[test]
    fn test_id_round_trip() {
        for kind in [
            AbilityKind::DashBoost,
            AbilityKind::ShieldPulse,
            AbilityKind::TimeSlow,
            AbilityKind::Overdrive,
            AbilityKind::Nuke,
            AbilityKind::HealPulse,
            AbilityKind::BulletStorm,
        ] {
            assert_eq!(AbilityKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn test_not_ready_while_cooling_down() {
        let mut st = AbilityState::new(Some(AbilityKind::Nuke));
        assert!(st.ready());
        st.begin(AbilityKind::Nuke);
        assert!(!st.ready());

        let mut player = Player::new(&Modules::default(), SkinId::Default);
        // 20 s cooldown, with a few ticks of slack for float accumulation
        for _ in 0..(20 * 60 + 5) {
            st.tick(1.0 / 60.0, &mut player);
        }
        assert!(st.ready());
    }

    #[test]
    fn test_overdrive_reverts_exactly_once() {
        let mut player = Player::new(&Modules::default(), SkinId::Default);
        let original = player.fire_rate_ms;
        let mut st = AbilityState::new(Some(AbilityKind::Overdrive));

        st.snapshot_fire_rate(player.fire_rate_ms);
        player.fire_rate_ms = (player.fire_rate_ms / 2.0).max(50.0);
        st.begin(AbilityKind::Overdrive);

        // Run well past the 5 s window
        for _ in 0..(8 * 60) {
            st.tick(1.0 / 60.0, &mut player);
        }
        assert_eq!(player.fire_rate_ms, original);

        // Later ticks must not restore again even if the player halves it
        player.fire_rate_ms = original / 2.0;
        for _ in 0..60 {
            st.tick(1.0 / 60.0, &mut player);
        }
        assert_eq!(player.fire_rate_ms, original / 2.0);
    }

    #[test]
    fn test_no_ability_is_never_ready() {
        let st = AbilityState::new(None);
        assert!(!st.ready());
    }
}

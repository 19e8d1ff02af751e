//! Level-up perk catalog, stacking rules and application
//!
//! Perks are either stackable (bounded by a per-perk cap) or one-time
//! (excluded from every offer after being taken). Application is monotonic
//! for the lifetime of a run: nothing a perk grants is ever reversed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::Player;

/// Stable perk identity. Registries key on this enum, never on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerkId {
    Hp,
    HpBig,
    Dmg,
    DmgBig,
    FireRate,
    FireRateBig,
    Speed,
    SpeedBig,
    Crit,
    CritBig,
    CritDamage,
    Multishot,
    TwinShot,
    Piercing,
    PiercingBig,
    Shield,
    ShieldBig,
    Lifesteal,
    LifestealBig,
    Regen,
    Armor,
    BulletSize,
    BulletSpeed,
    BulletLifetime,
    ExpMagnet,
    ExpBoost,
    ExpMultiplier,
    GoldBoost,
    DashCooldown,
    DashInvuln,
    Heal,
    Orbital,
    Explosion,
    Freeze,
    Poison,
    Chain,
    Reflect,
    Thorns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// A catalog row. `max_stacks` is `None` for one-time perks.
#[derive(Debug, Clone, Copy)]
pub struct PerkDef {
    pub id: PerkId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub one_time: bool,
    pub max_stacks: Option<u32>,
}

const fn stackable(
    id: PerkId,
    name: &'static str,
    description: &'static str,
    rarity: Rarity,
    max_stacks: u32,
) -> PerkDef {
    PerkDef {
        id,
        name,
        description,
        rarity,
        one_time: false,
        max_stacks: Some(max_stacks),
    }
}

const fn one_time(
    id: PerkId,
    name: &'static str,
    description: &'static str,
    rarity: Rarity,
) -> PerkDef {
    PerkDef {
        id,
        name,
        description,
        rarity,
        one_time: true,
        max_stacks: None,
    }
}

/// The full perk catalog, built once at compile time
pub static CATALOG: &[PerkDef] = &[
    stackable(PerkId::Hp, "+25 MAX HP", "Raises maximum health by 25", Rarity::Common, 10),
    stackable(PerkId::HpBig, "+50 MAX HP", "Raises maximum health by 50", Rarity::Uncommon, 5),
    stackable(PerkId::Dmg, "+5 DAMAGE", "Every bullet hits 5 harder", Rarity::Common, 20),
    stackable(PerkId::DmgBig, "+15 DAMAGE", "Every bullet hits 15 harder", Rarity::Uncommon, 10),
    stackable(PerkId::FireRate, "+15% FIRE RATE", "Shoot faster", Rarity::Common, 8),
    stackable(PerkId::FireRateBig, "+30% FIRE RATE", "Shoot much faster", Rarity::Rare, 4),
    stackable(PerkId::Speed, "+10% SPEED", "Move faster, dodge easier", Rarity::Common, 10),
    stackable(PerkId::SpeedBig, "+25% SPEED", "A big burst of movement speed", Rarity::Uncommon, 5),
    stackable(PerkId::Crit, "+5% CRIT CHANCE", "More critical hits", Rarity::Uncommon, 10),
    stackable(PerkId::CritBig, "+15% CRIT CHANCE", "Far more critical hits", Rarity::Rare, 5),
    stackable(PerkId::CritDamage, "+50% CRIT DAMAGE", "Critical hits strike much harder", Rarity::Epic, 3),
    stackable(PerkId::Multishot, "+1 SHOT", "Fire an extra parallel bullet", Rarity::Rare, 4),
    stackable(PerkId::TwinShot, "TWIN SHOT", "An extra bullet trails the main one", Rarity::Uncommon, 3),
    stackable(PerkId::Piercing, "+1 PIERCING", "Bullets pass through one more enemy", Rarity::Uncommon, 5),
    stackable(PerkId::PiercingBig, "+3 PIERCING", "Bullets drill through crowds", Rarity::Rare, 3),
    stackable(PerkId::Shield, "+50 SHIELD", "A barrier absorbs damage before health", Rarity::Common, 15),
    stackable(PerkId::ShieldBig, "+100 SHIELD", "A heavy barrier against attacks", Rarity::Uncommon, 8),
    stackable(PerkId::Lifesteal, "+10% LIFESTEAL", "Heal on every hit you land", Rarity::Uncommon, 5),
    stackable(PerkId::LifestealBig, "+25% LIFESTEAL", "Heavy lifesteal on every hit", Rarity::Rare, 2),
    stackable(PerkId::Regen, "REGEN +1 HP/s", "Slowly restore health over time", Rarity::Rare, 10),
    stackable(PerkId::Armor, "+20% ARMOR", "Reduce all incoming damage by 20%", Rarity::Epic, 3),
    stackable(PerkId::BulletSize, "+50% BULLET SIZE", "Bigger bullets, easier hits", Rarity::Common, 2),
    stackable(PerkId::BulletSpeed, "+30% BULLET SPEED", "Bullets fly faster and farther", Rarity::Common, 5),
    stackable(PerkId::BulletLifetime, "+50% RANGE", "Bullets travel much farther", Rarity::Common, 5),
    stackable(PerkId::ExpMagnet, "MAGNET +50%", "Exp crystals attract from farther away", Rarity::Uncommon, 5),
    stackable(PerkId::ExpBoost, "+25% EXP", "Earn more experience per crystal", Rarity::Uncommon, 5),
    stackable(PerkId::ExpMultiplier, "EXP x2", "Double all experience gained", Rarity::Rare, 1),
    stackable(PerkId::GoldBoost, "+50% CURRENCY", "Earn more coins after every run", Rarity::Uncommon, 3),
    stackable(PerkId::DashCooldown, "-30% DASH COOLDOWN", "Dash far more often", Rarity::Rare, 3),
    stackable(PerkId::DashInvuln, "+50% DASH IMMUNITY", "Stay untouchable longer while dashing", Rarity::Rare, 3),
    one_time(PerkId::Heal, "FULL RESTORE", "Immediately restore all HP and shield", Rarity::Epic),
    one_time(PerkId::Orbital, "ORBITAL GUARD", "Projectiles orbit you and strike nearby enemies", Rarity::Legendary),
    one_time(PerkId::Explosion, "EXPLOSIVE ROUNDS", "Every hit detonates around the target", Rarity::Legendary),
    one_time(PerkId::Freeze, "CRYO ROUNDS", "Hits freeze enemies in place", Rarity::Legendary),
    one_time(PerkId::Poison, "TOXIC ROUNDS", "Hits poison enemies: 15 damage/s for 3 s", Rarity::Legendary),
    one_time(PerkId::Chain, "CHAIN LIGHTNING", "Damage arcs to enemies near the target", Rarity::Legendary),
    one_time(PerkId::Reflect, "REFLECTION", "25% of damage taken returns to the attacker", Rarity::Legendary),
    one_time(PerkId::Thorns, "THORNS", "Enemies take 10 damage whenever they strike you", Rarity::Legendary),
];

pub fn def(id: PerkId) -> &'static PerkDef {
    CATALOG
        .iter()
        .find(|d| d.id == id)
        .expect("every PerkId has a catalog row")
}

/// Can this perk still be offered to the player? One-time perks already owned
/// and stackables at their cap are out; a handful of cross-cutting balance
/// caps apply on top of the per-perk caps.
fn offerable(player: &Player, d: &PerkDef) -> bool {
    if d.one_time && player.acquired_perks.contains(&d.id) {
        return false;
    }
    if let Some(cap) = d.max_stacks
        && player.stacks(d.id) >= cap
    {
        return false;
    }

    // Grouped stat counters: the big variant weighs more toward the shared cap
    let hp_stacks = player.stacks(PerkId::Hp) + 2 * player.stacks(PerkId::HpBig);
    let dmg_stacks = player.stacks(PerkId::Dmg) + 3 * player.stacks(PerkId::DmgBig);
    let speed_stacks = player.stacks(PerkId::Speed) + 2 * player.stacks(PerkId::SpeedBig);

    match d.id {
        PerkId::Hp => hp_stacks < 10 && player.max_hp < 600.0,
        PerkId::HpBig => hp_stacks < 8 && player.max_hp < 600.0,
        PerkId::Dmg => dmg_stacks < 8,
        PerkId::DmgBig => dmg_stacks < 6,
        PerkId::FireRate | PerkId::FireRateBig => player.fire_rate_ms > 75.0,
        PerkId::Speed | PerkId::SpeedBig => speed_stacks < 5,
        PerkId::Lifesteal | PerkId::LifestealBig => player.lifesteal < 0.70,
        PerkId::Multishot => player.multishot < 6,
        PerkId::TwinShot => player.twin_shot < 3,
        PerkId::ExpBoost | PerkId::ExpMultiplier => player.exp_multiplier < 4.0,
        PerkId::Armor => player.armor < 0.60,
        _ => true,
    }
}

/// Draw up to three distinct perks for a level-up screen
pub fn offer_perks<R: Rng>(rng: &mut R, player: &Player) -> Vec<PerkId> {
    let mut pool: Vec<PerkId> = CATALOG
        .iter()
        .filter(|d| offerable(player, d))
        .map(|d| d.id)
        .collect();

    let mut offer = Vec::with_capacity(3);
    while offer.len() < 3 && !pool.is_empty() {
        let idx = rng.random_range(0..pool.len());
        offer.push(pool.swap_remove(idx));
    }
    offer
}

/// Apply a perk to the player. Never reversed; absolute clamps hold no matter
/// how the perk was obtained.
pub fn apply_perk(player: &mut Player, id: PerkId) {
    player.acquired_perks.insert(id);
    if let Some(cap) = def(id).max_stacks {
        let stacks = player.perk_stacks.entry(id).or_insert(0);
        *stacks = (*stacks + 1).min(cap);
    }

    match id {
        PerkId::Hp => {
            player.max_hp += 25.0;
            player.hp += 25.0;
        }
        PerkId::HpBig => {
            player.max_hp += 50.0;
            player.hp += 50.0;
        }
        PerkId::Dmg => player.dmg += 5.0,
        PerkId::DmgBig => player.dmg += 15.0,
        PerkId::FireRate => player.fire_rate_ms = (player.fire_rate_ms * 0.85).max(50.0),
        PerkId::FireRateBig => player.fire_rate_ms = (player.fire_rate_ms * 0.70).max(50.0),
        PerkId::Speed => player.speed *= 1.1,
        PerkId::SpeedBig => player.speed *= 1.25,
        PerkId::Crit => player.crit_chance = (player.crit_chance + 0.05).min(0.95),
        PerkId::CritBig => player.crit_chance = (player.crit_chance + 0.15).min(0.95),
        PerkId::CritDamage => player.crit_multiplier += 0.5,
        PerkId::Multishot => player.multishot = (player.multishot + 1).min(6),
        PerkId::TwinShot => player.twin_shot = (player.twin_shot + 1).min(3),
        PerkId::Piercing => player.piercing += 1,
        PerkId::PiercingBig => player.piercing += 3,
        PerkId::Shield => player.add_shield(50.0),
        PerkId::ShieldBig => player.add_shield(100.0),
        PerkId::Lifesteal => player.lifesteal = (player.lifesteal + 0.10).min(0.75),
        PerkId::LifestealBig => player.lifesteal = (player.lifesteal + 0.25).min(0.75),
        PerkId::Regen => player.regen += 1.0,
        PerkId::Armor => player.armor = (player.armor + 0.2).min(0.75),
        PerkId::BulletSize => player.bullet_size *= 1.5,
        PerkId::BulletSpeed => player.bullet_speed *= 1.3,
        PerkId::BulletLifetime => player.bullet_lifetime_ms *= 1.5,
        PerkId::ExpMagnet => player.exp_magnet_radius *= 1.5,
        PerkId::ExpBoost => player.exp_multiplier *= 1.25,
        PerkId::ExpMultiplier => player.exp_multiplier *= 2.0,
        PerkId::GoldBoost => player.gold_multiplier *= 1.5,
        PerkId::DashCooldown => player.dash_cooldown_mult *= 0.7,
        PerkId::DashInvuln => player.dash_invuln_ms *= 1.5,
        PerkId::Heal => {
            player.hp = player.max_hp;
            player.shield = player.max_shield;
        }
        PerkId::Orbital => player.orbital_bullets += 3,
        PerkId::Explosion => player.explosive_bullets = true,
        PerkId::Freeze => player.freeze_bullets = true,
        PerkId::Poison => player.poison_bullets = true,
        PerkId::Chain => player.chain_lightning += 2,
        PerkId::Reflect => player.reflect_damage = (player.reflect_damage + 0.25).min(0.5),
        PerkId::Thorns => player.thorns_damage += 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Modules, SkinId};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player() -> Player {
        Player::new(&Modules::default(), SkinId::Default)
    }

    #[test]
    fn test_one_time_perks_leave_the_pool() {
        let mut p = player();
        let mut rng = Pcg32::seed_from_u64(1);
        apply_perk(&mut p, PerkId::Orbital);
        for _ in 0..100 {
            let offer = offer_perks(&mut rng, &p);
            assert!(!offer.contains(&PerkId::Orbital));
        }
    }

    #[test]
    fn test_offer_has_three_distinct_perks() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p = player();
        for _ in 0..50 {
            let offer = offer_perks(&mut rng, &p);
            assert_eq!(offer.len(), 3);
            assert_ne!(offer[0], offer[1]);
            assert_ne!(offer[1], offer[2]);
            assert_ne!(offer[0], offer[2]);
        }
    }

    #[test]
    fn test_fire_rate_floor_excludes_perks() {
        let mut p = player();
        p.fire_rate_ms = 75.0;
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..100 {
            let offer = offer_perks(&mut rng, &p);
            assert!(!offer.contains(&PerkId::FireRate));
            assert!(!offer.contains(&PerkId::FireRateBig));
        }
    }

    #[test]
    fn test_fire_rate_never_drops_below_floor() {
        let mut p = player();
        for _ in 0..30 {
            apply_perk(&mut p, PerkId::FireRateBig);
        }
        assert!(p.fire_rate_ms >= 50.0);
    }

    #[test]
    fn test_heal_restores_everything() {
        let mut p = player();
        p.add_shield(100.0);
        p.hp = 10.0;
        p.shield = 0.0;
        apply_perk(&mut p, PerkId::Heal);
        assert_eq!(p.hp, p.max_hp);
        assert_eq!(p.shield, p.max_shield);
    }

    #[test]
    fn test_capped_stackable_leaves_the_pool() {
        let mut p = player();
        p.perk_stacks.insert(PerkId::BulletSize, 2); // cap is 2
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..100 {
            assert!(!offer_perks(&mut rng, &p).contains(&PerkId::BulletSize));
        }
    }

    #[test]
    fn test_armor_cap_excludes_offer_and_clamps_apply() {
        let mut p = player();
        for _ in 0..10 {
            apply_perk(&mut p, PerkId::Armor);
        }
        assert!(p.armor <= 0.75);
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            assert!(!offer_perks(&mut rng, &p).contains(&PerkId::Armor));
        }
    }

    proptest! {
        /// No sequence of perk applications ever busts an absolute cap
        #[test]
        fn prop_caps_hold_under_any_sequence(indices in proptest::collection::vec(0usize..CATALOG.len(), 0..200)) {
            let mut p = player();
            for i in indices {
                apply_perk(&mut p, CATALOG[i].id);
            }
            prop_assert!(p.crit_chance <= 0.95);
            prop_assert!(p.lifesteal <= 0.75);
            prop_assert!(p.armor <= 0.75);
            prop_assert!(p.reflect_damage <= 0.5);
            prop_assert!(p.fire_rate_ms >= 50.0);
            prop_assert!(p.multishot <= 6);
            prop_assert!(p.twin_shot <= 3);
            for d in CATALOG {
                if let Some(cap) = d.max_stacks {
                    prop_assert!(p.stacks(d.id) <= cap);
                }
            }
        }

        /// Offers never include a perk whose stack counter is at its cap
        #[test]
        fn prop_offers_respect_stack_caps(seed in 0u64..1000) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut p = player();
            // Take a long random walk of offered perks
            for _ in 0..60 {
                let offer = offer_perks(&mut rng, &p);
                for id in &offer {
                    let d = def(*id);
                    if let Some(cap) = d.max_stacks {
                        prop_assert!(p.stacks(*id) < cap);
                    } else {
                        prop_assert!(!p.acquired_perks.contains(id));
                    }
                }
                if let Some(first) = offer.first() {
                    apply_perk(&mut p, *first);
                }
            }
        }
    }
}

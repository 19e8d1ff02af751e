//! Collision detection and damage resolution
//!
//! Runs once per tick in a fixed order so compound effects resolve the same
//! way every time: bullets vs enemies (with on-hit status fan-out, chain
//! lightning and explosions), orbital pulses, enemy contact, the ranged-enemy
//! sub-engine, enemy projectiles, then aura ticks. Every pass mutates the
//! stores it iterates, so hits are applied through indices against a swept
//! store and dead enemies are removed between passes; secondary effects
//! re-check liveness before touching a target.

use glam::Vec2;
use rand::Rng;

use super::enemy::{AuraKind, EnemyKind};
use super::projectile::{EnemyProjectile, EnemyShotKind};
use super::state::{GameEvent, RunPhase, RunState, SoundCue};
use crate::consts::*;
use crate::vec_from_angle;

/// Resolve one tick of combat. Order is part of the contract.
pub(crate) fn resolve(state: &mut RunState, dt: f32) {
    bullets_vs_enemies(state);
    orbital_pulses(state);
    enemy_contact(state);
    if state.phase == RunPhase::GameOver {
        return;
    }
    ranged_attacks(state);
    update_enemy_shots(state, dt);
    if state.phase == RunPhase::GameOver {
        return;
    }
    aura_ticks(state);
}

/// Bullet vs enemy pass. Squared-distance test against
/// `(enemy.size + bullet.size * scale)^2`; on a lethal hit the kill is
/// credited by the sweep, on a non-lethal hit the player's global bullet
/// effects fan out onto the target.
fn bullets_vs_enemies(state: &mut RunState) {
    let mut bi = 0;
    'bullet: while bi < state.bullets.len() {
        let bpos = state.bullets[bi].pos;
        let bsize = state.bullets[bi].size;
        let bdmg = state.bullets[bi].dmg;

        let mut ei = 0;
        while ei < state.enemies.len() {
            let lethal = {
                let enemy = &mut state.enemies[ei];
                if !enemy.alive() || enemy.phasing() {
                    ei += 1;
                    continue;
                }
                let radius = enemy.size + bsize * BULLET_HIT_SCALE;
                if bpos.distance_squared(enemy.pos) >= radius * radius {
                    ei += 1;
                    continue;
                }
                enemy.take_damage(bdmg)
            };

            if lethal {
                if state.player.lifesteal > 0.0 {
                    let heal = bdmg * state.player.lifesteal;
                    state.player.heal(heal);
                }
            } else {
                if state.rng.random_bool(0.2) {
                    state.push_event(GameEvent::Sound(SoundCue::EnemyHit));
                }
                apply_on_hit_effects(state, ei, bdmg);
            }

            if state.bullets[bi].register_hit() {
                state.bullets.swap_remove(bi);
                continue 'bullet;
            }
            ei += 1;
        }
        bi += 1;
    }
    state.sweep_dead_enemies();
}

/// Global perk effects applied to a surviving hit target: slow, poison,
/// freeze, then the area effects (chain lightning, explosion).
fn apply_on_hit_effects(state: &mut RunState, struck: usize, bullet_dmg: f32) {
    let struck_pos = state.enemies[struck].pos;
    {
        let status = &mut state.enemies[struck].status;
        if state.player.slow_bullets {
            status.apply_slow(0.6, 2000.0);
        }
        if state.player.poison_bullets {
            status.poison_dps = 15.0;
            status.poison_ms = 3000.0;
        }
        if state.player.freeze_bullets {
            status.frozen_ms = 2000.0;
        }
    }

    if state.player.chain_lightning > 0 {
        chain_lightning(state, struck, struck_pos, bullet_dmg);
    }
    if state.player.explosive_bullets {
        explode_at(
            state,
            Some(struck),
            struck_pos,
            EXPLOSION_RADIUS,
            (bullet_dmg * EXPLOSION_DAMAGE_FACTOR).max(EXPLOSION_MIN_DAMAGE),
        );
        state.push_event(GameEvent::Sound(SoundCue::Explosion));
    }
}

/// Arc to the closest enemies around the struck one: gather everything
/// within range, sort ascending by distance and hit up to `chain_lightning`
/// of them for a fraction of the bullet's damage.
fn chain_lightning(state: &mut RunState, struck: usize, struck_pos: Vec2, bullet_dmg: f32) {
    let mut targets: Vec<(usize, f32)> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(i, e)| *i != struck && e.alive() && !e.phasing())
        .map(|(i, e)| (i, e.pos.distance_squared(struck_pos)))
        .filter(|(_, d2)| *d2 < CHAIN_RADIUS * CHAIN_RADIUS)
        .collect();
    targets.sort_by(|a, b| a.1.total_cmp(&b.1));

    let jumps = state.player.chain_lightning as usize;
    let arc_dmg = bullet_dmg * CHAIN_DAMAGE_FACTOR;
    for (idx, _) in targets.into_iter().take(jumps) {
        let enemy = &mut state.enemies[idx];
        // A closer arc may have already killed this one
        if !enemy.alive() {
            continue;
        }
        enemy.status.chain_mark_ms = CHAIN_MARK_MS;
        enemy.take_damage(arc_dmg);
    }
}

/// Area damage around a point, optionally excluding the directly-hit enemy
fn explode_at(state: &mut RunState, exclude: Option<usize>, center: Vec2, radius: f32, dmg: f32) {
    for (i, enemy) in state.enemies.iter_mut().enumerate() {
        if Some(i) == exclude || !enemy.alive() {
            continue;
        }
        if enemy.pos.distance_squared(center) < radius * radius {
            enemy.take_damage(dmg);
        }
    }
}

/// Orbital projectiles: N points rotating around the player with the
/// simulation clock. Each enemy can be struck at most once per 400 ms,
/// tracked by a last-hit map keyed on enemy id.
fn orbital_pulses(state: &mut RunState) {
    let orbitals = state.player.orbital_bullets;
    if orbitals == 0 {
        return;
    }

    let orb_dmg = (state.player.dmg * ORBITAL_DAMAGE_FACTOR).max(ORBITAL_MIN_DAMAGE);
    let base_angle = (state.time_ms / 1000.0) as f32;
    for i in 0..orbitals {
        let angle = base_angle + i as f32 * (std::f32::consts::TAU / orbitals as f32);
        let orb_pos = state.player.pos + vec_from_angle(angle) * ORBITAL_RADIUS;

        for enemy in state.enemies.iter_mut() {
            if !enemy.alive() || enemy.phasing() {
                continue;
            }
            let radius = enemy.size + ORBITAL_HIT_SLACK;
            if orb_pos.distance_squared(enemy.pos) >= radius * radius {
                continue;
            }
            let last_hit = state.orbital_hits.get(&enemy.id).copied();
            let gate_open = last_hit
                .map(|t| state.time_ms - t > ORBITAL_HIT_INTERVAL_MS)
                .unwrap_or(true);
            if gate_open {
                state.orbital_hits.insert(enemy.id, state.time_ms);
                enemy.take_damage(orb_dmg);
            }
        }
    }
    state.sweep_dead_enemies();
}

/// Enemy vs player contact: lethal damage ends the run; otherwise thorns,
/// reflect and leech healing resolve, and an open dash-strike window turns
/// the collision back on the enemy.
fn enemy_contact(state: &mut RunState) {
    let player_pos = state.player.pos;
    let player_size = state.player.size;

    for ei in 0..state.enemies.len() {
        let (epos, esize, edmg, leech) = {
            let e = &state.enemies[ei];
            if !e.alive() {
                continue;
            }
            (e.pos, e.size, e.effective_damage(), e.leech_heal)
        };
        let radius = esize + player_size;
        if epos.distance_squared(player_pos) >= radius * radius {
            continue;
        }

        if state.player.dash_striking() {
            state.enemies[ei].take_damage(DASH_STRIKE_DAMAGE);
        }

        let was_vulnerable = state.player.invulnerable_ms <= 0.0;
        if state.player.take_damage(edmg) {
            state.game_over();
            return;
        }
        if was_vulnerable {
            state.no_damage_wave = false;
            state.push_event(GameEvent::Sound(SoundCue::PlayerHit));
        }

        // Contact side effects fire whether or not the hit connected
        if leech > 0.0 {
            let e = &mut state.enemies[ei];
            e.hp = (e.hp + leech).min(e.max_hp);
        }
        if state.player.thorns_damage > 0.0 {
            let thorns = state.player.thorns_damage;
            state.enemies[ei].take_damage(thorns);
        }
        if state.player.reflect_damage > 0.0 {
            let reflected = edmg * state.player.reflect_damage;
            state.enemies[ei].take_damage(reflected);
        }
    }
    state.sweep_dead_enemies();
}

/// Ranged-enemy firing. Aim is lead-predicted from the player's current
/// motion: `aim = player.pos + motion * (distance / shot_speed) * lead`.
/// The cooldown restarts after every attempt, in or out of range.
fn ranged_attacks(state: &mut RunState) {
    let player_pos = state.player.pos;
    let player_motion = state.player.motion;

    let mut shots: Vec<EnemyProjectile> = Vec::new();
    for enemy in state.enemies.iter_mut() {
        if !enemy.alive() {
            continue;
        }
        let epos = enemy.pos;
        let edmg = enemy.dmg;
        let ecolor = enemy.color;
        let ekind = enemy.kind;
        let Some(ranged) = enemy.ranged.as_mut() else {
            continue;
        };
        if ranged.cooldown_ms > 0.0 {
            continue;
        }
        ranged.cooldown_ms = ranged.interval_ms;

        let to_player = player_pos - epos;
        let dist = to_player.length();
        if dist >= ranged.fire_range || dist == 0.0 {
            continue;
        }

        let shot_kind = match ekind {
            EnemyKind::Sniper => EnemyShotKind::Sniper,
            EnemyKind::Lancer => EnemyShotKind::Lancer,
            EnemyKind::Mortar => EnemyShotKind::Mortar,
            _ => EnemyShotKind::Ranger,
        };

        // Extrapolate the player's position over the shot's travel time
        let lead = player_motion * (dist / ranged.shot_speed) * ranged.lead_factor;
        let mut aim = (player_pos + lead) - epos;
        if aim.length_squared() == 0.0 {
            aim = to_player;
        }
        let base_angle = aim.y.atan2(aim.x);

        for si in 0..ranged.volley {
            let spread = (si as i32 - (ranged.volley / 2) as i32) as f32 * 12f32.to_radians();
            shots.push(EnemyProjectile {
                kind: shot_kind,
                pos: epos,
                vel: vec_from_angle(base_angle + spread) * ranged.shot_speed,
                dmg: edmg,
                size: ranged.shot_size,
                color: if shot_kind == EnemyShotKind::Mortar {
                    [255, 140, 0]
                } else {
                    ecolor
                },
                spawn_ms: state.time_ms,
                lifetime_ms: ranged.shot_lifetime_ms,
                armor_pierce: ranged.armor_pierce,
                piercing: ranged.piercing,
                target: (shot_kind == EnemyShotKind::Mortar).then_some(player_pos),
            });
        }
    }
    state.enemy_shots.append(&mut shots);
}

/// Integrate enemy projectiles and resolve their terminal behaviour: direct
/// player hits for most kinds, delayed AoE detonation at the recorded target
/// for mortar shells.
fn update_enemy_shots(state: &mut RunState, dt: f32) {
    let mut i = 0;
    while i < state.enemy_shots.len() {
        state.enemy_shots[i].advance(dt);
        let shot = &state.enemy_shots[i];

        if shot.expired(state.time_ms) {
            let detonation = (shot.kind == EnemyShotKind::Mortar)
                .then_some((shot.target.unwrap_or(shot.pos), shot.dmg));
            state.enemy_shots.swap_remove(i);
            if let Some((target, dmg)) = detonation {
                state.push_event(GameEvent::Sound(SoundCue::Explosion));
                let blast = MORTAR_BLAST_RADIUS;
                if state.player.pos.distance_squared(target) < blast * blast {
                    state.no_damage_wave = false;
                    if state.player.take_damage(dmg) {
                        state.game_over();
                        return;
                    }
                }
            }
            continue;
        }

        if shot.kind != EnemyShotKind::Mortar {
            let radius = state.player.size + shot.size;
            if shot.pos.distance_squared(state.player.pos) < radius * radius {
                let (dmg, pierce_invuln, survives) = (shot.dmg, shot.armor_pierce, shot.piercing);
                let was_vulnerable = state.player.invulnerable_ms <= 0.0;

                let lethal = if pierce_invuln && !was_vulnerable {
                    state.player.take_piercing_damage(dmg)
                } else {
                    state.player.take_damage(dmg)
                };
                if lethal {
                    state.game_over();
                    return;
                }
                if was_vulnerable || pierce_invuln {
                    state.no_damage_wave = false;
                    state.push_event(GameEvent::Sound(SoundCue::PlayerHit));
                }
                if !survives {
                    state.enemy_shots.swap_remove(i);
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Support auras on their own interval timers: shielders grant a capped
/// shield-buff pool, healers restore hp, buffers hand out a timed
/// speed+damage buff. Independent of the collision passes.
fn aura_ticks(state: &mut RunState) {
    let count = state.enemies.len();
    for i in 0..count {
        let (center, kind, radius, power) = {
            let e = &mut state.enemies[i];
            if !e.alive() {
                continue;
            }
            let Some(aura) = e.aura.as_mut() else {
                continue;
            };
            if aura.timer_ms > 0.0 {
                continue;
            }
            aura.timer_ms = aura.interval_ms;
            (e.pos, aura.kind, aura.radius, aura.power)
        };

        for j in 0..count {
            if j == i {
                continue;
            }
            let ally = &mut state.enemies[j];
            if !ally.alive() || ally.pos.distance_squared(center) >= radius * radius {
                continue;
            }
            match kind {
                AuraKind::Shield => {
                    if ally.kind != EnemyKind::Shielder {
                        ally.status.shield_buff =
                            (ally.status.shield_buff + power).min(SHIELD_BUFF_CAP);
                    }
                }
                AuraKind::Heal => ally.hp = (ally.hp + power).min(ally.max_hp),
                AuraKind::Buff => ally.status.buff_ms = 2000.0,
            }
        }
    }
}

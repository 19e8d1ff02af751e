//! Headless demo run
//!
//! Drives the simulation core at a fixed 60 Hz with scripted input for a few
//! in-game minutes and prints the final run summary as JSON. Useful for
//! eyeballing balance changes and for profiling without a renderer.

use glam::Vec2;

use cyber_survivor::consts::BASE_STEP_HZ;
use cyber_survivor::sim::{self, GameEvent, RunPhase, RunState, TickInput};
use cyber_survivor::{Profile, RunConfig};

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let mut state = RunState::new(Profile::default(), RunConfig::default(), seed);
    log::info!("demo run, seed {seed}");

    let dt = 1.0 / BASE_STEP_HZ;
    let max_ticks = (BASE_STEP_HZ as usize) * 60 * 5;

    for i in 0..max_ticks {
        // Strafe in a slow circle, always firing toward the nearest enemy
        let t = i as f32 * dt * 0.4;
        let aim = state
            .enemies
            .iter()
            .min_by(|a, b| {
                let da = a.pos.distance_squared(state.player.pos);
                let db = b.pos.distance_squared(state.player.pos);
                da.total_cmp(&db)
            })
            .map(|e| e.pos - state.player.pos)
            .unwrap_or(Vec2::X);
        let input = TickInput {
            move_dir: Vec2::new(t.cos(), t.sin()),
            aim,
            fire: true,
            dash: i % 240 == 0,
            ability: i % 600 == 0,
            // Always take the first perk on level-up
            perk_choice: (state.phase == RunPhase::LevelUp).then_some(0),
        };
        sim::tick(&mut state, &input, dt);

        for event in state.drain_events() {
            match event {
                GameEvent::WaveStarted { wave } => log::info!("wave {wave} started"),
                GameEvent::WaveCompleted { wave } => log::info!("wave {wave} cleared"),
                GameEvent::AchievementUnlocked { id, reward } => {
                    log::info!("unlocked {id:?} (+{reward})");
                }
                GameEvent::GameOver(summary) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary).expect("summary serializes")
                    );
                    return;
                }
                _ => {}
            }
        }
    }

    // Survived the whole script: print the snapshot instead
    println!(
        "{}",
        serde_json::to_string_pretty(&state.snapshot()).expect("snapshot serializes")
    );
}

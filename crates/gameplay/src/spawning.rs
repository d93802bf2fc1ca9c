//! Random drops along the top of the container.
//!
//! Drops go through the command queue like any other spawn. The RNG is seeded from `RngSeed`
//! so tests get a reproducible layout.

use bevy::prelude::*;
use mb_config::GameConfig;
use mb_core::{GameConfigRes, RngSeed};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::commands::{SimCommand, SimCommandQueue};

const LOG_TARGET: &str = "spawning";

/// Keeps drop sequences independent of other consumers of the same seed.
const DROP_STREAM: u64 = 0x6d62_6472_6f70_0001;

/// RNG shared by the startup drop and the keyboard drop.
#[derive(Resource, Debug)]
pub struct DropRng(pub StdRng);

impl DropRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed ^ DROP_STREAM))
    }
}

/// Uniform x across the container (inside the margin), y just below the top edge.
pub fn random_drop_position(rng: &mut impl Rng, cfg: &GameConfig) -> Vec2 {
    let margin = cfg.spawn.drop_margin.max(cfg.balls.radius);
    let half_w = (cfg.window.width * 0.5 - margin).max(0.0);
    let x = if half_w > 0.0 {
        rng.gen_range(-half_w..=half_w)
    } else {
        0.0
    };
    Vec2::new(x, cfg.window.height * 0.5 - margin)
}

/// Startup: seed `DropRng` and queue `spawn.initial_drop` balls.
pub fn enqueue_initial_drop(
    mut commands: Commands,
    mut queue: ResMut<SimCommandQueue>,
    cfg: Res<GameConfigRes>,
    seed: Option<Res<RngSeed>>,
) {
    let seed = seed.map(|s| s.0).unwrap_or_default();
    let mut rng = DropRng::from_seed(seed);
    let count = cfg.0.spawn.initial_drop;
    for _ in 0..count {
        let position = random_drop_position(&mut rng.0, &cfg.0);
        queue.push(SimCommand::Spawn { position });
    }
    if count > 0 {
        info!(target: LOG_TARGET, count, seed, "initial drop queued");
    }
    commands.insert_resource(rng);
}

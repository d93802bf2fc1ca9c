//! Rapier integration: plugin setup, configured gravity, the static container, and the
//! `BodyWorld` backend used by gameplay.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use mb_core::GameConfigRes;

pub mod boundaries;
pub mod rapier_bodies;

pub use boundaries::{boundary_layout, build_boundaries, setup_boundaries};
pub use rapier_bodies::{BallMaterial, BodyQueryData, RapierBodies};

pub const PIXELS_PER_METER: f32 = 100.0;

const LOG_TARGET: &str = "physics";

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfigRes>()
            .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(PIXELS_PER_METER))
            .add_systems(Startup, setup_boundaries)
            .add_systems(Update, apply_configured_gravity);
    }
}

/// Rapier spawns its configuration with the default context; overwrite gravity once it appears.
fn apply_configured_gravity(
    mut configs: Query<&mut RapierConfiguration, Added<RapierConfiguration>>,
    cfg: Res<GameConfigRes>,
) {
    for mut rapier_cfg in &mut configs {
        rapier_cfg.gravity = Vec2::new(0.0, cfg.0.gravity.y);
        info!(target: LOG_TARGET, gravity = cfg.0.gravity.y, "rapier gravity configured");
    }
}

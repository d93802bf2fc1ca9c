// Core crate: shared components, resources, events and system set labels.
// Engine-agnostic pieces (body tags, the `BodyWorld` seam, the tracking collection) live here so
// physics and gameplay crates compile against stable names.

use bevy::prelude::*;

pub mod bodies;
pub mod tracking;

pub use bodies::{
    BallSpawn, BallState, BodyTag, BodyWorld, BoundarySide, BoundarySpawn, Generation,
    MemoryBodies,
};
pub use tracking::{tracking_mismatch, verify_live_balls, LiveBalls, MergeStats};

/// Marker component identifying a ball entity (holds physics body & collider).
#[derive(Component, Debug)]
pub struct Ball;

/// Logical radius used both for the collider and rendering scale.
#[derive(Component, Debug, Deref, DerefMut, Copy, Clone, PartialEq)]
pub struct BallRadius(pub f32);

/// Deterministic RNG seed resource (set once at startup / tests for reproducible drops).
#[derive(Resource, Debug, Copy, Clone, Default)]
pub struct RngSeed(pub u64);

// Wrapper Bevy resource for the pure-data GameConfig (keeps mb_config free of bevy dependency).
#[derive(Resource, Debug, Clone, Default)]
pub struct GameConfigRes(pub mb_config::GameConfig);

/// A ball entered the world (user spawn or random drop; merges report `BallsMerged`).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BallSpawned {
    pub entity: Entity,
    pub generation: Generation,
    pub position: Vec2,
}

/// Two same-generation balls were replaced by `child`.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BallsMerged {
    pub parents: [Entity; 2],
    pub child: Entity,
    pub generation: Generation,
    pub radius: f32,
    pub position: Vec2,
}

/// Update ordering: producers enqueue simulation commands, a single consumer applies them.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SimSet {
    Collect,
    Apply,
}

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, (SimSet::Collect, SimSet::Apply).chain())
            .init_resource::<LiveBalls>()
            .init_resource::<MergeStats>()
            .add_event::<BallSpawned>()
            .add_event::<BallsMerged>()
            .add_systems(Last, verify_live_balls);
    }
}

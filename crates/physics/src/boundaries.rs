//! Static container: a floor inset from the bottom edge and two full-height side walls.
//!
//! Coordinates are centred on the container with y pointing up, so the bottom edge sits at
//! `-height / 2` and the side walls straddle `x = ±width / 2`.

use bevy::prelude::*;
use mb_config::ArenaConfig;
use mb_core::{BodyWorld, BoundarySide, BoundarySpawn, GameConfigRes};

use crate::rapier_bodies::RapierBodies;

const LOG_TARGET: &str = "arena";

/// Geometry of the three boundary bodies for a `width` x `height` container.
pub fn boundary_layout(width: f32, height: f32, arena: &ArenaConfig) -> [BoundarySpawn; 3] {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    [
        BoundarySpawn {
            side: BoundarySide::Floor,
            center: Vec2::new(0.0, -half_h + arena.floor_inset),
            half_extents: Vec2::new(half_w, arena.floor_thickness * 0.5),
        },
        BoundarySpawn {
            side: BoundarySide::RightWall,
            center: Vec2::new(half_w, 0.0),
            half_extents: Vec2::new(arena.wall_thickness * 0.5, half_h),
        },
        BoundarySpawn {
            side: BoundarySide::LeftWall,
            center: Vec2::new(-half_w, 0.0),
            half_extents: Vec2::new(arena.wall_thickness * 0.5, half_h),
        },
    ]
}

/// Insert the floor and both walls. Call exactly once per world; a second call duplicates them.
pub fn build_boundaries<W: BodyWorld>(
    world: &mut W,
    width: f32,
    height: f32,
    arena: &ArenaConfig,
) -> [Entity; 3] {
    boundary_layout(width, height, arena).map(|spawn| world.spawn_boundary(spawn))
}

/// Startup system: build the container from `GameConfigRes`.
pub fn setup_boundaries(mut bodies: RapierBodies, cfg: Res<GameConfigRes>) {
    let c = &cfg.0;
    let spawned = build_boundaries(&mut bodies, c.window.width, c.window.height, &c.arena);
    info!(
        target: LOG_TARGET,
        ?spawned,
        width = c.window.width,
        height = c.window.height,
        "arena boundaries built"
    );
}

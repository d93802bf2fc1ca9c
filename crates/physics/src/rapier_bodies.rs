use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use mb_config::BallConfig;
use mb_core::{
    Ball, BallRadius, BallSpawn, BallState, BodyTag, BodyWorld, BoundarySpawn, GameConfigRes,
};
use std::collections::{HashMap, HashSet};

const LOG_TARGET: &str = "bodies";

/// Read-only view of every tagged body.
pub type BodyQueryData = (
    &'static BodyTag,
    &'static Transform,
    Option<&'static Velocity>,
    Option<&'static BallRadius>,
);

/// Material shared by spawned and merged balls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
}

impl BallMaterial {
    pub fn from_config(cfg: &BallConfig) -> Self {
        Self {
            restitution: cfg.restitution,
            friction: cfg.friction,
            linear_damping: cfg.linear_damping.max(0.0),
        }
    }
}

/// A body spawned during the current drain, not yet visible to the query.
#[derive(Debug, Clone, Copy)]
struct PendingBody {
    tag: BodyTag,
    ball: Option<BallState>,
}

/// `BodyWorld` backed by Rapier components.
///
/// Mutations go through deferred `Commands`, so within one system run the query lags behind:
/// bodies spawned here are not in it yet, and bodies despawned here still are. Both are tracked
/// locally (pending and retired) so reads and despawns see the effect of earlier commands in the
/// same run. Call [`RapierBodies::begin_drain`] once at the start of each system run.
#[derive(SystemParam)]
pub struct RapierBodies<'w, 's> {
    commands: Commands<'w, 's>,
    bodies: Query<'w, 's, BodyQueryData>,
    config: Res<'w, GameConfigRes>,
    pending: Local<'s, HashMap<Entity, PendingBody>>,
    retired: Local<'s, HashSet<Entity>>,
}

impl RapierBodies<'_, '_> {
    pub fn begin_drain(&mut self) {
        self.pending.clear();
        self.retired.clear();
    }

    pub fn material(&self) -> BallMaterial {
        BallMaterial::from_config(&self.config.0.balls)
    }

    fn queried(&self, body: Entity) -> Option<(&BodyTag, &Transform, Option<&Velocity>, Option<&BallRadius>)> {
        if self.retired.contains(&body) {
            return None;
        }
        self.bodies.get(body).ok()
    }
}

impl BodyWorld for RapierBodies<'_, '_> {
    fn tag(&self, body: Entity) -> Option<BodyTag> {
        if let Some(p) = self.pending.get(&body) {
            return Some(p.tag);
        }
        self.queried(body).map(|(tag, ..)| *tag)
    }

    fn ball_state(&self, body: Entity) -> Option<BallState> {
        if let Some(p) = self.pending.get(&body) {
            return p.ball;
        }
        let (tag, transform, velocity, radius) = self.queried(body)?;
        tag.generation()?;
        Some(BallState {
            position: transform.translation.truncate(),
            velocity: velocity?.linvel,
            radius: radius?.0,
        })
    }

    fn spawn_ball(&mut self, spawn: BallSpawn) -> Entity {
        let m = self.material();
        let tag = BodyTag::Ball(spawn.generation);
        let entity = self
            .commands
            .spawn((
                Name::new(format!("Ball {}", spawn.generation)),
                Ball,
                BallRadius(spawn.radius),
                tag,
                Transform::from_translation(spawn.position.extend(0.0)),
                RigidBody::Dynamic,
                Collider::ball(spawn.radius),
                Velocity::linear(spawn.velocity),
                Restitution::coefficient(m.restitution),
                Friction::coefficient(m.friction),
                Damping {
                    linear_damping: m.linear_damping,
                    angular_damping: 0.0,
                },
                ActiveEvents::COLLISION_EVENTS,
            ))
            .id();
        let ball = BallState {
            position: spawn.position,
            velocity: spawn.velocity,
            radius: spawn.radius,
        };
        self.pending.insert(entity, PendingBody { tag, ball: Some(ball) });
        entity
    }

    fn spawn_boundary(&mut self, spawn: BoundarySpawn) -> Entity {
        let tag = BodyTag::Boundary(spawn.side);
        let entity = self
            .commands
            .spawn((
                Name::new(spawn.side.name()),
                tag,
                RigidBody::Fixed,
                Collider::cuboid(spawn.half_extents.x, spawn.half_extents.y),
                Transform::from_translation(spawn.center.extend(0.0)),
            ))
            .id();
        self.pending.insert(entity, PendingBody { tag, ball: None });
        entity
    }

    fn despawn(&mut self, body: Entity) -> bool {
        let known = self.pending.remove(&body).is_some() || self.queried(body).is_some();
        if !known {
            warn!(target: LOG_TARGET, "despawn of unknown or retired body {body:?} ignored");
            return false;
        }
        self.commands.entity(body).despawn();
        self.retired.insert(body);
        true
    }
}

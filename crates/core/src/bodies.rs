//! Body identity and the narrow interface the gameplay layer uses to talk to a physics backend.
//!
//! Every body carries a [`BodyTag`] attached at creation time. Collision classification reads
//! only this tag; nothing parses names or labels.

use bevy::prelude::*;
use std::fmt;

/// How many merges produced a ball's area lineage. Starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u32);

impl Generation {
    pub const FIRST: Self = Self(1);

    /// `None` for 0; generations are strictly positive.
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    Floor,
    LeftWall,
    RightWall,
}

impl BoundarySide {
    pub fn name(self) -> &'static str {
        match self {
            BoundarySide::Floor => "Floor",
            BoundarySide::LeftWall => "WallLeft",
            BoundarySide::RightWall => "WallRight",
        }
    }
}

/// Structured identity of a physics body.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTag {
    Ball(Generation),
    Boundary(BoundarySide),
}

impl BodyTag {
    pub fn generation(self) -> Option<Generation> {
        match self {
            BodyTag::Ball(g) => Some(g),
            BodyTag::Boundary(_) => None,
        }
    }
}

/// Snapshot of the physical state of a live ball, as read from the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

/// Everything needed to create a ball body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpawn {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub generation: Generation,
}

impl BallSpawn {
    /// A user-spawned ball: generation 1, at rest.
    pub fn fresh(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            generation: Generation::FIRST,
        }
    }
}

/// An immovable axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySpawn {
    pub side: BoundarySide,
    pub center: Vec2,
    pub half_extents: Vec2,
}

/// Create / remove / query bodies. Implemented by the Rapier backend and by [`MemoryBodies`].
pub trait BodyWorld {
    /// `None` when the body is unknown or carries no tag.
    fn tag(&self, body: Entity) -> Option<BodyTag>;
    /// `None` unless the body is a live ball with radius and velocity available.
    fn ball_state(&self, body: Entity) -> Option<BallState>;
    fn spawn_ball(&mut self, spawn: BallSpawn) -> Entity;
    fn spawn_boundary(&mut self, spawn: BoundarySpawn) -> Entity;
    /// Remove a body. Returns `false` if it was unknown or already removed.
    fn despawn(&mut self, body: Entity) -> bool;
}

#[derive(Debug, Clone)]
struct MemoryBody {
    entity: Entity,
    tag: Option<BodyTag>,
    ball: Option<BallState>,
    boundary: Option<BoundarySpawn>,
}

/// Headless backend: bodies are plain records, nothing moves.
#[derive(Debug, Default, Clone)]
pub struct MemoryBodies {
    next_index: u32,
    bodies: Vec<MemoryBody>,
}

impl MemoryBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body with arbitrary (possibly missing) tag / state, e.g. a foreign body.
    pub fn insert_raw(&mut self, tag: Option<BodyTag>, ball: Option<BallState>) -> Entity {
        let entity = Entity::from_raw(self.next_index);
        self.next_index += 1;
        self.bodies.push(MemoryBody {
            entity,
            tag,
            ball,
            boundary: None,
        });
        entity
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, body: Entity) -> bool {
        self.find(body).is_some()
    }

    /// Entities tagged as balls, in insertion order.
    pub fn balls(&self) -> impl Iterator<Item = Entity> + '_ {
        self.bodies
            .iter()
            .filter(|b| matches!(b.tag, Some(BodyTag::Ball(_))))
            .map(|b| b.entity)
    }

    pub fn boundaries(&self) -> impl Iterator<Item = &BoundarySpawn> + '_ {
        self.bodies.iter().filter_map(|b| b.boundary.as_ref())
    }

    fn find(&self, body: Entity) -> Option<&MemoryBody> {
        self.bodies.iter().find(|b| b.entity == body)
    }
}

impl BodyWorld for MemoryBodies {
    fn tag(&self, body: Entity) -> Option<BodyTag> {
        self.find(body).and_then(|b| b.tag)
    }

    fn ball_state(&self, body: Entity) -> Option<BallState> {
        self.find(body).and_then(|b| b.ball)
    }

    fn spawn_ball(&mut self, spawn: BallSpawn) -> Entity {
        self.insert_raw(
            Some(BodyTag::Ball(spawn.generation)),
            Some(BallState {
                position: spawn.position,
                velocity: spawn.velocity,
                radius: spawn.radius,
            }),
        )
    }

    fn spawn_boundary(&mut self, spawn: BoundarySpawn) -> Entity {
        let entity = self.insert_raw(Some(BodyTag::Boundary(spawn.side)), None);
        if let Some(last) = self.bodies.last_mut() {
            last.boundary = Some(spawn);
        }
        entity
    }

    fn despawn(&mut self, body: Entity) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.entity != body);
        self.bodies.len() != before
    }
}

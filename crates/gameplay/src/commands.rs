//! Serialized simulation commands.
//!
//! Input handlers and the collision collector only enqueue; `process_sim_commands` is the single
//! consumer and the only system that adds or removes balls. Commands apply strictly in FIFO order.

use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;
use mb_config::GameConfig;
use mb_core::{
    BallSpawn, BallSpawned, BallsMerged, BodyWorld, GameConfigRes, LiveBalls, MergeStats,
};
use mb_physics::RapierBodies;
use std::collections::VecDeque;

use crate::merge::resolve_collision_batch;

const LOG_TARGET: &str = "sim_commands";

#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    /// New generation-1 ball at rest at `position`.
    Spawn { position: Vec2 },
    /// Newly touching pairs reported by one physics step, in delivery order.
    CollisionBatch(Vec<(Entity, Entity)>),
    /// Remove every tracked ball.
    Reset,
}

#[derive(Resource, Debug, Default)]
pub struct SimCommandQueue(VecDeque<SimCommand>);

impl SimCommandQueue {
    pub fn push(&mut self, command: SimCommand) {
        self.0.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = SimCommand> + '_ {
        self.0.drain(..)
    }
}

/// What applying one command changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Spawned(BallSpawned),
    Merged(BallsMerged),
    Reset { retired: usize },
    Nothing,
}

/// Apply a single command against `world`, keeping `live` and `stats` in step.
pub fn apply_command<W: BodyWorld>(
    command: SimCommand,
    world: &mut W,
    live: &mut LiveBalls,
    stats: &mut MergeStats,
    cfg: &GameConfig,
) -> Applied {
    match command {
        SimCommand::Spawn { position } => {
            if !position.is_finite() {
                warn!(target: LOG_TARGET, ?position, "spawn at non-finite position ignored");
                return Applied::Nothing;
            }
            let spawn = BallSpawn::fresh(position, cfg.balls.radius);
            let entity = world.spawn_ball(spawn);
            live.push(entity);
            stats.record_spawn(spawn.generation);
            debug!(target: LOG_TARGET, ?entity, ?position, "ball spawned");
            Applied::Spawned(BallSpawned {
                entity,
                generation: spawn.generation,
                position,
            })
        }
        SimCommand::CollisionBatch(pairs) => {
            match resolve_collision_batch(&pairs, world, live, &cfg.merge) {
                Some(outcome) => {
                    stats.record_merge(outcome.spawn.generation);
                    info!(
                        target: LOG_TARGET,
                        generation = outcome.spawn.generation.get(),
                        radius = outcome.spawn.radius,
                        live = live.len(),
                        "balls merged"
                    );
                    Applied::Merged(BallsMerged {
                        parents: outcome.parents,
                        child: outcome.child,
                        generation: outcome.spawn.generation,
                        radius: outcome.spawn.radius,
                        position: outcome.spawn.position,
                    })
                }
                None => Applied::Nothing,
            }
        }
        SimCommand::Reset => {
            let handles = live.take_all();
            let mut retired = 0;
            for ball in handles {
                if world.despawn(ball) {
                    retired += 1;
                } else {
                    // Handle without a body: dropping it keeps live and world in step.
                    warn!(target: LOG_TARGET, ?ball, "reset found a stale handle");
                }
            }
            info!(target: LOG_TARGET, retired, "reset");
            Applied::Reset { retired }
        }
    }
}

/// Turn this frame's collision-start events into one batch command.
pub fn collect_collision_batch(
    mut collisions: EventReader<CollisionEvent>,
    mut queue: ResMut<SimCommandQueue>,
) {
    let pairs: Vec<(Entity, Entity)> = collisions
        .read()
        .filter_map(|ev| match ev {
            CollisionEvent::Started(a, b, _flags) => Some((*a, *b)),
            CollisionEvent::Stopped(..) => None,
        })
        .collect();
    if !pairs.is_empty() {
        queue.push(SimCommand::CollisionBatch(pairs));
    }
}

/// The single consumer: drain the queue in order against the Rapier world.
pub fn process_sim_commands(
    mut queue: ResMut<SimCommandQueue>,
    mut bodies: RapierBodies,
    mut live: ResMut<LiveBalls>,
    mut stats: ResMut<MergeStats>,
    cfg: Res<GameConfigRes>,
    mut spawned: EventWriter<BallSpawned>,
    mut merged: EventWriter<BallsMerged>,
) {
    if queue.is_empty() {
        return;
    }
    bodies.begin_drain();
    let pending: Vec<SimCommand> = queue.drain().collect();
    for command in pending {
        match apply_command(command, &mut bodies, &mut live, &mut stats, &cfg.0) {
            Applied::Spawned(ev) => {
                spawned.write(ev);
            }
            Applied::Merged(ev) => {
                merged.write(ev);
            }
            Applied::Reset { .. } | Applied::Nothing => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::{tracking_mismatch, BodyTag, Generation, MemoryBodies};

    #[test]
    fn spawn_uses_configured_radius_and_generation_one() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let mut stats = MergeStats::default();
        let cfg = GameConfig::default();

        let applied = apply_command(
            SimCommand::Spawn { position: Vec2::new(12.0, 40.0) },
            &mut world,
            &mut live,
            &mut stats,
            &cfg,
        );
        let Applied::Spawned(ev) = applied else {
            panic!("expected spawn, got {applied:?}");
        };
        assert_eq!(ev.generation, Generation::FIRST);
        assert_eq!(live.as_slice(), &[ev.entity]);
        let state = world.ball_state(ev.entity).expect("ball state");
        assert_eq!(state.radius, cfg.balls.radius);
        assert_eq!(state.velocity, Vec2::ZERO);
        assert_eq!(stats.spawned, 1);
    }

    #[test]
    fn non_finite_spawn_is_ignored() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let mut stats = MergeStats::default();
        let applied = apply_command(
            SimCommand::Spawn { position: Vec2::new(f32::NAN, 0.0) },
            &mut world,
            &mut live,
            &mut stats,
            &GameConfig::default(),
        );
        assert_eq!(applied, Applied::Nothing);
        assert!(world.is_empty() && live.is_empty());
    }

    #[test]
    fn commands_apply_in_order() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let mut stats = MergeStats::default();
        let cfg = GameConfig::default();
        let spawn_at = |y: f32, world: &mut MemoryBodies, live: &mut LiveBalls, stats: &mut MergeStats| {
            match apply_command(SimCommand::Spawn { position: Vec2::new(0.0, y) }, world, live, stats, &cfg) {
                Applied::Spawned(ev) => ev.entity,
                other => panic!("expected spawn, got {other:?}"),
            }
        };
        let a = spawn_at(0.0, &mut world, &mut live, &mut stats);
        let b = spawn_at(40.0, &mut world, &mut live, &mut stats);

        let merged = apply_command(
            SimCommand::CollisionBatch(vec![(a, b)]),
            &mut world,
            &mut live,
            &mut stats,
            &cfg,
        );
        let Applied::Merged(ev) = merged else {
            panic!("expected merge, got {merged:?}");
        };
        assert_eq!(ev.parents, [a, b]);
        assert_eq!(ev.position, Vec2::new(0.0, 20.0));
        assert_eq!(world.tag(ev.child), Some(BodyTag::Ball(Generation::FIRST.next())));
        assert_eq!(stats.merges, 1);
        assert_eq!(stats.highest_generation, 2);

        let reset = apply_command(SimCommand::Reset, &mut world, &mut live, &mut stats, &cfg);
        assert_eq!(reset, Applied::Reset { retired: 1 });
        assert!(live.is_empty());
        assert_eq!(world.balls().count(), 0);
        assert!(tracking_mismatch(&live, world.balls()).is_none());
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = SimCommandQueue::default();
        queue.push(SimCommand::Reset);
        queue.push(SimCommand::Spawn { position: Vec2::ONE });
        assert_eq!(queue.len(), 2);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained, vec![SimCommand::Reset, SimCommand::Spawn { position: Vec2::ONE }]);
        assert!(queue.is_empty());
    }
}

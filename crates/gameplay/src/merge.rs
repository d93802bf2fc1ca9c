//! Same-generation merge resolution.
//!
//! One collision-start batch commits at most one merge: the first pair (in delivery order) whose
//! bodies are both balls of equal generation is replaced by a single ball of the next generation
//! with the combined area, placed at the midpoint. The rest of the batch is ignored.

use bevy::prelude::*;
use mb_config::{MergeConfig, VelocityAveraging};
use mb_core::{BallSpawn, BallState, BodyTag, BodyWorld, Generation, LiveBalls};
use std::f32::consts::PI;

const LOG_TARGET: &str = "merge";

/// Generation shared by two ball tags, if the pair may merge under `cap`.
pub fn qualifying_generation(
    a: Option<BodyTag>,
    b: Option<BodyTag>,
    cap: Option<u32>,
) -> Option<Generation> {
    match (a?, b?) {
        (BodyTag::Ball(ga), BodyTag::Ball(gb)) if ga == gb => match cap {
            Some(max) if ga.get() >= max => None,
            _ => Some(ga),
        },
        _ => None,
    }
}

/// Radius of a circle whose area equals the two parents' combined area.
pub fn merged_radius(r1: f32, r2: f32) -> f32 {
    let area = PI * r1 * r1 + PI * r2 * r2;
    (area / PI).sqrt()
}

#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    (a + b) * 0.5
}

pub fn merged_velocity(a: Vec2, b: Vec2, mode: VelocityAveraging) -> Vec2 {
    match mode {
        VelocityAveraging::Symmetric => (a + b) * 0.5,
        VelocityAveraging::SourceParity => Vec2::new((a.x + b.x) * 0.5, (b.y + b.y) * 0.5),
    }
}

/// The replacement ball for parents `a` and `b` of generation `generation`.
pub fn merge_spawn(
    a: &BallState,
    b: &BallState,
    generation: Generation,
    mode: VelocityAveraging,
) -> BallSpawn {
    BallSpawn {
        position: midpoint(a.position, b.position),
        velocity: merged_velocity(a.velocity, b.velocity, mode),
        radius: merged_radius(a.radius, b.radius),
        generation: generation.next(),
    }
}

/// A pair selected for merging, with the state read at selection time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeCandidate {
    pub a: Entity,
    pub b: Entity,
    pub generation: Generation,
    pub state_a: BallState,
    pub state_b: BallState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeOutcome {
    pub parents: [Entity; 2],
    pub child: Entity,
    pub spawn: BallSpawn,
}

/// First qualifying pair in delivery order. Pairs with missing tags or state are skipped.
pub fn find_qualifying_pair<W: BodyWorld>(
    pairs: &[(Entity, Entity)],
    world: &W,
    cfg: &MergeConfig,
) -> Option<MergeCandidate> {
    let cap = cfg.generation_cap();
    pairs.iter().find_map(|&(a, b)| {
        if a == b {
            return None;
        }
        let generation = qualifying_generation(world.tag(a), world.tag(b), cap)?;
        Some(MergeCandidate {
            a,
            b,
            generation,
            state_a: world.ball_state(a)?,
            state_b: world.ball_state(b)?,
        })
    })
}

/// Apply one collision-start batch: commit at most one merge, keeping `live` in step with `world`.
pub fn resolve_collision_batch<W: BodyWorld>(
    pairs: &[(Entity, Entity)],
    world: &mut W,
    live: &mut LiveBalls,
    cfg: &MergeConfig,
) -> Option<MergeOutcome> {
    if !cfg.enabled {
        return None;
    }
    let candidate = find_qualifying_pair(pairs, world, cfg)?;
    let spawn = merge_spawn(
        &candidate.state_a,
        &candidate.state_b,
        candidate.generation,
        cfg.velocity_averaging,
    );

    for parent in [candidate.a, candidate.b] {
        world.despawn(parent);
        if !live.remove(parent) {
            warn!(target: LOG_TARGET, "merged parent {parent:?} was not tracked");
        }
    }
    let child = world.spawn_ball(spawn);
    live.push(child);

    debug!(
        target: LOG_TARGET,
        a = ?candidate.a,
        b = ?candidate.b,
        ?child,
        generation = spawn.generation.get(),
        radius = spawn.radius,
        "merge committed"
    );
    Some(MergeOutcome {
        parents: [candidate.a, candidate.b],
        child,
        spawn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::{tracking_mismatch, BoundarySide, BoundarySpawn, MemoryBodies};

    const EPS: f32 = 1e-4;

    fn ball(world: &mut MemoryBodies, live: &mut LiveBalls, x: f32, y: f32, r: f32, g: u32) -> Entity {
        let e = world.spawn_ball(BallSpawn {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: r,
            generation: Generation::new(g).expect("positive generation"),
        });
        live.push(e);
        e
    }

    fn floor(world: &mut MemoryBodies) -> Entity {
        world.spawn_boundary(BoundarySpawn {
            side: BoundarySide::Floor,
            center: Vec2::new(0.0, -280.0),
            half_extents: Vec2::new(200.0, 20.0),
        })
    }

    #[test]
    fn area_is_conserved() {
        for (r1, r2) in [(20.0, 20.0), (1.0, 3.0), (0.5, 40.0), (12.5, 7.25)] {
            let r = merged_radius(r1, r2);
            assert!((r - (r1 * r1 + r2 * r2).sqrt()).abs() < EPS, "{r1},{r2} -> {r}");
            let before = PI * r1 * r1 + PI * r2 * r2;
            assert!((PI * r * r - before).abs() / before < 1e-5);
        }
    }

    #[test]
    fn two_generation_one_balls_merge_into_generation_two() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let a = ball(&mut world, &mut live, 100.0, 100.0, 20.0, 1);
        let b = ball(&mut world, &mut live, 100.0, 140.0, 20.0, 1);

        let outcome = resolve_collision_batch(&[(a, b)], &mut world, &mut live, &MergeConfig::default())
            .expect("merge");

        assert_eq!(outcome.parents, [a, b]);
        assert_eq!(outcome.spawn.generation.get(), 2);
        assert!((outcome.spawn.radius - 20.0 * 2f32.sqrt()).abs() < EPS);
        assert!((outcome.spawn.radius - 28.28).abs() < 0.01);
        assert_eq!(outcome.spawn.position, Vec2::new(100.0, 120.0));
        assert_eq!(live.len(), 1);
        assert_eq!(live.as_slice(), &[outcome.child]);
        assert!(!world.contains(a) && !world.contains(b));
        assert_eq!(
            world.tag(outcome.child),
            Some(BodyTag::Ball(Generation::new(2).unwrap()))
        );
    }

    #[test]
    fn different_generations_do_not_merge() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let a = ball(&mut world, &mut live, 0.0, 0.0, 20.0, 1);
        let c = ball(&mut world, &mut live, 0.0, 30.0, 28.28, 2);
        let before = live.clone();

        assert!(resolve_collision_batch(&[(a, c)], &mut world, &mut live, &MergeConfig::default()).is_none());
        assert_eq!(live, before);
        assert_eq!(world.tag(a), Some(BodyTag::Ball(Generation::FIRST)));
        assert_eq!(world.tag(c), Some(BodyTag::Ball(Generation::new(2).unwrap())));
    }

    #[test]
    fn at_most_one_merge_per_batch() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let a = ball(&mut world, &mut live, 0.0, 0.0, 10.0, 1);
        let b = ball(&mut world, &mut live, 0.0, 15.0, 10.0, 1);
        let c = ball(&mut world, &mut live, 80.0, 0.0, 10.0, 1);
        let d = ball(&mut world, &mut live, 80.0, 15.0, 10.0, 1);

        let outcome = resolve_collision_batch(&[(a, b), (c, d)], &mut world, &mut live, &MergeConfig::default())
            .expect("first pair merges");
        assert_eq!(outcome.parents, [a, b]);
        assert_eq!(live.len(), 3);
        assert!(live.contains(c) && live.contains(d));
        assert_eq!(world.tag(c), Some(BodyTag::Ball(Generation::FIRST)));

        // The untouched pair can still merge on a later step.
        let second = resolve_collision_batch(&[(c, d)], &mut world, &mut live, &MergeConfig::default())
            .expect("second step merges");
        assert_eq!(second.parents, [c, d]);
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn first_qualifying_pair_in_delivery_order_wins() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let wall = floor(&mut world);
        let a = ball(&mut world, &mut live, 0.0, 0.0, 10.0, 3);
        let b = ball(&mut world, &mut live, 0.0, 15.0, 10.0, 3);
        let c = ball(&mut world, &mut live, 50.0, 0.0, 10.0, 1);
        let d = ball(&mut world, &mut live, 50.0, 15.0, 10.0, 1);

        let batch = [(a, wall), (a, c), (c, d), (a, b)];
        let outcome = resolve_collision_batch(&batch, &mut world, &mut live, &MergeConfig::default())
            .expect("merge");
        assert_eq!(outcome.parents, [c, d]);
        assert_eq!(outcome.spawn.generation.get(), 2);
        assert!(live.contains(a) && live.contains(b));
    }

    #[test]
    fn non_qualifying_batch_leaves_everything_unchanged() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let wall = floor(&mut world);
        let a = ball(&mut world, &mut live, 0.0, 0.0, 10.0, 1);
        let c = ball(&mut world, &mut live, 0.0, 15.0, 10.0, 2);
        let live_before = live.clone();
        let len_before = world.len();

        let batch = [(a, wall), (wall, c), (a, c), (c, a)];
        assert!(resolve_collision_batch(&batch, &mut world, &mut live, &MergeConfig::default()).is_none());
        assert_eq!(live, live_before);
        assert_eq!(world.len(), len_before);
        assert!(resolve_collision_batch(&[], &mut world, &mut live, &MergeConfig::default()).is_none());
    }

    #[test]
    fn malformed_bodies_are_skipped_not_fatal() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let untagged = world.insert_raw(None, None);
        let stateless = world.insert_raw(Some(BodyTag::Ball(Generation::FIRST)), None);
        let a = ball(&mut world, &mut live, 0.0, 0.0, 10.0, 1);
        let b = ball(&mut world, &mut live, 0.0, 15.0, 10.0, 1);
        let unknown = Entity::from_raw(9_999);

        let batch = [(untagged, a), (stateless, a), (a, unknown), (a, a), (a, b)];
        let outcome = resolve_collision_batch(&batch, &mut world, &mut live, &MergeConfig::default())
            .expect("valid pair still merges");
        assert_eq!(outcome.parents, [a, b]);
        assert!(world.contains(untagged) && world.contains(stateless));
    }

    #[test]
    fn velocity_averaging_modes() {
        let a = Vec2::new(2.0, 10.0);
        let b = Vec2::new(4.0, -6.0);
        assert_eq!(merged_velocity(a, b, VelocityAveraging::Symmetric), Vec2::new(3.0, 2.0));
        assert_eq!(merged_velocity(a, b, VelocityAveraging::SourceParity), Vec2::new(3.0, -6.0));

        let sa = BallState { position: Vec2::ZERO, velocity: a, radius: 5.0 };
        let sb = BallState { position: Vec2::new(10.0, 0.0), velocity: b, radius: 5.0 };
        let spawn = merge_spawn(&sa, &sb, Generation::FIRST, VelocityAveraging::Symmetric);
        assert_eq!(spawn.velocity, Vec2::new(3.0, 2.0));
        assert_eq!(spawn.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn merged_ball_carries_configured_velocity() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let a = world.spawn_ball(BallSpawn {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, 8.0),
            radius: 10.0,
            generation: Generation::FIRST,
        });
        let b = world.spawn_ball(BallSpawn {
            position: Vec2::new(0.0, 20.0),
            velocity: Vec2::new(3.0, -2.0),
            radius: 10.0,
            generation: Generation::FIRST,
        });
        live.push(a);
        live.push(b);
        let cfg = MergeConfig {
            velocity_averaging: VelocityAveraging::SourceParity,
            ..Default::default()
        };
        let outcome = resolve_collision_batch(&[(a, b)], &mut world, &mut live, &cfg).expect("merge");
        let child = world.ball_state(outcome.child).expect("child state");
        assert_eq!(child.velocity, Vec2::new(2.0, -2.0));
    }

    #[test]
    fn disabled_merging_is_a_no_op() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        let a = ball(&mut world, &mut live, 0.0, 0.0, 10.0, 1);
        let b = ball(&mut world, &mut live, 0.0, 15.0, 10.0, 1);
        let cfg = MergeConfig { enabled: false, ..Default::default() };
        assert!(resolve_collision_batch(&[(a, b)], &mut world, &mut live, &cfg).is_none());
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn generation_cap_stops_merging() {
        let cap = Some(3);
        let g2 = Some(BodyTag::Ball(Generation::new(2).unwrap()));
        let g3 = Some(BodyTag::Ball(Generation::new(3).unwrap()));
        assert_eq!(qualifying_generation(g2, g2, cap), Generation::new(2));
        assert_eq!(qualifying_generation(g3, g3, cap), None);
        assert_eq!(qualifying_generation(g3, g3, None), Generation::new(3));
        assert_eq!(
            qualifying_generation(g2, Some(BodyTag::Boundary(BoundarySide::LeftWall)), None),
            None
        );
        assert_eq!(qualifying_generation(None, g2, None), None);
    }

    #[test]
    fn tracking_stays_bijective_over_spawn_merge_sequences() {
        let mut world = MemoryBodies::new();
        let mut live = LiveBalls::default();
        floor(&mut world);
        let cfg = MergeConfig::default();

        for round in 0..6 {
            let x = round as f32 * 30.0;
            let a = ball(&mut world, &mut live, x, 0.0, 10.0, 1);
            let b = ball(&mut world, &mut live, x, 15.0, 10.0, 1);
            let extra = ball(&mut world, &mut live, x, 40.0, 10.0, 1);
            resolve_collision_batch(&[(a, extra), (a, b), (b, extra)], &mut world, &mut live, &cfg);
            assert!(
                tracking_mismatch(&live, world.balls()).is_none(),
                "round {round}: {:?}",
                tracking_mismatch(&live, world.balls())
            );
        }
        // Each round: three spawned, one merge.
        assert_eq!(live.len(), 12);
        assert_eq!(world.balls().count(), 12);

        // Merge the generation-2 balls pairwise until none qualify.
        loop {
            let balls: Vec<Entity> = live.iter().collect();
            let pairs: Vec<(Entity, Entity)> = balls
                .iter()
                .flat_map(|&x| balls.iter().map(move |&y| (x, y)))
                .collect();
            if resolve_collision_batch(&pairs, &mut world, &mut live, &cfg).is_none() {
                break;
            }
            assert!(tracking_mismatch(&live, world.balls()).is_none());
        }
        let mut generations: Vec<u32> = live
            .iter()
            .filter_map(|e| world.tag(e).and_then(BodyTag::generation))
            .map(Generation::get)
            .collect();
        generations.sort_unstable();
        generations.dedup();
        assert_eq!(generations.len(), live.len(), "no two equal generations remain");
    }
}

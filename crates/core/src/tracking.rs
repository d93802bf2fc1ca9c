use bevy::prelude::*;
use std::collections::HashSet;

use crate::{Ball, Generation};

const LOG_TARGET: &str = "tracking";

/// Ordered handles of every live ball. Must stay in 1:1 correspondence with the ball bodies in
/// the world between frames.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct LiveBalls(Vec<Entity>);

impl LiveBalls {
    pub fn push(&mut self, ball: Entity) {
        self.0.push(ball);
    }

    /// Order-preserving removal. Returns whether the handle was tracked.
    pub fn remove(&mut self, ball: Entity) -> bool {
        match self.0.iter().position(|e| *e == ball) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, ball: Entity) -> bool {
        self.0.contains(&ball)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.0
    }

    /// Empties the collection, returning the handles in order.
    pub fn take_all(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.0)
    }
}

/// Describe how `live` and the balls present in the world disagree, if they do.
pub fn tracking_mismatch(
    live: &LiveBalls,
    world_balls: impl IntoIterator<Item = Entity>,
) -> Option<String> {
    let tracked: HashSet<Entity> = live.iter().collect();
    let present: HashSet<Entity> = world_balls.into_iter().collect();
    let mut problems = Vec::new();
    if tracked.len() != live.len() {
        problems.push(format!(
            "{} duplicate handle(s)",
            live.len() - tracked.len()
        ));
    }
    let stale: Vec<_> = tracked.difference(&present).collect();
    if !stale.is_empty() {
        problems.push(format!("tracked but not in world: {stale:?}"));
    }
    let untracked: Vec<_> = present.difference(&tracked).collect();
    if !untracked.is_empty() {
        problems.push(format!("in world but untracked: {untracked:?}"));
    }
    (!problems.is_empty()).then(|| problems.join("; "))
}

/// Last-schedule check of the tracking bijection.
pub fn verify_live_balls(live: Res<LiveBalls>, balls: Query<Entity, With<Ball>>) {
    if let Some(report) = tracking_mismatch(&live, balls.iter()) {
        error!(target: LOG_TARGET, "live ball tracking out of sync: {report}");
        debug_assert!(false, "live ball tracking out of sync: {report}");
    }
}

/// Running totals for HUD / logs.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub spawned: u64,
    pub merges: u64,
    pub highest_generation: u32,
}

impl MergeStats {
    pub fn record_spawn(&mut self, generation: Generation) {
        self.spawned += 1;
        self.highest_generation = self.highest_generation.max(generation.get());
    }

    pub fn record_merge(&mut self, generation: Generation) {
        self.merges += 1;
        self.highest_generation = self.highest_generation.max(generation.get());
    }
}

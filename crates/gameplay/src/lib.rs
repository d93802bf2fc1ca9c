// Gameplay crate: merge rules, the serialized command queue, random drops and input handlers.
// Systems here never mutate bodies outside `process_sim_commands`.

use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;
use mb_core::{GameConfigRes, SimSet};

pub mod commands;
pub mod input;
pub mod merge;
pub mod spawning;

pub use commands::{
    apply_command, collect_collision_batch, process_sim_commands, Applied, SimCommand,
    SimCommandQueue,
};
pub use input::SpawnInputPlugin;
pub use merge::{
    find_qualifying_pair, merge_spawn, merged_radius, merged_velocity, midpoint,
    qualifying_generation, resolve_collision_batch, MergeCandidate, MergeOutcome,
};
pub use spawning::{enqueue_initial_drop, random_drop_position, DropRng};

pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        // Rapier registers this too; adding it here lets the plugin run without a physics backend.
        app.add_event::<CollisionEvent>()
            .init_resource::<GameConfigRes>()
            .init_resource::<SimCommandQueue>()
            .add_systems(Startup, enqueue_initial_drop)
            .add_systems(Update, collect_collision_batch.in_set(SimSet::Collect))
            .add_systems(Update, process_sim_commands.in_set(SimSet::Apply));
    }
}

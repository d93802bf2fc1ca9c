// Pointer and keyboard input. Every handler only enqueues a `SimCommand`; nothing here touches
// bodies directly. Missing window or camera (headless runs) means clicks are ignored.

use bevy::prelude::*;
use mb_core::{GameConfigRes, SimSet};

use crate::commands::{collect_collision_batch, SimCommand, SimCommandQueue};
use crate::spawning::{random_drop_position, DropRng};

const LOG_TARGET: &str = "input";

pub const DROP_KEY: KeyCode = KeyCode::Space;
pub const RESET_KEY: KeyCode = KeyCode::KeyR;

/// Convert a window position (top-left origin, logical pixels) to world coordinates.
fn screen_to_world(camera_q: &Query<(&Camera, &GlobalTransform)>, screen_pos: Vec2) -> Option<Vec2> {
    let (camera, cam_tf) = camera_q.iter().next()?;
    camera.viewport_to_world_2d(cam_tf, screen_pos).ok()
}

/// World position of a press that started this frame: first new touch, else a left click.
fn pressed_world_pos(
    buttons: &ButtonInput<MouseButton>,
    touches: &Touches,
    window: &Window,
    camera_q: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Vec2> {
    if let Some(touch) = touches.iter_just_pressed().next() {
        return screen_to_world(camera_q, touch.position());
    }
    if !buttons.just_pressed(MouseButton::Left) {
        return None;
    }
    screen_to_world(camera_q, window.cursor_position()?)
}

pub(crate) fn spawn_on_press(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows_q: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform)>,
    mut queue: ResMut<SimCommandQueue>,
) {
    let Some(window) = windows_q.iter().next() else { return; };
    let Some(position) = pressed_world_pos(&buttons, &touches, window, &camera_q) else { return; };
    debug!(target: LOG_TARGET, ?position, "spawn requested");
    queue.push(SimCommand::Spawn { position });
}

pub(crate) fn keyboard_commands(
    keys: Res<ButtonInput<KeyCode>>,
    cfg: Res<GameConfigRes>,
    rng: Option<ResMut<DropRng>>,
    mut queue: ResMut<SimCommandQueue>,
) {
    if keys.just_pressed(DROP_KEY) {
        match rng {
            Some(mut rng) => {
                let position = random_drop_position(&mut rng.0, &cfg.0);
                queue.push(SimCommand::Spawn { position });
            }
            None => warn!(target: LOG_TARGET, "drop key pressed before DropRng was seeded"),
        }
    }
    if keys.just_pressed(RESET_KEY) {
        queue.push(SimCommand::Reset);
    }
}

/// Click / touch to spawn, Space to drop at random, R to reset.
///
/// Within a frame, commands queue as: collision batch, pointer spawn, drop key, reset key.
pub struct SpawnInputPlugin;

impl Plugin for SpawnInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimCommandQueue>().add_systems(
            Update,
            (spawn_on_press, keyboard_commands)
                .chain()
                .after(collect_collision_batch)
                .in_set(SimSet::Collect),
        );
    }
}

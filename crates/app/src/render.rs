//! Gizmo rendering: one circle per ball coloured by generation, outlines for the container.

use bevy::prelude::*;
use mb_core::{BallRadius, BodyTag, GameConfigRes, Generation};
use mb_physics::boundary_layout;

/// Generation palette, wrapping once generations outgrow it.
pub const GENERATION_COLORS: [Color; 6] = [
    Color::srgb(1.0, 0.20, 0.25),  // red
    Color::srgb(1.0, 0.60, 0.15),  // orange
    Color::srgb(1.0, 1.0, 0.15),   // yellow
    Color::srgb(0.20, 0.80, 0.45), // green
    Color::srgb(0.20, 0.55, 0.90), // blue
    Color::srgb(0.70, 0.35, 0.95), // violet
];

pub struct Palette;
impl Palette {
    pub const BG: Color = Color::srgb(0.02, 0.02, 0.05);
    pub const BOUNDARY: Color = Color::srgb(0.55, 0.55, 0.60);
}

#[inline]
pub fn color_for_generation(generation: Generation) -> Color {
    let idx = (generation.get() as usize - 1) % GENERATION_COLORS.len();
    GENERATION_COLORS[idx]
}

#[derive(Component)]
pub struct GameCamera;

pub struct BallGizmoPlugin;

impl Plugin for BallGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Palette::BG))
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (draw_boundaries, draw_balls));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, GameCamera));
}

fn draw_balls(mut gizmos: Gizmos, cfg: Res<GameConfigRes>, balls: Query<(&Transform, &BallRadius, &BodyTag)>) {
    if !cfg.0.draw_gizmos {
        return;
    }
    for (tf, radius, tag) in &balls {
        let Some(generation) = tag.generation() else { continue; };
        gizmos.circle_2d(
            Isometry2d::from_translation(tf.translation.truncate()),
            radius.0,
            color_for_generation(generation),
        );
    }
}

fn draw_boundaries(mut gizmos: Gizmos, cfg: Res<GameConfigRes>) {
    let c = &cfg.0;
    if !c.draw_gizmos {
        return;
    }
    for b in boundary_layout(c.window.width, c.window.height, &c.arena) {
        gizmos.rect_2d(
            Isometry2d::from_translation(b.center),
            b.half_extents * 2.0,
            Palette::BOUNDARY,
        );
    }
}

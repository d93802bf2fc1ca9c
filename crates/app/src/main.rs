/*!
Merge Balls binary: loads layered config, opens the window sized to the container and wires
core, physics, gameplay, input and gizmo rendering together.
*/

use bevy::prelude::*;
use bevy_rapier2d::prelude::RapierDebugRenderPlugin;
use mb_core::{CorePlugin, GameConfigRes, RngSeed};
use mb_gameplay::{GameplayPlugin, SpawnInputPlugin};
use mb_physics::PhysicsPlugin;

mod auto_close;
mod render;

use auto_close::AutoClosePlugin;
use render::BallGizmoPlugin;

#[cfg(target_arch = "wasm32")]
fn load_config() -> mb_config::GameConfig {
    // No local override layer on wasm; the base file is embedded.
    const RAW: &str = include_str!("../../../assets/config/game.ron");
    ron::from_str(RAW).unwrap_or_else(|e| {
        warn!("CONFIG (wasm) parse failure: {e}; using defaults");
        mb_config::GameConfig::default()
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> mb_config::GameConfig {
    let (cfg, used, errors) = mb_config::GameConfig::load_layered([
        std::path::Path::new("assets/config/game.ron"),
        std::path::Path::new("assets/config/game.local.ron"),
    ]);
    for e in errors {
        warn!("CONFIG LOAD ISSUE: {e}");
    }
    if used.is_empty() {
        info!("No config layers found; using defaults");
    } else {
        info!(?used, "Config layers loaded");
    }
    cfg
}

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
    }

    let cfg = load_config();
    for w in cfg.validate() {
        warn!("CONFIG WARNING: {w}");
    }
    info!(?cfg.window, "Window config");
    info!(
        merge_enabled = cfg.merge.enabled,
        max_generation = cfg.merge.max_generation,
        velocity_averaging = ?cfg.merge.velocity_averaging,
        initial_drop = cfg.spawn.initial_drop,
        "Runtime feature summary"
    );

    let mut app = App::new();
    app.insert_resource(GameConfigRes(cfg.clone()))
        .insert_resource(RngSeed(12345))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: cfg.window.title.clone(),
                resolution: (cfg.window.width, cfg.window.height).into(),
                resizable: false,
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(PhysicsPlugin)
        .add_plugins(GameplayPlugin)
        .add_plugins(SpawnInputPlugin)
        .add_plugins(BallGizmoPlugin)
        .add_plugins(AutoClosePlugin);

    if cfg!(feature = "debug") || cfg.rapier_debug {
        app.add_plugins(RapierDebugRenderPlugin::default());
    }

    app.run();
}

// Black-box tests across the published plugin APIs: plugin composition, the command-queue merge
// flow, and a headless Rapier run where real contacts drive the merge.

use bevy::prelude::*;

pub fn build_minimal_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    // AssetPlugin -> AssetServer for Rapier's optional asset-backed colliders
    // InputPlugin -> ButtonInput<MouseButton>/KeyCode + Touches used by SpawnInputPlugin
    // TransformPlugin -> GlobalTransform propagation, which Rapier reads for initial poses
    app.add_plugins((
        bevy::asset::AssetPlugin::default(),
        bevy::input::InputPlugin,
        bevy::transform::TransformPlugin,
    ));
    app
}

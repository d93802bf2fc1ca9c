// Exits the app after `window.autoClose` seconds; 0 disables it.

use bevy::prelude::*;
use mb_core::GameConfigRes;

#[derive(Resource, Deref, DerefMut)]
struct AutoCloseTimer(Timer);

pub struct AutoClosePlugin;

impl Plugin for AutoClosePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_autoclose)
            .add_systems(Update, check_autoclose);
    }
}

fn setup_autoclose(mut commands: Commands, cfg: Res<GameConfigRes>) {
    let secs = cfg.0.window.auto_close;
    if secs > 0.0 {
        info!(seconds = secs, "AutoClose: will exit after {secs} seconds");
        commands.insert_resource(AutoCloseTimer(Timer::from_seconds(secs, TimerMode::Once)));
    }
}

fn check_autoclose(
    time: Res<Time>,
    timer: Option<ResMut<AutoCloseTimer>>,
    mut ev_exit: EventWriter<AppExit>,
) {
    let Some(mut t) = timer else { return; };
    t.tick(time.delta());
    if t.just_finished() {
        info!("AutoClose: timer finished, requesting app exit");
        ev_exit.write(AppExit::Success);
    }
}

mod camera;
mod config;

use bevy::{prelude::*, window::WindowResolution};
use bevy_rapier2d::prelude::*;
use bevy_runner_stream::RunnerStreamPlugin;

use crate::config::{CONFIG_PATH, ConfigLoaded, RunnerConfig};

fn main() -> AppExit {
  // The logger does not exist yet, so load errors go to stderr.
  let config_str = match std::fs::read_to_string(CONFIG_PATH) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Failed to read {}: {}", CONFIG_PATH, e);
      return AppExit::error();
    }
  };
  let resolved = RunnerConfig::from_toml_str(&config_str)
    .and_then(|config| ConfigLoaded::resolve(&config));
  let (loaded, settings) = match resolved {
    Ok(resolved) => resolved,
    Err(e) => {
      eprintln!("Invalid config {}: {}", CONFIG_PATH, e);
      return AppExit::error();
    }
  };

  let mut app = App::new();

  app
    .add_plugins(DefaultPlugins.set(WindowPlugin {
      primary_window: Some(Window {
        resolution: WindowResolution::new(loaded.window.width, loaded.window.height),
        title: loaded.window.title.clone(),
        ..default()
      }),
      ..default()
    }))
    .insert_resource(loaded)
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(32.0))
    .add_plugins(config::ConfigPlugin)
    .add_plugins(camera::CameraPlugin)
    // After DefaultPlugins so rendering is detected.
    .add_plugins(RunnerStreamPlugin::new(settings));

  #[cfg(feature = "visual_debug")]
  app.add_plugins(RapierDebugRenderPlugin::default());

  app.run()
}

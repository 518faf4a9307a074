use bevy::{
  asset::AssetEvent, camera::ScalingMode, ecs::message::MessageReader, prelude::*,
  window::PrimaryWindow,
};
use bevy_common_assets::toml::TomlAssetPlugin;

use super::{ConfigHandle, ConfigLoaded, RunnerConfig};

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
  fn build(&self, app: &mut App) {
    app
      .add_plugins(TomlAssetPlugin::<RunnerConfig>::new(&["config.toml"]))
      .add_systems(PreStartup, load_config_handle)
      .add_systems(
        Update,
        (
          watch_config_changes,
          update_window_on_config_change,
          update_camera_on_config_change,
        )
          .chain(),
      );
  }
}

/// Keeps the config asset loaded so edits on disk raise `AssetEvent`s.
fn load_config_handle(mut commands: Commands, asset_server: Res<AssetServer>) {
  let handle: Handle<RunnerConfig> = asset_server.load("config/runner.config.toml");
  commands.insert_resource(ConfigHandle(handle));
}

fn watch_config_changes(
  mut commands: Commands,
  config_handle: Res<ConfigHandle>,
  mut messages: MessageReader<AssetEvent<RunnerConfig>>,
  configs: Res<Assets<RunnerConfig>>,
) {
  for event in messages.read() {
    let AssetEvent::Modified { id } = event else {
      continue;
    };
    if config_handle.0.id() != *id {
      continue;
    }
    let Some(config) = configs.get(&config_handle.0) else {
      continue;
    };
    match ConfigLoaded::resolve(config) {
      Ok((loaded, settings)) => {
        info!("Config reloaded!");
        commands.insert_resource(loaded);
        commands.insert_resource(settings);
      }
      Err(e) => error!("Config reload rejected, keeping previous settings: {}", e),
    }
  }
}

fn update_window_on_config_change(
  config: Res<ConfigLoaded>,
  mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
  if !config.is_changed() {
    return;
  }
  if let Ok(mut window) = windows.single_mut() {
    window
      .resolution
      .set(config.window.width as f32, config.window.height as f32);
    window.title.clone_from(&config.window.title);
  }
}

fn update_camera_on_config_change(
  config: Res<ConfigLoaded>,
  mut camera_query: Query<&mut Projection, With<Camera2d>>,
) {
  if !config.is_changed() {
    return;
  }
  for mut projection in camera_query.iter_mut() {
    if let Projection::Orthographic(ref mut ortho) = *projection {
      ortho.scaling_mode = ScalingMode::AutoMin {
        min_width: config.camera.viewport_width,
        min_height: config.camera.viewport_height,
      };
    }
  }
}

mod plugin;

use bevy::{asset::Asset, prelude::*, reflect::TypePath};
use bevy_runner_stream::{ConfigError, StreamConfig, StreamSettings};
pub use plugin::ConfigPlugin;
use serde::Deserialize;

pub const CONFIG_PATH: &str = "assets/config/runner.config.toml";

#[derive(Asset, TypePath, Deserialize, Debug, Clone)]
pub struct RunnerConfig {
  pub window: WindowConfig,
  pub camera: CameraConfig,
  #[serde(flatten)]
  pub stream: StreamConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WindowConfig {
  pub width: u32,
  pub height: u32,
  pub title: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CameraConfig {
  pub viewport_width: f32,
  pub viewport_height: f32,
  /// Scroll acceleration in world units per second squared.
  pub scroll_accel: f32,
  pub max_speed: f32,
}

impl RunnerConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }
}

#[derive(Resource)]
pub struct ConfigHandle(pub Handle<RunnerConfig>);

/// Window and camera settings currently in effect.
#[derive(Resource, Debug, Clone)]
pub struct ConfigLoaded {
  pub window: WindowConfig,
  pub camera: CameraConfig,
}

impl ConfigLoaded {
  /// Splits a config into the app-level sections and validated stream
  /// settings. Nothing is applied if the stream sections are rejected.
  pub fn resolve(config: &RunnerConfig) -> Result<(Self, StreamSettings), ConfigError> {
    let settings = config.stream.to_settings()?;
    let loaded = Self {
      window: config.window.clone(),
      camera: config.camera.clone(),
    };
    Ok((loaded, settings))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shipped_config_resolves() {
    let source = include_str!("../../assets/config/runner.config.toml");
    let config = RunnerConfig::from_toml_str(source).unwrap();
    let (loaded, settings) = ConfigLoaded::resolve(&config).unwrap();

    assert!(loaded.camera.max_speed > 0.0);
    assert!(!settings.generator.catalog.early().is_empty());
  }

  #[test]
  fn missing_camera_section_is_a_parse_error() {
    let source = include_str!("../../assets/config/runner.config.toml")
      .replace("[camera]", "[camera_disabled]");
    assert!(matches!(
      RunnerConfig::from_toml_str(&source),
      Err(ConfigError::Parse(_))
    ));
  }
}

//! Runner Stream - windowed procedural streaming for endless runners in Bevy.
//!
//! Terrain tiles and obstacles are generated just ahead of a camera and
//! reclaimed just behind it. Reclaimed instances are pooled per template and
//! reused, so a run of any length touches a bounded number of entities.

use bevy::prelude::*;

pub mod catalog;
pub mod config;
pub mod plugin;
pub mod streaming;
#[cfg(feature = "visual_debug")]
mod visual_debug;

pub use catalog::{CatalogError, Template, TemplateCatalog, TemplateId, TemplateKind, TemplateVisual};
pub use config::{ConfigError, StreamConfig, StreamSettings};
pub use plugin::{
  InstanceEntities, InstancePlaced, InstanceReclaimed, PooledInstance, RunnerStream,
  RunnerStreamSet, StreamHalted, StreamingCamera,
};
pub use streaming::{
  GeneratorSettings, Instance, InstanceId, InstancePool, ObstacleSettings, Placement, PoolError,
  RemovalOrder, SettingsError, StepReport, StreamError, StreamGenerator, StreamingWindow,
  ViewBounds, WindowMargins,
};

/// Plugin for camera-driven terrain and obstacle streaming.
///
/// This plugin provides:
/// - Window tracking from the [`StreamingCamera`]'s orthographic view
/// - Terrain and obstacle generation with per-template pooling
/// - One entity per pooled instance, toggled with `Disabled`
/// - [`InstancePlaced`] / [`InstanceReclaimed`] messages
///
/// Streaming starts once a [`StreamSettings`] resource exists, either passed
/// here or inserted later (for example after loading a config file).
/// Replacing the resource restarts the stream from the current view.
#[derive(Default)]
pub struct RunnerStreamPlugin {
  /// Initial settings, inserted as a resource when present.
  pub settings: Option<StreamSettings>,
}

impl RunnerStreamPlugin {
  pub fn new(settings: StreamSettings) -> Self {
    Self {
      settings: Some(settings),
    }
  }
}

impl Plugin for RunnerStreamPlugin {
  fn build(&self, app: &mut App) {
    if let Some(settings) = &self.settings {
      app.insert_resource(settings.clone());
    }

    if app.is_plugin_added::<bevy::render::RenderPlugin>() {
      app.insert_resource(plugin::RenderingEnabled);
    }

    app.add_plugins(plugin::RunnerStreamSystemsPlugin);

    #[cfg(feature = "visual_debug")]
    if app.is_plugin_added::<bevy::render::RenderPlugin>() {
      app.add_plugins(visual_debug::VisualDebugPlugin);
    }
  }
}

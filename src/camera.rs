use bevy::{camera::ScalingMode, prelude::*};
use bevy_runner_stream::StreamingCamera;

use crate::config::ConfigLoaded;

/// Marker component for the game camera
#[derive(Component)]
pub struct GameCamera;

/// Current horizontal scroll speed, in world units per second.
#[derive(Resource, Default)]
pub struct ScrollSpeed(pub f32);

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
  fn build(&self, app: &mut App) {
    app
      .init_resource::<ScrollSpeed>()
      .add_systems(Startup, setup_camera)
      .add_systems(Update, auto_scroll);
  }
}

/// Orthographic 2D camera that drives streaming.
pub fn setup_camera(mut commands: Commands, config: Res<ConfigLoaded>) {
  commands.spawn((
    GameCamera,
    StreamingCamera,
    Camera2d,
    Camera {
      order: 0,
      clear_color: ClearColorConfig::Custom(Color::srgb(0.53, 0.75, 0.92)),
      ..default()
    },
    Projection::Orthographic(OrthographicProjection {
      near: -1000.0,
      far: 1000.0,
      scale: 1.0,
      viewport_origin: Vec2::new(0.5, 0.5),
      scaling_mode: ScalingMode::AutoMin {
        min_width: config.camera.viewport_width,
        min_height: config.camera.viewport_height,
      },
      area: Rect::default(),
    }),
  ));
}

/// Accelerates the camera to the right up to the configured top speed.
pub fn auto_scroll(
  time: Res<Time>,
  config: Res<ConfigLoaded>,
  mut speed: ResMut<ScrollSpeed>,
  mut camera_query: Query<&mut Transform, With<GameCamera>>,
) {
  let Ok(mut transform) = camera_query.single_mut() else {
    return;
  };
  let dt = time.delta_secs();
  speed.0 = step_speed(speed.0, config.camera.scroll_accel, config.camera.max_speed, dt);
  transform.translation.x += speed.0 * dt;
}

fn step_speed(speed: f32, accel: f32, max_speed: f32, dt: f32) -> f32 {
  (speed + accel * dt).clamp(0.0, max_speed)
}

//! Gizmo overlay for the streaming window edges.

use bevy::prelude::*;

use crate::plugin::{RunnerStream, RunnerStreamSet, StreamingCamera};

/// Height of the edge markers in world units.
const EDGE_LINE_HEIGHT: f32 = 320.0;

pub(crate) struct VisualDebugPlugin;

impl Plugin for VisualDebugPlugin {
  fn build(&self, app: &mut App) {
    app.add_systems(Update, draw_window_edges.after(RunnerStreamSet));
  }
}

/// Draws red vertical lines at the start and end of the last window.
fn draw_window_edges(
  mut gizmos: Gizmos,
  stream: Res<RunnerStream>,
  camera: Query<&GlobalTransform, With<StreamingCamera>>,
) {
  let Some(generator) = stream.generator() else {
    return;
  };
  let y = camera
    .single()
    .map(|t| t.translation().y)
    .unwrap_or_default();
  let window = generator.last_window();
  let half = EDGE_LINE_HEIGHT / 2.0;
  let color = Color::srgb(1.0, 0.0, 0.0);

  for x in [window.start, window.end] {
    gizmos.line_2d(Vec2::new(x, y - half), Vec2::new(x, y + half), color);
  }
}

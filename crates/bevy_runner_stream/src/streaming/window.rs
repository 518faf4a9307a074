//! Streaming window: the horizontal world interval that must be populated.

use bevy::prelude::*;

/// Horizontal extent of a camera view in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBounds {
  pub left: f32,
  pub right: f32,
}

impl ViewBounds {
  pub const fn new(left: f32, right: f32) -> Self {
    Self { left, right }
  }

  /// Projects an orthographic camera's viewport edges into world x.
  ///
  /// Returns `None` for perspective cameras and for orthographic cameras
  /// whose area has not been computed yet (Bevy fills it after the first
  /// frame).
  pub fn from_camera(transform: &GlobalTransform, projection: &Projection) -> Option<Self> {
    let Projection::Orthographic(ortho) = projection else {
      return None;
    };
    if ortho.area.max.x <= ortho.area.min.x {
      return None;
    }
    let x = transform.translation().x;
    Some(Self::new(x + ortho.area.min.x, x + ortho.area.max.x))
  }
}

/// Offsets added to the projected view edges.
///
/// A negative start offset keeps content alive behind the camera; a positive
/// end offset generates ahead of it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowMargins {
  pub start: f32,
  pub end: f32,
}

impl WindowMargins {
  pub const fn new(start: f32, end: f32) -> Self {
    Self { start, end }
  }
}

/// World interval `[start, end)` the streams must cover this step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamingWindow {
  pub start: f32,
  pub end: f32,
}

impl StreamingWindow {
  pub const fn new(start: f32, end: f32) -> Self {
    Self { start, end }
  }

  pub fn from_view(view: ViewBounds, margins: WindowMargins) -> Self {
    Self {
      start: view.left + margins.start,
      end: view.right + margins.end,
    }
  }

  pub fn width(&self) -> f32 {
    self.end - self.start
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn margins_shift_both_edges() {
    let window = StreamingWindow::from_view(
      ViewBounds::new(-400.0, 400.0),
      WindowMargins::new(-100.0, 250.0),
    );
    assert_eq!(window, StreamingWindow::new(-500.0, 650.0));
    assert_eq!(window.width(), 1150.0);
  }

  #[test]
  fn camera_view_follows_translation() {
    let projection = Projection::Orthographic(OrthographicProjection {
      area: Rect::new(-320.0, -180.0, 320.0, 180.0),
      ..OrthographicProjection::default_2d()
    });
    let transform = GlobalTransform::from(Transform::from_xyz(1000.0, 50.0, 0.0));

    let view = ViewBounds::from_camera(&transform, &projection).unwrap();
    assert_eq!(view, ViewBounds::new(680.0, 1320.0));
  }

  #[test]
  fn uninitialized_area_yields_no_view() {
    let projection = Projection::Orthographic(OrthographicProjection {
      area: Rect::default(),
      ..OrthographicProjection::default_2d()
    });
    let transform = GlobalTransform::default();
    assert!(ViewBounds::from_camera(&transform, &projection).is_none());
  }
}

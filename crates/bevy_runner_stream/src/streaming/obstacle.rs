//! Obstacle stream: sparse, randomly placed hazards on their own cadence.

use std::ops::Range;

use rand::Rng;

use super::lane::{Lane, RemovalOrder, StreamContext};
use super::pool::PoolError;
use crate::catalog::{TemplateCatalog, TemplateId, TemplateKind};

/// Placement parameters for obstacles.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleSettings {
  /// Distance between the terrain start and the first obstacle candidate.
  pub head_start: f32,
  /// Vertical placement range, sampled uniformly. Not terrain-aware.
  pub y_range: Range<f32>,
  /// Probability that a step runs the generate phase at all.
  pub spawn_chance: f64,
}

impl Default for ObstacleSettings {
  fn default() -> Self {
    Self {
      head_start: 100.0,
      y_range: -3.0..4.0,
      spawn_chance: 0.5,
    }
  }
}

/// Keeps obstacles populating the streaming window.
pub struct ObstacleStream {
  lane: Lane,
  templates: Vec<TemplateId>,
  settings: ObstacleSettings,
}

impl ObstacleStream {
  /// Seeds the generation cursor `head_start` past `window_start`.
  ///
  /// The removal cursor trails it by one terrain tile width, not one
  /// obstacle spacing.
  pub(crate) fn new(
    catalog: &TemplateCatalog,
    settings: ObstacleSettings,
    window_start: f32,
    removal_order: RemovalOrder,
  ) -> Self {
    let first = window_start + settings.head_start;
    Self {
      lane: Lane::new(
        TemplateKind::Obstacle,
        catalog.obstacle_spacing,
        first,
        first - catalog.tile_width,
        removal_order,
      ),
      templates: catalog.obstacles().to_vec(),
      settings,
    }
  }

  pub fn lane(&self) -> &Lane {
    &self.lane
  }

  pub fn settings(&self) -> &ObstacleSettings {
    &self.settings
  }

  /// Flips the per-step coin deciding whether obstacles generate this step.
  pub(crate) fn roll_spawn<R: Rng>(&self, rng: &mut R) -> bool {
    rng.random::<f64>() < self.settings.spawn_chance
  }

  /// Generates obstacles until the generation cursor reaches `window_end`.
  pub(crate) fn catch_up_generate<R: Rng>(
    &mut self,
    window_end: f32,
    rng: &mut R,
    ctx: &mut StreamContext,
  ) -> usize {
    let mut generated = 0;
    while self.lane.is_behind(window_end) {
      let template = self.templates[rng.random_range(0..self.templates.len())];
      let y = rng.random_range(self.settings.y_range.clone());
      self.lane.place_next(template, y, ctx);
      generated += 1;
    }
    generated
  }

  pub(crate) fn catch_up_remove(
    &mut self,
    window_start: f32,
    ctx: &mut StreamContext,
  ) -> Result<usize, PoolError> {
    self.lane.catch_up_remove(window_start, ctx)
  }
}

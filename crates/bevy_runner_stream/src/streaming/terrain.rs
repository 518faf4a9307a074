//! Terrain stream: back-to-back tiles at a fixed ground height.

use rand::Rng;

use super::lane::{Lane, RemovalOrder, StreamContext};
use super::pool::PoolError;
use crate::catalog::{TemplateCatalog, TemplateId, TemplateKind};

/// Keeps terrain tiles covering the streaming window.
pub struct TerrainStream {
  lane: Lane,
  templates: Vec<TemplateId>,
  early: Vec<TemplateId>,
  /// Index of the next unused entry in `early`.
  early_next: usize,
  ground_y: f32,
}

impl TerrainStream {
  /// Seeds the generation cursor at `window_start` and the removal cursor
  /// one tile behind it.
  pub(crate) fn new(
    catalog: &TemplateCatalog,
    ground_y: f32,
    window_start: f32,
    removal_order: RemovalOrder,
  ) -> Self {
    Self {
      lane: Lane::new(
        TemplateKind::Terrain,
        catalog.tile_width,
        window_start,
        window_start - catalog.tile_width,
        removal_order,
      ),
      templates: catalog.terrain().to_vec(),
      early: catalog.early().to_vec(),
      early_next: 0,
      ground_y,
    }
  }

  pub fn lane(&self) -> &Lane {
    &self.lane
  }

  /// Number of forced templates not yet placed.
  pub fn early_remaining(&self) -> usize {
    self.early.len() - self.early_next
  }

  /// Places every remaining forced template back to back, regardless of the
  /// window, so the opening sequence is always the first content.
  pub(crate) fn place_forced_sequence(&mut self, ctx: &mut StreamContext) -> usize {
    let mut placed = 0;
    while let Some(template) = self.take_early() {
      self.lane.place_next(template, self.ground_y, ctx);
      placed += 1;
    }
    placed
  }

  /// Generates tiles until the generation cursor reaches `window_end`.
  pub(crate) fn catch_up_generate<R: Rng>(
    &mut self,
    window_end: f32,
    rng: &mut R,
    ctx: &mut StreamContext,
  ) -> usize {
    let mut generated = 0;
    while self.lane.is_behind(window_end) {
      let template = match self.take_early() {
        Some(template) => template,
        None => self.templates[rng.random_range(0..self.templates.len())],
      };
      self.lane.place_next(template, self.ground_y, ctx);
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

  fn take_early(&mut self) -> Option<TemplateId> {
    let template = self.early.get(self.early_next).copied()?;
    self.early_next += 1;
    Some(template)
  }
}

//! Cursor bookkeeping shared by the terrain and obstacle streams.
//!
//! A lane owns a generation cursor, a removal cursor, the list of spawned
//! instances in spawn order, and the pool those instances return to.

use bevy::prelude::*;

use super::pool::{Instance, InstanceId, InstancePool, PoolError};
use crate::catalog::{TemplateId, TemplateKind};

/// How catch-up removal picks the instance to reclaim once the removal
/// cursor advances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOrder {
  /// First spawned instance whose x is at or behind the cursor. This can
  /// pick a farther instance over a closer one when the spawned list is not
  /// sorted by x.
  #[default]
  SpawnOrder,
  /// Leftmost instance at or behind the cursor.
  Leftmost,
}

/// Something that happened to an instance during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
  /// Instance became active at `position`.
  Placed {
    instance: InstanceId,
    template: TemplateId,
    kind: TemplateKind,
    position: Vec2,
    /// False when the instance was constructed for this placement.
    reused: bool,
  },
  /// Instance scrolled out and went back to its pool.
  Reclaimed {
    instance: InstanceId,
    template: TemplateId,
    kind: TemplateKind,
  },
}

/// Per-generator state the lanes share: id allocation and the placement log.
#[derive(Debug, Default)]
pub struct StreamContext {
  next_id: u32,
  placements: Vec<Placement>,
}

impl StreamContext {
  fn allocate(&mut self) -> InstanceId {
    let id = InstanceId(self.next_id);
    self.next_id += 1;
    id
  }

  /// Number of instances constructed so far across all lanes.
  pub fn allocated(&self) -> u32 {
    self.next_id
  }

  pub(crate) fn placements(&self) -> &[Placement] {
    &self.placements
  }

  pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Placement> {
    self.placements.drain(..)
  }
}

/// Generation and removal cursors over one kind of content.
pub struct Lane {
  kind: TemplateKind,
  spacing: f32,
  removal_order: RemovalOrder,
  last_generated_x: f32,
  last_removed_x: f32,
  spawned: Vec<Instance>,
  pool: InstancePool<Instance>,
}

impl Lane {
  pub(crate) fn new(
    kind: TemplateKind,
    spacing: f32,
    last_generated_x: f32,
    last_removed_x: f32,
    removal_order: RemovalOrder,
  ) -> Self {
    Self {
      kind,
      spacing,
      removal_order,
      last_generated_x,
      last_removed_x,
      spawned: Vec::new(),
      pool: InstancePool::new(),
    }
  }

  pub fn kind(&self) -> TemplateKind {
    self.kind
  }

  pub fn spacing(&self) -> f32 {
    self.spacing
  }

  /// X at which the next generated instance will be placed.
  pub fn last_generated_x(&self) -> f32 {
    self.last_generated_x
  }

  /// X up to which instances have been reclaimed.
  pub fn last_removed_x(&self) -> f32 {
    self.last_removed_x
  }

  /// Live instances in spawn order.
  pub fn spawned(&self) -> &[Instance] {
    &self.spawned
  }

  pub fn pool(&self) -> &InstancePool<Instance> {
    &self.pool
  }

  pub(crate) fn is_behind(&self, edge: f32) -> bool {
    self.last_generated_x < edge
  }

  /// Places `template` at `(last_generated_x, y)` and advances the cursor.
  pub(crate) fn place_next(&mut self, template: TemplateId, y: f32, ctx: &mut StreamContext) {
    let mut reused = true;
    let mut instance = self.pool.acquire(template, || {
      reused = false;
      Instance::new(ctx.allocate(), template)
    });
    if !reused {
      trace!(
        "Constructed {:?} instance {:?} of {:?}",
        self.kind, instance.id, template
      );
    }

    let position = Vec2::new(self.last_generated_x, y);
    instance.position = position;
    ctx.placements.push(Placement::Placed {
      instance: instance.id,
      template,
      kind: self.kind,
      position,
      reused,
    });
    self.spawned.push(instance);
    self.last_generated_x += self.spacing;
  }

  /// Advances the removal cursor up to `window_start` and reclaims one
  /// instance per advance.
  ///
  /// The cursor never passes the generation cursor. Returns the number of
  /// instances reclaimed.
  pub(crate) fn catch_up_remove(
    &mut self,
    window_start: f32,
    ctx: &mut StreamContext,
  ) -> Result<usize, PoolError> {
    let mut removed = 0;
    while self.last_removed_x + self.spacing < window_start
      && self.last_removed_x + self.spacing <= self.last_generated_x
    {
      self.last_removed_x += self.spacing;

      let Some(index) = self.find_removable(self.last_removed_x) else {
        trace!(
          "No {:?} instance at or behind x={}",
          self.kind, self.last_removed_x
        );
        continue;
      };

      let instance = self.spawned.remove(index);
      let (id, template) = (instance.id, instance.template);
      self.pool.release(template, instance)?;
      ctx.placements.push(Placement::Reclaimed {
        instance: id,
        template,
        kind: self.kind,
      });
      removed += 1;
    }
    Ok(removed)
  }

  fn find_removable(&self, cursor: f32) -> Option<usize> {
    let mut candidates = self
      .spawned
      .iter()
      .enumerate()
      .filter(|(_, i)| i.position.x <= cursor);

    match self.removal_order {
      RemovalOrder::SpawnOrder => candidates.next().map(|(index, _)| index),
      RemovalOrder::Leftmost => candidates
        .min_by(|(_, a), (_, b)| a.position.x.total_cmp(&b.position.x))
        .map(|(index, _)| index),
    }
  }

  #[cfg(test)]
  pub(crate) fn push_raw(&mut self, instance: Instance) {
    self.spawned.push(instance);
  }
}

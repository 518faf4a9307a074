//! Per-template instance pool.
//!
//! Instances are never destroyed once constructed. They move by value between
//! a stream's spawned list and an idle bucket here, so an instance cannot be
//! in both places or released twice.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::catalog::TemplateId;

/// Identity of a constructed instance, stable for the generator's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

/// Something that can be parked in an [`InstancePool`].
pub trait Poolable {
  /// Sets whether the instance is part of the world.
  fn set_active(&mut self, active: bool);
}

/// A placed occurrence of a template.
///
/// Deliberately not `Clone`: ownership is the bookkeeping.
#[derive(Debug, PartialEq)]
pub struct Instance {
  pub id: InstanceId,
  pub template: TemplateId,
  /// Placement position; `x` is the stream cursor it was generated at.
  pub position: Vec2,
  active: bool,
}

impl Instance {
  /// Creates an active instance.
  pub fn new(id: InstanceId, template: TemplateId) -> Self {
    Self {
      id,
      template,
      position: Vec2::ZERO,
      active: true,
    }
  }

  /// Returns true while the instance is part of the world.
  pub fn is_active(&self) -> bool {
    self.active
  }
}

impl Poolable for Instance {
  fn set_active(&mut self, active: bool) {
    self.active = active;
  }
}

/// Release of an instance the pool never dispensed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
  /// No bucket exists for the template, so nothing of this kind was ever
  /// acquired through this pool.
  UnregisteredTemplate(TemplateId),
}

impl std::fmt::Display for PoolError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::UnregisteredTemplate(id) => {
        write!(f, "released instance of unregistered template {:?}", id)
      }
    }
  }
}

impl std::error::Error for PoolError {}

/// Idle instances keyed by template.
pub struct InstancePool<T> {
  buckets: HashMap<TemplateId, Vec<T>>,
  constructed: usize,
}

impl<T: Poolable> InstancePool<T> {
  pub fn new() -> Self {
    Self {
      buckets: HashMap::new(),
      constructed: 0,
    }
  }

  /// Hands out an idle instance of `template`, or builds one with `factory`.
  ///
  /// The bucket for `template` is registered on first use, which is what
  /// makes a later [`InstancePool::release`] of that template legal.
  pub fn acquire(&mut self, template: TemplateId, factory: impl FnOnce() -> T) -> T {
    let bucket = self.buckets.entry(template).or_default();
    if let Some(mut item) = bucket.pop() {
      item.set_active(true);
      return item;
    }

    self.constructed += 1;
    let mut item = factory();
    item.set_active(true);
    item
  }

  /// Deactivates `item` and parks it in the bucket for `template`.
  ///
  /// On error the item is dropped: its bookkeeping is already inconsistent.
  pub fn release(&mut self, template: TemplateId, mut item: T) -> Result<(), PoolError> {
    let Some(bucket) = self.buckets.get_mut(&template) else {
      return Err(PoolError::UnregisteredTemplate(template));
    };
    item.set_active(false);
    bucket.push(item);
    Ok(())
  }

  /// Number of idle instances for `template`.
  pub fn idle_count(&self, template: TemplateId) -> usize {
    self.buckets.get(&template).map_or(0, Vec::len)
  }

  /// Total idle instances across all templates.
  pub fn total_idle(&self) -> usize {
    self.buckets.values().map(Vec::len).sum()
  }

  /// Number of times a factory was invoked.
  pub fn constructed(&self) -> usize {
    self.constructed
  }

  /// Returns true if `template` has ever been acquired.
  pub fn is_registered(&self, template: TemplateId) -> bool {
    self.buckets.contains_key(&template)
  }

  /// Iterates idle instances in no particular order.
  pub fn iter_idle(&self) -> impl Iterator<Item = &T> + '_ {
    self.buckets.values().flatten()
  }
}

impl<T: Poolable> Default for InstancePool<T> {
  fn default() -> Self {
    Self::new()
  }
}

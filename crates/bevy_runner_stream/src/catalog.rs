//! Template catalog.
//!
//! Templates are resolved once at configuration load into a flat table
//! indexed by [`TemplateId`]. Streams only ever hold ids; names exist for
//! configuration and diagnostics.

use bevy::prelude::*;

/// Stable identity of a template, assigned in declaration order at load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u16);

impl TemplateId {
  #[inline]
  pub const fn index(self) -> usize {
    self.0 as usize
  }
}

/// Which stream a template belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
  Terrain,
  Obstacle,
}

/// Visual and structural definition shared by every instance of a template.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateVisual {
  /// Extent in world units. The instance position is the left edge center.
  pub size: Vec2,
  pub color: Color,
}

/// Immutable content descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
  pub id: TemplateId,
  pub name: String,
  pub kind: TemplateKind,
  pub visual: TemplateVisual,
}

/// Static content configuration for both streams.
#[derive(Clone, Debug)]
pub struct TemplateCatalog {
  templates: Vec<Template>,
  terrain: Vec<TemplateId>,
  early: Vec<TemplateId>,
  obstacles: Vec<TemplateId>,
  /// Horizontal distance between consecutive terrain tiles.
  pub tile_width: f32,
  /// Horizontal distance between consecutive obstacle candidates.
  pub obstacle_spacing: f32,
}

impl TemplateCatalog {
  /// Starts an empty catalog with the given tiling constants.
  ///
  /// Use [`TemplateCatalog::add_terrain`], [`TemplateCatalog::add_obstacle`]
  /// and [`TemplateCatalog::push_early`] to fill it, then
  /// [`TemplateCatalog::validate`] before handing it to a generator.
  pub fn new(tile_width: f32, obstacle_spacing: f32) -> Self {
    Self {
      templates: Vec::new(),
      terrain: Vec::new(),
      early: Vec::new(),
      obstacles: Vec::new(),
      tile_width,
      obstacle_spacing,
    }
  }

  fn add(&mut self, name: &str, kind: TemplateKind, visual: TemplateVisual) -> TemplateId {
    let id = TemplateId(self.templates.len() as u16);
    self.templates.push(Template {
      id,
      name: name.to_owned(),
      kind,
      visual,
    });
    id
  }

  /// Registers a terrain template.
  pub fn add_terrain(&mut self, name: &str, visual: TemplateVisual) -> TemplateId {
    let id = self.add(name, TemplateKind::Terrain, visual);
    self.terrain.push(id);
    id
  }

  /// Registers an obstacle template.
  pub fn add_obstacle(&mut self, name: &str, visual: TemplateVisual) -> TemplateId {
    let id = self.add(name, TemplateKind::Obstacle, visual);
    self.obstacles.push(id);
    id
  }

  /// Appends a terrain template to the forced opening sequence.
  pub fn push_early(&mut self, id: TemplateId) {
    self.early.push(id);
  }

  pub fn get(&self, id: TemplateId) -> Option<&Template> {
    self.templates.get(id.index())
  }

  /// Looks up a template by its configured name.
  pub fn find(&self, name: &str) -> Option<&Template> {
    self.templates.iter().find(|t| t.name == name)
  }

  pub fn terrain(&self) -> &[TemplateId] {
    &self.terrain
  }

  pub fn early(&self) -> &[TemplateId] {
    &self.early
  }

  pub fn obstacles(&self) -> &[TemplateId] {
    &self.obstacles
  }

  pub fn len(&self) -> usize {
    self.templates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  /// Checks the invariants the streams rely on.
  ///
  /// Streaming never re-validates per step: an empty template set or a
  /// non-positive spacing would stall or loop the catch-up phases.
  pub fn validate(&self) -> Result<(), CatalogError> {
    if self.terrain.is_empty() {
      return Err(CatalogError::NoTerrainTemplates);
    }
    if self.obstacles.is_empty() {
      return Err(CatalogError::NoObstacleTemplates);
    }
    if !(self.tile_width > 0.0 && self.tile_width.is_finite()) {
      return Err(CatalogError::InvalidTileWidth(self.tile_width));
    }
    if !(self.obstacle_spacing > 0.0 && self.obstacle_spacing.is_finite()) {
      return Err(CatalogError::InvalidObstacleSpacing(self.obstacle_spacing));
    }
    for &id in &self.early {
      match self.get(id) {
        Some(t) if t.kind == TemplateKind::Terrain => {}
        _ => return Err(CatalogError::EarlyNotTerrain(id)),
      }
    }
    Ok(())
  }
}

/// Catalog invariant violated.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
  NoTerrainTemplates,
  NoObstacleTemplates,
  InvalidTileWidth(f32),
  InvalidObstacleSpacing(f32),
  /// An early-sequence entry does not name a terrain template.
  EarlyNotTerrain(TemplateId),
}

impl std::fmt::Display for CatalogError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NoTerrainTemplates => write!(f, "no terrain templates configured"),
      Self::NoObstacleTemplates => write!(f, "no obstacle templates configured"),
      Self::InvalidTileWidth(w) => write!(f, "tile width must be positive, got {}", w),
      Self::InvalidObstacleSpacing(s) => {
        write!(f, "obstacle spacing must be positive, got {}", s)
      }
      Self::EarlyNotTerrain(id) => {
        write!(f, "early sequence entry {:?} is not a terrain template", id)
      }
    }
  }
}

impl std::error::Error for CatalogError {}

#[cfg(test)]
mod tests {
  use super::*;

  fn visual() -> TemplateVisual {
    TemplateVisual {
      size: Vec2::new(100.0, 20.0),
      color: Color::WHITE,
    }
  }

  #[test]
  fn ids_follow_declaration_order_across_kinds() {
    let mut catalog = TemplateCatalog::new(100.0, 200.0);
    let a = catalog.add_terrain("flat", visual());
    let b = catalog.add_obstacle("spike", visual());
    let c = catalog.add_terrain("gap", visual());

    assert_eq!((a, b, c), (TemplateId(0), TemplateId(1), TemplateId(2)));
    assert_eq!(catalog.terrain(), &[a, c]);
    assert_eq!(catalog.obstacles(), &[b]);
    assert_eq!(catalog.find("gap").map(|t| t.id), Some(c));
  }

  #[test]
  fn validate_rejects_bad_catalogs() {
    let empty = TemplateCatalog::new(100.0, 200.0);
    assert_eq!(empty.validate(), Err(CatalogError::NoTerrainTemplates));

    let mut no_obstacles = TemplateCatalog::new(100.0, 200.0);
    no_obstacles.add_terrain("flat", visual());
    assert_eq!(
      no_obstacles.validate(),
      Err(CatalogError::NoObstacleTemplates)
    );

    let mut zero_width = TemplateCatalog::new(0.0, 200.0);
    zero_width.add_terrain("flat", visual());
    zero_width.add_obstacle("spike", visual());
    assert_eq!(zero_width.validate(), Err(CatalogError::InvalidTileWidth(0.0)));

    let mut bad_early = TemplateCatalog::new(100.0, 200.0);
    bad_early.add_terrain("flat", visual());
    let spike = bad_early.add_obstacle("spike", visual());
    bad_early.push_early(spike);
    assert_eq!(bad_early.validate(), Err(CatalogError::EarlyNotTerrain(spike)));
  }
}

//! Streaming generator: both streams, their pools, and the random source.

use bevy::log::{debug, info};
use rand::Rng;

use super::lane::{Placement, RemovalOrder, StreamContext};
use super::obstacle::{ObstacleSettings, ObstacleStream};
use super::pool::PoolError;
use super::terrain::TerrainStream;
use super::window::{StreamingWindow, WindowMargins};
use crate::catalog::{CatalogError, TemplateCatalog};

/// Everything a generator needs besides its random source and first window.
#[derive(Clone, Debug)]
pub struct GeneratorSettings {
  pub catalog: TemplateCatalog,
  pub margins: WindowMargins,
  /// Height every terrain tile is placed at.
  pub ground_y: f32,
  pub obstacles: ObstacleSettings,
  pub removal_order: RemovalOrder,
}

impl GeneratorSettings {
  /// Validates the catalog and obstacle parameters.
  pub fn validate(&self) -> Result<(), SettingsError> {
    self.catalog.validate()?;
    // An infinite cursor never advances, so catch-up would not terminate.
    for (name, value) in [
      ("area_start_offset", self.margins.start),
      ("area_end_offset", self.margins.end),
      ("ground_y", self.ground_y),
      ("head_start", self.obstacles.head_start),
    ] {
      if !value.is_finite() {
        return Err(SettingsError::NonFinite(name, value));
      }
    }
    let range = &self.obstacles.y_range;
    if !(range.start < range.end && range.start.is_finite() && range.end.is_finite()) {
      return Err(SettingsError::InvalidHeightRange(range.start, range.end));
    }
    if !(0.0..=1.0).contains(&self.obstacles.spawn_chance) {
      return Err(SettingsError::InvalidSpawnChance(
        self.obstacles.spawn_chance,
      ));
    }
    Ok(())
  }
}

/// Generator settings rejected before streaming starts.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
  Catalog(CatalogError),
  /// Obstacle height range is empty or not finite.
  InvalidHeightRange(f32, f32),
  /// Spawn chance outside `[0, 1]`.
  InvalidSpawnChance(f64),
  /// Named offset or height is infinite or NaN.
  NonFinite(&'static str, f32),
}

impl From<CatalogError> for SettingsError {
  fn from(err: CatalogError) -> Self {
    Self::Catalog(err)
  }
}

impl std::fmt::Display for SettingsError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Catalog(e) => write!(f, "{}", e),
      Self::InvalidHeightRange(lo, hi) => {
        write!(f, "obstacle height range [{}, {}) is empty", lo, hi)
      }
      Self::InvalidSpawnChance(p) => write!(f, "spawn chance {} is outside [0, 1]", p),
      Self::NonFinite(name, value) => write!(f, "{} must be finite, got {}", name, value),
    }
  }
}

impl std::error::Error for SettingsError {}

/// Fatal streaming failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
  Pool(PoolError),
}

impl From<PoolError> for StreamError {
  fn from(err: PoolError) -> Self {
    Self::Pool(err)
  }
}

impl std::fmt::Display for StreamError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Pool(e) => write!(f, "pool consistency violation: {}", e),
    }
  }
}

impl std::error::Error for StreamError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Pool(e) => Some(e),
    }
  }
}

/// What a single step did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
  pub terrain_generated: usize,
  pub terrain_removed: usize,
  pub obstacles_generated: usize,
  pub obstacles_removed: usize,
  /// The obstacle coin flip came up empty this step.
  pub obstacles_skipped: bool,
}

/// Windowed procedural generator with pooled instances.
///
/// Call [`StreamGenerator::step`] once per simulation step with the current
/// window. Generated and reclaimed instances are logged as [`Placement`]s,
/// retrieved with [`StreamGenerator::drain_placements`].
pub struct StreamGenerator<R> {
  terrain: TerrainStream,
  obstacles: ObstacleStream,
  ctx: StreamContext,
  rng: R,
  last_window: StreamingWindow,
  steps: u64,
}

impl<R: Rng> StreamGenerator<R> {
  /// Builds a generator and populates `initial` with the forced opening
  /// sequence followed by random terrain.
  ///
  /// No obstacles are generated until the first [`StreamGenerator::step`].
  pub fn new(
    settings: &GeneratorSettings,
    rng: R,
    initial: StreamingWindow,
  ) -> Result<Self, SettingsError> {
    settings.validate()?;

    let mut generator = Self {
      terrain: TerrainStream::new(
        &settings.catalog,
        settings.ground_y,
        initial.start,
        settings.removal_order,
      ),
      obstacles: ObstacleStream::new(
        &settings.catalog,
        settings.obstacles.clone(),
        initial.start,
        settings.removal_order,
      ),
      ctx: StreamContext::default(),
      rng,
      last_window: initial,
      steps: 0,
    };

    let forced = generator.terrain.place_forced_sequence(&mut generator.ctx);
    let random = generator
      .terrain
      .catch_up_generate(initial.end, &mut generator.rng, &mut generator.ctx);

    info!(
      "Stream initialized over [{}, {}): {} forced + {} random tiles",
      initial.start, initial.end, forced, random
    );

    Ok(generator)
  }

  /// Runs one generate/remove pass against `window`.
  ///
  /// Order: terrain generate, obstacle generate (if the coin flip allows),
  /// terrain remove, obstacle remove.
  pub fn step(&mut self, window: StreamingWindow) -> Result<StepReport, StreamError> {
    let mut report = StepReport {
      terrain_generated: self
        .terrain
        .catch_up_generate(window.end, &mut self.rng, &mut self.ctx),
      ..Default::default()
    };

    if self.obstacles.roll_spawn(&mut self.rng) {
      report.obstacles_generated =
        self
          .obstacles
          .catch_up_generate(window.end, &mut self.rng, &mut self.ctx);
    } else {
      report.obstacles_skipped = true;
    }

    report.terrain_removed = self.terrain.catch_up_remove(window.start, &mut self.ctx)?;
    report.obstacles_removed = self
      .obstacles
      .catch_up_remove(window.start, &mut self.ctx)?;

    self.last_window = window;
    self.steps += 1;

    if report.terrain_generated + report.obstacles_generated > 0
      || report.terrain_removed + report.obstacles_removed > 0
    {
      debug!("Stream step {}: {:?}", self.steps, report);
    }

    Ok(report)
  }

  /// Takes the placement log accumulated since the previous drain.
  pub fn drain_placements(&mut self) -> impl Iterator<Item = Placement> + '_ {
    self.ctx.drain()
  }

  /// Placements not yet drained.
  pub fn pending_placements(&self) -> &[Placement] {
    self.ctx.placements()
  }

  pub fn terrain(&self) -> &TerrainStream {
    &self.terrain
  }

  pub fn obstacles(&self) -> &ObstacleStream {
    &self.obstacles
  }

  /// The window the generator last caught up to.
  pub fn last_window(&self) -> StreamingWindow {
    self.last_window
  }

  /// Number of completed steps.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Instances constructed across both pools.
  pub fn constructed(&self) -> u32 {
    self.ctx.allocated()
  }
}

#[cfg(test)]
mod tests {
  use bevy::prelude::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  use super::*;
  use crate::catalog::{TemplateId, TemplateVisual};

  fn settings(early: &[&str]) -> GeneratorSettings {
    let visual = TemplateVisual {
      size: Vec2::new(100.0, 20.0),
      color: Color::WHITE,
    };
    let mut catalog = TemplateCatalog::new(100.0, 200.0);
    for name in ["flat", "hill", "pit"] {
      catalog.add_terrain(name, visual.clone());
    }
    catalog.add_obstacle("spike", visual);
    for name in early {
      let id = catalog.find(name).map(|t| t.id).unwrap();
      catalog.push_early(id);
    }
    GeneratorSettings {
      catalog,
      margins: WindowMargins::default(),
      ground_y: -4.5,
      obstacles: ObstacleSettings::default(),
      removal_order: RemovalOrder::SpawnOrder,
    }
  }

  fn generator(early: &[&str], seed: u64) -> StreamGenerator<StdRng> {
    StreamGenerator::new(
      &settings(early),
      StdRng::seed_from_u64(seed),
      StreamingWindow::new(0.0, 1000.0),
    )
    .unwrap()
  }

  #[test]
  fn initial_window_is_covered_by_terrain_only() {
    let generator = generator(&[], 1);

    assert_eq!(generator.terrain().lane().spawned().len(), 10);
    assert_eq!(generator.terrain().lane().last_generated_x(), 1000.0);
    assert!(generator.obstacles().lane().spawned().is_empty());
    assert_eq!(generator.pending_placements().len(), 10);
  }

  #[test]
  fn scrolling_scenario_generates_five_and_reclaims_five() {
    let mut generator = generator(&[], 1);

    let report = generator.step(StreamingWindow::new(500.0, 1500.0)).unwrap();

    assert_eq!(report.terrain_generated, 5);
    assert_eq!(report.terrain_removed, 5);
    assert_eq!(generator.terrain().lane().last_removed_x(), 400.0);
    let xs: Vec<f32> = generator
      .terrain()
      .lane()
      .spawned()
      .iter()
      .map(|i| i.position.x)
      .collect();
    assert_eq!(
      xs,
      vec![500.0, 600.0, 700.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1300.0, 1400.0]
    );
    assert_eq!(generator.terrain().lane().pool().total_idle(), 5);
  }

  #[test]
  fn forced_sequence_does_not_depend_on_seed() {
    let early = ["pit", "pit", "hill", "flat", "pit"];
    let expected: Vec<TemplateId> = early
      .iter()
      .map(|name| settings(&[]).catalog.find(name).unwrap().id)
      .collect();

    for seed in 0..16 {
      let generator = generator(&early, seed);
      let first: Vec<TemplateId> = generator
        .terrain()
        .lane()
        .spawned()
        .iter()
        .take(early.len())
        .map(|i| i.template)
        .collect();
      assert_eq!(first, expected, "seed {}", seed);
    }
  }

  #[test]
  fn drained_log_is_empty_afterwards() {
    let mut generator = generator(&[], 2);
    assert_eq!(generator.drain_placements().count(), 10);
    assert!(generator.pending_placements().is_empty());
  }

  #[test]
  fn invalid_catalog_is_rejected() {
    let mut bad = settings(&[]);
    bad.catalog.tile_width = -1.0;
    let result = StreamGenerator::new(
      &bad,
      StdRng::seed_from_u64(0),
      StreamingWindow::new(0.0, 10.0),
    );
    assert!(matches!(
      result,
      Err(SettingsError::Catalog(CatalogError::InvalidTileWidth(_)))
    ));

    let mut flat_range = settings(&[]);
    flat_range.obstacles.y_range = 2.0..2.0;
    assert_eq!(
      flat_range.validate(),
      Err(SettingsError::InvalidHeightRange(2.0, 2.0))
    );
  }

  #[test]
  fn infinite_offsets_are_rejected() {
    let mut behind = settings(&[]);
    behind.obstacles.head_start = f32::NEG_INFINITY;
    assert_eq!(
      behind.validate(),
      Err(SettingsError::NonFinite("head_start", f32::NEG_INFINITY))
    );

    let mut ahead = settings(&[]);
    ahead.margins.end = f32::INFINITY;
    let result = StreamGenerator::new(
      &ahead,
      StdRng::seed_from_u64(0),
      StreamingWindow::new(0.0, 10.0),
    );
    assert!(matches!(
      result,
      Err(SettingsError::NonFinite("area_end_offset", _))
    ));

    let mut sunk = settings(&[]);
    sunk.ground_y = f32::NAN;
    assert!(matches!(
      sunk.validate(),
      Err(SettingsError::NonFinite("ground_y", _))
    ));
  }
}

//! Long-run properties of the streaming generator under random scrolling.
//!
//! Run: cargo test -p bevy_runner_stream --test stream_properties

use bevy::prelude::*;
use bevy_runner_stream::{
  GeneratorSettings, ObstacleSettings, Placement, RemovalOrder, StepReport, StreamGenerator,
  StreamingWindow, TemplateCatalog, TemplateId, TemplateKind, TemplateVisual, WindowMargins,
};
use rand::prelude::*;
use rand::rngs::StdRng;

const TILE: f32 = 100.0;
const SPACING: f32 = 250.0;
const WIDTH: f32 = 1000.0;

fn visual() -> TemplateVisual {
  TemplateVisual {
    size: Vec2::new(TILE, 20.0),
    color: Color::WHITE,
  }
}

fn settings(order: RemovalOrder, spawn_chance: f64) -> GeneratorSettings {
  let mut catalog = TemplateCatalog::new(TILE, SPACING);
  let flat = catalog.add_terrain("flat", visual());
  catalog.add_terrain("hill", visual());
  let pit = catalog.add_terrain("pit", visual());
  catalog.add_obstacle("spike", visual());
  catalog.add_obstacle("saw", visual());
  for id in [flat, flat, pit] {
    catalog.push_early(id);
  }

  GeneratorSettings {
    catalog,
    margins: WindowMargins::new(-50.0, 150.0),
    ground_y: -4.5,
    obstacles: ObstacleSettings {
      spawn_chance,
      ..default()
    },
    removal_order: order,
  }
}

struct Run {
  generator: StreamGenerator<StdRng>,
  scroll: StdRng,
  window: StreamingWindow,
}

impl Run {
  fn new(order: RemovalOrder, spawn_chance: f64, seed: u64) -> Self {
    let window = StreamingWindow::new(0.0, WIDTH);
    let generator = StreamGenerator::new(
      &settings(order, spawn_chance),
      StdRng::seed_from_u64(seed),
      window,
    )
    .unwrap();
    Self {
      generator,
      scroll: StdRng::seed_from_u64(seed ^ 0x5eed),
      window,
    }
  }

  /// Scrolls forward by a random amount, sometimes not at all.
  fn advance(&mut self) -> StepReport {
    let dx = match self.scroll.random_range(0..10) {
      0 => 0.0,
      1 => self.scroll.random_range(200.0..600.0),
      _ => self.scroll.random_range(0.0..40.0),
    };
    self.window = StreamingWindow::new(self.window.start + dx, self.window.end + dx);
    self.generator.step(self.window).unwrap()
  }
}

fn terrain_xs(generator: &StreamGenerator<StdRng>) -> Vec<f32> {
  generator
    .terrain()
    .lane()
    .spawned()
    .iter()
    .map(|i| i.position.x)
    .collect()
}

#[test]
fn terrain_stays_contiguous_and_covers_the_window() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.5, 3);

  for step in 0..3000 {
    run.advance();
    let lane = run.generator.terrain().lane();
    let xs = terrain_xs(&run.generator);

    assert!(!xs.is_empty(), "step {}: no terrain", step);
    for pair in xs.windows(2) {
      assert_eq!(pair[1] - pair[0], TILE, "step {}: gap in {:?}", step, xs);
    }
    assert_eq!(xs[xs.len() - 1] + TILE, lane.last_generated_x());
    assert!(lane.last_generated_x() >= run.window.end);
    assert_eq!(xs[0], lane.last_removed_x() + TILE);
    assert!(xs[0] >= run.window.start && xs[0] <= run.window.start + TILE);
  }
}

#[test]
fn cursors_are_monotonic_and_removal_trails_generation() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.5, 11);
  let mut prev = [(0.0f32, f32::MIN); 2];

  for step in 0..2000 {
    let report = run.advance();
    let obstacles = run.generator.obstacles().lane();
    if !report.obstacles_skipped {
      assert!(
        obstacles.last_generated_x() >= run.window.end,
        "step {}: obstacles stop short of the window end",
        step
      );
    }
    let lanes = [run.generator.terrain().lane(), obstacles];

    for (lane, prev) in lanes.into_iter().zip(prev.iter_mut()) {
      let (generated, removed) = (lane.last_generated_x(), lane.last_removed_x());
      assert!(generated >= prev.0, "step {}: generation moved back", step);
      assert!(removed >= prev.1, "step {}: removal moved back", step);
      assert!(removed <= generated, "step {}: removal passed generation", step);
      *prev = (generated, removed);
    }
  }
}

#[test]
fn pools_bound_constructions_over_long_runs() {
  for order in [RemovalOrder::SpawnOrder, RemovalOrder::Leftmost] {
    let mut run = Run::new(order, 0.5, 5);
    let mut max_live = [run.generator.terrain().lane().spawned().len(), 0];

    for _ in 0..5000 {
      let report = run.advance();
      let lanes = [run.generator.terrain().lane(), run.generator.obstacles().lane()];
      // Generation runs before removal, so the peak is live plus reclaimed.
      let reclaimed = [report.terrain_removed, report.obstacles_removed];
      for ((lane, max), reclaimed) in lanes.into_iter().zip(max_live.iter_mut()).zip(reclaimed) {
        // Every constructed instance is either live or parked.
        assert_eq!(
          lane.spawned().len() + lane.pool().total_idle(),
          lane.pool().constructed()
        );
        assert!(lane.spawned().iter().all(|i| i.is_active()));
        assert!(lane.pool().iter_idle().all(|i| !i.is_active()));
        *max = (*max).max(lane.spawned().len() + reclaimed);
      }
    }

    // A template only constructs when all of its instances are live.
    let terrain = run.generator.terrain().lane();
    let obstacles = run.generator.obstacles().lane();
    assert!(terrain.pool().constructed() <= 3 * max_live[0]);
    assert!(obstacles.pool().constructed() <= 2 * max_live[1]);
    assert_eq!(
      run.generator.constructed() as usize,
      terrain.pool().constructed() + obstacles.pool().constructed()
    );
  }
}

#[test]
fn obstacles_stay_on_their_grid_and_height_range() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.5, 21);
  let origin = ObstacleSettings::default().head_start;

  for _ in 0..1500 {
    run.advance();
    for instance in run.generator.obstacles().lane().spawned() {
      let offset = (instance.position.x - origin) / SPACING;
      assert_eq!(offset, offset.round(), "off-grid x {}", instance.position.x);
      assert!((-3.0..4.0).contains(&instance.position.y));
    }
  }
}

#[test]
fn zero_spawn_chance_never_generates_obstacles() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.0, 8);
  for _ in 0..500 {
    run.advance();
  }
  let lane = run.generator.obstacles().lane();
  assert_eq!(lane.pool().constructed(), 0);
  assert_eq!(lane.last_generated_x(), ObstacleSettings::default().head_start);
}

#[test]
fn obstacle_coin_flip_skips_about_half_the_steps() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.5, 13);
  let steps = 4000;
  let skipped = (0..steps).filter(|_| run.advance().obstacles_skipped).count();

  let ratio = skipped as f64 / steps as f64;
  assert!((0.45..0.55).contains(&ratio), "skip ratio {}", ratio);
}

#[test]
fn same_seed_replays_the_same_placements() {
  let log = |seed: u64| -> Vec<Placement> {
    let mut run = Run::new(RemovalOrder::SpawnOrder, 0.5, seed);
    let mut log: Vec<Placement> = run.generator.drain_placements().collect();
    for _ in 0..300 {
      run.advance();
      log.extend(run.generator.drain_placements());
    }
    log
  };

  assert_eq!(log(42), log(42));
  assert_ne!(log(42), log(43));
}

#[test]
fn opening_sequence_leads_every_run() {
  let catalog = settings(RemovalOrder::SpawnOrder, 0.5).catalog;
  let expected: Vec<TemplateId> = catalog.early().to_vec();

  for seed in 0..32 {
    let run = Run::new(RemovalOrder::SpawnOrder, 0.5, seed);
    let first: Vec<TemplateId> = run
      .generator
      .terrain()
      .lane()
      .spawned()
      .iter()
      .take(expected.len())
      .map(|i| i.template)
      .collect();
    assert_eq!(first, expected, "seed {}", seed);
    assert_eq!(run.generator.terrain().early_remaining(), 0);
  }
}

#[test]
fn scrolling_backwards_changes_nothing() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 0.0, 1);
  let _ = run.generator.drain_placements().count();

  let report = run
    .generator
    .step(StreamingWindow::new(-500.0, 500.0))
    .unwrap();

  assert_eq!(report.terrain_generated, 0);
  assert_eq!(report.terrain_removed, 0);
  assert_eq!(report.obstacles_generated, 0);
  assert!(report.obstacles_skipped);
  assert_eq!(terrain_xs(&run.generator).len(), 10);
  assert!(run.generator.pending_placements().is_empty());
}

#[test]
fn reclaimed_instances_come_back_as_reused_placements() {
  let mut run = Run::new(RemovalOrder::SpawnOrder, 1.0, 9);
  let _ = run.generator.drain_placements().count();

  let (mut placed, mut reused) = (0, 0);
  for _ in 0..400 {
    run.advance();
    for placement in run.generator.drain_placements() {
      if let Placement::Placed {
        kind: TemplateKind::Terrain,
        reused: was_reused,
        ..
      } = placement
      {
        placed += 1;
        reused += usize::from(was_reused);
      }
    }
  }

  assert!(reused > 0);
  assert!(run.generator.terrain().lane().pool().constructed() < placed / 2);
}

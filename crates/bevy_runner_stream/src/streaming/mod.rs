//! Windowed procedural streaming.
//!
//! This module provides the engine-independent core:
//! - [`InstancePool`]: per-template cache of idle instances
//! - [`StreamingWindow`]: world interval derived from the camera view
//! - [`TerrainStream`] / [`ObstacleStream`]: cursor-driven generate/remove
//! - [`StreamGenerator`]: owns both streams and steps them together

mod generator;
mod lane;
mod obstacle;
mod pool;
mod terrain;
mod window;

pub use generator::{GeneratorSettings, SettingsError, StepReport, StreamError, StreamGenerator};
pub use lane::{Lane, Placement, RemovalOrder, StreamContext};
pub use obstacle::{ObstacleSettings, ObstacleStream};
pub use pool::{Instance, InstanceId, InstancePool, PoolError, Poolable};
pub use terrain::TerrainStream;
pub use window::{StreamingWindow, ViewBounds, WindowMargins};

//! TOML configuration for the streaming generator.
//!
//! Template names are resolved to [`TemplateId`](crate::TemplateId)s here;
//! nothing downstream looks templates up by name.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Deserializer, de};

use crate::catalog::{TemplateCatalog, TemplateKind, TemplateVisual};
use crate::streaming::{
  GeneratorSettings, ObstacleSettings, RemovalOrder, SettingsError, WindowMargins,
};

/// Streaming sections of a configuration file.
#[derive(Deserialize, Debug, Clone)]
pub struct StreamConfig {
  pub streaming: StreamingSection,
  pub terrain: TerrainSection,
  pub obstacles: ObstacleSection,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StreamingSection {
  /// Fixed seed for reproducible runs. Absent means seeded from the OS.
  #[serde(default)]
  pub seed: Option<u64>,
  /// Added to the camera's left edge. Negative keeps content behind it.
  pub area_start_offset: f32,
  /// Added to the camera's right edge.
  pub area_end_offset: f32,
  #[serde(default)]
  pub removal_order: RemovalOrder,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TerrainSection {
  pub tile_width: f32,
  pub ground_y: f32,
  /// Names of terrain templates forced at the start of the run, in order.
  #[serde(default)]
  pub early: Vec<String>,
  pub templates: Vec<TemplateConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ObstacleSection {
  pub spacing: f32,
  #[serde(default = "default_head_start")]
  pub head_start: f32,
  #[serde(default = "default_y_range")]
  pub y_range: [f32; 2],
  #[serde(default = "default_spawn_chance")]
  pub spawn_chance: f64,
  pub templates: Vec<TemplateConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TemplateConfig {
  pub name: String,
  pub size: [f32; 2],
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub color: [f32; 3],
}

fn default_head_start() -> f32 {
  ObstacleSettings::default().head_start
}

fn default_y_range() -> [f32; 2] {
  let range = ObstacleSettings::default().y_range;
  [range.start, range.end]
}

fn default_spawn_chance() -> f64 {
  ObstacleSettings::default().spawn_chance
}

fn deserialize_hex_color<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
where
  D: Deserializer<'de>,
{
  let s: String = Deserialize::deserialize(deserializer)?;
  let s = s.trim_start_matches('#');
  if s.len() != 6 || !s.is_ascii() {
    return Err(de::Error::custom("hex color must be 6 ASCII characters"));
  }
  let r = u8::from_str_radix(&s[0..2], 16).map_err(de::Error::custom)?;
  let g = u8::from_str_radix(&s[2..4], 16).map_err(de::Error::custom)?;
  let b = u8::from_str_radix(&s[4..6], 16).map_err(de::Error::custom)?;
  Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

/// Fully resolved streaming configuration, ready for a generator.
#[derive(Resource, Clone, Debug)]
pub struct StreamSettings {
  pub generator: GeneratorSettings,
  pub seed: Option<u64>,
}

/// Configuration rejected at load.
#[derive(Debug)]
pub enum ConfigError {
  Parse(toml::de::Error),
  DuplicateTemplate(String),
  UnknownEarlyTemplate(String),
  /// The early list names an obstacle template.
  EarlyNotTerrain(String),
  Settings(SettingsError),
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

impl From<SettingsError> for ConfigError {
  fn from(err: SettingsError) -> Self {
    Self::Settings(err)
  }
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Parse(e) => write!(f, "parse error: {}", e),
      Self::DuplicateTemplate(name) => write!(f, "template '{}' is defined twice", name),
      Self::UnknownEarlyTemplate(name) => {
        write!(f, "early sequence names unknown template '{}'", name)
      }
      Self::EarlyNotTerrain(name) => {
        write!(f, "early sequence names obstacle template '{}'", name)
      }
      Self::Settings(e) => write!(f, "{}", e),
    }
  }
}

impl std::error::Error for ConfigError {}

impl StreamConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  /// Resolves names to ids and validates everything streaming relies on.
  pub fn to_settings(&self) -> Result<StreamSettings, ConfigError> {
    let mut catalog = TemplateCatalog::new(self.terrain.tile_width, self.obstacles.spacing);
    let mut seen = HashSet::new();

    for (kind, template) in self
      .terrain
      .templates
      .iter()
      .map(|t| (TemplateKind::Terrain, t))
      .chain(
        self
          .obstacles
          .templates
          .iter()
          .map(|t| (TemplateKind::Obstacle, t)),
      )
    {
      if !seen.insert(template.name.as_str()) {
        return Err(ConfigError::DuplicateTemplate(template.name.clone()));
      }
      let visual = template.visual();
      match kind {
        TemplateKind::Terrain => catalog.add_terrain(&template.name, visual),
        TemplateKind::Obstacle => catalog.add_obstacle(&template.name, visual),
      };
    }

    for name in &self.terrain.early {
      let Some(template) = catalog.find(name) else {
        return Err(ConfigError::UnknownEarlyTemplate(name.clone()));
      };
      if template.kind != TemplateKind::Terrain {
        return Err(ConfigError::EarlyNotTerrain(name.clone()));
      }
      let id = template.id;
      catalog.push_early(id);
    }

    let [y_min, y_max] = self.obstacles.y_range;
    let generator = GeneratorSettings {
      catalog,
      margins: WindowMargins::new(
        self.streaming.area_start_offset,
        self.streaming.area_end_offset,
      ),
      ground_y: self.terrain.ground_y,
      obstacles: ObstacleSettings {
        head_start: self.obstacles.head_start,
        y_range: y_min..y_max,
        spawn_chance: self.obstacles.spawn_chance,
      },
      removal_order: self.streaming.removal_order,
    };
    generator.validate()?;

    Ok(StreamSettings {
      generator,
      seed: self.streaming.seed,
    })
  }
}

impl TemplateConfig {
  fn visual(&self) -> TemplateVisual {
    TemplateVisual {
      size: Vec2::from(self.size),
      color: Color::srgb(self.color[0], self.color[1], self.color[2]),
    }
  }
}

//! Bevy integration: drives the generator from a camera and mirrors its
//! instances onto entities.
//!
//! Each pooled instance gets one entity for its whole lifetime. Reclaimed
//! instances keep their entity with [`Disabled`] inserted, so they drop out of
//! rendering and physics queries until the pool hands them out again.

use std::collections::HashMap;

use bevy::ecs::entity_disabling::Disabled;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{TemplateId, TemplateKind};
use crate::config::StreamSettings;
use crate::streaming::{
  InstanceId, Placement, StreamError, StreamGenerator, StreamingWindow, ViewBounds,
};

/// Marker component for the camera whose view drives streaming.
#[derive(Component)]
pub struct StreamingCamera;

/// Entity backing a pooled instance.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PooledInstance {
  pub id: InstanceId,
  pub template: TemplateId,
  pub kind: TemplateKind,
}

/// Emitted when an instance becomes part of the world.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct InstancePlaced {
  pub instance: InstanceId,
  pub template: TemplateId,
  pub kind: TemplateKind,
  /// Left edge of the instance, vertically at its placement height.
  pub position: Vec2,
  pub reused: bool,
}

/// Emitted when an instance scrolls out and returns to its pool.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct InstanceReclaimed {
  pub instance: InstanceId,
  pub template: TemplateId,
  pub kind: TemplateKind,
}

/// The live generator, created once a camera view is available.
#[derive(Resource, Default)]
pub struct RunnerStream {
  generator: Option<StreamGenerator<StdRng>>,
}

impl RunnerStream {
  pub fn generator(&self) -> Option<&StreamGenerator<StdRng>> {
    self.generator.as_ref()
  }

  pub fn is_running(&self) -> bool {
    self.generator.is_some()
  }
}

/// Inserted when streaming stopped on an unrecoverable error.
///
/// Removed when [`StreamSettings`] change.
#[derive(Resource, Debug, Clone)]
pub struct StreamHalted {
  pub reason: String,
}

/// Maps instances to the entities that represent them.
#[derive(Resource, Default)]
pub struct InstanceEntities {
  map: HashMap<InstanceId, Entity>,
}

impl InstanceEntities {
  pub fn get(&self, id: InstanceId) -> Option<Entity> {
    self.map.get(&id).copied()
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}

/// Marker resource present when a render plugin is in the app.
#[derive(Resource)]
pub(crate) struct RenderingEnabled;

/// Systems that advance the stream and sync entities.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunnerStreamSet;

/// Internal plugin for streaming systems.
///
/// This is automatically added by the main `RunnerStreamPlugin`.
pub(crate) struct RunnerStreamSystemsPlugin;

impl Plugin for RunnerStreamSystemsPlugin {
  fn build(&self, app: &mut App) {
    app
      .init_resource::<RunnerStream>()
      .init_resource::<InstanceEntities>()
      .add_message::<InstancePlaced>()
      .add_message::<InstanceReclaimed>()
      .add_systems(
        Update,
        (
          reset_on_settings_change,
          advance_stream,
          sync_instance_entities,
        )
          .chain()
          .in_set(RunnerStreamSet)
          .run_if(resource_exists::<StreamSettings>),
      );
  }
}

/// System: Drops the generator and its entities when settings change.
///
/// The next [`advance_stream`] run rebuilds from the current camera view.
pub(crate) fn reset_on_settings_change(
  mut commands: Commands,
  settings: Res<StreamSettings>,
  mut stream: ResMut<RunnerStream>,
  mut entities: ResMut<InstanceEntities>,
) {
  if !settings.is_changed() || settings.is_added() {
    return;
  }

  info!(
    "Stream settings changed, discarding {} instances",
    entities.len()
  );
  stream.generator = None;
  for (_, entity) in entities.map.drain() {
    commands.entity(entity).despawn();
  }
  commands.remove_resource::<StreamHalted>();
}

/// System: Recomputes the window from the camera and steps the generator.
pub(crate) fn advance_stream(
  mut commands: Commands,
  camera_query: Query<(&GlobalTransform, &Projection), With<StreamingCamera>>,
  settings: Res<StreamSettings>,
  mut stream: ResMut<RunnerStream>,
  halted: Option<Res<StreamHalted>>,
  mut placed: MessageWriter<InstancePlaced>,
  mut reclaimed: MessageWriter<InstanceReclaimed>,
) {
  if halted.is_some() {
    return;
  }
  let Ok((transform, projection)) = camera_query.single() else {
    return;
  };
  let Some(view) = ViewBounds::from_camera(transform, projection) else {
    return;
  };
  let window = StreamingWindow::from_view(view, settings.generator.margins);

  match stream.generator.as_mut() {
    Some(generator) => {
      if let Err(e) = generator.step(window) {
        halt(&mut commands, &mut stream, e);
        return;
      }
    }
    None => {
      let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
      };
      match StreamGenerator::new(&settings.generator, rng, window) {
        Ok(generator) => stream.generator = Some(generator),
        Err(e) => {
          error!("Stream settings rejected: {}", e);
          commands.insert_resource(StreamHalted {
            reason: e.to_string(),
          });
          return;
        }
      }
    }
  }

  let Some(generator) = stream.generator.as_mut() else {
    return;
  };
  for placement in generator.drain_placements() {
    match placement {
      Placement::Placed {
        instance,
        template,
        kind,
        position,
        reused,
      } => {
        placed.write(InstancePlaced {
          instance,
          template,
          kind,
          position,
          reused,
        });
      }
      Placement::Reclaimed {
        instance,
        template,
        kind,
      } => {
        reclaimed.write(InstanceReclaimed {
          instance,
          template,
          kind,
        });
      }
    }
  }
}

fn halt(commands: &mut Commands, stream: &mut RunnerStream, err: StreamError) {
  error!("Streaming halted: {}", err);
  stream.generator = None;
  commands.insert_resource(StreamHalted {
    reason: err.to_string(),
  });
}

/// System: Spawns, moves, enables and disables instance entities.
pub(crate) fn sync_instance_entities(
  mut commands: Commands,
  settings: Res<StreamSettings>,
  mut entities: ResMut<InstanceEntities>,
  mut placed: MessageReader<InstancePlaced>,
  mut reclaimed: MessageReader<InstanceReclaimed>,
  rendering: Option<Res<RenderingEnabled>>,
) {
  let catalog = &settings.generator.catalog;

  for msg in placed.read() {
    let Some(template) = catalog.get(msg.template) else {
      warn!("Placement of unknown template {:?}", msg.template);
      continue;
    };
    let size = template.visual.size;
    let transform = Transform::from_xyz(msg.position.x + size.x / 2.0, msg.position.y, 0.0);

    if let Some(entity) = entities.get(msg.instance) {
      commands
        .entity(entity)
        .insert(transform)
        .remove::<Disabled>();
      continue;
    }

    let mut entity = commands.spawn((
      PooledInstance {
        id: msg.instance,
        template: msg.template,
        kind: msg.kind,
      },
      transform,
      Name::new(template.name.clone()),
    ));

    if rendering.is_some() {
      entity.insert(Sprite {
        color: template.visual.color,
        custom_size: Some(size),
        ..default()
      });
    }

    #[cfg(feature = "rapier2d")]
    {
      use bevy_rapier2d::prelude::{Collider, RigidBody, Sensor};
      entity.insert((RigidBody::Fixed, Collider::cuboid(size.x / 2.0, size.y / 2.0)));
      if msg.kind == TemplateKind::Obstacle {
        entity.insert(Sensor);
      }
    }

    entities.map.insert(msg.instance, entity.id());
  }

  for msg in reclaimed.read() {
    match entities.get(msg.instance) {
      Some(entity) => {
        commands.entity(entity).insert(Disabled);
      }
      None => warn!("Reclaimed instance {:?} has no entity", msg.instance),
    }
  }
}

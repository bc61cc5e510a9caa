//! A small test room: floor, an actor, a few crates, and a wall socket.

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_config::Config;
use kinesis_ecs::{Actor, CameraRes, LocalActor, Name, Transform};
use kinesis_input::ActorInput;
use kinesis_interaction::{Grip, Interactable, InteractionParams, MagnetAnchor, MotionSampler, Socket};
use kinesis_physics::{Body, GroundSensor, PhysicsHandle, PhysicsWorld, WakeClaim};
use kinesis_player::Locomotion;

const CAPSULE_HALF_HEIGHT: f32 = 0.5;
const CAPSULE_RADIUS: f32 = 0.4;
const EYE_ABOVE_CENTER: f32 = 0.7;
const CRATE_HALF: f32 = 0.25;

/// Entities and poses of the demo room.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub actor: Entity,
    /// Pointer origin at the actor's eye.
    pub eye: Vec3,
    /// Crate in reach, crate that fits the socket, crate far beyond the sleep distance.
    pub crates: [Entity; 3],
    pub socket: Entity,
    /// Pointer direction that carries a held crate onto the socket.
    pub socket_aim: Vec3,
}

/// Spawns the demo room into `world`, which must hold a [`PhysicsWorld`].
pub fn spawn_demo_scene(world: &mut World, config: &Config) -> DemoScene {
    let params = InteractionParams::from(&config.interaction);
    let foot_offset = CAPSULE_HALF_HEIGHT + CAPSULE_RADIUS;
    let actor_position = Vec3::new(0.0, foot_offset, 0.0);
    let eye = actor_position + Vec3::Y * EYE_ABOVE_CENTER;

    let (capsule, crate_handles) = {
        let mut physics = world.resource_mut::<PhysicsWorld>();
        physics.add_fixed_cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(60.0, 0.5, 60.0));
        let capsule = physics.add_actor_capsule(actor_position, CAPSULE_HALF_HEIGHT, CAPSULE_RADIUS);
        let crate_handles = crate_positions().map(|position| {
            physics.add_dynamic_cuboid(position, Vec3::splat(CRATE_HALF))
        });
        (capsule, crate_handles)
    };

    let actor = world
        .spawn((
            Actor,
            LocalActor,
            Name::new("player"),
            Transform::from_translation(actor_position),
            Locomotion::grounded(),
            GroundSensor::new(foot_offset, config.locomotion.probe_depth),
            ActorInput::default(),
            Grip::default(),
            MotionSampler::new(params.throw_window_s),
            Body::new(foot_offset).kinematic(),
            WakeClaim::default(),
            PhysicsHandle(capsule),
        ))
        .id();

    let socket_aim = Vec3::new(0.6, 0.0, -0.8);
    let anchor_offset = Vec3::new(0.0, -CRATE_HALF, 0.0);
    let socket_position = eye + socket_aim * params.hold_distance + anchor_offset;
    let socket = world
        .spawn((
            Name::new("wall socket"),
            Transform::from_translation(socket_position),
            Socket::default(),
        ))
        .id();

    let names = ["near crate", "socket crate", "far crate"];
    let crates = std::array::from_fn(|i| {
        let position = crate_positions()[i];
        let entity = world
            .spawn((
                Name::new(names[i]),
                Transform::from_translation(position),
                Body::new(CRATE_HALF * 3.0_f32.sqrt()),
                WakeClaim::default(),
                PhysicsHandle(crate_handles[i]),
            ))
            .id();
        let mut interactable = Interactable::new(Some(entity));
        if i == 1 {
            interactable = interactable.with_anchor(MagnetAnchor::new(anchor_offset, socket, &params));
        }
        world.entity_mut(entity).insert(interactable);
        entity
    });

    world.insert_resource(CameraRes::looking_at(
        eye,
        Vec3::new(0.0, 0.5, -4.0),
        60f32.to_radians(),
        16.0 / 9.0,
    ));

    tracing::info!("Demo scene spawned: actor {:?}, socket {:?}", actor, socket);

    DemoScene {
        actor,
        eye,
        crates,
        socket,
        socket_aim,
    }
}

fn crate_positions() -> [Vec3; 3] {
    [
        Vec3::new(0.0, CRATE_HALF, -3.0),
        Vec3::new(-1.0, CRATE_HALF, -2.5),
        Vec3::new(0.0, CRATE_HALF, -45.0),
    ]
}

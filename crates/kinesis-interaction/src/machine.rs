//! The interaction state machine.
//!
//! [`hover_system`] resolves what each actor points at. [`interaction_system`]
//! then handles, per actor in entity order:
//!
//! - grab edges (`Hovered → Held`),
//! - carrying held objects along the pointer and previewing snap candidates,
//! - release edges (`Held → Idle` docked on a socket, or `Held → Thrown → Idle`).
//!
//! Actors are processed in ascending entity order, so when two actors grab
//! the same object in one frame the lower entity wins.

use std::collections::HashMap;

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_config::SnapMode;
use kinesis_ecs::{Actor, FrameClock, HookBuffer, Transform};
use kinesis_input::{Action, ActorInput};
use kinesis_physics::{Body, PhysicsHandle, PhysicsWorld, WakeClaim, raycast_bodies};

use crate::{
    Grip, Interactable, InteractionChanged, InteractionParams, InteractionState, MotionSampler,
    PickShape, Socket, docked_pose, find_snap_candidate, throw_velocity,
};

type ActorQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Grip,
        Option<&'static ActorInput>,
        Option<&'static mut MotionSampler>,
    ),
    With<Actor>,
>;
type InteractableQuery<'w, 's> = Query<'w, 's, (Entity, &'static mut Interactable)>;
type PickableQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Interactable,
        Option<&'static PickShape>,
        Option<&'static Transform>,
    ),
>;

type SocketQuery<'w, 's> = Query<'w, 's, (&'static Transform, &'static mut Socket), Without<Body>>;
type BodyQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Transform,
        &'static mut Body,
        &'static mut WakeClaim,
    ),
>;

fn transition(
    hooks: &mut HookBuffer<InteractionChanged>,
    entity: Entity,
    interactable: &mut Interactable,
    to: InteractionState,
    actor: Option<Entity>,
    socket: Option<Entity>,
) {
    let from = interactable.state;
    if from == to {
        return;
    }
    tracing::debug!("Interactable {:?}: {:?} -> {:?}", entity, from, to);
    interactable.state = to;
    hooks.send(InteractionChanged {
        entity,
        from,
        to,
        actor,
        socket,
    });
}

/// Updates each actor's hover target and the Idle/Hovered state of objects.
///
/// Objects whose body is simulated are picked against their rapier colliders.
/// A [`PickShape`] only stands in for objects without one. Actors holding
/// something hover nothing. The nearest hit wins.
pub fn hover_system(
    physics: Option<Res<PhysicsWorld>>,
    mut hooks: ResMut<HookBuffer<InteractionChanged>>,
    mut actors: Query<(&mut Grip, Option<&ActorInput>), With<Actor>>,
    mut interactables: PickableQuery,
    handles: Query<&PhysicsHandle>,
) {
    let physics = physics.as_deref();
    let mut simulated: HashMap<PhysicsHandle, Entity> = HashMap::new();
    let mut shaped: Vec<(Entity, PickShape, Transform)> = Vec::new();
    for (entity, interactable, shape, transform) in interactables.iter() {
        if !matches!(
            interactable.state,
            InteractionState::Idle | InteractionState::Hovered
        ) {
            continue;
        }
        let handle = interactable.body.and_then(|body| handles.get(body).ok());
        match (physics, handle, shape, transform) {
            (Some(_), Some(&handle), _, _) => {
                simulated.insert(handle, entity);
            }
            (_, _, Some(&shape), Some(&transform)) => shaped.push((entity, shape, transform)),
            _ => {}
        }
    }

    for (mut grip, input) in actors.iter_mut() {
        let pointer = input.and_then(|input| input.pointer);
        grip.hovered = match pointer {
            Some(ray) if grip.held.is_none() => {
                let collider_hit = physics
                    .and_then(|physics| {
                        raycast_bodies(physics, ray.origin, ray.direction, f32::MAX, |handle| {
                            simulated.contains_key(&handle)
                        })
                    })
                    .and_then(|(handle, t)| simulated.get(&handle).map(|&entity| (t, entity)));
                let shape_hits = shaped.iter().filter_map(|(entity, shape, transform)| {
                    shape.ray_hit(transform, &ray).map(|t| (t, *entity))
                });
                collider_hit
                    .into_iter()
                    .chain(shape_hits)
                    .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                    .map(|(_, entity)| entity)
            }
            _ => None,
        };
    }

    let hovered: Vec<Entity> = actors.iter().filter_map(|(grip, _)| grip.hovered).collect();

    for (entity, mut interactable, _, _) in interactables.iter_mut() {
        if !matches!(
            interactable.state,
            InteractionState::Idle | InteractionState::Hovered
        ) {
            continue;
        }
        let next = if hovered.contains(&entity) {
            InteractionState::Hovered
        } else {
            InteractionState::Idle
        };
        transition(&mut hooks, entity, &mut interactable, next, None, None);
    }
}

/// Grabs, carries, snaps, and releases interactables.
pub fn interaction_system(
    params: Res<InteractionParams>,
    clock: Res<FrameClock>,
    mut hooks: ResMut<HookBuffer<InteractionChanged>>,
    mut actors: ActorQuery,
    mut interactables: InteractableQuery,
    mut bodies: BodyQuery,
    mut sockets: SocketQuery,
) {
    let now = clock.elapsed;
    let mut order: Vec<Entity> = actors.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    repair_dangling_links(&mut hooks, &mut actors, &mut interactables, &mut bodies, &mut sockets);

    for &actor in &order {
        grab(&mut hooks, actor, &mut actors, &mut interactables, &mut bodies, &mut sockets);
    }

    for &actor in &order {
        carry(
            &params,
            now,
            &mut hooks,
            actor,
            &mut actors,
            &mut interactables,
            &mut bodies,
            &mut sockets,
        );
    }

    for &actor in &order {
        release(
            &params,
            now,
            &mut hooks,
            actor,
            &mut actors,
            &mut interactables,
            &mut bodies,
            &mut sockets,
        );
    }
}

/// Clears links to despawned holders, bodies, sockets, and held objects.
fn repair_dangling_links(
    hooks: &mut HookBuffer<InteractionChanged>,
    actors: &mut ActorQuery,
    interactables: &mut InteractableQuery,
    bodies: &mut BodyQuery,
    sockets: &mut SocketQuery,
) {
    for (actor, mut grip, _, _) in actors.iter_mut() {
        if let Some(held) = grip.held {
            let consistent = interactables
                .get(held)
                .is_ok_and(|(_, it)| it.state == InteractionState::Held && it.holder == Some(actor));
            if !consistent {
                tracing::warn!("Actor {:?} grip points at {:?}, which it no longer holds", actor, held);
                grip.held = None;
            }
        }
    }

    for (entity, mut interactable) in interactables.iter_mut() {
        if let Some(socket) = interactable.docked
            && !sockets.contains(socket)
        {
            interactable.docked = None;
        }

        if interactable.state != InteractionState::Held {
            continue;
        }
        let holder_ok = interactable.holder.is_some_and(|holder| {
            actors
                .get(holder)
                .is_ok_and(|(_, grip, _, _)| grip.held == Some(entity))
        });
        let body = interactable.body.filter(|&body| bodies.contains(body));
        if holder_ok && body.is_some() {
            continue;
        }

        tracing::warn!(
            "Interactable {:?} lost its holder or body while held, returning to idle",
            entity
        );
        if let Some(holder) = interactable.holder
            && let Ok((_, mut grip, _, _)) = actors.get_mut(holder)
            && grip.held == Some(entity)
        {
            grip.held = None;
        }
        if let Some(body) = body
            && let Ok((_, mut body, mut claim)) = bodies.get_mut(body)
        {
            body.set_kinematic(false);
            claim.held = false;
        }
        interactable.holder = None;
        interactable.snap_candidate = None;
        transition(hooks, entity, &mut interactable, InteractionState::Idle, None, None);
    }

    for (_, mut socket) in sockets.iter_mut() {
        if let Some(occupant) = socket.occupant {
            let still_docked = interactables
                .get(occupant)
                .is_ok_and(|(_, it)| it.docked.is_some());
            if !still_docked {
                socket.occupant = None;
            }
        }
    }
}

fn grab(
    hooks: &mut HookBuffer<InteractionChanged>,
    actor: Entity,
    actors: &mut ActorQuery,
    interactables: &mut InteractableQuery,
    bodies: &mut BodyQuery,
    sockets: &mut SocketQuery,
) {
    let Ok((_, mut grip, input, sampler)) = actors.get_mut(actor) else {
        return;
    };
    if !input.is_some_and(|input| input.edges.just_pressed(Action::Grab)) {
        return;
    }
    if grip.held.is_some() {
        tracing::debug!("Actor {:?} already holds an object, grab ignored", actor);
        return;
    }
    let Some(target) = grip.hovered else {
        return;
    };
    let Ok((_, mut interactable)) = interactables.get_mut(target) else {
        return;
    };
    if interactable.state != InteractionState::Hovered {
        tracing::debug!("Interactable {:?} already taken, grab by {:?} ignored", target, actor);
        return;
    }
    let Some(body_entity) = interactable.body.filter(|&body| bodies.contains(body)) else {
        tracing::warn!("Interactable {:?} has no simulated body, grab ignored", target);
        return;
    };

    if let Some(socket) = interactable.docked.take()
        && let Ok((_, mut socket)) = sockets.get_mut(socket)
        && socket.occupant == Some(target)
    {
        socket.occupant = None;
    }
    interactable.holder = Some(actor);
    interactable.snap_candidate = None;
    grip.held = Some(target);
    grip.hovered = None;
    if let Some(mut sampler) = sampler {
        sampler.clear();
    }
    if let Ok((_, mut body, mut claim)) = bodies.get_mut(body_entity) {
        body.set_kinematic(true);
        claim.held = true;
    }
    transition(
        hooks,
        target,
        &mut interactable,
        InteractionState::Held,
        Some(actor),
        None,
    );
}

#[allow(clippy::too_many_arguments)]
fn carry(
    params: &InteractionParams,
    now: f64,
    hooks: &mut HookBuffer<InteractionChanged>,
    actor: Entity,
    actors: &mut ActorQuery,
    interactables: &mut InteractableQuery,
    bodies: &mut BodyQuery,
    sockets: &mut SocketQuery,
) {
    let Ok((_, mut grip, input, sampler)) = actors.get_mut(actor) else {
        return;
    };
    let Some(target) = grip.held else {
        return;
    };
    let Ok((_, mut interactable)) = interactables.get_mut(target) else {
        return;
    };
    let Some(body_entity) = interactable.body else {
        return;
    };
    let Ok((mut transform, mut body, mut claim)) = bodies.get_mut(body_entity) else {
        return;
    };

    if let Some(ray) = input.and_then(|input| input.pointer) {
        transform.translation = ray.point_at(params.hold_distance);
        body.mark_dirty();
    }
    if let Some(mut sampler) = sampler {
        sampler.record(now, transform.translation);
        body.linear_velocity = sampler.velocity();
    }

    let candidate = find_snap_candidate(&transform, &interactable.anchors, |socket| {
        sockets
            .get(socket)
            .ok()
            .filter(|(_, s)| s.occupant.is_none_or(|occupant| occupant == target))
            .map(|(pose, _)| *pose)
    });
    let index = candidate.map(|c| c.anchor);
    if index != interactable.snap_candidate {
        tracing::trace!("Interactable {:?} snap candidate: {:?}", target, candidate);
        interactable.snap_candidate = index;
    }

    if params.snap_mode == SnapMode::Continuous
        && let Some(index) = index
        && let Some(socket) = dock(
            target,
            index,
            &mut interactable,
            &mut transform,
            &mut body,
            &mut claim,
            sockets,
        )
    {
        grip.held = None;
        transition(
            hooks,
            target,
            &mut interactable,
            InteractionState::Idle,
            Some(actor),
            Some(socket),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn release(
    params: &InteractionParams,
    now: f64,
    hooks: &mut HookBuffer<InteractionChanged>,
    actor: Entity,
    actors: &mut ActorQuery,
    interactables: &mut InteractableQuery,
    bodies: &mut BodyQuery,
    sockets: &mut SocketQuery,
) {
    let Ok((_, mut grip, input, sampler)) = actors.get_mut(actor) else {
        return;
    };
    if !input.is_some_and(|input| input.edges.just_released(Action::Grab)) {
        return;
    }
    let Some(target) = grip.held else {
        return;
    };
    let Ok((_, mut interactable)) = interactables.get_mut(target) else {
        return;
    };
    let Some(body_entity) = interactable.body else {
        return;
    };
    let Ok((mut transform, mut body, mut claim)) = bodies.get_mut(body_entity) else {
        return;
    };
    grip.held = None;

    if let Some(index) = interactable.snap_candidate
        && let Some(socket) = dock(
            target,
            index,
            &mut interactable,
            &mut transform,
            &mut body,
            &mut claim,
            sockets,
        )
    {
        transition(
            hooks,
            target,
            &mut interactable,
            InteractionState::Idle,
            Some(actor),
            Some(socket),
        );
        return;
    }

    let sampled = sampler.map_or(Vec3::ZERO, |sampler| sampler.velocity());
    let velocity = throw_velocity(sampled, params);
    body.set_kinematic(false);
    body.linear_velocity = velocity;
    body.angular_velocity = Vec3::ZERO;
    body.mark_dirty();
    claim.held = false;
    claim.grace_until = now + params.release_grace_s;
    interactable.holder = None;
    interactable.snap_candidate = None;

    transition(
        hooks,
        target,
        &mut interactable,
        InteractionState::Thrown,
        Some(actor),
        None,
    );
    tracing::debug!("Interactable {:?} thrown at {:?}", target, velocity);
    transition(
        hooks,
        target,
        &mut interactable,
        InteractionState::Idle,
        Some(actor),
        None,
    );
}

/// Locks the object onto the socket of anchor `index`. Returns the socket on success.
fn dock(
    target: Entity,
    index: usize,
    interactable: &mut Interactable,
    transform: &mut Transform,
    body: &mut Body,
    claim: &mut WakeClaim,
    sockets: &mut SocketQuery,
) -> Option<Entity> {
    let anchor = *interactable.anchors.get(index)?;
    let (socket_pose, mut socket) = sockets.get_mut(anchor.socket).ok()?;
    if socket.occupant.is_some_and(|occupant| occupant != target) {
        return None;
    }

    *transform = docked_pose(socket_pose, &anchor);
    socket.occupant = Some(target);
    body.set_kinematic(true);
    body.linear_velocity = Vec3::ZERO;
    body.angular_velocity = Vec3::ZERO;
    body.mark_dirty();
    claim.clear();
    interactable.holder = None;
    interactable.snap_candidate = None;
    interactable.docked = Some(anchor.socket);

    tracing::debug!("Interactable {:?} docked on socket {:?}", target, anchor.socket);
    Some(anchor.socket)
}

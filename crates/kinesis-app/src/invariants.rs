//! Cross-machine consistency checks run at the end of a frame.

use bevy_ecs::prelude::*;
use kinesis_ecs::FrameClock;
use kinesis_interaction::{Grip, Interactable, InteractionState, Socket};
use kinesis_physics::{Body, WakeClaim};
use kinesis_player::{Locomotion, LocomotionState};
use thiserror::Error;

/// A broken invariant between bodies, machines, and their links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("body {body:?} is asleep while a machine needs it awake")]
    SleepingWhileClaimed { body: Entity },

    #[error("interactable {interactable:?} names holder {holder:?}, whose grip holds {held:?}")]
    HolderMismatch {
        interactable: Entity,
        holder: Entity,
        held: Option<Entity>,
    },

    #[error("actor {actor:?} grips {held:?}, which it does not hold")]
    GripMismatch { actor: Entity, held: Entity },

    #[error("actor {actor:?} is {state:?} while flagged grounded")]
    AirborneWhileGrounded {
        actor: Entity,
        state: LocomotionState,
    },

    #[error("socket {socket:?} names occupant {occupant:?}, which is not docked there")]
    SocketMismatch { socket: Entity, occupant: Entity },
}

/// Whether the coordinator runs [`check_invariants`] every frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InvariantChecks {
    pub enabled: bool,
    /// Violations found since startup.
    pub violations: u64,
}

impl InvariantChecks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            violations: 0,
        }
    }
}

/// Returns every violated invariant in `world`, in a stable order.
pub fn check_invariants(world: &mut World) -> Vec<InvariantViolation> {
    let now = world
        .get_resource::<FrameClock>()
        .map_or(0.0, |clock| clock.elapsed);
    let mut violations = Vec::new();

    // Bodies a machine currently requires awake.
    let mut claimed: Vec<Entity> = world
        .query::<(Entity, &WakeClaim)>()
        .iter(world)
        .filter(|(_, claim)| claim.is_active(now))
        .map(|(entity, _)| entity)
        .collect();
    claimed.extend(
        world
            .query::<&Interactable>()
            .iter(world)
            .filter(|it| it.state() == InteractionState::Held)
            .filter_map(|it| it.body),
    );
    claimed.extend(
        world
            .query::<(Entity, &Locomotion)>()
            .iter(world)
            .filter(|(_, loco)| loco.state() != LocomotionState::Grounded)
            .map(|(entity, _)| entity),
    );
    claimed.sort();
    claimed.dedup();
    for body in claimed {
        if world.get::<Body>(body).is_some_and(Body::is_asleep) {
            violations.push(InvariantViolation::SleepingWhileClaimed { body });
        }
    }

    let grips: Vec<(Entity, Option<Entity>)> = world
        .query::<(Entity, &Grip)>()
        .iter(world)
        .map(|(entity, grip)| (entity, grip.held()))
        .collect();
    let mut interactables: Vec<(Entity, InteractionState, Option<Entity>, Option<Entity>)> = world
        .query::<(Entity, &Interactable)>()
        .iter(world)
        .map(|(entity, it)| (entity, it.state(), it.holder(), it.docked()))
        .collect();
    interactables.sort_by_key(|(entity, ..)| *entity);

    for &(interactable, _, holder, _) in &interactables {
        let Some(holder) = holder else {
            continue;
        };
        let held = grips
            .iter()
            .find(|(actor, _)| *actor == holder)
            .and_then(|(_, held)| *held);
        if held != Some(interactable) {
            violations.push(InvariantViolation::HolderMismatch {
                interactable,
                holder,
                held,
            });
        }
    }

    let mut grips = grips;
    grips.sort_by_key(|(actor, _)| *actor);
    for (actor, held) in grips {
        let Some(held) = held else {
            continue;
        };
        let consistent = interactables.iter().any(|&(entity, state, holder, _)| {
            entity == held && state == InteractionState::Held && holder == Some(actor)
        });
        if !consistent {
            violations.push(InvariantViolation::GripMismatch { actor, held });
        }
    }

    let mut actors: Vec<(Entity, LocomotionState, bool)> = world
        .query::<(Entity, &Locomotion)>()
        .iter(world)
        .map(|(entity, loco)| (entity, loco.state(), loco.is_grounded()))
        .collect();
    actors.sort_by_key(|(entity, ..)| *entity);
    for (actor, state, grounded) in actors {
        if state.is_airborne() && grounded {
            violations.push(InvariantViolation::AirborneWhileGrounded { actor, state });
        }
    }

    let mut sockets: Vec<(Entity, Option<Entity>)> = world
        .query::<(Entity, &Socket)>()
        .iter(world)
        .map(|(entity, socket)| (entity, socket.occupant()))
        .collect();
    sockets.sort_by_key(|(entity, _)| *entity);
    for (socket, occupant) in sockets {
        let Some(occupant) = occupant else {
            continue;
        };
        let docked_here = interactables
            .iter()
            .any(|&(entity, _, _, docked)| entity == occupant && docked == Some(socket));
        if !docked_here {
            violations.push(InvariantViolation::SocketMismatch { socket, occupant });
        }
    }

    violations
}

/// Runs [`check_invariants`] when enabled and logs each violation.
pub fn invariant_check_system(world: &mut World) {
    if !world
        .get_resource::<InvariantChecks>()
        .is_some_and(|checks| checks.enabled)
    {
        return;
    }

    let violations = check_invariants(world);
    if violations.is_empty() {
        return;
    }
    for violation in &violations {
        tracing::warn!("Invariant violated: {}", violation);
    }
    if let Some(mut checks) = world.get_resource_mut::<InvariantChecks>() {
        checks.violations += violations.len() as u64;
    }
}

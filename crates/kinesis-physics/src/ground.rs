//! Downward ground-contact probe against rapier colliders.

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_ecs::Transform;
use rapier3d::prelude::*;

use crate::{PhysicsHandle, PhysicsWorld, to_vector};

/// Why a ground probe could not run.
#[derive(Debug, thiserror::Error)]
pub enum GroundProbeError {
    /// The body to exclude from the query is not in the physics world.
    #[error("rigid body {0:?} is not in the physics world")]
    MissingBody(RigidBodyHandle),
    /// No physics world is available.
    #[error("no physics world to query")]
    NoPhysicsWorld,
}

/// Surface found below a probe origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// World-space height of the surface.
    pub surface_height: f32,
    /// Distance from the feet down to the surface (negative when sunk in).
    pub gap: f32,
}

/// Casts a ray straight down from slightly above `feet`.
///
/// The ray starts `lift` meters above the feet so a foot resting slightly
/// inside a surface still registers, and extends `depth` meters below them.
/// `exclude` is the prober's own body.
pub fn probe_ground(
    physics: &PhysicsWorld,
    exclude: Option<RigidBodyHandle>,
    feet: Vec3,
    lift: f32,
    depth: f32,
) -> Result<Option<GroundHit>, GroundProbeError> {
    let mut filter = QueryFilter::new();
    if let Some(handle) = exclude {
        if !physics.rigid_body_set.contains(handle) {
            return Err(GroundProbeError::MissingBody(handle));
        }
        filter = filter.exclude_rigid_body(handle);
    }

    let origin = feet + Vec3::Y * lift;
    let ray = Ray::new(to_vector(origin), Vector::new(0.0, -1.0, 0.0));
    let query_pipeline = physics.broad_phase.as_query_pipeline(
        physics.narrow_phase.query_dispatcher(),
        &physics.rigid_body_set,
        &physics.collider_set,
        filter,
    );

    Ok(query_pipeline
        .cast_ray(&ray, lift + depth, true)
        .map(|(_, toi)| {
            let surface_height = origin.y - toi;
            GroundHit {
                surface_height,
                gap: feet.y - surface_height,
            }
        }))
}

/// Per-actor ground probe configuration and last result.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GroundSensor {
    /// Distance from the transform origin down to the feet.
    pub foot_offset: f32,
    /// How far above the feet the probe starts.
    pub lift: f32,
    /// How far below the feet the probe searches.
    pub depth: f32,
    /// Surface height found by the last probe, `None` when nothing was hit
    /// or the probe failed.
    pub surface: Option<f32>,
    /// The last probe failed and was treated as no contact.
    pub failed: bool,
}

impl GroundSensor {
    pub fn new(foot_offset: f32, depth: f32) -> Self {
        Self {
            foot_offset,
            lift: 0.1,
            depth,
            surface: None,
            failed: false,
        }
    }

    /// Feet position for an entity at `translation`.
    pub fn feet(&self, translation: Vec3) -> Vec3 {
        translation - Vec3::Y * self.foot_offset
    }
}

/// Refreshes every [`GroundSensor`]. Failures count as "no contact".
pub fn ground_probe_system(
    physics: Option<Res<PhysicsWorld>>,
    mut sensors: Query<(Entity, &Transform, &mut GroundSensor, Option<&PhysicsHandle>)>,
) {
    for (entity, transform, mut sensor, handle) in sensors.iter_mut() {
        let feet = sensor.feet(transform.translation);
        let result = match physics.as_deref() {
            Some(physics) => probe_ground(
                physics,
                handle.map(|h| h.0),
                feet,
                sensor.lift,
                sensor.depth,
            ),
            None => Err(GroundProbeError::NoPhysicsWorld),
        };

        match result {
            Ok(hit) => {
                sensor.surface = hit.map(|hit| hit.surface_height);
                sensor.failed = false;
            }
            Err(err) => {
                if !sensor.failed {
                    tracing::warn!("Ground probe for {:?} failed: {}", entity, err);
                }
                sensor.surface = None;
                sensor.failed = true;
            }
        }
    }
}

//! Pointer-style ray queries against the colliders of selected bodies.

use glam::Vec3;
use rapier3d::prelude::*;

use crate::{PhysicsHandle, PhysicsWorld, to_vector};

/// Casts a ray and returns the nearest collider hit whose parent body passes
/// `accept`, with the distance along `direction`.
///
/// Colliders are tested as solids: an origin inside a shape hits at `0.0`.
/// Poses are those of the last physics step.
pub fn raycast_bodies(
    physics: &PhysicsWorld,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    accept: impl Fn(PhysicsHandle) -> bool,
) -> Option<(PhysicsHandle, f32)> {
    let predicate = |_: ColliderHandle, collider: &Collider| {
        collider
            .parent()
            .is_some_and(|parent| accept(PhysicsHandle(parent)))
    };
    let query_pipeline = physics.broad_phase.as_query_pipeline(
        physics.narrow_phase.query_dispatcher(),
        &physics.rigid_body_set,
        &physics.collider_set,
        QueryFilter::new().predicate(&predicate),
    );

    let ray = Ray::new(to_vector(origin), to_vector(direction));
    let (collider, distance) = query_pipeline.cast_ray(&ray, max_distance, true)?;
    let parent = physics.collider_set.get(collider)?.parent()?;
    Some((PhysicsHandle(parent), distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_two_crates() -> (PhysicsWorld, RigidBodyHandle, RigidBodyHandle) {
        let mut physics = PhysicsWorld::new();
        physics.set_gravity(0.0, 0.0, 0.0);
        let near = physics.add_dynamic_cuboid(Vec3::new(0.0, 0.0, -3.0), Vec3::splat(0.5));
        let far = physics.add_dynamic_cuboid(Vec3::new(0.0, 0.0, -6.0), Vec3::splat(0.5));
        physics.step();
        (physics, near, far)
    }

    #[test]
    fn test_nearest_accepted_body_wins() {
        let (physics, near, _) = world_with_two_crates();

        let (hit, distance) =
            raycast_bodies(&physics, Vec3::ZERO, Vec3::NEG_Z, 100.0, |_| true).unwrap();

        assert_eq!(hit, PhysicsHandle(near));
        assert!((distance - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_rejected_bodies_are_transparent() {
        let (physics, near, far) = world_with_two_crates();

        let (hit, distance) = raycast_bodies(&physics, Vec3::ZERO, Vec3::NEG_Z, 100.0, |h| {
            h != PhysicsHandle(near)
        })
        .unwrap();

        assert_eq!(hit, PhysicsHandle(far));
        assert!((distance - 5.5).abs() < 1e-3);
    }

    #[test]
    fn test_max_distance_limits_reach() {
        let (physics, _, _) = world_with_two_crates();
        assert!(raycast_bodies(&physics, Vec3::ZERO, Vec3::NEG_Z, 2.0, |_| true).is_none());
    }
}

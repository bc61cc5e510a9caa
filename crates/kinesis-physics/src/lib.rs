//! Physics integration: rapier world, device-driven tuning, body sleep/wake scheduling,
//! visibility, and ground probing.
//!
//! Wraps the Rapier 3D physics engine behind a single [`PhysicsWorld`] resource
//! that owns all simulation state. Gameplay code never talks to rapier directly:
//! it writes [`Body`] and [`Transform`](kinesis_ecs::Transform) components and the
//! sync systems in this crate mirror them into the engine.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use rapier3d::prelude::*;

mod body;
mod clock;
mod device;
mod ground;
mod hooks;
mod raycast;
mod sleep_scheduler;
mod sync;
mod tuning;
mod visibility;

#[cfg(test)]
mod sleep_scheduler_tests;

pub use body::{Body, PhysicsHandle, SleepState, WakeClaim};
pub use clock::PhysicsClock;
pub use device::{DeviceClass, DeviceProfile};
pub use ground::{GroundHit, GroundProbeError, GroundSensor, ground_probe_system, probe_ground};
pub use hooks::{SleepChanged, TuningApplied};
pub use raycast::raycast_bodies;
pub use sleep_scheduler::{SleepPolicy, SleepTransition, sleep_wake_system};
pub use sync::{physics_step_system, pull_bodies_system, push_bodies_system};
pub use tuning::{PhysicsTuning, TuningState, tuning_system};
pub use visibility::ViewFrustum;

/// Central physics simulation resource owning all Rapier state.
///
/// Insert into the ECS world at startup. Systems read via `Res<PhysicsWorld>`
/// for ray queries or mutate via `ResMut<PhysicsWorld>` to add/remove bodies.
#[derive(Resource)]
pub struct PhysicsWorld {
    /// World-space gravity vector.
    pub gravity: Vector,
    /// Timestep and solver configuration.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection (contact manifolds).
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Creates a new physics world with gravity `(0, -9.81, 0)` and the
    /// conservative (mobile) default tuning until a profile is applied.
    pub fn new() -> Self {
        let mut world = Self {
            gravity: Vector::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        };
        world.apply_tuning(&PhysicsTuning::CONSERVATIVE);
        world
    }

    /// Writes the tick rate and solver iteration cap into the integration parameters.
    pub fn apply_tuning(&mut self, tuning: &PhysicsTuning) {
        self.integration_parameters.dt = tuning.step_dt();
        self.integration_parameters.num_solver_iterations = tuning.solver_iterations.max(1) as usize;
    }

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Sets the world gravity vector.
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = Vector::new(x, y, z);
    }

    /// Returns the current gravity as `(x, y, z)`.
    pub fn gravity(&self) -> (f32, f32, f32) {
        (self.gravity.x, self.gravity.y, self.gravity.z)
    }

    /// Inserts a dynamic body with a cuboid collider and returns its handle.
    ///
    /// Rotations are locked: orientation is owned by gameplay, not the solver.
    pub fn add_dynamic_cuboid(&mut self, position: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .lock_rotations()
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Inserts a fixed cuboid (floor, wall, ledge) and returns its handle.
    pub fn add_fixed_cuboid(&mut self, position: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(position))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Inserts a kinematic capsule for an actor whose pose is driven by gameplay.
    ///
    /// `position` is the capsule center; total height is `2 * (half_height + radius)`.
    pub fn add_actor_capsule(
        &mut self,
        position: Vec3,
        half_height: f32,
        radius: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .friction(0.0)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Removes a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

pub(crate) fn to_rotation(q: Quat) -> Rotation {
    Rotation::from_xyzw(q.x, q.y, q.z, q.w)
}

pub(crate) fn from_rotation(r: &Rotation) -> Quat {
    Quat::from_xyzw(r.x, r.y, r.z, r.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_world_initializes() {
        let world = PhysicsWorld::new();
        assert_eq!(world.rigid_body_set.len(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn test_gravity_default() {
        let world = PhysicsWorld::new();
        assert_eq!(world.gravity(), (0.0, -9.81, 0.0));
    }

    #[test]
    fn test_gravity_set_custom() {
        let mut world = PhysicsWorld::new();
        world.set_gravity(0.0, -1.62, 0.0);
        assert_eq!(world.gravity(), (0.0, -1.62, 0.0));
    }

    #[test]
    fn test_new_world_uses_conservative_timestep() {
        let world = PhysicsWorld::new();
        let expected = PhysicsTuning::CONSERVATIVE.step_dt();
        assert!((world.integration_parameters.dt - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_tuning_sets_timestep() {
        let mut world = PhysicsWorld::new();
        let tuning = PhysicsTuning {
            tick_rate_hz: 120,
            max_substeps: 4,
            solver_iterations: 8,
        };
        world.apply_tuning(&tuning);
        assert!((world.integration_parameters.dt - 1.0 / 120.0).abs() < f32::EPSILON);
        assert_eq!(world.integration_parameters.num_solver_iterations, 8);
    }

    #[test]
    fn test_step_advances_simulation() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_dynamic_cuboid(Vec3::new(0.0, 10.0, 0.0), Vec3::splat(0.5));

        for _ in 0..60 {
            world.step();
        }

        let pos = world.rigid_body_set[handle].translation();
        assert!(pos.y < 10.0, "Body should have fallen: y={}", pos.y);
    }

    #[test]
    fn test_remove_body_drops_colliders() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_fixed_cuboid(Vec3::ZERO, Vec3::ONE);
        assert_eq!(world.collider_set.len(), 1);
        world.remove_body(handle);
        assert_eq!(world.rigid_body_set.len(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn test_empty_world_steps_without_error() {
        let mut world = PhysicsWorld::new();
        for _ in 0..100 {
            world.step();
        }
    }
}

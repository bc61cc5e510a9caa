//! Body model shared by the scheduler, the gameplay machines, and the rapier sync.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::ViewFrustum;

/// Whether a body takes part in the physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SleepState {
    /// Simulated every step.
    #[default]
    Awake,
    /// Dormant: skipped by the solver, velocity retained for the next wake.
    Asleep,
}

/// A simulated object as seen by the coordinator.
///
/// The physics engine owns the real rigid body; this component carries the
/// coordinator-side view of it. Only the sleep/wake scheduler changes
/// [`sleep_state`](Self::sleep_state).
#[derive(Component, Debug, Clone)]
pub struct Body {
    /// Linear velocity as of the last awake frame (m/s).
    pub linear_velocity: Vec3,
    /// Angular velocity as of the last awake frame (rad/s).
    pub angular_velocity: Vec3,
    /// Radius of a sphere enclosing the body, used for frustum tests.
    pub bounding_radius: f32,
    /// Horizontal distance to the camera, refreshed every frame.
    pub radial_distance: f32,
    /// Vertical distance to the camera, refreshed every frame.
    pub vertical_distance: f32,
    /// Whether the body intersects the view frustum.
    pub in_frustum: bool,
    /// Last frame time the body moved faster than the motion threshold.
    pub last_active: f64,
    pub(crate) sleep: SleepState,
    /// Frame time of the most recent wake trigger.
    pub(crate) wake_frame: Option<f64>,
    pub(crate) last_eval: Option<f64>,
    pub(crate) visible_at_last_eval: bool,
    /// Approach speed of the fastest body that struck this one while asleep.
    pub(crate) impact_speed: f32,
    pub(crate) needs_push: bool,
    pub(crate) kinematic: bool,
}

impl Body {
    /// Creates an awake, visible body at rest.
    pub fn new(bounding_radius: f32) -> Self {
        Self {
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            bounding_radius,
            radial_distance: 0.0,
            vertical_distance: 0.0,
            in_frustum: true,
            last_active: 0.0,
            sleep: SleepState::Awake,
            wake_frame: None,
            last_eval: None,
            visible_at_last_eval: true,
            impact_speed: 0.0,
            needs_push: false,
            kinematic: false,
        }
    }

    /// Same body with a starting velocity.
    pub fn with_velocity(mut self, linear_velocity: Vec3) -> Self {
        self.linear_velocity = linear_velocity;
        self
    }

    /// Same body with its pose driven by gameplay instead of the solver.
    pub fn kinematic(mut self) -> Self {
        self.kinematic = true;
        self
    }

    pub fn sleep_state(&self) -> SleepState {
        self.sleep
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep == SleepState::Asleep
    }

    /// Current linear speed (m/s).
    pub fn speed(&self) -> f32 {
        self.linear_velocity.length()
    }

    /// Requests that the current transform and velocity be written into the
    /// physics engine before the next step.
    pub fn mark_dirty(&mut self) {
        self.needs_push = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.needs_push
    }

    /// Switches between gameplay-driven and solver-driven motion.
    pub fn set_kinematic(&mut self, kinematic: bool) {
        if self.kinematic != kinematic {
            self.kinematic = kinematic;
            self.needs_push = true;
        }
    }

    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    /// Recomputes camera distances and, when a frustum is given, visibility.
    pub fn refresh_view(&mut self, position: Vec3, camera: Vec3, frustum: Option<&ViewFrustum>) {
        let offset = position - camera;
        self.radial_distance = Vec3::new(offset.x, 0.0, offset.z).length();
        self.vertical_distance = offset.y.abs();
        if let Some(frustum) = frustum {
            self.in_frustum = frustum.contains_sphere(position, self.bounding_radius);
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Records whether a gameplay machine currently needs a body awake.
///
/// Written by the interaction and locomotion machines before the scheduler runs.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WakeClaim {
    /// The body's interactable is being held.
    pub held: bool,
    /// The body belongs to an actor that is off the ground.
    pub locomotion: bool,
    /// Frame time until which a recent release keeps the body awake.
    pub grace_until: f64,
}

impl WakeClaim {
    /// Whether any machine requires the body awake at `now`.
    pub fn is_active(&self, now: f64) -> bool {
        self.held || self.locomotion || now <= self.grace_until
    }

    /// Drops every claim, including a pending release grace.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for WakeClaim {
    fn default() -> Self {
        Self {
            held: false,
            locomotion: false,
            grace_until: f64::NEG_INFINITY,
        }
    }
}

/// Rapier rigid body backing an entity's [`Body`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicsHandle(pub rapier3d::prelude::RigidBodyHandle);

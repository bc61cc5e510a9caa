use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};
use kinesis_ecs::{CameraRes, FrameClock, HookBuffer, Transform};

use crate::{
    Body, PhysicsHandle, PhysicsWorld, SleepChanged, SleepPolicy, SleepState, ViewFrustum,
    WakeClaim, sleep_wake_system,
};

fn policy() -> SleepPolicy {
    SleepPolicy {
        radial_distance: 20.0,
        vertical_distance: 10.0,
        idle_seconds: 2.0,
        motion_epsilon: 0.05,
    }
}

fn camera() -> CameraRes {
    CameraRes::default()
}

/// Runs one scheduler pass over a single body.
fn evaluate(
    policy: &SleepPolicy,
    entity: Entity,
    position: Vec3,
    body: &mut Body,
    claim: Option<&WakeClaim>,
    frame_time: f64,
) -> usize {
    policy
        .update([(entity, position, body, claim)], &camera(), None, frame_time)
        .len()
}

fn entity() -> Entity {
    Entity::from_raw(7)
}

#[test]
fn test_distant_body_sleeps_even_when_recently_active() {
    let policy = policy();
    let mut body = Body::new(0.5).with_velocity(Vec3::new(0.0, 0.0, 3.0));
    body.last_active = 0.9;

    let transitions = policy.update(
        [(entity(), Vec3::new(50.0, 0.0, 0.0), &mut body, None)],
        &camera(),
        None,
        1.0,
    );

    assert_eq!(body.sleep_state(), SleepState::Asleep);
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].from, SleepState::Awake);
    assert_eq!(transitions[0].to, SleepState::Asleep);
    // Velocity retained for the next wake.
    assert_eq!(body.linear_velocity, Vec3::new(0.0, 0.0, 3.0));
}

#[test]
fn test_vertical_distance_threshold() {
    let policy = policy();
    let mut body = Body::new(0.5);
    body.last_active = 1.0;
    evaluate(&policy, entity(), Vec3::new(0.0, 15.0, 0.0), &mut body, None, 1.0);
    assert!(body.is_asleep());
}

#[test]
fn test_offscreen_body_sleeps() {
    let policy = policy();
    let mut body = Body::new(0.5);
    body.in_frustum = false;
    body.last_active = 1.0;
    evaluate(&policy, entity(), Vec3::new(5.0, 0.0, 0.0), &mut body, None, 1.0);
    assert!(body.is_asleep());
}

#[test]
fn test_idle_body_sleeps_after_threshold() {
    let policy = policy();
    let mut body = Body::new(0.5);
    let near = Vec3::new(3.0, 0.0, 0.0);

    evaluate(&policy, entity(), near, &mut body, None, 1.0);
    assert!(!body.is_asleep());
    evaluate(&policy, entity(), near, &mut body, None, 2.5);
    assert!(body.is_asleep());
}

#[test]
fn test_moving_body_stays_awake() {
    let policy = policy();
    let mut body = Body::new(0.5).with_velocity(Vec3::new(0.5, 0.0, 0.0));
    let near = Vec3::new(3.0, 0.0, 0.0);

    for frame in 1..=10 {
        evaluate(&policy, entity(), near, &mut body, None, frame as f64);
        assert!(!body.is_asleep(), "frame {frame}");
    }
    assert_eq!(body.last_active, 10.0);
}

#[test]
fn test_claim_overrides_distance_and_visibility() {
    let policy = policy();
    let mut body = Body::new(0.5);
    body.in_frustum = false;
    let claim = WakeClaim {
        held: true,
        ..WakeClaim::default()
    };

    evaluate(&policy, entity(), Vec3::new(100.0, 50.0, 0.0), &mut body, Some(&claim), 10.0);
    assert!(!body.is_asleep());
}

#[test]
fn test_release_grace_keeps_body_awake_then_expires() {
    let policy = policy();
    let mut body = Body::new(0.5);
    let claim = WakeClaim {
        grace_until: 1.5,
        ..WakeClaim::default()
    };
    let far = Vec3::new(100.0, 0.0, 0.0);

    evaluate(&policy, entity(), far, &mut body, Some(&claim), 1.0);
    assert!(!body.is_asleep());
    evaluate(&policy, entity(), far, &mut body, Some(&claim), 1.6);
    assert!(body.is_asleep());
}

#[test]
fn test_update_is_idempotent_within_a_frame() {
    let policy = policy();
    let mut body = Body::new(0.5);
    body.in_frustum = false;
    let position = Vec3::new(5.0, 0.0, 0.0);

    // Fall asleep offscreen, then come back into view.
    evaluate(&policy, entity(), position, &mut body, None, 1.0);
    assert!(body.is_asleep());
    body.in_frustum = true;

    assert_eq!(evaluate(&policy, entity(), position, &mut body, None, 2.0), 1);
    let snapshot = body.clone();
    assert_eq!(evaluate(&policy, entity(), position, &mut body, None, 2.0), 0);
    assert_eq!(body.sleep_state(), snapshot.sleep_state());
    assert_eq!(body.last_active, snapshot.last_active);
    assert_eq!(body.linear_velocity, snapshot.linear_velocity);
}

#[test]
fn test_reentering_frustum_wakes_with_velocity_unchanged() {
    let policy = policy();
    let velocity = Vec3::new(1.0, -2.0, 0.5);
    let mut body = Body::new(0.5).with_velocity(velocity);
    let position = Vec3::new(5.0, 0.0, 0.0);

    body.in_frustum = false;
    evaluate(&policy, entity(), position, &mut body, None, 1.0);
    assert!(body.is_asleep());

    // Stays asleep while offscreen.
    evaluate(&policy, entity(), position, &mut body, None, 2.0);
    assert!(body.is_asleep());

    body.in_frustum = true;
    evaluate(&policy, entity(), position, &mut body, None, 3.0);
    assert_eq!(body.sleep_state(), SleepState::Awake);
    assert_eq!(body.linear_velocity, velocity);
}

#[test]
fn test_reentry_trigger_beats_distance_for_one_frame() {
    let policy = policy();
    let mut body = Body::new(0.5);
    let far = Vec3::new(30.0, 0.0, 0.0);

    body.in_frustum = false;
    evaluate(&policy, entity(), far, &mut body, None, 1.0);
    body.in_frustum = true;
    evaluate(&policy, entity(), far, &mut body, None, 2.0);
    assert!(!body.is_asleep());

    evaluate(&policy, entity(), far, &mut body, None, 3.0);
    assert!(body.is_asleep());
}

#[test]
fn test_external_impulse_wakes_body() {
    let policy = policy();
    let mut body = Body::new(0.5);
    let near = Vec3::new(3.0, 0.0, 0.0);

    evaluate(&policy, entity(), near, &mut body, None, 0.0);
    evaluate(&policy, entity(), near, &mut body, None, 5.0);
    assert!(body.is_asleep());

    // Something struck it; the read-back recorded the approach speed.
    body.impact_speed = 2.0;
    evaluate(&policy, entity(), near, &mut body, None, 5.1);
    assert!(!body.is_asleep());
    assert_eq!(body.last_active, 5.1);
    assert_eq!(body.linear_velocity, Vec3::ZERO);
}

#[test]
fn test_slow_disturbance_does_not_wake() {
    let policy = policy();
    let mut body = Body::new(0.5);
    let near = Vec3::new(3.0, 0.0, 0.0);

    evaluate(&policy, entity(), near, &mut body, None, 0.0);
    evaluate(&policy, entity(), near, &mut body, None, 5.0);
    body.impact_speed = 0.01;
    evaluate(&policy, entity(), near, &mut body, None, 5.1);
    assert!(body.is_asleep());
    assert_eq!(body.impact_speed, 0.0);
}

#[test]
fn test_frustum_refreshes_visibility() {
    let policy = policy();
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
    let frustum = ViewFrustum::from_view_projection(&(proj * view));

    let mut body = Body::new(0.5);
    policy.update(
        [(entity(), Vec3::new(0.0, 0.0, 10.0), &mut body, None)],
        &camera(),
        Some(&frustum),
        0.5,
    );
    assert!(!body.in_frustum);
    assert!(body.is_asleep());
}

// --- ECS + rapier integration ---

fn setup_world() -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(policy());
    world.insert_resource(FrameClock::default());
    world.insert_resource(CameraRes::default());
    world.insert_resource(PhysicsWorld::new());
    world.init_resource::<HookBuffer<SleepChanged>>();

    let mut schedule = Schedule::default();
    schedule.add_systems(sleep_wake_system);
    (world, schedule)
}

fn run_frame(world: &mut World, schedule: &mut Schedule) {
    world.resource_mut::<FrameClock>().advance(0.1);
    world.resource_mut::<HookBuffer<SleepChanged>>().swap();
    schedule.run(world);
}

#[test]
fn test_system_parks_rapier_body_and_restores_velocity_on_wake() {
    let (mut world, mut schedule) = setup_world();
    let position = Vec3::new(5.0, 0.0, 0.0);
    let velocity = Vec3::new(0.0, 0.0, 4.0);
    let handle = {
        let mut physics = world.resource_mut::<PhysicsWorld>();
        let handle = physics.add_dynamic_cuboid(position, Vec3::splat(0.25));
        physics.rigid_body_set[handle].set_linvel(crate::to_vector(velocity), true);
        handle
    };
    let entity = world
        .spawn((
            Transform::from_translation(position),
            Body::new(0.5).with_velocity(velocity),
            PhysicsHandle(handle),
        ))
        .id();

    world.get_mut::<Body>(entity).unwrap().in_frustum = false;
    run_frame(&mut world, &mut schedule);
    assert!(world.get::<Body>(entity).unwrap().is_asleep());
    assert!(world.resource::<PhysicsWorld>().rigid_body_set[handle].is_kinematic());

    let hooks = world.resource::<HookBuffer<SleepChanged>>();
    let hook = hooks.read_current().next().copied().unwrap();
    assert_eq!(hook.entity, entity);
    assert_eq!(hook.state, SleepState::Asleep);

    world.get_mut::<Body>(entity).unwrap().in_frustum = true;
    run_frame(&mut world, &mut schedule);

    let body = world.get::<Body>(entity).unwrap();
    assert!(!body.is_asleep());
    let physics = world.resource::<PhysicsWorld>();
    let rb = &physics.rigid_body_set[handle];
    assert!(rb.is_dynamic());
    let linvel = rb.linvel();
    assert!((Vec3::new(linvel.x, linvel.y, linvel.z) - velocity).length() < 1e-5);
}

#[test]
fn test_system_works_without_physics_world() {
    let (mut world, mut schedule) = setup_world();
    world.remove_resource::<PhysicsWorld>();
    let entity = world
        .spawn((Transform::from_translation(Vec3::new(80.0, 0.0, 0.0)), Body::new(0.5)))
        .id();

    run_frame(&mut world, &mut schedule);
    assert!(world.get::<Body>(entity).unwrap().is_asleep());
}

#[test]
fn test_system_uses_camera_frustum() {
    let (mut world, mut schedule) = setup_world();
    *world.resource_mut::<CameraRes>() =
        CameraRes::looking_at(Vec3::ZERO, Vec3::NEG_Z, std::f32::consts::FRAC_PI_2, 1.0);
    let behind = world
        .spawn((Transform::from_translation(Vec3::new(0.0, 0.0, 5.0)), Body::new(0.5)))
        .id();
    let ahead = world
        .spawn((Transform::from_translation(Vec3::new(0.0, 0.0, -5.0)), Body::new(0.5)))
        .id();

    run_frame(&mut world, &mut schedule);
    assert!(world.get::<Body>(behind).unwrap().is_asleep());
    assert!(!world.get::<Body>(ahead).unwrap().is_asleep());
}

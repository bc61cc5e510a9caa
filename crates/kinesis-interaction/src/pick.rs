//! Pointer-ray picking against simple pick shapes, for interactables with
//! no simulated body. Simulated bodies are picked against their colliders.

use bevy_ecs::prelude::*;
use glam::Vec3;
use kinesis_ecs::Transform;
use kinesis_input::PointerRay;

/// Geometry the pointer ray is tested against, centered on the entity's transform.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum PickShape {
    Sphere { radius: f32 },
    /// Oriented box following the transform's rotation.
    Box { half_extents: Vec3 },
}

impl PickShape {
    /// Distance along `ray` to the first hit, `0.0` when the origin is inside.
    pub fn ray_hit(&self, transform: &Transform, ray: &PointerRay) -> Option<f32> {
        match *self {
            PickShape::Sphere { radius } => ray_sphere(ray, transform.translation, radius),
            PickShape::Box { half_extents } => {
                let inverse = transform.rotation.inverse();
                let origin = inverse * (ray.origin - transform.translation);
                let direction = inverse * ray.direction;
                ray_box(origin, direction, half_extents)
            }
        }
    }
}

fn ray_sphere(ray: &PointerRay, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = ray.origin - center;
    let b = to_origin.dot(ray.direction);
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Slab test against an axis-aligned box centered at the origin.
fn ray_box(origin: Vec3, direction: Vec3, half_extents: Vec3) -> Option<f32> {
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];
        if d.abs() < f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (near, far) = {
            let a = (-h - o) * inv;
            let b = (h - o) * inv;
            if a < b { (a, b) } else { (b, a) }
        };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}

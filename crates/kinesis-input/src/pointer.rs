//! Pointer ray supplied by the input layer.

use glam::Vec3;

/// A ray from the pointer into the scene, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRay {
    /// Ray origin (usually the camera or hand position).
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl PointerRay {
    /// Creates a ray, normalizing `direction`.
    ///
    /// Returns `None` for a zero or non-finite direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Point at distance `t` along the ray.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let ray = PointerRay::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0)).unwrap();
        assert_eq!(ray.direction, Vec3::NEG_Z);
        assert_eq!(ray.point_at(2.0), Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(PointerRay::new(Vec3::ONE, Vec3::ZERO).is_none());
    }
}

//! View frustum extracted from the camera's view-projection matrix.

use glam::{Mat4, Vec3, Vec4};

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Six inward-facing planes bounding the visible volume.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewFrustum {
    /// Each `Vec4(a, b, c, d)`: unit inward normal `(a, b, c)` and offset `d`.
    planes: [Vec4; 6],
}

impl ViewFrustum {
    /// Extracts the planes with the Gribb–Hartmann method.
    ///
    /// Expects a `[0, 1]` depth range, which is what glam's `perspective_rh`
    /// and `orthographic_rh` produce.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Whether a sphere is at least partially inside the frustum.
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    /// Whether a point is inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }
}

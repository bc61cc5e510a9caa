//! Camera resource describing the active viewpoint.

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

/// Active camera pose, written by the rendering collaborator before each frame.
///
/// When `view_projection` is set, the core computes per-body frustum
/// membership itself; otherwise bodies keep the visibility flag the renderer
/// wrote for them.
#[derive(Resource, Debug, Clone)]
pub struct CameraRes {
    /// Camera position in world space (meters).
    pub position: Vec3,
    /// Camera orientation.
    pub rotation: Quat,
    /// Combined view-projection matrix, if the renderer supplies one.
    pub view_projection: Option<Mat4>,
}

impl Default for CameraRes {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            view_projection: None,
        }
    }
}

impl CameraRes {
    /// Creates a camera at `position` looking toward `target` with a
    /// right-handed perspective projection.
    pub fn looking_at(position: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(position, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y, aspect, 0.1, 1000.0);
        Self {
            position,
            rotation: Quat::from_mat4(&view.inverse()),
            view_projection: Some(projection * view),
        }
    }
}

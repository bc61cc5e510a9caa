//! Magnet anchor capture tests and docked poses.

use bevy_ecs::entity::Entity;
use glam::Vec3;
use kinesis_ecs::Transform;

use crate::MagnetAnchor;

/// An anchor close enough to its socket to dock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    /// Index into the interactable's anchors.
    pub anchor: usize,
    pub socket: Entity,
    /// Straight-line gap between anchor and socket.
    pub distance: f32,
}

/// World position of `anchor` on a body at `body`.
pub fn anchor_world_position(body: &Transform, anchor: &MagnetAnchor) -> Vec3 {
    body.translation + body.rotation * anchor.local_offset
}

/// Body pose that puts `anchor` exactly on `socket`, aligned with its rotation.
pub fn docked_pose(socket: &Transform, anchor: &MagnetAnchor) -> Transform {
    Transform::from_parts(
        socket.translation - socket.rotation * anchor.local_offset,
        socket.rotation,
    )
}

/// Nearest anchor within its capture ranges of a free socket.
///
/// `socket_pose` resolves a socket entity to its pose, or `None` when the
/// socket is missing or occupied by another object.
pub fn find_snap_candidate(
    body: &Transform,
    anchors: &[MagnetAnchor],
    socket_pose: impl Fn(Entity) -> Option<Transform>,
) -> Option<SnapCandidate> {
    anchors
        .iter()
        .enumerate()
        .filter_map(|(index, anchor)| {
            let socket = socket_pose(anchor.socket)?;
            let gap = socket.translation - anchor_world_position(body, anchor);
            let radial = Vec3::new(gap.x, 0.0, gap.z).length();
            let vertical = gap.y.abs();
            (radial <= anchor.radial_range && vertical <= anchor.vertical_range).then_some(
                SnapCandidate {
                    anchor: index,
                    socket: anchor.socket,
                    distance: gap.length(),
                },
            )
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

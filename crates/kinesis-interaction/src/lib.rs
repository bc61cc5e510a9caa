//! Grabbable objects: hover picking, grab/carry/release, magnet snapping onto
//! sockets, and throw velocity sampling.

pub mod components;
pub mod machine;
pub mod pick;
pub mod sampler;
pub mod snap;


pub use components::{
    Grip, Interactable, InteractionChanged, InteractionParams, InteractionState, MagnetAnchor,
    Socket,
};
pub use machine::{hover_system, interaction_system};
pub use pick::PickShape;
pub use sampler::{MotionSampler, throw_velocity};
pub use snap::{SnapCandidate, anchor_world_position, docked_pose, find_snap_candidate};

//! Input edge latching: turns raw press/release events into once-per-frame edges.
//!
//! The platform layer forwards button events to the [`InputLatch`] whenever
//! they arrive. At the start of each frame the latch hands its accumulated
//! [`FrameEdges`] to the local actor's [`ActorInput`], and the edges are
//! cleared again at the end of the frame, so no edge is seen twice or lost.

mod latch;
mod pointer;

pub use latch::{
    Action, ActorInput, ButtonState, FrameEdges, InputLatch, RawButtonEvent,
    clear_actor_input_system, latch_input_system,
};
pub use pointer::PointerRay;

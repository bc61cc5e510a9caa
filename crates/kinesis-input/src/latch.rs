//! Edge latch for the actions the coordinator consumes.
//!
//! [`InputLatch`] accumulates raw button events between frames. Presses while
//! the button is already down (OS auto-repeat, duplicate events) produce no new
//! edge, so holding Grab across many frames yields exactly one press edge.

use bevy_ecs::prelude::*;
use kinesis_ecs::LocalActor;

use crate::PointerRay;

/// Abstract actions the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Grab on press, release on release.
    Grab,
    /// Jump on press.
    Jump,
}

impl Action {
    fn bit(self) -> u8 {
        match self {
            Action::Grab => 1 << 0,
            Action::Jump => 1 << 1,
        }
    }
}

/// Whether a button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Button pressed.
    Pressed,
    /// Button released.
    Released,
}

/// Minimal description of a button event from the platform layer.
#[derive(Debug, Clone, Copy)]
pub struct RawButtonEvent {
    /// The action the button is bound to.
    pub action: Action,
    /// Whether the button was pressed or released.
    pub state: ButtonState,
    /// Whether this is an auto-repeat event.
    pub repeat: bool,
}

/// Edges captured for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEdges {
    pressed: u8,
    released: u8,
}

impl FrameEdges {
    /// Returns true if `action` was pressed since the previous frame.
    pub fn just_pressed(&self, action: Action) -> bool {
        self.pressed & action.bit() != 0
    }

    /// Returns true if `action` was released since the previous frame.
    pub fn just_released(&self, action: Action) -> bool {
        self.released & action.bit() != 0
    }

    /// Returns true if no edge was captured.
    pub fn is_empty(&self) -> bool {
        self.pressed == 0 && self.released == 0
    }

    /// Edges with `action` marked as pressed.
    pub fn with_pressed(mut self, action: Action) -> Self {
        self.pressed |= action.bit();
        self
    }

    /// Edges with `action` marked as released.
    pub fn with_released(mut self, action: Action) -> Self {
        self.released |= action.bit();
        self
    }
}

/// Accumulates raw button events between frames.
///
/// # Usage
///
/// 1. Forward button events with [`process_raw`](Self::process_raw) (or the
///    [`press`](Self::press)/[`release`](Self::release) shorthands) as they arrive.
/// 2. [`latch_input_system`] drains the edges at the start of the next frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputLatch {
    held: u8,
    pending: FrameEdges,
    pointer: Option<PointerRay>,
}

impl InputLatch {
    /// Creates a latch with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes a [`RawButtonEvent`].
    ///
    /// - **Pressed** (non-repeat, not already held): records a press edge.
    /// - **Released** (while held): records a release edge.
    /// - Everything else is ignored.
    pub fn process_raw(&mut self, event: RawButtonEvent) {
        if event.repeat {
            return;
        }
        let bit = event.action.bit();
        match event.state {
            ButtonState::Pressed => {
                if self.held & bit == 0 {
                    self.held |= bit;
                    self.pending.pressed |= bit;
                }
            }
            ButtonState::Released => {
                if self.held & bit != 0 {
                    self.held &= !bit;
                    self.pending.released |= bit;
                }
            }
        }
    }

    /// Records a non-repeat press of `action`.
    pub fn press(&mut self, action: Action) {
        self.process_raw(RawButtonEvent {
            action,
            state: ButtonState::Pressed,
            repeat: false,
        });
    }

    /// Records a release of `action`.
    pub fn release(&mut self, action: Action) {
        self.process_raw(RawButtonEvent {
            action,
            state: ButtonState::Released,
            repeat: false,
        });
    }

    /// Returns true if the button bound to `action` is currently down.
    pub fn is_held(&self, action: Action) -> bool {
        self.held & action.bit() != 0
    }

    /// Updates the pointer ray (`None` when the pointer left the view).
    pub fn set_pointer(&mut self, pointer: Option<PointerRay>) {
        self.pointer = pointer;
    }

    /// Current pointer ray.
    pub fn pointer(&self) -> Option<PointerRay> {
        self.pointer
    }

    /// Removes and returns the edges accumulated since the last call.
    pub fn take_edges(&mut self) -> FrameEdges {
        std::mem::take(&mut self.pending)
    }
}

/// Per-actor input consumed by the gameplay machines during one frame.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ActorInput {
    /// Edges latched for this frame.
    pub edges: FrameEdges,
    /// Pointer ray for this frame.
    pub pointer: Option<PointerRay>,
}

/// Moves the latched edges and pointer onto the local actor.
///
/// Runs first in the frame. The latch is drained even when no local actor
/// exists, so stale edges never leak into a later frame.
pub fn latch_input_system(
    mut latch: ResMut<InputLatch>,
    mut actors: Query<&mut ActorInput, With<LocalActor>>,
) {
    let edges = latch.take_edges();
    let pointer = latch.pointer();
    if !edges.is_empty() {
        tracing::trace!(?edges, "Latched input edges");
    }
    for mut input in actors.iter_mut() {
        input.edges = edges;
        input.pointer = pointer;
    }
}

/// Clears every actor's edges once all machines consumed them.
pub fn clear_actor_input_system(mut actors: Query<&mut ActorInput>) {
    for mut input in actors.iter_mut() {
        input.edges = FrameEdges::default();
    }
}

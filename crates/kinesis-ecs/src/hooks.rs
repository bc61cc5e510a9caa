//! Per-frame hook storage for collaborators outside the core.
//!
//! Subsystems push hooks ("body fell asleep", "interactable state changed")
//! into a [`HookBuffer`]. The buffer is double-buffered: hooks written during
//! frame N stay readable through frame N+1 and are dropped on the second
//! [`swap`](HookBuffer::swap).

use bevy_ecs::prelude::*;

/// Double-buffered hook storage.
#[derive(Resource, Debug)]
pub struct HookBuffer<T: Send + Sync + 'static> {
    /// Hooks from the previous frame (readable).
    prev: Vec<T>,
    /// Hooks from the current frame (being written).
    current: Vec<T>,
}

impl<T: Send + Sync + 'static> HookBuffer<T> {
    /// Creates a new empty buffer.
    pub fn new() -> Self {
        Self {
            prev: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Records a hook for the current frame.
    pub fn send(&mut self, hook: T) {
        self.current.push(hook);
    }

    /// Records every hook from `hooks` for the current frame.
    pub fn send_all(&mut self, hooks: impl IntoIterator<Item = T>) {
        self.current.extend(hooks);
    }

    /// Returns all readable hooks (previous + current frame).
    pub fn read(&self) -> impl Iterator<Item = &T> {
        self.prev.iter().chain(self.current.iter())
    }

    /// Returns only the hooks written during the current frame.
    pub fn read_current(&self) -> impl Iterator<Item = &T> {
        self.current.iter()
    }

    /// Returns the number of readable hooks.
    pub fn len(&self) -> usize {
        self.prev.len() + self.current.len()
    }

    /// Returns `true` if there are no readable hooks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances the frame: previous hooks are dropped, current becomes previous.
    ///
    /// Call this once per frame before any stage writes hooks.
    pub fn swap(&mut self) {
        self.prev.clear();
        std::mem::swap(&mut self.prev, &mut self.current);
    }
}

impl<T: Send + Sync + 'static> Default for HookBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

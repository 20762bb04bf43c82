//! Generation-tagged timer slots.
//!
//! Each slot owns at most one spawned task. Replacing or cancelling bumps the
//! generation, so a task that already woke up can tell it has been
//! superseded by comparing its own generation under the owner's lock.

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the current task (if any) and install the one returned by
    /// `spawn`, which receives the new generation.
    pub fn replace<F>(&mut self, spawn: F) -> u64
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        self.cancel();
        self.handle = Some(spawn(self.generation));
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Called by a task finishing on its own. Clears the slot only if it
    /// still belongs to `generation`.
    pub fn release(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.handle = None;
        true
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.handle.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

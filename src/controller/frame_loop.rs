use std::cell::Cell;

/// Per-frame bookkeeping for the animation loop. Scheduling itself belongs to the
/// host (requestAnimationFrame in the browser); this decides what a tick does and
/// whether another one is wanted.
#[derive(Debug, Default)]
pub struct FrameLoop {
    time: Cell<u64>,
    auto_clear: Cell<bool>,
    running: Cell<bool>,
    /// Bumped by every `start`
    generation: Cell<u64>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the frame counter and accepts ticks again
    pub fn start(&self) {
        self.time.set(0);
        self.running.set(true);
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Frames completed since the last `start`
    pub fn time(&self) -> u64 {
        self.time.get()
    }

    pub fn auto_clear(&self) -> bool {
        self.auto_clear.get()
    }

    pub fn set_auto_clear(&self, enabled: bool) {
        self.auto_clear.set(enabled);
    }

    /// Runs one frame: clear (when auto-clear is on), then the frame hook, then the
    /// counter increment. Returns true when the next frame should be scheduled,
    /// which is no longer the case once the hook has stopped the loop.
    /// A tick arriving after `stop` does nothing. A hook that restarts the loop
    /// leaves the fresh counter at 0.
    pub fn tick(&self, clear: impl FnOnce(), frame: impl FnOnce()) -> bool {
        if !self.running.get() {
            return false;
        }
        if self.auto_clear.get() {
            clear();
        }
        let generation = self.generation.get();
        frame();
        if self.generation.get() == generation {
            self.time.set(self.time.get() + 1);
        }
        self.running.get()
    }
}

//! Tick-driven timers owned by an exercise session.
//!
//! Neither timer schedules anything by itself: the owner calls `tick` once
//! per second and acts on the returned signal. Stopping a timer therefore
//! cancels every future firing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops and refills to the full duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.duration;
    }

    /// Returns `true` exactly once, on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAdvance {
    interval: u32,
    elapsed: u32,
    enabled: bool,
}

impl AutoAdvance {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            elapsed: 0,
            enabled: false,
        }
    }

    /// Enabling an already enabled timer keeps its current phase.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.elapsed = 0;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.elapsed = 0;
    }

    /// Returns `true` every `interval` ticks while enabled.
    pub fn tick(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed >= self.interval {
            self.elapsed = 0;
            return true;
        }
        false
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

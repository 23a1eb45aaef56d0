//! Tracker configuration.
//!
//! `TrackerConfig` carries the tunables of the gesture tracker. The defaults
//! match the constants in [`crate::constants`]; hosts that need a different
//! band or timing override them with the `with_*` builders.

use std::time::Duration;

use crate::constants::{BOTTOM_EDGE_TRIGGER, CLOSE_DELAY, GESTURE_EXPIRY};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    edge_trigger: f64,
    gesture_expiry: Duration,
    close_delay: Duration,
    debug: bool,
}

impl TrackerConfig {
    pub const fn new() -> Self {
        Self {
            edge_trigger: BOTTOM_EDGE_TRIGGER,
            gesture_expiry: GESTURE_EXPIRY,
            close_delay: CLOSE_DELAY,
            debug: false,
        }
    }

    /// Height of the bottom band a drop must reach.
    pub const fn edge_trigger(&self) -> f64 {
        self.edge_trigger
    }

    /// Maximum gesture age accepted by drag motion.
    pub const fn gesture_expiry(&self) -> Duration {
        self.gesture_expiry
    }

    /// Delay before a close verdict is carried out.
    pub const fn close_delay(&self) -> Duration {
        self.close_delay
    }

    /// Whether diagnostics are emitted.
    pub const fn debug(&self) -> bool {
        self.debug
    }

    pub const fn with_edge_trigger(mut self, edge_trigger: f64) -> Self {
        self.edge_trigger = edge_trigger;
        self
    }

    pub const fn with_gesture_expiry(mut self, expiry: Duration) -> Self {
        self.gesture_expiry = expiry;
        self
    }

    pub const fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = delay;
        self
    }

    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}

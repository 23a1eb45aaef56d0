//! The single gesture the tracker is following.

pub mod decision;

use std::time::{Duration, Instant};

use crate::events::TouchKey;
use crate::host::WindowHandle;

pub use decision::{DropContext, Evaluation, IgnoreReason, Verdict, evaluate};

/// A touch that landed on a window and may turn into a drag-to-close.
///
/// The vertical extrema are kept here as well as on the touch record, since
/// drag motion keeps updating them after the record may already be gone.
#[derive(Debug, Clone)]
pub struct ActiveGesture<W: WindowHandle> {
    touch: TouchKey,
    window: W,
    start_workspace: Option<W::Workspace>,
    drag_started: bool,
    last_y: f64,
    max_y: f64,
    armed_at: Instant,
}

impl<W: WindowHandle> ActiveGesture<W> {
    /// Arm a gesture, capturing the window's workspace at this instant.
    pub fn arm(touch: TouchKey, window: W, y: f64, now: Instant) -> Self {
        let start_workspace = window.workspace();
        Self {
            touch,
            window,
            start_workspace,
            drag_started: false,
            last_y: y,
            max_y: y,
            armed_at: now,
        }
    }

    pub fn touch(&self) -> TouchKey {
        self.touch
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn start_workspace(&self) -> Option<&W::Workspace> {
        self.start_workspace.as_ref()
    }

    pub fn drag_started(&self) -> bool {
        self.drag_started
    }

    pub fn last_y(&self) -> f64 {
        self.last_y
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn armed_at(&self) -> Instant {
        self.armed_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.armed_at)
    }

    /// Strictly older than `expiry`.
    pub fn is_expired(&self, now: Instant, expiry: Duration) -> bool {
        self.age(now) > expiry
    }

    pub fn mark_drag_started(&mut self) {
        self.drag_started = true;
    }

    pub fn track_y(&mut self, y: f64) {
        self.last_y = y;
        if y > self.max_y {
            self.max_y = y;
        }
    }
}

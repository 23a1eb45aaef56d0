//! Capabilities the tracker needs from its host shell.
//!
//! The tracker never owns windows, actors or timers. It reaches them through
//! the traits below, which a compositor (or the in-process [`crate::sim`]
//! host) implements once for its concrete node and window types.

pub mod resolve;

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::CloseError;

pub use resolve::{Resolution, Via, find_window};

/// Anything that may be associated with a window: scene-graph nodes, their
/// delegates, drag payloads.
pub trait WindowSource<W> {
    fn window(&self) -> Option<W>;
}

/// A node of the host's scene graph.
pub trait Actor<W>: WindowSource<W> + Clone + PartialEq {
    fn parent(&self) -> Option<Self>;

    /// Object the host attaches to the node to drive it (a window preview
    /// behind a clone actor, for example).
    fn delegate(&self) -> Option<&dyn WindowSource<W>> {
        None
    }

    /// Short type label used in diagnostics.
    fn type_name(&self) -> &str {
        "actor"
    }
}

/// Handle to a logical window. Equality is identity.
pub trait WindowHandle: Clone + PartialEq + fmt::Debug {
    type Workspace: Clone + PartialEq + fmt::Debug;

    fn workspace(&self) -> Option<Self::Workspace>;

    fn title(&self) -> Option<String> {
        None
    }

    /// Windows that cannot answer are treated as closable.
    fn can_close(&self) -> bool {
        true
    }

    fn delete(&self, timestamp: u32) -> Result<(), CloseError>;
}

/// Handle for a one-shot timer registered with [`Host::timeout_add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

/// Visibility of the shell's window overview.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverviewState {
    pub visible: bool,
    pub visible_target: bool,
}

impl OverviewState {
    pub const HIDDEN: Self = Self {
        visible: false,
        visible_target: false,
    };
    pub const SHOWN: Self = Self {
        visible: true,
        visible_target: true,
    };
    /// Animating in: not visible yet, but about to be.
    pub const SHOWING: Self = Self {
        visible: false,
        visible_target: true,
    };

    /// Whether gestures should be tracked at all.
    pub const fn is_showing(&self) -> bool {
        self.visible || self.visible_target
    }
}

pub trait Host {
    type Window: WindowHandle;
    type Actor: Actor<Self::Window>;

    fn overview(&self) -> OverviewState;
    fn stage_height(&self) -> f64;
    fn actor_at(&self, x: f64, y: f64) -> Option<Self::Actor>;

    /// Current pointer position, diagnostics only.
    fn pointer(&self) -> Option<(f64, f64)> {
        None
    }

    /// Monotonic clock used for gesture expiry.
    fn now(&self) -> Instant;

    fn current_time_roundtrip(&self) -> Option<u32> {
        None
    }

    fn current_time(&self) -> Option<u32> {
        None
    }

    fn current_event_time(&self) -> Option<u32> {
        None
    }

    /// Schedule a one-shot timer. The host reports expiry back through
    /// [`crate::tracker::DragCloseTracker::dispatch_timeout`].
    fn timeout_add(&mut self, delay: Duration) -> SourceId;
    fn source_remove(&mut self, id: SourceId);
}

impl<T: Host + ?Sized> Host for &mut T {
    type Window = T::Window;
    type Actor = T::Actor;

    fn overview(&self) -> OverviewState {
        (**self).overview()
    }

    fn stage_height(&self) -> f64 {
        (**self).stage_height()
    }

    fn actor_at(&self, x: f64, y: f64) -> Option<Self::Actor> {
        (**self).actor_at(x, y)
    }

    fn pointer(&self) -> Option<(f64, f64)> {
        (**self).pointer()
    }

    fn now(&self) -> Instant {
        (**self).now()
    }

    fn current_time_roundtrip(&self) -> Option<u32> {
        (**self).current_time_roundtrip()
    }

    fn current_time(&self) -> Option<u32> {
        (**self).current_time()
    }

    fn current_event_time(&self) -> Option<u32> {
        (**self).current_event_time()
    }

    fn timeout_add(&mut self, delay: Duration) -> SourceId {
        (**self).timeout_add(delay)
    }

    fn source_remove(&mut self, id: SourceId) {
        (**self).source_remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimShell;

    #[test]
    fn overview_showing_includes_transition() {
        assert!(!OverviewState::HIDDEN.is_showing());
        assert!(OverviewState::SHOWN.is_showing());
        assert!(OverviewState::SHOWING.is_showing());
    }

    fn schedule_through<H: Host>(mut host: H) -> SourceId {
        host.timeout_add(Duration::from_millis(5))
    }

    #[test]
    fn blanket_impl_for_mut_ref_works() {
        let mut shell = SimShell::new(1000.0);
        shell.set_overview(OverviewState::SHOWN);
        let id = schedule_through(&mut shell);
        assert!(shell.is_pending(id));
        let by_ref = &mut shell;
        assert!(by_ref.overview().is_showing());
        assert_eq!(by_ref.stage_height(), 1000.0);
    }
}

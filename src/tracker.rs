//! Drag-to-close gesture tracking.
//!
//! `DragCloseTracker` sits between two independent callback streams of the
//! host: captured input events, and the motion/drop callbacks of the
//! drag-and-drop machinery. A touch that lands on a window arms a gesture;
//! drag motion for that window marks it as dragging; a drop for that window
//! ends it and may schedule a deferred close. The tracker is passive: every
//! callback returns [`Passthrough`].

use crate::config::TrackerConfig;
use crate::constants::LOG_TARGET;
use crate::dispatcher::{CloseOutcome, DeferredClose};
use crate::events::{DragEvent, EventKind, Passthrough, TouchEvent};
use crate::gesture::{self, ActiveGesture, DropContext, Evaluation, IgnoreReason, Verdict};
use crate::host::{Actor, Host, SourceId, WindowHandle, WindowSource, find_window};
use crate::touch::TouchRegistry;

macro_rules! diag {
    ($config:expr, $($arg:tt)+) => {
        if $config.debug() {
            tracing::debug!(target: LOG_TARGET, $($arg)+);
        }
    };
}

fn title_of<W: WindowHandle>(window: &W) -> String {
    window.title().unwrap_or_else(|| "unknown".to_string())
}

pub struct DragCloseTracker<W: WindowHandle> {
    config: TrackerConfig,
    enabled: bool,
    touches: TouchRegistry<W>,
    gesture: Option<ActiveGesture<W>>,
    closer: DeferredClose<W>,
}

impl<W: WindowHandle> DragCloseTracker<W> {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            enabled: false,
            touches: TouchRegistry::new(),
            gesture: None,
            closer: DeferredClose::new(config.debug()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn touches(&self) -> &TouchRegistry<W> {
        &self.touches
    }

    pub fn active_gesture(&self) -> Option<&ActiveGesture<W>> {
        self.gesture.as_ref()
    }

    pub fn has_pending_close(&self) -> bool {
        self.closer.is_pending()
    }

    /// Start reacting to callbacks. Until then every callback is inert.
    pub fn enable<H: Host<Window = W>>(&mut self, host: &H) {
        self.enabled = true;
        diag!(
            self.config,
            stage_height = host.stage_height(),
            edge_trigger = self.config.edge_trigger(),
            "enabled"
        );
    }

    /// Stop reacting to callbacks, forget all state and cancel a pending
    /// close so it never fires.
    pub fn disable<H: Host<Window = W>>(&mut self, host: &mut H) {
        diag!(
            self.config,
            tracked_touches = self.touches.len(),
            had_active_gesture = self.gesture.is_some(),
            had_pending_close = self.closer.is_pending(),
            "disable called"
        );
        self.touches.clear();
        self.gesture = None;
        self.closer.cancel(host);
        self.enabled = false;
    }

    /// Captured-event callback.
    pub fn handle_event<H>(&mut self, host: &H, event: &TouchEvent<H::Actor>) -> Passthrough
    where
        H: Host<Window = W>,
    {
        if !self.enabled || event.kind == EventKind::Nothing || !host.overview().is_showing() {
            return Passthrough;
        }

        if event.kind.is_touch() {
            diag!(self.config, kind = ?event.kind, "touch event received");
        }

        match event.kind {
            EventKind::TouchBegin => self.touch_begin(host, event),
            EventKind::TouchUpdate => self.touch_update(event),
            EventKind::TouchEnd | EventKind::TouchCancel => self.touch_end(event),
            EventKind::Nothing | EventKind::Other => {}
        }
        Passthrough
    }

    fn touch_begin<H>(&mut self, host: &H, event: &TouchEvent<H::Actor>)
    where
        H: Host<Window = W>,
    {
        let Some(touch) = event.touch_key() else {
            diag!(self.config, reason = "missing-sequence", "touch begin ignored");
            return;
        };

        let Some(found) = find_window(host, event.source.as_ref(), Some((event.x, event.y))) else {
            diag!(
                self.config,
                reason = "no-window",
                source_type = event.source.as_ref().map_or("unknown", |source| source.type_name()),
                "touch begin ignored"
            );
            return;
        };
        diag!(
            self.config,
            depth = found.depth,
            via = ?found.via,
            picked = found.picked,
            title = %title_of(&found.window),
            "window found"
        );

        self.touches.begin(touch, found.window.clone(), event.y);
        // Overwrites any gesture armed by another finger.
        self.gesture = Some(ActiveGesture::arm(touch, found.window, event.y, host.now()));

        diag!(
            self.config,
            %touch,
            x = event.x,
            y = event.y,
            tracked_touches = self.touches.len(),
            "touch begin tracked"
        );
    }

    fn touch_update<A>(&mut self, event: &TouchEvent<A>) {
        let Some(touch) = event.touch_key() else {
            return;
        };
        if !self.touches.update(touch, event.y) {
            return;
        }
        if let Some(gesture) = self.gesture.as_mut()
            && gesture.touch() == touch
        {
            gesture.track_y(event.y);
        }
    }

    fn touch_end<A>(&mut self, event: &TouchEvent<A>) {
        let touch = event.touch_key();
        if let Some(touch) = touch {
            self.touches.end(touch);
        }

        if let Some(gesture) = &self.gesture
            && Some(gesture.touch()) == touch
            && !gesture.drag_started()
        {
            diag!(self.config, touch = %gesture.touch(), "touch end without drag");
            self.gesture = None;
        }
    }

    /// Drag-motion callback.
    pub fn drag_motion<H, S>(&mut self, host: &H, event: &DragEvent<S>) -> Passthrough
    where
        H: Host<Window = W>,
        S: WindowSource<W>,
    {
        if !self.enabled {
            return Passthrough;
        }
        let Some(gesture) = self.gesture.as_mut() else {
            return Passthrough;
        };

        let now = host.now();
        if gesture.is_expired(now, self.config.gesture_expiry()) {
            diag!(
                self.config,
                touch = %gesture.touch(),
                age_ms = gesture.age(now).as_millis() as u64,
                "gesture timeout"
            );
            self.gesture = None;
            return Passthrough;
        }

        if let Some(window) = event.window::<W>()
            && window != *gesture.window()
        {
            return Passthrough;
        }

        gesture.mark_drag_started();
        // Any reported y is kept, finite or not; the drop rejects non-finite
        // release positions.
        if let Some(y) = event.y {
            gesture.track_y(y);
        }
        Passthrough
    }

    /// Drag-drop callback.
    pub fn drag_drop<H, S>(&mut self, host: &mut H, event: &DragEvent<S>) -> Passthrough
    where
        H: Host<Window = W>,
        S: WindowSource<W>,
    {
        let _ = self.resolve_drop(host, event);
        Passthrough
    }

    /// The work behind [`Self::drag_drop`]. Returns the evaluation when the
    /// drop ended the active gesture, `None` when it passed through.
    ///
    /// A drop for another window leaves the gesture armed; it lingers until a
    /// later drop for its own window or until motion finds it expired.
    pub fn resolve_drop<H, S>(&mut self, host: &mut H, event: &DragEvent<S>) -> Option<Evaluation>
    where
        H: Host<Window = W>,
        S: WindowSource<W>,
    {
        if !self.enabled {
            return None;
        }
        let active = self.gesture.as_ref()?;
        if let Some(window) = event.window::<W>()
            && window != *active.window()
        {
            diag!(self.config, touch = %active.touch(), "drop for another window");
            return None;
        }

        let gesture = self.gesture.take()?;
        let context = DropContext {
            event_y: event.finite_y(),
            pointer_y: host.pointer().map(|(_, y)| y),
            stage_height: host.stage_height(),
            edge_trigger: self.config.edge_trigger(),
        };
        let evaluation = gesture::evaluate(&gesture, &context);

        diag!(
            self.config,
            touch = %evaluation.touch,
            pointer_y = ?evaluation.pointer_y,
            event_y = ?evaluation.event_y,
            last_y = evaluation.last_y,
            max_y = evaluation.max_y,
            release_y = evaluation.release_y,
            drag_started = evaluation.drag_started,
            stage_height = evaluation.stage_height,
            bottom_edge = evaluation.edge_trigger,
            reached_bottom_edge = evaluation.reached_bottom_edge,
            workspace_changed = evaluation.workspace_changed,
            "drag drop evaluated"
        );

        match evaluation.verdict() {
            Verdict::Close => {
                diag!(
                    self.config,
                    touch = %gesture.touch(),
                    title = %title_of(gesture.window()),
                    "closing window"
                );
                self.closer.schedule(
                    host,
                    gesture.window().clone(),
                    gesture.touch(),
                    self.config.close_delay(),
                );
            }
            Verdict::Ignore => {
                if evaluation.ignore_reason == Some(IgnoreReason::NotClosable) {
                    diag!(self.config, reason = "window-cannot-close", "close rejected");
                }
            }
        }
        Some(evaluation)
    }

    /// Timer callback. Hosts call this when a source from
    /// [`Host::timeout_add`] expires.
    pub fn dispatch_timeout<H>(&mut self, host: &H, source: SourceId) -> Option<CloseOutcome>
    where
        H: Host<Window = W>,
    {
        self.closer.fire(host, source)
    }
}
